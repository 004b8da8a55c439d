//! Modules understood by the in-memory engine.
//!
//! * `write <input> [->]<output> [-T<type>]` copies a table, grid or image
//!   between files and virtual files without changing it.
//! * `echo <args...>` logs its arguments.
//!
//! Anything else fails the way GMT fails for an unknown module.

use std::ffi::c_int;
use std::fmt::Write as _;
use std::path::Path;

use super::store::{GridMeta, GridPayload, ImagePayload, Payload, TablePayload};
use super::FakeSession;

pub(super) const STATUS_FILE_NOT_FOUND: c_int = 16;
pub(super) const STATUS_NOT_A_VALID_MODULE: c_int = 31;
pub(super) const STATUS_BAD_ARGUMENT: c_int = 60;

const GRID_MAGIC: &str = "# fake-gmt grid";
const IMAGE_MAGIC: &str = "# fake-gmt image";

/// Exit status plus the messages the module emitted
#[derive(Debug)]
pub(super) struct Outcome {
    pub status: c_int,
    pub messages: Vec<String>,
}

impl Outcome {
    fn ok(messages: Vec<String>) -> Self {
        Self { status: 0, messages }
    }

    fn error(status: c_int, module: &str, message: impl AsRef<str>) -> Self {
        Self {
            status,
            messages: vec![format!("{} [ERROR]: {}", module, message.as_ref())],
        }
    }
}

pub(super) fn run(session: &mut FakeSession, module: &str, args: &[String]) -> Outcome {
    match module {
        "write" => write(session, args),
        "echo" => Outcome::ok(vec![format!("echo [INFORMATION]: {}", args.join(" "))]),
        other => Outcome::error(
            STATUS_NOT_A_VALID_MODULE,
            "gmt",
            format!("Shared GMT module not found: {}", other),
        ),
    }
}

fn write(session: &mut FakeSession, args: &[String]) -> Outcome {
    let positional: Vec<&str> = args
        .iter()
        .map(String::as_str)
        .filter(|a| !a.starts_with('-') || a.starts_with("->"))
        .collect();
    let (input, output) = match positional.as_slice() {
        [input, output, ..] => (*input, output.trim_start_matches("->")),
        _ => return Outcome::error(STATUS_BAD_ARGUMENT, "write", "Must specify both input and output"),
    };

    let payload = match read_source(session, input) {
        Ok(payload) => payload,
        Err((status, message)) => return Outcome::error(status, "write", message),
    };
    match write_target(session, output, payload) {
        Ok(()) => Outcome::ok(Vec::new()),
        Err((status, message)) => Outcome::error(status, "write", message),
    }
}

type ModuleError = (c_int, String);

fn read_source(session: &FakeSession, source: &str) -> Result<Payload, ModuleError> {
    if let Some(slot) = session.vfiles.get(source) {
        let key = slot
            .object
            .ok_or_else(|| (STATUS_BAD_ARGUMENT, format!("Virtual file {} has no input", source)))?;
        let object = session
            .objects
            .get(&key)
            .ok_or_else(|| (STATUS_BAD_ARGUMENT, format!("Object behind {} was destroyed", source)))?;
        return object.to_payload().map_err(|e| (STATUS_BAD_ARGUMENT, e));
    }
    if source.starts_with("@GMTAPI@") {
        return Err((STATUS_FILE_NOT_FOUND, format!("Virtual file {} not found", source)));
    }
    let text = std::fs::read_to_string(source)
        .map_err(|_| (STATUS_FILE_NOT_FOUND, format!("Cannot find file {}", source)))?;
    parse_file(&text).map_err(|e| (STATUS_BAD_ARGUMENT, format!("{}: {}", source, e)))
}

fn write_target(session: &mut FakeSession, target: &str, payload: Payload) -> Result<(), ModuleError> {
    if let Some(slot) = session.vfiles.get_mut(target) {
        if !slot.output {
            return Err((STATUS_BAD_ARGUMENT, format!("Virtual file {} is not an output", target)));
        }
        slot.result = Some(payload);
        return Ok(());
    }
    std::fs::write(Path::new(target), format_payload(&payload))
        .map_err(|e| (STATUS_FILE_NOT_FOUND, format!("Cannot create file {}: {}", target, e)))
}

// =============================================================================
// Text formats
// =============================================================================

/// Render a payload the way `write` stores it on disk.
pub(super) fn format_payload(payload: &Payload) -> String {
    let mut out = String::new();
    match payload {
        Payload::Table(table) => {
            for row in 0..table.n_rows() {
                let mut fields: Vec<String> = table.columns.iter().map(|c| c[row].to_string()).collect();
                if let Some(text) = &table.text {
                    fields.push(text[row].clone());
                }
                let _ = writeln!(out, "{}", fields.join("\t"));
            }
        }
        Payload::Grid(grid) => {
            format_header(&mut out, GRID_MAGIC, &grid.meta, None);
            format_rows(&mut out, &grid.values, grid.meta.n_columns);
        }
        Payload::Image(image) => {
            format_header(&mut out, IMAGE_MAGIC, &image.meta, Some(image.n_bands));
            format_rows(&mut out, &image.values, image.meta.n_columns);
        }
    }
    out
}

fn format_header(out: &mut String, magic: &str, meta: &GridMeta, bands: Option<usize>) {
    let _ = writeln!(out, "{}", magic);
    match bands {
        Some(b) => {
            let _ = writeln!(out, "{} {} {} {} {}", meta.n_columns, meta.n_rows, b, meta.registration, meta.grdtype);
        }
        None => {
            let _ = writeln!(out, "{} {} {} {}", meta.n_columns, meta.n_rows, meta.registration, meta.grdtype);
        }
    }
    let [w, e, s, n] = meta.wesn;
    let _ = writeln!(out, "{} {} {} {}", w, e, s, n);
    let _ = writeln!(out, "{} {}", meta.inc[0], meta.inc[1]);
}

fn format_rows<T: ToString>(out: &mut String, values: &[T], n_columns: usize) {
    for row in values.chunks(n_columns.max(1)) {
        let fields: Vec<String> = row.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "{}", fields.join("\t"));
    }
}

/// Parse a file written by `format_payload`, or any whitespace table.
pub(super) fn parse_file(text: &str) -> Result<Payload, String> {
    let mut lines = text.lines();
    match text.lines().next().map(str::trim) {
        Some(GRID_MAGIC) => {
            lines.next();
            let (meta, _) = parse_raster_header(&mut lines, false)?;
            let values = parse_values::<f32>(lines, meta.nodes())?;
            Ok(Payload::Grid(GridPayload { meta, values }))
        }
        Some(IMAGE_MAGIC) => {
            lines.next();
            let (meta, n_bands) = parse_raster_header(&mut lines, true)?;
            let values = parse_values::<u8>(lines, meta.nodes() * n_bands)?;
            Ok(Payload::Image(ImagePayload { meta, n_bands, values }))
        }
        _ => parse_table(text).map(Payload::Table),
    }
}

fn numbers(line: Option<&str>, expected: usize) -> Result<Vec<f64>, String> {
    let line = line.ok_or("truncated raster header")?;
    let values = line
        .split_whitespace()
        .map(|t| t.parse::<f64>().map_err(|_| format!("bad header field '{}'", t)))
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != expected {
        return Err(format!("expected {} header fields, found {}", expected, values.len()));
    }
    Ok(values)
}

fn parse_raster_header<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    with_bands: bool,
) -> Result<(GridMeta, usize), String> {
    let dims = numbers(lines.next(), if with_bands { 5 } else { 4 })?;
    let wesn = numbers(lines.next(), 4)?;
    let inc = numbers(lines.next(), 2)?;
    let (n_bands, tail) = if with_bands {
        (dims[2] as usize, &dims[3..])
    } else {
        (1, &dims[2..])
    };
    let meta = GridMeta {
        n_columns: dims[0] as usize,
        n_rows: dims[1] as usize,
        wesn: [wesn[0], wesn[1], wesn[2], wesn[3]],
        inc: [inc[0], inc[1]],
        registration: tail[0] as u32,
        grdtype: tail[1] as u32,
    };
    Ok((meta, n_bands))
}

fn parse_values<'a, T: std::str::FromStr>(lines: impl Iterator<Item = &'a str>, expected: usize) -> Result<Vec<T>, String> {
    let values = lines
        .flat_map(str::split_whitespace)
        .map(|t| t.parse::<T>().map_err(|_| format!("bad value '{}'", t)))
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != expected {
        return Err(format!("expected {} values, found {}", expected, values.len()));
    }
    Ok(values)
}

/// Leading numeric fields become columns, the rest of the record is text.
fn parse_table(text: &str) -> Result<TablePayload, String> {
    let mut columns: Vec<Vec<f64>> = Vec::new();
    let mut trailing: Vec<String> = Vec::new();
    let mut n_columns = None;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('>') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let numeric = fields.iter().take_while(|f| f.parse::<f64>().is_ok()).count();
        let expected = *n_columns.get_or_insert_with(|| {
            columns = vec![Vec::new(); numeric];
            numeric
        });
        if numeric < expected {
            return Err(format!(
                "Mismatch between actual ({}) and expected ({}) fields near line {}",
                numeric,
                expected,
                number + 1
            ));
        }
        for (column, field) in columns.iter_mut().zip(&fields) {
            column.push(field.parse().unwrap_or(f64::NAN));
        }
        trailing.push(fields[expected..].join(" "));
    }

    let has_text = trailing.iter().any(|t| !t.is_empty());
    Ok(TablePayload {
        columns,
        text: has_text.then_some(trailing),
    })
}
