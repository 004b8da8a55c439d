//! Output virtual files.

use std::path::Path;

use crate::error::Result;
use crate::session::Session;

use super::{Direction, VirtualFile};

/// What a module is expected to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Table,
    Grid,
    Image,
}

impl OutputKind {
    pub fn family(&self) -> &'static str {
        match self {
            OutputKind::Table => "GMT_IS_DATASET",
            OutputKind::Grid => "GMT_IS_GRID",
            OutputKind::Image => "GMT_IS_IMAGE",
        }
    }

    pub fn geometry(&self) -> &'static str {
        match self {
            OutputKind::Table => "GMT_IS_PLP",
            OutputKind::Grid | OutputKind::Image => "GMT_IS_SURFACE",
        }
    }
}

impl Session {
    /// A destination for module output.
    ///
    /// With `path` the module writes straight to that file and nothing is
    /// opened natively; otherwise the library keeps the result in memory for
    /// the materializer.
    pub fn virtualfile_out(&self, kind: OutputKind, path: Option<&Path>) -> Result<VirtualFile<'_>> {
        self.handle()?;
        match path {
            Some(path) => Ok(VirtualFile::passthrough(self, path, Direction::Out)),
            None => self.open_virtualfile(kind.family(), kind.geometry(), "GMT_OUT|GMT_IS_REFERENCE", None),
        }
    }
}
