//! Element Kinds
//!
//! Host element kinds and their GMT data type constants.

use std::fmt;

/// Element kind of a host buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
    /// UTF-8 text
    Text,
    /// Boolean (host-only, no native setter)
    Bool,
}

impl ElementKind {
    /// All kinds that have a native setter.
    pub const SUPPORTED: [ElementKind; 11] = [
        ElementKind::I8,
        ElementKind::I16,
        ElementKind::I32,
        ElementKind::I64,
        ElementKind::U8,
        ElementKind::U16,
        ElementKind::U32,
        ElementKind::U64,
        ElementKind::F32,
        ElementKind::F64,
        ElementKind::Text,
    ];

    /// Name of the GMT type constant for this kind, if the library has one.
    pub fn gmt_type(&self) -> Option<&'static str> {
        match self {
            ElementKind::I8 => Some("GMT_CHAR"),
            ElementKind::I16 => Some("GMT_SHORT"),
            ElementKind::I32 => Some("GMT_INT"),
            ElementKind::I64 => Some("GMT_LONG"),
            ElementKind::U8 => Some("GMT_UCHAR"),
            ElementKind::U16 => Some("GMT_USHORT"),
            ElementKind::U32 => Some("GMT_UINT"),
            ElementKind::U64 => Some("GMT_ULONG"),
            ElementKind::F32 => Some("GMT_FLOAT"),
            ElementKind::F64 => Some("GMT_DOUBLE"),
            ElementKind::Text => Some("GMT_TEXT"),
            ElementKind::Bool => None,
        }
    }

    /// Size in bytes of one element (pointer width for text).
    pub fn size(&self) -> usize {
        match self {
            ElementKind::I8 | ElementKind::U8 | ElementKind::Bool => 1,
            ElementKind::I16 | ElementKind::U16 => 2,
            ElementKind::I32 | ElementKind::U32 | ElementKind::F32 => 4,
            ElementKind::I64 | ElementKind::U64 | ElementKind::F64 => 8,
            ElementKind::Text => std::mem::size_of::<usize>(),
        }
    }

    /// Check if this kind is numeric
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ElementKind::Text | ElementKind::Bool)
    }

    /// Parse from a dtype-style name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i8" | "int8" => Some(ElementKind::I8),
            "i16" | "int16" => Some(ElementKind::I16),
            "i32" | "int32" => Some(ElementKind::I32),
            "i64" | "int64" => Some(ElementKind::I64),
            "u8" | "uint8" => Some(ElementKind::U8),
            "u16" | "uint16" => Some(ElementKind::U16),
            "u32" | "uint32" => Some(ElementKind::U32),
            "u64" | "uint64" => Some(ElementKind::U64),
            "f32" | "float32" => Some(ElementKind::F32),
            "f64" | "float64" => Some(ElementKind::F64),
            "str" | "text" | "string" => Some(ElementKind::Text),
            "bool" => Some(ElementKind::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::I8 => "int8",
            ElementKind::I16 => "int16",
            ElementKind::I32 => "int32",
            ElementKind::I64 => "int64",
            ElementKind::U8 => "uint8",
            ElementKind::U16 => "uint16",
            ElementKind::U32 => "uint32",
            ElementKind::U64 => "uint64",
            ElementKind::F32 => "float32",
            ElementKind::F64 => "float64",
            ElementKind::Text => "str",
            ElementKind::Bool => "bool",
        };
        write!(f, "{}", name)
    }
}
