//! Family, geometry and mode parsing
//!
//! Composite constant strings such as `GMT_IS_DATASET|GMT_VIA_VECTOR` are
//! parsed and validated here without touching the native library; only the
//! validated parts are later resolved through the session's constant cache.

use std::ffi::c_int;
use std::fmt;

use crate::data::GridType;
use crate::error::{BridgeError, Result};
use crate::session::Session;

/// Base container family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseFamily {
    Dataset,
    Grid,
    Image,
    Matrix,
    Vector,
    Cube,
}

impl BaseFamily {
    pub const ALL: [BaseFamily; 6] = [
        BaseFamily::Dataset,
        BaseFamily::Grid,
        BaseFamily::Image,
        BaseFamily::Matrix,
        BaseFamily::Vector,
        BaseFamily::Cube,
    ];

    pub fn constant(&self) -> &'static str {
        match self {
            BaseFamily::Dataset => "GMT_IS_DATASET",
            BaseFamily::Grid => "GMT_IS_GRID",
            BaseFamily::Image => "GMT_IS_IMAGE",
            BaseFamily::Matrix => "GMT_IS_MATRIX",
            BaseFamily::Vector => "GMT_IS_VECTOR",
            BaseFamily::Cube => "GMT_IS_CUBE",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.constant() == token)
    }
}

/// Adapter that backs a family with user-supplied columns or a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Via {
    Matrix,
    Vector,
}

impl Via {
    pub fn constant(&self) -> &'static str {
        match self {
            Via::Matrix => "GMT_VIA_MATRIX",
            Via::Vector => "GMT_VIA_VECTOR",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "GMT_VIA_MATRIX" => Some(Via::Matrix),
            "GMT_VIA_VECTOR" => Some(Via::Vector),
            _ => None,
        }
    }
}

/// A validated family: one base plus at most one adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataFamily {
    pub base: BaseFamily,
    pub via: Option<Via>,
}

impl DataFamily {
    pub fn new(base: BaseFamily) -> Self {
        Self { base, via: None }
    }

    pub fn via(base: BaseFamily, via: Via) -> Self {
        Self {
            base,
            via: Some(via),
        }
    }

    /// Parse `BASE[|VIA]`, in either order.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || BridgeError::InvalidFamily(s.to_string());
        let mut base = None;
        let mut via = None;
        for token in s.split('|').map(str::trim) {
            if let Some(b) = BaseFamily::parse(token) {
                if base.replace(b).is_some() {
                    return Err(invalid());
                }
            } else if let Some(v) = Via::parse(token) {
                if via.replace(v).is_some() {
                    return Err(invalid());
                }
            } else {
                return Err(invalid());
            }
        }
        let base = base.ok_or_else(invalid)?;
        Ok(Self { base, via })
    }

    /// Columns are supplied one vector at a time.
    pub fn is_vector_backed(&self) -> bool {
        self.base == BaseFamily::Vector || self.via == Some(Via::Vector)
    }

    /// Values are supplied as one matrix.
    pub fn is_matrix_backed(&self) -> bool {
        self.base == BaseFamily::Matrix || self.via == Some(Via::Matrix)
    }

    pub fn is_image(&self) -> bool {
        self.base == BaseFamily::Image
    }

    /// Native value: base plus adapter.
    pub fn resolve(&self, session: &Session) -> Result<c_int> {
        let mut value = session.constant(self.base.constant())?;
        if let Some(via) = self.via {
            value += session.constant(via.constant())?;
        }
        Ok(value)
    }
}

impl fmt::Display for DataFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base.constant())?;
        if let Some(via) = self.via {
            write!(f, "|{}", via.constant())?;
        }
        Ok(())
    }
}

/// Container geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Geometry {
    None,
    Point,
    Line,
    Polygon,
    /// Points, lines and polygons
    Mixed,
    Surface,
}

impl Geometry {
    pub const ALL: [Geometry; 6] = [
        Geometry::None,
        Geometry::Point,
        Geometry::Line,
        Geometry::Polygon,
        Geometry::Mixed,
        Geometry::Surface,
    ];

    pub fn constant(&self) -> &'static str {
        match self {
            Geometry::None => "GMT_IS_NONE",
            Geometry::Point => "GMT_IS_POINT",
            Geometry::Line => "GMT_IS_LINE",
            Geometry::Polygon => "GMT_IS_POLY",
            Geometry::Mixed => "GMT_IS_PLP",
            Geometry::Surface => "GMT_IS_SURFACE",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "GMT_IS_POLYGON" => Ok(Geometry::Polygon),
            token => Self::ALL
                .into_iter()
                .find(|g| g.constant() == token)
                .ok_or_else(|| BridgeError::InvalidGeometry(s.to_string())),
        }
    }

    pub fn resolve(&self, session: &Session) -> Result<c_int> {
        session.constant(self.constant())
    }
}

/// How `GMT_Create_Data` allocates the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    /// Header and structure only; values are put later
    ContainerOnly,
    /// Structure plus allocated value arrays
    ContainerAndData,
    /// Placeholder that a module fills
    Output,
}

impl ModeKind {
    pub const ALL: [ModeKind; 3] = [ModeKind::ContainerOnly, ModeKind::ContainerAndData, ModeKind::Output];

    pub fn constant(&self) -> &'static str {
        match self {
            ModeKind::ContainerOnly => "GMT_CONTAINER_ONLY",
            ModeKind::ContainerAndData => "GMT_CONTAINER_AND_DATA",
            ModeKind::Output => "GMT_IS_OUTPUT",
        }
    }
}

/// A validated mode with an optional grid-type modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CreateMode {
    pub kind: ModeKind,
    pub gtype: Option<GridType>,
}

impl CreateMode {
    pub fn new(kind: ModeKind) -> Self {
        Self { kind, gtype: None }
    }

    /// Parse `MODE[|GMT_GRID_IS_CARTESIAN|GMT_GRID_IS_GEO]`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || BridgeError::InvalidMode(s.to_string());
        let mut kind = None;
        let mut gtype = None;
        for token in s.split('|').map(str::trim) {
            if let Some(k) = ModeKind::ALL.into_iter().find(|k| k.constant() == token) {
                if kind.replace(k).is_some() {
                    return Err(invalid());
                }
                continue;
            }
            let g = match token {
                "GMT_GRID_IS_CARTESIAN" => GridType::Cartesian,
                "GMT_GRID_IS_GEO" => GridType::Geographic,
                _ => return Err(invalid()),
            };
            if gtype.replace(g).is_some() {
                return Err(invalid());
            }
        }
        Ok(Self {
            kind: kind.ok_or_else(invalid)?,
            gtype,
        })
    }

    pub fn resolve(&self, session: &Session) -> Result<c_int> {
        let mut value = session.constant(self.kind.constant())?;
        match self.gtype {
            Some(GridType::Cartesian) => value += session.constant("GMT_GRID_IS_CARTESIAN")?,
            Some(GridType::Geographic) => value += session.constant("GMT_GRID_IS_GEO")?,
            None => {}
        }
        Ok(value)
    }
}
