//! Rasters
//!
//! Single-band grids and multi-band images with their coordinate vectors.
//! Rows are stored with y ascending (south first).

use std::fmt;

use ndarray::{Array2, Array3};

use crate::error::{BridgeError, Result};

/// Grid registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Registration {
    /// Values sit on grid lines
    #[default]
    Gridline,
    /// Values sit at cell centers
    Pixel,
}

impl Registration {
    /// Native constant name
    pub fn constant(&self) -> &'static str {
        match self {
            Registration::Gridline => "GMT_GRID_NODE_REG",
            Registration::Pixel => "GMT_GRID_PIXEL_REG",
        }
    }

    /// Parse a native constant name
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "GMT_GRID_NODE_REG" => Ok(Registration::Gridline),
            "GMT_GRID_PIXEL_REG" => Ok(Registration::Pixel),
            other => Err(BridgeError::InvalidRegistration(other.to_string())),
        }
    }

    /// Decode the value stored in a grid header.
    pub fn from_code(code: u32) -> Self {
        if code == 1 {
            Registration::Pixel
        } else {
            Registration::Gridline
        }
    }
}

/// Coordinate system of a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GridType {
    #[default]
    Cartesian,
    Geographic,
}

impl GridType {
    /// Decode a header `grdtype`; every non-zero value is a geographic flavor.
    pub fn from_code(code: u32) -> Self {
        if code == 0 {
            GridType::Cartesian
        } else {
            GridType::Geographic
        }
    }
}

impl fmt::Display for GridType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridType::Cartesian => write!(f, "cartesian"),
            GridType::Geographic => write!(f, "geographic"),
        }
    }
}

/// Raster values
#[derive(Debug, Clone, PartialEq)]
pub enum RasterData {
    /// rows x cols
    Grid(Array2<f32>),
    /// bands x rows x cols
    Image(Array3<u8>),
}

/// A raster with coordinates and metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub data: RasterData,
    /// Column coordinates, ascending
    pub x: Vec<f64>,
    /// Row coordinates, ascending
    pub y: Vec<f64>,
    pub registration: Registration,
    pub gtype: GridType,
}

impl Raster {
    /// Build a single-band grid; `data` is `y.len()` x `x.len()`.
    pub fn grid(data: Array2<f32>, x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        check_dims(data.dim(), x.len(), y.len())?;
        Ok(Self {
            data: RasterData::Grid(data),
            x,
            y,
            registration: Registration::Gridline,
            gtype: GridType::Cartesian,
        })
    }

    /// Build a multi-band image; `data` is bands x `y.len()` x `x.len()`.
    pub fn image(data: Array3<u8>, x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        let (_, rows, cols) = data.dim();
        check_dims((rows, cols), x.len(), y.len())?;
        Ok(Self {
            data: RasterData::Image(data),
            x,
            y,
            registration: Registration::Gridline,
            gtype: GridType::Cartesian,
        })
    }

    pub fn with_registration(mut self, registration: Registration) -> Self {
        self.registration = registration;
        self
    }

    pub fn with_gtype(mut self, gtype: GridType) -> Self {
        self.gtype = gtype;
        self
    }

    pub fn n_columns(&self) -> usize {
        self.x.len()
    }

    pub fn n_rows(&self) -> usize {
        self.y.len()
    }

    pub fn n_bands(&self) -> usize {
        match &self.data {
            RasterData::Grid(_) => 1,
            RasterData::Image(a) => a.dim().0,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.data, RasterData::Image(_))
    }

    /// Spacing `[dx, dy]`; coordinates must be regular.
    pub fn increment(&self) -> Result<[f64; 2]> {
        Ok([spacing(&self.x, "x")?, spacing(&self.y, "y")?])
    }

    /// Region `[west, east, south, north]` honoring the registration.
    pub fn region(&self) -> Result<[f64; 4]> {
        let [dx, dy] = self.increment()?;
        let (hx, hy) = match self.registration {
            Registration::Gridline => (0.0, 0.0),
            Registration::Pixel => (dx / 2.0, dy / 2.0),
        };
        let (first_x, last_x) = (self.x[0], self.x[self.x.len() - 1]);
        let (first_y, last_y) = (self.y[0], self.y[self.y.len() - 1]);
        Ok([first_x - hx, last_x + hx, first_y - hy, last_y + hy])
    }
}

fn check_dims((rows, cols): (usize, usize), nx: usize, ny: usize) -> Result<()> {
    if rows != ny || cols != nx {
        return Err(BridgeError::ShapeMismatch {
            expected: format!("{} x {} (y x x)", ny, nx),
            got: format!("{} x {}", rows, cols),
        });
    }
    Ok(())
}

fn spacing(coords: &[f64], axis: &str) -> Result<f64> {
    if coords.len() < 2 {
        return Err(BridgeError::ShapeMismatch {
            expected: format!("at least 2 {} coordinates", axis),
            got: coords.len().to_string(),
        });
    }
    let step = coords[1] - coords[0];
    let tolerance = step.abs() * 1e-6;
    let regular = coords
        .windows(2)
        .all(|w| ((w[1] - w[0]) - step).abs() <= tolerance);
    if step <= 0.0 || !regular {
        return Err(BridgeError::ShapeMismatch {
            expected: format!("regularly increasing {} coordinates", axis),
            got: "irregular spacing".to_string(),
        });
    }
    Ok(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Raster {
        let data = Array2::from_shape_vec((2, 3), vec![0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        Raster::grid(data, vec![10.0, 11.0, 12.0], vec![-5.0, -4.5]).unwrap()
    }

    #[test]
    fn test_gridline_region() {
        let r = sample();
        assert_eq!(r.increment().unwrap(), [1.0, 0.5]);
        assert_eq!(r.region().unwrap(), [10.0, 12.0, -5.0, -4.5]);
    }

    #[test]
    fn test_pixel_region() {
        let r = sample().with_registration(Registration::Pixel);
        assert_eq!(r.region().unwrap(), [9.5, 12.5, -5.25, -4.25]);
    }

    #[test]
    fn test_dimension_check() {
        let data = Array2::<f32>::zeros((3, 3));
        let err = Raster::grid(data, vec![0.0, 1.0, 2.0], vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(err, BridgeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_irregular_spacing_rejected() {
        let data = Array2::<f32>::zeros((2, 3));
        let r = Raster::grid(data, vec![0.0, 1.0, 3.0], vec![0.0, 1.0]).unwrap();
        assert!(r.increment().is_err());
    }

    #[test]
    fn test_codes() {
        assert_eq!(Registration::from_code(1), Registration::Pixel);
        assert_eq!(Registration::from_code(0), Registration::Gridline);
        assert_eq!(GridType::from_code(2), GridType::Geographic);
        assert_eq!(Registration::parse("GMT_GRID_PIXEL_REG").unwrap(), Registration::Pixel);
        assert!(Registration::parse("PIXEL").is_err());
    }
}
