//! Shared types used across slopecube.
//! Includes `CubeShape`, the output `Component` selector and the decoded `Cube` alias.
use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// In-memory displacement cube indexed `[row, column, slice]`; no-data is `NaN`.
pub type Cube = Array3<f32>;

/// Row/column/band extent of a cube.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct CubeShape {
    /// Lines
    pub rows: usize,
    /// Samples
    pub cols: usize,
    /// Time slices
    pub bands: usize,
}

impl CubeShape {
    pub fn new(rows: usize, cols: usize, bands: usize) -> Self {
        Self { rows, cols, bands }
    }

    pub fn of(cube: &Cube) -> Self {
        let (rows, cols, bands) = cube.dim();
        Self { rows, cols, bands }
    }

    /// Number of float32 values a file of this shape holds, `None` if that
    /// count does not fit in memory addressing.
    pub fn checked_len(&self) -> Option<usize> {
        self.rows
            .checked_mul(self.cols)?
            .checked_mul(self.bands)?
            .checked_mul(std::mem::size_of::<f32>())
            .map(|bytes| bytes / std::mem::size_of::<f32>())
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0 || self.bands == 0
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        (self.rows, self.cols, self.bands)
    }
}

impl std::fmt::Display for CubeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.rows, self.cols, self.bands)
    }
}

impl std::str::FromStr for CubeShape {
    type Err = String;

    /// Parses `rows,cols,bands`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected rows,cols,bands, got '{}'", s));
        }
        let mut vals = [0usize; 3];
        for (slot, part) in vals.iter_mut().zip(&parts) {
            *slot = part
                .parse::<usize>()
                .map_err(|_| format!("'{}' is not a non-negative integer", part))?;
        }
        let shape = CubeShape::new(vals[0], vals[1], vals[2]);
        if shape.checked_len().is_none() {
            return Err(format!("{} holds too many values", shape));
        }
        Ok(shape)
    }
}

/// Which of the two inverted displacement components a cube holds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Component {
    /// Displacement along the local steepest-slope direction
    Slope,
    /// Vertical displacement
    Vertical,
}

impl Component {
    /// Short tag used in output file names.
    pub fn tag(&self) -> &'static str {
        match self {
            Component::Slope => "uslope",
            Component::Vertical => "uz",
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Slope => write!(f, "Slope"),
            Component::Vertical => write!(f, "Vertical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dims() {
        let shape: CubeShape = "12, 7,3".parse().unwrap();
        assert_eq!(shape, CubeShape::new(12, 7, 3));
        assert_eq!(shape.checked_len(), Some(252));
        assert!("12,7".parse::<CubeShape>().is_err());
        assert!("12,-7,3".parse::<CubeShape>().is_err());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_shape_has_no_len() {
        let shape = CubeShape::new(1 << 32, 1 << 32, 2);
        assert_eq!(shape.checked_len(), None);
        assert!("4294967296,4294967296,2".parse::<CubeShape>().is_err());
        assert!(CubeShape::new(3, 0, 2).is_empty());
    }
}
