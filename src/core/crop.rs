use ndarray::{Array2, Array3, ArrayView2, ArrayView3, s};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Rectangular region of interest applied uniformly to every raster of a run.
///
/// Bounds are half-open pixel indices: rows `row_min..row_max`, columns
/// `col_min..col_max`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct CropWindow {
    pub row_min: usize,
    pub row_max: usize,
    pub col_min: usize,
    pub col_max: usize,
}

impl CropWindow {
    pub fn new(row_min: usize, row_max: usize, col_min: usize, col_max: usize) -> Self {
        Self {
            row_min,
            row_max,
            col_min,
            col_max,
        }
    }

    pub fn rows(&self) -> usize {
        self.row_max.saturating_sub(self.row_min)
    }

    pub fn cols(&self) -> usize {
        self.col_max.saturating_sub(self.col_min)
    }

    /// Check `0 <= row_min < row_max <= rows` and the same for columns.
    pub fn validate(&self, rows: usize, cols: usize) -> Result<()> {
        if self.row_min >= self.row_max || self.col_min >= self.col_max {
            return Err(Error::InvalidCrop(format!(
                "{} has an empty or inverted extent",
                self
            )));
        }
        if self.row_max > rows || self.col_max > cols {
            return Err(Error::CropOutOfRange {
                window: *self,
                rows,
                cols,
            });
        }
        Ok(())
    }

    /// Suffix appended to output names of a cropped run.
    pub fn name_suffix(&self) -> String {
        format!(
            "_crop_{}_{}_{}_{}",
            self.row_min, self.row_max, self.col_min, self.col_max
        )
    }

    pub fn apply2<T: Clone>(&self, data: ArrayView2<'_, T>) -> Result<Array2<T>> {
        let (rows, cols) = data.dim();
        self.validate(rows, cols)?;
        Ok(data
            .slice(s![self.row_min..self.row_max, self.col_min..self.col_max])
            .to_owned())
    }

    pub fn apply3<T: Clone>(&self, data: ArrayView3<'_, T>) -> Result<Array3<T>> {
        let (rows, cols, _) = data.dim();
        self.validate(rows, cols)?;
        Ok(data
            .slice(s![self.row_min..self.row_max, self.col_min..self.col_max, ..])
            .to_owned())
    }
}

impl std::fmt::Display for CropWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}:{}, {}:{}]",
            self.row_min, self.row_max, self.col_min, self.col_max
        )
    }
}

impl std::str::FromStr for CropWindow {
    type Err = Error;

    /// Parses `row_min,row_max,col_min,col_max`.
    fn from_str(s: &str) -> Result<Self> {
        let vals = s
            .split(',')
            .map(|p| p.trim().parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidCrop(format!("'{}' is not four integers", s)))?;
        match vals.as_slice() {
            [r0, r1, c0, c1] => Ok(CropWindow::new(*r0, *r1, *c0, *c1)),
            _ => Err(Error::InvalidCrop(format!(
                "expected row_min,row_max,col_min,col_max, got '{}'",
                s
            ))),
        }
    }
}

/// Validate an optional crop against a full raster extent and log the
/// resulting processing extent.
pub fn resolve_extent(
    crop: Option<&CropWindow>,
    rows: usize,
    cols: usize,
) -> Result<(usize, usize)> {
    match crop {
        Some(window) => {
            window.validate(rows, cols)?;
            info!(
                "Crop option is set: {} -> extent {}x{}",
                window,
                window.rows(),
                window.cols()
            );
            Ok((window.rows(), window.cols()))
        }
        None => {
            info!("No crop option set, processing full extent {}x{}", rows, cols);
            Ok((rows, cols))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::Array3;

    #[test]
    fn parses_four_integers() {
        let w: CropWindow = "1, 3,0,2".parse().unwrap();
        assert_eq!(w, CropWindow::new(1, 3, 0, 2));
        assert_eq!(w.name_suffix(), "_crop_1_3_0_2");

        let err = "1,3,0".parse::<CropWindow>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
        assert!("a,b,c,d".parse::<CropWindow>().is_err());
    }

    #[test]
    fn validate_bounds() {
        assert!(CropWindow::new(0, 4, 0, 5).validate(4, 5).is_ok());
        // empty
        assert_eq!(
            CropWindow::new(2, 2, 0, 5).validate(4, 5).unwrap_err().kind(),
            ErrorKind::Range
        );
        // inverted
        assert!(CropWindow::new(0, 4, 3, 1).validate(4, 5).is_err());
        // outside
        assert!(matches!(
            CropWindow::new(0, 5, 0, 5).validate(4, 5),
            Err(Error::CropOutOfRange { rows: 4, cols: 5, .. })
        ));
        assert!(CropWindow::new(0, 4, 0, 6).validate(4, 5).is_err());
    }

    #[test]
    fn slices_all_bands() {
        let cube = Array3::from_shape_fn((4, 5, 2), |(i, j, k)| (i * 100 + j * 10 + k) as f32);
        let out = CropWindow::new(1, 3, 2, 5).apply3(cube.view()).unwrap();
        assert_eq!(out.dim(), (2, 3, 2));
        assert_eq!(out[[0, 0, 0]], 120.0);
        assert_eq!(out[[1, 2, 1]], 241.0);
    }

    #[test]
    fn full_extent_without_crop() {
        assert_eq!(resolve_extent(None, 7, 9).unwrap(), (7, 9));
        let w = CropWindow::new(1, 4, 2, 3);
        assert_eq!(resolve_extent(Some(&w), 7, 9).unwrap(), (3, 1));
    }
}
