//! Scene and terrain geometry in the radian form the projection needs.
//!
//! Inputs arrive in degrees: one heading for the whole scene and per-pixel
//! incidence and aspect rasters. They are converted here exactly once.
use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::error::{Error, Result};

/// Azimuth of the ground projection of the line of sight, from the heading.
pub fn heading_to_phi(heading_deg: f64) -> f64 {
    (-360.0 + heading_deg + 90.0).to_radians()
}

/// Elevation of the line of sight above the local horizontal.
pub fn incidence_to_theta(incidence_deg: f64) -> f64 {
    (90.0 - incidence_deg).to_radians()
}

/// Rotation angle aligning the ground basis with the downslope direction.
///
/// Floor modulo: the result lies in `[0, 2π)` for finite inputs.
pub fn aspect_to_omega(aspect_deg: f64) -> f64 {
    (aspect_deg - 90.0).rem_euclid(360.0).to_radians()
}

/// Radian geometry of one scene over a (possibly cropped) raster extent.
#[derive(Debug, Clone)]
pub struct AngleField {
    /// Heading, radians
    pub heading: f64,
    /// Scene-wide line-of-sight azimuth, radians
    pub phi: f64,
    /// Per-pixel line-of-sight elevation, radians
    pub theta: Array2<f64>,
    /// Per-pixel aspect rotation, radians
    pub omega: Array2<f64>,
}

impl AngleField {
    pub fn from_degrees(
        heading_deg: f64,
        incidence_deg: ArrayView2<'_, f32>,
        aspect_deg: ArrayView2<'_, f32>,
    ) -> Result<Self> {
        if incidence_deg.dim() != aspect_deg.dim() {
            return Err(Error::dimension_mismatch(
                "aspect raster",
                format!("{:?}", incidence_deg.dim()),
                format!("{:?}", aspect_deg.dim()),
            ));
        }
        let theta = incidence_deg.mapv(|v| incidence_to_theta(v as f64));
        let omega = aspect_deg.mapv(|v| aspect_to_omega(v as f64));
        let field = Self {
            heading: heading_deg.to_radians(),
            phi: heading_to_phi(heading_deg),
            theta,
            omega,
        };
        debug!(
            "Heading = {:.6} rad ({} deg), phi = {:.6} rad ({} deg)",
            field.heading,
            heading_deg,
            field.phi,
            -360.0 + heading_deg + 90.0
        );
        Ok(field)
    }

    /// Same incidence and aspect at every pixel of a `rows x cols` extent.
    pub fn uniform(
        heading_deg: f64,
        incidence_deg: f64,
        aspect_deg: f64,
        rows: usize,
        cols: usize,
    ) -> Self {
        Self {
            heading: heading_deg.to_radians(),
            phi: heading_to_phi(heading_deg),
            theta: Array2::from_elem((rows, cols), incidence_to_theta(incidence_deg)),
            omega: Array2::from_elem((rows, cols), aspect_to_omega(aspect_deg)),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.theta.dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::f64::consts::PI;

    #[test]
    fn phi_from_heading() {
        // -360 + 100 + 90 = -170 degrees
        assert_abs_diff_eq!(heading_to_phi(100.0), -170.0_f64.to_radians(), epsilon = 1e-12);
        assert_abs_diff_eq!(heading_to_phi(270.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn theta_from_incidence() {
        assert_abs_diff_eq!(incidence_to_theta(32.0), 58.0_f64.to_radians(), epsilon = 1e-12);
        assert_abs_diff_eq!(incidence_to_theta(0.0), PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn omega_wraps_into_positive_range() {
        assert_abs_diff_eq!(aspect_to_omega(200.0), 110.0_f64.to_radians(), epsilon = 1e-12);
        // 45 - 90 = -45 -> 315
        assert_abs_diff_eq!(aspect_to_omega(45.0), 315.0_f64.to_radians(), epsilon = 1e-12);
        assert_abs_diff_eq!(aspect_to_omega(90.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(aspect_to_omega(450.0), 0.0, epsilon = 1e-12);
        assert!(aspect_to_omega(f64::NAN).is_nan());
    }

    #[test]
    fn field_from_rasters() {
        let inc = array![[32.0_f32, 40.0], [20.0, 32.0]];
        let asp = array![[200.0_f32, 0.0], [90.0, 360.0]];
        let field = AngleField::from_degrees(100.0, inc.view(), asp.view()).unwrap();
        assert_eq!(field.dim(), (2, 2));
        assert_abs_diff_eq!(field.theta[[0, 1]], 50.0_f64.to_radians(), epsilon = 1e-9);
        assert_abs_diff_eq!(field.omega[[0, 1]], 270.0_f64.to_radians(), epsilon = 1e-9);
        assert_abs_diff_eq!(field.omega[[1, 1]], 270.0_f64.to_radians(), epsilon = 1e-9);
        assert_abs_diff_eq!(field.heading, 100.0_f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn mismatched_rasters_are_format_errors() {
        let inc = Array2::<f32>::zeros((2, 3));
        let asp = Array2::<f32>::zeros((3, 2));
        let err = AngleField::from_degrees(100.0, inc.view(), asp.view()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
    }
}
