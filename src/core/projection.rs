//! Per-pixel projection of (azimuth, range) observations onto the
//! (steepest-slope, vertical) displacement components.
//!
//! Each pixel gets a 2x2 system `G` built from the scene heading and the
//! pixel's incidence/aspect geometry. `G` does not depend on time, so it is
//! built once per pixel and applied to every slice of the cubes. Pixels are
//! independent and processed in parallel.
use ndarray::{Array2, ArrayView2, Axis, Zip};
use tracing::{debug, info};

use crate::core::angles::AngleField;
use crate::error::{Error, Result};
use crate::types::{Cube, CubeShape};

/// Determinants below this magnitude are treated as singular.
///
/// Only exact degeneracies are caught. A pixel a few thousandths of a degree
/// off `heading + aspect - 90 = 90 (mod 180)` still inverts, with its
/// observations amplified by up to `1 / |det|` (around 1e5) before they are
/// stored as f32.
pub const SINGULAR_DET_EPS: f64 = 1e-9;

/// The reduced 2x2 observation matrix of one pixel.
///
/// Rows are the azimuth and range observation equations, columns the
/// slope-parallel and vertical unknowns.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProjectionMatrix {
    pub g: [[f64; 2]; 2],
}

impl ProjectionMatrix {
    /// Build `G` for one pixel. All angles in radians.
    pub fn from_angles(heading: f64, phi: f64, theta: f64, omega: f64) -> Self {
        let proj = [
            [heading.cos(), heading.sin(), 0.0],
            [phi.cos() * theta.cos(), phi.sin() * theta.cos(), theta.sin()],
        ];
        let (sin_o, cos_o) = omega.sin_cos();
        let r_aspect = [[cos_o, sin_o, 0.0], [-sin_o, cos_o, 0.0], [0.0, 0.0, 1.0]];

        let mut full = [[0.0_f64; 3]; 2];
        for (i, row) in full.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| proj[i][k] * r_aspect[k][j]).sum();
            }
        }

        // Keep the slope-parallel (0) and vertical (2) columns; displacement
        // across the slope is assumed to be zero.
        Self {
            g: [[full[0][0], full[0][2]], [full[1][0], full[1][2]]],
        }
    }

    pub fn determinant(&self) -> f64 {
        self.g[0][0] * self.g[1][1] - self.g[0][1] * self.g[1][0]
    }

    pub fn is_singular(&self) -> bool {
        let det = self.determinant();
        !det.is_finite() || det.abs() < SINGULAR_DET_EPS
    }

    /// `G⁻¹`, or `None` when `G` is singular or near-singular.
    pub fn inverse(&self) -> Option<[[f64; 2]; 2]> {
        if self.is_singular() {
            return None;
        }
        let det = self.determinant();
        let [[a, b], [c, d]] = self.g;
        Some([[d / det, -b / det], [-c / det, a / det]])
    }

    /// Solve for `(u_slope, u_z)` from `(u_az, u_rg)`.
    pub fn solve(&self, u_az: f64, u_rg: f64) -> Option<(f64, f64)> {
        self.inverse().map(|inv| apply(&inv, u_az, u_rg))
    }

    /// Forward model: `(u_az, u_rg) = G · (u_slope, u_z)`.
    pub fn project(&self, u_slope: f64, u_z: f64) -> (f64, f64) {
        apply(&self.g, u_slope, u_z)
    }
}

#[inline]
fn apply(m: &[[f64; 2]; 2], x: f64, y: f64) -> (f64, f64) {
    (m[0][0] * x + m[0][1] * y, m[1][0] * x + m[1][1] * y)
}

/// Counters gathered during one cube inversion.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct InversionStats {
    pub pixels: usize,
    /// Pixels whose `G` could not be inverted; all their slices are no-data
    pub singular_pixels: usize,
    /// Cells with no-data in either input cube
    pub nodata_cells: usize,
}

/// The two output cubes of an inversion.
#[derive(Debug, Clone)]
pub struct InvertedCubes {
    pub slope: Cube,
    pub vertical: Cube,
    pub stats: InversionStats,
}

/// Per-pixel `G` over the whole extent of `angles`.
pub fn projection_matrices(angles: &AngleField) -> Array2<ProjectionMatrix> {
    let heading = angles.heading;
    let phi = angles.phi;
    Zip::from(&angles.theta)
        .and(&angles.omega)
        .par_map_collect(|&theta, &omega| ProjectionMatrix::from_angles(heading, phi, theta, omega))
}

/// Invert every pixel and slice of a pair of cubes.
///
/// Singular pixels and no-data inputs yield `NaN` in both outputs; nothing
/// here fails once the extents agree.
pub fn invert_cubes(range: &Cube, azimuth: &Cube, angles: &AngleField) -> Result<InvertedCubes> {
    let shape = CubeShape::of(range);
    if azimuth.dim() != range.dim() {
        return Err(Error::dimension_mismatch(
            "azimuth cube",
            shape,
            CubeShape::of(azimuth),
        ));
    }
    if angles.dim() != (shape.rows, shape.cols) {
        return Err(Error::dimension_mismatch(
            "angle rasters",
            format!("{}x{}", shape.rows, shape.cols),
            format!("{}x{}", angles.dim().0, angles.dim().1),
        ));
    }

    let matrices = projection_matrices(angles);
    let singular_pixels = matrices.iter().filter(|g| g.is_singular()).count();
    let nodata_cells = Zip::from(range)
        .and(azimuth)
        .fold(0usize, |acc, r, a| acc + usize::from(r.is_nan() || a.is_nan()));

    info!(
        "Inverting {} slices over {}x{} pixels ({} singular)",
        shape.bands, shape.rows, shape.cols, singular_pixels
    );

    let mut slope = Cube::from_elem(range.dim(), f32::NAN);
    let mut vertical = Cube::from_elem(range.dim(), f32::NAN);

    Zip::from(slope.lanes_mut(Axis(2)))
        .and(vertical.lanes_mut(Axis(2)))
        .and(azimuth.lanes(Axis(2)))
        .and(range.lanes(Axis(2)))
        .and(&matrices)
        .par_for_each(|mut s, mut z, az, rg, g| {
            let Some(inv) = g.inverse() else {
                return;
            };
            for t in 0..az.len() {
                let (u_az, u_rg) = (az[t] as f64, rg[t] as f64);
                if u_az.is_nan() || u_rg.is_nan() {
                    continue;
                }
                let (u_slope, u_z) = apply(&inv, u_az, u_rg);
                s[t] = u_slope as f32;
                z[t] = u_z as f32;
            }
        });

    let stats = InversionStats {
        pixels: shape.rows * shape.cols,
        singular_pixels,
        nodata_cells,
    };
    debug!("Inversion stats: {:?}", stats);

    Ok(InvertedCubes {
        slope,
        vertical,
        stats,
    })
}

/// Invert a single pair of maps in double precision.
pub fn invert_map(
    azimuth: ArrayView2<'_, f64>,
    range: ArrayView2<'_, f64>,
    angles: &AngleField,
) -> Result<(Array2<f64>, Array2<f64>)> {
    if azimuth.dim() != range.dim() || range.dim() != angles.dim() {
        return Err(Error::dimension_mismatch(
            "map inversion inputs",
            format!("{:?}", angles.dim()),
            format!("{:?} / {:?}", azimuth.dim(), range.dim()),
        ));
    }
    let matrices = projection_matrices(angles);
    let mut slope = Array2::from_elem(range.dim(), f64::NAN);
    let mut vertical = Array2::from_elem(range.dim(), f64::NAN);

    Zip::from(&mut slope)
        .and(&mut vertical)
        .and(azimuth)
        .and(range)
        .and(&matrices)
        .par_for_each(|s, z, &u_az, &u_rg, g| {
            if let Some((u_slope, u_z)) = g.solve(u_az, u_rg) {
                *s = u_slope;
                *z = u_z;
            }
        });

    Ok((slope, vertical))
}

/// Forward-project slope/vertical maps back to (azimuth, range) observations.
pub fn project_map(
    slope: ArrayView2<'_, f64>,
    vertical: ArrayView2<'_, f64>,
    angles: &AngleField,
) -> (Array2<f64>, Array2<f64>) {
    let matrices = projection_matrices(angles);
    let mut azimuth = Array2::zeros(slope.dim());
    let mut range = Array2::zeros(slope.dim());

    Zip::from(&mut azimuth)
        .and(&mut range)
        .and(slope)
        .and(vertical)
        .and(&matrices)
        .par_for_each(|a, r, &u_slope, &u_z, g| {
            let (u_az, u_rg) = g.project(u_slope, u_z);
            *a = u_az;
            *r = u_rg;
        });

    (azimuth, range)
}
