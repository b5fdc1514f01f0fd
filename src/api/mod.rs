//! High-level library API: run a full cube inversion from an
//! `InversionParams`, or check the projection on the built-in synthetic scene.
//! Prefer these entrypoints over the low-level `core` and `io` modules.
use std::path::PathBuf;

use ndarray::{Array2, array};
use tracing::{debug, info, warn};

use crate::core::angles::AngleField;
use crate::core::crop::resolve_extent;
use crate::core::params::InversionParams;
use crate::core::projection::{
    InversionStats, ProjectionMatrix, invert_cubes, invert_map, project_map,
};
use crate::error::{Error, Result};
use crate::io::cube::{self, find_header};
use crate::io::gdal::read_angle_raster;
use crate::io::writers::envi::{header_path, pixel_plot_path};
use crate::io::writers::metadata::metadata_path;
use crate::io::writers::{CubeMetadata, Georef, write_metadata_sidecar};
use crate::types::{Component, Cube, CubeShape};

/// Outcome of a successful `run_inversion`.
#[derive(Debug, Clone)]
pub struct InversionReport {
    /// Shape of the written cubes (after cropping)
    pub shape: CubeShape,
    pub slope_path: PathBuf,
    pub vertical_path: PathBuf,
    pub stats: InversionStats,
}

/// Shape of the input cubes: declared in params, else read from the range
/// cube header. An azimuth cube header, if present, must agree.
pub fn resolve_shape(params: &InversionParams) -> Result<CubeShape> {
    let shape = match params.dims {
        Some(dims) => dims,
        None => cube::read_header(&params.range_cube)?,
    };
    if find_header(&params.azimuth_cube).is_some() {
        let azimuth_shape = cube::read_header(&params.azimuth_cube)?;
        if azimuth_shape != shape {
            return Err(Error::dimension_mismatch(
                "azimuth cube header",
                shape,
                azimuth_shape,
            ));
        }
    }
    Ok(shape)
}

fn log_center_pixel(angles: &AngleField) {
    let (rows, cols) = angles.dim();
    if rows == 0 || cols == 0 {
        return;
    }
    let (i, j) = (rows / 2, cols / 2);
    let g = ProjectionMatrix::from_angles(
        angles.heading,
        angles.phi,
        angles.theta[[i, j]],
        angles.omega[[i, j]],
    );
    info!(
        "Pixel ({},{}): theta = {:.6} rad ({:.3} deg), omega = {:.6} rad ({:.3} deg)",
        i,
        j,
        angles.theta[[i, j]],
        angles.theta[[i, j]].to_degrees(),
        angles.omega[[i, j]],
        angles.omega[[i, j]].to_degrees()
    );
    info!("G for pixel ({},{}): {:?} (det {:.6})", i, j, g.g, g.determinant());
}

/// Load, invert and save: the whole slope/vertical projection of one scene.
///
/// Every check (header, crop, file sizes, raster extents) runs before the
/// inversion; nothing is written unless all of them pass.
pub fn run_inversion(params: &InversionParams) -> Result<InversionReport> {
    params.validate()?;

    let shape = resolve_shape(params)?;
    let crop = params.crop.as_ref();
    let (rows, cols) = resolve_extent(crop, shape.rows, shape.cols)?;

    let range = cube::open_cropped(&params.range_cube, shape, crop)?;
    let azimuth = cube::open_cropped(&params.azimuth_cube, shape, crop)?;

    let incidence = read_angle_raster(&params.incidence, shape.rows, shape.cols, crop)?;
    let aspect = read_angle_raster(&params.aspect, shape.rows, shape.cols, crop)?;
    let angles = AngleField::from_degrees(
        params.heading,
        incidence.degrees.view(),
        aspect.degrees.view(),
    )?;
    log_center_pixel(&angles);

    let inverted = invert_cubes(&range, &azimuth, &angles)?;
    let out_shape = CubeShape::new(rows, cols, shape.bands);
    if inverted.stats.singular_pixels > 0 {
        warn!(
            "{} of {} pixels have a singular projection and were set to no-data",
            inverted.stats.singular_pixels, inverted.stats.pixels
        );
    }

    std::fs::create_dir_all(&params.dest)?;
    let georef = aspect.georef.or(incidence.georef);
    let slope_path = save_component(
        params,
        Component::Slope,
        &inverted.slope,
        &inverted.stats,
        georef.clone(),
    )?;
    let vertical_path = match save_component(
        params,
        Component::Vertical,
        &inverted.vertical,
        &inverted.stats,
        georef,
    ) {
        Ok(path) => path,
        Err(e) => {
            remove_component(params, Component::Slope);
            return Err(e);
        }
    };

    Ok(InversionReport {
        shape: out_shape,
        slope_path,
        vertical_path,
        stats: inverted.stats,
    })
}

fn save_component(
    params: &InversionParams,
    component: Component,
    data: &Cube,
    stats: &InversionStats,
    georef: Option<Georef>,
) -> Result<PathBuf> {
    let name = params.output_name(component);
    let written = cube::save(data, &params.dest, &name).and_then(|path| {
        write_component_metadata(params, component, data, stats, georef, &name)?;
        Ok(path)
    });
    if written.is_err() {
        remove_component(params, component);
    }
    written
}

fn write_component_metadata(
    params: &InversionParams,
    component: Component,
    data: &Cube,
    stats: &InversionStats,
    georef: Option<Georef>,
    name: &str,
) -> Result<()> {
    let shape = CubeShape::of(data);
    let meta = CubeMetadata {
        component,
        samples: shape.cols,
        lines: shape.rows,
        bands: shape.bands,
        heading_deg: params.heading,
        crop: params.crop,
        range_cube: params.range_cube.clone(),
        azimuth_cube: params.azimuth_cube.clone(),
        incidence: params.incidence.clone(),
        aspect: params.aspect.clone(),
        georef,
        singular_pixels: stats.singular_pixels,
        nodata_cells: stats.nodata_cells,
        created: chrono::Utc::now().to_rfc3339(),
    };
    write_metadata_sidecar(&params.dest, name, &meta)?;
    Ok(())
}

/// Delete whatever part of one component's output set exists, so a failed
/// run leaves no partial outputs behind.
fn remove_component(params: &InversionParams, component: Component) {
    let name = params.output_name(component);
    let dest = params.dest.as_path();
    for path in [
        dest.join(&name),
        header_path(dest, &name),
        pixel_plot_path(dest, &name),
        metadata_path(dest, &name),
    ] {
        match std::fs::remove_file(&path) {
            Ok(()) => debug!("Removed partial output {:?}", path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove partial output {:?}: {}", path, e),
        }
    }
}

/// Result of inverting the synthetic scene and projecting it back.
#[derive(Debug, Clone)]
pub struct SyntheticReport {
    pub u_az: Array2<f64>,
    pub u_rg: Array2<f64>,
    pub u_slope: Array2<f64>,
    pub u_z: Array2<f64>,
    /// Largest absolute difference between the observations and their
    /// reprojection through `G`
    pub max_residual: f64,
}

/// Ascending acquisition geometry of the synthetic scene (heading, incidence, aspect).
pub const SYNTHETIC_GEOMETRY: (f64, f64, f64) = (100.0, 32.0, 200.0);

/// Invert a small synthetic scene and reproject the solution.
pub fn synthetic_check() -> Result<SyntheticReport> {
    let u_az = array![[5.0, 7.0, 2.0, 9.0, 7.0], [3.0, 4.0, 7.0, 9.0, 7.0]];
    let u_rg = array![[-3.0, -8.0, -6.0, -7.0, -5.0], [-5.0, -8.0, -5.0, -6.0, -3.0]];
    let (heading, incidence, aspect) = SYNTHETIC_GEOMETRY;
    let (rows, cols) = u_az.dim();
    let angles = AngleField::uniform(heading, incidence, aspect, rows, cols);

    let (u_slope, u_z) = invert_map(u_az.view(), u_rg.view(), &angles)?;
    let (az_back, rg_back) = project_map(u_slope.view(), u_z.view(), &angles);

    let max_residual = az_back
        .iter()
        .zip(u_az.iter())
        .chain(rg_back.iter().zip(u_rg.iter()))
        .map(|(a, b)| (a - b).abs())
        .fold(0.0_f64, f64::max);
    debug!("Synthetic u_slope: {:?}", u_slope);
    debug!("Synthetic u_z: {:?}", u_z);

    Ok(SyntheticReport {
        u_az,
        u_rg,
        u_slope,
        u_z,
        max_residual,
    })
}

/// In-memory inversion of a cube pair with uniform incidence and aspect.
pub fn invert_uniform(
    range: &Cube,
    azimuth: &Cube,
    heading_deg: f64,
    incidence_deg: f64,
    aspect_deg: f64,
) -> Result<(Cube, Cube)> {
    let (rows, cols, _) = range.dim();
    let angles = AngleField::uniform(heading_deg, incidence_deg, aspect_deg, rows, cols);
    let out = invert_cubes(range, azimuth, &angles)?;
    Ok((out.slope, out.vertical))
}
