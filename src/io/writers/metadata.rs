use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::crop::CropWindow;
use crate::error::Result;
use crate::types::{Component, CubeShape};

/// Georeferencing copied from an input angle raster; never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Georef {
    /// Affine geotransform ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
    pub geotransform: [f64; 6],
    /// Projection in WKT or EPSG:XXXX form
    pub projection: String,
}

/// Provenance of one output cube, written as a JSON sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeMetadata {
    pub component: Component,
    pub samples: usize,
    pub lines: usize,
    pub bands: usize,
    pub heading_deg: f64,
    pub crop: Option<CropWindow>,
    pub range_cube: PathBuf,
    pub azimuth_cube: PathBuf,
    pub incidence: PathBuf,
    pub aspect: PathBuf,
    pub georef: Option<Georef>,
    pub singular_pixels: usize,
    pub nodata_cells: usize,
    pub created: String,
}

impl CubeMetadata {
    pub fn shape(&self) -> CubeShape {
        CubeShape::new(self.lines, self.samples, self.bands)
    }
}

pub fn metadata_path(dest_dir: &Path, name: &str) -> PathBuf {
    dest_dir.join(format!("{}.json", name))
}

/// Write `<name>.json` next to the cube.
pub fn write_metadata_sidecar(dest_dir: &Path, name: &str, meta: &CubeMetadata) -> Result<PathBuf> {
    let path = metadata_path(dest_dir, name);
    let json_string = serde_json::to_string_pretty(meta)?;
    std::fs::write(&path, json_string)?;
    info!("Created metadata sidecar: {:?}", path);
    Ok(path)
}

pub fn read_metadata_sidecar(path: &Path) -> Result<CubeMetadata> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
