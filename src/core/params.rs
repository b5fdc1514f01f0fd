use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::crop::CropWindow;
use crate::error::{Error, Result};
use crate::types::{Component, CubeShape};

/// Inversion parameters suitable for config files and the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InversionParams {
    /// Geocoded slant-range displacement cube
    pub range_cube: PathBuf,
    /// Geocoded azimuth displacement cube
    pub azimuth_cube: PathBuf,
    /// Incidence angle raster, degrees
    pub incidence: PathBuf,
    /// Aspect raster, degrees from North, clockwise
    pub aspect: PathBuf,
    /// Scene heading, degrees
    pub heading: f64,
    /// Destination directory for output cubes
    pub dest: PathBuf,
    /// Naming extension of the output cubes
    pub ext: String,
    /// Optional region of interest
    #[serde(default)]
    pub crop: Option<CropWindow>,
    /// Shape of the input cubes; read from the range cube header when `None`
    #[serde(default)]
    pub dims: Option<CubeShape>,
}

impl Default for InversionParams {
    fn default() -> Self {
        Self {
            range_cube: PathBuf::new(),
            azimuth_cube: PathBuf::new(),
            incidence: PathBuf::new(),
            aspect: PathBuf::new(),
            heading: 0.0,
            dest: PathBuf::from("."),
            ext: "slope".to_string(),
            crop: None,
            dims: None,
        }
    }
}

impl InversionParams {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let params: InversionParams = serde_json::from_str(&text)?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        for (arg, path) in [
            ("range_cube", &self.range_cube),
            ("azimuth_cube", &self.azimuth_cube),
            ("incidence", &self.incidence),
            ("aspect", &self.aspect),
        ] {
            if path.as_os_str().is_empty() {
                return Err(Error::MissingArgument {
                    arg: arg.to_string(),
                });
            }
        }
        if !self.heading.is_finite() {
            return Err(Error::InvalidArgument {
                arg: "heading",
                value: self.heading.to_string(),
            });
        }
        if self.ext.is_empty() || self.ext.contains(std::path::is_separator) {
            return Err(Error::InvalidArgument {
                arg: "ext",
                value: self.ext.clone(),
            });
        }
        if let Some(dims) = self.dims {
            if dims.is_empty() {
                return Err(Error::InvalidHeader {
                    path: self.range_cube.clone(),
                    reason: format!("declared shape {} is empty", dims),
                });
            }
        }
        Ok(())
    }

    /// `depl_cumule_<tag>_<ext>`, with the crop suffix for cropped runs.
    pub fn output_name(&self, component: Component) -> String {
        let base = format!("depl_cumule_{}_{}", component.tag(), self.ext);
        match &self.crop {
            Some(window) => format!("{}{}", base, window.name_suffix()),
            None => base,
        }
    }
}
