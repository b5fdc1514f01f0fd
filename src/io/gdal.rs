use gdal::{Dataset, errors::GdalError as GdalCrateError};
use ndarray::Array2;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::crop::CropWindow;
use crate::error::{Error, Result};
use crate::io::cube::{find_header, read_raw_band};
use crate::io::writers::Georef;

/// Errors encountered when using the GDAL reader
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Metadata extracted from a GDAL-supported raster
#[derive(Debug, Clone)]
pub struct RasterMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    /// Affine geotransform, `None` when the dataset has none
    pub geotransform: Option<[f64; 6]>,
    /// Projection in WKT or EPSG:XXXX form
    pub projection: String,
}

/// Single-band angle raster reader backed by GDAL
pub struct GdalRaster {
    pub dataset: Dataset,
    pub metadata: RasterMetadata,
}

// Helper to extract EPSG code from WKT authority tag
fn parse_epsg(wkt: &str) -> Option<String> {
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    if let Some(idx) = wkt.rfind(KEY) {
        let start = idx + KEY.len();
        if let Some(end) = wkt[start..].find('"') {
            let code = &wkt[start..start + end];
            return Some(format!("EPSG:{}", code));
        }
    }
    None
}

impl GdalRaster {
    /// Open a GDAL-supported dataset (e.g., GeoTIFF, VRT, ENVI)
    pub fn open<P: AsRef<Path>>(path: P) -> std::result::Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
        }
        let geotransform = dataset.geo_transform().ok();
        let proj = dataset.projection();
        let projection = if proj.starts_with("EPSG:") {
            proj
        } else if let Some(code) = parse_epsg(&proj) {
            code
        } else {
            proj
        };
        Ok(GdalRaster {
            dataset,
            metadata: RasterMetadata {
                size_x,
                size_y,
                bands,
                geotransform,
                projection,
            },
        })
    }

    /// Read band 1 as an f32 ndarray of shape (height, width); the band's
    /// no-data value, if any, becomes `NaN`.
    pub fn read_first_band(&self) -> Result<Array2<f32>> {
        let band = self.dataset.rasterband(1).map_err(GdalError::from)?;
        let window = (self.metadata.size_x, self.metadata.size_y);
        let buf = band
            .read_as::<f32>((0, 0), window, window, None)
            .map_err(GdalError::from)?;
        let nodata = band.no_data_value();
        let data_vec: Vec<f32> = buf
            .data()
            .iter()
            .map(|&v| match nodata {
                Some(nd) if v as f64 == nd => f32::NAN,
                _ => v,
            })
            .collect();
        let found = data_vec.len();
        let shape = (self.metadata.size_y, self.metadata.size_x);
        Array2::from_shape_vec(shape, data_vec).map_err(|_| {
            Error::dimension_mismatch(
                "GDAL band buffer",
                format!("{} values", shape.0 * shape.1),
                format!("{} values", found),
            )
        })
    }

    /// Georeferencing, when the dataset carries a real one.
    pub fn georef(&self) -> Option<Georef> {
        let is_identity = |gt: [f64; 6]| gt == [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        match self.metadata.geotransform {
            Some(gt) if !is_identity(gt) => Some(Georef {
                geotransform: gt,
                projection: self.metadata.projection.clone(),
            }),
            _ => None,
        }
    }
}

/// An incidence or aspect raster in degrees, restricted to the processing extent.
#[derive(Debug, Clone)]
pub struct AngleRaster {
    pub degrees: Array2<f32>,
    pub georef: Option<Georef>,
}

/// Whether a raster is read through GDAL rather than as a raw float32 band.
pub fn is_gdal_raster(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    matches!(ext.as_str(), "tif" | "tiff" | "vrt" | "img") || find_header(path).is_some()
}

/// Load a single-band angle raster whose full extent must be `rows x cols`,
/// then apply `crop`.
pub fn read_angle_raster(
    path: &Path,
    rows: usize,
    cols: usize,
    crop: Option<&CropWindow>,
) -> Result<AngleRaster> {
    let (full, georef) = if is_gdal_raster(path) {
        let raster = GdalRaster::open(path)?;
        info!(
            "Reading {:?} via GDAL ({}x{}, {} band(s))",
            path, raster.metadata.size_y, raster.metadata.size_x, raster.metadata.bands
        );
        if (raster.metadata.size_y, raster.metadata.size_x) != (rows, cols) {
            return Err(Error::dimension_mismatch(
                format!("angle raster {:?}", path),
                format!("{}x{}", rows, cols),
                format!("{}x{}", raster.metadata.size_y, raster.metadata.size_x),
            ));
        }
        (raster.read_first_band()?, raster.georef())
    } else {
        info!("Reading {:?} as raw float32 band", path);
        (read_raw_band(path, rows, cols)?, None)
    };
    debug!("Georeference of {:?}: {:?}", path, georef);

    let degrees = match crop {
        Some(window) => window.apply2(full.view())?,
        None => full,
    };
    Ok(AngleRaster { degrees, georef })
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian as LE, WriteBytesExt};
    use std::fs::File;

    #[test]
    fn epsg_from_wkt_authority() {
        let wkt = r#"PROJCS["WGS 84 / UTM zone 32N",AUTHORITY["EPSG","32632"]]"#;
        assert_eq!(parse_epsg(wkt).as_deref(), Some("EPSG:32632"));
        assert_eq!(parse_epsg("LOCAL_CS[\"x\"]"), None);
    }

    #[test]
    fn raster_kind_by_extension() {
        assert!(is_gdal_raster(Path::new("/tmp/aspect.tif")));
        assert!(is_gdal_raster(Path::new("/tmp/aspect.TIFF")));
        assert!(!is_gdal_raster(Path::new("/tmp/does-not-exist/incidence.r4")));
    }

    #[test]
    fn raw_angle_raster_is_cropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incidence.r4");
        let mut f = File::create(&path).unwrap();
        for v in 0..12 {
            f.write_f32::<LE>(v as f32).unwrap();
        }
        drop(f);

        let raster = read_angle_raster(&path, 3, 4, Some(&CropWindow::new(1, 3, 2, 4))).unwrap();
        assert_eq!(raster.degrees.dim(), (2, 2));
        assert_eq!(raster.degrees[[0, 0]], 6.0);
        assert_eq!(raster.degrees[[1, 1]], 11.0);
        assert!(raster.georef.is_none());
    }

    #[test]
    fn raw_angle_raster_too_short() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incidence.r4");
        std::fs::write(&path, [0u8; 8]).unwrap();
        let err = read_angle_raster(&path, 2, 2, None).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
    }
}
