//! I/O layer for displacement cubes and angle rasters.
//! Provides the flat float32 `cube` store, `gdal` adapters for incidence and
//! aspect rasters, and `writers` for ENVI headers, pixel-plot files and JSON
//! metadata sidecars.
pub mod cube;
pub use self::cube::{NODATA_SENTINELS, read_header};

pub mod gdal;
pub use self::gdal::{AngleRaster, GdalError, GdalRaster, RasterMetadata, read_angle_raster};

pub mod writers;
