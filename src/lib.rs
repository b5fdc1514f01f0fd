#![doc = r#"
slopecube: slope-parallel and vertical displacement from range/azimuth cubes.

Stereo correlation of satellite image pairs yields, per pair, a displacement
along the sensor's range direction and one along its azimuth (along-track)
direction. Stacked over time they form two 3D cubes `[row, column, slice]`.
This crate inverts them, pixel by pixel and slice by slice, into displacement
along the local steepest-slope direction (`u_slope`) and vertical displacement
(`u_z`), using the scene heading plus per-pixel incidence and aspect rasters.

It powers the `slopecube` CLI and can be embedded in your own Rust applications.

Requirements
------------
- GDAL development headers and runtime available on your system (angle rasters
  in GeoTIFF/VRT/ENVI form are read through GDAL).
- Rust 2024 edition toolchain.

File formats
------------
- Cubes are flat little-endian float32 files, band-interleaved-by-pixel, with an
  ENVI `.hdr` header. The stored values `9990` and `9999` mean no-data and are
  decoded to `NaN` on load.
- Each saved cube gets `<name>.hdr`, `lect_<name>.in` (`cols\trows\tbands`) and a
  `<name>.json` provenance sidecar.

Quick start: invert a scene to files
------------------------------------
```rust,no_run
use slopecube::{run_inversion, CropWindow, InversionParams};

fn main() -> slopecube::Result<()> {
    let params = InversionParams {
        range_cube: "/data/geocoded/depl_cumule_range".into(),
        azimuth_cube: "/data/geocoded/depl_cumule_azimuth".into(),
        incidence: "/data/geocoded/incidence.r4".into(),
        aspect: "/data/dem/aspect.tif".into(),
        heading: 100.0,
        dest: "/data/slope".into(),
        ext: "paz_asc".into(),
        crop: Some(CropWindow::new(0, 500, 200, 900)),
        dims: None,
    };

    let report = run_inversion(&params)?;
    println!("wrote {:?} and {:?}", report.slope_path, report.vertical_path);
    Ok(())
}
```

In-memory inversion
-------------------
```rust
use ndarray::Array3;
use slopecube::{invert_cubes, AngleField};

fn invert(range: &Array3<f32>, azimuth: &Array3<f32>) -> slopecube::Result<()> {
    let (rows, cols, _) = range.dim();
    let angles = AngleField::uniform(100.0, 32.0, 200.0, rows, cols);
    let out = invert_cubes(range, azimuth, &angles)?;
    assert_eq!(out.slope.dim(), range.dim());
    Ok(())
}
```

Error handling
--------------
All public functions return `slopecube::Result<T>`; `Error::kind()` classifies a
failure as a format error (short files, mismatched extents), a range error
(bad crop window), an I/O error, or an argument error. Pixels whose projection
matrix is singular are not errors: they come out as `NaN`.

Useful modules
--------------
- [`api`]: high-level entry points (`run_inversion`, `synthetic_check`).
- [`core`]: angle conversion, crop windows, parameters, projection inversion.
- [`io`]: cube store, GDAL angle rasters, sidecar writers.
- [`types`]: `Cube`, `CubeShape`, `Component`.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::angles::AngleField;
pub use crate::core::crop::CropWindow;
pub use crate::core::params::InversionParams;
pub use crate::core::projection::{InversionStats, InvertedCubes, ProjectionMatrix, invert_cubes};
pub use error::{Error, ErrorKind, Result};
pub use types::{Component, Cube, CubeShape};

// Readers
pub use io::gdal::{AngleRaster, GdalError, GdalRaster, read_angle_raster};

// High-level API re-exports
pub use api::{InversionReport, SyntheticReport, run_inversion, synthetic_check};
