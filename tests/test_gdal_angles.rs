use std::path::Path;

use gdal::DriverManager;
use gdal::raster::Buffer;

use slopecube::io::writers::metadata::read_metadata_sidecar;
use slopecube::io::writers::write_envi_header;
use slopecube::{
    CropWindow, CubeShape, ErrorKind, GdalRaster, InversionParams, read_angle_raster,
    run_inversion,
};

const GEOTRANSFORM: [f64; 6] = [600000.0, 10.0, 0.0, 5100000.0, 0.0, -10.0];

fn write_geotiff(path: &Path, rows: usize, cols: usize, value: impl Fn(usize, usize) -> f32) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut ds = driver
        .create_with_band_type::<f32, _>(path, cols, rows, 1)
        .unwrap();
    ds.set_geo_transform(&GEOTRANSFORM).unwrap();
    let data: Vec<f32> = (0..rows * cols).map(|n| value(n / cols, n % cols)).collect();
    let mut buf = Buffer::new((cols, rows), data);
    let mut band = ds.rasterband(1).unwrap();
    band.write((0, 0), (cols, rows), &mut buf).unwrap();
}

#[test]
fn test_geotiff_angle_raster_is_read_and_cropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aspect.tif");
    write_geotiff(&path, 3, 4, |i, j| (i * 10 + j) as f32);

    let raster = GdalRaster::open(&path).unwrap();
    assert_eq!((raster.metadata.size_y, raster.metadata.size_x), (3, 4));
    let band = raster.read_first_band().unwrap();
    assert_eq!(band.dim(), (3, 4));
    assert_eq!(band[[2, 3]], 23.0);

    let angle = read_angle_raster(&path, 3, 4, Some(&CropWindow::new(1, 3, 1, 3))).unwrap();
    assert_eq!(angle.degrees.dim(), (2, 2));
    assert_eq!(angle.degrees[[0, 0]], 11.0);
    assert_eq!(angle.degrees[[1, 1]], 22.0);
    assert_eq!(angle.georef.unwrap().geotransform, GEOTRANSFORM);
}

#[test]
fn test_geotiff_extent_must_match_cube() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aspect.tif");
    write_geotiff(&path, 3, 4, |_, _| 200.0);
    let err = read_angle_raster(&path, 4, 4, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_run_records_aspect_georeference() {
    let dir = tempfile::tempdir().unwrap();
    let (rows, cols, bands) = (3, 4, 2);
    let values = vec![0u8; rows * cols * bands * 4];
    for name in ["rg", "az"] {
        std::fs::write(dir.path().join(name), &values).unwrap();
        write_envi_header(dir.path(), name, CubeShape::new(rows, cols, bands)).unwrap();
    }
    write_geotiff(&dir.path().join("inc.tif"), rows, cols, |_, _| 32.0);
    write_geotiff(&dir.path().join("aspect.tif"), rows, cols, |_, _| 200.0);

    let params = InversionParams {
        range_cube: dir.path().join("rg"),
        azimuth_cube: dir.path().join("az"),
        incidence: dir.path().join("inc.tif"),
        aspect: dir.path().join("aspect.tif"),
        heading: 100.0,
        dest: dir.path().join("out"),
        ext: "geo".into(),
        ..Default::default()
    };
    let report = run_inversion(&params).unwrap();
    assert_eq!(report.stats.singular_pixels, 0);

    let meta = read_metadata_sidecar(&params.dest.join("depl_cumule_uslope_geo.json")).unwrap();
    assert_eq!(meta.georef.unwrap().geotransform, GEOTRANSFORM);
}
