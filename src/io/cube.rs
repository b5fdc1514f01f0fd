//! Flat float32 displacement cubes.
//!
//! A cube file holds `rows * cols * bands` little-endian float32 values in
//! band-interleaved-by-pixel order (`[row][column][band]`), described by an
//! ENVI header next to it. The legacy no-data sentinels are decoded to `NaN`
//! here and nowhere else.
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use ndarray::{Array2, Array3};
use tracing::{debug, info};

use crate::core::crop::CropWindow;
use crate::error::{Error, Result};
use crate::io::writers::envi::{write_envi_header, write_pixel_plot_file};
use crate::types::{Cube, CubeShape};

/// Stored values that mean "no measurement".
pub const NODATA_SENTINELS: [f32; 2] = [9990.0, 9999.0];

const F32_BYTES: u64 = 4;

#[inline]
pub fn decode_sentinel(value: f32) -> f32 {
    if NODATA_SENTINELS.contains(&value) {
        f32::NAN
    } else {
        value
    }
}

/// Read the first `count` float32 values of a file.
fn read_f32_values(path: &Path, count: usize) -> Result<Vec<f32>> {
    let file = File::open(path)?;
    let available = (file.metadata()?.len() / F32_BYTES) as usize;
    if available < count {
        return Err(Error::TruncatedCube {
            path: path.to_path_buf(),
            expected: count,
            found: available,
        });
    }
    let mut reader = BufReader::new(file);
    let mut values = vec![0f32; count];
    reader.read_f32_into::<LE>(&mut values)?;
    Ok(values)
}

/// Load a cube of the given shape, decoding sentinels to `NaN`.
pub fn open<P: AsRef<Path>>(path: P, shape: CubeShape) -> Result<Cube> {
    let path = path.as_ref();
    info!("Reading cube {:?} {}", path, shape);
    let count = shape.checked_len().ok_or_else(|| Error::InvalidHeader {
        path: path.to_path_buf(),
        reason: format!("shape {} holds too many values", shape),
    })?;
    let mut values = read_f32_values(path, count)?;
    let mut decoded = 0usize;
    for v in values.iter_mut() {
        let d = decode_sentinel(*v);
        if d.is_nan() && !v.is_nan() {
            decoded += 1;
        }
        *v = d;
    }
    debug!("Decoded {} sentinel values to no-data", decoded);
    Array3::from_shape_vec(shape.dim(), values)
        .map_err(|e| Error::dimension_mismatch(format!("cube {:?}", path), shape, e))
}

/// Load a cube and restrict it to `crop`, if any.
pub fn open_cropped<P: AsRef<Path>>(
    path: P,
    shape: CubeShape,
    crop: Option<&CropWindow>,
) -> Result<Cube> {
    if let Some(window) = crop {
        window.validate(shape.rows, shape.cols)?;
    }
    let cube = open(path, shape)?;
    match crop {
        Some(window) => self::crop(&cube, window),
        None => Ok(cube),
    }
}

/// Restrict a cube to `window` over all bands.
pub fn crop(cube: &Cube, window: &CropWindow) -> Result<Cube> {
    window.apply3(cube.view())
}

/// Read a single raw float32 band (first `rows * cols` values), no decoding.
pub fn read_raw_band<P: AsRef<Path>>(path: P, rows: usize, cols: usize) -> Result<Array2<f32>> {
    let path = path.as_ref();
    debug!("Reading raw float32 band {:?} ({}x{})", path, rows, cols);
    let count = CubeShape::new(rows, cols, 1)
        .checked_len()
        .ok_or_else(|| Error::InvalidHeader {
            path: path.to_path_buf(),
            reason: format!("extent {}x{} holds too many values", rows, cols),
        })?;
    let values = read_f32_values(path, count)?;
    Array2::from_shape_vec((rows, cols), values).map_err(|e| {
        Error::dimension_mismatch(format!("band {:?}", path), format!("{}x{}", rows, cols), e)
    })
}

/// Write a cube to `dest_dir/name` with its ENVI header and pixel-plot file.
pub fn save(cube: &Cube, dest_dir: &Path, name: &str) -> Result<PathBuf> {
    let shape = CubeShape::of(cube);
    let path = dest_dir.join(name);
    info!("Writing cube {:?} {}", path, shape);

    let mut writer = BufWriter::new(File::create(&path)?);
    // iter() walks in logical [row][col][band] order regardless of memory layout
    for &v in cube.iter() {
        writer.write_f32::<LE>(v)?;
    }
    writer.flush()?;

    write_envi_header(dest_dir, name, shape)?;
    write_pixel_plot_file(dest_dir, name, shape)?;
    Ok(path)
}

/// Candidate header locations for a cube: `<file>.hdr`, then `<stem>.hdr`.
pub fn find_header(cube_path: &Path) -> Option<PathBuf> {
    let mut appended = cube_path.as_os_str().to_owned();
    appended.push(".hdr");
    [PathBuf::from(appended), cube_path.with_extension("hdr")]
        .into_iter()
        .find(|p| p.is_file())
}

/// Shape recorded in the ENVI header of `cube_path`.
pub fn read_header(cube_path: &Path) -> Result<CubeShape> {
    let header = find_header(cube_path).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no ENVI header found for {:?}", cube_path),
        )
    })?;
    let text = fs::read_to_string(&header)?;
    parse_header(&text).map_err(|reason| Error::InvalidHeader {
        path: header,
        reason,
    })
}

/// Parse `samples`, `lines` and `bands` out of ENVI header text.
pub fn parse_header(text: &str) -> std::result::Result<CubeShape, String> {
    let fields: HashMap<String, &str> = text
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim()))
        .collect();

    let field = |key: &str| -> std::result::Result<usize, String> {
        let raw = fields
            .get(key)
            .ok_or_else(|| format!("missing '{}' entry", key))?;
        raw.parse::<usize>()
            .map_err(|_| format!("'{}' is not a valid {} count", raw, key))
    };

    let shape = CubeShape::new(field("lines")?, field("samples")?, field("bands")?);
    if shape.checked_len().is_none() {
        return Err(format!("shape {} holds too many values", shape));
    }
    Ok(shape)
}
