use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::types::CubeShape;

/// ENVI data type code for 32-bit float.
pub const ENVI_FLOAT32: u32 = 4;

pub fn header_path(dest_dir: &Path, name: &str) -> PathBuf {
    dest_dir.join(format!("{}.hdr", name))
}

pub fn pixel_plot_path(dest_dir: &Path, name: &str) -> PathBuf {
    dest_dir.join(format!("lect_{}.in", name))
}

/// Write the ENVI header describing a band-interleaved-by-pixel float32 cube.
pub fn write_envi_header(dest_dir: &Path, name: &str, shape: CubeShape) -> Result<PathBuf> {
    let path = header_path(dest_dir, name);
    let mut file = File::create(&path)?;
    // samples are columns, lines are rows
    writeln!(file, "ENVI")?;
    writeln!(file, "samples = {}", shape.cols)?;
    writeln!(file, "lines = {}", shape.rows)?;
    writeln!(file, "bands = {}", shape.bands)?;
    writeln!(file, "header offset = 0")?;
    writeln!(file, "file type = ENVI Standard")?;
    writeln!(file, "data type = {}", ENVI_FLOAT32)?;
    writeln!(file, "interleave = bip")?;
    debug!("Wrote header {:?}", path);
    Ok(path)
}

/// Write the one-line `cols\trows\tbands` file read by pixel extraction tools.
pub fn write_pixel_plot_file(dest_dir: &Path, name: &str, shape: CubeShape) -> Result<PathBuf> {
    let path = pixel_plot_path(dest_dir, name);
    std::fs::write(
        &path,
        format!("{}\t{}\t{}", shape.cols, shape.rows, shape.bands),
    )?;
    debug!("Wrote pixel-plot file {:?}", path);
    Ok(path)
}
