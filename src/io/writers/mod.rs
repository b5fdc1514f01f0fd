//! Sidecar writers: ENVI header and pixel-plot file for every saved cube, plus
//! a JSON provenance record.
pub mod envi;
pub mod metadata;

pub use envi::{write_envi_header, write_pixel_plot_file};
pub use metadata::{CubeMetadata, Georef, write_metadata_sidecar};
