use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "slopecube",
    version,
    about = "Project range/azimuth displacement cubes onto the slope and vertical directions"
)]
pub struct CliArgs {
    /// Path to the geocoded slant-range displacement cube
    #[arg(long)]
    pub range_cube: Option<PathBuf>,

    /// Path to the geocoded azimuth displacement cube
    #[arg(long)]
    pub azimuth_cube: Option<PathBuf>,

    /// Path to the geocoded incidence raster (degrees)
    #[arg(long)]
    pub inc: Option<PathBuf>,

    /// Path to the aspect raster (degrees from North, positive clockwise)
    #[arg(long)]
    pub aspect: Option<PathBuf>,

    /// Heading angle of the scene (degrees)
    #[arg(long, allow_hyphen_values = true)]
    pub heading: Option<f64>,

    /// Destination directory
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Naming extension of the output cubes
    #[arg(long)]
    pub ext: Option<String>,

    /// Crop window as row_min,row_max,col_min,col_max (half-open)
    #[arg(long)]
    pub crop: Option<String>,

    /// Cube shape as rows,cols,bands (default: read from the range cube's ENVI header)
    #[arg(long)]
    pub dims: Option<String>,

    /// Load all inversion parameters from a JSON file instead of flags
    #[arg(
        long,
        conflicts_with_all = [
            "range_cube", "azimuth_cube", "inc", "aspect", "heading", "dest", "ext", "crop", "dims"
        ]
    )]
    pub config: Option<PathBuf>,

    /// Number of worker threads (default: one per core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Invert the built-in synthetic scene and report the reprojection residual
    #[arg(long, default_value_t = false)]
    pub self_test: bool,
}
