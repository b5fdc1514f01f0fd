//! Crate-level error type and `Result` alias for structured error handling.
//! Converts underlying I/O and GDAL errors, and provides semantic variants for
//! malformed inputs (format errors) and invalid crop windows (range errors).
use std::path::PathBuf;

use thiserror::Error;

use crate::core::crop::CropWindow;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Truncated cube {path:?}: expected {expected} float32 values, found {found}")]
    TruncatedCube {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Dimension mismatch for {what}: expected {expected}, got {found}")]
    DimensionMismatch {
        what: String,
        expected: String,
        found: String,
    },

    #[error("Invalid cube header {path:?}: {reason}")]
    InvalidHeader { path: PathBuf, reason: String },

    #[error("Crop window {window} is not contained in a {rows}x{cols} raster")]
    CropOutOfRange {
        window: CropWindow,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid crop window: {0}")]
    InvalidCrop(String),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },
}

/// Coarse error classes reported by the command surface.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// Input file shorter than declared, or extents that do not agree
    Format,
    /// Crop window invalid or outside the raster
    Range,
    /// Opening, reading or writing a file failed
    Io,
    /// Bad or missing configuration value
    Argument,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Format => write!(f, "FormatError"),
            ErrorKind::Range => write!(f, "RangeError"),
            ErrorKind::Io => write!(f, "IOError"),
            ErrorKind::Argument => write!(f, "ArgumentError"),
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::Gdal(_) => ErrorKind::Io,
            Error::TruncatedCube { .. }
            | Error::DimensionMismatch { .. }
            | Error::InvalidHeader { .. } => ErrorKind::Format,
            Error::CropOutOfRange { .. } | Error::InvalidCrop(_) => ErrorKind::Range,
            Error::Json(_) | Error::InvalidArgument { .. } | Error::MissingArgument { .. } => {
                ErrorKind::Argument
            }
        }
    }

    pub fn dimension_mismatch<E: std::fmt::Display, F: std::fmt::Display>(
        what: impl Into<String>,
        expected: E,
        found: F,
    ) -> Self {
        Error::DimensionMismatch {
            what: what.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
