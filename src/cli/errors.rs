use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("Invalid --dims value '{value}': {reason}")]
    InvalidDims { value: String, reason: String },

    #[error("Thread count must be greater than 0")]
    ZeroThreads,

    #[error("Could not configure worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Synthetic check failed: reprojection residual {residual:e} exceeds {tolerance:e}")]
    SelfTestFailed { residual: f64, tolerance: f64 },

    #[error("{kind}: {source}")]
    Run {
        kind: slopecube::ErrorKind,
        #[source]
        source: slopecube::Error,
    },
}

impl From<slopecube::Error> for AppError {
    fn from(source: slopecube::Error) -> Self {
        AppError::Run {
            kind: source.kind(),
            source,
        }
    }
}
