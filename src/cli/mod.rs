//! Command Line Interface (CLI) layer for slopecube.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) that turns flags or a JSON config
//! into an `InversionParams` and hands it to `slopecube::api`.
//!
//! If you are embedding slopecube into another application, prefer using
//! the high-level `slopecube::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
