//! Core building blocks: angle conversion, crop windows, run parameters and
//! the per-pixel projection inversion. These are the primitives consumed by
//! the high-level `api` module.
pub mod angles;
pub mod crop;
pub mod params;
pub mod projection;
