//! Curation passes over the movie library.
//!
//! Each pass reads a snapshot of the store and the `raw/` tree, computes
//! with `collage_core`, and writes its results back once at the end.

pub mod compile;
pub mod config;
pub mod error;
pub mod extraction;
pub mod library;
pub mod registration;
pub mod review;

pub use config::CollageConfig;
pub use error::{PipelineError, PipelineResult};
