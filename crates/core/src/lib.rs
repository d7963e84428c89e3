//! Domain logic for curating personal video collections.
//!
//! This crate has zero internal deps so it can be used by the store, the
//! pipeline and the CLI alike:
//!
//! - [`format`]: movie metadata and the supported stereo formats.
//! - [`thumbnail`]: thumbnail naming, ratings and the sampling grid.
//! - [`review`]: the adaptive thumbnail review scheduler.
//! - [`selection`]: bracketing and clip selection for compilations.
//! - [`assembly`]: ffmpeg filter graph construction for a compilation.
//! - [`ffmpeg`]: ffprobe/ffmpeg process wrappers.

pub mod assembly;
pub mod error;
pub mod ffmpeg;
pub mod format;
pub mod review;
pub mod selection;
pub mod thumbnail;
pub mod types;
