//! Movie metadata and stereo format rules.
//!
//! A movie's metadata is stored as a JSON blob. Only the `video` and
//! `format` sections are interpreted here; any other keys are carried along
//! untouched so hand-edited details survive a round trip through the store.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::types::Seconds;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Field of view of the basic format, in degrees.
pub const BASIC_FIELD_OF_VIEW: &str = "180";

/// Stereo orientation of the basic format (side by side).
pub const BASIC_ORIENTATION: &str = "sbs";

/// Lens perspective of the basic format.
pub const BASIC_PERSPECTIVE: &str = "normal";

pub const VALID_FIELDS_OF_VIEW: &[&str] = &["180", "220", "360"];
pub const VALID_ORIENTATIONS: &[&str] = &["sbs", "ab"];
pub const VALID_PERSPECTIVES: &[&str] = &["normal", "fisheye"];

/// File extensions recognised as movie files (lowercase, with dot).
pub const MOVIE_EXTENSIONS: &[&str] = &[
    ".avi", ".mpg", ".wmv", ".flv", ".mov", ".mp4", ".vob", ".divx", ".mkv", ".m4v", ".f4v",
    ".mpeg", ".webm",
];

/// File name prefixes of generated outputs that must never be mistaken for
/// the source movie of a folder.
pub const GENERATED_FILE_PREFIXES: &[&str] = &["collage", "output"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Projection of a stereoscopic movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFormat {
    #[serde(deserialize_with = "string_or_number")]
    pub fov: String,
    pub orientation: String,
    pub perspective: String,
}

impl VideoFormat {
    /// The single combination the curation engine knows how to compile.
    pub fn basic() -> Self {
        Self {
            fov: BASIC_FIELD_OF_VIEW.to_string(),
            orientation: BASIC_ORIENTATION.to_string(),
            perspective: BASIC_PERSPECTIVE.to_string(),
        }
    }

    /// Whether this is the 180° side-by-side normal-perspective format.
    ///
    /// Mixing other projections into one compilation would need remapping
    /// (ab -> sbs, fisheye -> normal), so everything else is skipped.
    pub fn is_basic(&self) -> bool {
        self.fov == BASIC_FIELD_OF_VIEW
            && self.orientation == BASIC_ORIENTATION
            && self.perspective == BASIC_PERSPECTIVE
    }

    /// Validate that every component is a known value.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !VALID_FIELDS_OF_VIEW.contains(&self.fov.as_str()) {
            return Err(CoreError::UnsupportedFormat(format!(
                "Unknown field of view '{}'. Valid: {VALID_FIELDS_OF_VIEW:?}",
                self.fov
            )));
        }
        if !VALID_ORIENTATIONS.contains(&self.orientation.as_str()) {
            return Err(CoreError::UnsupportedFormat(format!(
                "Unknown orientation '{}'. Valid: {VALID_ORIENTATIONS:?}",
                self.orientation
            )));
        }
        if !VALID_PERSPECTIVES.contains(&self.perspective.as_str()) {
            return Err(CoreError::UnsupportedFormat(format!(
                "Unknown perspective '{}'. Valid: {VALID_PERSPECTIVES:?}",
                self.perspective
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.fov, self.orientation, self.perspective)
    }
}

/// Probed properties of the primary video stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStats {
    pub duration: Seconds,
    pub width: i32,
    pub height: i32,
}

/// The metadata blob stored with every movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieMetadata {
    pub video: VideoStats,
    pub format: VideoFormat,
    /// Free-form details (title, studio, ...) that this crate does not use.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MovieMetadata {
    pub fn new(video: VideoStats, format: VideoFormat) -> Self {
        Self {
            video,
            format,
            extra: serde_json::Map::new(),
        }
    }

    pub fn duration(&self) -> Seconds {
        self.video.duration
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whether a file name has one of the [`MOVIE_EXTENSIONS`] and is not a
/// generated output.
pub fn is_movie_file_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if GENERATED_FILE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return false;
    }
    MOVIE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Older metadata files stored the field of view as a bare number.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => format!("{f}"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
