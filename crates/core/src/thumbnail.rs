//! Thumbnail naming, ratings and the sampling grid.
//!
//! Thumbnails are extracted at a fixed grid: thumbnail `i` of a movie shows
//! the frame at `i * F + S` seconds, where `F` is the sampling frequency and
//! `S` the start offset. The index is encoded in the file name
//! (`thumb0042.jpg`), which is the only place it is recorded.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Seconds;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Extension of extracted thumbnails.
pub const THUMBNAIL_EXTENSION: &str = "jpg";

/// Name of the per-movie directory holding finished thumbnails.
pub const SCREENS_DIR: &str = "screens";

/// Staging directory used while a movie's thumbnails are being extracted.
pub const SCREENS_TMP_DIR: &str = "screens-tmp";

/// Stored rating value for a good thumbnail. Any other value means bad.
pub const RATING_GOOD: i64 = 1;

/// Stored rating value conventionally used for a bad thumbnail.
pub const RATING_BAD: i64 = 0;

/// Highest index the four-digit naming contract can express.
pub const MAX_THUMBNAIL_INDEX: u32 = 9999;

static THUMBNAIL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^thumb(\d{4})\.[A-Za-z0-9]+$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// File name for the thumbnail at `index`, e.g. `thumb0007.jpg`.
pub fn thumbnail_file_name(index: u32) -> String {
    format!("thumb{index:04}.{THUMBNAIL_EXTENSION}")
}

/// Recover the thumbnail index from a file name or path.
pub fn parse_thumbnail_index(name: &str) -> Result<u32, CoreError> {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    let caps = THUMBNAIL_NAME_RE
        .captures(base)
        .ok_or_else(|| CoreError::MalformedThumbnailName(name.to_string()))?;
    caps[1]
        .parse::<u32>()
        .map_err(|_| CoreError::MalformedThumbnailName(name.to_string()))
}

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// A human verdict on a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Good,
    Bad,
}

impl Rating {
    /// Interpret a stored rating. `1` is good, anything else is bad.
    pub fn from_stored(value: i64) -> Self {
        if value == RATING_GOOD {
            Self::Good
        } else {
            Self::Bad
        }
    }

    pub fn to_stored(self) -> i64 {
        match self {
            Self::Good => RATING_GOOD,
            Self::Bad => RATING_BAD,
        }
    }

    /// Parse a rating given on the command line.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.to_ascii_lowercase().as_str() {
            "good" | "1" | "+" | "yes" => Ok(Self::Good),
            "bad" | "0" | "-" | "no" => Ok(Self::Bad),
            _ => Err(CoreError::Validation(format!(
                "Invalid rating '{s}'. Expected 'good' or 'bad'"
            ))),
        }
    }
}

/// Convert a nullable stored rating.
pub fn rating_from_stored(value: Option<i64>) -> Option<Rating> {
    value.map(Rating::from_stored)
}

// ---------------------------------------------------------------------------
// Sampling grid
// ---------------------------------------------------------------------------

/// The fixed grid thumbnails are extracted on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    /// Seconds between consecutive thumbnails (`F`).
    pub frequency_secs: Seconds,
    /// Timestamp of thumbnail 0 (`S`).
    pub start_secs: Seconds,
}

impl Sampling {
    pub fn new(frequency_secs: Seconds, start_secs: Seconds) -> Result<Self, CoreError> {
        if !frequency_secs.is_finite() || frequency_secs <= 0.0 {
            return Err(CoreError::Validation(format!(
                "Sampling frequency must be positive, got {frequency_secs}"
            )));
        }
        if !start_secs.is_finite() || start_secs < 0.0 {
            return Err(CoreError::Validation(format!(
                "Sampling start must be >= 0, got {start_secs}"
            )));
        }
        Ok(Self {
            frequency_secs,
            start_secs,
        })
    }

    /// Timestamp of the thumbnail at `index`.
    pub fn timestamp_of(&self, index: u32) -> Seconds {
        f64::from(index) * self.frequency_secs + self.start_secs
    }

    /// Every `(index, timestamp)` pair to extract from a movie of `duration`
    /// seconds: `S, S + F, S + 2F, ...` strictly below `duration`, stopping
    /// at [`MAX_THUMBNAIL_INDEX`].
    pub fn grid(&self, duration: Seconds) -> Vec<(u32, Seconds)> {
        (0..=MAX_THUMBNAIL_INDEX)
            .map(|index| (index, self.timestamp_of(index)))
            .take_while(|&(_, ts)| ts < duration)
            .collect()
    }

    /// Whether [`Sampling::grid`] drops frames of a movie this long.
    pub fn is_truncated(&self, duration: Seconds) -> bool {
        self.timestamp_of(MAX_THUMBNAIL_INDEX + 1) < duration
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    // -- naming --

    #[test]
    fn file_name_is_zero_padded() {
        assert_eq!(thumbnail_file_name(0), "thumb0000.jpg");
        assert_eq!(thumbnail_file_name(42), "thumb0042.jpg");
    }

    #[test]
    fn parse_index_from_name_and_path() {
        assert_eq!(parse_thumbnail_index("thumb0042.jpg").unwrap(), 42);
        assert_eq!(
            parse_thumbnail_index("/raw/some-movie/screens/thumb0103.jpg").unwrap(),
            103
        );
        assert_eq!(parse_thumbnail_index("thumb0001.png").unwrap(), 1);
    }

    #[test]
    fn malformed_names_are_rejected() {
        for name in ["thumb42.jpg", "thumbabcd.jpg", "frame0001.jpg", "thumb0001", ""] {
            assert_matches!(
                parse_thumbnail_index(name),
                Err(CoreError::MalformedThumbnailName(_)),
                "{name} should be rejected"
            );
        }
    }

    // -- rating --

    #[test]
    fn stored_ratings_map_one_to_good() {
        assert_eq!(Rating::from_stored(1), Rating::Good);
        assert_eq!(Rating::from_stored(0), Rating::Bad);
        assert_eq!(Rating::from_stored(-1), Rating::Bad);
        assert_eq!(rating_from_stored(None), None);
    }

    #[test]
    fn parse_rating_words() {
        assert_eq!(Rating::parse("GOOD").unwrap(), Rating::Good);
        assert_eq!(Rating::parse("bad").unwrap(), Rating::Bad);
        assert!(Rating::parse("meh").is_err());
    }

    // -- sampling --

    #[test]
    fn timestamp_follows_grid() {
        let s = Sampling::new(20.0, 10.0).unwrap();
        assert!((s.timestamp_of(0) - 10.0).abs() < 1e-9);
        assert!((s.timestamp_of(3) - 70.0).abs() < 1e-9);
    }

    #[test]
    fn grid_stops_before_duration() {
        let s = Sampling::new(20.0, 10.0).unwrap();
        let grid = s.grid(70.0);
        assert_eq!(grid, vec![(0, 10.0), (1, 30.0), (2, 50.0)]);
    }

    #[test]
    fn grid_never_exceeds_four_digit_names() {
        let s = Sampling::new(1.0, 0.0).unwrap();
        let grid = s.grid(20_000.0);
        assert_eq!(grid.len(), 10_000);
        let (last, _) = grid[grid.len() - 1];
        assert_eq!(last, MAX_THUMBNAIL_INDEX);
        assert_eq!(parse_thumbnail_index(&thumbnail_file_name(last)).unwrap(), last);
        assert!(s.is_truncated(20_000.0));
        assert!(!s.is_truncated(10_000.0));
    }

    #[test]
    fn grid_is_empty_for_short_movies() {
        let s = Sampling::new(20.0, 10.0).unwrap();
        assert!(s.grid(5.0).is_empty());
    }

    #[test]
    fn sampling_rejects_non_positive_frequency() {
        assert!(Sampling::new(0.0, 0.0).is_err());
        assert!(Sampling::new(-5.0, 0.0).is_err());
        assert!(Sampling::new(5.0, -1.0).is_err());
    }
}
