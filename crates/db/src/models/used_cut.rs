//! Used-cut ledger models.
//!
//! Rows are append-only: a used cut is never updated or deleted.

use collage_core::selection::TimeSlice;
use collage_core::types::{DbId, Seconds, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A used-cut row from the `used_cuts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UsedCut {
    pub id: DbId,
    /// File name of the compilation the footage went into.
    pub compilation: String,
    pub movie_id: DbId,
    pub start_secs: Seconds,
    pub end_secs: Seconds,
    pub created_at: Timestamp,
}

impl UsedCut {
    pub fn slice(&self) -> TimeSlice {
        TimeSlice::new(self.start_secs, self.end_secs)
    }
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// One clip of a compilation to append to the ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUsedCut {
    pub movie_id: DbId,
    pub start_secs: Seconds,
    pub end_secs: Seconds,
}

impl CreateUsedCut {
    pub fn new(movie_id: DbId, slice: TimeSlice) -> Self {
        Self {
            movie_id,
            start_secs: slice.start,
            end_secs: slice.end,
        }
    }
}
