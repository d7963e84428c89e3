//! Thumbnail models and DTOs.

use collage_core::thumbnail::{rating_from_stored, Rating};
use collage_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A thumbnail row from the `thumbnails` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Thumbnail {
    pub id: DbId,
    pub movie_id: DbId,
    /// Base name inside the movie's `screens/` directory, e.g. `thumb0042.jpg`.
    pub filename: String,
    /// `NULL` until reviewed; `1` is good, anything else bad.
    pub rating: Option<i64>,
}

impl Thumbnail {
    pub fn rating(&self) -> Option<Rating> {
        rating_from_stored(self.rating)
    }
}

/// Input for recording an extracted thumbnail.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateThumbnail {
    pub movie_id: DbId,
    pub filename: String,
}
