//! Movie models and DTOs.

use collage_core::format::MovieMetadata;
use collage_core::types::{DbId, Seconds};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A movie row from the `movies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Movie {
    pub id: DbId,
    /// Name of the movie's folder under the raw directory. Unique.
    pub folder: String,
    /// The movie file inside `folder`.
    pub filename: String,
    pub metadata: Json<MovieMetadata>,
}

impl Movie {
    pub fn duration(&self) -> Seconds {
        self.metadata.duration()
    }
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for registering (or re-registering) a movie.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMovie {
    pub folder: String,
    pub filename: String,
    pub metadata: MovieMetadata,
}
