//! Snapshot of the library as the scheduler and the selector see it.
//!
//! A movie is eligible when its format is the basic one and its `screens/`
//! directory exists. Thumbnails come from that directory, joined to the
//! ratings stored for the movie. Everything is read once at the start of a
//! pass.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use collage_core::thumbnail::{parse_thumbnail_index, Rating, THUMBNAIL_EXTENSION};
use collage_core::types::DbId;
use collage_db::models::movie::Movie;
use collage_db::repositories::{MovieRepo, ThumbnailRepo};
use collage_db::DbPool;

use crate::config::CollageConfig;
use crate::error::{PipelineError, PipelineResult};

/// One thumbnail of an eligible movie.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailState {
    pub index: u32,
    pub path: PathBuf,
    pub rating: Option<Rating>,
}

/// An eligible movie and its thumbnails in index order.
#[derive(Debug, Clone)]
pub struct MovieSnapshot {
    pub movie: Movie,
    pub thumbnails: Vec<ThumbnailState>,
}

impl MovieSnapshot {
    /// `(index, rating)` pairs in index order.
    pub fn ratings(&self) -> Vec<(u32, Option<Rating>)> {
        self.thumbnails.iter().map(|t| (t.index, t.rating)).collect()
    }
}

/// All eligible movies plus how many were skipped.
#[derive(Debug, Clone, Default)]
pub struct LibrarySnapshot {
    pub movies: Vec<MovieSnapshot>,
    pub skipped: usize,
}

/// Load every eligible movie with its thumbnails and ratings.
///
/// Movies in another format or without a `screens/` directory are skipped
/// with a warning. A malformed thumbnail name aborts the load.
pub async fn load_snapshot(pool: &DbPool, config: &CollageConfig) -> PipelineResult<LibrarySnapshot> {
    let movies = MovieRepo::list(pool).await?;
    let mut stored = stored_ratings(pool).await?;
    let mut snapshot = LibrarySnapshot::default();

    for movie in movies {
        let format = &movie.metadata.format;
        if !format.is_basic() {
            tracing::warn!(folder = %movie.folder, format = %format, "Skipping movie in unsupported format");
            snapshot.skipped += 1;
            continue;
        }

        let screens = config.screens_dir(&movie.folder);
        if !screens.is_dir() {
            tracing::warn!(folder = %movie.folder, path = %screens.display(), "Skipping movie without thumbnails");
            snapshot.skipped += 1;
            continue;
        }

        let ratings = stored.remove(&movie.id).unwrap_or_default();
        let thumbnails = list_screens(&screens)?
            .into_iter()
            .map(|(index, name)| ThumbnailState {
                index,
                rating: ratings.get(&name).copied().flatten(),
                path: screens.join(name),
            })
            .collect();

        snapshot.movies.push(MovieSnapshot { movie, thumbnails });
    }

    tracing::debug!(
        eligible = snapshot.movies.len(),
        skipped = snapshot.skipped,
        "Loaded library snapshot",
    );
    Ok(snapshot)
}

/// List the thumbnails in a `screens/` directory as `(index, file name)`,
/// sorted by index.
pub fn list_screens(dir: &Path) -> PipelineResult<Vec<(u32, String)>> {
    let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
    let mut screens = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_thumbnail = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(THUMBNAIL_EXTENSION));
        if !is_thumbnail {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        screens.push((parse_thumbnail_index(&name)?, name));
    }

    screens.sort();
    Ok(screens)
}

/// Stored ratings keyed by movie, then by thumbnail file name.
async fn stored_ratings(
    pool: &DbPool,
) -> PipelineResult<HashMap<DbId, HashMap<String, Option<Rating>>>> {
    let mut grouped: HashMap<DbId, HashMap<String, Option<Rating>>> = HashMap::new();
    for thumb in ThumbnailRepo::list_all(pool).await? {
        let rating = thumb.rating();
        grouped
            .entry(thumb.movie_id)
            .or_default()
            .insert(thumb.filename, rating);
    }
    Ok(grouped)
}
