//! Review pass and rating.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use collage_core::error::CoreError;
use collage_core::review::{priority_order, schedule_review, ReviewMovie, MAX_REVIEW_BATCH};
use collage_core::thumbnail::{parse_thumbnail_index, Rating, SCREENS_DIR};
use collage_db::models::thumbnail::Thumbnail;
use collage_db::repositories::{MovieRepo, ThumbnailRepo};
use collage_db::DbPool;
use rand::Rng;

use crate::config::CollageConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::library::load_snapshot;

/// Result of one review pass.
#[derive(Debug, Clone, Default)]
pub struct ReviewBatch {
    /// Thumbnails to show, in presentation order.
    pub thumbnails: Vec<PathBuf>,
    /// Folders in the order they were first served.
    pub movie_order: Vec<String>,
}

/// Pick the next thumbnails to rate, at most `limit` (capped at
/// [`MAX_REVIEW_BATCH`]).
pub async fn review_batch<R: Rng + ?Sized>(
    pool: &DbPool,
    config: &CollageConfig,
    limit: usize,
    rng: &mut R,
) -> PipelineResult<ReviewBatch> {
    let snapshot = load_snapshot(pool, config).await?;

    let movies: Vec<ReviewMovie<PathBuf>> = snapshot
        .movies
        .into_iter()
        .map(|m| ReviewMovie {
            key: m.movie.folder,
            thumbnails: m
                .thumbnails
                .into_iter()
                .map(|t| (t.path, t.rating))
                .collect(),
        })
        .collect();

    let limit = limit.min(MAX_REVIEW_BATCH);
    let movie_order = priority_order(&movies);
    let picks = schedule_review(&movies, limit, rng);

    tracing::info!(
        movies = movies.len(),
        skipped = snapshot.skipped,
        picks = picks.len(),
        "Review batch ready",
    );

    Ok(ReviewBatch {
        thumbnails: picks.into_iter().map(|p| p.thumbnail).collect(),
        movie_order,
    })
}

/// Store a rating for the thumbnail at `path`
/// (`<raw>/<folder>/screens/thumb####.jpg`).
///
/// The file must exist and sit directly in the `screens/` directory of a
/// registered movie under `config.raw_dir`.
pub async fn rate_thumbnail(
    pool: &DbPool,
    config: &CollageConfig,
    path: &Path,
    rating: Rating,
) -> PipelineResult<Thumbnail> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CoreError::MalformedThumbnailName(path.display().to_string()))?;
    parse_thumbnail_index(filename)?;

    if !tokio::fs::try_exists(path)
        .await
        .map_err(|e| PipelineError::io(path, e))?
    {
        return Err(CoreError::NotFound {
            entity: "thumbnail",
            key: path.display().to_string(),
        }
        .into());
    }

    let folder = library_folder(config, path).await?;
    let movie = MovieRepo::find_by_folder(pool, &folder)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "movie",
            key: folder.clone(),
        })?;

    let thumb = ThumbnailRepo::set_rating(pool, movie.id, filename, rating.to_stored()).await?;
    tracing::info!(%folder, filename, ?rating, "Rated thumbnail");
    Ok(thumb)
}

/// Folder name of the movie whose `screens/` directory holds `path`.
async fn library_folder(config: &CollageConfig, path: &Path) -> PipelineResult<String> {
    let canonical = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| PipelineError::io(path, e))?;
    let raw = tokio::fs::canonicalize(&config.raw_dir)
        .await
        .map_err(|e| PipelineError::io(&config.raw_dir, e))?;

    let outside = || {
        CoreError::Validation(format!(
            "'{}' is not a thumbnail in {}/<folder>/{SCREENS_DIR}",
            path.display(),
            config.raw_dir.display()
        ))
    };

    let screens = canonical.parent().ok_or_else(outside)?;
    let movie_dir = screens.parent().ok_or_else(outside)?;
    if screens.file_name() != Some(OsStr::new(SCREENS_DIR))
        || movie_dir.parent() != Some(raw.as_path())
    {
        return Err(outside().into());
    }

    movie_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| outside().into())
}
