//! Thumbnail extraction pass.
//!
//! Frames are written to `screens-tmp/` and the directory is renamed to
//! `screens/` once every frame exists, so a movie is either fully extracted
//! or not at all. A leftover `screens-tmp/` from an interrupted run is
//! discarded.

use collage_core::ffmpeg::MediaTools;
use collage_core::thumbnail::thumbnail_file_name;
use collage_db::models::movie::Movie;
use collage_db::models::thumbnail::CreateThumbnail;
use collage_db::repositories::{MovieRepo, ThumbnailRepo};
use collage_db::DbPool;

use crate::config::CollageConfig;
use crate::error::{PipelineError, PipelineResult};

/// Counters for one extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub movies_extracted: usize,
    pub movies_skipped: usize,
    pub thumbnails_written: usize,
}

/// Extract thumbnails for every movie that has no `screens/` directory yet.
pub async fn extract_missing_thumbnails<M: MediaTools>(
    pool: &DbPool,
    config: &CollageConfig,
    media: &M,
) -> PipelineResult<ExtractionSummary> {
    let mut summary = ExtractionSummary::default();

    for movie in MovieRepo::list(pool).await? {
        if config.screens_dir(&movie.folder).exists() {
            tracing::debug!(folder = %movie.folder, "Thumbnails already extracted");
            summary.movies_skipped += 1;
            continue;
        }
        summary.thumbnails_written += extract_movie(pool, config, media, &movie).await?;
        summary.movies_extracted += 1;
    }

    tracing::info!(
        extracted = summary.movies_extracted,
        skipped = summary.movies_skipped,
        thumbnails = summary.thumbnails_written,
        "Thumbnail extraction finished",
    );
    Ok(summary)
}

/// Extract one movie's thumbnails. Returns the number written.
pub async fn extract_movie<M: MediaTools>(
    pool: &DbPool,
    config: &CollageConfig,
    media: &M,
    movie: &Movie,
) -> PipelineResult<usize> {
    let source = config.movie_dir(&movie.folder).join(&movie.filename);
    let tmp = config.screens_tmp_dir(&movie.folder);
    let screens = config.screens_dir(&movie.folder);

    if tmp.exists() {
        tracing::warn!(folder = %movie.folder, "Removing stale staging directory");
        tokio::fs::remove_dir_all(&tmp)
            .await
            .map_err(|e| PipelineError::io(&tmp, e))?;
    }
    tokio::fs::create_dir_all(&tmp)
        .await
        .map_err(|e| PipelineError::io(&tmp, e))?;

    let grid = config.sampling.grid(movie.duration());
    if config.sampling.is_truncated(movie.duration()) {
        tracing::warn!(
            folder = %movie.folder,
            frames = grid.len(),
            "Movie is longer than the thumbnail grid; the tail gets no thumbnails",
        );
    }
    tracing::info!(folder = %movie.folder, frames = grid.len(), "Extracting thumbnails");

    let orientation = &movie.metadata.format.orientation;
    for &(index, timestamp) in &grid {
        let filename = thumbnail_file_name(index);
        media
            .extract_frame(&source, timestamp, orientation, &tmp.join(&filename))
            .await?;
        ThumbnailRepo::create(
            pool,
            &CreateThumbnail {
                movie_id: movie.id,
                filename,
            },
        )
        .await?;
    }

    tokio::fs::rename(&tmp, &screens)
        .await
        .map_err(|e| PipelineError::io(&screens, e))?;
    Ok(grid.len())
}
