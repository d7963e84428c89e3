//! Movie registration: locate the movie file, probe it and store it.
//!
//! A movie folder may carry a `metadata.yaml` with hand-written overrides:
//! `file` (path of the movie inside the folder), `format`, `video`, and any
//! free-form keys, which are stored alongside the probed metadata. Older
//! folders use a one-line `format` file (`fov,orientation,perspective`)
//! instead.

use std::path::{Path, PathBuf};

use collage_core::error::CoreError;
use collage_core::ffmpeg::MediaTools;
use collage_core::format::{is_movie_file_name, MovieMetadata, VideoFormat, VideoStats};
use collage_db::models::movie::{CreateMovie, Movie};
use collage_db::repositories::MovieRepo;
use collage_db::DbPool;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::config::CollageConfig;
use crate::error::{PipelineError, PipelineResult};

/// Per-folder override file.
pub const OVERRIDE_FILE: &str = "metadata.yaml";

/// Legacy per-folder format file.
pub const LEGACY_FORMAT_FILE: &str = "format";

/// Release-name marker of the basic 180° side-by-side format.
const BASIC_FORMAT_MARKER: &str = "180x180_3dh";

/// Contents of a folder's `metadata.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderOverrides {
    pub file: Option<String>,
    pub format: Option<VideoFormat>,
    pub video: Option<VideoStats>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Register the movie in `<raw>/<folder>`, or refresh it if already known.
///
/// `file` names the movie file explicitly; otherwise the folder must hold
/// exactly one movie file. Free-form metadata stored earlier is kept.
pub async fn register_movie<M: MediaTools>(
    pool: &DbPool,
    config: &CollageConfig,
    media: &M,
    folder: &str,
    format: VideoFormat,
    file: Option<&str>,
) -> PipelineResult<Movie> {
    format.validate()?;

    let dir = existing_movie_dir(config, folder)?;
    let filename = match file {
        Some(name) => resolve_file(&dir, name)?,
        None => find_movie_file(&dir)?,
    };

    let stats = media.probe(&dir.join(&filename)).await?;
    let metadata = MovieMetadata::new(stats, format);
    save_movie(pool, folder, filename, metadata).await
}

/// Register every folder under `config.raw_dir`, in name order.
///
/// Overrides from each folder's `metadata.yaml` (or legacy `format` file)
/// win over discovery and probing. A folder without a movie file or with
/// an unknown format aborts the pass.
pub async fn register_all<M: MediaTools>(
    pool: &DbPool,
    config: &CollageConfig,
    media: &M,
) -> PipelineResult<Vec<Movie>> {
    let raw = &config.raw_dir;
    let entries = std::fs::read_dir(raw).map_err(|e| PipelineError::io(raw, e))?;

    let mut folders = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(raw, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if !name.starts_with('.') => folders.push(name),
            Ok(_) => {}
            Err(name) => tracing::warn!(?name, "Skipping folder with a non UTF-8 name"),
        }
    }
    folders.sort();

    let mut movies = Vec::with_capacity(folders.len());
    for folder in &folders {
        movies.push(register_folder(pool, config, media, folder).await?);
    }

    tracing::info!(movies = movies.len(), "Library registration finished");
    Ok(movies)
}

/// Register one folder using its overrides.
pub async fn register_folder<M: MediaTools>(
    pool: &DbPool,
    config: &CollageConfig,
    media: &M,
    folder: &str,
) -> PipelineResult<Movie> {
    let dir = existing_movie_dir(config, folder)?;
    let overrides = read_overrides(&dir)?;

    let filename = match overrides.file.as_deref() {
        Some(name) => resolve_file(&dir, name)?,
        None => find_movie_file(&dir)?,
    };

    let format = match overrides.format {
        Some(format) => format,
        None => match read_legacy_format(&dir)? {
            Some(format) => format,
            None if filename.contains(BASIC_FORMAT_MARKER) => VideoFormat::basic(),
            None => {
                return Err(CoreError::UnsupportedFormat(format!(
                    "Format of '{folder}' is unknown; set it in {OVERRIDE_FILE}"
                ))
                .into())
            }
        },
    };
    format.validate()?;

    let stats = match overrides.video {
        Some(stats) => stats,
        None => media.probe(&dir.join(&filename)).await?,
    };

    let mut metadata = MovieMetadata::new(stats, format);
    metadata.extra = overrides.extra;
    save_movie(pool, folder, filename, metadata).await
}

/// Read `<dir>/metadata.yaml`; a missing file means no overrides.
pub fn read_overrides(dir: &Path) -> PipelineResult<FolderOverrides> {
    let path = dir.join(OVERRIDE_FILE);
    if !path.is_file() {
        return Ok(FolderOverrides::default());
    }
    let content = std::fs::read_to_string(&path).map_err(|e| PipelineError::io(&path, e))?;
    if content.trim().is_empty() {
        return Ok(FolderOverrides::default());
    }
    serde_yaml::from_str(&content).map_err(|e| {
        CoreError::Validation(format!("Invalid {OVERRIDE_FILE} in '{}': {e}", dir.display())).into()
    })
}

/// Read the legacy `<dir>/format` file, if present.
pub fn read_legacy_format(dir: &Path) -> PipelineResult<Option<VideoFormat>> {
    let path = dir.join(LEGACY_FORMAT_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|e| PipelineError::io(&path, e))?;

    match content.trim().split(',').map(str::trim).collect::<Vec<_>>().as_slice() {
        [fov, orientation, perspective] => Ok(Some(VideoFormat {
            fov: fov.to_string(),
            orientation: orientation.to_string(),
            perspective: perspective.to_string(),
        })),
        _ => Err(CoreError::Validation(format!(
            "'{}' must read fov,orientation,perspective",
            path.display()
        ))
        .into()),
    }
}

/// The single movie file anywhere under `dir`, as a path relative to it.
pub fn find_movie_file(dir: &Path) -> PipelineResult<String> {
    let mut found: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| PipelineError::io(dir, e.into()))?;
        let is_movie = entry.file_type().is_file()
            && entry.file_name().to_str().is_some_and(is_movie_file_name);
        if is_movie {
            found.push(entry.into_path());
        }
    }

    match found.as_slice() {
        [single] => Ok(relative_name(dir, single)),
        [] => Err(CoreError::Validation(format!("No movie file found in '{}'", dir.display())).into()),
        many => Err(CoreError::Validation(format!(
            "{} movie files found in '{}'; name one explicitly",
            many.len(),
            dir.display()
        ))
        .into()),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn existing_movie_dir(config: &CollageConfig, folder: &str) -> PipelineResult<PathBuf> {
    let dir = config.movie_dir(folder);
    if !dir.is_dir() {
        return Err(CoreError::Validation(format!(
            "Movie folder '{}' does not exist",
            dir.display()
        ))
        .into());
    }
    Ok(dir)
}

/// Check that `name` is a file in `dir` and return it relative to `dir`.
/// Absolute paths are accepted when they point inside `dir`.
fn resolve_file(dir: &Path, name: &str) -> PipelineResult<String> {
    let path = Path::new(name);
    let relative = if path.is_absolute() {
        path.strip_prefix(dir).map_err(|_| {
            CoreError::Validation(format!("'{name}' is outside '{}'", dir.display()))
        })?
    } else {
        path
    };

    if !dir.join(relative).is_file() {
        return Err(CoreError::Validation(format!(
            "'{name}' is not a file in '{}'",
            dir.display()
        ))
        .into());
    }
    Ok(relative.to_string_lossy().into_owned())
}

fn relative_name(dir: &Path, path: &Path) -> String {
    path.strip_prefix(dir)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Upsert the movie, keeping free-form keys stored earlier unless the new
/// metadata sets them.
async fn save_movie(
    pool: &DbPool,
    folder: &str,
    filename: String,
    mut metadata: MovieMetadata,
) -> PipelineResult<Movie> {
    if let Some(existing) = MovieRepo::find_by_folder(pool, folder).await? {
        for (key, value) in existing.metadata.0.extra {
            metadata.extra.entry(key).or_insert(value);
        }
    }

    let movie = MovieRepo::upsert(
        pool,
        &CreateMovie {
            folder: folder.to_string(),
            filename,
            metadata,
        },
    )
    .await?;

    tracing::info!(
        folder,
        filename = %movie.filename,
        duration = movie.duration(),
        format = %movie.metadata.format,
        "Registered movie",
    );
    Ok(movie)
}
