//! Shared fixtures: a temporary library around a test store and a fake
//! media toolchain.

#![allow(dead_code)]

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use collage_core::ffmpeg::{FfmpegError, MediaTools};
use collage_core::format::{MovieMetadata, VideoFormat, VideoStats};
use collage_core::thumbnail::thumbnail_file_name;
use collage_core::types::{DbId, Seconds};
use collage_db::models::movie::{CreateMovie, Movie};
use collage_db::repositories::{MovieRepo, ThumbnailRepo};
use collage_pipeline::CollageConfig;
use sqlx::SqlitePool;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fake media tools
// ---------------------------------------------------------------------------

/// Records every call; extracted frames are written as tiny files.
#[derive(Debug, Default)]
pub struct FakeMedia {
    pub duration: Seconds,
    pub frames: Mutex<Vec<(PathBuf, Seconds, String)>>,
    pub encodes: Mutex<Vec<Vec<OsString>>>,
}

impl FakeMedia {
    pub fn with_duration(duration: Seconds) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn encode_count(&self) -> usize {
        self.encodes.lock().unwrap().len()
    }
}

impl MediaTools for FakeMedia {
    async fn probe(&self, video: &Path) -> Result<VideoStats, FfmpegError> {
        if !video.exists() {
            return Err(FfmpegError::VideoNotFound(video.display().to_string()));
        }
        Ok(VideoStats {
            duration: self.duration,
            width: 5760,
            height: 2880,
        })
    }

    async fn extract_frame(
        &self,
        video: &Path,
        timestamp: Seconds,
        orientation: &str,
        output: &Path,
    ) -> Result<(), FfmpegError> {
        std::fs::write(output, b"jpg")?;
        self.frames
            .lock()
            .unwrap()
            .push((video.to_path_buf(), timestamp, orientation.to_string()));
        Ok(())
    }

    async fn encode(&self, args: &[OsString]) -> Result<(), FfmpegError> {
        self.encodes.lock().unwrap().push(args.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Library fixtures
// ---------------------------------------------------------------------------

pub struct Library {
    pub dir: TempDir,
    pub config: CollageConfig,
    pub pool: SqlitePool,
}

impl Library {
    /// An empty `raw/` tree in a temporary directory, backed by `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = CollageConfig::with_root(dir.path(), "sqlite::memory:");
        std::fs::create_dir_all(&config.raw_dir).unwrap();
        Self { dir, config, pool }
    }
}

/// Create `raw/<folder>/<folder>.mp4` and register it directly in the store.
pub async fn add_movie(
    lib: &Library,
    folder: &str,
    duration: Seconds,
    format: VideoFormat,
) -> Movie {
    let movie_dir = lib.config.movie_dir(folder);
    std::fs::create_dir_all(&movie_dir).unwrap();
    let filename = format!("{folder}.mp4");
    std::fs::write(movie_dir.join(&filename), b"movie").unwrap();

    MovieRepo::upsert(
        &lib.pool,
        &CreateMovie {
            folder: folder.to_string(),
            filename,
            metadata: MovieMetadata::new(
                VideoStats {
                    duration,
                    width: 5760,
                    height: 2880,
                },
                format,
            ),
        },
    )
    .await
    .unwrap()
}

/// Write `count` thumbnail files into `raw/<folder>/screens/`.
pub fn write_screens(lib: &Library, folder: &str, count: u32) -> PathBuf {
    let screens = lib.config.screens_dir(folder);
    std::fs::create_dir_all(&screens).unwrap();
    for index in 0..count {
        std::fs::write(screens.join(thumbnail_file_name(index)), b"jpg").unwrap();
    }
    screens
}

/// Store a rating for each `(index, good)` pair.
pub async fn rate(lib: &Library, movie_id: DbId, ratings: &[(u32, bool)]) {
    for &(index, good) in ratings {
        ThumbnailRepo::set_rating(&lib.pool, movie_id, &thumbnail_file_name(index), i64::from(good))
            .await
            .unwrap();
    }
}
