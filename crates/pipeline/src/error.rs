use collage_core::error::CoreError;
use collage_core::ffmpeg::FfmpegError;

/// Error type for pipeline passes.
///
/// Wraps the domain, store and transcoder errors so a pass can use `?`
/// across all of them. Every variant aborts the current run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Media tool error: {0}")]
    Ffmpeg(#[from] FfmpegError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Attach the offending path to an I/O error.
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Convenience alias for pipeline return values.
pub type PipelineResult<T> = Result<T, PipelineError>;
