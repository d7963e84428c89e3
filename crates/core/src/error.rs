#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} '{key}'")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Thumbnail names are a hard contract (`thumb####.ext`); a violation
    /// would silently misassign timestamps, so it aborts the run.
    #[error("Malformed thumbnail name: {0}")]
    MalformedThumbnailName(String),

    #[error("Unsupported movie format: {0}")]
    UnsupportedFormat(String),
}
