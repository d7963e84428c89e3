use std::path::{Path, PathBuf};

use collage_core::error::CoreError;
use collage_core::thumbnail::{Sampling, SCREENS_DIR, SCREENS_TMP_DIR};

/// Default SQLite location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/data.db";

/// Default sampling frequency `F`, in seconds.
pub const DEFAULT_SCREENSHOT_FREQUENCY: f64 = 20.0;

/// Default sampling start offset `S`, in seconds.
pub const DEFAULT_SCREENSHOT_START: f64 = 10.0;

/// Library configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CollageConfig {
    pub database_url: String,
    /// Root folder holding one sub-folder per movie.
    pub raw_dir: PathBuf,
    /// Where compilations are written.
    pub collage_dir: PathBuf,
    pub sampling: Sampling,
}

impl CollageConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `DATABASE_URL`         | `sqlite://data/data.db` |
    /// | `RAW_DIR`              | `raw`                   |
    /// | `COLLAGE_DIR`          | `collage`               |
    /// | `SCREENSHOT_FREQUENCY` | `20`                    |
    /// | `SCREENSHOT_START`     | `10`                    |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let raw_dir = PathBuf::from(lookup("RAW_DIR").unwrap_or_else(|| "raw".into()));
        let collage_dir = PathBuf::from(lookup("COLLAGE_DIR").unwrap_or_else(|| "collage".into()));

        let frequency = parse_seconds(&lookup, "SCREENSHOT_FREQUENCY", DEFAULT_SCREENSHOT_FREQUENCY)?;
        let start = parse_seconds(&lookup, "SCREENSHOT_START", DEFAULT_SCREENSHOT_START)?;
        let sampling = Sampling::new(frequency, start)?;

        Ok(Self {
            database_url,
            raw_dir,
            collage_dir,
            sampling,
        })
    }

    /// Configuration rooted at `root` with default sampling, for tests and
    /// one-off tools.
    pub fn with_root(root: &Path, database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            raw_dir: root.join("raw"),
            collage_dir: root.join("collage"),
            sampling: Sampling {
                frequency_secs: DEFAULT_SCREENSHOT_FREQUENCY,
                start_secs: DEFAULT_SCREENSHOT_START,
            },
        }
    }

    pub fn movie_dir(&self, folder: &str) -> PathBuf {
        self.raw_dir.join(folder)
    }

    pub fn screens_dir(&self, folder: &str) -> PathBuf {
        self.movie_dir(folder).join(SCREENS_DIR)
    }

    pub fn screens_tmp_dir(&self, folder: &str) -> PathBuf {
        self.movie_dir(folder).join(SCREENS_TMP_DIR)
    }
}

fn parse_seconds<F>(lookup: &F, key: &str, default: f64) -> Result<f64, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| CoreError::Validation(format!("{key} must be a number, got '{raw}'"))),
    }
}
