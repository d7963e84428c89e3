//! Repository for the `movies` table.

use collage_core::types::DbId;
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::models::movie::{CreateMovie, Movie};

/// Column list for movies queries.
const COLUMNS: &str = "id, folder, filename, metadata";

/// Provides registration and lookup for movies.
pub struct MovieRepo;

impl MovieRepo {
    /// Insert a movie, or refresh file name and metadata if the folder is
    /// already registered. Returns the stored row.
    pub async fn upsert(pool: &SqlitePool, input: &CreateMovie) -> Result<Movie, sqlx::Error> {
        let query = format!(
            "INSERT INTO movies (folder, filename, metadata)
             VALUES (?, ?, ?)
             ON CONFLICT (folder) DO UPDATE SET
                filename = excluded.filename,
                metadata = excluded.metadata
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Movie>(&query)
            .bind(&input.folder)
            .bind(&input.filename)
            .bind(Json(&input.metadata))
            .fetch_one(pool)
            .await
    }

    /// Find a movie by its primary key.
    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Movie>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM movies WHERE id = ?");
        sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a movie by its folder name.
    pub async fn find_by_folder(
        pool: &SqlitePool,
        folder: &str,
    ) -> Result<Option<Movie>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM movies WHERE folder = ?");
        sqlx::query_as::<_, Movie>(&query)
            .bind(folder)
            .fetch_optional(pool)
            .await
    }

    /// List every movie, ordered by folder.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<Movie>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM movies ORDER BY folder ASC");
        sqlx::query_as::<_, Movie>(&query).fetch_all(pool).await
    }
}
