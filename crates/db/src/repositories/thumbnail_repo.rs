//! Repository for the `thumbnails` table.
//!
//! File names are zero-padded, so ordering by `filename` is ordering by
//! thumbnail index.

use collage_core::types::DbId;
use sqlx::SqlitePool;

use crate::models::thumbnail::{CreateThumbnail, Thumbnail};

/// Column list for thumbnails queries.
const COLUMNS: &str = "id, movie_id, filename, rating";

/// Provides thumbnail records and their ratings.
pub struct ThumbnailRepo;

impl ThumbnailRepo {
    /// Record an extracted thumbnail. An existing row for the same file keeps
    /// its rating.
    pub async fn create(
        pool: &SqlitePool,
        input: &CreateThumbnail,
    ) -> Result<Thumbnail, sqlx::Error> {
        let query = format!(
            "INSERT INTO thumbnails (movie_id, filename)
             VALUES (?, ?)
             ON CONFLICT (movie_id, filename) DO UPDATE SET filename = excluded.filename
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Thumbnail>(&query)
            .bind(input.movie_id)
            .bind(&input.filename)
            .fetch_one(pool)
            .await
    }

    /// List a movie's thumbnails in index order.
    pub async fn list_for_movie(
        pool: &SqlitePool,
        movie_id: DbId,
    ) -> Result<Vec<Thumbnail>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM thumbnails
             WHERE movie_id = ?
             ORDER BY filename ASC"
        );
        sqlx::query_as::<_, Thumbnail>(&query)
            .bind(movie_id)
            .fetch_all(pool)
            .await
    }

    /// List every thumbnail, grouped by movie and in index order.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Thumbnail>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM thumbnails ORDER BY movie_id ASC, filename ASC");
        sqlx::query_as::<_, Thumbnail>(&query).fetch_all(pool).await
    }

    /// Store a rating, creating the thumbnail row if it was never recorded.
    pub async fn set_rating(
        pool: &SqlitePool,
        movie_id: DbId,
        filename: &str,
        rating: i64,
    ) -> Result<Thumbnail, sqlx::Error> {
        let query = format!(
            "INSERT INTO thumbnails (movie_id, filename, rating)
             VALUES (?, ?, ?)
             ON CONFLICT (movie_id, filename) DO UPDATE SET rating = excluded.rating
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Thumbnail>(&query)
            .bind(movie_id)
            .bind(filename)
            .bind(rating)
            .fetch_one(pool)
            .await
    }

    /// Count the rated thumbnails of a movie.
    pub async fn count_rated(pool: &SqlitePool, movie_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM thumbnails WHERE movie_id = ? AND rating IS NOT NULL",
        )
        .bind(movie_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
