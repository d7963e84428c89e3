//! Repository for the append-only `used_cuts` ledger.

use std::collections::HashMap;

use collage_core::selection::TimeSlice;
use collage_core::types::DbId;
use sqlx::SqlitePool;

use crate::models::used_cut::{CreateUsedCut, UsedCut};

/// Column list for used_cuts queries.
const COLUMNS: &str = "id, compilation, movie_id, start_secs, end_secs, created_at";

/// Provides append and lookup for the used-cuts ledger.
pub struct UsedCutRepo;

impl UsedCutRepo {
    /// Append every clip of one compilation within a single transaction.
    ///
    /// Returns the number of rows written.
    pub async fn append_many(
        pool: &SqlitePool,
        compilation: &str,
        cuts: &[CreateUsedCut],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let created_at = chrono::Utc::now();
        let mut written = 0;

        for cut in cuts {
            let result = sqlx::query(
                "INSERT INTO used_cuts (compilation, movie_id, start_secs, end_secs, created_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(compilation)
            .bind(cut.movie_id)
            .bind(cut.start_secs)
            .bind(cut.end_secs)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    /// List the cuts of one movie, oldest first.
    pub async fn list_for_movie(
        pool: &SqlitePool,
        movie_id: DbId,
    ) -> Result<Vec<UsedCut>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM used_cuts
             WHERE movie_id = ?
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, UsedCut>(&query)
            .bind(movie_id)
            .fetch_all(pool)
            .await
    }

    /// Every used slice, keyed by movie.
    pub async fn list_grouped(
        pool: &SqlitePool,
    ) -> Result<HashMap<DbId, Vec<TimeSlice>>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM used_cuts ORDER BY movie_id ASC, id ASC");
        let rows = sqlx::query_as::<_, UsedCut>(&query).fetch_all(pool).await?;

        let mut grouped: HashMap<DbId, Vec<TimeSlice>> = HashMap::new();
        for row in rows {
            grouped.entry(row.movie_id).or_default().push(row.slice());
        }
        Ok(grouped)
    }
}
