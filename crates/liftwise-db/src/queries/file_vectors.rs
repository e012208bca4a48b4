//! Database query functions for the `file_vectors` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::FileVector;

/// Store uploaded text together with its embedding.
pub async fn insert_file_vector(
    pool: &PgPool,
    user_id: Uuid,
    filename: &str,
    file_text: &str,
    embedding: &[f32],
) -> Result<FileVector> {
    let row = sqlx::query_as::<_, FileVector>(
        "INSERT INTO file_vectors (user_id, filename, file_text, embedding) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(filename)
    .bind(file_text)
    .bind(embedding)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to store uploaded file {filename:?}"))?;

    Ok(row)
}

/// Text of the user's most recent upload.
pub async fn latest_file_text(pool: &PgPool, user_id: Uuid) -> Result<Option<String>> {
    let text: Option<String> = sqlx::query_scalar(
        "SELECT file_text FROM file_vectors \
         WHERE user_id = $1 \
         ORDER BY ts DESC \
         LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch latest uploaded file text")?;

    Ok(text)
}
