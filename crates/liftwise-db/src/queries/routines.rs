//! Database query functions for the `routines` table.
//!
//! These functions store whatever JSON they are given. Callers are expected
//! to validate program documents first (see `liftwise_core::program`).

use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Routine;

/// Insert a new routine. Returns the row with server-generated defaults.
pub async fn insert_routine(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    routine_json: &Value,
) -> Result<Routine> {
    let routine = sqlx::query_as::<_, Routine>(
        "INSERT INTO routines (user_id, title, routine_json) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(title)
    .bind(routine_json)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert routine {title:?}"))?;

    Ok(routine)
}

/// Fetch a routine by ID, regardless of owner.
pub async fn get_routine(pool: &PgPool, id: Uuid) -> Result<Option<Routine>> {
    let routine = sqlx::query_as::<_, Routine>("SELECT * FROM routines WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch routine")?;

    Ok(routine)
}

/// Fetch a routine by ID only if it belongs to `user_id`.
pub async fn get_routine_for_user(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Routine>> {
    let routine =
        sqlx::query_as::<_, Routine>("SELECT * FROM routines WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch routine for user")?;

    Ok(routine)
}

/// List a user's routines, newest first.
pub async fn list_routines_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Routine>> {
    let routines = sqlx::query_as::<_, Routine>(
        "SELECT * FROM routines WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list routines")?;

    Ok(routines)
}

/// Replace the title and program document of an existing routine.
///
/// Returns `None` when no routine with that ID belongs to `user_id`.
pub async fn replace_routine(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    title: &str,
    routine_json: &Value,
) -> Result<Option<Routine>> {
    let routine = sqlx::query_as::<_, Routine>(
        "UPDATE routines \
         SET title = $3, routine_json = $4, updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(title)
    .bind(routine_json)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to replace routine {id}"))?;

    Ok(routine)
}
