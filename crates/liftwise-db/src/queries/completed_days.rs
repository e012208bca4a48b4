//! Database query functions for the `completed_days` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::DayCompletion;

/// Record a finished day.
///
/// Uses `ON CONFLICT DO NOTHING` against the (user, routine, week, day)
/// unique key. Returns `None` when the day was already recorded.
pub async fn insert_completion(
    pool: &PgPool,
    user_id: Uuid,
    routine_id: Uuid,
    week: i32,
    day: i32,
) -> Result<Option<DayCompletion>> {
    let completion = sqlx::query_as::<_, DayCompletion>(
        "INSERT INTO completed_days (user_id, routine_id, week, day) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, routine_id, week, day) DO NOTHING \
         RETURNING *",
    )
    .bind(user_id)
    .bind(routine_id)
    .bind(week)
    .bind(day)
    .fetch_optional(pool)
    .await
    .with_context(|| {
        format!("failed to record completion for routine {routine_id} week {week} day {day}")
    })?;

    Ok(completion)
}

/// Fetch the completion record for one day, if any.
pub async fn get_completion(
    pool: &PgPool,
    user_id: Uuid,
    routine_id: Uuid,
    week: i32,
    day: i32,
) -> Result<Option<DayCompletion>> {
    let completion = sqlx::query_as::<_, DayCompletion>(
        "SELECT * FROM completed_days \
         WHERE user_id = $1 AND routine_id = $2 AND week = $3 AND day = $4",
    )
    .bind(user_id)
    .bind(routine_id)
    .bind(week)
    .bind(day)
    .fetch_optional(pool)
    .await
    .context("failed to fetch day completion")?;

    Ok(completion)
}

/// List all finished days for a routine, ordered by week then day.
pub async fn list_completions_for_routine(
    pool: &PgPool,
    user_id: Uuid,
    routine_id: Uuid,
) -> Result<Vec<DayCompletion>> {
    let completions = sqlx::query_as::<_, DayCompletion>(
        "SELECT * FROM completed_days \
         WHERE user_id = $1 AND routine_id = $2 \
         ORDER BY week ASC, day ASC",
    )
    .bind(user_id)
    .bind(routine_id)
    .fetch_all(pool)
    .await
    .context("failed to list day completions")?;

    Ok(completions)
}
