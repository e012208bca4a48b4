//! Database query functions for the `progress_logs` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::SetLog;

/// Parameters for inserting a new set log row.
#[derive(Debug, Clone)]
pub struct NewSetLog<'a> {
    pub user_id: Uuid,
    pub routine_id: Uuid,
    pub week: i32,
    pub day: i32,
    pub exercise_name: &'a str,
    pub set_number: i32,
    pub weight: f64,
    pub reps: i32,
    pub notes: Option<&'a str>,
}

/// Append a set log. Rows are never updated afterwards.
pub async fn insert_set_log(pool: &PgPool, new: &NewSetLog<'_>) -> Result<SetLog> {
    let log = sqlx::query_as::<_, SetLog>(
        "INSERT INTO progress_logs \
         (user_id, routine_id, week, day, exercise_name, set_number, weight, reps, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(new.user_id)
    .bind(new.routine_id)
    .bind(new.week)
    .bind(new.day)
    .bind(new.exercise_name)
    .bind(new.set_number)
    .bind(new.weight)
    .bind(new.reps)
    .bind(new.notes)
    .fetch_one(pool)
    .await
    .with_context(|| {
        format!(
            "failed to insert set log for routine {} week {} day {} exercise {:?}",
            new.routine_id, new.week, new.day, new.exercise_name
        )
    })?;

    Ok(log)
}

/// Count logged sets for one (user, routine, week, day).
pub async fn count_logged_sets(
    pool: &PgPool,
    user_id: Uuid,
    routine_id: Uuid,
    week: i32,
    day: i32,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM progress_logs \
         WHERE user_id = $1 AND routine_id = $2 AND week = $3 AND day = $4",
    )
    .bind(user_id)
    .bind(routine_id)
    .bind(week)
    .bind(day)
    .fetch_one(pool)
    .await
    .context("failed to count logged sets")?;

    Ok(count)
}

/// Best Epley estimated one-rep max the user has logged for an exercise,
/// across all of their routines. `None` when no set with reps exists.
pub async fn best_estimated_one_rep_max(
    pool: &PgPool,
    user_id: Uuid,
    exercise_name: &str,
) -> Result<Option<f64>> {
    let best: Option<f64> = sqlx::query_scalar(
        "SELECT MAX(weight * (1.0 + reps::float8 / 30.0)) FROM progress_logs \
         WHERE user_id = $1 AND exercise_name = $2 AND reps > 0",
    )
    .bind(user_id)
    .bind(exercise_name)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to fetch best estimated 1RM for {exercise_name:?}"))?;

    Ok(best)
}

/// List the set logs for one day, in the order they were recorded.
pub async fn list_set_logs_for_day(
    pool: &PgPool,
    user_id: Uuid,
    routine_id: Uuid,
    week: i32,
    day: i32,
) -> Result<Vec<SetLog>> {
    let logs = sqlx::query_as::<_, SetLog>(
        "SELECT * FROM progress_logs \
         WHERE user_id = $1 AND routine_id = $2 AND week = $3 AND day = $4 \
         ORDER BY ts ASC, set_number ASC",
    )
    .bind(user_id)
    .bind(routine_id)
    .bind(week)
    .bind(day)
    .fetch_all(pool)
    .await
    .context("failed to list set logs for day")?;

    Ok(logs)
}
