//! Database query functions for the `wizard_answers` table.

use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::WizardAnswersRow;

/// Merge `answers` into the stored answers for `user_id`, creating the row
/// if needed. Keys present in `answers` overwrite stored keys; other stored
/// keys are kept.
///
/// This is a single statement, so concurrent wizard submissions for the same
/// user cannot interleave a read and a write.
pub async fn upsert_answers(
    pool: &PgPool,
    user_id: Uuid,
    answers: &Value,
) -> Result<WizardAnswersRow> {
    if !answers.is_object() {
        anyhow::bail!("wizard answers must be a JSON object");
    }

    let row = sqlx::query_as::<_, WizardAnswersRow>(
        "INSERT INTO wizard_answers (user_id, answers) \
         VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE \
         SET answers = wizard_answers.answers || EXCLUDED.answers, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(user_id)
    .bind(answers)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert wizard answers for user {user_id}"))?;

    Ok(row)
}

/// Fetch the stored answers for a user.
pub async fn get_answers(pool: &PgPool, user_id: Uuid) -> Result<Option<WizardAnswersRow>> {
    let row =
        sqlx::query_as::<_, WizardAnswersRow>("SELECT * FROM wizard_answers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch wizard answers")?;

    Ok(row)
}
