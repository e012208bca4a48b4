use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// Stored questionnaire answers for one user.
///
/// `answers` is a JSON object; each wizard step merges its keys into it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WizardAnswersRow {
    pub user_id: Uuid,
    pub answers: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// A persisted training program.
///
/// `routine_json` holds the full program document; it is validated before
/// every write and again when read back.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Routine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub routine_json: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One performed set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SetLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub routine_id: Uuid,
    pub week: i32,
    pub day: i32,
    pub exercise_name: String,
    pub set_number: i32,
    pub weight: f64,
    pub reps: i32,
    pub notes: Option<String>,
    pub ts: DateTime<Utc>,
}

/// Marker that a workout day was finished.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DayCompletion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub routine_id: Uuid,
    pub week: i32,
    pub day: i32,
    pub ts: DateTime<Utc>,
}

/// Uploaded program text and its embedding.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileVector {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub file_text: String,
    pub embedding: Vec<f32>,
    pub ts: DateTime<Utc>,
}
