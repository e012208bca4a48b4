//! The three-step questionnaire (goals, equipment, schedule).
//!
//! Each step merges its keys into the user's stored answers. Generation
//! reads them back as a [`Questionnaire`] once every required key is set.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use liftwise_db::queries::wizard_answers;

use crate::error::ServiceError;
use crate::program::Questionnaire;

pub const MAX_DAYS_PER_WEEK: u32 = 7;
pub const MAX_WEEKS: u32 = 52;

/// One submitted wizard step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardStep {
    Goals {
        goals: String,
        program_ref: Option<String>,
        /// Whether this submission carried a non-empty upload.
        import_file: bool,
    },
    Equipment {
        equipment: String,
    },
    Schedule {
        days_per_week: u32,
        weeks: u32,
    },
}

impl WizardStep {
    /// Check the step's values before anything is stored.
    pub fn validate(&self) -> Result<(), ServiceError> {
        match self {
            WizardStep::Goals { goals, .. } if goals.trim().is_empty() => {
                Err(ServiceError::invalid_input("goals must not be empty"))
            }
            WizardStep::Equipment { equipment } if equipment.trim().is_empty() => {
                Err(ServiceError::invalid_input("equipment must not be empty"))
            }
            WizardStep::Schedule { days_per_week, .. }
                if !(1..=MAX_DAYS_PER_WEEK).contains(days_per_week) =>
            {
                Err(ServiceError::invalid_input(format!(
                    "days per week must be between 1 and {MAX_DAYS_PER_WEEK}"
                )))
            }
            WizardStep::Schedule { weeks, .. } if !(1..=MAX_WEEKS).contains(weeks) => Err(
                ServiceError::invalid_input(format!("weeks must be between 1 and {MAX_WEEKS}")),
            ),
            _ => Ok(()),
        }
    }

    /// The JSON keys this step contributes to the stored answers.
    pub fn to_patch(&self) -> Value {
        match self {
            WizardStep::Goals {
                goals,
                program_ref,
                import_file,
            } => json!({
                "goals": goals.trim(),
                "program_ref": program_ref
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty()),
                "import_file": import_file,
            }),
            WizardStep::Equipment { equipment } => json!({ "equipment": equipment.trim() }),
            WizardStep::Schedule {
                days_per_week,
                weeks,
            } => json!({ "days_per_week": days_per_week, "weeks": weeks }),
        }
    }
}

/// Everything the user has answered so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardAnswers {
    pub goals: Option<String>,
    pub program_ref: Option<String>,
    pub import_file: Option<bool>,
    pub equipment: Option<String>,
    pub days_per_week: Option<u32>,
    pub weeks: Option<u32>,
}

impl WizardAnswers {
    fn from_json(value: Value) -> Result<Self, ServiceError> {
        serde_json::from_value(value)
            .map_err(|e| ServiceError::Storage(anyhow::anyhow!("stored wizard answers are malformed: {e}")))
    }

    /// Convert to a [`Questionnaire`], naming the first unanswered field.
    pub fn questionnaire(&self) -> Result<Questionnaire, ServiceError> {
        fn required<T: Clone>(value: &Option<T>, name: &str) -> Result<T, ServiceError> {
            value.clone().ok_or_else(|| {
                ServiceError::invalid_input(format!("questionnaire is incomplete: {name} not answered"))
            })
        }

        Ok(Questionnaire {
            goals: required(&self.goals, "goals")?,
            program_ref: self.program_ref.clone(),
            equipment: required(&self.equipment, "equipment")?,
            days_per_week: required(&self.days_per_week, "days per week")?,
            weeks: required(&self.weeks, "weeks")?,
        })
    }
}

/// Validate a step and merge it into the stored answers.
pub async fn save_step(
    pool: &PgPool,
    user_id: Uuid,
    step: &WizardStep,
) -> Result<WizardAnswers, ServiceError> {
    step.validate()?;
    let row = wizard_answers::upsert_answers(pool, user_id, &step.to_patch()).await?;
    debug!(user_id = %user_id, "saved wizard step");
    WizardAnswers::from_json(row.answers)
}

/// Stored answers, or an empty set when the user has not started.
pub async fn load_answers(pool: &PgPool, user_id: Uuid) -> Result<WizardAnswers, ServiceError> {
    match wizard_answers::get_answers(pool, user_id).await? {
        Some(row) => WizardAnswers::from_json(row.answers),
        None => Ok(WizardAnswers::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goals_patch_drops_blank_program_ref() {
        let step = WizardStep::Goals {
            goals: "  get strong ".into(),
            program_ref: Some("   ".into()),
            import_file: false,
        };
        assert_eq!(
            step.to_patch(),
            json!({ "goals": "get strong", "program_ref": null, "import_file": false })
        );
    }

    #[test]
    fn schedule_bounds() {
        let ok = WizardStep::Schedule {
            days_per_week: 7,
            weeks: 52,
        };
        assert!(ok.validate().is_ok());

        for (days_per_week, weeks) in [(0, 4), (8, 4), (3, 0), (3, 53)] {
            let step = WizardStep::Schedule {
                days_per_week,
                weeks,
            };
            assert!(
                matches!(step.validate(), Err(ServiceError::InvalidInput(_))),
                "{days_per_week}/{weeks} should be rejected"
            );
        }
    }

    #[test]
    fn empty_text_steps_rejected() {
        let step = WizardStep::Equipment {
            equipment: " ".into(),
        };
        assert!(step.validate().is_err());
    }

    #[test]
    fn questionnaire_names_first_missing_field() {
        let answers = WizardAnswers {
            goals: Some("hypertrophy".into()),
            days_per_week: Some(3),
            weeks: Some(6),
            ..Default::default()
        };
        let err = answers.questionnaire().unwrap_err();
        assert!(err.to_string().contains("equipment"), "{err}");
    }

    #[test]
    fn answers_parse_from_partial_json() {
        let answers =
            WizardAnswers::from_json(json!({ "goals": "strength", "program_ref": null })).unwrap();
        assert_eq!(answers.goals.as_deref(), Some("strength"));
        assert!(answers.program_ref.is_none());
        assert!(answers.weeks.is_none());
    }
}
