//! Builds the generation prompt from questionnaire answers.
//!
//! The system message carries the coach role, a JSON schema for the
//! program document, and an example. The user message lists the
//! questionnaire answers and, when the user uploaded a file, a bounded
//! excerpt of it with instructions to favour its contents.

use serde_json::{Value, json};

use crate::text::truncate_chars;

/// Upload excerpts embedded in the prompt are cut to this many characters.
pub const UPLOAD_EXCERPT_CHARS: usize = 3000;

/// Answers collected by the wizard, in the shape generation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Questionnaire {
    pub goals: String,
    /// Name of a known program the user wants to follow or adapt.
    pub program_ref: Option<String>,
    pub equipment: String,
    pub days_per_week: u32,
    pub weeks: u32,
}

/// The two messages sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompt {
    pub system: String,
    pub user: String,
}

const COACH_ROLE: &str = "\
You are a science-driven weightlifting coach who writes personalized, \
evidence-based strength training programs.

Plan the program around the number of training days per week so each muscle \
group recovers before it is trained again. Adapt every exercise to the \
equipment the user has. When a commercial gym is implied, assume standard \
machines (leg press, lat pulldown, cable stations, smith machine) are \
available alongside free weights.

Return every week and every day of the program; never return only the first \
week. Number weeks and days starting from 1 in ascending order. Each \
exercise_example must be a demonstration of the exercise it accompanies.

Respond with a single JSON object and nothing else. It must match this JSON \
schema:";

const EXAMPLE_OUTPUT: &str = r#"{
  "title": "Strength & Hypertrophy - Commercial Gym Beginner",
  "summary": "Full-body split mixing machines and free weights for general strength and muscle.",
  "weeks": [
    {
      "week": 1,
      "days": [
        {
          "day": 1,
          "exercises": [
            { "name": "Leg Press", "muscle_targeted": "quads", "exercise_example": "https://example.com/legpress", "sets": 3, "reps": "10-12", "rir": 3 },
            { "name": "Pec Fly Machine", "muscle_targeted": "pecs", "exercise_example": "https://example.com/pecfly", "sets": 3, "reps": "8-12", "rir": 3 }
          ]
        }
      ]
    }
  ]
}"#;

/// JSON schema describing the program document.
///
/// `serde_json` maps are ordered, so the rendered text is identical on every
/// call.
pub fn program_json_schema() -> Value {
    json!({
        "type": "object",
        "required": ["title", "summary", "weeks"],
        "properties": {
            "title": { "type": "string" },
            "summary": { "type": "string" },
            "weeks": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["week", "days"],
                    "properties": {
                        "week": { "type": "integer", "minimum": 1 },
                        "days": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["day", "exercises"],
                                "properties": {
                                    "day": { "type": "integer", "minimum": 1 },
                                    "exercises": {
                                        "type": "array",
                                        "items": {
                                            "type": "object",
                                            "required": ["name", "sets", "reps"],
                                            "properties": {
                                                "name": { "type": "string" },
                                                "sets": { "type": "integer", "minimum": 1 },
                                                "reps": { "type": "string" },
                                                "rir": { "type": ["integer", "null"], "default": 2 },
                                                "muscle_targeted": { "type": "string" },
                                                "exercise_example": { "type": "string" }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// System message: role, schema, and an example document.
pub fn build_system_prompt() -> String {
    // Serializing a `Value` cannot fail.
    let schema = serde_json::to_string_pretty(&program_json_schema()).unwrap_or_default();
    format!("{COACH_ROLE}\n\n{schema}\n\nExample output:\n{EXAMPLE_OUTPUT}")
}

/// User message: the questionnaire answers plus an optional upload excerpt.
pub fn build_user_prompt(questionnaire: &Questionnaire, upload: Option<&str>) -> String {
    let mut sections = vec![
        format!("Goals: {}", questionnaire.goals),
        format!("Equipment: {}", questionnaire.equipment),
        format!("Days per week: {}", questionnaire.days_per_week),
        format!("Weeks: {}", questionnaire.weeks),
    ];
    if let Some(ref program_ref) = questionnaire.program_ref {
        sections.push(format!("Known program to reference: {program_ref}"));
    }

    match upload.filter(|u| !u.trim().is_empty()) {
        Some(text) => {
            sections.push(format!(
                "The user uploaded a program. It takes priority over general \
                 recommendations: preserve its exercises, sets, and reps when \
                 reasonable, and adapt it only where it conflicts with the \
                 schedule or equipment above.\n\nUPLOAD:\n{}",
                truncate_chars(text, UPLOAD_EXCERPT_CHARS)
            ));
        }
        None => {
            sections.push(
                "No upload was provided. Design the program from the answers above.".to_owned(),
            );
        }
    }

    sections.join("\n\n")
}

pub fn build_prompt(questionnaire: &Questionnaire, upload: Option<&str>) -> GenerationPrompt {
    GenerationPrompt {
        system: build_system_prompt(),
        user: build_user_prompt(questionnaire, upload),
    }
}
