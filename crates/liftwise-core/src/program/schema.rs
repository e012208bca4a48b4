//! Program document types and the structural validator.
//!
//! A program arrives as untyped JSON (from the model or from a hand edit)
//! and is walked field by field so the first violation can be reported with
//! its full path, e.g. `weeks[0].days[2].exercises[1].sets`.
//!
//! Checks are structural only: required fields, JSON types, positive
//! counts, and strictly ascending week/day numbers. Rep ranges and exercise
//! choices are not judged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reps-in-reserve target used when a prescription omits `rir`.
pub const DEFAULT_RIR: i32 = 2;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A complete training program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub title: String,
    pub summary: String,
    pub weeks: Vec<WeekPlan>,
}

/// One week of a program. `week` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekPlan {
    pub week: u32,
    pub days: Vec<DayPlan>,
}

/// One training day within a week. `day` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    pub exercises: Vec<ExercisePrescription>,
}

/// Sets/reps/RIR target for one exercise on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExercisePrescription {
    pub name: String,
    pub sets: u32,
    /// Rep target, usually a range such as `"6-8"`.
    pub reps: String,
    /// `None` when the document explicitly sets `rir` to null.
    pub rir: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muscle_targeted: Option<String>,
    /// Link to a technique demonstration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_example: Option<String>,
}

impl Program {
    /// Look up a week by its number.
    pub fn week(&self, week: u32) -> Option<&WeekPlan> {
        self.weeks.iter().find(|w| w.week == week)
    }

    /// Look up a day by week and day number.
    pub fn day(&self, week: u32, day: u32) -> Option<&DayPlan> {
        self.week(week)?.days.iter().find(|d| d.day == day)
    }

    /// Total number of training days across all weeks.
    pub fn total_days(&self) -> usize {
        self.weeks.iter().map(|w| w.days.len()).sum()
    }

    /// Serialize to the stored JSON document form.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl DayPlan {
    /// Sum of prescribed sets across the day's exercises.
    pub fn prescribed_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets).sum()
    }

    /// Find a prescription by exact exercise name.
    pub fn exercise(&self, name: &str) -> Option<&ExercisePrescription> {
        self.exercises.iter().find(|e| e.name == name)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// What is wrong with a field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaProblem {
    #[error("is missing")]
    Missing,

    #[error("must be {expected}")]
    WrongType { expected: &'static str },

    #[error("must be a positive integer")]
    NotPositive,

    #[error("must be greater than the preceding value {previous}")]
    NotAscending { previous: u32 },
}

/// The first structural violation found in a program document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid program: `{field}` {problem}")]
pub struct SchemaError {
    /// Path of the offending field (`<root>` for the document itself).
    pub field: String,
    pub problem: SchemaProblem,
}

impl SchemaError {
    fn new(field: impl Into<String>, problem: SchemaProblem) -> Self {
        Self {
            field: field.into(),
            problem,
        }
    }
}

/// Failure to turn program text into a [`Program`].
#[derive(Debug, Error)]
pub enum ProgramJsonError {
    #[error("program is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate an arbitrary JSON value and build a [`Program`] from it.
///
/// Unknown keys are ignored. `rir` defaults to [`DEFAULT_RIR`] when absent
/// and becomes `None` when null.
pub fn validate_program(value: &Value) -> Result<Program, SchemaError> {
    let root = value
        .as_object()
        .ok_or_else(|| SchemaError::new("<root>", SchemaProblem::WrongType { expected: "an object" }))?;

    let title = require_str(root, "", "title")?;
    let summary = require_str(root, "", "summary")?;

    let mut weeks = Vec::new();
    let mut previous_week = None;
    for (i, week_value) in require_array(root, "", "weeks")?.iter().enumerate() {
        let path = format!("weeks[{i}]");
        let week = validate_week(week_value, &path)?;
        check_ascending(previous_week, week.week, &join(&path, "week"))?;
        previous_week = Some(week.week);
        weeks.push(week);
    }

    Ok(Program {
        title,
        summary,
        weeks,
    })
}

/// Parse JSON text and validate it. Used for hand-edited programs.
pub fn parse_program_json(text: &str) -> Result<Program, ProgramJsonError> {
    let value: Value = serde_json::from_str(text)?;
    Ok(validate_program(&value)?)
}

fn validate_week(value: &Value, path: &str) -> Result<WeekPlan, SchemaError> {
    let obj = require_object(value, path)?;
    let week = require_positive(obj, path, "week")?;

    let mut days = Vec::new();
    let mut previous_day = None;
    for (i, day_value) in require_array(obj, path, "days")?.iter().enumerate() {
        let day_path = format!("{path}.days[{i}]");
        let day = validate_day(day_value, &day_path)?;
        check_ascending(previous_day, day.day, &join(&day_path, "day"))?;
        previous_day = Some(day.day);
        days.push(day);
    }

    Ok(WeekPlan { week, days })
}

fn validate_day(value: &Value, path: &str) -> Result<DayPlan, SchemaError> {
    let obj = require_object(value, path)?;
    let day = require_positive(obj, path, "day")?;

    let exercises = require_array(obj, path, "exercises")?
        .iter()
        .enumerate()
        .map(|(i, v)| validate_exercise(v, &format!("{path}.exercises[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DayPlan { day, exercises })
}

fn validate_exercise(value: &Value, path: &str) -> Result<ExercisePrescription, SchemaError> {
    let obj = require_object(value, path)?;

    let name = require_str(obj, path, "name")?;
    let sets = require_positive(obj, path, "sets")?;
    let reps = require_str(obj, path, "reps")?;

    let rir = match obj.get("rir") {
        None => Some(DEFAULT_RIR),
        Some(Value::Null) => None,
        Some(v) => Some(
            v.as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| {
                    SchemaError::new(
                        join(path, "rir"),
                        SchemaProblem::WrongType {
                            expected: "an integer or null",
                        },
                    )
                })?,
        ),
    };

    Ok(ExercisePrescription {
        name,
        sets,
        reps,
        rir,
        muscle_targeted: optional_str(obj, path, "muscle_targeted")?,
        exercise_example: optional_str(obj, path, "exercise_example")?,
    })
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

fn require_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, SchemaError> {
    value
        .as_object()
        .ok_or_else(|| SchemaError::new(path, SchemaProblem::WrongType { expected: "an object" }))
}

fn require_field<'a>(
    obj: &'a Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<&'a Value, SchemaError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(SchemaError::new(join(path, key), SchemaProblem::Missing)),
        Some(v) => Ok(v),
    }
}

fn require_str(obj: &Map<String, Value>, path: &str, key: &str) -> Result<String, SchemaError> {
    require_field(obj, path, key)?
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| SchemaError::new(join(path, key), SchemaProblem::WrongType { expected: "a string" }))
}

fn optional_str(
    obj: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<Option<String>, SchemaError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaError::new(
            join(path, key),
            SchemaProblem::WrongType {
                expected: "a string or null",
            },
        )),
    }
}

fn require_array<'a>(
    obj: &'a Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<&'a Vec<Value>, SchemaError> {
    require_field(obj, path, key)?
        .as_array()
        .ok_or_else(|| SchemaError::new(join(path, key), SchemaProblem::WrongType { expected: "an array" }))
}

fn require_positive(obj: &Map<String, Value>, path: &str, key: &str) -> Result<u32, SchemaError> {
    let value = require_field(obj, path, key)?;
    let field = join(path, key);

    if let Some(n) = value.as_u64() {
        return match u32::try_from(n) {
            Ok(0) => Err(SchemaError::new(field, SchemaProblem::NotPositive)),
            Ok(n) => Ok(n),
            Err(_) => Err(SchemaError::new(
                field,
                SchemaProblem::WrongType {
                    expected: "a 32-bit integer",
                },
            )),
        };
    }
    if value.as_i64().is_some() {
        return Err(SchemaError::new(field, SchemaProblem::NotPositive));
    }
    Err(SchemaError::new(
        field,
        SchemaProblem::WrongType {
            expected: "an integer",
        },
    ))
}

fn check_ascending(previous: Option<u32>, current: u32, field: &str) -> Result<(), SchemaError> {
    match previous {
        Some(previous) if current <= previous => Err(SchemaError::new(
            field,
            SchemaProblem::NotAscending { previous },
        )),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "title": "Strength & Hypertrophy",
            "summary": "Full-body, three days a week.",
            "weeks": [
                {
                    "week": 1,
                    "days": [
                        {
                            "day": 1,
                            "exercises": [
                                { "name": "Leg Press", "sets": 3, "reps": "10-12", "rir": 3,
                                  "muscle_targeted": "quads",
                                  "exercise_example": "https://example.com/legpress" },
                                { "name": "Pec Fly Machine", "sets": 2, "reps": "8-12" }
                            ]
                        },
                        {
                            "day": 2,
                            "exercises": [
                                { "name": "Lat Pulldown", "sets": 4, "reps": "8-10", "rir": null }
                            ]
                        }
                    ]
                }
            ]
        })
    }

    fn remove(value: &mut Value, pointer: &str, key: &str) {
        value
            .pointer_mut(pointer)
            .and_then(Value::as_object_mut)
            .expect("pointer should address an object")
            .remove(key);
    }

    #[test]
    fn valid_program_parses() {
        let program = validate_program(&sample()).expect("sample should validate");
        assert_eq!(program.title, "Strength & Hypertrophy");
        assert_eq!(program.weeks.len(), 1);
        assert_eq!(program.weeks[0].days.len(), 2);

        let day1 = &program.weeks[0].days[0];
        assert_eq!(day1.prescribed_sets(), 5);
        assert_eq!(day1.exercises[0].rir, Some(3));
        assert_eq!(day1.exercises[0].muscle_targeted.as_deref(), Some("quads"));
    }

    #[test]
    fn rir_defaults_and_null() {
        let program = validate_program(&sample()).unwrap();
        assert_eq!(program.weeks[0].days[0].exercises[1].rir, Some(DEFAULT_RIR));
        assert_eq!(program.weeks[0].days[1].exercises[0].rir, None);
    }

    #[test]
    fn roundtrip_validate_serialize_validate() {
        let first = validate_program(&sample()).unwrap();
        let serialized = first.to_json().unwrap();
        let second = validate_program(&serialized).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_required_fields_are_named() {
        let cases = [
            ("", "title", "title"),
            ("", "summary", "summary"),
            ("", "weeks", "weeks"),
            ("/weeks/0", "week", "weeks[0].week"),
            ("/weeks/0", "days", "weeks[0].days"),
            ("/weeks/0/days/1", "day", "weeks[0].days[1].day"),
            ("/weeks/0/days/1", "exercises", "weeks[0].days[1].exercises"),
            ("/weeks/0/days/0/exercises/1", "name", "weeks[0].days[0].exercises[1].name"),
            ("/weeks/0/days/0/exercises/1", "sets", "weeks[0].days[0].exercises[1].sets"),
            ("/weeks/0/days/0/exercises/1", "reps", "weeks[0].days[0].exercises[1].reps"),
        ];

        for (pointer, key, expected_field) in cases {
            let mut doc = sample();
            remove(&mut doc, pointer, key);
            let err = validate_program(&doc).unwrap_err();
            assert_eq!(err.field, expected_field, "removing {pointer}/{key}");
            assert_eq!(err.problem, SchemaProblem::Missing);
        }
    }

    #[test]
    fn null_required_field_counts_as_missing() {
        let mut doc = sample();
        doc["title"] = Value::Null;
        let err = validate_program(&doc).unwrap_err();
        assert_eq!(err.field, "title");
        assert_eq!(err.problem, SchemaProblem::Missing);
    }

    #[test]
    fn wrong_types_rejected() {
        let mut doc = sample();
        doc["weeks"][0]["days"][0]["exercises"][0]["sets"] = json!("three");
        let err = validate_program(&doc).unwrap_err();
        assert_eq!(err.field, "weeks[0].days[0].exercises[0].sets");
        assert!(matches!(err.problem, SchemaProblem::WrongType { .. }));

        let mut doc = sample();
        doc["weeks"][0]["days"][0]["exercises"][0]["reps"] = json!(10);
        let err = validate_program(&doc).unwrap_err();
        assert_eq!(err.field, "weeks[0].days[0].exercises[0].reps");

        let mut doc = sample();
        doc["weeks"] = json!({ "week": 1 });
        let err = validate_program(&doc).unwrap_err();
        assert_eq!(err.field, "weeks");
    }

    #[test]
    fn fractional_sets_rejected() {
        let mut doc = sample();
        doc["weeks"][0]["days"][0]["exercises"][0]["sets"] = json!(2.5);
        let err = validate_program(&doc).unwrap_err();
        assert!(matches!(err.problem, SchemaProblem::WrongType { .. }));
    }

    #[test]
    fn zero_and_negative_sets_rejected() {
        for bad in [json!(0), json!(-1)] {
            let mut doc = sample();
            doc["weeks"][0]["days"][0]["exercises"][0]["sets"] = bad;
            let err = validate_program(&doc).unwrap_err();
            assert_eq!(err.problem, SchemaProblem::NotPositive);
        }
    }

    #[test]
    fn duplicate_day_numbers_rejected() {
        let mut doc = sample();
        doc["weeks"][0]["days"][1]["day"] = json!(1);
        let err = validate_program(&doc).unwrap_err();
        assert_eq!(err.field, "weeks[0].days[1].day");
        assert_eq!(err.problem, SchemaProblem::NotAscending { previous: 1 });
    }

    #[test]
    fn descending_week_numbers_rejected() {
        let mut doc = sample();
        let second_week = json!({ "week": 1, "days": [] });
        doc["weeks"][0]["week"] = json!(2);
        doc["weeks"].as_array_mut().unwrap().push(second_week);
        let err = validate_program(&doc).unwrap_err();
        assert_eq!(err.field, "weeks[1].week");
    }

    #[test]
    fn bad_rir_rejected() {
        let mut doc = sample();
        doc["weeks"][0]["days"][0]["exercises"][0]["rir"] = json!("two");
        let err = validate_program(&doc).unwrap_err();
        assert_eq!(err.field, "weeks[0].days[0].exercises[0].rir");
    }

    #[test]
    fn non_object_root_rejected() {
        let err = validate_program(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.field, "<root>");
    }

    #[test]
    fn unknown_keys_ignored() {
        let mut doc = sample();
        doc["weeks"][0]["days"][0]["muscles_targeted"] = json!(["quads", "pecs"]);
        doc["notes"] = json!("extra");
        assert!(validate_program(&doc).is_ok());
    }

    #[test]
    fn error_message_names_field() {
        let mut doc = sample();
        remove(&mut doc, "", "summary");
        let msg = validate_program(&doc).unwrap_err().to_string();
        assert_eq!(msg, "invalid program: `summary` is missing");
    }

    #[test]
    fn parse_program_json_distinguishes_errors() {
        let err = parse_program_json("{not json").unwrap_err();
        assert!(matches!(err, ProgramJsonError::Json(_)));

        let err = parse_program_json(r#"{"title": "x"}"#).unwrap_err();
        assert!(matches!(err, ProgramJsonError::Schema(ref e) if e.field == "summary"));

        let text = sample().to_string();
        assert!(parse_program_json(&text).is_ok());
    }

    #[test]
    fn lookup_helpers() {
        let program = validate_program(&sample()).unwrap();
        assert!(program.day(1, 2).is_some());
        assert!(program.day(1, 3).is_none());
        assert!(program.day(2, 1).is_none());
        assert_eq!(program.total_days(), 2);
        let day = program.day(1, 1).unwrap();
        assert!(day.exercise("Leg Press").is_some());
        assert!(day.exercise("leg press").is_none());
    }
}
