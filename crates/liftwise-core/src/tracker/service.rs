//! Logging sets and finishing days against stored routines.

use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use liftwise_db::models::{DayCompletion, SetLog};
use liftwise_db::queries::completed_days;
use liftwise_db::queries::progress_logs::{self, NewSetLog};

use super::{DayProgress, NextTarget, estimated_one_rep_max, next_target};
use crate::error::ServiceError;
use crate::program::{DayPlan, Program};
use crate::program::service::load_program;

/// A set submitted from the day view.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSet {
    pub exercise_name: String,
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
    pub notes: Option<String>,
}

impl NewSet {
    fn validate(&self, day: &DayPlan, week: u32) -> Result<(), ServiceError> {
        if day.exercise(&self.exercise_name).is_none() {
            return Err(ServiceError::invalid_input(format!(
                "{:?} is not prescribed for week {week} day {}",
                self.exercise_name, day.day
            )));
        }
        if self.set_number == 0 {
            return Err(ServiceError::invalid_input("set number must be at least 1"));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ServiceError::invalid_input(
                "weight must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// A stored set plus how it compares with the user's history.
#[derive(Debug, Clone)]
pub struct LoggedSet {
    pub log: SetLog,
    pub estimated_one_rep_max: f64,
    /// True when the estimate beats every earlier set of this exercise.
    pub personal_record: bool,
}

/// Result of a finish request.
#[derive(Debug, Clone)]
pub struct FinishOutcome {
    pub completion: DayCompletion,
    /// False when the day had already been finished.
    pub newly_recorded: bool,
    pub next: NextTarget,
}

fn find_day(program: &Program, week: u32, day: u32) -> Result<&DayPlan, ServiceError> {
    program
        .day(week, day)
        .ok_or_else(|| ServiceError::not_found(format!("week {week} day {day}")))
}

fn db_int(value: u32, what: &str) -> Result<i32, ServiceError> {
    i32::try_from(value).map_err(|_| ServiceError::invalid_input(format!("{what} is out of range")))
}

/// Append a set record for a prescribed exercise.
///
/// The set is a personal record when its estimated one-rep max is higher
/// than any earlier set of the same exercise in any of the user's routines.
/// The first set of an exercise with at least one rep always is.
pub async fn log_set(
    pool: &PgPool,
    user_id: Uuid,
    routine_id: Uuid,
    week: u32,
    day: u32,
    set: &NewSet,
) -> Result<LoggedSet, ServiceError> {
    let (_, program) = load_program(pool, user_id, routine_id).await?;
    let day_plan = find_day(&program, week, day)?;
    set.validate(day_plan, week)?;

    let new = NewSetLog {
        user_id,
        routine_id,
        week: db_int(week, "week")?,
        day: db_int(day, "day")?,
        exercise_name: &set.exercise_name,
        set_number: db_int(set.set_number, "set number")?,
        weight: set.weight,
        reps: db_int(set.reps, "reps")?,
        notes: set.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()),
    };
    let previous_best =
        progress_logs::best_estimated_one_rep_max(pool, user_id, &set.exercise_name).await?;
    let log = progress_logs::insert_set_log(pool, &new).await?;

    let estimate = estimated_one_rep_max(set.weight, set.reps);
    let personal_record = estimate > 0.0 && previous_best.is_none_or(|best| estimate > best);

    debug!(
        routine_id = %routine_id,
        week,
        day,
        exercise = %set.exercise_name,
        set_number = set.set_number,
        personal_record,
        "logged set"
    );
    if personal_record {
        info!(exercise = %set.exercise_name, estimate, "new personal record");
    }
    Ok(LoggedSet {
        log,
        estimated_one_rep_max: estimate,
        personal_record,
    })
}

/// Progress for one day of an already loaded program.
pub async fn progress_for_program(
    pool: &PgPool,
    user_id: Uuid,
    routine_id: Uuid,
    program: &Program,
    week: u32,
    day: u32,
) -> Result<DayProgress, ServiceError> {
    let prescribed = find_day(program, week, day)?.prescribed_sets();
    let (w, d) = (db_int(week, "week")?, db_int(day, "day")?);

    let logged = progress_logs::count_logged_sets(pool, user_id, routine_id, w, d).await?;
    let finished = completed_days::get_completion(pool, user_id, routine_id, w, d)
        .await?
        .is_some();

    Ok(DayProgress {
        prescribed,
        logged: u64::try_from(logged).unwrap_or(0),
        finished,
    })
}

/// Logged-versus-prescribed counts for one day of a routine.
pub async fn day_progress(
    pool: &PgPool,
    user_id: Uuid,
    routine_id: Uuid,
    week: u32,
    day: u32,
) -> Result<DayProgress, ServiceError> {
    let (_, program) = load_program(pool, user_id, routine_id).await?;
    progress_for_program(pool, user_id, routine_id, &program, week, day).await
}

/// Record a day as finished and work out where to go next.
///
/// Finishing an already-finished day returns the existing record. A day
/// that has fewer logged sets than prescribed is refused.
pub async fn finish_day(
    pool: &PgPool,
    user_id: Uuid,
    routine_id: Uuid,
    week: u32,
    day: u32,
) -> Result<FinishOutcome, ServiceError> {
    let (_, program) = load_program(pool, user_id, routine_id).await?;
    let progress = progress_for_program(pool, user_id, routine_id, &program, week, day).await?;
    let next = next_target(&program, week, day);
    let (w, d) = (db_int(week, "week")?, db_int(day, "day")?);

    if !progress.finished && !progress.can_finish() {
        return Err(ServiceError::Conflict(format!(
            "week {week} day {day} has {} of {} sets logged",
            progress.logged, progress.prescribed
        )));
    }

    let (completion, newly_recorded) =
        match completed_days::insert_completion(pool, user_id, routine_id, w, d).await? {
            Some(row) => (row, true),
            None => {
                // Already finished, possibly by a concurrent request.
                let existing = completed_days::get_completion(pool, user_id, routine_id, w, d)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::Storage(anyhow::anyhow!(
                            "completion for week {week} day {day} vanished after conflict"
                        ))
                    })?;
                (existing, false)
            }
        };

    if newly_recorded {
        info!(routine_id = %routine_id, week, day, "finished day");
    }
    Ok(FinishOutcome {
        completion,
        newly_recorded,
        next,
    })
}
