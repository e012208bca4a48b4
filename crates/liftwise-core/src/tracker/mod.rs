//! Day-completion bookkeeping.
//!
//! A day moves through `not_started -> in_progress -> completable ->
//! finished`. The first three states are derived from the count of logged
//! sets against the prescribed total; `finished` is recorded explicitly.

pub mod service;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::program::Program;

pub use service::{
    FinishOutcome, LoggedSet, NewSet, day_progress, finish_day, log_set, progress_for_program,
};

// ---------------------------------------------------------------------------
// DayState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    NotStarted,
    InProgress,
    Completable,
    Finished,
}

impl fmt::Display for DayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DayState::NotStarted => "not_started",
            DayState::InProgress => "in_progress",
            DayState::Completable => "completable",
            DayState::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// Error returned when parsing an invalid [`DayState`] string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid day state: {0:?}")]
pub struct DayStateParseError(pub String);

impl FromStr for DayState {
    type Err = DayStateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(DayState::NotStarted),
            "in_progress" => Ok(DayState::InProgress),
            "completable" => Ok(DayState::Completable),
            "finished" => Ok(DayState::Finished),
            other => Err(DayStateParseError(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// DayProgress
// ---------------------------------------------------------------------------

/// Logged-versus-prescribed counts for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayProgress {
    pub prescribed: u32,
    pub logged: u64,
    pub finished: bool,
}

impl DayProgress {
    pub fn state(&self) -> DayState {
        if self.finished {
            DayState::Finished
        } else if self.logged >= u64::from(self.prescribed) {
            DayState::Completable
        } else if self.logged == 0 {
            DayState::NotStarted
        } else {
            DayState::InProgress
        }
    }

    /// True once at least the prescribed number of sets has been logged.
    pub fn can_finish(&self) -> bool {
        self.logged >= u64::from(self.prescribed)
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Where to go after finishing a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextTarget {
    Day { week: u32, day: u32 },
    ProgramComplete,
}

/// Total prescribed sets for a day, or `None` if the day does not exist.
pub fn prescribed_sets(program: &Program, week: u32, day: u32) -> Option<u32> {
    program.day(week, day).map(|d| d.prescribed_sets())
}

/// The day after `(week, day)`.
///
/// Weeks and days are kept in ascending order, so this is the first day in
/// the program that sorts after `(week, day)`. Gaps in the numbering and
/// weeks without days are skipped; past the last day the program is
/// complete.
pub fn next_target(program: &Program, week: u32, day: u32) -> NextTarget {
    program
        .weeks
        .iter()
        .flat_map(|w| w.days.iter().map(move |d| (w.week, d.day)))
        .find(|&candidate| candidate > (week, day))
        .map_or(NextTarget::ProgramComplete, |(week, day)| NextTarget::Day {
            week,
            day,
        })
}

/// Estimated one-rep max using the Epley formula.
pub fn estimated_one_rep_max(weight: f64, reps: u32) -> f64 {
    if reps == 0 {
        return 0.0;
    }
    weight * (1.0 + f64::from(reps) / 30.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{DayPlan, ExercisePrescription, WeekPlan};

    fn exercise(name: &str, sets: u32) -> ExercisePrescription {
        ExercisePrescription {
            name: name.into(),
            sets,
            reps: "8-10".into(),
            rir: Some(2),
            muscle_targeted: None,
            exercise_example: None,
        }
    }

    fn program(weeks: u32, days_per_week: u32) -> Program {
        Program {
            title: "Test".into(),
            summary: "Test program".into(),
            weeks: (1..=weeks)
                .map(|week| WeekPlan {
                    week,
                    days: (1..=days_per_week)
                        .map(|day| DayPlan {
                            day,
                            exercises: vec![exercise("Squat", 3), exercise("Row", 2)],
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    fn progress(logged: u64) -> DayProgress {
        DayProgress {
            prescribed: 5,
            logged,
            finished: false,
        }
    }

    #[test]
    fn can_finish_threshold() {
        assert!(!progress(4).can_finish());
        assert!(progress(5).can_finish());
        assert!(progress(9).can_finish());
    }

    #[test]
    fn state_transitions() {
        assert_eq!(progress(0).state(), DayState::NotStarted);
        assert_eq!(progress(3).state(), DayState::InProgress);
        assert_eq!(progress(5).state(), DayState::Completable);
        let done = DayProgress {
            finished: true,
            ..progress(5)
        };
        assert_eq!(done.state(), DayState::Finished);
    }

    #[test]
    fn empty_day_is_immediately_completable() {
        let p = DayProgress {
            prescribed: 0,
            logged: 0,
            finished: false,
        };
        assert!(p.can_finish());
        assert_eq!(p.state(), DayState::Completable);
    }

    #[test]
    fn day_state_parse_error_message() {
        let err = "done".parse::<DayState>().unwrap_err();
        assert_eq!(err.to_string(), "invalid day state: \"done\"");
    }

    #[test]
    fn day_state_display_roundtrip() {
        for state in [
            DayState::NotStarted,
            DayState::InProgress,
            DayState::Completable,
            DayState::Finished,
        ] {
            assert_eq!(state.to_string().parse::<DayState>().unwrap(), state);
        }
        assert!("done".parse::<DayState>().is_err());
    }

    #[test]
    fn prescribed_sets_sums_exercises() {
        let p = program(2, 3);
        assert_eq!(prescribed_sets(&p, 1, 1), Some(5));
        assert_eq!(prescribed_sets(&p, 1, 4), None);
        assert_eq!(prescribed_sets(&p, 3, 1), None);
    }

    #[test]
    fn next_target_within_week() {
        let p = program(2, 3);
        assert_eq!(next_target(&p, 1, 1), NextTarget::Day { week: 1, day: 2 });
    }

    #[test]
    fn next_target_rolls_to_next_week() {
        let p = program(2, 3);
        assert_eq!(next_target(&p, 1, 3), NextTarget::Day { week: 2, day: 1 });
    }

    #[test]
    fn next_target_after_last_day_completes_program() {
        let p = program(2, 3);
        assert_eq!(next_target(&p, 2, 3), NextTarget::ProgramComplete);
    }

    #[test]
    fn next_target_unknown_week_rolls_forward() {
        let p = program(3, 2);
        assert_eq!(next_target(&p, 9, 1), NextTarget::ProgramComplete);
        let p = program(1, 2);
        assert_eq!(next_target(&p, 1, 2), NextTarget::ProgramComplete);
    }

    #[test]
    fn next_target_skips_gaps_in_numbering() {
        let mut p = program(2, 2);
        p.weeks[0].days[1].day = 3;
        p.weeks[1].week = 4;
        assert_eq!(next_target(&p, 1, 1), NextTarget::Day { week: 1, day: 3 });
        assert_eq!(next_target(&p, 1, 3), NextTarget::Day { week: 4, day: 1 });
    }

    #[test]
    fn next_target_skips_weeks_without_days() {
        let mut p = program(3, 2);
        p.weeks[1].days.clear();
        assert_eq!(next_target(&p, 1, 2), NextTarget::Day { week: 3, day: 1 });
    }

    #[test]
    fn next_target_at_largest_week_number_completes() {
        let mut p = program(1, 2);
        p.weeks[0].week = u32::MAX;
        assert_eq!(next_target(&p, u32::MAX, 1), NextTarget::Day { week: u32::MAX, day: 2 });
        assert_eq!(next_target(&p, u32::MAX, 2), NextTarget::ProgramComplete);
        assert_eq!(next_target(&p, u32::MAX, u32::MAX), NextTarget::ProgramComplete);
    }

    #[test]
    fn epley_estimate() {
        assert_eq!(estimated_one_rep_max(100.0, 0), 0.0);
        assert!((estimated_one_rep_max(100.0, 1) - 103.333).abs() < 0.01);
        assert!((estimated_one_rep_max(100.0, 10) - 133.333).abs() < 0.01);
    }
}
