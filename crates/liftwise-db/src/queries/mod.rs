//! Query functions, one module per table.

pub mod completed_days;
pub mod file_vectors;
pub mod progress_logs;
pub mod routines;
pub mod wizard_answers;
