//! Training program documents: schema, prompt, generation, persistence.

pub mod assemble;
pub mod prompt;
pub mod schema;
pub mod service;

pub use assemble::{GenerationError, ProgramAssembler, assemble_program};
pub use prompt::{GenerationPrompt, Questionnaire, build_prompt};
pub use schema::{
    DayPlan, ExercisePrescription, Program, ProgramJsonError, SchemaError, SchemaProblem,
    WeekPlan, parse_program_json, validate_program,
};
