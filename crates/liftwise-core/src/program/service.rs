//! Persisting and loading programs.
//!
//! A program is validated before every write and again on every read, so a
//! stored routine that no longer matches the schema is reported rather than
//! rendered.

use anyhow::Context;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use liftwise_db::models::Routine;
use liftwise_db::queries::{file_vectors, routines};

use super::assemble::ProgramAssembler;
use super::schema::{Program, parse_program_json, validate_program};
use crate::error::ServiceError;
use crate::llm::CompletionClient;
use crate::wizard;

/// Store a validated program as a new routine.
pub async fn save_generated_program(
    pool: &PgPool,
    user_id: Uuid,
    program: &Program,
) -> Result<Routine, ServiceError> {
    let doc = program.to_json().context("failed to serialize program")?;
    let routine = routines::insert_routine(pool, user_id, &program.title, &doc).await?;
    info!(routine_id = %routine.id, user_id = %user_id, "saved program");
    Ok(routine)
}

/// Replace a routine's program with hand-edited JSON.
///
/// Nothing is written unless the text parses and validates.
pub async fn replace_program(
    pool: &PgPool,
    user_id: Uuid,
    routine_id: Uuid,
    json_text: &str,
) -> Result<Routine, ServiceError> {
    let program = parse_program_json(json_text)?;
    let doc = program.to_json().context("failed to serialize program")?;

    let routine = routines::replace_routine(pool, routine_id, user_id, &program.title, &doc)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("routine {routine_id}")))?;

    info!(routine_id = %routine_id, "replaced program");
    Ok(routine)
}

/// Load a routine owned by `user_id` and revalidate its program.
pub async fn load_program(
    pool: &PgPool,
    user_id: Uuid,
    routine_id: Uuid,
) -> Result<(Routine, Program), ServiceError> {
    let routine = routines::get_routine_for_user(pool, routine_id, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("routine {routine_id}")))?;
    let program = validate_program(&routine.routine_json).map_err(ServiceError::CorruptProgram)?;
    Ok((routine, program))
}

/// Generate a program from the user's stored answers and latest upload,
/// then persist it.
pub async fn generate_for_user(
    pool: &PgPool,
    client: &dyn CompletionClient,
    user_id: Uuid,
) -> Result<Routine, ServiceError> {
    let questionnaire = wizard::load_answers(pool, user_id).await?.questionnaire()?;
    let upload = file_vectors::latest_file_text(pool, user_id).await?;

    let program = ProgramAssembler::new(client)
        .generate(&questionnaire, upload.as_deref())
        .await?;

    save_generated_program(pool, user_id, &program).await
}
