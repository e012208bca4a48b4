use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Form, Router};
use serde::Deserialize;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use liftwise_core::ServiceError;
use liftwise_core::llm::{CompletionClient, EmbeddingClient};
use liftwise_core::program::service::{generate_for_user, load_program, replace_program};
use liftwise_core::session::{
    SessionKey, session_from_cookie_header, session_set_cookie, sign_session, verify_session,
};
use liftwise_core::tracker::{self, NewSet, NextTarget};
use liftwise_core::upload::store_upload;
use liftwise_core::wizard::{WizardStep, save_step};
use liftwise_db::queries::{completed_days, progress_logs, routines};

use crate::html;

/// Request bodies (mostly uploads) are capped at this size.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub completions: Arc<dyn CompletionClient>,
    pub embeddings: Arc<dyn EmbeddingClient>,
    pub session_key: Arc<SessionKey>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        completions: Arc<dyn CompletionClient>,
        embeddings: Arc<dyn EmbeddingClient>,
        session_key: SessionKey,
    ) -> Self {
        Self {
            pool,
            completions,
            embeddings,
            session_key: Arc::new(session_key),
        }
    }
}

/// The anonymous user behind the current request's session cookie.
#[derive(Debug, Clone, Copy)]
pub struct SessionUser(pub Uuid);

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        error!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let err = match err {
            ServiceError::Storage(e) => return Self::internal(e),
            other => other,
        };
        let status = match &err {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidProgram(_) | ServiceError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Generation(_) | ServiceError::Embedding(_) => StatusCode::BAD_GATEWAY,
            ServiceError::CorruptProgram(_) | ServiceError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!(error = %err, "request failed");
        } else {
            warn!(error = %err, status = status.as_u16(), "request rejected");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Html(html::alert(&self.message))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/goals", post(handle_goals))
        .route("/equipment", post(handle_equipment))
        .route("/schedule", post(handle_schedule))
        .route("/routine/{id}", get(routine_dashboard))
        .route("/routine/{id}/update", post(update_program))
        .route("/routine/{id}/week/{week}/day/{day}", get(routine_day))
        .route("/routine/{id}/week/{week}/day/{day}/status", get(day_status))
        .route("/routine/{id}/week/{week}/day/{day}/log", post(log_set))
        .route("/routine/{id}/week/{week}/day/{day}/finish", post(finish_day))
        .layer(middleware::from_fn_with_state(state.clone(), session_layer))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("liftwise listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("liftwise shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Session middleware
// ---------------------------------------------------------------------------

/// Resolve the session user from the signed cookie, issuing a fresh
/// identity when the cookie is missing or fails verification.
async fn session_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let existing = req
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(session_from_cookie_header)
        .and_then(|value| match verify_session(&state.session_key, value) {
            Ok(user_id) => Some(user_id),
            Err(e) => {
                warn!(error = %e, "discarding invalid session cookie");
                None
            }
        });

    let (user_id, issued) = match existing {
        Some(user_id) => (user_id, false),
        None => (Uuid::new_v4(), true),
    };
    req.extensions_mut().insert(SessionUser(user_id));

    let mut response = next.run(req).await;
    if issued {
        let cookie = session_set_cookie(&sign_session(&state.session_key, user_id));
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "could not encode session cookie"),
        }
    }
    response
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn hx_redirect() -> HeaderName {
    HeaderName::from_static("hx-redirect")
}

/// Redirect that works for both plain form posts and htmx requests.
///
/// htmx follows a 302 inside its XHR and swaps the result in place, so
/// htmx callers get a 200 with `HX-Redirect` instead.
fn redirect(headers: &HeaderMap, url: &str) -> Response {
    if headers.contains_key("hx-request") {
        (StatusCode::OK, [(hx_redirect(), url.to_owned())]).into_response()
    } else {
        (StatusCode::FOUND, [(header::LOCATION, url.to_owned())]).into_response()
    }
}

fn day_key(week: u32, day: u32) -> Result<(i32, i32), AppError> {
    match (i32::try_from(week), i32::try_from(day)) {
        (Ok(w), Ok(d)) => Ok((w, d)),
        _ => Err(AppError::not_found(format!("week {week} day {day} not found"))),
    }
}

// ---------------------------------------------------------------------------
// Wizard handlers
// ---------------------------------------------------------------------------

async fn healthz() -> &'static str {
    "ok"
}

async fn index(
    State(state): State<AppState>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
) -> Result<Html<String>, AppError> {
    let routines = routines::list_routines_for_user(&state.pool, user_id)
        .await
        .map_err(AppError::internal)?;
    Ok(Html(html::index_page(&routines)))
}

async fn handle_goals(
    State(state): State<AppState>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    mut multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let mut goals = None;
    let mut program_ref = None;
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "goals" => {
                goals = Some(field.text().await.map_err(|e| AppError::bad_request(e.body_text()))?);
            }
            "program_ref" => {
                program_ref =
                    Some(field.text().await.map_err(|e| AppError::bad_request(e.body_text()))?);
            }
            "import_file" => {
                let filename = field.file_name().unwrap_or("upload").to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(e.body_text()))?;
                if !bytes.is_empty() {
                    upload = Some((filename, bytes));
                }
            }
            _ => {}
        }
    }

    let goals = goals.ok_or_else(|| AppError::bad_request("goals is required"))?;

    // Reject the step before the upload is embedded and stored.
    let mut step = WizardStep::Goals {
        goals,
        program_ref,
        import_file: false,
    };
    step.validate()?;

    if let Some((filename, bytes)) = upload {
        let stored = store_upload(
            &state.pool,
            state.embeddings.as_ref(),
            user_id,
            &filename,
            &bytes,
        )
        .await?;
        if let WizardStep::Goals { import_file, .. } = &mut step {
            *import_file = stored.is_some();
        }
    }

    save_step(&state.pool, user_id, &step).await?;
    Ok(Html(html::equipment_form()))
}

#[derive(Debug, Deserialize)]
struct EquipmentForm {
    equipment: String,
}

async fn handle_equipment(
    State(state): State<AppState>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Form(form): Form<EquipmentForm>,
) -> Result<Html<String>, AppError> {
    let step = WizardStep::Equipment {
        equipment: form.equipment,
    };
    save_step(&state.pool, user_id, &step).await?;
    Ok(Html(html::schedule_form()))
}

#[derive(Debug, Deserialize)]
struct ScheduleForm {
    days_per_week: u32,
    weeks: u32,
}

async fn handle_schedule(
    State(state): State<AppState>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    headers: HeaderMap,
    Form(form): Form<ScheduleForm>,
) -> Result<Response, AppError> {
    let step = WizardStep::Schedule {
        days_per_week: form.days_per_week,
        weeks: form.weeks,
    };
    save_step(&state.pool, user_id, &step).await?;

    let routine = generate_for_user(&state.pool, state.completions.as_ref(), user_id).await?;
    Ok(redirect(&headers, &format!("/routine/{}", routine.id)))
}

// ---------------------------------------------------------------------------
// Routine handlers
// ---------------------------------------------------------------------------

async fn routine_dashboard(
    State(state): State<AppState>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let (routine, program) = load_program(&state.pool, user_id, id).await?;
    let completions = completed_days::list_completions_for_routine(&state.pool, user_id, id)
        .await
        .map_err(AppError::internal)?;
    let json = serde_json::to_string_pretty(&routine.routine_json)
        .map_err(|e| AppError::internal(e.into()))?;

    Ok(Html(html::dashboard_page(id, &program, &completions, &json)))
}

#[derive(Debug, Deserialize)]
struct UpdateForm {
    program_json: String,
}

async fn update_program(
    State(state): State<AppState>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Form(form): Form<UpdateForm>,
) -> Result<Response, AppError> {
    replace_program(&state.pool, user_id, id, &form.program_json).await?;
    Ok(redirect(&headers, &format!("/routine/{id}")))
}

async fn routine_day(
    State(state): State<AppState>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path((id, week, day)): Path<(Uuid, u32, u32)>,
) -> Result<Html<String>, AppError> {
    let (_, program) = load_program(&state.pool, user_id, id).await?;
    let day_plan = program
        .day(week, day)
        .ok_or_else(|| AppError::not_found(format!("week {week} day {day} not found")))?;
    let progress =
        tracker::progress_for_program(&state.pool, user_id, id, &program, week, day).await?;

    let (w, d) = day_key(week, day)?;
    let logs = progress_logs::list_set_logs_for_day(&state.pool, user_id, id, w, d)
        .await
        .map_err(AppError::internal)?;

    Ok(Html(html::day_page(
        id,
        &program.title,
        week,
        day_plan,
        &progress,
        &logs,
    )))
}

async fn day_status(
    State(state): State<AppState>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path((id, week, day)): Path<(Uuid, u32, u32)>,
) -> Result<Html<String>, AppError> {
    let progress = tracker::day_progress(&state.pool, user_id, id, week, day).await?;
    Ok(Html(html::finish_control(id, week, day, &progress)))
}

#[derive(Debug, Deserialize)]
struct LogSetForm {
    exercise_name: String,
    set_number: u32,
    weight: f64,
    reps: u32,
    #[serde(default)]
    notes: Option<String>,
}

async fn log_set(
    State(state): State<AppState>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path((id, week, day)): Path<(Uuid, u32, u32)>,
    Form(form): Form<LogSetForm>,
) -> Result<Response, AppError> {
    let set = NewSet {
        exercise_name: form.exercise_name,
        set_number: form.set_number,
        weight: form.weight,
        reps: form.reps,
        notes: form.notes,
    };
    let log = tracker::log_set(&state.pool, user_id, id, week, day, &set).await?;

    Ok((
        [(HeaderName::from_static("hx-trigger"), "set-logged")],
        Html(html::logged_set_row(&log)),
    )
        .into_response())
}

async fn finish_day(
    State(state): State<AppState>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
    Path((id, week, day)): Path<(Uuid, u32, u32)>,
) -> Result<Response, AppError> {
    let outcome = tracker::finish_day(&state.pool, user_id, id, week, day).await?;
    let url = match outcome.next {
        NextTarget::Day { week, day } => html::day_url(id, week, day),
        NextTarget::ProgramComplete => format!("/routine/{id}"),
    };
    Ok(([(hx_redirect(), url)], "OK").into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
