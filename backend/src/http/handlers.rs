//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::auth::CurrentUser;
use super::dto::{
    Account, ChoiceChange, ChoiceRequest, Course, ExtraCourseInfo, HealthResponse, LoadBatch,
    LoadReport, PlanOverview, Profile, Program, RegisterAccountRequest, RegisterAccountResponse,
    Schedule, Scheduler, SelectProgramRequest, SemesterCourses,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::SchedulerId;
use crate::db::repository::{ErrorContext, RepositoryError};
use crate::db::services as db_services;
use crate::models::SEMESTERS;
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn parse_scheduler_id(raw: &str) -> Result<SchedulerId, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid scheduler id: {}", raw)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and database is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Accounts
// =============================================================================

/// POST /v1/accounts
///
/// Register a student. A taken username answers `{"registered": false}`.
pub async fn register_account(
    State(state): State<AppState>,
    Json(request): Json<RegisterAccountRequest>,
) -> Result<(StatusCode, Json<RegisterAccountResponse>), AppError> {
    let registered = services::register_account(
        state.repository.as_ref(),
        &request.username,
        &request.email,
        &request.password,
    )
    .await?;

    let status = if registered {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(RegisterAccountResponse { registered })))
}

/// GET /v1/account
pub async fn get_account(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
) -> HandlerResult<Account> {
    let account = services::get_account(state.repository.as_ref(), &username).await?;
    Ok(Json(account))
}

/// PUT /v1/account/program
pub async fn select_program(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    Json(request): Json<SelectProgramRequest>,
) -> HandlerResult<Account> {
    let account =
        services::select_program(state.repository.as_ref(), &username, &request.program_code)
            .await?;
    Ok(Json(account))
}

// =============================================================================
// Choices
// =============================================================================

/// POST /v1/account/choice
pub async fn add_choice(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    Json(request): Json<ChoiceRequest>,
) -> HandlerResult<ChoiceChange> {
    let scheduler_id = parse_scheduler_id(&request.scheduler_id)?;
    let change = services::add_choice(state.repository.as_ref(), &username, scheduler_id).await?;
    Ok(Json(change))
}

/// DELETE /v1/account/choice
pub async fn remove_choice(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    Json(request): Json<ChoiceRequest>,
) -> HandlerResult<ChoiceChange> {
    let scheduler_id = parse_scheduler_id(&request.scheduler_id)?;
    let change =
        services::remove_choice(state.repository.as_ref(), &username, scheduler_id).await?;
    Ok(Json(change))
}

/// GET /v1/account/choices
///
/// Chosen courses per semester and period with credit totals.
pub async fn get_choices(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
) -> HandlerResult<PlanOverview> {
    let overview =
        services::summarize_choices(state.repository.as_ref(), &username, &state.requirements)
            .await?;
    Ok(Json(overview))
}

// =============================================================================
// Catalog
// =============================================================================

/// GET /v1/programs
pub async fn list_programs(State(state): State<AppState>) -> HandlerResult<Vec<Program>> {
    let programs = db_services::list_programs(state.repository.as_ref()).await?;
    Ok(Json(programs))
}

/// GET /v1/programs/{code}/profiles
pub async fn list_program_profiles(
    State(state): State<AppState>,
    Path(program_code): Path<String>,
) -> HandlerResult<Vec<Profile>> {
    let profiles = db_services::list_program_profiles(
        state.repository.as_ref(),
        &program_code.to_uppercase(),
    )
    .await?;
    Ok(Json(profiles))
}

/// GET /v1/schedules/{schedule_id}
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
) -> HandlerResult<Schedule> {
    let schedule = db_services::get_schedule(state.repository.as_ref(), &schedule_id).await?;
    Ok(Json(schedule))
}

/// GET /v1/courses/{course_code}
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_code): Path<String>,
) -> HandlerResult<Course> {
    let course = db_services::get_course(state.repository.as_ref(), &course_code).await?;
    Ok(Json(course))
}

/// GET /v1/courses/{course_code}/extra-info
///
/// Examinations, examiner, campus and main fields from the course-info service.
pub async fn get_extra_course_info(
    State(state): State<AppState>,
    Path(course_code): Path<String>,
) -> HandlerResult<ExtraCourseInfo> {
    let info = services::get_extra_course_info(
        state.repository.as_ref(),
        state.course_info.as_ref(),
        &course_code,
    )
    .await?;
    Ok(Json(info))
}

/// GET /v1/schedulers/{scheduler_id}
pub async fn get_scheduler(
    State(state): State<AppState>,
    Path(scheduler_id): Path<String>,
) -> HandlerResult<Scheduler> {
    let scheduler_id = parse_scheduler_id(&scheduler_id)?;
    let scheduler = db_services::get_scheduler(state.repository.as_ref(), scheduler_id).await?;
    Ok(Json(scheduler))
}

/// GET /v1/profiles/{profile}/semesters/{semester}/courses
///
/// Courses of the account's program offered to `profile` in `semester`.
pub async fn get_term_courses(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    Path((profile_code, semester)): Path<(String, i16)>,
) -> HandlerResult<SemesterCourses> {
    if !SEMESTERS.contains(&semester) {
        return Err(AppError::BadRequest(format!(
            "Semester must be between {} and {}",
            SEMESTERS.start(),
            SEMESTERS.end()
        )));
    }

    let account = services::get_account(state.repository.as_ref(), &username).await?;
    let program_code = account.program_code.ok_or_else(|| {
        RepositoryError::validation_with_context(
            format!("Account {} has not selected a program", username),
            ErrorContext::new("get_term_courses").with_entity("account"),
        )
    })?;

    let courses = db_services::list_term_courses(
        state.repository.as_ref(),
        &program_code,
        &profile_code,
        semester,
    )
    .await?;
    Ok(Json(courses))
}

/// POST /v1/catalog/load
///
/// Bulk load programs, profiles and course rows.
pub async fn load_catalog(
    State(state): State<AppState>,
    Json(batch): Json<LoadBatch>,
) -> HandlerResult<LoadReport> {
    let report = services::load_batch(state.repository.as_ref(), &batch).await?;
    Ok(Json(report))
}
