//! High-level catalog query layer.
//!
//! Repository-agnostic read operations used by the HTTP handlers and the
//! loader CLI. They add the user-facing not-found messages on top of the
//! repository traits.
//!
//! # Usage
//!
//! ```no_run
//! use master_planner::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let programs = services::list_programs(&repo).await?;
//!     println!("Found {} programs", programs.len());
//!     Ok(())
//! }
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::api::SchedulerId;
use crate::models::{Course, Profile, Program, Schedule, Scheduler, SchedulerFilter};

/// Courses offered in one semester, split by study period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemesterCourses {
    pub period_1: Vec<Scheduler>,
    pub period_2: Vec<Scheduler>,
}

/// Replace the message of a NotFound error with the user-facing wording.
fn describe_not_found(err: RepositoryError, table: &str, id: &str) -> RepositoryError {
    match err {
        RepositoryError::NotFound { context, .. } => RepositoryError::not_found_with_context(
            format!("Could not find {} object: {} in {} table", table, id, table),
            context,
        ),
        other => other,
    }
}

// ==================== Health & Connection ====================

/// Check if the database connection is healthy.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Catalog lookups ====================

/// Get a schedule slot by its `semester.period.block` id.
pub async fn get_schedule<R: FullRepository + ?Sized>(
    repo: &R,
    schedule_id: &str,
) -> RepositoryResult<Schedule> {
    repo.get_schedule(schedule_id)
        .await
        .map_err(|e| describe_not_found(e, "schedule", schedule_id))
}

/// Get a course by code.
pub async fn get_course<R: FullRepository + ?Sized>(
    repo: &R,
    course_code: &str,
) -> RepositoryResult<Course> {
    repo.get_course(course_code)
        .await
        .map_err(|e| describe_not_found(e, "course", course_code))
}

/// Get a Scheduler row with its course and schedule.
pub async fn get_scheduler<R: FullRepository + ?Sized>(
    repo: &R,
    scheduler_id: SchedulerId,
) -> RepositoryResult<Scheduler> {
    repo.get_scheduler(scheduler_id)
        .await
        .map_err(|e| describe_not_found(e, "scheduler", &scheduler_id.to_string()))
}

/// List all programs.
pub async fn list_programs<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Program>> {
    repo.list_programs().await
}

/// List the profiles offered by a program.
pub async fn list_program_profiles<R: FullRepository + ?Sized>(
    repo: &R,
    program_code: &str,
) -> RepositoryResult<Vec<Profile>> {
    repo.list_program_profiles(program_code)
        .await
        .map_err(|e| describe_not_found(e, "program", program_code))
}

/// Courses a profile offers in one semester of a program, by period.
pub async fn list_term_courses<R: FullRepository + ?Sized>(
    repo: &R,
    program_code: &str,
    profile_code: &str,
    semester: i16,
) -> RepositoryResult<SemesterCourses> {
    let filter = SchedulerFilter::new()
        .program(program_code)
        .profile(profile_code)
        .semester(semester);

    let rows = repo.list_schedulers(&filter).await?;
    debug!(
        "{} courses for program {} profile {} semester {}",
        rows.len(),
        program_code,
        profile_code,
        semester
    );

    let (period_1, rest): (Vec<_>, Vec<_>) =
        rows.into_iter().partition(|s| s.schedule.period == 1);
    let period_2 = rest.into_iter().filter(|s| s.schedule.period == 2).collect();

    Ok(SemesterCourses { period_1, period_2 })
}
