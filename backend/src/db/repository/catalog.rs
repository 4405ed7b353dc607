//! Catalog repository trait.
//!
//! Programs, profiles, courses, schedule slots and the extra course details
//! fetched after the initial load.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Course, CourseDetails, Examination, Profile, Program, Schedule};

/// Repository trait for the course catalog.
///
/// All `upsert_*` operations are keyed by the entity's natural key and are
/// safe to repeat with the same input.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the database connection is healthy.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Programs & Profiles ====================

    /// Insert programs, updating the name of existing codes.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows written
    async fn upsert_programs(&self, programs: &[Program]) -> RepositoryResult<usize>;

    /// Insert profiles, updating the name of existing codes.
    async fn upsert_profiles(&self, profiles: &[Profile]) -> RepositoryResult<usize>;

    /// Associate profiles with programs as `(program_code, profile_code)` pairs.
    ///
    /// Existing associations are ignored.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of new associations
    /// * `Err(RepositoryError::NotFound)` - If a program or profile doesn't exist
    async fn link_program_profiles(&self, links: &[(String, String)]) -> RepositoryResult<usize>;

    /// Get a program by code.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the program doesn't exist
    async fn get_program(&self, program_code: &str) -> RepositoryResult<Program>;

    /// List all programs ordered by code.
    async fn list_programs(&self) -> RepositoryResult<Vec<Program>>;

    /// Get a profile by code.
    async fn get_profile(&self, profile_code: &str) -> RepositoryResult<Profile>;

    /// List the profiles offered by a program, ordered by code.
    async fn list_program_profiles(&self, program_code: &str) -> RepositoryResult<Vec<Profile>>;

    // ==================== Courses ====================

    /// Insert courses, updating catalog fields of existing codes.
    ///
    /// Examiner, campus and main fields of existing rows are preserved.
    async fn upsert_courses(&self, courses: &[Course]) -> RepositoryResult<usize>;

    /// Get a course by code, including its main fields.
    async fn get_course(&self, course_code: &str) -> RepositoryResult<Course>;

    /// Store details fetched from the course-info source.
    ///
    /// Replaces the course's examinations, adds the main fields and sets
    /// examiner and campus.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the course doesn't exist
    async fn store_course_details(
        &self,
        course_code: &str,
        details: &CourseDetails,
    ) -> RepositoryResult<()>;

    /// List the examinations of a course.
    async fn list_examinations(&self, course_code: &str) -> RepositoryResult<Vec<Examination>>;

    // ==================== Schedules ====================

    /// Insert schedule slots; existing ids are left unchanged.
    async fn upsert_schedules(&self, schedules: &[Schedule]) -> RepositoryResult<usize>;

    /// Get a schedule slot by its `semester.period.block` id.
    async fn get_schedule(&self, schedule_id: &str) -> RepositoryResult<Schedule>;
}
