//! Planning repository trait for Scheduler rows.
//!
//! A Scheduler row places a course in a schedule slot for one program. The
//! `(program, course, schedule)` triple is unique; implementations must never
//! create a second row for the same [`SchedulerKey`].

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::SchedulerId;
use crate::models::{Scheduler, SchedulerFilter, SchedulerKey};

/// Repository trait for Scheduler rows and split-course links.
#[async_trait]
pub trait PlanningRepository: Send + Sync {
    /// Return the row for each key, creating the missing ones.
    ///
    /// # Returns
    /// * `Ok(Vec<(SchedulerId, bool)>)` - One entry per input key, in order;
    ///   the flag is `true` when the row was created by this call
    /// * `Err(RepositoryError::NotFound)` - If a program, course or schedule doesn't exist
    async fn ensure_schedulers(
        &self,
        keys: &[SchedulerKey],
    ) -> RepositoryResult<Vec<(SchedulerId, bool)>>;

    /// Offer Scheduler rows to profiles as `(scheduler_id, profile_code)` pairs.
    ///
    /// Existing associations are ignored.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of new associations
    async fn attach_scheduler_profiles(
        &self,
        links: &[(SchedulerId, String)],
    ) -> RepositoryResult<usize>;

    /// Get a Scheduler row with its course, schedule and profiles.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the row doesn't exist
    async fn get_scheduler(&self, scheduler_id: SchedulerId) -> RepositoryResult<Scheduler>;

    /// List Scheduler rows matching a filter, ordered by schedule id then course code.
    async fn list_schedulers(&self, filter: &SchedulerFilter) -> RepositoryResult<Vec<Scheduler>>;

    /// Make two rows reference each other as the halves of one split course.
    ///
    /// Any previous partner of either row is unlinked so that a link always
    /// points at exactly one other row.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ValidationError)` - If both ids are the same
    /// * `Err(RepositoryError::NotFound)` - If either row doesn't exist
    async fn link_schedulers(&self, first: SchedulerId, second: SchedulerId)
        -> RepositoryResult<()>;
}
