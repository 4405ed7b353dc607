//! Account repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{AccountId, SchedulerId};
use crate::models::{Account, NewAccount, Scheduler};

/// Repository trait for student accounts and their choices.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create an account.
    ///
    /// # Returns
    /// * `Ok(Account)` - The stored account with its assigned id
    /// * `Err(RepositoryError::ConflictError)` - If the username is taken
    async fn create_account(&self, account: &NewAccount) -> RepositoryResult<Account>;

    /// Get an account by username.
    async fn get_account(&self, username: &str) -> RepositoryResult<Account>;

    /// Set the study program of an account.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the account or program doesn't exist
    async fn set_account_program(
        &self,
        username: &str,
        program_code: &str,
    ) -> RepositoryResult<Account>;

    /// Add Scheduler rows to an account's choices. Existing choices are ignored.
    ///
    /// All ids are added in one unit of work, or none are.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of newly added choices
    /// * `Err(RepositoryError::NotFound)` - If the account or a row doesn't exist
    async fn add_choices(
        &self,
        account_id: AccountId,
        scheduler_ids: &[SchedulerId],
    ) -> RepositoryResult<usize>;

    /// Remove Scheduler rows from an account's choices. Absent ids are ignored.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of removed choices
    async fn remove_choices(
        &self,
        account_id: AccountId,
        scheduler_ids: &[SchedulerId],
    ) -> RepositoryResult<usize>;

    /// List the account's chosen rows, ordered by schedule id then course code.
    async fn list_choices(&self, account_id: AccountId) -> RepositoryResult<Vec<Scheduler>>;
}
