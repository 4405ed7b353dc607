//! Repository trait definitions for database operations.
//!
//! This module provides a collection of focused repository traits that abstract
//! database operations. By splitting responsibilities across multiple traits,
//! implementations can be more focused and testable.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`catalog`]: Programs, profiles, courses, schedules and course details
//! - [`planning`]: Scheduler rows, their profiles and split-course links
//! - [`account`]: Student accounts and their course choices
//!
//! # Convenience Trait Bound
//!
//! For functions that need all repository capabilities, use the [`FullRepository`] trait bound:
//!
//! ```ignore
//! async fn my_service<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let account = repo.get_account("student").await?;
//!     let choices = repo.list_choices(account.account_id).await?;
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod catalog;
pub mod error;
pub mod planning;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use account::AccountRepository;
pub use catalog::CatalogRepository;
pub use planning::PlanningRepository;

/// Composite trait bound for a complete repository implementation.
///
/// This trait is automatically implemented for any type that implements
/// all three repository traits.
pub trait FullRepository: CatalogRepository + PlanningRepository + AccountRepository {}

// Blanket implementation: any type implementing all three traits automatically implements FullRepository
impl<T> FullRepository for T where T: CatalogRepository + PlanningRepository + AccountRepository {}
