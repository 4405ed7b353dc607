//! Database module for the course catalog, planning rows and accounts.
//!
//! This module provides abstractions for database operations via the Repository pattern,
//! allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (REST API, loader CLI)               │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs, crate::services)            │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/)                        │
//! │  - CatalogRepository                                    │
//! │  - PlanningRepository                                   │
//! │  - AccountRepository                                    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//!     │                                │
//! ┌───▼──────────────────┐  ┌─────────▼──────────────┐
//! │ Postgres Repository  │  │ Local Repository       │
//! │ (Diesel + r2d2)      │  │ (in-memory)            │
//! └──────────────────────┘  └────────────────────────┘
//! ```
//!
//! # Recommended Usage
//!
//! ```ignore
//! use master_planner::db::{services, RepositoryFactory};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::from_default_config().await?;
//!     let programs = services::list_programs(repo.as_ref()).await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;


// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use services::{
    get_course, get_schedule, get_scheduler, health_check, list_program_profiles, list_programs,
    list_term_courses, SemesterCourses,
};

pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    AccountRepository, CatalogRepository, ErrorContext, FullRepository, PlanningRepository,
    RepositoryError, RepositoryResult,
};
