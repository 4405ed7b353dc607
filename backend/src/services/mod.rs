//! Service layer for business logic and orchestration.
//!
//! Services sit between the repository traits and the HTTP handlers / CLI.
//! They are generic over [`FullRepository`](crate::db::repository::FullRepository)
//! so the same code runs against the local and the Postgres backend.

pub mod accounts;
pub mod aggregation;
pub mod choices;
pub mod course_info;
pub mod loader;

#[cfg(test)]
mod aggregation_tests;

pub use accounts::{get_account, register_account, select_program};
pub use aggregation::{build_overview, summarize_choices};
pub use choices::{add_choice, list_choices, remove_choice};
pub use course_info::{
    get_extra_course_info, register_course_details, CourseDetailsError, CourseInfoError,
    CourseInfoSource, LocalCourseInfoSource,
};
#[cfg(feature = "course-info-http")]
pub use course_info::HttpCourseInfoSource;
pub use loader::{load_batch, register_courses, register_profiles, register_programs};
