//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::CreditRequirements;
use crate::db::repository::FullRepository;
use crate::services::course_info::{CourseInfoSource, LocalCourseInfoSource};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Collaborator serving extra course details
    pub course_info: Arc<dyn CourseInfoSource>,
    /// Credit requirements used by the plan overview
    pub requirements: CreditRequirements,
}

impl AppState {
    /// Create a state with an empty course-info source and default requirements.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            repository,
            course_info: Arc::new(LocalCourseInfoSource::new()),
            requirements: CreditRequirements::default(),
        }
    }

    pub fn with_course_info(mut self, course_info: Arc<dyn CourseInfoSource>) -> Self {
        self.course_info = course_info;
        self
    }

    pub fn with_requirements(mut self, requirements: CreditRequirements) -> Self {
        self.requirements = requirements;
        self
    }
}
