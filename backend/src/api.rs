//! Public API surface for the planner backend.
//!
//! This file consolidates the identifier types and the DTO types returned by
//! the service layer. All types derive Serialize/Deserialize for JSON.

pub use crate::db::services::SemesterCourses;
pub use crate::models::{
    Account, Course, CourseDetails, Examination, Profile, Program, Schedule, Scheduler,
};
pub use crate::services::aggregation::{CreditTally, PeriodPlan, PlanOverview, SemesterPlan};
pub use crate::services::choices::ChoiceChange;
pub use crate::services::course_info::{CourseInfo, ExtraCourseInfo};
pub use crate::services::loader::{CourseRecord, LoadBatch, LoadReport, ProfileRecord, ProgramRecord};

crate::define_id_type!(i64, AccountId);
crate::define_id_type!(uuid::Uuid, SchedulerId);

impl SchedulerId {
    /// Generate a fresh random id for a new Scheduler row.
    pub fn generate() -> Self {
        SchedulerId(uuid::Uuid::new_v4())
    }
}

impl std::str::FromStr for SchedulerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(SchedulerId)
    }
}
