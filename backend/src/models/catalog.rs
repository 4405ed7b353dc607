//! Course catalog domain types.
//!
//! A [`Scheduler`] row is the fact that ties a [`Course`] to a [`Schedule`]
//! slot inside one [`Program`], visible to one or more [`Profile`]s. Courses
//! that run over two periods are modelled as two Scheduler rows pointing at
//! each other through `linked`.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::api::SchedulerId;
use crate::models::credits::{is_partial_credit, LevelCategory};

/// Semesters covered by the planner.
pub const SEMESTERS: RangeInclusive<i16> = 7..=9;

/// Study periods within a semester.
pub const PERIODS: RangeInclusive<i16> = 1..=2;

/// Profile code shown when a student has not picked a specialization.
pub const DEFAULT_PROFILE_CODE: &str = "free";

/// Build the composite schedule id `semester.period.block`.
pub fn schedule_id(semester: i16, period: i16, block: &str) -> String {
    format!("{}.{}.{}", semester, period, block)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub code: String,
    pub name: String,
}

/// A course offering as published in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    /// Credit hours as written by the catalog, e.g. `"6"` or `"8*"`
    pub credits: String,
    /// Level code, e.g. `A1X`
    pub level: String,
    /// Elective/compulsory status ("vof")
    pub status: String,
    #[serde(default)]
    pub campus: Option<String>,
    #[serde(default)]
    pub examiner: Option<String>,
    #[serde(default)]
    pub main_fields: Vec<String>,
}

impl Course {
    pub fn is_partial_credit(&self) -> bool {
        is_partial_credit(&self.credits)
    }

    pub fn level_category(&self) -> LevelCategory {
        LevelCategory::from_level(&self.level)
    }
}

/// One examination moment of a course (exam, lab, project, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Examination {
    pub code: String,
    pub name: String,
    #[serde(alias = "hp", alias = "scope")]
    pub credits: String,
    pub grading: String,
}

/// Extra course metadata attached after the initial catalog load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDetails {
    pub examiner: Option<String>,
    pub campus: Option<String>,
    pub main_fields: Vec<String>,
    pub examinations: Vec<Examination>,
}

/// A (semester, period, block) time slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub semester: i16,
    pub period: i16,
    pub block: String,
}

impl Schedule {
    pub fn new(semester: i16, period: i16, block: impl Into<String>) -> Self {
        let block = block.into();
        Self {
            id: schedule_id(semester, period, &block),
            semester,
            period,
            block,
        }
    }
}

/// Authoritative deduplication key of a Scheduler row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchedulerKey {
    pub program_code: String,
    pub course_code: String,
    pub schedule_id: String,
}

impl SchedulerKey {
    pub fn new(
        program_code: impl Into<String>,
        course_code: impl Into<String>,
        schedule_id: impl Into<String>,
    ) -> Self {
        Self {
            program_code: program_code.into(),
            course_code: course_code.into(),
            schedule_id: schedule_id.into(),
        }
    }
}

/// A course placed in a schedule slot for one program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheduler {
    pub scheduler_id: SchedulerId,
    pub course: Course,
    pub schedule: Schedule,
    pub program_code: String,
    /// Profile codes this row is offered to, sorted
    pub profiles: Vec<String>,
    /// The other half of a split course, if any
    pub linked: Option<SchedulerId>,
}

impl Scheduler {
    pub fn key(&self) -> SchedulerKey {
        SchedulerKey::new(
            self.program_code.clone(),
            self.course.code.clone(),
            self.schedule.id.clone(),
        )
    }
}

/// Filter for scheduler listings. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerFilter {
    pub program_code: Option<String>,
    pub profile_code: Option<String>,
    pub course_code: Option<String>,
    pub semester: Option<i16>,
    pub period: Option<i16>,
}

impl SchedulerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(mut self, code: impl Into<String>) -> Self {
        self.program_code = Some(code.into());
        self
    }

    pub fn profile(mut self, code: impl Into<String>) -> Self {
        self.profile_code = Some(code.into());
        self
    }

    pub fn course(mut self, code: impl Into<String>) -> Self {
        self.course_code = Some(code.into());
        self
    }

    pub fn semester(mut self, semester: i16) -> Self {
        self.semester = Some(semester);
        self
    }

    pub fn period(mut self, period: i16) -> Self {
        self.period = Some(period);
        self
    }

    /// Check a materialized row against the filter.
    pub fn matches(&self, scheduler: &Scheduler) -> bool {
        self.program_code
            .as_ref()
            .is_none_or(|p| *p == scheduler.program_code)
            && self
                .course_code
                .as_ref()
                .is_none_or(|c| *c == scheduler.course.code)
            && self
                .profile_code
                .as_ref()
                .is_none_or(|p| scheduler.profiles.iter().any(|sp| sp == p))
            && self.semester.is_none_or(|s| s == scheduler.schedule.semester)
            && self.period.is_none_or(|p| p == scheduler.schedule.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(credits: &str) -> Course {
        Course {
            code: "TDDE01".to_string(),
            name: "Machine Learning".to_string(),
            credits: credits.to_string(),
            level: "A1X".to_string(),
            status: "v".to_string(),
            campus: None,
            examiner: None,
            main_fields: vec![],
        }
    }

    #[test]
    fn test_schedule_id_is_derived() {
        let schedule = Schedule::new(7, 2, "3");
        assert_eq!(schedule.id, "7.2.3");
        assert_eq!(schedule_id(9, 1, "-"), "9.1.-");
    }

    #[test]
    fn test_course_partial_credit() {
        assert!(course("8*").is_partial_credit());
        assert!(!course("8").is_partial_credit());
        assert_eq!(course("6").level_category(), LevelCategory::Advanced);
    }

    #[test]
    fn test_filter_matches() {
        let row = Scheduler {
            scheduler_id: SchedulerId::new(uuid::Uuid::new_v4()),
            course: course("6"),
            schedule: Schedule::new(8, 1, "2"),
            program_code: "6CMJU".to_string(),
            profiles: vec!["AIML".to_string(), "free".to_string()],
            linked: None,
        };

        assert!(SchedulerFilter::new().matches(&row));
        assert!(SchedulerFilter::new()
            .program("6CMJU")
            .profile("AIML")
            .semester(8)
            .period(1)
            .matches(&row));
        assert!(!SchedulerFilter::new().period(2).matches(&row));
        assert!(!SchedulerFilter::new().profile("SEC").matches(&row));
        assert!(!SchedulerFilter::new().course("TATA24").matches(&row));
    }
}
