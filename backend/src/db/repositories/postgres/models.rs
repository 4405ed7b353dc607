use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    account_choices, accounts, course_main_fields, courses, examinations, profiles, programs,
    schedulers, schedules,
};
use crate::api::{AccountId, SchedulerId};
use crate::models::{Account, Course, Examination, Profile, Program, Schedule};

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = programs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProgramRow {
    pub program_code: String,
    pub program_name: String,
}

impl From<&Program> for ProgramRow {
    fn from(p: &Program) -> Self {
        Self {
            program_code: p.code.clone(),
            program_name: p.name.clone(),
        }
    }
}

impl From<ProgramRow> for Program {
    fn from(row: ProgramRow) -> Self {
        Self {
            code: row.program_code,
            name: row.program_name,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfileRow {
    pub profile_code: String,
    pub profile_name: String,
}

impl From<&Profile> for ProfileRow {
    fn from(p: &Profile) -> Self {
        Self {
            profile_code: p.code.clone(),
            profile_name: p.name.clone(),
        }
    }
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            code: row.profile_code,
            name: row.profile_name,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CourseRow {
    pub course_code: String,
    pub course_name: String,
    pub credits: String,
    pub level: String,
    pub status: String,
    pub examiner: Option<String>,
    pub campus: Option<String>,
}

impl From<&Course> for CourseRow {
    fn from(c: &Course) -> Self {
        Self {
            course_code: c.code.clone(),
            course_name: c.name.clone(),
            credits: c.credits.clone(),
            level: c.level.clone(),
            status: c.status.clone(),
            examiner: c.examiner.clone(),
            campus: c.campus.clone(),
        }
    }
}

impl CourseRow {
    pub fn into_course(self, main_fields: Vec<String>) -> Course {
        Course {
            code: self.course_code,
            name: self.course_name,
            credits: self.credits,
            level: self.level,
            status: self.status,
            campus: self.campus,
            examiner: self.examiner,
            main_fields,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = course_main_fields)]
pub struct NewCourseMainFieldRow {
    pub course_code: String,
    pub main_field: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = examinations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // examination_id used only for ordering
pub struct ExaminationRow {
    pub examination_id: i64,
    pub course_code: String,
    pub exam_code: String,
    pub exam_name: String,
    pub credits: String,
    pub grading: String,
}

impl From<ExaminationRow> for Examination {
    fn from(row: ExaminationRow) -> Self {
        Self {
            code: row.exam_code,
            name: row.exam_name,
            credits: row.credits,
            grading: row.grading,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = examinations)]
pub struct NewExaminationRow {
    pub course_code: String,
    pub exam_code: String,
    pub exam_name: String,
    pub credits: String,
    pub grading: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = schedules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ScheduleRow {
    pub schedule_id: String,
    pub semester: i16,
    pub period: i16,
    pub block: String,
}

impl From<&Schedule> for ScheduleRow {
    fn from(s: &Schedule) -> Self {
        Self {
            schedule_id: s.id.clone(),
            semester: s.semester,
            period: s.period,
            block: s.block.clone(),
        }
    }
}

impl From<ScheduleRow> for Schedule {
    fn from(row: ScheduleRow) -> Self {
        Self {
            id: row.schedule_id,
            semester: row.semester,
            period: row.period,
            block: row.block,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = schedulers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SchedulerRow {
    pub scheduler_id: Uuid,
    pub program_code: String,
    pub course_code: String,
    pub schedule_id: String,
    pub linked_id: Option<Uuid>,
}

impl SchedulerRow {
    pub fn id(&self) -> SchedulerId {
        SchedulerId(self.scheduler_id)
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // password_digest never leaves the repository
pub struct AccountRow {
    pub account_id: i64,
    pub username: String,
    pub email: String,
    pub password_digest: String,
    pub program_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            account_id: AccountId(row.account_id),
            username: row.username,
            email: row.email,
            program_code: row.program_code,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub struct NewAccountRow {
    pub username: String,
    pub email: String,
    pub password_digest: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = account_choices)]
pub struct NewAccountChoiceRow {
    pub account_id: i64,
    pub scheduler_id: Uuid,
}
