//! Data Transfer Objects for the HTTP API.
//!
//! Response bodies mostly reuse the serializable types from [`crate::api`];
//! this module adds the request bodies and a few small responses.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    Account, ChoiceChange, Course, ExtraCourseInfo, LoadBatch, LoadReport, PlanOverview, Profile,
    Program, Schedule, Scheduler, SemesterCourses,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// POST /v1/accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAccountRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAccountResponse {
    /// False when the username was already taken
    pub registered: bool,
}

/// PUT /v1/account/program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectProgramRequest {
    pub program_code: String,
}

/// Body of the add/remove choice endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceRequest {
    /// Scheduler row id as text
    pub scheduler_id: String,
}
