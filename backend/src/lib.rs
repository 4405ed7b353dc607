//! # Master Planner Backend
//!
//! Course-planning engine for master's students.
//!
//! Students pick a study program, choose elective courses per semester and
//! period, and the backend aggregates credit totals against the program's
//! credit requirements. The backend exposes a REST API via Axum.
//!
//! ## Features
//!
//! - **Bulk Loading**: Ingest scraped program/profile/course rows with
//!   composite-key deduplication and split-course linking
//! - **Choices**: Add and remove course choices, keeping split courses in sync
//! - **Aggregation**: Credit totals per period, semester and plan with the
//!   partial-credit rule and level categories
//! - **Course Details**: Fetch examinations, examiner and campus from an
//!   external course-info service
//! - **HTTP API**: RESTful endpoints for the planning frontend
//!
//! ## Architecture
//!
//! - [`api`]: Identifier types and response DTOs shared across layers
//! - [`models`]: Catalog, account and credit domain types
//! - [`db`]: Repository traits, local and Postgres implementations
//! - [`services`]: Loader, choice, aggregation, account and course-info logic
//! - [`config`]: Planner configuration (credit requirements, course info)
//! - [`http`]: Axum-based HTTP server and request handlers

// RepositoryError carries rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
