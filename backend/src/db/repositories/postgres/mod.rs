//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres database.
//! The schema lives in `migrations/` and is applied on startup.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::task;
use uuid::Uuid;

use crate::api::{AccountId, SchedulerId};
use crate::db::repository::{
    AccountRepository, CatalogRepository, ErrorContext, PlanningRepository, RepositoryError,
    RepositoryResult,
};
use crate::models::{
    Account, Course, CourseDetails, Examination, NewAccount, Profile, Program, Schedule,
    Scheduler, SchedulerFilter, SchedulerKey,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Rows per multi-row INSERT, kept well below the Postgres parameter limit.
const INSERT_CHUNK_SIZE: usize = 1000;

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// See the module documentation for the variables read.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Returns
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self { pool, config })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;
        if !applied.is_empty() {
            log::info!("Applied {} database migration(s)", applied.len());
        }
        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Retries up to `max_retries` times with exponential backoff when the
    /// error is retryable (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    log::debug!("Retrying database operation (attempt {})", attempt + 1);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn not_found(entity: &str, id: impl ToString, operation: &str) -> RepositoryError {
    RepositoryError::entity_not_found(entity, id).with_operation(operation)
}

fn main_field_rows(course_code: &str, fields: &[String]) -> Vec<NewCourseMainFieldRow> {
    fields
        .iter()
        .map(|f| NewCourseMainFieldRow {
            course_code: course_code.to_string(),
            main_field: f.clone(),
        })
        .collect()
}

fn load_main_fields(
    conn: &mut PgConnection,
    course_codes: &[String],
) -> RepositoryResult<HashMap<String, Vec<String>>> {
    let rows: Vec<(String, String)> = course_main_fields::table
        .filter(course_main_fields::course_code.eq_any(course_codes.to_vec()))
        .select((course_main_fields::course_code, course_main_fields::main_field))
        .order(course_main_fields::main_field.asc())
        .load(conn)
        .map_err(map_diesel_error)?;

    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for (code, field) in rows {
        map.entry(code).or_default().push(field);
    }
    Ok(map)
}

/// Load Scheduler rows joined with their course and schedule.
///
/// `ids` restricts the result to the given rows; the filter is applied on top.
fn query_schedulers(
    conn: &mut PgConnection,
    filter: &SchedulerFilter,
    ids: Option<Vec<Uuid>>,
) -> RepositoryResult<Vec<Scheduler>> {
    let mut query = schedulers::table
        .inner_join(courses::table)
        .inner_join(schedules::table)
        .into_boxed();

    if let Some(ids) = ids {
        query = query.filter(schedulers::scheduler_id.eq_any(ids));
    }
    if let Some(ref program) = filter.program_code {
        query = query.filter(schedulers::program_code.eq(program.clone()));
    }
    if let Some(ref course) = filter.course_code {
        query = query.filter(schedulers::course_code.eq(course.clone()));
    }
    if let Some(semester) = filter.semester {
        query = query.filter(schedules::semester.eq(semester));
    }
    if let Some(period) = filter.period {
        query = query.filter(schedules::period.eq(period));
    }
    if let Some(ref profile) = filter.profile_code {
        query = query.filter(
            schedulers::scheduler_id.eq_any(
                scheduler_profiles::table
                    .filter(scheduler_profiles::profile_code.eq(profile.clone()))
                    .select(scheduler_profiles::scheduler_id),
            ),
        );
    }

    let rows = query
        .select((
            SchedulerRow::as_select(),
            CourseRow::as_select(),
            ScheduleRow::as_select(),
        ))
        .order((
            schedulers::schedule_id.asc(),
            schedulers::course_code.asc(),
            schedulers::program_code.asc(),
        ))
        .load::<(SchedulerRow, CourseRow, ScheduleRow)>(conn)
        .map_err(map_diesel_error)?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let scheduler_ids: Vec<Uuid> = rows.iter().map(|(s, _, _)| s.scheduler_id).collect();
    let profile_rows: Vec<(Uuid, String)> = scheduler_profiles::table
        .filter(scheduler_profiles::scheduler_id.eq_any(scheduler_ids))
        .select((
            scheduler_profiles::scheduler_id,
            scheduler_profiles::profile_code,
        ))
        .order(scheduler_profiles::profile_code.asc())
        .load(conn)
        .map_err(map_diesel_error)?;
    let mut profiles_by_id: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (id, profile) in profile_rows {
        profiles_by_id.entry(id).or_default().push(profile);
    }

    let course_codes: Vec<String> = rows
        .iter()
        .map(|(_, c, _)| c.course_code.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let main_fields = load_main_fields(conn, &course_codes)?;

    Ok(rows
        .into_iter()
        .map(|(scheduler, course, schedule)| {
            let fields = main_fields
                .get(&course.course_code)
                .cloned()
                .unwrap_or_default();
            Scheduler {
                scheduler_id: scheduler.id(),
                course: course.into_course(fields),
                schedule: schedule.into(),
                program_code: scheduler.program_code,
                profiles: profiles_by_id
                    .remove(&scheduler.scheduler_id)
                    .unwrap_or_default(),
                linked: scheduler.linked_id.map(SchedulerId),
            }
        })
        .collect())
}

#[async_trait]
impl CatalogRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn upsert_programs(&self, programs: &[Program]) -> RepositoryResult<usize> {
        let rows: Vec<ProgramRow> = programs.iter().map(ProgramRow::from).collect();
        self.with_conn(move |conn| {
            if rows.is_empty() {
                return Ok(0);
            }
            diesel::insert_into(programs::table)
                .values(&rows)
                .on_conflict(programs::program_code)
                .do_update()
                .set(programs::program_name.eq(excluded(programs::program_name)))
                .execute(conn)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn upsert_profiles(&self, profiles: &[Profile]) -> RepositoryResult<usize> {
        let rows: Vec<ProfileRow> = profiles.iter().map(ProfileRow::from).collect();
        self.with_conn(move |conn| {
            if rows.is_empty() {
                return Ok(0);
            }
            diesel::insert_into(profiles::table)
                .values(&rows)
                .on_conflict(profiles::profile_code)
                .do_update()
                .set(profiles::profile_name.eq(excluded(profiles::profile_name)))
                .execute(conn)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn link_program_profiles(&self, links: &[(String, String)]) -> RepositoryResult<usize> {
        let links = links.to_vec();
        self.with_conn(move |conn| {
            if links.is_empty() {
                return Ok(0);
            }
            let values: Vec<_> = links
                .iter()
                .map(|(program, profile)| {
                    (
                        program_profiles::program_code.eq(program),
                        program_profiles::profile_code.eq(profile),
                    )
                })
                .collect();
            diesel::insert_into(program_profiles::table)
                .values(&values)
                .on_conflict_do_nothing()
                .execute(conn)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_program(&self, program_code: &str) -> RepositoryResult<Program> {
        let code = program_code.to_string();
        self.with_conn(move |conn| {
            programs::table
                .find(&code)
                .select(ProgramRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Program::from)
                .ok_or_else(|| not_found("program", &code, "get_program"))
        })
        .await
    }

    async fn list_programs(&self) -> RepositoryResult<Vec<Program>> {
        self.with_conn(|conn| {
            let rows = programs::table
                .select(ProgramRow::as_select())
                .order(programs::program_code.asc())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Program::from).collect())
        })
        .await
    }

    async fn get_profile(&self, profile_code: &str) -> RepositoryResult<Profile> {
        let code = profile_code.to_string();
        self.with_conn(move |conn| {
            profiles::table
                .find(&code)
                .select(ProfileRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Profile::from)
                .ok_or_else(|| not_found("profile", &code, "get_profile"))
        })
        .await
    }

    async fn list_program_profiles(&self, program_code: &str) -> RepositoryResult<Vec<Profile>> {
        let code = program_code.to_string();
        self.with_conn(move |conn| {
            let exists = programs::table
                .find(&code)
                .select(programs::program_code)
                .first::<String>(conn)
                .optional()
                .map_err(map_diesel_error)?;
            if exists.is_none() {
                return Err(not_found("program", &code, "list_program_profiles"));
            }

            let rows = program_profiles::table
                .inner_join(profiles::table)
                .filter(program_profiles::program_code.eq(&code))
                .select(ProfileRow::as_select())
                .order(profiles::profile_code.asc())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Profile::from).collect())
        })
        .await
    }

    async fn upsert_courses(&self, courses: &[Course]) -> RepositoryResult<usize> {
        let courses = courses.to_vec();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let rows: Vec<CourseRow> = courses.iter().map(CourseRow::from).collect();
                let mut written = 0;
                for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
                    written += diesel::insert_into(courses::table)
                        .values(chunk)
                        .on_conflict(courses::course_code)
                        .do_update()
                        .set((
                            courses::course_name.eq(excluded(courses::course_name)),
                            courses::credits.eq(excluded(courses::credits)),
                            courses::level.eq(excluded(courses::level)),
                            courses::status.eq(excluded(courses::status)),
                        ))
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }

                let fields: Vec<NewCourseMainFieldRow> = courses
                    .iter()
                    .flat_map(|c| main_field_rows(&c.code, &c.main_fields))
                    .collect();
                for chunk in fields.chunks(INSERT_CHUNK_SIZE) {
                    diesel::insert_into(course_main_fields::table)
                        .values(chunk)
                        .on_conflict_do_nothing()
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }
                Ok(written)
            })
        })
        .await
    }

    async fn get_course(&self, course_code: &str) -> RepositoryResult<Course> {
        let code = course_code.to_string();
        self.with_conn(move |conn| {
            let row = courses::table
                .find(&code)
                .select(CourseRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| not_found("course", &code, "get_course"))?;
            let mut fields = load_main_fields(conn, std::slice::from_ref(&code))?;
            Ok(row.into_course(fields.remove(&code).unwrap_or_default()))
        })
        .await
    }

    async fn store_course_details(
        &self,
        course_code: &str,
        details: &CourseDetails,
    ) -> RepositoryResult<()> {
        let code = course_code.to_string();
        let details = details.clone();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let exists = courses::table
                    .find(&code)
                    .select(courses::course_code)
                    .first::<String>(tx)
                    .optional()
                    .map_err(map_diesel_error)?;
                if exists.is_none() {
                    return Err(not_found("course", &code, "store_course_details"));
                }

                if let Some(ref examiner) = details.examiner {
                    diesel::update(courses::table.find(&code))
                        .set(courses::examiner.eq(examiner))
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }
                if let Some(ref campus) = details.campus {
                    diesel::update(courses::table.find(&code))
                        .set(courses::campus.eq(campus))
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }

                let fields = main_field_rows(&code, &details.main_fields);
                if !fields.is_empty() {
                    diesel::insert_into(course_main_fields::table)
                        .values(&fields)
                        .on_conflict_do_nothing()
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }

                diesel::delete(examinations::table.filter(examinations::course_code.eq(&code)))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                let exams: Vec<NewExaminationRow> = details
                    .examinations
                    .iter()
                    .map(|e| NewExaminationRow {
                        course_code: code.clone(),
                        exam_code: e.code.clone(),
                        exam_name: e.name.clone(),
                        credits: e.credits.clone(),
                        grading: e.grading.clone(),
                    })
                    .collect();
                if !exams.is_empty() {
                    diesel::insert_into(examinations::table)
                        .values(&exams)
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn list_examinations(&self, course_code: &str) -> RepositoryResult<Vec<Examination>> {
        let code = course_code.to_string();
        self.with_conn(move |conn| {
            let rows = examinations::table
                .filter(examinations::course_code.eq(&code))
                .select(ExaminationRow::as_select())
                .order(examinations::examination_id.asc())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Examination::from).collect())
        })
        .await
    }

    async fn upsert_schedules(&self, schedules: &[Schedule]) -> RepositoryResult<usize> {
        let rows: Vec<ScheduleRow> = schedules.iter().map(ScheduleRow::from).collect();
        self.with_conn(move |conn| {
            if rows.is_empty() {
                return Ok(0);
            }
            diesel::insert_into(schedules::table)
                .values(&rows)
                .on_conflict_do_nothing()
                .execute(conn)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_schedule(&self, schedule_id: &str) -> RepositoryResult<Schedule> {
        let id = schedule_id.to_string();
        self.with_conn(move |conn| {
            schedules::table
                .find(&id)
                .select(ScheduleRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Schedule::from)
                .ok_or_else(|| not_found("schedule", &id, "get_schedule"))
        })
        .await
    }
}

#[async_trait]
impl PlanningRepository for PostgresRepository {
    async fn ensure_schedulers(
        &self,
        keys: &[SchedulerKey],
    ) -> RepositoryResult<Vec<(SchedulerId, bool)>> {
        let keys = keys.to_vec();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let mut result = Vec::with_capacity(keys.len());
                for key in &keys {
                    let existing = schedulers::table
                        .filter(schedulers::program_code.eq(&key.program_code))
                        .filter(schedulers::course_code.eq(&key.course_code))
                        .filter(schedulers::schedule_id.eq(&key.schedule_id))
                        .select(schedulers::scheduler_id)
                        .first::<Uuid>(tx)
                        .optional()
                        .map_err(map_diesel_error)?;

                    match existing {
                        Some(id) => result.push((SchedulerId(id), false)),
                        None => {
                            let row = SchedulerRow {
                                scheduler_id: SchedulerId::generate().value(),
                                program_code: key.program_code.clone(),
                                course_code: key.course_code.clone(),
                                schedule_id: key.schedule_id.clone(),
                                linked_id: None,
                            };
                            diesel::insert_into(schedulers::table)
                                .values(&row)
                                .execute(tx)
                                .map_err(|e| {
                                    map_diesel_error(e).with_operation("ensure_schedulers")
                                })?;
                            result.push((row.id(), true));
                        }
                    }
                }
                Ok(result)
            })
        })
        .await
    }

    async fn attach_scheduler_profiles(
        &self,
        links: &[(SchedulerId, String)],
    ) -> RepositoryResult<usize> {
        let links = links.to_vec();
        self.with_conn(move |conn| {
            if links.is_empty() {
                return Ok(0);
            }
            let values: Vec<_> = links
                .iter()
                .map(|(id, profile)| {
                    (
                        scheduler_profiles::scheduler_id.eq(id.value()),
                        scheduler_profiles::profile_code.eq(profile),
                    )
                })
                .collect();
            conn.transaction(|tx| {
                let mut added = 0;
                for chunk in values.chunks(INSERT_CHUNK_SIZE) {
                    added += diesel::insert_into(scheduler_profiles::table)
                        .values(chunk)
                        .on_conflict_do_nothing()
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }
                Ok(added)
            })
        })
        .await
    }

    async fn get_scheduler(&self, scheduler_id: SchedulerId) -> RepositoryResult<Scheduler> {
        self.with_conn(move |conn| {
            query_schedulers(
                conn,
                &SchedulerFilter::default(),
                Some(vec![scheduler_id.value()]),
            )?
            .pop()
            .ok_or_else(|| not_found("scheduler", scheduler_id, "get_scheduler"))
        })
        .await
    }

    async fn list_schedulers(&self, filter: &SchedulerFilter) -> RepositoryResult<Vec<Scheduler>> {
        let filter = filter.clone();
        self.with_conn(move |conn| query_schedulers(conn, &filter, None))
            .await
    }

    async fn link_schedulers(
        &self,
        first: SchedulerId,
        second: SchedulerId,
    ) -> RepositoryResult<()> {
        if first == second {
            return Err(RepositoryError::validation_with_context(
                "A scheduler cannot be linked to itself",
                ErrorContext::new("link_schedulers")
                    .with_entity("scheduler")
                    .with_entity_id(first),
            ));
        }

        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let pair = vec![first.value(), second.value()];
                let found: i64 = schedulers::table
                    .filter(schedulers::scheduler_id.eq_any(pair.clone()))
                    .count()
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                if found != 2 {
                    return Err(RepositoryError::not_found_with_context(
                        format!("Scheduler {} or {} not found", first, second),
                        ErrorContext::new("link_schedulers").with_entity("scheduler"),
                    ));
                }

                // Drop previous partners on both sides
                diesel::update(schedulers::table.filter(schedulers::linked_id.eq_any(pair.clone())))
                    .set(schedulers::linked_id.eq(None::<Uuid>))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                diesel::update(schedulers::table.filter(schedulers::scheduler_id.eq_any(pair)))
                    .set(schedulers::linked_id.eq(None::<Uuid>))
                    .execute(tx)
                    .map_err(map_diesel_error)?;

                diesel::update(schedulers::table.find(first.value()))
                    .set(schedulers::linked_id.eq(Some(second.value())))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                diesel::update(schedulers::table.find(second.value()))
                    .set(schedulers::linked_id.eq(Some(first.value())))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                Ok(())
            })
        })
        .await
    }
}

#[async_trait]
impl AccountRepository for PostgresRepository {
    async fn create_account(&self, account: &NewAccount) -> RepositoryResult<Account> {
        let row = NewAccountRow {
            username: account.username.clone(),
            email: account.email.clone(),
            password_digest: account.password_digest.clone(),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(accounts::table)
                .values(&row)
                .returning(AccountRow::as_returning())
                .get_result(conn)
                .map(Account::from)
                .map_err(|e| match map_diesel_error(e) {
                    RepositoryError::ConflictError { context, .. } => {
                        RepositoryError::conflict_with_context(
                            format!("Username {} is already taken", row.username),
                            ErrorContext {
                                operation: Some("create_account".to_string()),
                                ..context
                            },
                        )
                    }
                    other => other,
                })
        })
        .await
    }

    async fn get_account(&self, username: &str) -> RepositoryResult<Account> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            accounts::table
                .filter(accounts::username.eq(&username))
                .select(AccountRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Account::from)
                .ok_or_else(|| not_found("account", &username, "get_account"))
        })
        .await
    }

    async fn set_account_program(
        &self,
        username: &str,
        program_code: &str,
    ) -> RepositoryResult<Account> {
        let username = username.to_string();
        let program = program_code.to_string();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let exists = programs::table
                    .find(&program)
                    .select(programs::program_code)
                    .first::<String>(tx)
                    .optional()
                    .map_err(map_diesel_error)?;
                if exists.is_none() {
                    return Err(not_found("program", &program, "set_account_program"));
                }

                diesel::update(accounts::table.filter(accounts::username.eq(&username)))
                    .set(accounts::program_code.eq(Some(program.clone())))
                    .returning(AccountRow::as_returning())
                    .get_result(tx)
                    .optional()
                    .map_err(map_diesel_error)?
                    .map(Account::from)
                    .ok_or_else(|| not_found("account", &username, "set_account_program"))
            })
        })
        .await
    }

    async fn add_choices(
        &self,
        account_id: AccountId,
        scheduler_ids: &[SchedulerId],
    ) -> RepositoryResult<usize> {
        let ids: Vec<Uuid> = scheduler_ids
            .iter()
            .map(|id| id.value())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let account = accounts::table
                    .find(account_id.value())
                    .select(accounts::account_id)
                    .first::<i64>(tx)
                    .optional()
                    .map_err(map_diesel_error)?;
                if account.is_none() {
                    return Err(not_found("account", account_id, "add_choices"));
                }

                let found: i64 = schedulers::table
                    .filter(schedulers::scheduler_id.eq_any(ids.clone()))
                    .count()
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                if found as usize != ids.len() {
                    return Err(RepositoryError::not_found_with_context(
                        "One or more schedulers not found",
                        ErrorContext::new("add_choices").with_entity("scheduler"),
                    ));
                }

                let rows: Vec<NewAccountChoiceRow> = ids
                    .iter()
                    .map(|id| NewAccountChoiceRow {
                        account_id: account_id.value(),
                        scheduler_id: *id,
                    })
                    .collect();
                if rows.is_empty() {
                    return Ok(0);
                }
                diesel::insert_into(account_choices::table)
                    .values(&rows)
                    .on_conflict_do_nothing()
                    .execute(tx)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }

    async fn remove_choices(
        &self,
        account_id: AccountId,
        scheduler_ids: &[SchedulerId],
    ) -> RepositoryResult<usize> {
        let ids: Vec<Uuid> = scheduler_ids.iter().map(|id| id.value()).collect();
        self.with_conn(move |conn| {
            diesel::delete(
                account_choices::table
                    .filter(account_choices::account_id.eq(account_id.value()))
                    .filter(account_choices::scheduler_id.eq_any(ids)),
            )
            .execute(conn)
            .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_choices(&self, account_id: AccountId) -> RepositoryResult<Vec<Scheduler>> {
        self.with_conn(move |conn| {
            let ids: Vec<Uuid> = account_choices::table
                .filter(account_choices::account_id.eq(account_id.value()))
                .select(account_choices::scheduler_id)
                .load(conn)
                .map_err(map_diesel_error)?;
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            query_schedulers(conn, &SchedulerFilter::default(), Some(ids))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PostgresConfig::with_url("postgres://localhost/planner");
        assert_eq!(config.database_url, "postgres://localhost/planner");
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_not_found_message() {
        let err = not_found("course", "TDDE01", "get_course");
        assert_eq!(err.message(), "Course TDDE01 not found");
        assert_eq!(err.context().entity.as_deref(), Some("course"));
    }
}
