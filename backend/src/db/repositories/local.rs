//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in
//! memory behind a single `RwLock`, so every operation is atomic with respect
//! to the others and execution stays deterministic.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use crate::api::{AccountId, SchedulerId};
use crate::db::repository::*;
use crate::models::{
    Account, Course, CourseDetails, Examination, NewAccount, Profile, Program, Schedule,
    Scheduler, SchedulerFilter, SchedulerKey,
};

/// In-memory local repository.
///
/// # Example
/// ```
/// use master_planner::db::repositories::LocalRepository;
/// use master_planner::db::repository::CatalogRepository;
/// use master_planner::models::Program;
///
/// # tokio_test_block_on(async {
/// let repo = LocalRepository::new();
/// repo.upsert_programs(&[Program { code: "6CMJU".into(), name: "Computer Science".into() }])
///     .await
///     .unwrap();
/// assert_eq!(repo.program_count(), 1);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

/// Stored Scheduler row; course and schedule are joined on read.
#[derive(Debug, Clone)]
struct SchedulerRow {
    key: SchedulerKey,
    linked: Option<SchedulerId>,
}

#[derive(Debug, Clone)]
struct StoredAccount {
    account: Account,
    password_digest: String,
}

struct LocalData {
    // Catalog
    programs: BTreeMap<String, Program>,
    profiles: BTreeMap<String, Profile>,
    program_profiles: BTreeSet<(String, String)>,
    courses: BTreeMap<String, Course>,
    examinations: HashMap<String, Vec<Examination>>,
    schedules: BTreeMap<String, Schedule>,

    // Planning
    schedulers: HashMap<SchedulerId, SchedulerRow>,
    scheduler_keys: HashMap<SchedulerKey, SchedulerId>,
    scheduler_profiles: HashMap<SchedulerId, BTreeSet<String>>,

    // Accounts
    accounts: BTreeMap<String, StoredAccount>,
    choices: HashMap<AccountId, BTreeSet<SchedulerId>>,

    // ID counters
    next_account_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            programs: BTreeMap::new(),
            profiles: BTreeMap::new(),
            program_profiles: BTreeSet::new(),
            courses: BTreeMap::new(),
            examinations: HashMap::new(),
            schedules: BTreeMap::new(),
            schedulers: HashMap::new(),
            scheduler_keys: HashMap::new(),
            scheduler_profiles: HashMap::new(),
            accounts: BTreeMap::new(),
            choices: HashMap::new(),
            next_account_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn materialize(&self, id: SchedulerId) -> RepositoryResult<Scheduler> {
        let row = self.schedulers.get(&id).ok_or_else(|| {
            RepositoryError::entity_not_found("scheduler", id).with_operation("get_scheduler")
        })?;

        let course = self.courses.get(&row.key.course_code).cloned().ok_or_else(|| {
            RepositoryError::internal(format!(
                "Scheduler {} references missing course {}",
                id, row.key.course_code
            ))
        })?;
        let schedule = self
            .schedules
            .get(&row.key.schedule_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::internal(format!(
                    "Scheduler {} references missing schedule {}",
                    id, row.key.schedule_id
                ))
            })?;

        Ok(Scheduler {
            scheduler_id: id,
            course,
            schedule,
            program_code: row.key.program_code.clone(),
            profiles: self
                .scheduler_profiles
                .get(&id)
                .map(|p| p.iter().cloned().collect())
                .unwrap_or_default(),
            linked: row.linked,
        })
    }

    fn require_program(&self, code: &str) -> RepositoryResult<()> {
        if self.programs.contains_key(code) {
            Ok(())
        } else {
            Err(RepositoryError::entity_not_found("program", code))
        }
    }

    fn require_profile(&self, code: &str) -> RepositoryResult<()> {
        if self.profiles.contains_key(code) {
            Ok(())
        } else {
            Err(RepositoryError::entity_not_found("profile", code))
        }
    }

    fn require_scheduler(&self, id: SchedulerId) -> RepositoryResult<()> {
        if self.schedulers.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::entity_not_found("scheduler", id))
        }
    }

    fn account(&self, username: &str) -> RepositoryResult<&StoredAccount> {
        self.accounts.get(username).ok_or_else(|| {
            RepositoryError::entity_not_found("account", username)
        })
    }

    fn account_exists(&self, account_id: AccountId) -> bool {
        self.accounts
            .values()
            .any(|a| a.account.account_id == account_id)
    }

    fn unlink(&mut self, id: SchedulerId) {
        if let Some(partner) = self.schedulers.get_mut(&id).and_then(|r| r.linked.take()) {
            if let Some(row) = self.schedulers.get_mut(&partner) {
                if row.linked == Some(id) {
                    row.linked = None;
                }
            }
        }
    }
}

fn sort_schedulers(rows: &mut [Scheduler]) {
    rows.sort_by(|a, b| {
        a.schedule
            .id
            .cmp(&b.schedule.id)
            .then_with(|| a.course.code.cmp(&b.course.code))
            .then_with(|| a.program_code.cmp(&b.program_code))
    });
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        let mut data = self.data.write().unwrap();
        data.is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write().unwrap();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Get the number of programs stored.
    pub fn program_count(&self) -> usize {
        self.data.read().unwrap().programs.len()
    }

    /// Get the number of Scheduler rows stored.
    pub fn scheduler_count(&self) -> usize {
        self.data.read().unwrap().schedulers.len()
    }

    /// Stored password digest of an account, if the account exists.
    pub fn password_digest(&self, username: &str) -> Option<String> {
        self.data
            .read()
            .unwrap()
            .accounts
            .get(username)
            .map(|a| a.password_digest.clone())
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        let data = self.data.read().unwrap();
        if !data.is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        let data = self.data.read().unwrap();
        Ok(data.is_healthy)
    }

    async fn upsert_programs(&self, programs: &[Program]) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        for program in programs {
            data.programs.insert(program.code.clone(), program.clone());
        }
        Ok(programs.len())
    }

    async fn upsert_profiles(&self, profiles: &[Profile]) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        for profile in profiles {
            data.profiles.insert(profile.code.clone(), profile.clone());
        }
        Ok(profiles.len())
    }

    async fn link_program_profiles(&self, links: &[(String, String)]) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        for (program, profile) in links {
            data.require_program(program)?;
            data.require_profile(profile)?;
        }
        let mut added = 0;
        for link in links {
            if data.program_profiles.insert(link.clone()) {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn get_program(&self, program_code: &str) -> RepositoryResult<Program> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        data.require_program(program_code)?;
        Ok(data.programs[program_code].clone())
    }

    async fn list_programs(&self) -> RepositoryResult<Vec<Program>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(data.programs.values().cloned().collect())
    }

    async fn get_profile(&self, profile_code: &str) -> RepositoryResult<Profile> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        data.require_profile(profile_code)?;
        Ok(data.profiles[profile_code].clone())
    }

    async fn list_program_profiles(&self, program_code: &str) -> RepositoryResult<Vec<Profile>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        data.require_program(program_code)?;
        Ok(data
            .program_profiles
            .iter()
            .filter(|(program, _)| program == program_code)
            .filter_map(|(_, profile)| data.profiles.get(profile).cloned())
            .collect())
    }

    async fn upsert_courses(&self, courses: &[Course]) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        for course in courses {
            match data.courses.get_mut(&course.code) {
                Some(existing) => {
                    existing.name = course.name.clone();
                    existing.credits = course.credits.clone();
                    existing.level = course.level.clone();
                    existing.status = course.status.clone();
                }
                None => {
                    data.courses.insert(course.code.clone(), course.clone());
                }
            }
        }
        Ok(courses.len())
    }

    async fn get_course(&self, course_code: &str) -> RepositoryResult<Course> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        data.courses.get(course_code).cloned().ok_or_else(|| {
            RepositoryError::entity_not_found("course", course_code).with_operation("get_course")
        })
    }

    async fn store_course_details(
        &self,
        course_code: &str,
        details: &CourseDetails,
    ) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        let course = data.courses.get_mut(course_code).ok_or_else(|| {
            RepositoryError::entity_not_found("course", course_code).with_operation("store_course_details")
        })?;

        if details.examiner.is_some() {
            course.examiner = details.examiner.clone();
        }
        if details.campus.is_some() {
            course.campus = details.campus.clone();
        }
        for field in &details.main_fields {
            if !course.main_fields.contains(field) {
                course.main_fields.push(field.clone());
            }
        }
        course.main_fields.sort();

        data.examinations
            .insert(course_code.to_string(), details.examinations.clone());
        Ok(())
    }

    async fn list_examinations(&self, course_code: &str) -> RepositoryResult<Vec<Examination>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(data
            .examinations
            .get(course_code)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_schedules(&self, schedules: &[Schedule]) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        let mut inserted = 0;
        for schedule in schedules {
            if !data.schedules.contains_key(&schedule.id) {
                data.schedules.insert(schedule.id.clone(), schedule.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn get_schedule(&self, schedule_id: &str) -> RepositoryResult<Schedule> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        data.schedules.get(schedule_id).cloned().ok_or_else(|| {
            RepositoryError::entity_not_found("schedule", schedule_id).with_operation("get_schedule")
        })
    }
}

#[async_trait]
impl PlanningRepository for LocalRepository {
    async fn ensure_schedulers(
        &self,
        keys: &[SchedulerKey],
    ) -> RepositoryResult<Vec<(SchedulerId, bool)>> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();

        for key in keys {
            data.require_program(&key.program_code)?;
            if !data.courses.contains_key(&key.course_code) {
                return Err(RepositoryError::not_found(format!(
                    "Course {} not found",
                    key.course_code
                )));
            }
            if !data.schedules.contains_key(&key.schedule_id) {
                return Err(RepositoryError::not_found(format!(
                    "Schedule {} not found",
                    key.schedule_id
                )));
            }
        }

        let mut result = Vec::with_capacity(keys.len());
        for key in keys {
            match data.scheduler_keys.get(key) {
                Some(id) => result.push((*id, false)),
                None => {
                    let id = SchedulerId::generate();
                    data.scheduler_keys.insert(key.clone(), id);
                    data.schedulers.insert(
                        id,
                        SchedulerRow {
                            key: key.clone(),
                            linked: None,
                        },
                    );
                    result.push((id, true));
                }
            }
        }
        Ok(result)
    }

    async fn attach_scheduler_profiles(
        &self,
        links: &[(SchedulerId, String)],
    ) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        for (id, profile) in links {
            data.require_scheduler(*id)?;
            data.require_profile(profile)?;
        }
        let mut added = 0;
        for (id, profile) in links {
            if data
                .scheduler_profiles
                .entry(*id)
                .or_default()
                .insert(profile.clone())
            {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn get_scheduler(&self, scheduler_id: SchedulerId) -> RepositoryResult<Scheduler> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        data.materialize(scheduler_id)
    }

    async fn list_schedulers(&self, filter: &SchedulerFilter) -> RepositoryResult<Vec<Scheduler>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        let mut rows = Vec::new();
        for id in data.schedulers.keys() {
            let row = data.materialize(*id)?;
            if filter.matches(&row) {
                rows.push(row);
            }
        }
        sort_schedulers(&mut rows);
        Ok(rows)
    }

    async fn link_schedulers(
        &self,
        first: SchedulerId,
        second: SchedulerId,
    ) -> RepositoryResult<()> {
        self.check_health()?;
        if first == second {
            return Err(RepositoryError::validation_with_context(
                "A scheduler cannot be linked to itself",
                ErrorContext::new("link_schedulers")
                    .with_entity("scheduler")
                    .with_entity_id(first),
            ));
        }

        let mut data = self.data.write().unwrap();
        data.require_scheduler(first)?;
        data.require_scheduler(second)?;

        data.unlink(first);
        data.unlink(second);
        if let Some(row) = data.schedulers.get_mut(&first) {
            row.linked = Some(second);
        }
        if let Some(row) = data.schedulers.get_mut(&second) {
            row.linked = Some(first);
        }
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for LocalRepository {
    async fn create_account(&self, account: &NewAccount) -> RepositoryResult<Account> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        if data.accounts.contains_key(&account.username) {
            return Err(RepositoryError::conflict_with_context(
                format!("Username {} is already taken", account.username),
                ErrorContext::new("create_account")
                    .with_entity("account")
                    .with_entity_id(&account.username),
            ));
        }

        let account_id = AccountId::new(data.next_account_id);
        data.next_account_id += 1;

        let stored = Account {
            account_id,
            username: account.username.clone(),
            email: account.email.clone(),
            program_code: None,
            created_at: Utc::now(),
        };
        data.accounts.insert(
            account.username.clone(),
            StoredAccount {
                account: stored.clone(),
                password_digest: account.password_digest.clone(),
            },
        );
        Ok(stored)
    }

    async fn get_account(&self, username: &str) -> RepositoryResult<Account> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(data.account(username)?.account.clone())
    }

    async fn set_account_program(
        &self,
        username: &str,
        program_code: &str,
    ) -> RepositoryResult<Account> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        data.account(username)?;
        data.require_program(program_code)?;

        let stored = data
            .accounts
            .get_mut(username)
            .ok_or_else(|| RepositoryError::not_found(format!("Account {} not found", username)))?;
        stored.account.program_code = Some(program_code.to_string());
        Ok(stored.account.clone())
    }

    async fn add_choices(
        &self,
        account_id: AccountId,
        scheduler_ids: &[SchedulerId],
    ) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        if !data.account_exists(account_id) {
            return Err(RepositoryError::not_found(format!(
                "Account {} not found",
                account_id
            )));
        }
        for id in scheduler_ids {
            data.require_scheduler(*id)?;
        }

        let chosen = data.choices.entry(account_id).or_default();
        Ok(scheduler_ids
            .iter()
            .filter(|id| chosen.insert(**id))
            .count())
    }

    async fn remove_choices(
        &self,
        account_id: AccountId,
        scheduler_ids: &[SchedulerId],
    ) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        let Some(chosen) = data.choices.get_mut(&account_id) else {
            return Ok(0);
        };
        Ok(scheduler_ids
            .iter()
            .filter(|id| chosen.remove(*id))
            .count())
    }

    async fn list_choices(&self, account_id: AccountId) -> RepositoryResult<Vec<Scheduler>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        let mut rows = match data.choices.get(&account_id) {
            Some(ids) => ids
                .iter()
                .map(|id| data.materialize(*id))
                .collect::<RepositoryResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        sort_schedulers(&mut rows);
        Ok(rows)
    }
}
