//! Bulk loader for scraped catalog data.
//!
//! A [`LoadBatch`] carries the rows produced by the course scraper: programs,
//! profiles and one [`CourseRecord`] per (program, profile, course, slot)
//! occurrence. The same course usually appears once per profile that offers
//! it, so the loader collapses records onto the `(program, course, schedule)`
//! key before creating Scheduler rows and then attaches every profile to the
//! single row.
//!
//! Courses whose credits carry the partial-credit marker run over both
//! periods of a semester, and each period-2 half is linked to its period-1
//! half. The links are resolved from the batch and the stored rows before
//! anything is written, so a batch that cannot be linked leaves the catalog
//! as it was.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::api::SchedulerId;
use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::models::{
    is_partial_credit, CreditHours, Course, Profile, Program, Schedule, SchedulerFilter,
    SchedulerKey, PERIODS, SEMESTERS,
};

/// A study program row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRecord {
    #[serde(alias = "program_code")]
    pub code: String,
    #[serde(alias = "program_name")]
    pub name: String,
}

/// A profile row; the same profile may be listed under several programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(alias = "profile_name")]
    pub name: String,
    #[serde(alias = "profile_code")]
    pub code: String,
    pub program_code: String,
}

/// One course occurrence as scraped from a program's course list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub program_code: String,
    pub course_code: String,
    pub course_name: String,
    #[serde(alias = "hp")]
    pub credits: String,
    pub level: String,
    #[serde(alias = "vof")]
    pub status: String,
    pub semester: i16,
    pub period: i16,
    pub block: String,
    pub profile_code: String,
}

impl CourseRecord {
    fn schedule_id(&self) -> String {
        crate::models::schedule_id(self.semester, self.period, &self.block)
    }

    fn key(&self) -> SchedulerKey {
        SchedulerKey::new(
            self.program_code.clone(),
            self.course_code.clone(),
            self.schedule_id(),
        )
    }
}

/// Input of [`load_batch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBatch {
    #[serde(default)]
    pub programs: Vec<ProgramRecord>,
    #[serde(default)]
    pub profiles: Vec<ProfileRecord>,
    #[serde(default)]
    pub courses: Vec<CourseRecord>,
}

/// Counts reported after a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub programs: usize,
    pub profiles: usize,
    /// New program to profile associations
    pub profile_links: usize,
    /// Distinct courses written
    pub courses: usize,
    /// Distinct schedule slots referenced
    pub schedules: usize,
    pub schedulers_created: usize,
    pub schedulers_reused: usize,
    /// New Scheduler to profile associations
    pub profile_assignments: usize,
    /// Split-course pairs linked by this load
    pub linked_pairs: usize,
}

fn require_text(value: &str, field: &str, row: usize, op: &str) -> RepositoryResult<()> {
    if value.trim().is_empty() {
        return Err(RepositoryError::validation_with_context(
            format!("Row {}: {} must not be empty", row, field),
            ErrorContext::new(op).with_details(format!("field={}", field)),
        ));
    }
    Ok(())
}

/// Upsert programs by code.
pub async fn register_programs<R: FullRepository + ?Sized>(
    repo: &R,
    programs: &[ProgramRecord],
) -> RepositoryResult<usize> {
    for (i, p) in programs.iter().enumerate() {
        require_text(&p.code, "program code", i + 1, "register_programs")?;
    }

    let distinct: BTreeMap<&str, Program> = programs
        .iter()
        .map(|p| {
            (
                p.code.as_str(),
                Program {
                    code: p.code.clone(),
                    name: p.name.clone(),
                },
            )
        })
        .collect();
    let rows: Vec<Program> = distinct.into_values().collect();

    repo.upsert_programs(&rows).await?;
    info!("Registered {} programs", rows.len());
    Ok(rows.len())
}

/// Upsert profiles and link them to their programs.
///
/// # Returns
/// * `Ok((profiles, new_links))`
/// * `Err(RepositoryError::NotFound)` - If a referenced program doesn't exist
pub async fn register_profiles<R: FullRepository + ?Sized>(
    repo: &R,
    profiles: &[ProfileRecord],
) -> RepositoryResult<(usize, usize)> {
    for (i, p) in profiles.iter().enumerate() {
        require_text(&p.code, "profile code", i + 1, "register_profiles")?;
        require_text(&p.program_code, "program code", i + 1, "register_profiles")?;
    }

    let distinct: BTreeMap<&str, Profile> = profiles
        .iter()
        .map(|p| {
            (
                p.code.as_str(),
                Profile {
                    code: p.code.clone(),
                    name: p.name.clone(),
                },
            )
        })
        .collect();
    let rows: Vec<Profile> = distinct.into_values().collect();
    repo.upsert_profiles(&rows).await?;

    let links: Vec<(String, String)> = profiles
        .iter()
        .map(|p| (p.program_code.clone(), p.code.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let added = repo.link_program_profiles(&links).await?;

    info!(
        "Registered {} profiles ({} new program links)",
        rows.len(),
        added
    );
    Ok((rows.len(), added))
}

fn validate_course_record(record: &CourseRecord, row: usize) -> RepositoryResult<()> {
    const OP: &str = "register_courses";
    require_text(&record.program_code, "program code", row, OP)?;
    require_text(&record.course_code, "course code", row, OP)?;
    require_text(&record.profile_code, "profile code", row, OP)?;
    require_text(&record.block, "block", row, OP)?;

    let context = || {
        ErrorContext::new(OP)
            .with_entity("course")
            .with_entity_id(&record.course_code)
    };

    if let Err(e) = CreditHours::parse(&record.credits) {
        return Err(RepositoryError::validation_with_context(
            format!("Row {} ({}): {}", row, record.course_code, e),
            context(),
        ));
    }
    if !SEMESTERS.contains(&record.semester) {
        return Err(RepositoryError::validation_with_context(
            format!(
                "Row {} ({}): semester {} outside {}..={}",
                row,
                record.course_code,
                record.semester,
                SEMESTERS.start(),
                SEMESTERS.end()
            ),
            context(),
        ));
    }
    if !PERIODS.contains(&record.period) {
        return Err(RepositoryError::validation_with_context(
            format!(
                "Row {} ({}): period {} outside {}..={}",
                row,
                record.course_code,
                record.period,
                PERIODS.start(),
                PERIODS.end()
            ),
            context(),
        ));
    }
    Ok(())
}

/// One half of a split course inside a (program, course, semester) group.
#[derive(Debug, Clone)]
struct SplitHalf {
    key: SchedulerKey,
    block: String,
    /// Row already stored under `key`
    existing: Option<SchedulerId>,
    /// Schedule id of the half this one is currently linked to
    partner: Option<String>,
}

#[derive(Debug, Default)]
struct SplitGroup {
    firsts: BTreeMap<String, SplitHalf>,
    seconds: BTreeMap<String, SplitHalf>,
}

/// A period-1/period-2 pairing decided before the load writes anything.
#[derive(Debug)]
struct PlannedLink {
    first: SplitHalf,
    second: SplitHalf,
}

impl PlannedLink {
    fn is_current(&self) -> bool {
        self.first.partner.as_deref() == Some(self.second.key.schedule_id.as_str())
            && self.second.partner.as_deref() == Some(self.first.key.schedule_id.as_str())
    }
}

fn split_context(half: &SplitHalf) -> ErrorContext {
    ErrorContext::new("plan_split_links")
        .with_entity("scheduler")
        .with_entity_id(&half.key.schedule_id)
}

/// Pair every period-2 half of a group with a period-1 half.
///
/// Halves are visited in schedule id order. Existing links are kept first,
/// then halves sharing a block are paired, and a period-2 half left over
/// takes the only unclaimed period-1 half.
fn resolve_group(group: &SplitGroup, semester: i16) -> RepositoryResult<Vec<PlannedLink>> {
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut pairs: BTreeMap<&str, &SplitHalf> = BTreeMap::new();

    for (id, second) in &group.seconds {
        let partner = second.partner.as_deref().and_then(|p| group.firsts.get(p));
        if let Some(first) = partner {
            if claimed.insert(first.key.schedule_id.as_str()) {
                pairs.insert(id.as_str(), first);
            }
        }
    }

    for (id, second) in &group.seconds {
        if pairs.contains_key(id.as_str()) {
            continue;
        }
        let same_block = group
            .firsts
            .values()
            .find(|f| f.block == second.block && !claimed.contains(f.key.schedule_id.as_str()));
        if let Some(first) = same_block {
            claimed.insert(first.key.schedule_id.as_str());
            pairs.insert(id.as_str(), first);
        }
    }

    for (id, second) in &group.seconds {
        if pairs.contains_key(id.as_str()) {
            continue;
        }
        let open: Vec<&SplitHalf> = group
            .firsts
            .values()
            .filter(|f| !claimed.contains(f.key.schedule_id.as_str()))
            .collect();
        match open.as_slice() {
            [] => {
                return Err(RepositoryError::not_found_with_context(
                    format!(
                        "No period 1 counterpart for split course {} in program {} semester {}",
                        second.key.course_code, second.key.program_code, semester
                    ),
                    split_context(second),
                ))
            }
            [only] => {
                claimed.insert(only.key.schedule_id.as_str());
                pairs.insert(id.as_str(), *only);
            }
            many => {
                return Err(RepositoryError::validation_with_context(
                    format!(
                        "Ambiguous period 1 counterpart for split course {} in program {} semester {}: {} candidates",
                        second.key.course_code,
                        second.key.program_code,
                        semester,
                        many.len()
                    ),
                    split_context(second),
                ))
            }
        }
    }

    Ok(group
        .seconds
        .iter()
        .filter_map(|(id, second)| {
            pairs.get(id.as_str()).map(|first| PlannedLink {
                first: (*first).clone(),
                second: second.clone(),
            })
        })
        .collect())
}

/// Decide the split-course links of `records` from the batch and the stored rows.
///
/// Only reads the repository, so a batch that cannot be linked fails before
/// any row is written.
async fn plan_split_links<R: FullRepository + ?Sized>(
    repo: &R,
    records: &[CourseRecord],
    partial_courses: &HashSet<String>,
) -> RepositoryResult<Vec<PlannedLink>> {
    let mut groups: BTreeMap<(String, String, i16), SplitGroup> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| partial_courses.contains(&r.course_code))
    {
        let group = groups
            .entry((
                record.program_code.clone(),
                record.course_code.clone(),
                record.semester,
            ))
            .or_default();
        let half = SplitHalf {
            key: record.key(),
            block: record.block.clone(),
            existing: None,
            partner: None,
        };
        let side = if record.period == 1 {
            &mut group.firsts
        } else {
            &mut group.seconds
        };
        side.entry(half.key.schedule_id.clone()).or_insert(half);
    }
    groups.retain(|_, group| !group.seconds.is_empty());

    let mut planned = Vec::new();
    for ((program, course, semester), mut group) in groups {
        let stored = repo
            .list_schedulers(
                &SchedulerFilter::new()
                    .program(&program)
                    .course(&course)
                    .semester(semester),
            )
            .await?;
        let schedule_of: HashMap<SchedulerId, &str> = stored
            .iter()
            .map(|s| (s.scheduler_id, s.schedule.id.as_str()))
            .collect();

        for row in &stored {
            let partner = row
                .linked
                .and_then(|id| schedule_of.get(&id))
                .map(|id| id.to_string());
            let side = if row.schedule.period == 1 {
                &mut group.firsts
            } else {
                &mut group.seconds
            };
            match side.get_mut(&row.schedule.id) {
                Some(half) => {
                    half.existing = Some(row.scheduler_id);
                    half.partner = partner;
                }
                None if row.schedule.period == 1 => {
                    side.insert(
                        row.schedule.id.clone(),
                        SplitHalf {
                            key: row.key(),
                            block: row.schedule.block.clone(),
                            existing: Some(row.scheduler_id),
                            partner,
                        },
                    );
                }
                None => {}
            }
        }

        planned.extend(resolve_group(&group, semester)?);
    }
    Ok(planned)
}

/// Load course records: courses, schedules, Scheduler rows, profiles and links.
///
/// Programs and profiles must already be registered.
pub async fn register_courses<R: FullRepository + ?Sized>(
    repo: &R,
    records: &[CourseRecord],
) -> RepositoryResult<LoadReport> {
    for (i, record) in records.iter().enumerate() {
        validate_course_record(record, i + 1)?;
    }

    let programs: BTreeSet<&str> = records.iter().map(|r| r.program_code.as_str()).collect();
    for code in programs {
        repo.get_program(code).await?;
    }
    let profiles: BTreeSet<&str> = records.iter().map(|r| r.profile_code.as_str()).collect();
    for code in profiles {
        repo.get_profile(code).await?;
    }

    let mut courses: BTreeMap<&str, Course> = BTreeMap::new();
    let mut schedules: BTreeMap<String, Schedule> = BTreeMap::new();
    for record in records {
        let course = Course {
            code: record.course_code.clone(),
            name: record.course_name.clone(),
            credits: record.credits.trim().to_string(),
            level: record.level.clone(),
            status: record.status.clone(),
            campus: None,
            examiner: None,
            main_fields: Vec::new(),
        };
        if let Some(previous) = courses.insert(record.course_code.as_str(), course) {
            if previous.credits != record.credits.trim() {
                warn!(
                    "Course {} listed with credits '{}' and '{}'; keeping the last",
                    record.course_code, previous.credits, record.credits
                );
            }
        }
        let schedule = Schedule::new(record.semester, record.period, record.block.clone());
        schedules.entry(schedule.id.clone()).or_insert(schedule);
    }

    let partial_courses: HashSet<String> = courses
        .values()
        .filter(|c| is_partial_credit(&c.credits))
        .map(|c| c.code.clone())
        .collect();

    let plan = plan_split_links(repo, records, &partial_courses).await?;

    let course_rows: Vec<Course> = courses.into_values().collect();
    let schedule_rows: Vec<Schedule> = schedules.into_values().collect();
    repo.upsert_courses(&course_rows).await?;
    repo.upsert_schedules(&schedule_rows).await?;

    let keys: Vec<SchedulerKey> = records
        .iter()
        .map(CourseRecord::key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let ensured = repo.ensure_schedulers(&keys).await?;
    let created = ensured.iter().filter(|(_, created)| *created).count();

    let ids: HashMap<SchedulerKey, SchedulerId> = keys
        .iter()
        .cloned()
        .zip(ensured.iter().map(|(id, _)| *id))
        .collect();

    let assignments: Vec<(SchedulerId, String)> = records
        .iter()
        .filter_map(|r| ids.get(&r.key()).map(|id| (*id, r.profile_code.clone())))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let profile_assignments = repo.attach_scheduler_profiles(&assignments).await?;

    let mut linked_pairs = 0;
    for link in &plan {
        if link.is_current() {
            debug!(
                "{} already linked to {}",
                link.second.key.schedule_id, link.first.key.schedule_id
            );
            continue;
        }
        let first = ids.get(&link.first.key).copied().or(link.first.existing);
        let second = ids.get(&link.second.key).copied().or(link.second.existing);
        let (Some(first), Some(second)) = (first, second) else {
            warn!(
                "No scheduler row for split course {} ({} / {}); not linked",
                link.second.key.course_code, link.first.key.schedule_id, link.second.key.schedule_id
            );
            continue;
        };
        repo.link_schedulers(first, second).await?;
        debug!(
            "Linked {} ({}) with {} ({})",
            first, link.first.key.schedule_id, second, link.second.key.schedule_id
        );
        linked_pairs += 1;
    }

    let report = LoadReport {
        courses: course_rows.len(),
        schedules: schedule_rows.len(),
        schedulers_created: created,
        schedulers_reused: keys.len() - created,
        profile_assignments,
        linked_pairs,
        ..Default::default()
    };
    info!(
        "Registered {} courses in {} slots: {} scheduler rows created, {} reused, {} pairs linked",
        report.courses,
        report.schedules,
        report.schedulers_created,
        report.schedulers_reused,
        report.linked_pairs
    );
    Ok(report)
}

/// Load a whole batch: programs, then profiles, then courses.
pub async fn load_batch<R: FullRepository + ?Sized>(
    repo: &R,
    batch: &LoadBatch,
) -> RepositoryResult<LoadReport> {
    info!(
        "Loading batch: {} programs, {} profiles, {} course records",
        batch.programs.len(),
        batch.profiles.len(),
        batch.courses.len()
    );

    let programs = register_programs(repo, &batch.programs).await?;
    let (profiles, profile_links) = register_profiles(repo, &batch.profiles).await?;
    let courses = register_courses(repo, &batch.courses).await?;

    Ok(LoadReport {
        programs,
        profiles,
        profile_links,
        ..courses
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{CatalogRepository, PlanningRepository};

    fn record(course: &str, credits: &str, period: i16, block: &str, profile: &str) -> CourseRecord {
        CourseRecord {
            program_code: "6CMJU".to_string(),
            course_code: course.to_string(),
            course_name: format!("Course {}", course),
            credits: credits.to_string(),
            level: "A1X".to_string(),
            status: "v".to_string(),
            semester: 7,
            period,
            block: block.to_string(),
            profile_code: profile.to_string(),
        }
    }

    fn batch(courses: Vec<CourseRecord>) -> LoadBatch {
        LoadBatch {
            programs: vec![ProgramRecord {
                code: "6CMJU".to_string(),
                name: "Computer Science".to_string(),
            }],
            profiles: vec![
                ProfileRecord {
                    name: "AI and Machine Learning".to_string(),
                    code: "AIML".to_string(),
                    program_code: "6CMJU".to_string(),
                },
                ProfileRecord {
                    name: "Free choice".to_string(),
                    code: "free".to_string(),
                    program_code: "6CMJU".to_string(),
                },
            ],
            courses,
        }
    }

    #[tokio::test]
    async fn test_profiles_collapse_onto_one_row() {
        let repo = LocalRepository::new();
        let report = load_batch(
            &repo,
            &batch(vec![
                record("TDDE01", "6", 1, "2", "AIML"),
                record("TDDE01", "6", 1, "2", "free"),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(report.schedulers_created, 1);
        assert_eq!(report.profile_assignments, 2);
        let rows = repo.list_schedulers(&SchedulerFilter::new()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].profiles, vec!["AIML".to_string(), "free".to_string()]);
    }

    #[tokio::test]
    async fn test_reload_reuses_rows() {
        let repo = LocalRepository::new();
        let input = batch(vec![
            record("TDDE01", "6", 1, "2", "AIML"),
            record("TDDD92", "8*", 1, "3", "AIML"),
            record("TDDD92", "8*", 2, "3", "AIML"),
        ]);

        let first = load_batch(&repo, &input).await.unwrap();
        let second = load_batch(&repo, &input).await.unwrap();

        assert_eq!(first.schedulers_created, 3);
        assert_eq!(first.linked_pairs, 1);
        assert_eq!(second.schedulers_created, 0);
        assert_eq!(second.schedulers_reused, 3);
        assert_eq!(second.linked_pairs, 0);
        assert_eq!(repo.scheduler_count(), 3);
    }

    #[tokio::test]
    async fn test_split_course_is_linked() {
        let repo = LocalRepository::new();
        load_batch(
            &repo,
            &batch(vec![
                record("TDDD92", "8*", 1, "3", "AIML"),
                record("TDDD92", "8*", 2, "1", "AIML"),
            ]),
        )
        .await
        .unwrap();

        let rows = repo
            .list_schedulers(&SchedulerFilter::new().course("TDDD92"))
            .await
            .unwrap();
        let first = rows.iter().find(|r| r.schedule.period == 1).unwrap();
        let second = rows.iter().find(|r| r.schedule.period == 2).unwrap();
        assert_eq!(first.linked, Some(second.scheduler_id));
        assert_eq!(second.linked, Some(first.scheduler_id));
    }

    #[tokio::test]
    async fn test_missing_counterpart_is_not_found() {
        let repo = LocalRepository::new();
        let result = load_batch(&repo, &batch(vec![record("TDDD92", "8*", 2, "1", "AIML")])).await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_ambiguous_counterpart_prefers_same_block() {
        let repo = LocalRepository::new();
        load_batch(
            &repo,
            &batch(vec![
                record("TDDD92", "8*", 1, "1", "AIML"),
                record("TDDD92", "8*", 1, "3", "AIML"),
                record("TDDD92", "8*", 2, "3", "AIML"),
            ]),
        )
        .await
        .unwrap();

        let second = repo
            .list_schedulers(&SchedulerFilter::new().course("TDDD92").period(2))
            .await
            .unwrap()
            .remove(0);
        let partner = repo.get_scheduler(second.linked.unwrap()).await.unwrap();
        assert_eq!(partner.schedule.id, "7.1.3");
    }

    #[tokio::test]
    async fn test_ambiguous_counterpart_without_block_match_fails() {
        let repo = LocalRepository::new();
        let result = load_batch(
            &repo,
            &batch(vec![
                record("TDDD92", "8*", 1, "1", "AIML"),
                record("TDDD92", "8*", 1, "2", "AIML"),
                record("TDDD92", "8*", 2, "4", "AIML"),
            ]),
        )
        .await;
        assert!(matches!(result, Err(RepositoryError::ValidationError { .. })));
    }

    async fn linked_slots(repo: &LocalRepository) -> Vec<(String, String)> {
        let seconds = repo
            .list_schedulers(&SchedulerFilter::new().period(2))
            .await
            .unwrap();
        let mut pairs = Vec::new();
        for second in seconds {
            let first = repo.get_scheduler(second.linked.unwrap()).await.unwrap();
            assert_eq!(first.linked, Some(second.scheduler_id));
            pairs.push((second.schedule.id, first.schedule.id));
        }
        pairs.sort();
        pairs
    }

    #[tokio::test]
    async fn test_split_links_do_not_depend_on_record_order() {
        let records = vec![
            record("TDDD92", "8*", 1, "3", "AIML"),
            record("TDDD92", "8*", 1, "1", "AIML"),
            record("TDDD92", "8*", 2, "3", "AIML"),
            record("TDDD92", "8*", 2, "4", "AIML"),
        ];
        let expected = vec![
            ("7.2.3".to_string(), "7.1.3".to_string()),
            ("7.2.4".to_string(), "7.1.1".to_string()),
        ];

        for shift in 0..records.len() {
            let mut order = records.clone();
            order.rotate_left(shift);
            for order in [order.clone(), order.into_iter().rev().collect()] {
                for _ in 0..10 {
                    let repo = LocalRepository::new();
                    let report = load_batch(&repo, &batch(order.clone())).await.unwrap();
                    assert_eq!(report.linked_pairs, 2);
                    assert_eq!(linked_slots(&repo).await, expected);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_counterpart_from_earlier_load() {
        let repo = LocalRepository::new();
        load_batch(&repo, &batch(vec![record("TDDD92", "8*", 1, "3", "AIML")]))
            .await
            .unwrap();
        let report = load_batch(&repo, &batch(vec![record("TDDD92", "8*", 2, "2", "AIML")]))
            .await
            .unwrap();

        assert_eq!(report.linked_pairs, 1);
        assert_eq!(
            linked_slots(&repo).await,
            vec![("7.2.2".to_string(), "7.1.3".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unlinkable_batch_writes_nothing() {
        let repo = LocalRepository::new();
        load_batch(&repo, &batch(vec![record("TDDE01", "6", 1, "2", "AIML")]))
            .await
            .unwrap();
        let before = repo.scheduler_count();

        let result = load_batch(
            &repo,
            &batch(vec![
                record("TDDE02", "6", 1, "1", "AIML"),
                record("TDDD92", "8*", 2, "1", "AIML"),
            ]),
        )
        .await;

        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
        assert_eq!(repo.scheduler_count(), before);
        assert!(repo.get_course("TDDD92").await.is_err());
        assert!(repo.get_course("TDDE02").await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_rows_are_rejected() {
        let repo = LocalRepository::new();

        let mut bad_semester = record("TDDE01", "6", 1, "2", "AIML");
        bad_semester.semester = 6;
        let err = load_batch(&repo, &batch(vec![bad_semester])).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert!(err.message().starts_with("Row 1 (TDDE01)"));

        let bad_credits = record("TDDE01", "six", 1, "2", "AIML");
        let err = load_batch(&repo, &batch(vec![bad_credits])).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(repo.scheduler_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let repo = LocalRepository::new();
        let result = load_batch(&repo, &batch(vec![record("TDDE01", "6", 1, "2", "SEC")])).await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[test]
    fn test_batch_accepts_scraper_field_names() {
        let json = r#"{
            "programs": [{"program_code": "6CMJU", "program_name": "Computer Science"}],
            "courses": [{
                "program_code": "6CMJU", "course_code": "TDDE01", "course_name": "ML",
                "hp": "6", "level": "A1X", "vof": "v",
                "semester": 7, "period": 1, "block": "2", "profile_code": "free"
            }]
        }"#;
        let batch: LoadBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.programs[0].code, "6CMJU");
        assert_eq!(batch.courses[0].credits, "6");
        assert_eq!(batch.courses[0].status, "v");
        assert!(batch.profiles.is_empty());
    }
}
