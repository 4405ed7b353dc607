//! Bulk loading through the public service API.

mod support;

use master_planner::api::{LoadBatch, ProfileRecord, ProgramRecord};
use master_planner::db::repositories::LocalRepository;
use master_planner::db::repository::{PlanningRepository, RepositoryError};
use master_planner::db::services::list_term_courses;
use master_planner::models::SchedulerFilter;
use master_planner::services::{load_batch, register_courses, register_profiles, register_programs};

use support::{course, profile, program};

fn programs() -> Vec<ProgramRecord> {
    vec![
        program("6CMJU", "Computer Science and Engineering"),
        program("6CDDD", "Computer Engineering"),
    ]
}

fn profiles() -> Vec<ProfileRecord> {
    vec![
        profile("AIML", "AI and Machine Learning", "6CMJU"),
        profile("SEC", "Secure Systems", "6CMJU"),
        profile("AIML", "AI and Machine Learning", "6CDDD"),
    ]
}

fn catalog() -> LoadBatch {
    LoadBatch {
        programs: programs(),
        profiles: profiles(),
        courses: vec![
            course("6CMJU", "TDDE01", "6", "A1X", "7.1.2", "AIML"),
            course("6CMJU", "TDDE01", "6", "A1X", "7.1.2", "SEC"),
            course("6CDDD", "TDDE01", "6", "A1X", "7.1.2", "AIML"),
            course("6CMJU", "TDDD92", "8*", "A1X", "7.1.3", "AIML"),
            course("6CMJU", "TDDD92", "8*", "A1X", "7.2.3", "AIML"),
            course("6CMJU", "TSIT02", "6", "A1X", "8.1.1", "SEC"),
            course("6CMJU", "TATA24", "6", "G1X", "8.2.4", "SEC"),
        ],
    }
}

#[tokio::test]
async fn test_full_batch_report() {
    let repo = LocalRepository::new();
    let report = load_batch(&repo, &catalog()).await.unwrap();

    assert_eq!(report.programs, 2);
    assert_eq!(report.profiles, 2);
    assert_eq!(report.profile_links, 3);
    assert_eq!(report.courses, 4);
    assert_eq!(report.schedules, 5);
    // TDDE01 shares one row between AIML and SEC in 6CMJU
    assert_eq!(report.schedulers_created, 6);
    assert_eq!(report.schedulers_reused, 0);
    assert_eq!(report.profile_assignments, 7);
    assert_eq!(report.linked_pairs, 1);
    assert_eq!(repo.program_count(), 2);
}

#[tokio::test]
async fn test_same_course_in_two_programs_gets_two_rows() {
    let repo = LocalRepository::new();
    load_batch(&repo, &catalog()).await.unwrap();

    let rows = repo
        .list_schedulers(&SchedulerFilter::new().course("TDDE01"))
        .await
        .unwrap();
    let programs: Vec<_> = rows.iter().map(|r| r.program_code.as_str()).collect();
    assert_eq!(programs.len(), 2);
    assert!(programs.contains(&"6CMJU") && programs.contains(&"6CDDD"));
}

#[tokio::test]
async fn test_reloading_is_stable() {
    let repo = LocalRepository::new();
    load_batch(&repo, &catalog()).await.unwrap();
    let before = repo.list_schedulers(&SchedulerFilter::new()).await.unwrap();

    let report = load_batch(&repo, &catalog()).await.unwrap();
    let after = repo.list_schedulers(&SchedulerFilter::new()).await.unwrap();

    assert_eq!(report.schedulers_created, 0);
    assert_eq!(report.profile_links, 0);
    assert_eq!(report.profile_assignments, 0);
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_incremental_steps() {
    let repo = LocalRepository::new();
    assert_eq!(register_programs(&repo, &programs()).await.unwrap(), 2);
    assert_eq!(register_profiles(&repo, &profiles()).await.unwrap(), (2, 3));

    let report = register_courses(
        &repo,
        &[course("6CMJU", "TSIT02", "6", "A1X", "8.1.1", "SEC")],
    )
    .await
    .unwrap();
    assert_eq!(report.schedulers_created, 1);
    assert_eq!(report.programs, 0);
}

#[tokio::test]
async fn test_courses_before_programs_fail() {
    let repo = LocalRepository::new();
    let err = register_courses(
        &repo,
        &[course("6CMJU", "TSIT02", "6", "A1X", "8.1.1", "SEC")],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_term_courses_after_load() {
    let repo = LocalRepository::new();
    load_batch(&repo, &catalog()).await.unwrap();

    let term = list_term_courses(&repo, "6CMJU", "AIML", 7).await.unwrap();
    let first: Vec<_> = term.period_1.iter().map(|s| s.course.code.as_str()).collect();
    let second: Vec<_> = term.period_2.iter().map(|s| s.course.code.as_str()).collect();
    assert_eq!(first, vec!["TDDE01", "TDDD92"]);
    assert_eq!(second, vec!["TDDD92"]);
    assert_eq!(term.period_2[0].linked, Some(term.period_1[1].scheduler_id));

    let sec = list_term_courses(&repo, "6CMJU", "SEC", 8).await.unwrap();
    assert_eq!(sec.period_1.len(), 1);
    assert_eq!(sec.period_2.len(), 1);
}
