//! Course choices of a student account.
//!
//! Split courses are stored as two linked Scheduler rows. A student always
//! takes both halves, so adding or removing one side of a pair applies to the
//! other side as well.

use log::info;
use serde::{Deserialize, Serialize};

use crate::api::SchedulerId;
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::db::services::get_scheduler;
use crate::models::Scheduler;

/// Outcome of a choice change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceChange {
    /// Requested row followed by its linked pair, if any
    pub scheduler_ids: Vec<SchedulerId>,
    /// Number of stored choices that actually changed
    pub changed: usize,
    pub message: String,
}

fn affected_ids(scheduler: &Scheduler) -> Vec<SchedulerId> {
    std::iter::once(scheduler.scheduler_id)
        .chain(scheduler.linked)
        .collect()
}

fn describe(ids: &[SchedulerId], verb: &str, username: &str) -> String {
    let rows = ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" and ");
    format!("choice: {} has been {} account: {}", rows, verb, username)
}

/// Add a Scheduler row (and its linked pair) to the account's choices.
///
/// # Returns
/// * `Err(RepositoryError::NotFound)` - If the account or row doesn't exist
pub async fn add_choice<R: FullRepository + ?Sized>(
    repo: &R,
    username: &str,
    scheduler_id: SchedulerId,
) -> RepositoryResult<ChoiceChange> {
    let account = repo.get_account(username).await?;
    let scheduler = get_scheduler(repo, scheduler_id).await?;

    let ids = affected_ids(&scheduler);
    let changed = repo.add_choices(account.account_id, &ids).await?;
    let message = describe(&ids, "added to", username);
    info!("{} ({} new)", message, changed);

    Ok(ChoiceChange {
        scheduler_ids: ids,
        changed,
        message,
    })
}

/// Remove a Scheduler row (and its linked pair) from the account's choices.
pub async fn remove_choice<R: FullRepository + ?Sized>(
    repo: &R,
    username: &str,
    scheduler_id: SchedulerId,
) -> RepositoryResult<ChoiceChange> {
    let account = repo.get_account(username).await?;
    let scheduler = get_scheduler(repo, scheduler_id).await?;

    let ids = affected_ids(&scheduler);
    let changed = repo.remove_choices(account.account_id, &ids).await?;
    let message = describe(&ids, "removed from", username);
    info!("{} ({} removed)", message, changed);

    Ok(ChoiceChange {
        scheduler_ids: ids,
        changed,
        message,
    })
}

/// The account's chosen rows, ordered by schedule then course.
pub async fn list_choices<R: FullRepository + ?Sized>(
    repo: &R,
    username: &str,
) -> RepositoryResult<Vec<Scheduler>> {
    let account = repo.get_account(username).await?;
    repo.list_choices(account.account_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{
        AccountRepository, CatalogRepository, PlanningRepository, RepositoryError,
    };
    use crate::models::{Course, NewAccount, Program, Schedule, SchedulerKey};

    async fn seeded() -> (LocalRepository, SchedulerId, SchedulerId, SchedulerId) {
        let repo = LocalRepository::new();
        repo.upsert_programs(&[Program {
            code: "6CMJU".to_string(),
            name: "Computer Science".to_string(),
        }])
        .await
        .unwrap();
        let course = |code: &str, credits: &str| Course {
            code: code.to_string(),
            name: code.to_string(),
            credits: credits.to_string(),
            level: "A1X".to_string(),
            status: "v".to_string(),
            campus: None,
            examiner: None,
            main_fields: vec![],
        };
        repo.upsert_courses(&[course("TDDD92", "8*"), course("TDDE01", "6")])
            .await
            .unwrap();
        repo.upsert_schedules(&[Schedule::new(7, 1, "3"), Schedule::new(7, 2, "3")])
            .await
            .unwrap();
        let ids = repo
            .ensure_schedulers(&[
                SchedulerKey::new("6CMJU", "TDDD92", "7.1.3"),
                SchedulerKey::new("6CMJU", "TDDD92", "7.2.3"),
                SchedulerKey::new("6CMJU", "TDDE01", "7.1.3"),
            ])
            .await
            .unwrap();
        repo.link_schedulers(ids[0].0, ids[1].0).await.unwrap();
        repo.create_account(&NewAccount {
            username: "student".to_string(),
            email: "student@example.edu".to_string(),
            password_digest: "salt$digest".to_string(),
        })
        .await
        .unwrap();
        (repo, ids[0].0, ids[1].0, ids[2].0)
    }

    #[tokio::test]
    async fn test_add_linked_choice_adds_both_halves() {
        let (repo, first, second, _) = seeded().await;

        let change = add_choice(&repo, "student", second).await.unwrap();
        assert_eq!(change.scheduler_ids, vec![second, first]);
        assert_eq!(change.changed, 2);
        assert_eq!(
            change.message,
            format!(
                "choice: {} and {} has been added to account: student",
                second, first
            )
        );

        let chosen: Vec<_> = list_choices(&repo, "student")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.scheduler_id)
            .collect();
        assert_eq!(chosen, vec![first, second]);
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let (repo, _, _, single) = seeded().await;

        let first = add_choice(&repo, "student", single).await.unwrap();
        let again = add_choice(&repo, "student", single).await.unwrap();
        assert_eq!(first.changed, 1);
        assert_eq!(again.changed, 0);
        assert_eq!(
            again.message,
            format!("choice: {} has been added to account: student", single)
        );
        assert_eq!(list_choices(&repo, "student").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_restores_previous_choices() {
        let (repo, first, _, single) = seeded().await;
        add_choice(&repo, "student", single).await.unwrap();

        add_choice(&repo, "student", first).await.unwrap();
        let change = remove_choice(&repo, "student", first).await.unwrap();
        assert_eq!(change.changed, 2);
        assert!(change.message.contains("has been removed from account: student"));

        let chosen: Vec<_> = list_choices(&repo, "student")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.scheduler_id)
            .collect();
        assert_eq!(chosen, vec![single]);
    }

    #[tokio::test]
    async fn test_unknown_row_is_described() {
        let (repo, _, _, _) = seeded().await;
        let missing = SchedulerId::generate();

        let err = add_choice(&repo, "student", missing).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
        assert_eq!(
            err.message(),
            format!("Could not find scheduler object: {} in scheduler table", missing)
        );
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let (repo, first, _, _) = seeded().await;
        let err = remove_choice(&repo, "nobody", first).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
