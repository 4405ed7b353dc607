//! Credit aggregation over a student's choices.
//!
//! Totals are computed per (semester, period), summed per semester and over
//! the whole plan. Each one is paired with the requirement configured for
//! that slot, including its level minimums.
//! Split courses count half of their credits in each period they occupy.

use serde::{Deserialize, Serialize};

use crate::config::{CreditRequirements, LevelRequirement};
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::models::{credit_contribution, LevelCategory, Scheduler, PERIODS, SEMESTERS};

/// A credit total split by level, paired with its requirement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditTally {
    pub total: f64,
    /// Advanced-level credits
    pub a_level: f64,
    /// Basic-level credits
    pub g_level: f64,
    pub required: LevelRequirement,
    pub met: bool,
}

impl CreditTally {
    fn add_course(&mut self, scheduler: &Scheduler) {
        let credits = credit_contribution(&scheduler.course.credits);
        self.total += credits;
        match scheduler.course.level_category() {
            LevelCategory::Advanced => self.a_level += credits,
            LevelCategory::Basic => self.g_level += credits,
            LevelCategory::Other => {}
        }
    }

    fn absorb(&mut self, other: &CreditTally) {
        self.total += other.total;
        self.a_level += other.a_level;
        self.g_level += other.g_level;
    }

    fn require(mut self, required: LevelRequirement) -> Self {
        self.met = required.is_met(self.total, self.a_level, self.g_level);
        self.required = required;
        self
    }
}

/// Chosen courses and credits of one study period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodPlan {
    pub period: i16,
    pub hp: CreditTally,
    pub courses: Vec<Scheduler>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterPlan {
    pub semester: i16,
    pub hp: CreditTally,
    pub periods: Vec<PeriodPlan>,
}

/// Plan-wide view returned for the "my choices" page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOverview {
    pub semesters: Vec<SemesterPlan>,
    pub hp: CreditTally,
}

/// Build the overview from a set of chosen rows.
///
/// Every semester and period is present even when nothing is chosen there.
/// Rows outside the planner's semesters or periods are ignored.
pub fn build_overview(choices: &[Scheduler], requirements: &CreditRequirements) -> PlanOverview {
    let mut overall = CreditTally::default();

    let semesters = SEMESTERS
        .map(|semester| {
            let mut semester_tally = CreditTally::default();

            let periods = PERIODS
                .map(|period| {
                    let courses: Vec<Scheduler> = choices
                        .iter()
                        .filter(|s| s.schedule.semester == semester && s.schedule.period == period)
                        .cloned()
                        .collect();

                    let mut tally = CreditTally::default();
                    for scheduler in &courses {
                        tally.add_course(scheduler);
                    }
                    semester_tally.absorb(&tally);

                    PeriodPlan {
                        period,
                        hp: tally.require(requirements.for_period(semester, period)),
                        courses,
                    }
                })
                .collect();

            overall.absorb(&semester_tally);
            SemesterPlan {
                semester,
                hp: semester_tally.require(requirements.for_semester(semester)),
                periods,
            }
        })
        .collect();

    PlanOverview {
        semesters,
        hp: overall.require(requirements.overall.clone()),
    }
}

/// Aggregate the account's choices against `requirements`.
///
/// # Returns
/// * `Err(RepositoryError::NotFound)` - If the account doesn't exist
pub async fn summarize_choices<R: FullRepository + ?Sized>(
    repo: &R,
    username: &str,
    requirements: &CreditRequirements,
) -> RepositoryResult<PlanOverview> {
    let account = repo.get_account(username).await?;
    let choices = repo.list_choices(account.account_id).await?;
    log::debug!("Summarizing {} choices for {}", choices.len(), username);
    Ok(build_overview(&choices, requirements))
}
