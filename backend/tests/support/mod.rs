//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard};

use master_planner::api::{CourseRecord, ProfileRecord, ProgramRecord};

/// Variables `RepositoryType::from_env` looks at.
pub const REPOSITORY_VARS: [&str; 3] = ["REPOSITORY_TYPE", "DATABASE_URL", "PG_DATABASE_URL"];

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with the repository variables cleared, then `vars` set.
///
/// Callers are serialized on a process-wide lock and the previous values are
/// put back when `f` returns or panics.
pub fn with_repository_env<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _env = RepositoryEnv::enter(vars);
    f()
}

struct RepositoryEnv {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl RepositoryEnv {
    fn enter(vars: &[(&str, &str)]) -> Self {
        // a failed assertion in another test poisons the lock; the env is restored anyway
        let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let saved = REPOSITORY_VARS
            .iter()
            .map(|key| (*key, std::env::var(key).ok()))
            .collect();

        for key in REPOSITORY_VARS {
            std::env::remove_var(key);
        }
        for (key, value) in vars {
            assert!(
                REPOSITORY_VARS.contains(key),
                "{} is not a repository variable",
                key
            );
            std::env::set_var(key, value);
        }

        Self { saved, _lock: lock }
    }
}

impl Drop for RepositoryEnv {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

pub fn program(code: &str, name: &str) -> ProgramRecord {
    ProgramRecord {
        code: code.to_string(),
        name: name.to_string(),
    }
}

pub fn profile(code: &str, name: &str, program_code: &str) -> ProfileRecord {
    ProfileRecord {
        name: name.to_string(),
        code: code.to_string(),
        program_code: program_code.to_string(),
    }
}

/// A course occurrence in `slot`, written `semester.period.block` like a
/// schedule id.
pub fn course(
    program_code: &str,
    code: &str,
    credits: &str,
    level: &str,
    slot: &str,
    profile_code: &str,
) -> CourseRecord {
    let mut parts = slot.splitn(3, '.');
    let mut number = || -> i16 {
        parts
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or_else(|| panic!("bad slot {}", slot))
    };
    let semester = number();
    let period = number();
    let block = parts.next().unwrap_or_else(|| panic!("bad slot {}", slot));

    CourseRecord {
        program_code: program_code.to_string(),
        course_code: code.to_string(),
        course_name: format!("Course {}", code),
        credits: credits.to_string(),
        level: level.to_string(),
        status: "v".to_string(),
        semester,
        period,
        block: block.to_string(),
        profile_code: profile_code.to_string(),
    }
}
