//! Planner configuration file support.
//!
//! Reads `planner.toml`, which holds the program credit requirements used by
//! the aggregation service and the settings of the course-info collaborator.
//!
//! Requirements have a default for every period, every semester and the
//! whole plan. Overrides replace parts of the default for one semester, or
//! for one period of it when `period` is given.
//!
//! ```toml
//! [requirements.overall]
//! total = 90.0
//! a_level = 60.0
//!
//! [requirements.semester]
//! total = 30.0
//!
//! [requirements.period]
//! total = 15.0
//!
//! [[requirements.overrides]]
//! semester = 9
//! a_level = 30.0
//!
//! [[requirements.overrides]]
//! semester = 7
//! period = 1
//! total = 16.0
//! g_level = 6.0
//!
//! [course_info]
//! base_url = "https://courses.example.edu/api/courses"
//! timeout_sec = 10
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::repository::RepositoryError;

/// Top-level planner configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub requirements: CreditRequirements,
    #[serde(default)]
    pub course_info: CourseInfoSettings,
}

/// Credits one tally must reach. Level minimums are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelRequirement {
    #[serde(default)]
    pub total: f64,
    /// Minimum advanced-level credits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_level: Option<f64>,
    /// Minimum basic-level credits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g_level: Option<f64>,
}

impl LevelRequirement {
    pub fn new(total: f64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn with_a_level(mut self, min: f64) -> Self {
        self.a_level = Some(min);
        self
    }

    pub fn with_g_level(mut self, min: f64) -> Self {
        self.g_level = Some(min);
        self
    }

    /// True when the total and every configured level minimum are reached.
    pub fn is_met(&self, total: f64, a_level: f64, g_level: f64) -> bool {
        total >= self.total
            && self.a_level.is_none_or(|min| a_level >= min)
            && self.g_level.is_none_or(|min| g_level >= min)
    }
}

/// Replaces parts of the default requirement of one semester, or of one
/// period when `period` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementOverride {
    pub semester: i16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<i16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g_level: Option<f64>,
}

/// Required credits by (semester, period), by semester and for the whole plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRequirements {
    #[serde(default = "default_overall")]
    pub overall: LevelRequirement,
    /// Default for every semester
    #[serde(default = "default_semester")]
    pub semester: LevelRequirement,
    /// Default for every study period
    #[serde(default = "default_period")]
    pub period: LevelRequirement,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<RequirementOverride>,
}

fn default_overall() -> LevelRequirement {
    LevelRequirement::new(90.0).with_a_level(60.0)
}

fn default_semester() -> LevelRequirement {
    LevelRequirement::new(30.0)
}

fn default_period() -> LevelRequirement {
    LevelRequirement::new(15.0)
}

impl Default for CreditRequirements {
    fn default() -> Self {
        Self {
            overall: default_overall(),
            semester: default_semester(),
            period: default_period(),
            overrides: Vec::new(),
        }
    }
}

impl CreditRequirements {
    /// Requirement of one study period.
    pub fn for_period(&self, semester: i16, period: i16) -> LevelRequirement {
        self.overridden(self.period.clone(), |o| {
            o.semester == semester && o.period == Some(period)
        })
    }

    /// Requirement of a whole semester.
    pub fn for_semester(&self, semester: i16) -> LevelRequirement {
        self.overridden(self.semester.clone(), |o| {
            o.semester == semester && o.period.is_none()
        })
    }

    fn overridden(
        &self,
        mut base: LevelRequirement,
        applies: impl Fn(&RequirementOverride) -> bool,
    ) -> LevelRequirement {
        // later entries win
        for o in self.overrides.iter().filter(|o| applies(o)) {
            if let Some(total) = o.total {
                base.total = total;
            }
            if o.a_level.is_some() {
                base.a_level = o.a_level;
            }
            if o.g_level.is_some() {
                base.g_level = o.g_level;
            }
        }
        base
    }
}

/// Course-info collaborator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseInfoSettings {
    /// Base URL; the course code is appended as the last path segment.
    /// Empty means no remote source is configured.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_course_info_timeout")]
    pub timeout_sec: u64,
}

fn default_course_info_timeout() -> u64 {
    10
}

impl Default for CourseInfoSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_sec: default_course_info_timeout(),
        }
    }
}

impl PlannerConfig {
    /// Load planner configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!("Failed to read config file: {}", e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse planner configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, RepositoryError> {
        toml::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Load configuration from `PLANNER_CONFIG` or the default locations.
    ///
    /// Searches for `planner.toml` in:
    /// 1. The path in `PLANNER_CONFIG`
    /// 2. Current directory
    /// 3. `backend/` directory
    ///
    /// Falls back to defaults when no file exists. `COURSE_INFO_URL`
    /// overrides the course-info base URL.
    pub fn load() -> Result<Self, RepositoryError> {
        let mut config = match std::env::var("PLANNER_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => {
                let search_paths = [
                    PathBuf::from("planner.toml"),
                    PathBuf::from("backend/planner.toml"),
                ];
                match search_paths.iter().find(|p| p.exists()) {
                    Some(path) => Self::from_file(path)?,
                    None => Self::default(),
                }
            }
        };

        if let Ok(url) = std::env::var("COURSE_INFO_URL") {
            config.course_info.base_url = url;
        }

        Ok(config)
    }
}
