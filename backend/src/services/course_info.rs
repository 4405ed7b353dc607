//! Extra course details from the external course-info service.
//!
//! The catalog load only carries what the program pages list. Examinations,
//! examiner, campus and main fields come from a separate course page, reached
//! through the [`CourseInfoSource`] seam. [`HttpCourseInfoSource`] talks to a
//! JSON endpoint; [`LocalCourseInfoSource`] serves a fixed map.

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::db::services::get_course;
use crate::models::{CourseDetails, Examination};

/// Course page data as served by the course-info endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInfo {
    #[serde(default)]
    pub examination: Vec<Examination>,
    #[serde(default, alias = "examiner")]
    pub examinator: Option<String>,
    #[serde(default, alias = "campus")]
    pub location: Option<String>,
    #[serde(default, alias = "main_fields")]
    pub main_field: Vec<String>,
}

impl From<&CourseInfo> for CourseDetails {
    fn from(info: &CourseInfo) -> Self {
        CourseDetails {
            examiner: info.examinator.clone(),
            campus: info.location.clone(),
            main_fields: info.main_field.clone(),
            examinations: info.examination.clone(),
        }
    }
}

/// [`CourseInfo`] labelled with the catalog's code and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraCourseInfo {
    pub course_code: String,
    pub course_name: String,
    #[serde(flatten)]
    pub info: CourseInfo,
}

/// Failures of the course-info collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CourseInfoError {
    #[error("course info service is not configured")]
    NotConfigured,

    #[error("no course info for {course_code}")]
    Missing { course_code: String },

    #[error("course info request failed: {message}")]
    Transport { message: String },

    #[error("course info request timed out: {message}")]
    Timeout { message: String },

    #[error("course info service answered status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid course info payload: {message}")]
    Decode { message: String },
}

/// Error of the operations that combine the catalog with the collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CourseDetailsError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    CourseInfo(#[from] CourseInfoError),
}

/// Source of [`CourseInfo`] keyed by course code.
#[async_trait]
pub trait CourseInfoSource: Send + Sync {
    async fn fetch_course_info(&self, course_code: &str) -> Result<CourseInfo, CourseInfoError>;
}

/// In-memory source for development and tests.
#[derive(Debug, Clone, Default)]
pub struct LocalCourseInfoSource {
    courses: HashMap<String, CourseInfo>,
}

impl LocalCourseInfoSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_course(mut self, course_code: impl Into<String>, info: CourseInfo) -> Self {
        self.courses.insert(course_code.into(), info);
        self
    }
}

#[async_trait]
impl CourseInfoSource for LocalCourseInfoSource {
    async fn fetch_course_info(&self, course_code: &str) -> Result<CourseInfo, CourseInfoError> {
        self.courses
            .get(course_code)
            .cloned()
            .ok_or_else(|| CourseInfoError::Missing {
                course_code: course_code.to_string(),
            })
    }
}

#[cfg(feature = "course-info-http")]
pub use http_source::HttpCourseInfoSource;

#[cfg(feature = "course-info-http")]
mod http_source {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::{Client, StatusCode, Url};

    use super::{CourseInfo, CourseInfoError, CourseInfoSource};
    use crate::config::CourseInfoSettings;

    const USER_AGENT: &str = "master-planner/0.1";

    /// Fetches `GET {base_url}/{course_code}` and decodes the JSON body.
    pub struct HttpCourseInfoSource {
        client: Client,
        base_url: Url,
    }

    impl HttpCourseInfoSource {
        pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CourseInfoError> {
            let base_url = Url::parse(base_url).map_err(|e| CourseInfoError::Transport {
                message: format!("invalid base url '{}': {}", base_url, e),
            })?;
            if base_url.cannot_be_a_base() {
                return Err(CourseInfoError::Transport {
                    message: format!("base url '{}' cannot carry a path", base_url),
                });
            }
            let client = Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .map_err(map_transport_error)?;
            Ok(Self { client, base_url })
        }

        /// Build from settings; an empty base URL is [`CourseInfoError::NotConfigured`].
        pub fn from_settings(settings: &CourseInfoSettings) -> Result<Self, CourseInfoError> {
            if settings.base_url.trim().is_empty() {
                return Err(CourseInfoError::NotConfigured);
            }
            Self::new(
                settings.base_url.trim(),
                Duration::from_secs(settings.timeout_sec),
            )
        }

        pub(super) fn course_url(&self, course_code: &str) -> Url {
            let mut url = self.base_url.clone();
            // checked in new()
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push(course_code);
            }
            url
        }
    }

    #[async_trait]
    impl CourseInfoSource for HttpCourseInfoSource {
        async fn fetch_course_info(
            &self,
            course_code: &str,
        ) -> Result<CourseInfo, CourseInfoError> {
            let response = self
                .client
                .get(self.course_url(course_code))
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await
                .map_err(map_transport_error)?;

            let status = response.status();
            let body = response.bytes().await.map_err(map_transport_error)?;
            if status == StatusCode::NOT_FOUND {
                return Err(CourseInfoError::Missing {
                    course_code: course_code.to_string(),
                });
            }
            if !status.is_success() {
                return Err(map_status_error(status, body.as_ref()));
            }

            serde_json::from_slice(body.as_ref()).map_err(|e| CourseInfoError::Decode {
                message: e.to_string(),
            })
        }
    }

    fn map_transport_error(error: reqwest::Error) -> CourseInfoError {
        if error.is_timeout() {
            CourseInfoError::Timeout {
                message: error.to_string(),
            }
        } else {
            CourseInfoError::Transport {
                message: error.to_string(),
            }
        }
    }

    pub(super) fn map_status_error(status: StatusCode, body: &[u8]) -> CourseInfoError {
        const PREVIEW_CHAR_LIMIT: usize = 160;

        let preview: String = String::from_utf8_lossy(body)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(PREVIEW_CHAR_LIMIT)
            .collect();

        match status {
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => CourseInfoError::Timeout {
                message: format!("status {}", status.as_u16()),
            },
            _ => CourseInfoError::Status {
                status: status.as_u16(),
                message: preview,
            },
        }
    }
}

/// Fetch course page data for a catalog course.
///
/// # Returns
/// * `Err(CourseDetailsError::Repository)` - NotFound if the course isn't in the catalog
/// * `Err(CourseDetailsError::CourseInfo)` - If the collaborator fails
pub async fn get_extra_course_info<R, S>(
    repo: &R,
    source: &S,
    course_code: &str,
) -> Result<ExtraCourseInfo, CourseDetailsError>
where
    R: FullRepository + ?Sized,
    S: CourseInfoSource + ?Sized,
{
    let course = get_course(repo, course_code).await?;
    let info = source.fetch_course_info(&course.code).await?;
    debug!(
        "Fetched {} examinations for {}",
        info.examination.len(),
        course.code
    );

    Ok(ExtraCourseInfo {
        course_code: course.code,
        course_name: course.name,
        info,
    })
}

/// Store fetched course page data on a catalog course.
///
/// Replaces the examinations, adds the main fields, and updates examiner and
/// campus when present.
pub async fn register_course_details<R: FullRepository + ?Sized>(
    repo: &R,
    course_code: &str,
    info: &CourseInfo,
) -> RepositoryResult<()> {
    info!(
        "Adding {} examinations for {}",
        info.examination.len(),
        course_code
    );
    repo.store_course_details(course_code, &CourseDetails::from(info))
        .await
        .map_err(|e| e.with_operation("register_course_details"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::CatalogRepository;
    use crate::models::Course;

    fn sample_info() -> CourseInfo {
        serde_json::from_str(
            r#"{
                "examination": [{"code": "LAB1", "name": "Laboration", "scope": "6", "grading": "U/G"}],
                "examinator": "Cyrille",
                "location": "Valla",
                "main_field": ["Matematik"]
            }"#,
        )
        .unwrap()
    }

    async fn seeded() -> LocalRepository {
        let repo = LocalRepository::new();
        repo.upsert_courses(&[Course {
            code: "TATA24".to_string(),
            name: "Linear Algebra".to_string(),
            credits: "6".to_string(),
            level: "G1X".to_string(),
            status: "o".to_string(),
            campus: None,
            examiner: None,
            main_fields: vec![],
        }])
        .await
        .unwrap();
        repo
    }

    #[test]
    fn test_payload_field_names() {
        let info = sample_info();
        assert_eq!(info.examination[0].credits, "6");
        assert_eq!(info.examinator.as_deref(), Some("Cyrille"));
        assert_eq!(info.main_field, vec!["Matematik".to_string()]);

        let sparse: CourseInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(sparse, CourseInfo::default());
    }

    #[tokio::test]
    async fn test_extra_info_carries_catalog_name() {
        let repo = seeded().await;
        let source = LocalCourseInfoSource::new().with_course("TATA24", sample_info());

        let extra = get_extra_course_info(&repo, &source, "TATA24").await.unwrap();
        assert_eq!(extra.course_name, "Linear Algebra");

        let json = serde_json::to_value(&extra).unwrap();
        assert_eq!(json["course_code"], "TATA24");
        assert_eq!(json["location"], "Valla");
    }

    #[tokio::test]
    async fn test_extra_info_for_unknown_course() {
        let repo = seeded().await;
        let source = LocalCourseInfoSource::new();

        let err = get_extra_course_info(&repo, &source, "XXX999").await.unwrap_err();
        assert!(matches!(err, CourseDetailsError::Repository(ref e) if e.is_not_found()));

        let err = get_extra_course_info(&repo, &source, "TATA24").await.unwrap_err();
        assert!(matches!(
            err,
            CourseDetailsError::CourseInfo(CourseInfoError::Missing { .. })
        ));
    }

    #[tokio::test]
    async fn test_register_details_updates_course() {
        let repo = seeded().await;
        register_course_details(&repo, "TATA24", &sample_info())
            .await
            .unwrap();

        let course = repo.get_course("TATA24").await.unwrap();
        assert_eq!(course.examiner.as_deref(), Some("Cyrille"));
        assert_eq!(course.campus.as_deref(), Some("Valla"));
        assert_eq!(course.main_fields, vec!["Matematik".to_string()]);
        assert_eq!(repo.list_examinations("TATA24").await.unwrap().len(), 1);

        let err = register_course_details(&repo, "XXX999", &sample_info())
            .await
            .unwrap_err();
        assert_eq!(
            err.context().operation.as_deref(),
            Some("register_course_details")
        );
    }

    #[cfg(feature = "course-info-http")]
    mod http {
        use super::super::http_source::map_status_error;
        use super::super::*;
        use crate::config::CourseInfoSettings;
        use reqwest::StatusCode;

        #[test]
        fn test_course_url_appends_code() {
            let source =
                HttpCourseInfoSource::new("http://localhost:9000/courses/", std::time::Duration::from_secs(1))
                    .unwrap();
            assert_eq!(
                source.course_url("TATA24").as_str(),
                "http://localhost:9000/courses/TATA24"
            );
        }

        #[test]
        fn test_empty_settings_are_not_configured() {
            let result = HttpCourseInfoSource::from_settings(&CourseInfoSettings::default());
            assert!(matches!(result, Err(CourseInfoError::NotConfigured)));
        }

        #[test]
        fn test_status_mapping() {
            assert!(matches!(
                map_status_error(StatusCode::GATEWAY_TIMEOUT, b""),
                CourseInfoError::Timeout { .. }
            ));
            match map_status_error(StatusCode::INTERNAL_SERVER_ERROR, b"  upstream \n down ") {
                CourseInfoError::Status { status, message } => {
                    assert_eq!(status, 500);
                    assert_eq!(message, "upstream down");
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }
}
