//! Configuration for a quiz session.
//!
//! Everything that is allowed to vary between deployments lives in
//! [`SessionConfig`], built via its [`SessionConfigBuilder`]. The upload size
//! limit is not configurable; see [`crate::model::MAX_FILE_SIZE`].

use crate::error::QuizGenError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default path of the text-extraction endpoint.
pub const DEFAULT_EXTRACT_PATH: &str = "/api/processPdf";

/// Default path of the quiz-generation endpoint.
pub const DEFAULT_GENERATE_PATH: &str = "/api/generateQuiz";

/// Configuration for a quiz session.
///
/// # Example
/// ```rust
/// use pdf_quizgen::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .base_url("https://quiz.example.com")
///     .request_timeout_secs(90)
///     .build()
///     .unwrap();
/// assert_eq!(
///     config.extract_url().unwrap().as_str(),
///     "https://quiz.example.com/api/processPdf"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Origin serving both endpoints. Default: `http://127.0.0.1:8000`.
    pub base_url: String,

    /// Path of the extraction endpoint. Default: `/api/processPdf`.
    pub extract_path: String,

    /// Path of the generation endpoint. Default: `/api/generateQuiz`.
    pub generate_path: String,

    /// Per-request timeout in seconds. Default: none.
    ///
    /// With no timeout a hung call keeps its in-flight flag set until the
    /// user starts a new action.
    pub request_timeout_secs: Option<u64>,

    /// Address shown in the generation-failure notice.
    pub support_contact: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            extract_path: DEFAULT_EXTRACT_PATH.to_string(),
            generate_path: DEFAULT_GENERATE_PATH.to_string(),
            request_timeout_secs: None,
            support_contact: Some("quizgen@robertshin.com".to_string()),
        }
    }
}

impl SessionConfig {
    /// Create a new builder for `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Absolute URL of the extraction endpoint.
    pub fn extract_url(&self) -> Result<Url, QuizGenError> {
        self.join(&self.extract_path)
    }

    /// Absolute URL of the generation endpoint.
    pub fn generate_url(&self) -> Result<Url, QuizGenError> {
        self.join(&self.generate_path)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    fn base(&self) -> Result<Url, QuizGenError> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            QuizGenError::InvalidConfig(format!("base URL '{}' is invalid: {}", self.base_url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(QuizGenError::InvalidConfig(format!(
                "base URL must be http or https, got '{other}'"
            ))),
        }
    }

    fn join(&self, path: &str) -> Result<Url, QuizGenError> {
        // Url::join drops the last base segment unless it ends with '/',
        // so append the path to the base path explicitly.
        let mut url = self.base()?;
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        Ok(url)
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn extract_path(mut self, path: impl Into<String>) -> Self {
        self.config.extract_path = path.into();
        self
    }

    pub fn generate_path(mut self, path: impl Into<String>) -> Self {
        self.config.generate_path = path.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs.max(1));
        self
    }

    pub fn support_contact(mut self, contact: impl Into<String>) -> Self {
        self.config.support_contact = Some(contact.into());
        self
    }

    pub fn no_support_contact(mut self) -> Self {
        self.config.support_contact = None;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SessionConfig, QuizGenError> {
        let c = &self.config;
        c.base()?;
        for (name, path) in [("extract", &c.extract_path), ("generate", &c.generate_path)] {
            if !path.starts_with('/') {
                return Err(QuizGenError::InvalidConfig(format!(
                    "{name} path must start with '/', got '{path}'"
                )));
            }
        }
        Ok(self.config)
    }
}
