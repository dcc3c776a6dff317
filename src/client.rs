//! The seam between the session and the two remote services.
//!
//! [`QuizBackend`] is what the session calls. [`HttpBackend`] is the
//! production implementation; tests and embedders can supply their own.

use crate::config::SessionConfig;
use crate::error::QuizGenError;
use crate::model::{ExtractedText, QuizItem, SelectedFile};
use crate::pipeline::{extract, generate};
use async_trait::async_trait;
use reqwest::Url;
use std::fmt;
use std::sync::Arc;

/// The two remote operations a quiz session depends on.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Extract text from an uploaded PDF.
    async fn process_pdf(&self, file: &SelectedFile) -> Result<ExtractedText, QuizGenError>;

    /// Generate questions from an extracted passage.
    async fn generate_quiz(&self, passage: &str) -> Result<Vec<QuizItem>, QuizGenError>;
}

/// Shared handle to a backend.
pub type BackendRef = Arc<dyn QuizBackend>;

/// HTTP implementation of [`QuizBackend`] using multipart POSTs.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    extract_url: Url,
    generate_url: Url,
    timeout_secs: Option<u64>,
}

impl HttpBackend {
    /// Build a backend from a validated configuration.
    pub fn new(config: &SessionConfig) -> Result<Self, QuizGenError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pdf-quizgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QuizGenError::Internal(format!("HTTP client: {e}")))?;
        Self::with_client(client, config)
    }

    /// Build a backend around an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, config: &SessionConfig) -> Result<Self, QuizGenError> {
        Ok(Self {
            client,
            extract_url: config.extract_url()?,
            generate_url: config.generate_url()?,
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn extract_url(&self) -> &Url {
        &self.extract_url
    }

    pub fn generate_url(&self) -> &Url {
        &self.generate_url
    }
}

impl fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBackend")
            .field("extract_url", &self.extract_url.as_str())
            .field("generate_url", &self.generate_url.as_str())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[async_trait]
impl QuizBackend for HttpBackend {
    async fn process_pdf(&self, file: &SelectedFile) -> Result<ExtractedText, QuizGenError> {
        extract::request_extraction(&self.client, &self.extract_url, file, self.timeout_secs).await
    }

    async fn generate_quiz(&self, passage: &str) -> Result<Vec<QuizItem>, QuizGenError> {
        generate::request_quiz(&self.client, &self.generate_url, passage, self.timeout_secs).await
    }
}
