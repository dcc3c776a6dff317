//! Pipeline stages between a user's file and a quiz.
//!
//! Each submodule implements exactly one step. The session never calls the
//! network directly; it goes through [`crate::client::QuizBackend`], whose
//! HTTP implementation is a thin wrapper over [`extract`] and [`generate`].
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ extract ──▶ generate
//! (picker/drop)  (POST /api/processPdf)  (POST /api/generateQuiz)
//! ```
//!
//! 1. [`intake`]   — turn picker changes and drop events into one candidate
//!    file; load a local file for the CLI
//! 2. [`extract`]  — multipart upload of the PDF, decode `ExtractedText`
//! 3. [`generate`] — multipart upload of the passage, decode quiz items

pub mod extract;
pub mod generate;
pub mod intake;

use crate::error::QuizGenError;
use reqwest::multipart::Form;
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

/// POST a multipart form and return the raw body of a 2xx response.
pub(crate) async fn post_form(
    client: &reqwest::Client,
    url: &Url,
    form: Form,
    timeout_secs: Option<u64>,
) -> Result<Vec<u8>, QuizGenError> {
    let endpoint = url.path().to_string();

    let mut request = client.post(url.clone()).multipart(form);
    if let Some(secs) = timeout_secs {
        request = request.timeout(Duration::from_secs(secs));
    }

    let response = request
        .send()
        .await
        .map_err(|e| transport_error(&endpoint, e, timeout_secs))?;

    let status = response.status();
    if !status.is_success() {
        return Err(QuizGenError::HttpStatus {
            endpoint,
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(&endpoint, e, timeout_secs))?;
    debug!("{} answered {} bytes", endpoint, body.len());

    Ok(body.to_vec())
}

fn transport_error(endpoint: &str, e: reqwest::Error, timeout_secs: Option<u64>) -> QuizGenError {
    match timeout_secs {
        Some(secs) if e.is_timeout() => QuizGenError::RequestTimeout {
            endpoint: endpoint.to_string(),
            secs,
        },
        _ => QuizGenError::RequestFailed {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        },
    }
}

/// First characters of a response body, for error messages.
pub(crate) fn preview(body: &[u8]) -> String {
    const MAX: usize = 120;
    let text = String::from_utf8_lossy(body);
    let mut out: String = text.chars().take(MAX).collect();
    if text.chars().count() > MAX {
        out.push('\u{2026}');
    }
    out
}
