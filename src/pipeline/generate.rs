//! Quiz generation: send the extracted passage and decode the question list.
//!
//! Only ever invoked by an explicit user request; extraction runs on its
//! own, generation does not.

use crate::error::QuizGenError;
use crate::model::QuizItem;
use crate::pipeline::{post_form, preview};
use reqwest::multipart::Form;
use reqwest::Url;
use tracing::{debug, info};

/// Multipart field carrying the passage text.
pub const PASSAGE_FIELD: &str = "passage";

pub fn build_form(passage: &str) -> Form {
    Form::new().text(PASSAGE_FIELD, passage.to_string())
}

/// Send `passage` to the generation endpoint and return the questions.
pub async fn request_quiz(
    client: &reqwest::Client,
    url: &Url,
    passage: &str,
    timeout_secs: Option<u64>,
) -> Result<Vec<QuizItem>, QuizGenError> {
    info!("Generating quiz from {} chars of text", passage.len());

    let body = post_form(client, url, build_form(passage), timeout_secs).await?;
    let items = decode_quiz(url.path(), &body)?;

    info!("Generated {} questions", items.len());
    Ok(items)
}

/// Decode and validate a generation response body.
///
/// The list must be non-empty and every question must offer at least one
/// option.
pub fn decode_quiz(endpoint: &str, body: &[u8]) -> Result<Vec<QuizItem>, QuizGenError> {
    let items: Vec<QuizItem> =
        serde_json::from_slice(body).map_err(|e| QuizGenError::InvalidResponse {
            endpoint: endpoint.to_string(),
            detail: format!("{e}; body starts with {:?}", preview(body)),
        })?;

    if items.is_empty() {
        return Err(QuizGenError::EmptyQuiz {
            endpoint: endpoint.to_string(),
        });
    }

    for (idx, item) in items.iter().enumerate() {
        item.validate()
            .map_err(|detail| QuizGenError::InvalidResponse {
                endpoint: endpoint.to_string(),
                detail: format!("item {idx}: {detail}"),
            })?;
        if item.correct_answer().is_none() {
            debug!(
                "item {}: correct_option {} is outside {} options",
                idx,
                item.correct_option,
                item.options.len()
            );
        }
    }

    Ok(items)
}
