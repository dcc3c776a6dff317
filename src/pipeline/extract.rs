//! Text extraction: upload the PDF and decode the service's text payload.

use crate::error::QuizGenError;
use crate::model::{ExtractedText, SelectedFile};
use crate::pipeline::{post_form, preview};
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use tracing::{info, warn};

/// Multipart field carrying the PDF bytes.
pub const PDF_FIELD: &str = "pdf";

/// Package the file as the extraction request body.
pub fn build_form(file: &SelectedFile) -> Result<Form, QuizGenError> {
    let part = Part::bytes(file.content().to_vec())
        .file_name(file.name().to_string())
        .mime_str("application/pdf")
        .map_err(|e| QuizGenError::Internal(format!("multipart part: {e}")))?;
    Ok(Form::new().part(PDF_FIELD, part))
}

/// Upload `file` to the extraction endpoint and return the extracted text.
pub async fn request_extraction(
    client: &reqwest::Client,
    url: &Url,
    file: &SelectedFile,
    timeout_secs: Option<u64>,
) -> Result<ExtractedText, QuizGenError> {
    info!("Extracting text from '{}' ({} bytes)", file.name(), file.size());

    let form = build_form(file)?;
    let body = post_form(client, url, form, timeout_secs).await?;
    let data = decode_extraction(url.path(), &body)?;

    info!(
        "Extracted {}/{} pages, {} tokens (budget {})",
        data.processed_pages, data.total_pages, data.total_tokens, data.max_tokens
    );
    if data.is_truncated() {
        warn!(
            "Passage will be truncated from {} to {} tokens",
            data.total_tokens, data.max_tokens
        );
    }
    Ok(data)
}

/// Decode and validate an extraction response body.
pub fn decode_extraction(endpoint: &str, body: &[u8]) -> Result<ExtractedText, QuizGenError> {
    let data: ExtractedText =
        serde_json::from_slice(body).map_err(|e| QuizGenError::InvalidResponse {
            endpoint: endpoint.to_string(),
            detail: format!("{e}; body starts with {:?}", preview(body)),
        })?;

    data.validate()
        .map_err(|detail| QuizGenError::InvalidResponse {
            endpoint: endpoint.to_string(),
            detail,
        })?;

    Ok(data)
}
