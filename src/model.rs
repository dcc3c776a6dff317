//! Data types shared by the pipelines, the state machine and the front ends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Upload limit in megabytes, as shown to the user.
pub const MAX_FILE_MB: u64 = 20;

/// Upload limit in bytes. A file of exactly this size is accepted.
pub const MAX_FILE_SIZE: u64 = MAX_FILE_MB * 1024 * 1024;

/// A file chosen by the user through the picker or a drop.
///
/// The content is shared, so cloning a `SelectedFile` into a pending request
/// does not copy the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    size: u64,
    content: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let content: Arc<[u8]> = Arc::from(content.into());
        Self {
            name: name.into(),
            size: content.len() as u64,
            content,
        }
    }

    /// A file over the upload limit, known by name and size only.
    ///
    /// Its content is never loaded, and the state machine rejects it before
    /// any upload.
    pub(crate) fn over_limit(name: impl Into<String>, size: u64) -> Self {
        debug_assert!(size > MAX_FILE_SIZE);
        Self {
            name: name.into(),
            size,
            content: Arc::from(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn exceeds_limit(&self) -> bool {
        self.size() > MAX_FILE_SIZE
    }

    pub fn info(&self) -> FileInfo {
        FileInfo {
            name: self.name.clone(),
            size: self.size(),
        }
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("size", &self.size())
            .finish()
    }
}

/// Name and size of the selected file, without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
}

impl FileInfo {
    /// Size in decimal megabytes with one fractional digit, e.g. `"5.2MB"`.
    pub fn display_size(&self) -> String {
        let mb = self.size as f64 / 1e6;
        let rounded = (mb * 10.0).round() / 10.0;
        if rounded.fract() == 0.0 {
            format!("{rounded:.0}MB")
        } else {
            format!("{rounded:.1}MB")
        }
    }
}

impl fmt::Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.display_size())
    }
}

/// Text extracted from a PDF by the extraction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Pages in the document.
    pub total_pages: u32,
    /// Pages the service actually read; may be fewer under service limits.
    pub processed_pages: u32,
    /// Raw extracted text.
    pub text: String,
    /// Token budget of the generation service.
    pub max_tokens: u64,
    /// Tokens in the full extracted text.
    pub total_tokens: u64,
}

impl ExtractedText {
    /// True when the service will cut the passage down to `max_tokens`.
    pub fn is_truncated(&self) -> bool {
        self.total_tokens > self.max_tokens
    }

    /// Check the invariants the rest of the crate relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.processed_pages > self.total_pages {
            return Err(format!(
                "processed_pages ({}) exceeds total_pages ({})",
                self.processed_pages, self.total_pages
            ));
        }
        Ok(())
    }
}

/// One answer choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: u32,
    pub text: String,
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<QuizOption>,
    /// Index into `options` of the correct answer.
    pub correct_option: u32,
}

impl QuizItem {
    pub fn new(question: impl Into<String>, options: &[&str], correct_option: u32) -> Self {
        Self {
            question: question.into(),
            options: options
                .iter()
                .enumerate()
                .map(|(i, text)| QuizOption {
                    id: i as u32,
                    text: (*text).to_string(),
                })
                .collect(),
            correct_option,
        }
    }

    pub fn correct_answer(&self) -> Option<&QuizOption> {
        self.options.get(self.correct_option as usize)
    }

    /// Element key for an option's radio input, `q{index}_{option id}`.
    pub fn option_key(index: usize, option: &QuizOption) -> String {
        format!("q{}_{}", index, option.id)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.options.is_empty() {
            return Err(format!("question '{}' has no options", self.question));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted(max_tokens: u64, total_tokens: u64) -> ExtractedText {
        ExtractedText {
            total_pages: 10,
            processed_pages: 10,
            text: "lorem".into(),
            max_tokens,
            total_tokens,
        }
    }

    #[test]
    fn limit_boundary() {
        let exact = SelectedFile::new("a.pdf", vec![0u8; MAX_FILE_SIZE as usize]);
        assert!(!exact.exceeds_limit());
        let over = SelectedFile::new("b.pdf", vec![0u8; MAX_FILE_SIZE as usize + 1]);
        assert!(over.exceeds_limit());
    }

    #[test]
    fn truncation_is_strictly_greater() {
        assert!(extracted(4000, 4001).is_truncated());
        assert!(!extracted(4000, 4000).is_truncated());
        assert!(!extracted(4000, 1200).is_truncated());
    }

    #[test]
    fn processed_pages_may_not_exceed_total() {
        let mut data = extracted(10, 5);
        data.processed_pages = 11;
        assert!(data.validate().is_err());
        data.processed_pages = 3;
        assert!(data.validate().is_ok());
    }

    #[test]
    fn extracted_text_decodes_service_shape() {
        let json = r#"{"total_pages":10,"processed_pages":10,"text":"...","max_tokens":4000,"total_tokens":1200}"#;
        let data: ExtractedText = serde_json::from_str(json).unwrap();
        assert_eq!(data.total_pages, 10);
        assert_eq!(data.total_tokens, 1200);
        assert!(!data.is_truncated());
    }

    #[test]
    fn display_size_matches_decimal_megabytes() {
        let info = FileInfo {
            name: "notes.pdf".into(),
            size: 5_240_000,
        };
        assert_eq!(info.display_size(), "5.2MB");
        assert_eq!(info.to_string(), "notes.pdf 5.2MB");
        let whole = FileInfo {
            name: "x.pdf".into(),
            size: 3_000_000,
        };
        assert_eq!(whole.display_size(), "3MB");
    }

    #[test]
    fn quiz_item_helpers() {
        let item = QuizItem::new("2 + 2?", &["3", "4", "5"], 1);
        assert_eq!(item.correct_answer().map(|o| o.text.as_str()), Some("4"));
        assert_eq!(QuizItem::option_key(2, &item.options[1]), "q2_1");
        assert!(item.validate().is_ok());

        let empty = QuizItem {
            question: "?".into(),
            options: vec![],
            correct_option: 0,
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn debug_hides_content() {
        let file = SelectedFile::new("a.pdf", b"%PDF-1.7".to_vec());
        let dbg = format!("{file:?}");
        assert!(dbg.contains("a.pdf"));
        assert!(dbg.contains("size: 8"));
        assert!(!dbg.contains("PDF-1.7"));
    }
}
