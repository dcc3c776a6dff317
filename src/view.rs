//! Read-only views of a session for presentation layers.
//!
//! A [`SessionSnapshot`] is what observers and subscribers see: no file
//! content, just what a front end needs to render. [`Notice`] values are the
//! inline messages a front end shows for a snapshot, in display order.

use crate::error::StageError;
use crate::machine::{Phase, SessionState};
use crate::model::{ExtractedText, FileInfo, QuizItem};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A serialisable copy of the session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub file: Option<FileInfo>,
    pub file_too_large: bool,
    pub extracted: Option<ExtractedText>,
    pub extraction_in_flight: bool,
    pub extraction_error: Option<StageError>,
    pub quiz: Option<Vec<QuizItem>>,
    pub quiz_in_flight: bool,
    pub quiz_failed: bool,
    pub demo_mode: bool,
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        Self {
            phase: state.phase(),
            file: state.selected_file().map(|f| f.info()),
            file_too_large: state.file_too_large(),
            extracted: state.extracted().cloned(),
            extraction_in_flight: state.extraction_in_flight(),
            extraction_error: state.extraction_error().cloned(),
            quiz: state.quiz().map(<[QuizItem]>::to_vec),
            quiz_in_flight: state.quiz_in_flight(),
            quiz_failed: state.quiz_failed(),
            demo_mode: state.demo_mode(),
        }
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::from(&SessionState::new())
    }
}

impl SessionSnapshot {
    /// Inline messages for this snapshot, in display order.
    ///
    /// Extraction notices are only shown while no quiz is displayed.
    pub fn notices(&self, support_contact: Option<&str>) -> Vec<Notice> {
        let mut out = Vec::new();

        if self.file_too_large {
            out.push(Notice::FileTooLarge);
        }
        if self.extraction_in_flight {
            out.push(Notice::Extracting);
        }
        if let Some(StageError::ExtractionFailed { detail }) = &self.extraction_error {
            out.push(Notice::ExtractionFailed {
                detail: detail.clone(),
            });
        }

        if let (Some(data), None) = (&self.extracted, &self.quiz) {
            if data.is_truncated() {
                out.push(Notice::TruncationWarning {
                    total_tokens: data.total_tokens,
                    max_tokens: data.max_tokens,
                });
            }
            out.push(Notice::ExtractionSucceeded {
                processed_pages: data.processed_pages,
                total_pages: data.total_pages,
            });
            if self.quiz_in_flight {
                out.push(Notice::Generating);
            }
            if self.quiz_failed {
                out.push(Notice::GenerationFailed {
                    support_contact: support_contact.map(str::to_string),
                });
            }
        }

        out
    }
}

/// How a notice should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Error,
    Warning,
    Progress,
    Info,
}

/// An inline message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    FileTooLarge,
    Extracting,
    ExtractionFailed { detail: String },
    TruncationWarning { total_tokens: u64, max_tokens: u64 },
    ExtractionSucceeded { processed_pages: u32, total_pages: u32 },
    Generating,
    GenerationFailed { support_contact: Option<String> },
}

impl Notice {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Notice::FileTooLarge | Notice::ExtractionFailed { .. } | Notice::GenerationFailed { .. } => {
                NoticeLevel::Error
            }
            Notice::TruncationWarning { .. } => NoticeLevel::Warning,
            Notice::Extracting | Notice::Generating => NoticeLevel::Progress,
            Notice::ExtractionSucceeded { .. } => NoticeLevel::Info,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::FileTooLarge => {
                f.write_str("Max file size limit exceeded. Please select a smaller file.")
            }
            Notice::Extracting => f.write_str("Extracting text from PDF..."),
            Notice::ExtractionFailed { detail } => write!(
                f,
                "Sorry but the text could not be extracted from this PDF ({detail}). \
                 Please try again or select another file."
            ),
            Notice::TruncationWarning {
                total_tokens,
                max_tokens,
            } => write!(
                f,
                "Text is too long ({total_tokens} tokens). Truncating to {max_tokens} tokens."
            ),
            Notice::ExtractionSucceeded {
                processed_pages,
                total_pages,
            } => write!(
                f,
                "PDF text successfully parsed. Pages considered: {processed_pages}/{total_pages}."
            ),
            Notice::Generating => f.write_str("Generating..."),
            Notice::GenerationFailed { support_contact } => {
                f.write_str("Sorry but the quiz cannot be generated right now. Please try again later")?;
                match support_contact {
                    Some(contact) => write!(f, " or contact us at {contact} for support."),
                    None => f.write_str("."),
                }
            }
        }
    }
}
