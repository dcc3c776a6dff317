//! The session state machine.
//!
//! All session state lives in [`SessionState`] and changes only through
//! [`SessionState::apply`], one [`Event`] at a time. A transition never
//! performs I/O; when it needs a remote call it returns an [`Effect`] and the
//! driver ([`crate::session::Session`]) runs it and feeds the result back as
//! a settlement event.
//!
//! ## Transition table
//!
//! | Event | Accepted when | State changes | Effect |
//! |-------|---------------|---------------|--------|
//! | `FileSelected(Some)` ≤ limit | always | leave demo, drop quiz + errors, select file, extracting | `Extract` |
//! | `FileSelected(Some)` > limit | always | leave demo, drop quiz + errors, too-large, no file | — |
//! | `FileSelected(None)` | always | no file, drop extraction, drop pending or failed generation | — |
//! | `DemoRequested` | always | demo, no file, no extraction, demo quiz | — |
//! | `GenerateRequested` | text extracted, no quiz, not generating | generating, clear failure | `Generate` |
//! | `ExtractionSettled` | sequence is current | publish text or failure | — |
//! | `GenerationSettled` | sequence is current | publish quiz or failure | — |
//!
//! ## Request fencing
//!
//! Every request carries a [`RequestSeq`]. Selecting a file, cancelling a
//! selection or entering the demo advances the fences; a settlement whose
//! sequence no longer matches is discarded, so a slow response for an old
//! file can never overwrite the state of a newer one.

use crate::demo::demo_quiz;
use crate::error::StageError;
use crate::model::{ExtractedText, QuizItem, SelectedFile};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Sequence number tagging one outstanding request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct RequestSeq(u64);

impl RequestSeq {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        RequestSeq(self.0 + 1)
    }
}

impl fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coarse view of where the session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    FileSelected,
    TooLarge,
    Extracting,
    Extracted,
    ExtractionFailed,
    Generating,
    GenerationFailed,
    QuizReady,
    Demo,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::FileSelected => "file selected",
            Phase::TooLarge => "file too large",
            Phase::Extracting => "extracting",
            Phase::Extracted => "extracted",
            Phase::ExtractionFailed => "extraction failed",
            Phase::Generating => "generating",
            Phase::GenerationFailed => "generation failed",
            Phase::QuizReady => "quiz ready",
            Phase::Demo => "demo",
        };
        f.write_str(s)
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The user picked or dropped a file, or cleared the selection.
    FileSelected(Option<SelectedFile>),
    /// The user asked for the demo quiz.
    DemoRequested,
    /// The user pressed "Generate questions".
    GenerateRequested,
    /// An extraction request finished.
    ExtractionSettled {
        seq: RequestSeq,
        outcome: Result<ExtractedText, StageError>,
    },
    /// A generation request finished.
    GenerationSettled {
        seq: RequestSeq,
        outcome: Result<Vec<QuizItem>, StageError>,
    },
}

/// A remote call requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Extract { seq: RequestSeq, file: SelectedFile },
    Generate { seq: RequestSeq, passage: String },
}

/// What [`SessionState::apply`] did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// State changed; nothing to run.
    Updated,
    /// State changed and the effect must be run.
    Started(Effect),
    /// The event is not valid in the current state.
    Ignored(&'static str),
    /// A settlement for a superseded request.
    Stale,
}

/// All state of one quiz session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    selected_file: Option<SelectedFile>,
    file_too_large: bool,
    extracted: Option<ExtractedText>,
    extraction_in_flight: bool,
    extraction_error: Option<StageError>,
    quiz: Option<Vec<QuizItem>>,
    quiz_in_flight: bool,
    quiz_error: Option<StageError>,
    demo_mode: bool,
    extraction_seq: RequestSeq,
    generation_seq: RequestSeq,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn file_too_large(&self) -> bool {
        self.file_too_large
    }

    pub fn extracted(&self) -> Option<&ExtractedText> {
        self.extracted.as_ref()
    }

    pub fn extraction_in_flight(&self) -> bool {
        self.extraction_in_flight
    }

    pub fn extraction_error(&self) -> Option<&StageError> {
        self.extraction_error.as_ref()
    }

    pub fn extraction_failed(&self) -> bool {
        self.extraction_error.is_some()
    }

    pub fn quiz(&self) -> Option<&[QuizItem]> {
        self.quiz.as_deref()
    }

    pub fn quiz_in_flight(&self) -> bool {
        self.quiz_in_flight
    }

    pub fn quiz_error(&self) -> Option<&StageError> {
        self.quiz_error.as_ref()
    }

    pub fn quiz_failed(&self) -> bool {
        self.quiz_error.is_some()
    }

    pub fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    pub fn extraction_seq(&self) -> RequestSeq {
        self.extraction_seq
    }

    pub fn generation_seq(&self) -> RequestSeq {
        self.generation_seq
    }

    /// The truncation warning is shown while extracted text awaits a quiz.
    pub fn shows_truncation_warning(&self) -> bool {
        self.quiz.is_none() && self.extracted.as_ref().is_some_and(ExtractedText::is_truncated)
    }

    /// Whether a `GenerateRequested` event would be accepted.
    pub fn can_generate(&self) -> bool {
        self.generation_source().is_ok()
    }

    /// The text a generation would be sent, or why none may start.
    fn generation_source(&self) -> Result<&ExtractedText, &'static str> {
        if self.quiz_in_flight {
            return Err("generation already in progress");
        }
        if self.quiz.is_some() {
            return Err("a quiz is already shown");
        }
        self.extracted
            .as_ref()
            .ok_or("no extracted text to generate from")
    }

    pub fn phase(&self) -> Phase {
        if self.demo_mode {
            Phase::Demo
        } else if self.quiz.is_some() {
            Phase::QuizReady
        } else if self.quiz_in_flight {
            Phase::Generating
        } else if self.quiz_error.is_some() {
            Phase::GenerationFailed
        } else if self.extraction_in_flight {
            Phase::Extracting
        } else if self.extraction_error.is_some() {
            Phase::ExtractionFailed
        } else if self.extracted.is_some() {
            Phase::Extracted
        } else if self.file_too_large {
            Phase::TooLarge
        } else if self.selected_file.is_some() {
            Phase::FileSelected
        } else {
            Phase::Idle
        }
    }

    /// Apply one event and report what happened.
    pub fn apply(&mut self, event: Event) -> Applied {
        let applied = match event {
            Event::FileSelected(Some(file)) => self.select_file(file),
            Event::FileSelected(None) => self.clear_selection(),
            Event::DemoRequested => self.enter_demo(),
            Event::GenerateRequested => self.start_generation(),
            Event::ExtractionSettled { seq, outcome } => self.settle_extraction(seq, outcome),
            Event::GenerationSettled { seq, outcome } => self.settle_generation(seq, outcome),
        };
        self.debug_check_invariants();
        applied
    }

    fn select_file(&mut self, file: SelectedFile) -> Applied {
        // A new upload attempt always starts a fresh quiz lifecycle.
        self.demo_mode = false;
        self.quiz = None;
        self.quiz_error = None;
        self.quiz_in_flight = false;
        self.generation_seq = self.generation_seq.next();
        self.extracted = None;
        self.extraction_error = None;
        self.extraction_seq = self.extraction_seq.next();

        if file.exceeds_limit() {
            warn!("Rejected '{}': {} bytes is over the limit", file.name(), file.size());
            self.file_too_large = true;
            self.selected_file = None;
            self.extraction_in_flight = false;
            return Applied::Updated;
        }

        info!("Selected '{}' ({} bytes)", file.name(), file.size());
        self.file_too_large = false;
        self.selected_file = Some(file.clone());
        self.extraction_in_flight = true;
        Applied::Started(Effect::Extract {
            seq: self.extraction_seq,
            file,
        })
    }

    fn clear_selection(&mut self) -> Applied {
        debug!("Selection cleared");
        self.selected_file = None;
        self.extracted = None;
        self.extraction_error = None;
        self.extraction_in_flight = false;
        self.extraction_seq = self.extraction_seq.next();
        // A pending or failed generation belonged to the removed text; a
        // delivered quiz stays.
        self.quiz_in_flight = false;
        self.quiz_error = None;
        self.generation_seq = self.generation_seq.next();
        Applied::Updated
    }

    fn enter_demo(&mut self) -> Applied {
        info!("Showing demo quiz");
        self.demo_mode = true;
        self.selected_file = None;
        self.file_too_large = false;
        self.extracted = None;
        self.extraction_error = None;
        self.extraction_in_flight = false;
        self.extraction_seq = self.extraction_seq.next();
        self.quiz = Some(demo_quiz());
        self.quiz_error = None;
        self.quiz_in_flight = false;
        self.generation_seq = self.generation_seq.next();
        Applied::Updated
    }

    fn start_generation(&mut self) -> Applied {
        let passage = match self.generation_source() {
            Ok(extracted) => extracted.text.clone(),
            Err(reason) => return Applied::Ignored(reason),
        };

        self.generation_seq = self.generation_seq.next();
        self.quiz_in_flight = true;
        self.quiz_error = None;
        info!("Generation {} requested", self.generation_seq);
        Applied::Started(Effect::Generate {
            seq: self.generation_seq,
            passage,
        })
    }

    fn settle_extraction(
        &mut self,
        seq: RequestSeq,
        outcome: Result<ExtractedText, StageError>,
    ) -> Applied {
        if seq != self.extraction_seq || !self.extraction_in_flight {
            debug!("Discarding stale extraction {} (current {})", seq, self.extraction_seq);
            return Applied::Stale;
        }

        self.extraction_in_flight = false;
        match outcome {
            Ok(data) => {
                self.extracted = Some(data);
                self.extraction_error = None;
            }
            Err(e) => {
                warn!("Extraction {} failed: {}", seq, e);
                self.extraction_error = Some(e);
            }
        }
        Applied::Updated
    }

    fn settle_generation(
        &mut self,
        seq: RequestSeq,
        outcome: Result<Vec<QuizItem>, StageError>,
    ) -> Applied {
        if seq != self.generation_seq || !self.quiz_in_flight {
            debug!("Discarding stale generation {} (current {})", seq, self.generation_seq);
            return Applied::Stale;
        }

        self.quiz_in_flight = false;
        match outcome {
            Ok(items) => {
                self.quiz = Some(items);
                self.quiz_error = None;
            }
            Err(e) => {
                warn!("Generation {} failed: {}", seq, e);
                self.quiz_error = Some(e);
            }
        }
        Applied::Updated
    }

    fn debug_check_invariants(&self) {
        debug_assert!(
            self.selected_file.as_ref().map_or(true, |f| !f.exceeds_limit()),
            "oversized file selected"
        );
        debug_assert!(
            !self.demo_mode || (self.selected_file.is_none() && self.extracted.is_none()),
            "demo mode with upload state"
        );
        debug_assert!(
            !self.extraction_in_flight || self.selected_file.is_some(),
            "extraction in flight without a file"
        );
        debug_assert!(
            self.extracted
                .as_ref()
                .map_or(true, |e| e.processed_pages <= e.total_pages),
            "processed pages beyond total"
        );
    }
}
