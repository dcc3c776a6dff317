//! Observer trait for session events.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via
//! [`crate::session::Session::with_observer`] to receive events as the
//! session moves between phases and its requests start and settle. The CLI
//! uses this to drive its spinner; a web front end could forward the events
//! to a socket.
//!
//! # Example
//!
//! ```rust
//! use pdf_quizgen::{Phase, SessionObserver};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct PhaseCounter {
//!     changes: AtomicUsize,
//! }
//!
//! impl SessionObserver for PhaseCounter {
//!     fn on_phase_change(&self, from: Phase, to: Phase) {
//!         self.changes.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{from} -> {to}");
//!     }
//! }
//! ```

use crate::machine::Phase;
use crate::model::ExtractedText;
use std::sync::Arc;

/// Which pipeline a stale result belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Extraction,
    Generation,
}

/// Called by the session as it processes events.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait SessionObserver: Send + Sync {
    /// The derived phase changed.
    fn on_phase_change(&self, from: Phase, to: Phase) {
        let _ = (from, to);
    }

    /// An extraction request was started for `file_name`.
    fn on_extraction_start(&self, file_name: &str, size: u64) {
        let _ = (file_name, size);
    }

    /// The current extraction succeeded.
    fn on_extraction_complete(&self, data: &ExtractedText) {
        let _ = data;
    }

    /// The current extraction failed.
    fn on_extraction_error(&self, error: &str) {
        let _ = error;
    }

    /// A generation request was started.
    ///
    /// # Arguments
    /// * `passage_len` — byte length of the passage sent
    fn on_generation_start(&self, passage_len: usize) {
        let _ = passage_len;
    }

    /// The current generation succeeded with `question_count` questions.
    fn on_generation_complete(&self, question_count: usize) {
        let _ = question_count;
    }

    /// The current generation failed.
    fn on_generation_error(&self, error: &str) {
        let _ = error;
    }

    /// A superseded request settled and its result was dropped.
    fn on_stale_result(&self, stage: StageKind) {
        let _ = stage;
    }
}

/// An observer that ignores everything. The default.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Shared observer handle, as stored by the session.
pub type ObserverRef = Arc<dyn SessionObserver>;
