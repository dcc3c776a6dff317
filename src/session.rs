//! The session driver: owns one [`SessionState`] and runs its effects.
//!
//! A [`Session`] is the single context object for one user session. The
//! presentation layer calls its request methods (`select_file`,
//! `request_demo`, `request_generation`) and drives outstanding network
//! calls with [`Session::settle_next`] or [`Session::settle_all`].
//!
//! Pending requests are plain futures owned by the session; nothing is
//! spawned. Everything runs on the task that awaits the session, so state
//! is only ever touched from one place at a time. `settle_next` is cancel
//! safe and can sit in a `tokio::select!` next to a UI event source:
//!
//! ```rust,no_run
//! use pdf_quizgen::{Session, SessionConfig};
//! use pdf_quizgen::pipeline::intake::read_local_file;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::from_config(&SessionConfig::default())?;
//! session.select_file(Some(read_local_file("lecture.pdf").await?));
//! session.settle_all().await;
//!
//! if session.request_generation() {
//!     session.settle_all().await;
//! }
//! for notice in session.notices() {
//!     println!("{notice}");
//! }
//! # Ok(())
//! # }
//! ```

use crate::client::{BackendRef, HttpBackend};
use crate::config::SessionConfig;
use crate::error::{QuizGenError, StageError};
use crate::machine::{Applied, Effect, Event, Phase, SessionState};
use crate::model::SelectedFile;
use crate::observer::{NoopObserver, ObserverRef, StageKind};
use crate::pipeline::intake::Intake;
use crate::stream::{snapshot_stream, SnapshotStream};
use crate::view::{Notice, SessionSnapshot};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// One user's quiz session.
pub struct Session {
    backend: BackendRef,
    state: SessionState,
    pending: FuturesUnordered<BoxFuture<'static, Event>>,
    observer: ObserverRef,
    snapshots: watch::Sender<SessionSnapshot>,
    support_contact: Option<String>,
}

impl Session {
    /// Create a session around any backend.
    pub fn new(backend: BackendRef) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self {
            backend,
            state: SessionState::new(),
            pending: FuturesUnordered::new(),
            observer: Arc::new(NoopObserver),
            snapshots,
            support_contact: None,
        }
    }

    /// Create a session talking HTTP to the configured services.
    pub fn from_config(config: &SessionConfig) -> Result<Self, QuizGenError> {
        let backend = HttpBackend::new(config)?;
        let mut session = Self::new(Arc::new(backend));
        session.support_contact = config.support_contact.clone();
        Ok(session)
    }

    pub fn with_observer(mut self, observer: ObserverRef) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_support_contact(mut self, contact: impl Into<String>) -> Self {
        self.support_contact = Some(contact.into());
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(&self.state)
    }

    /// Inline messages for the current state.
    pub fn notices(&self) -> Vec<Notice> {
        self.snapshot().notices(self.support_contact.as_deref())
    }

    /// Stream of snapshots, starting with the current one.
    pub fn subscribe(&self) -> SnapshotStream {
        snapshot_stream(self.snapshots.subscribe())
    }

    /// Requests started and not yet settled, stale ones included.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// The user picked, dropped or cleared a file.
    pub fn select_file(&mut self, file: Option<SelectedFile>) -> Applied {
        self.dispatch(Event::FileSelected(file))
    }

    /// Feed the result of a picker or drop handler.
    pub fn handle_intake(&mut self, intake: Intake) -> Option<Applied> {
        intake.into_event().map(|event| self.dispatch(event))
    }

    /// The user asked for the demo quiz.
    pub fn request_demo(&mut self) -> Applied {
        self.dispatch(Event::DemoRequested)
    }

    /// The user pressed "Generate questions". Returns whether a request
    /// was started.
    pub fn request_generation(&mut self) -> bool {
        matches!(
            self.dispatch(Event::GenerateRequested),
            Applied::Started(_)
        )
    }

    /// Apply one event, start its effect and notify observers.
    pub fn dispatch(&mut self, event: Event) -> Applied {
        let before = self.state.phase();
        let settled = match &event {
            Event::ExtractionSettled { .. } => Some(StageKind::Extraction),
            Event::GenerationSettled { .. } => Some(StageKind::Generation),
            _ => None,
        };

        let applied = self.state.apply(event);
        match &applied {
            Applied::Started(effect) => self.start(effect.clone()),
            Applied::Updated => {
                if let Some(stage) = settled {
                    self.report_settlement(stage);
                }
            }
            Applied::Stale => {
                if let Some(stage) = settled {
                    self.observer.on_stale_result(stage);
                }
            }
            Applied::Ignored(reason) => warn!("Ignored request: {}", reason),
        }

        let after = self.state.phase();
        if after != before {
            info!("Phase {} -> {}", before, after);
            self.observer.on_phase_change(before, after);
        }
        if matches!(applied, Applied::Started(_) | Applied::Updated) {
            self.snapshots.send_replace(SessionSnapshot::from(&self.state));
        }
        applied
    }

    /// Wait for the next outstanding request to settle and apply it.
    ///
    /// Returns `None` immediately when nothing is pending. Cancel safe.
    pub async fn settle_next(&mut self) -> Option<Phase> {
        let event = self.pending.next().await?;
        self.dispatch(event);
        Some(self.state.phase())
    }

    /// Settle every outstanding request, including ones started by the
    /// settlements themselves.
    pub async fn settle_all(&mut self) -> Phase {
        while self.settle_next().await.is_some() {}
        self.state.phase()
    }

    fn start(&mut self, effect: Effect) {
        let backend = Arc::clone(&self.backend);
        match effect {
            Effect::Extract { seq, file } => {
                self.observer.on_extraction_start(file.name(), file.size());
                self.pending.push(Box::pin(async move {
                    let outcome = backend
                        .process_pdf(&file)
                        .await
                        .map_err(|e| StageError::extraction(&e));
                    Event::ExtractionSettled { seq, outcome }
                }));
            }
            Effect::Generate { seq, passage } => {
                self.observer.on_generation_start(passage.len());
                self.pending.push(Box::pin(async move {
                    let outcome = backend
                        .generate_quiz(&passage)
                        .await
                        .map_err(|e| StageError::generation(&e));
                    Event::GenerationSettled { seq, outcome }
                }));
            }
        }
    }

    fn report_settlement(&self, stage: StageKind) {
        match stage {
            StageKind::Extraction => {
                if let Some(data) = self.state.extracted() {
                    self.observer.on_extraction_complete(data);
                } else if let Some(err) = self.state.extraction_error() {
                    self.observer.on_extraction_error(&err.to_string());
                }
            }
            StageKind::Generation => {
                if let Some(quiz) = self.state.quiz() {
                    self.observer.on_generation_complete(quiz.len());
                } else if let Some(err) = self.state.quiz_error() {
                    self.observer.on_generation_error(&err.to_string());
                }
            }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.state.phase())
            .field("pending", &self.pending.len())
            .field("support_contact", &self.support_contact)
            .finish()
    }
}
