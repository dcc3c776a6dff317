//! Integration tests for the session driver.
//!
//! A scripted in-memory backend stands in for the two remote services.
//! Extraction replies are keyed by file name and generation replies are
//! served in order. Gated replies only resolve once the test releases them,
//! which lets the tests settle requests in any order.

use async_trait::async_trait;
use futures::StreamExt;
use pdf_quizgen::pipeline::intake::{on_drop, on_picker_change};
use pdf_quizgen::{
    Applied, DataTransfer, DragEvent, DragItem, ExtractedText, Notice, Phase, QuizBackend,
    QuizGenError, QuizItem, SelectedFile, Session, SessionObserver, StageError, StageKind,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

// ── Scripted backend ─────────────────────────────────────────────────────────

type Reply<T> = Result<T, QuizGenError>;

enum Script<T> {
    Ready(Reply<T>),
    Gated(oneshot::Receiver<Reply<T>>),
}

impl<T> Script<T> {
    async fn resolve(self) -> Reply<T> {
        match self {
            Script::Ready(reply) => reply,
            Script::Gated(rx) => rx
                .await
                .unwrap_or_else(|_| Err(QuizGenError::Internal("gate dropped".into()))),
        }
    }
}

#[derive(Default)]
struct ScriptedBackend {
    extractions: Mutex<HashMap<String, Script<ExtractedText>>>,
    generations: Mutex<VecDeque<Script<Vec<QuizItem>>>>,
    extract_calls: Mutex<Vec<String>>,
    generate_calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn extraction(&self, name: &str, reply: Reply<ExtractedText>) -> &Self {
        self.extractions
            .lock()
            .unwrap()
            .insert(name.to_string(), Script::Ready(reply));
        self
    }

    fn gated_extraction(&self, name: &str) -> oneshot::Sender<Reply<ExtractedText>> {
        let (tx, rx) = oneshot::channel();
        self.extractions
            .lock()
            .unwrap()
            .insert(name.to_string(), Script::Gated(rx));
        tx
    }

    fn generation(&self, reply: Reply<Vec<QuizItem>>) -> &Self {
        self.generations.lock().unwrap().push_back(Script::Ready(reply));
        self
    }

    fn gated_generation(&self) -> oneshot::Sender<Reply<Vec<QuizItem>>> {
        let (tx, rx) = oneshot::channel();
        self.generations.lock().unwrap().push_back(Script::Gated(rx));
        tx
    }

    fn extract_calls(&self) -> Vec<String> {
        self.extract_calls.lock().unwrap().clone()
    }

    fn generate_calls(&self) -> Vec<String> {
        self.generate_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuizBackend for ScriptedBackend {
    async fn process_pdf(&self, file: &SelectedFile) -> Result<ExtractedText, QuizGenError> {
        self.extract_calls.lock().unwrap().push(file.name().to_string());
        let script = self.extractions.lock().unwrap().remove(file.name());
        match script {
            Some(script) => script.resolve().await,
            None => Err(QuizGenError::Internal("no extraction scripted".into())),
        }
    }

    async fn generate_quiz(&self, passage: &str) -> Result<Vec<QuizItem>, QuizGenError> {
        self.generate_calls.lock().unwrap().push(passage.to_string());
        let script = self.generations.lock().unwrap().pop_front();
        match script {
            Some(script) => script.resolve().await,
            None => Err(QuizGenError::Internal("no generation scripted".into())),
        }
    }
}

// ── Recording observer ───────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingObserver {
    phases: Mutex<Vec<(Phase, Phase)>>,
    stale: Mutex<Vec<StageKind>>,
    errors: Mutex<Vec<String>>,
}

impl SessionObserver for RecordingObserver {
    fn on_phase_change(&self, from: Phase, to: Phase) {
        self.phases.lock().unwrap().push((from, to));
    }

    fn on_extraction_error(&self, error: &str) {
        self.errors.lock().unwrap().push(error.to_string());
    }

    fn on_generation_error(&self, error: &str) {
        self.errors.lock().unwrap().push(error.to_string());
    }

    fn on_stale_result(&self, stage: StageKind) {
        self.stale.lock().unwrap().push(stage);
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

const MB: usize = 1024 * 1024;

fn pdf(name: &str, size: usize) -> SelectedFile {
    SelectedFile::new(name, vec![0x25u8; size])
}

fn text(body: &str, total_tokens: u64) -> ExtractedText {
    ExtractedText {
        total_pages: 10,
        processed_pages: 10,
        text: body.to_string(),
        max_tokens: 4000,
        total_tokens,
    }
}

fn quiz(n: usize) -> Vec<QuizItem> {
    (0..n)
        .map(|i| QuizItem::new(format!("Question {i}?"), &["yes", "no", "maybe"], 0))
        .collect()
}

fn server_error() -> QuizGenError {
    QuizGenError::HttpStatus {
        endpoint: "http://test/api".into(),
        status: 500,
    }
}

fn session_with(backend: &Arc<ScriptedBackend>) -> Session {
    Session::new(Arc::clone(backend) as Arc<dyn QuizBackend>)
}

// ── End-to-end scenarios ─────────────────────────────────────────────────────

#[tokio::test]
async fn small_file_extracts_without_warning() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.extraction("lecture.pdf", Ok(text("Cells divide.", 3000)));
    let mut session = session_with(&backend);

    let applied = session.select_file(Some(pdf("lecture.pdf", 5 * MB)));
    assert!(matches!(applied, Applied::Started(_)));
    assert_eq!(session.phase(), Phase::Extracting);
    assert_eq!(session.notices(), vec![Notice::Extracting]);

    assert_eq!(session.settle_all().await, Phase::Extracted);
    let state = session.state();
    assert!(!state.extraction_in_flight());
    assert_eq!(state.extracted().map(|e| e.text.as_str()), Some("Cells divide."));
    assert!(!state.shows_truncation_warning());
    assert_eq!(
        session.notices(),
        vec![Notice::ExtractionSucceeded {
            processed_pages: 10,
            total_pages: 10
        }]
    );
    assert_eq!(backend.extract_calls(), vec!["lecture.pdf"]);
}

#[tokio::test]
async fn oversized_file_never_reaches_the_network() {
    let backend = Arc::new(ScriptedBackend::default());
    let mut session = session_with(&backend);

    let applied = session.select_file(Some(pdf("scan.pdf", 25 * MB)));
    assert_eq!(applied, Applied::Updated);
    assert_eq!(session.phase(), Phase::TooLarge);
    assert_eq!(session.pending_requests(), 0);
    assert!(session.state().selected_file().is_none());
    assert_eq!(session.notices(), vec![Notice::FileTooLarge]);

    session.settle_all().await;
    assert!(backend.extract_calls().is_empty());
}

#[tokio::test]
async fn file_at_exact_limit_is_accepted() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.extraction("edge.pdf", Ok(text("edge", 10)));
    let mut session = session_with(&backend);

    session.select_file(Some(pdf("edge.pdf", 20 * MB)));
    assert!(!session.state().file_too_large());
    assert_eq!(session.settle_all().await, Phase::Extracted);
}

#[tokio::test]
async fn generation_produces_quiz_from_extracted_text() {
    let backend = Arc::new(ScriptedBackend::default());
    backend
        .extraction("bio.pdf", Ok(text("Photosynthesis converts light.", 5000)))
        .generation(Ok(quiz(5)));
    let mut session = session_with(&backend);

    session.select_file(Some(pdf("bio.pdf", MB)));
    session.settle_all().await;
    assert!(session.state().shows_truncation_warning());

    assert!(session.request_generation());
    assert_eq!(session.phase(), Phase::Generating);
    assert!(session.notices().contains(&Notice::Generating));

    assert_eq!(session.settle_all().await, Phase::QuizReady);
    assert_eq!(session.state().quiz().map(<[QuizItem]>::len), Some(5));
    assert!(!session.state().quiz_in_flight());
    assert!(!session.state().quiz_failed());
    assert!(session.notices().is_empty());
    assert_eq!(backend.generate_calls(), vec!["Photosynthesis converts light."]);
}

#[tokio::test]
async fn generation_failure_is_recorded_and_retryable() {
    let backend = Arc::new(ScriptedBackend::default());
    backend
        .extraction("notes.pdf", Ok(text("passage", 10)))
        .generation(Err(server_error()));
    let retry = backend.gated_generation();
    let observer = Arc::new(RecordingObserver::default());
    let mut session = session_with(&backend)
        .with_observer(Arc::clone(&observer) as Arc<dyn SessionObserver>)
        .with_support_contact("help@example.com");

    session.select_file(Some(pdf("notes.pdf", MB)));
    session.settle_all().await;
    session.request_generation();
    assert_eq!(session.settle_all().await, Phase::GenerationFailed);

    let state = session.state();
    assert!(state.quiz_failed());
    assert!(state.quiz().is_none());
    assert!(!state.quiz_in_flight());
    assert!(matches!(
        state.quiz_error(),
        Some(StageError::GenerationFailed { .. })
    ));
    assert_eq!(
        session.notices().last(),
        Some(&Notice::GenerationFailed {
            support_contact: Some("help@example.com".into())
        })
    );
    assert_eq!(observer.errors.lock().unwrap().len(), 1);

    // Retrying clears the failure before the new result arrives.
    assert!(session.request_generation());
    assert!(!session.state().quiz_failed());
    assert!(session.state().quiz_in_flight());

    retry.send(Ok(quiz(3))).unwrap();
    assert_eq!(session.settle_all().await, Phase::QuizReady);
    assert_eq!(backend.generate_calls().len(), 2);
}

#[tokio::test]
async fn extraction_failure_is_a_distinct_phase() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.extraction("broken.pdf", Err(server_error()));
    let mut session = session_with(&backend);

    session.select_file(Some(pdf("broken.pdf", MB)));
    assert_eq!(session.settle_all().await, Phase::ExtractionFailed);
    assert!(session.state().extracted().is_none());
    assert!(!session.state().extraction_in_flight());
    assert!(matches!(
        session.notices().as_slice(),
        [Notice::ExtractionFailed { .. }]
    ));

    // Nothing to generate from.
    assert!(!session.request_generation());
    assert!(backend.generate_calls().is_empty());
}

// ── Request fencing ──────────────────────────────────────────────────────────

#[tokio::test]
async fn later_selection_wins_regardless_of_arrival_order() {
    let backend = Arc::new(ScriptedBackend::default());
    let first = backend.gated_extraction("a.pdf");
    let second = backend.gated_extraction("b.pdf");
    let observer = Arc::new(RecordingObserver::default());
    let mut session = session_with(&backend)
        .with_observer(Arc::clone(&observer) as Arc<dyn SessionObserver>);

    session.select_file(Some(pdf("a.pdf", MB)));
    session.select_file(Some(pdf("b.pdf", MB)));
    assert_eq!(session.pending_requests(), 2);

    second.send(Ok(text("from b", 10))).unwrap();
    session.settle_next().await;
    assert_eq!(session.phase(), Phase::Extracted);

    first.send(Ok(text("from a", 10))).unwrap();
    session.settle_next().await;

    assert_eq!(
        session.state().extracted().map(|e| e.text.as_str()),
        Some("from b")
    );
    assert_eq!(session.state().selected_file().map(SelectedFile::name), Some("b.pdf"));
    assert_eq!(*observer.stale.lock().unwrap(), vec![StageKind::Extraction]);
    assert_eq!(session.pending_requests(), 0);
}

#[tokio::test]
async fn stale_generation_cannot_overwrite_new_file() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.extraction("old.pdf", Ok(text("old passage", 10)));
    let old_generation = backend.gated_generation();
    let new_extraction = backend.gated_extraction("new.pdf");
    let mut session = session_with(&backend);

    session.select_file(Some(pdf("old.pdf", MB)));
    session.settle_all().await;
    session.request_generation();

    session.select_file(Some(pdf("new.pdf", MB)));
    assert!(!session.state().quiz_in_flight());

    old_generation.send(Ok(quiz(5))).unwrap();
    session.settle_next().await;
    assert!(session.state().quiz().is_none());
    assert_eq!(session.phase(), Phase::Extracting);

    new_extraction.send(Ok(text("new passage", 10))).unwrap();
    assert_eq!(session.settle_all().await, Phase::Extracted);
}

#[tokio::test]
async fn demo_survives_a_late_extraction() {
    let backend = Arc::new(ScriptedBackend::default());
    let late = backend.gated_extraction("slow.pdf");
    let mut session = session_with(&backend);

    session.select_file(Some(pdf("slow.pdf", MB)));
    session.request_demo();
    assert_eq!(session.phase(), Phase::Demo);
    assert_eq!(session.state().quiz().map(<[QuizItem]>::len), Some(5));

    late.send(Ok(text("too late", 10))).unwrap();
    assert_eq!(session.settle_all().await, Phase::Demo);
    assert!(session.state().extracted().is_none());
    assert!(session.state().selected_file().is_none());
}

#[tokio::test]
async fn selecting_a_file_leaves_demo_mode() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.extraction("real.pdf", Ok(text("real", 10)));
    let mut session = session_with(&backend);

    session.request_demo();
    session.select_file(Some(pdf("real.pdf", MB)));
    assert!(!session.state().demo_mode());
    assert!(session.state().quiz().is_none());
    assert_eq!(session.settle_all().await, Phase::Extracted);
}

#[tokio::test]
async fn generate_is_ignored_while_in_flight() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.extraction("x.pdf", Ok(text("passage", 10)));
    let gate = backend.gated_generation();
    let mut session = session_with(&backend);

    session.select_file(Some(pdf("x.pdf", MB)));
    session.settle_all().await;
    assert!(session.request_generation());
    assert!(!session.request_generation());
    assert_eq!(session.pending_requests(), 1);

    gate.send(Ok(quiz(2))).unwrap();
    session.settle_all().await;
    assert!(!session.request_generation());
    assert_eq!(backend.generate_calls().len(), 1);
}

// ── Driver behaviour ─────────────────────────────────────────────────────────

#[tokio::test]
async fn settle_next_is_cancel_safe() {
    let backend = Arc::new(ScriptedBackend::default());
    let gate = backend.gated_extraction("wait.pdf");
    let mut session = session_with(&backend);

    session.select_file(Some(pdf("wait.pdf", MB)));
    let waited = tokio::time::timeout(Duration::from_millis(20), session.settle_next()).await;
    assert!(waited.is_err());
    assert_eq!(session.pending_requests(), 1);
    assert_eq!(session.phase(), Phase::Extracting);

    gate.send(Ok(text("done", 10))).unwrap();
    assert_eq!(session.settle_next().await, Some(Phase::Extracted));
    assert_eq!(session.settle_next().await, None);
}

#[tokio::test]
async fn subscribers_see_each_applied_change() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.extraction("s.pdf", Ok(text("stream me", 10)));
    let mut session = session_with(&backend);
    let mut snapshots = session.subscribe();

    assert_eq!(snapshots.next().await.map(|s| s.phase), Some(Phase::Idle));

    session.select_file(Some(pdf("s.pdf", MB)));
    let extracting = snapshots.next().await.unwrap();
    assert_eq!(extracting.phase, Phase::Extracting);
    assert_eq!(extracting.file.map(|f| f.name), Some("s.pdf".to_string()));

    session.settle_all().await;
    let extracted = snapshots.next().await.unwrap();
    assert_eq!(extracted.phase, Phase::Extracted);
    assert_eq!(extracted, session.snapshot());
}

#[tokio::test]
async fn observer_sees_phase_transitions() {
    let backend = Arc::new(ScriptedBackend::default());
    backend
        .extraction("p.pdf", Ok(text("passage", 10)))
        .generation(Ok(quiz(1)));
    let observer = Arc::new(RecordingObserver::default());
    let mut session = session_with(&backend)
        .with_observer(Arc::clone(&observer) as Arc<dyn SessionObserver>);

    session.select_file(Some(pdf("p.pdf", MB)));
    session.settle_all().await;
    session.request_generation();
    session.settle_all().await;

    assert_eq!(
        *observer.phases.lock().unwrap(),
        vec![
            (Phase::Idle, Phase::Extracting),
            (Phase::Extracting, Phase::Extracted),
            (Phase::Extracted, Phase::Generating),
            (Phase::Generating, Phase::QuizReady),
        ]
    );
}

// ── Intake wiring ────────────────────────────────────────────────────────────

#[tokio::test]
async fn dropped_file_starts_extraction() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.extraction("first.pdf", Ok(text("dropped", 10)));
    let mut session = session_with(&backend);

    let mut event = DragEvent::new(DataTransfer {
        items: Some(vec![
            DragItem::File(Some(pdf("first.pdf", MB))),
            DragItem::File(Some(pdf("second.pdf", MB))),
        ]),
        ..DataTransfer::default()
    });
    let applied = session.handle_intake(on_drop(&mut event));
    assert!(event.default_prevented());
    assert!(matches!(applied, Some(Applied::Started(_))));

    session.settle_all().await;
    assert_eq!(backend.extract_calls(), vec!["first.pdf"]);
}

#[tokio::test]
async fn dropped_text_changes_nothing() {
    let backend = Arc::new(ScriptedBackend::default());
    let mut session = session_with(&backend);

    let mut event = DragEvent::new(DataTransfer {
        items: Some(vec![DragItem::Text("https://example.com".into())]),
        ..DataTransfer::default()
    });
    assert_eq!(session.handle_intake(on_drop(&mut event)), None);
    assert_eq!(session.phase(), Phase::Idle);
}

#[tokio::test]
async fn cleared_picker_clears_selection() {
    let backend = Arc::new(ScriptedBackend::default());
    let pending = backend.gated_extraction("chosen.pdf");
    let mut session = session_with(&backend);

    session.handle_intake(on_picker_change(vec![pdf("chosen.pdf", MB)]));
    assert_eq!(session.phase(), Phase::Extracting);

    session.handle_intake(on_picker_change(Vec::new()));
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.state().selected_file().is_none());

    pending.send(Ok(text("ignored", 10))).unwrap();
    assert_eq!(session.settle_all().await, Phase::Idle);
}

#[tokio::test]
async fn cleared_picker_discards_pending_generation() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.extraction("gone.pdf", Ok(text("passage", 10)));
    let late_quiz = backend.gated_generation();
    let observer = Arc::new(RecordingObserver::default());
    let mut session = session_with(&backend)
        .with_observer(Arc::clone(&observer) as Arc<dyn SessionObserver>);

    session.handle_intake(on_picker_change(vec![pdf("gone.pdf", MB)]));
    session.settle_all().await;
    assert!(session.request_generation());

    session.handle_intake(on_picker_change(Vec::new()));
    assert_eq!(session.phase(), Phase::Idle);
    assert!(!session.state().quiz_in_flight());
    assert!(session.notices().is_empty());

    late_quiz.send(Ok(quiz(4))).unwrap();
    assert_eq!(session.settle_all().await, Phase::Idle);
    assert!(session.state().quiz().is_none());
    assert_eq!(*observer.stale.lock().unwrap(), vec![StageKind::Generation]);
}
