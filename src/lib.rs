//! # pdf-quizgen
//!
//! Client-side orchestration for turning a PDF into a multiple-choice quiz.
//!
//! The crate owns the state of one quiz session: which file the user picked,
//! whether its text has been extracted, and whether a quiz has been generated
//! from that text. Text extraction and question generation happen on two
//! remote services; this crate uploads, tracks the in-flight requests and
//! decides what the user should see.
//!
//! ## Flow
//!
//! ```text
//! file (picker / drop)
//!  │
//!  ├─ 1. Intake     size check against the 20 MB limit
//!  ├─ 2. Extract    multipart POST "pdf"      → ExtractedText
//!  ├─ 3. Generate   multipart POST "passage"  → Vec<QuizItem>   (on request)
//!  └─ 4. Present    snapshots + notices for the front end
//! ```
//!
//! A built-in demo quiz can be shown at any time without touching the
//! network.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_quizgen::{Session, SessionConfig};
//! use pdf_quizgen::pipeline::intake::read_local_file;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::builder()
//!         .base_url("http://127.0.0.1:8000")
//!         .request_timeout_secs(60)
//!         .build()?;
//!     let mut session = Session::from_config(&config)?;
//!
//!     session.select_file(Some(read_local_file("lecture.pdf").await?));
//!     session.settle_all().await;
//!
//!     if session.request_generation() {
//!         session.settle_all().await;
//!     }
//!     if let Some(quiz) = session.state().quiz() {
//!         for item in quiz {
//!             println!("{}", item.question);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `quizgen` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when embedding the library:
//! ```toml
//! pdf-quizgen = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod demo;
pub mod error;
pub mod machine;
pub mod model;
pub mod observer;
pub mod pipeline;
pub mod session;
pub mod stream;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{BackendRef, HttpBackend, QuizBackend};
pub use config::{SessionConfig, SessionConfigBuilder};
pub use demo::demo_quiz;
pub use error::{QuizGenError, StageError};
pub use machine::{Applied, Effect, Event, Phase, RequestSeq, SessionState};
pub use model::{
    ExtractedText, FileInfo, QuizItem, QuizOption, SelectedFile, MAX_FILE_MB, MAX_FILE_SIZE,
};
pub use observer::{NoopObserver, ObserverRef, SessionObserver, StageKind};
pub use pipeline::intake::{DataTransfer, DragEvent, DragItem, DropEffect, Intake};
pub use session::Session;
pub use stream::SnapshotStream;
pub use view::{Notice, NoticeLevel, SessionSnapshot};
