//! CLI binary for pdf-quizgen.
//!
//! A thin shim over the library crate: maps flags to `SessionConfig`, feeds
//! one file (or the demo) into a `Session` and prints what a front end would
//! show.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_quizgen::pipeline::intake::read_local_file;
use pdf_quizgen::{
    ExtractedText, Notice, NoticeLevel, QuizItem, Session, SessionConfig, SessionObserver,
    StageKind,
};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: one spinner per outstanding request, plus a log line
/// when the request settles.
struct CliObserver {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
        })
    }

    fn start(&self, prefix: &'static str, msg: String) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix(prefix);
        bar.set_message(msg);
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(old) = slot.replace(bar) {
                old.finish_and_clear();
            }
        }
    }

    fn finish(&self, line: String) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
        eprintln!("{line}");
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl SessionObserver for CliObserver {
    fn on_extraction_start(&self, file_name: &str, size: u64) {
        self.start(
            "Extracting",
            format!("{file_name} {}", dim(&format!("({size} bytes)"))),
        );
    }

    fn on_extraction_complete(&self, data: &ExtractedText) {
        self.finish(format!(
            "{} Extracted {}/{} pages  {}",
            green("✓"),
            data.processed_pages,
            data.total_pages,
            dim(&format!("{} tokens", data.total_tokens)),
        ));
    }

    fn on_extraction_error(&self, error: &str) {
        self.finish(format!("{} {}", red("✗"), red(error)));
    }

    fn on_generation_start(&self, passage_len: usize) {
        self.start(
            "Generating",
            dim(&format!("{passage_len} chars of passage")),
        );
    }

    fn on_generation_complete(&self, question_count: usize) {
        self.finish(format!(
            "{} {} questions generated",
            green("✓"),
            bold(&question_count.to_string())
        ));
    }

    fn on_generation_error(&self, error: &str) {
        self.finish(format!("{} {}", red("✗"), red(error)));
    }

    fn on_stale_result(&self, stage: StageKind) {
        eprintln!("{}", dim(&format!("  dropped stale {stage:?} result")));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract text from a PDF and show the extraction summary
  quizgen lecture.pdf

  # Extract and generate a quiz
  quizgen --generate lecture.pdf

  # Use a remote service with a 90s per-request timeout
  quizgen --base-url https://quiz.example.com --timeout 90 --generate notes.pdf

  # Show the built-in demo quiz (no network)
  quizgen --demo

  # Machine-readable session snapshot
  quizgen --generate --json lecture.pdf > session.json

LIMITS:
  Files larger than 20 MB are rejected before any upload.

ENVIRONMENT VARIABLES:
  QUIZGEN_BASE_URL        Base URL of the extraction/generation services
  QUIZGEN_TIMEOUT         Per-request timeout in seconds
  RUST_LOG                Override log filter (e.g. pdf_quizgen=debug)
"#;

/// Turn a PDF into a multiple-choice quiz.
#[derive(Parser, Debug)]
#[command(
    name = "quizgen",
    version,
    about = "Turn a PDF into a multiple-choice quiz",
    long_about = "Upload a PDF to a text-extraction service, then generate a multiple-choice \
quiz from the extracted text. Files over 20 MB are rejected locally. Use --demo to see a \
sample quiz without any network access.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    #[arg(required_unless_present = "demo")]
    input: Option<PathBuf>,

    /// Show the built-in demo quiz instead of processing a file.
    #[arg(long, conflicts_with_all = ["input", "generate"])]
    demo: bool,

    /// Generate a quiz once the text has been extracted.
    #[arg(short, long)]
    generate: bool,

    /// Base URL of the extraction and generation services.
    #[arg(long, env = "QUIZGEN_BASE_URL", default_value = "http://127.0.0.1:8000")]
    base_url: String,

    /// Per-request timeout in seconds (no timeout when unset).
    #[arg(long, env = "QUIZGEN_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Support address shown when generation fails.
    #[arg(long, env = "QUIZGEN_SUPPORT_CONTACT")]
    support_contact: Option<String>,

    /// Print the final session snapshot as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the quiz itself.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports progress; keep library logs quiet unless
    // asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build session ────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let mut session = Session::from_config(&config).context("Failed to create session")?;

    let observer = show_progress.then(CliObserver::new);
    if let Some(ref obs) = observer {
        session = session.with_observer(Arc::clone(obs) as Arc<dyn SessionObserver>);
    }

    // ── Run ──────────────────────────────────────────────────────────────
    if cli.demo {
        session.request_demo();
    } else if let Some(ref path) = cli.input {
        let file = read_local_file(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if !cli.quiet && !cli.json {
            eprintln!("{} {}", bold("File:"), file.info());
        }

        session.select_file(Some(file));
        settle(&mut session).await?;

        if cli.generate && session.request_generation() {
            settle(&mut session).await?;
        }
    }
    if let Some(ref obs) = observer {
        obs.clear();
    }

    // ── Report ───────────────────────────────────────────────────────────
    let notices = session.notices();

    if cli.json {
        let json = serde_json::to_string_pretty(&session.snapshot())
            .context("Failed to serialise session snapshot")?;
        println!("{json}");
    } else {
        for notice in &notices {
            print_notice(notice, cli.quiet);
        }
        if let Some(quiz) = session.state().quiz() {
            print_quiz(quiz);
        }
    }

    if let Some(failure) = notices.iter().find(|n| n.level() == NoticeLevel::Error) {
        anyhow::bail!("{failure}");
    }
    Ok(())
}

/// Settle outstanding requests, giving up on Ctrl-C.
async fn settle(session: &mut Session) -> Result<()> {
    tokio::select! {
        _ = session.settle_all() => Ok(()),
        _ = tokio::signal::ctrl_c() => anyhow::bail!("Interrupted"),
    }
}

/// Map CLI args to `SessionConfig`.
fn build_config(cli: &Cli) -> Result<SessionConfig> {
    let mut builder = SessionConfig::builder().base_url(&cli.base_url);
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(ref contact) = cli.support_contact {
        builder = builder.support_contact(contact);
    }
    builder.build().context("Invalid configuration")
}

fn print_notice(notice: &Notice, quiet: bool) {
    let text = notice.to_string();
    match notice.level() {
        NoticeLevel::Error => eprintln!("{} {}", red("✘"), red(&text)),
        _ if quiet => {}
        NoticeLevel::Warning => eprintln!("{} {}", yellow("⚠"), yellow(&text)),
        NoticeLevel::Progress => eprintln!("{}", dim(&text)),
        NoticeLevel::Info => eprintln!("{} {}", green("✔"), text),
    }
}

fn print_quiz(quiz: &[QuizItem]) {
    for (idx, item) in quiz.iter().enumerate() {
        println!("\n{}", bold(&format!("{}. {}", idx + 1, item.question)));
        for (pos, option) in item.options.iter().enumerate() {
            let marker = if pos == item.correct_option as usize {
                green("●")
            } else {
                "○".to_string()
            };
            println!("   {marker} {}", option.text);
        }
    }
}
