//! File intake: normalise picker changes and drag-and-drop into one
//! candidate file.
//!
//! The browser primitives are modelled as plain values. A drop can expose
//! its payload through an item list (preferred) or a flat file list
//! (fallback); either way only the first entry is considered. Size
//! validation is not done here: the state machine owns that rule.

use crate::error::QuizGenError;
use crate::machine::Event;
use crate::model::{SelectedFile, MAX_FILE_SIZE};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of an intake handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intake {
    /// Hand this candidate (or its absence) to the file-selection transition.
    Select(Option<SelectedFile>),
    /// Nothing to do; the input was not a file.
    Ignore,
}

impl Intake {
    pub fn into_event(self) -> Option<Event> {
        match self {
            Intake::Select(file) => Some(Event::FileSelected(file)),
            Intake::Ignore => None,
        }
    }
}

/// One entry of a drop's item list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragItem {
    /// A file item. `None` when the platform cannot produce the file.
    File(Option<SelectedFile>),
    /// Plain text, a link, or anything else that is not a file.
    Text(String),
}

/// Cursor feedback for a drag operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropEffect {
    #[default]
    None,
    Copy,
    Move,
    Link,
}

/// The payload attached to a drag or drop event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTransfer {
    /// Item-list representation, when the platform exposes one.
    pub items: Option<Vec<DragItem>>,
    /// Flat file-list representation.
    pub files: Vec<SelectedFile>,
    pub drop_effect: DropEffect,
}

/// A drag-over or drop event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragEvent {
    pub data_transfer: Option<DataTransfer>,
    default_prevented: bool,
}

impl DragEvent {
    pub fn new(data_transfer: DataTransfer) -> Self {
        Self {
            data_transfer: Some(data_transfer),
            default_prevented: false,
        }
    }

    /// Stop the platform from opening the dragged file itself.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Handle a file-picker change: the first picked file, if any.
pub fn on_picker_change(files: Vec<SelectedFile>) -> Intake {
    Intake::Select(files.into_iter().next())
}

/// Handle a drag-over: suppress the default and show copy feedback.
pub fn on_drag_over(event: &mut DragEvent) {
    event.prevent_default();
    if let Some(dt) = event.data_transfer.as_mut() {
        dt.drop_effect = DropEffect::Copy;
    }
}

/// Handle a drop: suppress the default and take the first dropped file.
pub fn on_drop(event: &mut DragEvent) -> Intake {
    event.prevent_default();

    let Some(dt) = event.data_transfer.take() else {
        return Intake::Ignore;
    };

    match dt.items {
        Some(items) => match items.into_iter().next() {
            Some(DragItem::File(file)) => Intake::Select(file),
            Some(DragItem::Text(_)) => {
                debug!("Ignoring non-file drop item");
                Intake::Ignore
            }
            None => Intake::Ignore,
        },
        None => Intake::Select(dt.files.into_iter().next()),
    }
}

/// Read a local file into a [`SelectedFile`].
///
/// Used by front ends that pick files from disk rather than from a browser.
/// A file over [`MAX_FILE_SIZE`] is not read; it comes back with its size
/// only, for the state machine to reject.
pub async fn read_local_file(path: impl AsRef<Path>) -> Result<SelectedFile, QuizGenError> {
    let path = path.as_ref();
    let name = file_name(path);

    let len = tokio::fs::metadata(path)
        .await
        .map_err(|e| io_error(path, e))?
        .len();
    if len > MAX_FILE_SIZE {
        debug!("Not reading '{}': {} bytes is over the limit", name, len);
        return Ok(SelectedFile::over_limit(name, len));
    }

    let content = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
    debug!("Read local file '{}' ({} bytes)", name, content.len());
    Ok(SelectedFile::new(name, content))
}

fn io_error(path: &Path, e: std::io::Error) -> QuizGenError {
    match e.kind() {
        std::io::ErrorKind::NotFound => QuizGenError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => QuizGenError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => QuizGenError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}
