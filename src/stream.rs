//! Snapshot streaming: observe a session as a `Stream` of states.
//!
//! [`crate::session::Session::subscribe`] returns a [`SnapshotStream`] that
//! yields the current snapshot immediately and then one snapshot per applied
//! event. Intermediate snapshots may be skipped if the subscriber falls
//! behind; the latest one is always delivered.

use crate::view::SessionSnapshot;
use std::pin::Pin;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::Stream;

/// A boxed stream of session snapshots.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = SessionSnapshot> + Send>>;

/// Wrap a watch receiver into a [`SnapshotStream`].
pub(crate) fn snapshot_stream(rx: watch::Receiver<SessionSnapshot>) -> SnapshotStream {
    Box::pin(WatchStream::new(rx))
}
