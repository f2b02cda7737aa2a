// ── Snapshot streams ──
//
// Passive subscription to published snapshots. Holding a stream does not
// count as an observer: it sees new snapshots only while something else
// keeps the coordinator polling, or when `refresh_now` runs.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::StatusSnapshot;

type SnapshotSlot = Option<Arc<StatusSnapshot>>;

/// A subscription to the coordinator's latest snapshot.
pub struct SnapshotStream {
    current: SnapshotSlot,
    receiver: watch::Receiver<SnapshotSlot>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<SnapshotSlot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time.
    pub fn current(&self) -> Option<&Arc<StatusSnapshot>> {
        self.current.as_ref()
    }

    /// The latest published snapshot (may have changed since creation).
    pub fn latest(&self) -> SnapshotSlot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published snapshot.
    /// Returns `None` once the coordinator has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<StatusSnapshot>> {
        loop {
            self.receiver.changed().await.ok()?;
            let snap = self.receiver.borrow_and_update().clone();
            if let Some(snap) = snap {
                self.current = Some(Arc::clone(&snap));
                return Some(snap);
            }
        }
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current snapshot first (if any), then each new one.
pub struct SnapshotWatchStream {
    inner: WatchStream<SnapshotSlot>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<StatusSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Some(snap)) => return Poll::Ready(Some(snap)),
                Some(None) => {}
                None => return Poll::Ready(None),
            }
        }
    }
}
