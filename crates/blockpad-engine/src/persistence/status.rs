use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::watch;

pub const DEFAULT_SAVED_DISPLAY: Duration = Duration::from_millis(2000);

/// Save indicator shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error(String),
}

impl SaveStatus {
    pub fn label(&self) -> &str {
        match self {
            SaveStatus::Idle => "",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Saved => "Saved",
            SaveStatus::Error(message) => message,
        }
    }
}

/// Shared handle that write tasks use to drive the save indicator.
///
/// `Saving` lasts while any write is in flight. The last successful write
/// shows `Saved`, which falls back to `Idle` after the display window unless
/// another write started meanwhile. A failure shows `Error` until the next
/// write starts.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    inner: Arc<StatusInner>,
}

#[derive(Debug)]
struct StatusInner {
    tx: watch::Sender<SaveStatus>,
    in_flight: AtomicUsize,
    generation: AtomicU64,
    saved_display: Duration,
}

impl StatusReporter {
    pub fn new(saved_display: Duration) -> Self {
        let (tx, _) = watch::channel(SaveStatus::Idle);
        Self {
            inner: Arc::new(StatusInner {
                tx,
                in_flight: AtomicUsize::new(0),
                generation: AtomicU64::new(0),
                saved_display,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.inner.tx.subscribe()
    }

    pub fn current(&self) -> SaveStatus {
        self.inner.tx.borrow().clone()
    }

    /// A write was dispatched
    pub fn begin(&self) {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.tx.send_replace(SaveStatus::Saving);
    }

    pub fn succeeded(&self) {
        let remaining = self.finish();
        if remaining > 0 {
            return;
        }
        let shown = self.inner.tx.send_if_modified(|status| {
            if matches!(status, SaveStatus::Error(_)) {
                return false;
            }
            *status = SaveStatus::Saved;
            true
        });
        if shown {
            self.schedule_idle();
        }
    }

    pub fn failed(&self, message: impl Into<String>) {
        self.finish();
        self.inner.tx.send_replace(SaveStatus::Error(message.into()));
    }

    fn finish(&self) -> usize {
        let previous = self
            .inner
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
            .unwrap_or_default();
        previous.saturating_sub(1)
    }

    fn schedule_idle(&self) {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.saved_display).await;
            if inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            inner.tx.send_if_modified(|status| {
                if *status != SaveStatus::Saved {
                    return false;
                }
                *status = SaveStatus::Idle;
                true
            });
        });
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new(DEFAULT_SAVED_DISPLAY)
    }
}
