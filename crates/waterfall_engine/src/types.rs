use std::fmt;

use waterfall_core::{ItemId, Severity};

/// Index of a worker slot within one pool run.
pub type WorkerId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The item list changed; re-render.
    ItemsChanged(StoreChange),
    /// A delta arrived on an in-flight item's stream.
    Progress {
        item_id: ItemId,
        received_chars: usize,
    },
    Notify(Notification),
    /// A new result landed and auto-scroll is on.
    ScrollToLatest,
    /// A graceful stop finished draining.
    StopCompleted,
    WorkerExited { worker: WorkerId, exit: WorkerExit },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Appended(ItemId),
    Updated(ItemId),
    Removed(Vec<ItemId>),
    Cleared,
    Restored,
    /// Selection or lightbox state changed without touching items.
    Gallery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// Why a worker loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// The engine was no longer running when a new cycle would start.
    Stopped,
    /// The prompt was empty when a new cycle would start.
    PromptCleared,
    /// The in-flight attempt was hard-cancelled.
    Cancelled,
    /// Too many failures in a row; this slot is not restarted.
    ThresholdExceeded { consecutive_errors: u32 },
    /// The worker task panicked.
    Panicked,
}

/// Per-worker outcome of one `start` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PoolReport {
    pub exits: Vec<(WorkerId, WorkerExit)>,
}

impl PoolReport {
    pub fn count(&self, exit: &WorkerExit) -> usize {
        self.exits.iter().filter(|(_, e)| e == exit).count()
    }
}

/// Failure of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError {
    pub kind: FailureKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// HTTP-style status, when the service answered with one.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::HttpStatus(code) => Some(code),
            _ => None,
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for GenerationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    HttpStatus(u16),
    Timeout,
    Network,
    /// The service answered but not in a shape we understand.
    InvalidResponse,
    /// The response completed without any usable content.
    EmptyContent,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::EmptyContent => write!(f, "empty content"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}
