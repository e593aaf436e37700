//! Diagnostics sinks
//!
//! The framing layer reports what it sends, what it receives and what went
//! wrong through an injected [`DiagnosticsSink`]. The default sink forwards to
//! `tracing`; tests use [`RecordingSink`] to assert on what was reported.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{error, info};

use crate::FramingError;

/// One event reported by a reader or writer.
#[derive(Clone, Copy)]
pub enum Diagnostic<'a> {
    /// A message was encoded and is about to be written.
    Sending {
        peer: &'a str,
        payload_bytes: usize,
        message: &'a dyn fmt::Debug,
    },
    /// A message was read and decoded.
    Received {
        peer: &'a str,
        payload_bytes: usize,
        message: &'a dyn fmt::Debug,
    },
    /// A call failed. Never emitted for [`FramingError::EndOfStream`].
    Failed {
        peer: &'a str,
        error: &'a FramingError,
    },
}

impl fmt::Debug for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sending {
                peer,
                payload_bytes,
                message,
            } => write!(f, "Sending {message:?} ({payload_bytes} bytes) to {peer}"),
            Self::Received {
                peer,
                payload_bytes,
                message,
            } => write!(f, "Received {message:?} ({payload_bytes} bytes) from {peer}"),
            Self::Failed { peer, error } => write!(f, "Error with {peer}: {error}"),
        }
    }
}

/// Fire-and-forget receiver of framing diagnostics.
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, diagnostic: &Diagnostic<'_>);
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for &S {
    fn record(&self, diagnostic: &Diagnostic<'_>) {
        (**self).record(diagnostic);
    }
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for Arc<S> {
    fn record(&self, diagnostic: &Diagnostic<'_>) {
        (**self).record(diagnostic);
    }
}

/// Forwards diagnostics to `tracing`: traffic at info, failures at error.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, diagnostic: &Diagnostic<'_>) {
        match *diagnostic {
            Diagnostic::Sending {
                peer,
                payload_bytes,
                message,
            } => info!(peer = %peer, bytes = payload_bytes, payload = ?message, "Sending message"),
            Diagnostic::Received {
                peer,
                payload_bytes,
                message,
            } => info!(peer = %peer, bytes = payload_bytes, payload = ?message, "Received message"),
            Diagnostic::Failed { peer, error } => {
                error!(peer = %peer, error = %error, "Framing error");
            }
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {
    fn record(&self, _diagnostic: &Diagnostic<'_>) {}
}

/// Owned copy of a [`Diagnostic`], kept by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedDiagnostic {
    Sending {
        peer: String,
        payload_bytes: usize,
        message: String,
    },
    Received {
        peer: String,
        payload_bytes: usize,
        message: String,
    },
    Failed {
        peer: String,
        error: FramingError,
    },
}

impl From<&Diagnostic<'_>> for RecordedDiagnostic {
    fn from(diagnostic: &Diagnostic<'_>) -> Self {
        match *diagnostic {
            Diagnostic::Sending {
                peer,
                payload_bytes,
                message,
            } => Self::Sending {
                peer: peer.to_string(),
                payload_bytes,
                message: format!("{message:?}"),
            },
            Diagnostic::Received {
                peer,
                payload_bytes,
                message,
            } => Self::Received {
                peer: peer.to_string(),
                payload_bytes,
                message: format!("{message:?}"),
            },
            Diagnostic::Failed { peer, error } => Self::Failed {
                peer: peer.to_string(),
                error: error.clone(),
            },
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<RecordedDiagnostic>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<RecordedDiagnostic> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Errors recorded so far, oldest first.
    #[must_use]
    pub fn failures(&self) -> Vec<FramingError> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                RecordedDiagnostic::Failed { error, .. } => Some(error),
                _ => None,
            })
            .collect()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn record(&self, diagnostic: &Diagnostic<'_>) {
        if let Ok(mut records) = self.records.lock() {
            records.push(RecordedDiagnostic::from(diagnostic));
        }
    }
}
