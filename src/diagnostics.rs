//! Injected diagnostics for the query pipeline.
//!
//! Each pipeline stage reports what it derived to a [`DiagnosticSink`] passed
//! in through [`crate::search::QueryContext`]. The default sink discards
//! everything; [`TracingSink`] forwards to `tracing` at DEBUG level and
//! [`MemorySink`] keeps events for inspection in tests and tooling.

use crate::search::{FuzzyGate, NormalizedQuery, TermSet};
use std::sync::{Mutex, PoisonError};

/// Something a pipeline stage observed.
#[derive(Debug)]
pub enum DiagnosticEvent<'a> {
    Normalized {
        raw: &'a str,
        query: &'a NormalizedQuery,
    },
    /// The query normalized to nothing.
    NoTerms { raw: &'a str },
    Expanded { terms: &'a TermSet },
    FuzzyGate { decision: FuzzyGate },
    Ranked { candidates: usize, included: usize },
}

impl DiagnosticEvent<'_> {
    /// Stable short name of the stage that emitted this event.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Normalized { .. } => "normalized",
            Self::NoTerms { .. } => "no_terms",
            Self::Expanded { .. } => "expanded",
            Self::FuzzyGate { .. } => "fuzzy_gate",
            Self::Ranked { .. } => "ranked",
        }
    }
}

/// Receives diagnostic events. Must tolerate concurrent queries.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: &DiagnosticEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn record(&self, _event: &DiagnosticEvent<'_>) {}
}

/// Forwards events to `tracing` at DEBUG level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &DiagnosticEvent<'_>) {
        tracing::debug!(stage = event.stage(), "{:?}", event);
    }
}

/// Collects `(stage, rendered event)` pairs in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<(&'static str, String)>>,
}

impl MemorySink {
    /// Stage names in the order they were recorded.
    pub fn stages(&self) -> Vec<&'static str> {
        self.lock().iter().map(|(stage, _)| *stage).collect()
    }

    /// Rendered events in the order they were recorded.
    pub fn events(&self) -> Vec<(&'static str, String)> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(&'static str, String)>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, event: &DiagnosticEvent<'_>) {
        self.lock().push((event.stage(), format!("{:?}", event)));
    }
}
