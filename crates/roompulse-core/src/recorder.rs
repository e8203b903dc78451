//! Shared status recorder.
//!
//! Wraps a [`RetentionEngine`] in one mutex and pairs it with an injected
//! [`Clock`]. Every `record*` call holds the mutex for the whole admit,
//! migrate and evict pipeline, so concurrent callers serialize and the
//! loser of a race is simply throttled by the admission gate.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::instrument;

use crate::clock::Clock;
use crate::config::RetentionConfig;
use crate::error::ConfigError;
use crate::ledger::StatusLedger;
use crate::retention::{RecordOutcome, RetentionEngine, RetentionStats};
use crate::snapshot::StatusSnapshot;
use crate::status::StatusValue;

/// Thread-safe status history with a clock.
pub struct StatusRecorder {
    engine: Mutex<RetentionEngine>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for StatusRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let engine = self.lock();
        f.debug_struct("StatusRecorder")
            .field("config", engine.config())
            .field("len", &engine.len())
            .finish_non_exhaustive()
    }
}

impl StatusRecorder {
    /// Validate `config` and create an empty recorder.
    pub fn new(config: RetentionConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        Ok(Self {
            engine: Mutex::new(RetentionEngine::new(config)?),
            clock,
        })
    }

    fn lock(&self) -> MutexGuard<'_, RetentionEngine> {
        self.engine.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sample `statuses` at the clock's current time.
    pub fn record<I>(&self, statuses: I) -> RecordOutcome
    where
        I: IntoIterator<Item = StatusValue>,
    {
        let mut engine = self.lock();
        // Read the clock under the lock so admitted timestamps never go
        // backwards across racing callers.
        let now_ms = self.clock.now_ms();
        engine.record(statuses, now_ms)
    }

    /// Sample `statuses` at an explicit time.
    pub fn record_at<I>(&self, statuses: I, now_ms: i64) -> RecordOutcome
    where
        I: IntoIterator<Item = StatusValue>,
    {
        self.lock().record(statuses, now_ms)
    }

    /// Sample the ledger's current statuses at the clock's current time.
    #[instrument(level = "trace", skip_all, fields(participants))]
    pub fn record_ledger(&self, ledger: &StatusLedger) -> RecordOutcome {
        let statuses = ledger.statuses();
        tracing::Span::current().record("participants", statuses.len());
        self.record(statuses)
    }

    /// Copy of the full history, oldest first.
    #[must_use]
    pub fn read_history(&self) -> Vec<StatusSnapshot> {
        self.lock().to_vec()
    }

    /// Most recent snapshot, if any.
    #[must_use]
    pub fn latest(&self) -> Option<StatusSnapshot> {
        self.lock().latest().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> RetentionStats {
        self.lock().stats()
    }

    #[must_use]
    pub fn config(&self) -> RetentionConfig {
        *self.lock().config()
    }

    /// The injected clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
