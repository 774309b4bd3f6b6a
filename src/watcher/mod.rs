//! Change watcher.
//!
//! # States
//! ```text
//! Idle → Polling → Rebuilding → Applying → Idle
//!           │
//!           └──→ (error) Backoff → Polling
//!
//! Any wait point → Stopped, on shutdown
//! ```
//!
//! # Design Decisions
//! - Strictly sequential: poll, build, apply, then loop; one cycle at a time
//! - The blocking poll runs on its own task so shutdown can win the race
//! - The index is committed only after build and apply both succeed

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::apply::{ApplyError, ApplyOutcome, CommandRunner, SafeApply};
use crate::assembler::ConfigAssembler;
use crate::error::WatchError;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;
use crate::registry::{Registry, RegistryIndex};
use crate::resilience::RetryPolicy;

/// Where the watcher currently is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Polling,
    Rebuilding,
    Applying,
    Backoff,
    Stopped,
}

/// Result of handling one poll response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The registry reported the index we already hold.
    NoChange,
    /// Rebuilt, but the document matched the active file.
    Unchanged,
    /// Rebuilt, swapped and reloaded.
    Reloaded,
}

/// Drives poll → build → apply for the lifetime of the process.
pub struct ChangeWatcher<R, C> {
    registry: Arc<R>,
    assembler: ConfigAssembler<R>,
    apply: SafeApply<C>,
    errors: mpsc::UnboundedSender<WatchError>,
    retry: RetryPolicy,
    index: RegistryIndex,
    built_once: bool,
    failures: u32,
    state: WatchState,
}

impl<R: Registry, C: CommandRunner> ChangeWatcher<R, C> {
    pub fn new(
        registry: Arc<R>,
        assembler: ConfigAssembler<R>,
        apply: SafeApply<C>,
        errors: mpsc::UnboundedSender<WatchError>,
    ) -> Self {
        Self {
            registry,
            assembler,
            apply,
            errors,
            retry: RetryPolicy::default(),
            index: RegistryIndex::default(),
            built_once: false,
            failures: 0,
            state: WatchState::Idle,
        }
    }

    /// Start from `index` instead of 0.
    pub fn with_index(mut self, index: RegistryIndex) -> Self {
        self.index = index;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Last committed index.
    pub fn index(&self) -> RegistryIndex {
        self.index
    }

    /// Run until `shutdown` fires. Returns the last committed index.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> RegistryIndex {
        tracing::info!(index = self.index.0, "Change watcher starting");

        loop {
            self.enter(WatchState::Polling);
            let registry = Arc::clone(&self.registry);
            let index = self.index;
            let mut poll = tokio::spawn(async move { registry.wait_for_change(index).await });

            let polled = tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    poll.abort();
                    let _ = poll.await;
                    break;
                }
                res = &mut poll => res,
            };

            let cycle = match polled {
                Ok(Ok(new_index)) => self.handle_change(new_index).await.map(|_| ()),
                Ok(Err(e)) => Err(WatchError::from(e)),
                Err(e) => Err(WatchError::from(e)),
            };

            match cycle {
                Ok(()) => {
                    self.failures = 0;
                    self.enter(WatchState::Idle);
                }
                Err(e) => {
                    self.failures = self.failures.saturating_add(1);
                    let delay = self.retry.delay(self.failures);
                    self.report(e, delay);

                    self.enter(WatchState::Backoff);
                    tokio::select! {
                        biased;
                        _ = shutdown.recv() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        self.enter(WatchState::Stopped);
        tracing::info!(index = self.index.0, "Change watcher stopped");
        self.index
    }

    /// Rebuild and apply for `new_index`, committing it only on success.
    ///
    /// A reported index of 0 is stored as 1 so the next poll blocks.
    pub async fn handle_change(&mut self, new_index: RegistryIndex) -> Result<CycleOutcome, WatchError> {
        let new_index = RegistryIndex(new_index.0.max(1));
        if new_index == self.index && self.built_once {
            tracing::trace!(index = new_index.0, "No catalog change");
            return Ok(CycleOutcome::NoChange);
        }
        if new_index < self.index {
            tracing::warn!(held = self.index.0, reported = new_index.0, "Registry index went backwards, rebuilding");
        }

        let span = tracing::info_span!("cycle", id = %Uuid::new_v4(), index = new_index.0);
        let outcome = self.rebuild().instrument(span).await;

        match outcome {
            Ok(applied) => {
                self.enter(WatchState::Idle);
                self.index = new_index;
                self.built_once = true;
                metrics::set_index(new_index.0);

                Ok(match applied {
                    ApplyOutcome::Unchanged => {
                        metrics::record_cycle("unchanged");
                        CycleOutcome::Unchanged
                    }
                    ApplyOutcome::Reloaded { .. } => {
                        metrics::record_cycle("reloaded");
                        metrics::record_reload(true);
                        CycleOutcome::Reloaded
                    }
                })
            }
            Err(e) => {
                metrics::record_cycle("failed");
                if matches!(e, WatchError::Apply(ApplyError::Reload { .. })) {
                    metrics::record_reload(false);
                }
                Err(e)
            }
        }
    }

    async fn rebuild(&mut self) -> Result<ApplyOutcome, WatchError> {
        self.enter(WatchState::Rebuilding);
        let doc = self.assembler.build().await?;
        tracing::debug!(bytes = doc.len(), "Configuration rendered");

        self.enter(WatchState::Applying);
        Ok(self.apply.apply(&doc).await?)
    }

    fn enter(&mut self, next: WatchState) {
        tracing::trace!(from = ?self.state, to = ?next, "Watcher state change");
        self.state = next;
    }

    /// Log and count a failed cycle, then hand it to the error sink.
    fn report(&self, error: WatchError, delay: Duration) {
        let kind = error.kind();
        tracing::warn!(
            kind,
            stage = ?self.state,
            error = %error,
            retry_in_ms = delay.as_millis() as u64,
            index = self.index.0,
            "Cycle failed, will retry"
        );
        metrics::record_error(kind);
        let _ = self.errors.send(error);
    }
}

/// Drain the error sink into the log until every sender is gone.
/// Resolves to the number of errors seen.
pub fn log_errors(mut errors: mpsc::UnboundedReceiver<WatchError>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut seen = 0;
        while let Some(e) = errors.recv().await {
            seen += 1;
            tracing::error!(kind = e.kind(), error = %e, "Watcher error");
        }
        seen
    })
}
