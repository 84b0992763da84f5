//! Concurrent fetch coordination
//!
//! Dispatches one lookup per row record across a bounded worker pool, tracks
//! a per-row outcome, cancels in-flight work on the first terminal failure,
//! and enforces the all-or-nothing aggregation contract.

use crate::error::LookupError;
use crate::lookup::LookupService;
use crate::types::{LookupResult, RowRecord, TaskOutcome};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Coordinates one lookup per row across a bounded worker pool
pub struct FetchCoordinator {
    lookup: Arc<dyn LookupService>,
    max_concurrent: usize,
}

impl FetchCoordinator {
    /// Create a coordinator over the given lookup service
    ///
    /// `max_concurrent` bounds the number of lookups in flight at once; it is
    /// clamped to at least 1.
    pub fn new(lookup: Arc<dyn LookupService>, max_concurrent: usize) -> Self {
        Self {
            lookup,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Dispatch one lookup per row and resolve every outcome
    ///
    /// Returns exactly one [`TaskOutcome`] per input row, indexed in input
    /// order regardless of wall-clock completion order. On the first terminal
    /// failure a shared cancellation token is signalled: in-flight lookups
    /// abandon their retries mid-delay, and rows still queued behind the
    /// concurrency cap resolve as cancelled without issuing a request. No row
    /// is ever dropped silently.
    pub async fn dispatch(&self, rows: Vec<RowRecord>) -> Vec<TaskOutcome> {
        let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
        let cancel = CancellationToken::new();

        let resolved: Vec<(usize, TaskOutcome)> = stream::iter(rows.into_iter().enumerate())
            .map(|(index, row)| {
                let lookup = Arc::clone(&self.lookup);
                let cancel = cancel.clone();
                async move {
                    let outcome = if cancel.is_cancelled() {
                        // The run is already doomed; don't start new work
                        TaskOutcome::Failed(LookupError::Cancelled { id: row.id })
                    } else {
                        let cancelled_id = row.id.clone();
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                tracing::debug!(id = %cancelled_id, "lookup abandoned after cancellation");
                                TaskOutcome::Failed(LookupError::Cancelled { id: cancelled_id })
                            }
                            result = lookup.lookup(&row.id) => match result {
                                Ok(value) => TaskOutcome::Succeeded(value),
                                Err(e) => {
                                    tracing::error!(
                                        id = %row.id,
                                        error = %e,
                                        "lookup failed terminally, cancelling remaining lookups"
                                    );
                                    cancel.cancel();
                                    TaskOutcome::Failed(e)
                                }
                            }
                        }
                    };
                    (index, outcome)
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        // Scatter completions back into input-order slots
        let mut outcomes: Vec<TaskOutcome> =
            (0..ids.len()).map(|_| TaskOutcome::Pending).collect();
        for (index, outcome) in resolved {
            outcomes[index] = outcome;
        }
        // The stream yields every index exactly once; backfill defensively so
        // the one-outcome-per-row contract holds even if that ever changes
        for (index, outcome) in outcomes.iter_mut().enumerate() {
            if outcome.is_pending() {
                *outcome = TaskOutcome::Failed(LookupError::Cancelled {
                    id: ids[index].clone(),
                });
            }
        }
        outcomes
    }

    /// Fetch all rows with all-or-nothing semantics
    ///
    /// On success returns one result per row, in input order. Any terminal
    /// failure discards every partial result and returns the first
    /// non-cancellation failure in dispatch order (falling back to the first
    /// cancellation if nothing else is available).
    pub async fn fetch_all(&self, rows: Vec<RowRecord>) -> Result<Vec<LookupResult>, LookupError> {
        let total = rows.len();
        let outcomes = self.dispatch(rows).await;

        let mut results = Vec::with_capacity(total);
        let mut first_failure: Option<LookupError> = None;
        let mut first_cancelled: Option<LookupError> = None;

        for outcome in outcomes {
            match outcome {
                TaskOutcome::Succeeded(value) => results.push(value),
                TaskOutcome::Failed(e) => {
                    if matches!(e, LookupError::Cancelled { .. }) {
                        if first_cancelled.is_none() {
                            first_cancelled = Some(e);
                        }
                    } else if first_failure.is_none() {
                        first_failure = Some(e);
                    }
                }
                // dispatch resolves every slot
                TaskOutcome::Pending => continue,
            }
        }

        if let Some(error) = first_failure.or(first_cancelled) {
            return Err(error);
        }

        tracing::info!(rows = results.len(), "all lookups succeeded");
        Ok(results)
    }
}
