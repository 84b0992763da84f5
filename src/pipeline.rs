//! Flow orchestration: the pipeline state machine
//!
//! Sequences `LOAD → FETCH_ALL → AGGREGATE → WRITE → NOTIFY → DONE`. A
//! failure in any stage before `NOTIFY` routes through `NOTIFY` (so the
//! channel hears about failures too) into the terminal `FAILED` state.
//! Notification delivery failures never change the terminal state.

use crate::aggregate::aggregate;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::FetchCoordinator;
use crate::loader::load_rows;
use crate::lookup::{HttpLookupClient, LookupService};
use crate::notify::Notifier;
use crate::types::{AggregatedDataset, LookupResult, RowRecord, RunReport};
use crate::writer::write_dataset;
use std::path::PathBuf;
use std::sync::Arc;

/// Per-run invocation parameters
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Input CSV path; must contain an `id` column
    pub input: PathBuf,

    /// Output JSON path; overwritten if it exists
    pub output: PathBuf,

    /// Stop after loading, reporting what would be fetched
    pub dry_run: bool,
}

/// Carry-through of a completed write, used to build the final report
struct Written {
    rows_loaded: usize,
    rows_written: usize,
}

/// Pipeline states; failures skip `Write` and reach `Failed` via `Notify`
enum FlowState {
    Load,
    FetchAll {
        rows: Vec<RowRecord>,
    },
    Aggregate {
        rows_loaded: usize,
        results: Vec<LookupResult>,
    },
    Write {
        rows_loaded: usize,
        dataset: AggregatedDataset,
    },
    Notify {
        outcome: std::result::Result<Written, Error>,
    },
    Done {
        written: Written,
    },
    Failed {
        error: Error,
    },
}

impl FlowState {
    fn name(&self) -> &'static str {
        match self {
            FlowState::Load => "LOAD",
            FlowState::FetchAll { .. } => "FETCH_ALL",
            FlowState::Aggregate { .. } => "AGGREGATE",
            FlowState::Write { .. } => "WRITE",
            FlowState::Notify { .. } => "NOTIFY",
            FlowState::Done { .. } => "DONE",
            FlowState::Failed { .. } => "FAILED",
        }
    }
}

/// Batch row-enrichment pipeline
///
/// Built once from a validated [`Config`]; each [`run`](Pipeline::run) is one
/// complete load/fetch/aggregate/write/notify cycle.
pub struct Pipeline {
    config: Arc<Config>,
    lookup: Arc<dyn LookupService>,
    notifier: Notifier,
}

impl Pipeline {
    /// Build a pipeline from configuration
    ///
    /// Validates the configuration and wires an HTTP lookup client and the
    /// Telegram notifier over one shared connection pool.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::new();
        let lookup = Arc::new(HttpLookupClient::with_client(
            http.clone(),
            config.lookup.clone(),
        ));
        let notifier = Notifier::with_client(http, config.notification.clone());
        Ok(Self {
            config: Arc::new(config),
            lookup,
            notifier,
        })
    }

    /// Build a pipeline with a custom lookup service
    ///
    /// The seam the fetch stage is tested through; production code uses
    /// [`Pipeline::new`].
    pub fn with_lookup(config: Config, lookup: Arc<dyn LookupService>) -> Result<Self> {
        config.validate()?;
        let notifier = Notifier::new(config.notification.clone());
        Ok(Self {
            config: Arc::new(config),
            lookup,
            notifier,
        })
    }

    /// Execute one run of the pipeline
    ///
    /// Returns the run report on success. On failure the error of the stage
    /// that failed is returned after the failure notification was attempted;
    /// no output file is produced in that case.
    pub async fn run(&self, options: &RunOptions) -> Result<RunReport> {
        let started_at = chrono::Utc::now();
        let start = std::time::Instant::now();
        tracing::info!(
            input = %options.input.display(),
            output = %options.output.display(),
            dry_run = options.dry_run,
            "starting pipeline run"
        );

        let mut state = FlowState::Load;
        loop {
            tracing::debug!(state = state.name(), "entering pipeline state");
            state = match state {
                FlowState::Load => match load_rows(&options.input) {
                    Ok(rows) => {
                        tracing::info!(rows = rows.len(), "input loaded");
                        if options.dry_run {
                            tracing::info!(
                                rows = rows.len(),
                                "dry run: skipping fetch, write, and notify"
                            );
                            return Ok(RunReport {
                                rows_loaded: rows.len(),
                                rows_written: 0,
                                output: None,
                                started_at,
                                elapsed: start.elapsed(),
                                dry_run: true,
                            });
                        }
                        FlowState::FetchAll { rows }
                    }
                    Err(e) if options.dry_run => return Err(e.into()),
                    Err(e) => FlowState::Notify {
                        outcome: Err(e.into()),
                    },
                },

                FlowState::FetchAll { rows } => {
                    let rows_loaded = rows.len();
                    let coordinator = FetchCoordinator::new(
                        Arc::clone(&self.lookup),
                        self.config.fetch.max_concurrent_lookups,
                    );
                    match coordinator.fetch_all(rows).await {
                        Ok(results) => FlowState::Aggregate {
                            rows_loaded,
                            results,
                        },
                        Err(e) => FlowState::Notify {
                            outcome: Err(e.into()),
                        },
                    }
                }

                FlowState::Aggregate {
                    rows_loaded,
                    results,
                } => FlowState::Write {
                    rows_loaded,
                    dataset: aggregate(results),
                },

                FlowState::Write {
                    rows_loaded,
                    dataset,
                } => match write_dataset(&dataset, &options.output).await {
                    Ok(()) => FlowState::Notify {
                        outcome: Ok(Written {
                            rows_loaded,
                            rows_written: dataset.len(),
                        }),
                    },
                    Err(e) => FlowState::Notify { outcome: Err(e) },
                },

                FlowState::Notify { outcome } => {
                    let text = match &outcome {
                        Ok(written) => format!(
                            "Row enrichment completed successfully: {} rows written to {}",
                            written.rows_written,
                            options.output.display()
                        ),
                        Err(error) => format!("Row enrichment failed: {error}"),
                    };
                    self.notifier.notify(&text).await;
                    match outcome {
                        Ok(written) => FlowState::Done { written },
                        Err(error) => FlowState::Failed { error },
                    }
                }

                FlowState::Done { written } => {
                    let report = RunReport {
                        rows_loaded: written.rows_loaded,
                        rows_written: written.rows_written,
                        output: Some(options.output.clone()),
                        started_at,
                        elapsed: start.elapsed(),
                        dry_run: false,
                    };
                    tracing::info!(
                        rows = report.rows_written,
                        elapsed_ms = report.elapsed.as_millis() as u64,
                        "pipeline run finished"
                    );
                    return Ok(report);
                }

                FlowState::Failed { error } => {
                    tracing::error!(error = %error, "pipeline run failed");
                    return Err(error);
                }
            };
        }
    }
}
