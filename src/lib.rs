//! # rowfetch
//!
//! Concurrent row-enrichment pipeline library.
//!
//! rowfetch loads an ordered set of row records from a CSV file, issues one
//! retried HTTP lookup per row across a bounded worker pool, aggregates the
//! results into a single ordered dataset, writes it as a JSON array through
//! an atomic rename, and sends a best-effort Telegram notification for both
//! success and failure.
//!
//! ## Design Philosophy
//!
//! rowfetch is designed to be:
//! - **Library-first** - The CLI binary is a thin wrapper; everything is embeddable
//! - **Explicitly configured** - Settings are resolved once at startup into a
//!   [`Config`] passed to every component, never read from ambient state
//! - **All-or-nothing** - A single terminal lookup failure discards the whole
//!   dataset rather than emitting a subset
//! - **Order-preserving** - Output rows follow input order no matter which
//!   lookup finishes first
//!
//! ## Quick Start
//!
//! ```no_run
//! use rowfetch::{Config, Pipeline, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let pipeline = Pipeline::new(config)?;
//!
//!     let report = pipeline
//!         .run(&RunOptions {
//!             input: "input.csv".into(),
//!             output: "output.json".into(),
//!             dry_run: false,
//!         })
//!         .await?;
//!
//!     println!("wrote {} rows", report.rows_written);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Result aggregation
pub mod aggregate;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Concurrent fetch coordination
pub mod fetch;
/// Input loading (CSV to ordered row records)
pub mod loader;
/// Remote lookup client
pub mod lookup;
/// Completion notifications
pub mod notify;
/// Flow orchestration
pub mod pipeline;
/// Retry logic for transient lookup failures
pub mod retry;
/// Core data model
pub mod types;
/// Output persistence
pub mod writer;

// Re-export commonly used types
pub use config::{Config, FetchConfig, LookupConfig, NotificationConfig, RetryConfig};
pub use error::{Error, LoadError, LookupError, NotifyError, Result};
pub use fetch::FetchCoordinator;
pub use loader::load_rows;
pub use lookup::{HttpLookupClient, LookupService};
pub use notify::Notifier;
pub use pipeline::{Pipeline, RunOptions};
pub use types::{AggregatedDataset, LookupResult, RowRecord, RunReport, TaskOutcome};
