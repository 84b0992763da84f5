//! rowfetch CLI — batch row enrichment over a remote lookup endpoint.
//!
//! Loads a CSV of row ids, fetches one JSON object per row from the
//! configured API, and writes the aggregated result as a JSON array.

use clap::Parser;
use rowfetch::config::{FetchConfig, LookupConfig, NotificationConfig, RetryConfig};
use rowfetch::{Config, Pipeline, RunOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Enrich CSV rows with per-row API lookups and export the result as JSON.
#[derive(Parser)]
#[command(
    name = "rowfetch",
    version,
    about = "Enrich CSV rows with per-row API lookups and export the result as JSON.",
    long_about = None,
)]
struct Cli {
    /// Input CSV path (must contain an `id` column).
    input: PathBuf,

    /// Output JSON path (overwritten if it exists).
    output: PathBuf,

    /// Lookup endpoint base URL; the row id is appended as `?id={id}`.
    #[arg(long, env = "API_URL")]
    api_url: String,

    /// Telegram bot token for completion notifications.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: String,

    /// Telegram chat id for completion notifications.
    #[arg(long, env = "CHAT_ID")]
    chat_id: String,

    /// Maximum number of lookups in flight at once.
    #[arg(long, default_value_t = 8)]
    workers: usize,

    /// Retry attempts per lookup after the initial one.
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Delay between lookup attempts, in seconds.
    #[arg(long, default_value_t = 10)]
    retry_delay: u64,

    /// Per-attempt request timeout, in seconds.
    #[arg(long, default_value_t = 30)]
    request_timeout: u64,

    /// Load and validate the input, then stop without fetching or writing.
    #[arg(long)]
    dry_run: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Initialize tracing based on CLI flags.
fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "rowfetch=info",
        1 => "rowfetch=debug",
        _ => "rowfetch=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

fn build_config(cli: &Cli) -> Config {
    Config {
        lookup: LookupConfig {
            base_url: cli.api_url.clone(),
            request_timeout: Duration::from_secs(cli.request_timeout),
            retry: RetryConfig {
                max_attempts: cli.retries,
                delay: Duration::from_secs(cli.retry_delay),
                backoff_multiplier: 1.0,
            },
        },
        fetch: FetchConfig {
            max_concurrent_lookups: cli.workers,
        },
        notification: NotificationConfig {
            bot_token: cli.bot_token.clone(),
            chat_id: cli.chat_id.clone(),
            ..Default::default()
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let pipeline = match Pipeline::new(build_config(&cli)) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let options = RunOptions {
        input: cli.input,
        output: cli.output,
        dry_run: cli.dry_run,
    };

    match pipeline.run(&options).await {
        Ok(report) if report.dry_run => {
            println!("dry run: {} rows would be fetched", report.rows_loaded);
            ExitCode::SUCCESS
        }
        Ok(report) => {
            println!(
                "{} rows written to {} in {:.1}s",
                report.rows_written,
                options.output.display(),
                report.elapsed.as_secs_f64()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}
