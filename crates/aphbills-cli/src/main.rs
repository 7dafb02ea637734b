use std::path::PathBuf;
use std::process;
use std::time::Duration;

use aphbills::roster::fetch_roster;
use aphbills::snapshot::Snapshot;
use aphbills::staleness::staleness_report;
use aphbills::sync::{SyncConfig, sync_snapshot};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

const DEFAULT_OUTPUT: &str = "_data/bills.yml";

#[derive(Parser)]
#[command(name = "aphbills")]
#[command(about = "Keeps a snapshot of bills before the Parliament of Australia", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-sync every listed bill and atomically replace the snapshot
    Sync {
        #[arg(long, default_value = DEFAULT_OUTPUT, help = "Snapshot file to read and replace")]
        output: PathBuf,

        #[arg(
            long,
            default_value_t = 10,
            help = "Download attempts per URL",
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        retries: u32,

        #[arg(
            long,
            value_name = "SECS",
            default_value_t = 30,
            help = "Seconds to wait between download attempts"
        )]
        retry_delay: u64,

        #[arg(
            long,
            default_value_t = aphbills::minister::DEFAULT_MAX_TRANSCRIPT_STEPS,
            help = "Transcript entries to walk before giving up on a minister"
        )]
        max_transcript_steps: usize,
    },
    /// Report which stored bills the next sync would refetch, without network access
    Check {
        #[arg(long, default_value = DEFAULT_OUTPUT, help = "Snapshot file to inspect")]
        output: PathBuf,

        #[arg(
            short = 'o',
            long = "format",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Sync {
            output,
            retries,
            retry_delay,
            max_transcript_steps,
        } => {
            let mut config = SyncConfig {
                max_transcript_steps,
                ..SyncConfig::default()
            };
            config.retry.attempts = retries;
            config.retry.delay = Duration::from_secs(retry_delay);

            let fetcher = config.fetcher().unwrap_or_else(|e| {
                log::error!("Error creating HTTP client: {}", e);
                process::exit(1);
            });

            log::info!("Fetching legislator roster...");
            let roster = fetch_roster(&fetcher).await.unwrap_or_else(|e| {
                log::error!("Error fetching legislator roster: {}", e);
                process::exit(1);
            });
            log::info!(
                "Loaded {} legislators (ruling party: {})",
                roster.legislators().len(),
                roster.ruling_party().unwrap_or("unknown")
            );

            let stats = sync_snapshot(&fetcher, &roster, &output, config)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error syncing bills, {:?} left unchanged: {}", output, e);
                    process::exit(1);
                });

            log::info!("Wrote {:?}", output);
            print!("{}", stats);
        }

        Commands::Check { output, format } => {
            let snapshot = match Snapshot::load(&output) {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => {
                    log::warn!("No snapshot at {:?}, every bill would be fetched", output);
                    Snapshot::default()
                }
                Err(e) => {
                    log::error!("Error reading snapshot: {}", e);
                    process::exit(1);
                }
            };

            let report = staleness_report(&snapshot);

            match format {
                OutputFormat::Json => serialize_json(&report),
                OutputFormat::Text => {
                    if report.is_empty() {
                        println!("No entries to display.");
                    } else {
                        for (i, entry) in report.iter().enumerate() {
                            println!("{:>3}. {}", i + 1, entry);
                        }
                        let stale = report.iter().filter(|e| e.reason.is_some()).count();
                        println!(
                            "\n{} of {} bill(s) would be fetched again",
                            stale,
                            report.len()
                        );
                    }
                }
            }
        }
    }
}
