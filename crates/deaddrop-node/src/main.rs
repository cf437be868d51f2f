//! Deaddrop command-line binary.
//!
//! # Usage
//!
//! ```bash
//! # Create a drop from stdin and print the reference
//! echo -n "launch codes: 4815162342" | deaddrop --base https://drop.example/d/ create
//!
//! # Burn and read it (prints the secret once)
//! deaddrop open 'https://drop.example/d/<id>#<key>'
//!
//! # Evict drops nobody opened within a day
//! deaddrop purge --older-than-secs 86400
//! ```

use std::{
    io::{self, Read, Write},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

use clap::{Parser, Subcommand};
use deaddrop_core::{BurnOutcome, DropConfig, DropError, Environment, ReferenceError, check_base};
use deaddrop_node::{SystemEnv, open_node};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

/// Exit status when the drop was already consumed or never existed.
const EXIT_DESTROYED: u8 = 2;

/// Exit status for a transient storage failure (safe to retry).
const EXIT_UNAVAILABLE: u8 = 3;

/// One-time encrypted dead drops
#[derive(Parser, Debug)]
#[command(name = "deaddrop")]
#[command(about = "Create and burn one-time encrypted messages")]
#[command(version)]
struct Args {
    /// Path to the drop database
    #[arg(long, default_value = "deaddrop.redb")]
    db: PathBuf,

    /// Prefix placed before the drop id in generated references (empty, or
    /// ending in '/')
    #[arg(long, default_value = "", value_parser = parse_base)]
    base: String,

    /// Timeout for each store operation, in milliseconds
    #[arg(long, default_value = "10000")]
    timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a message, store it, and print the reference
    Create {
        /// Message text (read from stdin if omitted)
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Burn a drop and print its message
    Open {
        /// Reference produced by `create`
        reference: String,

        /// Use a single atomic take instead of read-then-delete
        #[arg(long)]
        atomic: bool,
    },

    /// Delete drops nobody opened within the retention window
    Purge {
        /// Remove drops created more than this many seconds ago
        #[arg(long)]
        older_than_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout carries only references and secrets; logs go to stderr.
    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let config = DropConfig {
        store_timeout: Duration::from_millis(args.timeout_ms),
        reference_base: args.base,
        ..DropConfig::default()
    };

    let node = open_node(&args.db, config)?;

    match args.command {
        Command::Create { message } => {
            let plaintext = match message {
                Some(message) => {
                    tracing::warn!("message passed as an argument may be visible to other users");
                    Zeroizing::new(message.into_bytes())
                },
                None => {
                    let mut buffer = Zeroizing::new(Vec::new());
                    io::stdin().read_to_end(&mut buffer)?;
                    buffer
                },
            };

            match node.create_drop(&plaintext).await {
                Ok(reference) => {
                    let rendered = Zeroizing::new(reference.to_string());
                    writeln!(io::stdout().lock(), "{}", rendered.as_str())?;
                    Ok(ExitCode::SUCCESS)
                },
                Err(err) => Ok(report(&err)?),
            }
        },
        Command::Open { reference, atomic } => {
            let reference = Zeroizing::new(reference);
            let outcome = if atomic {
                node.open_drop_atomic(&reference).await
            } else {
                node.open_drop(&reference).await
            };

            match outcome {
                Ok(BurnOutcome::Revealed(payload)) => {
                    let mut stdout = io::stdout().lock();
                    stdout.write_all(payload.as_bytes())?;
                    stdout.flush()?;
                    Ok(ExitCode::SUCCESS)
                },
                Ok(BurnOutcome::Destroyed) => {
                    writeln!(io::stderr().lock(), "drop not found: already opened or never existed")?;
                    Ok(ExitCode::from(EXIT_DESTROYED))
                },
                Err(err) => Ok(report(&err)?),
            }
        },
        Command::Purge { older_than_secs } => {
            let cutoff = SystemEnv::new().wall_clock_secs().saturating_sub(older_than_secs);
            let purged = node.store().purge_created_before(cutoff).await?;
            tracing::info!(purged, cutoff, "purged expired drops");
            writeln!(io::stdout().lock(), "{purged}")?;
            Ok(ExitCode::SUCCESS)
        },
    }
}

/// Reject a base that would produce references nobody can open.
fn parse_base(raw: &str) -> Result<String, ReferenceError> {
    check_base(raw)?;
    Ok(raw.to_string())
}

/// Print a user-facing error and pick the exit status.
///
/// Retryable storage failures get their own status so scripts can retry
/// without re-parsing messages.
fn report(err: &DropError) -> io::Result<ExitCode> {
    writeln!(io::stderr().lock(), "error: {err}")?;

    Ok(if err.is_retryable() { ExitCode::from(EXIT_UNAVAILABLE) } else { ExitCode::FAILURE })
}
