//! LapseKV command-line front end.
//!
//! - `lapsekv repl` reads commands from stdin and prints one reply per line
//! - `lapsekv conformance` runs the generated suite against a fresh engine
//! - `lapsekv listing` prints the generated suite as readable text

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use lapsekv::clock::{Clock, ManualClock, SystemClock};
use lapsekv::commands::{CommandHandler, Reply};
use lapsekv::config::{EngineConfig, ReclaimConfig, DEFAULT_MAX_KEY_LEN, DEFAULT_MAX_VALUE_LEN};
use lapsekv::conformance::{run_suite, Action, EngineDriver, ListingDriver, SuiteConfig};
use lapsekv::engine::{Engine, Reclaimer};
use lapsekv::storage::DEFAULT_SHARDS;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lapsekv")]
#[command(version)]
#[command(about = "Item store with lazy expiry and a generated conformance suite")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Number of store shards
    #[arg(long, global = true, default_value_t = DEFAULT_SHARDS)]
    shards: usize,

    /// Longest accepted key, in bytes
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_KEY_LEN)]
    max_key_len: usize,

    /// Longest accepted value, in bytes
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_VALUE_LEN)]
    max_value_len: usize,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "lapsekv=debug")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin, one per line
    ///
    /// Examples:
    ///   lapsekv repl                       # Logical clock, starts at 0
    ///   lapsekv repl --system-clock        # Clock follows wall time
    Repl {
        /// Drive expiry from wall-clock seconds instead of a logical clock
        #[arg(long)]
        system_clock: bool,
        /// Run the background reclaimer
        #[arg(long)]
        reclaim: bool,
    },
    /// Run the generated suite against the engine
    ///
    /// Exits non-zero if any sequence fails.
    Conformance(SuiteArgs),
    /// Print the generated suite as a listing
    Listing(SuiteArgs),
}

#[derive(Args)]
struct SuiteArgs {
    /// Actions per sequence (at most 6)
    #[arg(long, default_value_t = 4)]
    length: usize,
    /// Most times one action may repeat within a sequence
    #[arg(long, default_value_t = 3)]
    duplicates: usize,
    /// TTL of stored items, in seconds
    #[arg(long, default_value_t = lapsekv::conformance::DEFAULT_EXPIRY,
          value_parser = clap::value_parser!(u32).range(1..))]
    expiry: u32,
    /// Key every sequence operates on
    #[arg(long, default_value = lapsekv::conformance::DEFAULT_KEY)]
    key: String,
    /// Restrict to these actions (comma separated, e.g. "add,delay,set")
    #[arg(long, value_delimiter = ',')]
    actions: Vec<String>,
}

impl SuiteArgs {
    fn into_config(self, max_key_len: usize) -> Result<SuiteConfig> {
        let actions = if self.actions.is_empty() {
            Action::ALL.to_vec()
        } else {
            self.actions
                .iter()
                .map(|name| {
                    Action::from_name(name.trim())
                        .with_context(|| format!("unknown action '{}'", name))
                })
                .collect::<Result<Vec<_>>>()?
        };

        let suite = SuiteConfig {
            actions,
            length: self.length,
            duplicates: self.duplicates,
            expiry: self.expiry,
            key: self.key,
        };
        suite
            .validate(max_key_len)
            .context("invalid suite options")?;
        Ok(suite)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::new()
        .with_shards(cli.shards)
        .with_max_key_len(cli.max_key_len)
        .with_max_value_len(cli.max_value_len);
    debug!(?config, "engine configuration");

    match cli.command {
        Commands::Repl {
            system_clock,
            reclaim,
        } => repl(config, system_clock, reclaim).await,
        Commands::Conformance(args) => {
            let suite = args.into_config(config.max_key_len)?;
            conformance(config, suite)
        }
        Commands::Listing(args) => {
            let suite = args.into_config(config.max_key_len)?;
            let mut driver = ListingDriver::new();
            run_suite(&suite, &mut driver);
            print!("{}", driver.into_string());
            Ok(())
        }
    }
}

fn conformance(config: EngineConfig, suite: SuiteConfig) -> Result<()> {
    let mut driver = EngineDriver::new(config, suite.key.clone(), suite.expiry);
    run_suite(&suite, &mut driver);
    let report = driver.into_report();

    for failure in &report.failures {
        println!("FAIL {}", failure.name());
        for step in &failure.steps {
            match (step.step, step.action) {
                (Some(index), Some(action)) => {
                    println!("    step {} ({}): {}", index, action.name(), step.error)
                }
                _ => println!("    final check: {}", step.error),
            }
        }
    }
    println!(
        "{} sequences, {} passed, {} failed",
        report.total,
        report.passed,
        report.failures.len()
    );

    if !report.is_success() {
        bail!("{} of {} sequences failed", report.failures.len(), report.total);
    }
    Ok(())
}

async fn repl(config: EngineConfig, system_clock: bool, reclaim: bool) -> Result<()> {
    let clock: Arc<dyn Clock> = if system_clock {
        Arc::new(SystemClock::new())
    } else {
        Arc::new(ManualClock::new())
    };
    let engine = Arc::new(Engine::new(config, clock));
    info!(shards = engine.store().shard_count(), system_clock, "engine ready");

    let _reclaimer =
        reclaim.then(|| Reclaimer::start(Arc::clone(&engine), ReclaimConfig::default()));

    let handler = CommandHandler::new(engine);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let Some(reply) = handler.execute(&line) else {
            continue;
        };
        if let Reply::Error { kind, message } = &reply {
            warn!(%kind, %message, "command failed");
        }

        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
        stdout.flush().await?;

        if reply == Reply::Quit {
            break;
        }
    }

    info!("session closed");
    Ok(())
}
