//! `jcblock` command line.

use chrono::Utc;
use clap::{Parser, Subcommand};
use jcb_common::Error;
use jcb_config::{resolve_config, ScreenerConfig};
use jcb_core::exit_codes::ExitCode;
use jcb_core::lists::{ListStore, StorePaths};
use jcb_core::logging::{init_logging, LogFormat};
use jcb_core::{daemon, evaluate, purge_stale, PurgePolicy, Verdict};
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

/// Junk call screener for one analog phone line.
#[derive(Parser)]
#[command(name = "jcblock", version, about)]
struct Cli {
    /// Configuration file (default: $JCBLOCK_CONFIG, then the XDG config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the list files and call log.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Log level when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Machine-readable output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen calls until stopped.
    Run {
        /// Modem device, overriding the configuration.
        #[arg(long)]
        port: Option<PathBuf>,
    },
    /// Show how a caller would be screened, without recording activity.
    Check {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        number: String,
    },
    /// Remove stale block entries now.
    Purge {
        /// Report what would be removed without changing anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print both lists with block activity.
    Lists,
    /// Print the resolved configuration.
    Config,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, &cli.log_level);

    let json = cli.json;
    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            if json {
                println!("{}", json!({ "error": e.to_string(), "code": e.code() }));
            } else {
                eprintln!("jcblock: {e}");
            }
            ExitCode::for_error(&e)
        }
    };
    std::process::exit(code.as_i32());
}

fn load_config(cli: &Cli) -> Result<ScreenerConfig, Error> {
    let (mut config, paths) =
        resolve_config(cli.config.as_deref()).map_err(|e| Error::Config(e.to_string()))?;
    debug!(source = ?paths.source, file = ?paths.config_file, "configuration resolved");
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn dispatch(cli: Cli) -> Result<ExitCode, Error> {
    let mut config = load_config(&cli)?;
    match cli.command {
        Commands::Run { port } => {
            if let Some(port) = port {
                config.modem.port = port;
            }
            daemon::run_blocking(config)?;
            Ok(ExitCode::Clean)
        }
        Commands::Check { name, number } => {
            let store = ListStore::open(StorePaths::from_config(&config))?;
            let verdict = evaluate(&store.snapshot(), &name, &number);
            if cli.json {
                let (outcome, matched) = match &verdict {
                    Verdict::Allowed(m) => ("allowed", Some(m)),
                    Verdict::Blocked(m) => ("blocked", Some(m)),
                    Verdict::Unknown => ("unknown", None),
                };
                println!("{}", json!({ "verdict": outcome, "match": matched }));
            } else {
                println!("{verdict}");
            }
            Ok(match verdict {
                Verdict::Allowed(_) => ExitCode::Clean,
                Verdict::Blocked(_) => ExitCode::WouldBlock,
                Verdict::Unknown => ExitCode::WouldPrompt,
            })
        }
        Commands::Purge { dry_run } => {
            let store = ListStore::open(StorePaths::from_config(&config))?;
            let report = purge_stale(
                &store,
                &PurgePolicy::from_config(&config.purge),
                Utc::now(),
                config.purge_archive_path().as_deref(),
                dry_run,
            );
            store.flush()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let verb = if dry_run { "would remove" } else { "removed" };
                println!("checked {} block entries, {verb} {}", report.checked, report.removed.len());
                for entry in &report.removed {
                    let last = entry
                        .last_activity
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "never".to_string());
                    println!("  {}  (last activity {last}, {} matches)", entry.pattern, entry.match_count);
                }
            }
            Ok(ExitCode::Clean)
        }
        Commands::Lists => {
            let store = ListStore::open(StorePaths::from_config(&config))?;
            print_lists(&store, cli.json)?;
            Ok(ExitCode::Clean)
        }
        Commands::Config => {
            let toml = config
                .to_toml()
                .map_err(|e| Error::Config(e.to_string()))?;
            print!("{toml}");
            let validation = config.validate();
            if validation.is_ok() {
                Ok(ExitCode::Clean)
            } else {
                eprintln!("{validation}");
                Ok(ExitCode::ConfigError)
            }
        }
    }
}

fn print_lists(store: &ListStore, as_json: bool) -> Result<(), Error> {
    let lists = store.snapshot();
    let activity = store.activity();

    if as_json {
        let allow: Vec<_> = lists
            .allow
            .entries()
            .iter()
            .map(|e| json!({ "pattern": e.pattern(), "permanent": e.is_permanent(), "comment": e.comment() }))
            .collect();
        let block: Vec<_> = lists
            .block
            .entries()
            .iter()
            .map(|e| {
                json!({
                    "pattern": e.pattern(),
                    "permanent": e.is_permanent(),
                    "comment": e.comment(),
                    "activity": activity.get(e.pattern()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "allow": allow, "block": block }))?);
        return Ok(());
    }

    println!("allow ({}):", lists.allow.len());
    for e in lists.allow.entries() {
        println!("  {}  {}", e.pattern(), e.comment());
    }
    println!("block ({}):", lists.block.len());
    for e in lists.block.entries() {
        let flag = if e.is_permanent() { "p" } else { " " };
        match activity.get(e.pattern()) {
            Some(a) => println!(
                "  [{flag}] {}  last {}  matches {}  {}",
                e.pattern(),
                a.last_activity().format("%Y-%m-%d"),
                a.match_count,
                e.comment()
            ),
            None => println!("  [{flag}] {}  {}", e.pattern(), e.comment()),
        }
    }
    Ok(())
}
