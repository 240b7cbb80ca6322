//! Tally main entry point

mod render;

use anyhow::Context;
use chrono::DateTime;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tally_api::start_server;
use tally_config::Config;
use tally_core::Tally;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(version = "0.1.0")]
#[command(about = "Insights for university dining plans from a pasted transaction history", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a pasted transaction table and print its transport string
    Parse {
        /// File holding the table; reads stdin when absent
        file: Option<PathBuf>,
        /// Print the report link instead of the bare string
        #[arg(long)]
        link: bool,
    },
    /// Render the report of a transport string
    Report {
        /// Transport string, optionally with the leading '#'
        encoded: String,
        /// Only report this account
        #[arg(short, long)]
        account: Option<String>,
        /// Reference instant (RFC 3339) instead of the current time
        #[arg(long)]
        now: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the JSON HTTP API
    Serve,
    /// Print the default configuration
    Config,
}

/// Load the configuration, reporting failures with their code and suggestions
fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load_or_default(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration from {}\n{}",
            path.display(),
            e.to_details()
        )
    })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Command::Config = args.command {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = load_config(&args.config)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str())).init();
    log::debug!(
        "Config loaded: offset={}, import_place={}",
        config.utc_offset(),
        config.report.import_place
    );

    match args.command {
        Command::Parse { file, link } => {
            let content = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut content = String::new();
                    std::io::stdin()
                        .read_to_string(&mut content)
                        .context("Failed to read stdin")?;
                    content
                }
            };

            let tally = Tally::new(&config);
            let submission = tally.submit(&content)?;
            if link {
                println!("{}", submission.report_path);
            } else {
                println!("{}", submission.encoded);
            }
        }
        Command::Report {
            encoded,
            account,
            now,
            json,
        } => {
            let tally = Tally::new(&config);
            let now = match now {
                Some(value) => DateTime::parse_from_rfc3339(&value)
                    .with_context(|| format!("Invalid --now value: {}", value))?,
                None => tally.now(),
            };

            let report = tally.report(&encoded, account.as_deref(), &now)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render::render_report(&report));
            }
        }
        Command::Serve => {
            let rt = Runtime::new()?;
            rt.block_on(start_server(config))
                .context("Server error")?;
        }
        // Printed before the configuration is loaded
        Command::Config => {}
    }

    Ok(())
}
