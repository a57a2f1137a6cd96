// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! cloudcost CLI - cloud billing aggregation from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Aggregate every account, write the CSV and post to Mattermost
//! cloudcost
//!
//! # Only Azure and Heroku, nothing delivered
//! cloudcost --dry cost --provider azure --provider heroku
//!
//! # Long-running machines
//! cloudcost life
//!
//! # Register an account
//! cloudcost add --provider heroku --account main --cred api_key=...
//!
//! # List adapters and their credential fields
//! cloudcost providers
//! ```

mod app;
mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{accounts, cost, life, providers, token};

// ============================================================================
// CLI Definition
// ============================================================================

/// cloudcost CLI - cloud billing aggregation.
#[derive(Parser)]
#[command(name = "cloudcost")]
#[command(about = "Cloud billing aggregation across infrastructure providers")]
#[command(long_about = r#"
cloudcost collects the current bill of every registered cloud account,
writes a CSV export and posts it, together with failures and long-running
machines, to a Mattermost channel.

Examples:
  cloudcost                          # Cost run over every account
  cloudcost --dry                    # Same, without delivery
  cloudcost cost --provider azure    # One provider
  cloudcost life                     # Long-running machine check
  cloudcost providers                # Supported providers
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'cost' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file.
    #[arg(long, env = "CLOUDCOST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Write the export but deliver nothing.
    #[arg(long, global = true)]
    pub dry: bool,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate costs (default if no command specified).
    #[command(visible_alias = "c")]
    Cost(cost::FilterArgs),

    /// Report machines billed for more than seven days.
    #[command(visible_alias = "l")]
    Life(cost::FilterArgs),

    /// List supported providers.
    #[command(visible_alias = "p")]
    Providers,

    /// List stored accounts in run order.
    Accounts(accounts::ListArgs),

    /// Add an account.
    Add(accounts::CredentialArgs),

    /// Replace an account's credentials.
    Update(accounts::CredentialArgs),

    /// Remove an account.
    Remove(accounts::AccountRef),

    /// Enable an account.
    Enable(accounts::AccountRef),

    /// Disable an account.
    Disable(accounts::AccountRef),

    /// Set the run order, e.g. `order heroku:main azure:prod`.
    Order(accounts::OrderArgs),

    /// Store the Mattermost token in the system keychain.
    Token(token::TokenArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// Fatal error, e.g. the account store is unavailable.
    Error = 1,
    /// At least one delivery target exhausted its retries.
    DeliveryFailed = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("cloudcost=debug,warn")
        } else {
            EnvFilter::new("cloudcost=info,warn")
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Cost(args)) => cost::run(args, &cli).await,
        None => cost::run(&cost::FilterArgs::default(), &cli).await,
        Some(Commands::Life(args)) => life::run(args, &cli).await,
        Some(Commands::Providers) => providers::run(&cli),
        Some(Commands::Accounts(args)) => accounts::list(args, &cli),
        Some(Commands::Add(args)) => accounts::add(args, &cli),
        Some(Commands::Update(args)) => accounts::update(args, &cli),
        Some(Commands::Remove(args)) => accounts::remove(args, &cli),
        Some(Commands::Enable(args)) => accounts::set_enabled(args, true, &cli),
        Some(Commands::Disable(args)) => accounts::set_enabled(args, false, &cli),
        Some(Commands::Order(args)) => accounts::order(args, &cli),
        Some(Commands::Token(args)) => token::run(args),
    };

    match result {
        Ok(ExitCode::Success) => Ok(()),
        Ok(code) => std::process::exit(code as i32),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            std::process::exit(ExitCode::Error as i32);
        }
    }
}
