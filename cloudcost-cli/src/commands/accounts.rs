//! Account management commands.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use cloudcost_core::{Account, Credentials};
use cloudcost_providers::ProviderRegistry;
use cloudcost_store::{AccountFilter, AccountStore};
use tracing::info;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{app, Cli, ExitCode, OutputFormat};

// ============================================================================
// Arguments
// ============================================================================

/// Arguments for the accounts command.
#[derive(Args)]
pub struct ListArgs {
    /// Provider id to include. Repeat for several.
    #[arg(long, short)]
    pub provider: Vec<String>,
}

/// Identifies one account.
#[derive(Args)]
pub struct AccountRef {
    /// Provider id.
    #[arg(long, short)]
    pub provider: String,

    /// Account name.
    #[arg(long, short)]
    pub account: String,
}

/// Account plus credentials.
#[derive(Args)]
pub struct CredentialArgs {
    /// Provider id.
    #[arg(long, short)]
    pub provider: String,

    /// Account name.
    #[arg(long, short)]
    pub account: String,

    /// Credential as `key=value`. Repeat for each field.
    #[arg(long = "cred", value_name = "KEY=VALUE")]
    pub credentials: Vec<String>,
}

/// Arguments for the order command.
#[derive(Args)]
pub struct OrderArgs {
    /// Accounts as `provider:name`, first runs first.
    #[arg(required = true, value_name = "PROVIDER:NAME")]
    pub entries: Vec<String>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses `key=value` pairs.
pub fn parse_credentials(pairs: &[String]) -> Result<Credentials> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{pair}'"))
        })
        .collect()
}

/// Parses `provider:name`.
pub fn parse_order_entry(entry: &str) -> Result<(String, String)> {
    entry
        .split_once(':')
        .filter(|(provider, name)| !provider.is_empty() && !name.is_empty())
        .map(|(provider, name)| (provider.to_string(), name.to_string()))
        .ok_or_else(|| anyhow!("expected PROVIDER:NAME, got '{entry}'"))
}

/// Checks credentials against the provider's schema.
fn validated(registry: &ProviderRegistry, provider: &str, pairs: &[String]) -> Result<Credentials> {
    let adapter = registry.resolve(provider)?;
    let credentials = parse_credentials(pairs)?;
    credentials
        .validate(adapter.credential_schema())
        .with_context(|| format!("credentials for {provider}"))?;
    Ok(credentials)
}

// ============================================================================
// Commands
// ============================================================================

/// Lists accounts in run order.
pub fn list(args: &ListArgs, cli: &Cli) -> Result<ExitCode> {
    let config = app::load_config(cli)?;
    let store = app::open_store(&config)?;
    let filter = AccountFilter {
        providers: args.provider.clone(),
        account: None,
    };
    let accounts = store.list_accounts(&filter)?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            print!("{}", formatter.format_accounts(&accounts));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_accounts(&accounts)?);
        }
    }
    Ok(ExitCode::Success)
}

/// Adds an account.
pub fn add(args: &CredentialArgs, cli: &Cli) -> Result<ExitCode> {
    let credentials = validated(&ProviderRegistry::builtin(), &args.provider, &args.credentials)?;
    let config = app::load_config(cli)?;
    let store = app::open_store(&config)?;

    store.add_account(&Account::new(&args.provider, &args.account, credentials))?;
    info!(provider = %args.provider, account = %args.account, "Account added");
    Ok(ExitCode::Success)
}

/// Replaces an account's credentials.
pub fn update(args: &CredentialArgs, cli: &Cli) -> Result<ExitCode> {
    let credentials = validated(&ProviderRegistry::builtin(), &args.provider, &args.credentials)?;
    let config = app::load_config(cli)?;
    let store = app::open_store(&config)?;

    store.update_credentials(&args.provider, &args.account, &credentials)?;
    info!(provider = %args.provider, account = %args.account, "Credentials updated");
    Ok(ExitCode::Success)
}

/// Removes an account.
pub fn remove(args: &AccountRef, cli: &Cli) -> Result<ExitCode> {
    let config = app::load_config(cli)?;
    app::open_store(&config)?.remove_account(&args.provider, &args.account)?;
    Ok(ExitCode::Success)
}

/// Enables or disables an account.
pub fn set_enabled(args: &AccountRef, enabled: bool, cli: &Cli) -> Result<ExitCode> {
    let config = app::load_config(cli)?;
    app::open_store(&config)?.set_enabled(&args.provider, &args.account, enabled)?;
    info!(provider = %args.provider, account = %args.account, enabled, "Account updated");
    Ok(ExitCode::Success)
}

/// Sets the run order.
pub fn order(args: &OrderArgs, cli: &Cli) -> Result<ExitCode> {
    let entries = args
        .entries
        .iter()
        .map(|e| parse_order_entry(e))
        .collect::<Result<Vec<_>>>()?;
    let config = app::load_config(cli)?;
    app::open_store(&config)?.set_order(&entries)?;
    Ok(ExitCode::Success)
}

// ============================================================================
// Tests
// ============================================================================
