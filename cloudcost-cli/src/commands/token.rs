//! Token command - store the Mattermost token in the keychain.

use std::io::BufRead;

use anyhow::{bail, Result};
use clap::Args;
use cloudcost_store::config::MATTERMOST_KEYCHAIN_USER;
use cloudcost_store::keychain;

use crate::ExitCode;

/// Arguments for the token command.
#[derive(Args)]
pub struct TokenArgs {
    /// Token value. Read from stdin when omitted.
    pub value: Option<String>,
}

/// Runs the token command.
pub fn run(args: &TokenArgs) -> Result<ExitCode> {
    let token = match &args.value {
        Some(value) => value.trim().to_string(),
        None => {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim().to_string()
        }
    };
    if token.is_empty() {
        bail!("empty token");
    }

    keychain::store_secret(MATTERMOST_KEYCHAIN_USER, &token)?;
    println!("Mattermost token stored in the system keychain");
    Ok(ExitCode::Success)
}
