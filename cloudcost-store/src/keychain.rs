//! Secret storage in the system keychain.
//!
//! - macOS: Keychain Services
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KDE Wallet)

use keyring::Entry;
use tracing::debug;

use crate::error::StoreError;

/// Keychain service name.
pub const SERVICE: &str = "cloudcost";

/// Reads a secret. Missing entries and keychain failures both yield `None`.
pub fn get_secret(user: &str) -> Option<String> {
    let entry = Entry::new(SERVICE, user).ok()?;
    match entry.get_password() {
        Ok(secret) if !secret.is_empty() => {
            debug!(user, "Secret read from keychain");
            Some(secret)
        }
        Ok(_) => None,
        Err(e) => {
            debug!(user, error = %e, "No keychain secret");
            None
        }
    }
}

/// Stores a secret, replacing any existing value.
///
/// # Errors
///
/// Returns [`StoreError::Keychain`] if the keychain rejects the write.
pub fn store_secret(user: &str, secret: &str) -> Result<(), StoreError> {
    let entry = Entry::new(SERVICE, user).map_err(|e| StoreError::Keychain(e.to_string()))?;
    entry
        .set_password(secret)
        .map_err(|e| StoreError::Keychain(e.to_string()))?;
    debug!(user, "Secret stored in keychain");
    Ok(())
}

/// Deletes a secret. Deleting a missing secret succeeds.
///
/// # Errors
///
/// Returns [`StoreError::Keychain`] for any failure other than a missing entry.
pub fn delete_secret(user: &str) -> Result<(), StoreError> {
    let entry = Entry::new(SERVICE, user).map_err(|e| StoreError::Keychain(e.to_string()))?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(StoreError::Keychain(e.to_string())),
    }
}
