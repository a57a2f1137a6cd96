//! Account store abstraction.
//!
//! The engine reads accounts through [`AccountStore::list_accounts`]; the
//! management operations are used by the CLI.

use std::sync::Mutex;

use cloudcost_core::{Account, Credentials};

use crate::error::StoreError;

// ============================================================================
// Filter
// ============================================================================

/// Account selection for a run. Both parts are AND'ed; empty means all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    /// Provider ids to include.
    pub providers: Vec<String>,
    /// Single account name to include.
    pub account: Option<String>,
}

impl AccountFilter {
    /// Matches every account.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to one more provider id.
    #[must_use]
    pub fn provider(mut self, id: impl Into<String>) -> Self {
        self.providers.push(id.into());
        self
    }

    /// Restricts to one account name.
    #[must_use]
    pub fn account(mut self, name: impl Into<String>) -> Self {
        self.account = Some(name.into());
        self
    }

    /// Returns true if the account passes the filter.
    pub fn matches(&self, account: &Account) -> bool {
        let provider_ok = self.providers.is_empty() || self.providers.iter().any(|p| *p == account.provider);
        let account_ok = self.account.as_ref().is_none_or(|name| *name == account.name);
        provider_ok && account_ok
    }
}

// ============================================================================
// Trait
// ============================================================================

/// Persistent account storage.
pub trait AccountStore: Send + Sync {
    /// Lists accounts ordered by sort order, then provider, then name.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be queried.
    fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, StoreError>;

    /// Fetches one account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if it does not exist.
    fn get_account(&self, provider: &str, name: &str) -> Result<Account, StoreError>;

    /// Adds an account after all existing ones. Its `sort_order` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountExists`] on a duplicate.
    fn add_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Replaces an account's credentials.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if it does not exist.
    fn update_credentials(&self, provider: &str, name: &str, credentials: &Credentials) -> Result<(), StoreError>;

    /// Enables or disables an account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if it does not exist.
    fn set_enabled(&self, provider: &str, name: &str, enabled: bool) -> Result<(), StoreError>;

    /// Deletes an account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if it does not exist.
    fn remove_account(&self, provider: &str, name: &str) -> Result<(), StoreError>;

    /// Moves the listed accounts to the front, in the given order.
    /// Unlisted accounts follow in their previous order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] for an unknown account; nothing changes then.
    fn set_order(&self, order: &[(String, String)]) -> Result<(), StoreError>;
}

/// Computes the new full ordering for [`AccountStore::set_order`].
pub(crate) fn reorder(current: &[Account], order: &[(String, String)]) -> Result<Vec<(String, String)>, StoreError> {
    let mut keys: Vec<(String, String)> = Vec::with_capacity(current.len());
    for (provider, name) in order {
        if !current.iter().any(|a| a.provider == *provider && a.name == *name) {
            return Err(StoreError::not_found(provider, name));
        }
        if !keys.iter().any(|(p, n)| p == provider && n == name) {
            keys.push((provider.clone(), name.clone()));
        }
    }
    for account in current {
        if !keys.iter().any(|(p, n)| *p == account.provider && *n == account.name) {
            keys.push((account.provider.clone(), account.name.clone()));
        }
    }
    Ok(keys)
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-memory store, for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<Vec<Account>>,
}

impl MemoryAccountStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the accounts as given, keeping their sort orders.
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Account>> {
        self.accounts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn with_account<T>(&self, provider: &str, name: &str, f: impl FnOnce(&mut Account) -> T) -> Result<T, StoreError> {
        let mut accounts = self.lock();
        accounts
            .iter_mut()
            .find(|a| a.provider == provider && a.name == name)
            .map(f)
            .ok_or_else(|| StoreError::not_found(provider, name))
    }
}

fn sorted(mut accounts: Vec<Account>) -> Vec<Account> {
    accounts.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.provider.cmp(&b.provider))
            .then_with(|| a.name.cmp(&b.name))
    });
    accounts
}

impl AccountStore for MemoryAccountStore {
    fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, StoreError> {
        let accounts = self.lock().iter().filter(|a| filter.matches(a)).cloned().collect();
        Ok(sorted(accounts))
    }

    fn get_account(&self, provider: &str, name: &str) -> Result<Account, StoreError> {
        self.with_account(provider, name, |a| a.clone())
    }

    fn add_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.lock();
        if accounts
            .iter()
            .any(|a| a.provider == account.provider && a.name == account.name)
        {
            return Err(StoreError::AccountExists {
                provider: account.provider.clone(),
                name: account.name.clone(),
            });
        }
        let next = accounts.iter().map(|a| a.sort_order + 1).max().unwrap_or(0);
        accounts.push(account.clone().with_sort_order(next));
        Ok(())
    }

    fn update_credentials(&self, provider: &str, name: &str, credentials: &Credentials) -> Result<(), StoreError> {
        self.with_account(provider, name, |a| a.credentials = credentials.clone())
    }

    fn set_enabled(&self, provider: &str, name: &str, enabled: bool) -> Result<(), StoreError> {
        self.with_account(provider, name, |a| a.enabled = enabled)
    }

    fn remove_account(&self, provider: &str, name: &str) -> Result<(), StoreError> {
        let mut accounts = self.lock();
        let before = accounts.len();
        accounts.retain(|a| !(a.provider == provider && a.name == name));
        if accounts.len() == before {
            return Err(StoreError::not_found(provider, name));
        }
        Ok(())
    }

    fn set_order(&self, order: &[(String, String)]) -> Result<(), StoreError> {
        let mut accounts = self.lock();
        let keys = reorder(&sorted(accounts.clone()), order)?;
        for account in accounts.iter_mut() {
            if let Some(pos) = keys
                .iter()
                .position(|(p, n)| *p == account.provider && *n == account.name)
            {
                account.sort_order = i64::try_from(pos).unwrap_or(i64::MAX);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryAccountStore {
        let store = MemoryAccountStore::new();
        store.add_account(&Account::new("heroku", "main", Credentials::new())).unwrap();
        store.add_account(&Account::new("azure", "prod", Credentials::new())).unwrap();
        store.add_account(&Account::new("heroku", "staging", Credentials::new())).unwrap();
        store
    }

    fn labels(accounts: &[Account]) -> Vec<String> {
        accounts.iter().map(Account::label).collect()
    }

    #[test]
    fn test_insertion_order_kept() {
        let accounts = store().list_accounts(&AccountFilter::all()).unwrap();
        assert_eq!(labels(&accounts), vec!["heroku/main", "azure/prod", "heroku/staging"]);
    }

    #[test]
    fn test_filters_are_anded() {
        let store = store();
        let heroku = store.list_accounts(&AccountFilter::all().provider("heroku")).unwrap();
        assert_eq!(heroku.len(), 2);

        let one = store
            .list_accounts(&AccountFilter::all().provider("heroku").account("staging"))
            .unwrap();
        assert_eq!(labels(&one), vec!["heroku/staging"]);

        let none = store
            .list_accounts(&AccountFilter::all().provider("azure").account("staging"))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let store = store();
        let result = store.add_account(&Account::new("heroku", "main", Credentials::new()));
        assert!(matches!(result, Err(StoreError::AccountExists { .. })));
    }

    #[test]
    fn test_set_order_moves_listed_first() {
        let store = store();
        store
            .set_order(&[("heroku".to_string(), "staging".to_string())])
            .unwrap();
        let accounts = store.list_accounts(&AccountFilter::all()).unwrap();
        assert_eq!(labels(&accounts), vec!["heroku/staging", "heroku/main", "azure/prod"]);
    }

    #[test]
    fn test_set_order_unknown_account() {
        let store = store();
        let result = store.set_order(&[("gcp".to_string(), "x".to_string())]);
        assert!(matches!(result, Err(StoreError::AccountNotFound { .. })));
        let accounts = store.list_accounts(&AccountFilter::all()).unwrap();
        assert_eq!(labels(&accounts)[0], "heroku/main");
    }

    #[test]
    fn test_disable_and_remove() {
        let store = store();
        store.set_enabled("azure", "prod", false).unwrap();
        assert!(!store.get_account("azure", "prod").unwrap().enabled);

        store.remove_account("azure", "prod").unwrap();
        assert!(matches!(
            store.remove_account("azure", "prod"),
            Err(StoreError::AccountNotFound { .. })
        ));
    }
}
