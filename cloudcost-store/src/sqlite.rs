//! SQLite-backed account store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cloudcost_core::{Account, Credentials};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info};

use crate::account_store::{reorder, AccountFilter, AccountStore};
use crate::error::StoreError;
use crate::paths::{ensure_parent_dir, set_restrictive_permissions};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    provider    TEXT    NOT NULL,
    name        TEXT    NOT NULL,
    credentials TEXT    NOT NULL,
    enabled     INTEGER NOT NULL DEFAULT 1,
    sort_order  INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (provider, name)
);
";

const SELECT: &str = "SELECT provider, name, credentials, enabled, sort_order FROM accounts";

/// Account store in a single SQLite file.
///
/// The connection lock is held only for the duration of each call.
#[derive(Debug)]
pub struct SqliteAccountStore {
    conn: Mutex<Connection>,
}

impl SqliteAccountStore {
    /// Opens (or creates) the database at `path` with owner-only permissions.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created or the schema cannot be applied.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        ensure_parent_dir(path)?;
        let store = Self::init(Connection::open(path)?)?;
        set_restrictive_permissions(path)?;
        info!(path = %path.display(), "Opened account database");
        Ok(store)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Fails if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Raw row; credentials are decoded outside the rusqlite callback.
struct AccountRow {
    provider: String,
    name: String,
    credentials: String,
    enabled: bool,
    sort_order: i64,
}

impl AccountRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            provider: row.get(0)?,
            name: row.get(1)?,
            credentials: row.get(2)?,
            enabled: row.get(3)?,
            sort_order: row.get(4)?,
        })
    }

    fn into_account(self) -> Result<Account, StoreError> {
        let credentials: Credentials = serde_json::from_str(&self.credentials)?;
        Ok(Account::new(self.provider, self.name, credentials)
            .with_enabled(self.enabled)
            .with_sort_order(self.sort_order))
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

fn expect_one(changed: usize, provider: &str, name: &str) -> Result<(), StoreError> {
    if changed == 0 {
        Err(StoreError::not_found(provider, name))
    } else {
        Ok(())
    }
}

impl AccountStore for SqliteAccountStore {
    fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY sort_order, provider, name"))?;
        let rows = stmt
            .query_map([], AccountRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            let account = row.into_account()?;
            if filter.matches(&account) {
                accounts.push(account);
            }
        }
        debug!(count = accounts.len(), "Listed accounts");
        Ok(accounts)
    }

    fn get_account(&self, provider: &str, name: &str) -> Result<Account, StoreError> {
        let row = self
            .conn()
            .query_row(
                &format!("{SELECT} WHERE provider = ?1 AND name = ?2"),
                params![provider, name],
                AccountRow::from_row,
            )
            .optional()?;
        row.ok_or_else(|| StoreError::not_found(provider, name))?
            .into_account()
    }

    fn add_account(&self, account: &Account) -> Result<(), StoreError> {
        let credentials = serde_json::to_string(&account.credentials)?;
        let result = self.conn().execute(
            "INSERT INTO accounts (provider, name, credentials, enabled, sort_order)
             VALUES (?1, ?2, ?3, ?4, (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM accounts))",
            params![account.provider, account.name, credentials, account.enabled],
        );
        match result {
            Ok(_) => {
                info!(account = %account.label(), "Account added");
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => Err(StoreError::AccountExists {
                provider: account.provider.clone(),
                name: account.name.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn update_credentials(&self, provider: &str, name: &str, credentials: &Credentials) -> Result<(), StoreError> {
        let json = serde_json::to_string(credentials)?;
        let changed = self.conn().execute(
            "UPDATE accounts SET credentials = ?3 WHERE provider = ?1 AND name = ?2",
            params![provider, name, json],
        )?;
        expect_one(changed, provider, name)
    }

    fn set_enabled(&self, provider: &str, name: &str, enabled: bool) -> Result<(), StoreError> {
        let changed = self.conn().execute(
            "UPDATE accounts SET enabled = ?3 WHERE provider = ?1 AND name = ?2",
            params![provider, name, enabled],
        )?;
        expect_one(changed, provider, name)
    }

    fn remove_account(&self, provider: &str, name: &str) -> Result<(), StoreError> {
        let changed = self.conn().execute(
            "DELETE FROM accounts WHERE provider = ?1 AND name = ?2",
            params![provider, name],
        )?;
        expect_one(changed, provider, name)?;
        info!(provider, name, "Account removed");
        Ok(())
    }

    fn set_order(&self, order: &[(String, String)]) -> Result<(), StoreError> {
        let current = self.list_accounts(&AccountFilter::all())?;
        let keys = reorder(&current, order)?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE accounts SET sort_order = ?3 WHERE provider = ?1 AND name = ?2")?;
            for (position, (provider, name)) in keys.iter().enumerate() {
                let position = i64::try_from(position).unwrap_or(i64::MAX);
                stmt.execute(params![provider, name, position])?;
            }
        }
        tx.commit()?;
        debug!(count = keys.len(), "Account order updated");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(key: &str) -> Credentials {
        [("api_key", key)].into_iter().collect()
    }

    #[test]
    fn test_add_and_list_in_order() {
        let store = SqliteAccountStore::open_in_memory().unwrap();
        store.add_account(&Account::new("heroku", "b", creds("1"))).unwrap();
        store.add_account(&Account::new("azure", "a", creds("2"))).unwrap();

        let accounts = store.list_accounts(&AccountFilter::all()).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].provider, "heroku");
        assert_eq!(accounts[0].sort_order, 0);
        assert_eq!(accounts[1].sort_order, 1);
        assert_eq!(accounts[1].credentials.get("api_key"), Some("2"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let store = SqliteAccountStore::open_in_memory().unwrap();
        store.add_account(&Account::new("heroku", "b", creds("1"))).unwrap();
        let result = store.add_account(&Account::new("heroku", "b", creds("2")));
        assert!(matches!(result, Err(StoreError::AccountExists { .. })));
    }

    #[test]
    fn test_update_enable_remove() {
        let store = SqliteAccountStore::open_in_memory().unwrap();
        store.add_account(&Account::new("heroku", "b", creds("1"))).unwrap();

        store.update_credentials("heroku", "b", &creds("9")).unwrap();
        store.set_enabled("heroku", "b", false).unwrap();
        let account = store.get_account("heroku", "b").unwrap();
        assert_eq!(account.credentials.get("api_key"), Some("9"));
        assert!(!account.enabled);

        store.remove_account("heroku", "b").unwrap();
        assert!(matches!(
            store.get_account("heroku", "b"),
            Err(StoreError::AccountNotFound { .. })
        ));
        assert!(matches!(
            store.set_enabled("heroku", "b", true),
            Err(StoreError::AccountNotFound { .. })
        ));
    }

    #[test]
    fn test_set_order() {
        let store = SqliteAccountStore::open_in_memory().unwrap();
        for name in ["a", "b", "c"] {
            store.add_account(&Account::new("heroku", name, creds(name))).unwrap();
        }
        store
            .set_order(&[("heroku".to_string(), "c".to_string()), ("heroku".to_string(), "a".to_string())])
            .unwrap();

        let names: Vec<_> = store
            .list_accounts(&AccountFilter::all())
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_filter_by_account() {
        let store = SqliteAccountStore::open_in_memory().unwrap();
        store.add_account(&Account::new("heroku", "a", creds("1"))).unwrap();
        store.add_account(&Account::new("azure", "a", creds("2"))).unwrap();
        store.add_account(&Account::new("azure", "b", creds("3"))).unwrap();

        let filtered = store
            .list_accounts(&AccountFilter::all().account("a"))
            .unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("accounts.db");
        {
            let store = SqliteAccountStore::open(&path).unwrap();
            store.add_account(&Account::new("heroku", "a", creds("1"))).unwrap();
        }
        let store = SqliteAccountStore::open(&path).unwrap();
        assert_eq!(store.list_accounts(&AccountFilter::all()).unwrap().len(), 1);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
