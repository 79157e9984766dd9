// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded account table backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `{table}`: user → JSON object bytes, e.g. `{"user":"U123","balance":7}`
//!
//! Balance writes read the stored object, replace only its `balance` field and
//! write it back inside one write transaction, so attributes other tools
//! attach to a row survive ledger updates.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::accounts::{AccountStore, StoreError, StoreResult};
use crate::models::Account;

/// Default table name, shared with every deployment of the bank so far.
pub const DEFAULT_TABLE_NAME: &str = "WillowTreeBank";

// =============================================================================
// Error Conversion
// =============================================================================

macro_rules! unavailable_from {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for StoreError {
                fn from(e: $err) -> Self {
                    StoreError::Unavailable(format!("redb: {e}"))
                }
            }
        )*
    };
}

unavailable_from!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

// =============================================================================
// Record Projection
// =============================================================================

/// The `user`/`balance` projection of a stored row. Unknown fields are ignored.
#[derive(Deserialize)]
struct AccountRecord {
    user: String,
    balance: i64,
}

fn decode(user: &str, bytes: &[u8]) -> StoreResult<Account> {
    let record: AccountRecord =
        serde_json::from_slice(bytes).map_err(|e| StoreError::Malformed {
            user: user.to_string(),
            reason: e.to_string(),
        })?;
    Ok(Account::new(record.user, record.balance))
}

/// Set `balance` on the existing object (or a fresh one) and re-encode it.
fn merge_balance(account: &Account, existing: Option<&[u8]>) -> StoreResult<Vec<u8>> {
    let mut object = match existing {
        Some(bytes) => match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                return Err(StoreError::Malformed {
                    user: account.user.clone(),
                    reason: "stored value is not a JSON object".to_string(),
                })
            }
        },
        None => {
            let mut map = Map::new();
            map.insert("user".to_string(), Value::from(account.user.as_str()));
            map
        }
    };
    object.insert("balance".to_string(), Value::from(account.balance));

    serde_json::to_vec(&Value::Object(object)).map_err(|e| StoreError::Malformed {
        user: account.user.clone(),
        reason: e.to_string(),
    })
}

fn stored_balance(user: &str, existing: Option<&[u8]>) -> StoreResult<Option<i64>> {
    existing.map(|bytes| decode(user, bytes).map(|a| a.balance)).transpose()
}

// =============================================================================
// RedbAccountStore
// =============================================================================

/// Account storage in a single named redb table.
pub struct RedbAccountStore {
    db: Database,
    table: String,
}

impl RedbAccountStore {
    /// Open (or create) the database at `path` and ensure `table` exists.
    pub fn open(path: &Path, table: impl Into<String>) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("create {}: {e}", parent.display())))?;
        }
        let db = Database::create(path)?;
        let store = Self {
            db,
            table: table.into(),
        };

        // Pre-create the table so later read transactions don't fail
        let write_txn = store.db.begin_write()?;
        {
            let _ = write_txn.open_table(store.definition())?;
        }
        write_txn.commit()?;

        tracing::debug!(path = %path.display(), table = %store.table, "Account store opened");
        Ok(store)
    }

    /// Name of the backing table.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    fn definition(&self) -> TableDefinition<'_, &'static str, &'static [u8]> {
        TableDefinition::new(&self.table)
    }

    /// Shared write path. `expected` of `Some(condition)` makes the write
    /// conditional on the stored balance (`None` inside meaning "no row").
    fn write_balance(&self, account: &Account, expected: Option<Option<i64>>) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(self.definition())?;

            let existing = table
                .get(account.user.as_str())?
                .map(|v| v.value().to_vec());

            if let Some(condition) = expected {
                let current = stored_balance(&account.user, existing.as_deref())?;
                if current != condition {
                    return Err(StoreError::ConditionFailed {
                        user: account.user.clone(),
                    });
                }
            }

            let bytes = merge_balance(account, existing.as_deref())?;
            table.insert(account.user.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl AccountStore for RedbAccountStore {
    fn get(&self, user: &str) -> StoreResult<Option<Account>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(self.definition())?;
        match table.get(user)? {
            Some(value) => decode(user, value.value()).map(Some),
            None => Ok(None),
        }
    }

    fn put(&self, account: &Account) -> StoreResult<()> {
        self.write_balance(account, None)
    }

    fn compare_and_put(&self, account: &Account, expected: Option<i64>) -> StoreResult<()> {
        self.write_balance(account, Some(expected))
    }

    fn scan_all(&self) -> StoreResult<Vec<Account>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(self.definition())?;

        let mut accounts = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            accounts.push(decode(key.value(), value.value())?);
        }
        Ok(accounts)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (RedbAccountStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbAccountStore::open(&dir.path().join("bank.redb"), DEFAULT_TABLE_NAME).unwrap();
        (store, dir)
    }

    /// Write raw bytes for a key, bypassing the balance merge.
    fn insert_raw(store: &RedbAccountStore, user: &str, bytes: &[u8]) {
        let write_txn = store.db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(store.definition()).unwrap();
            table.insert(user, bytes).unwrap();
        }
        write_txn.commit().unwrap();
    }

    #[test]
    fn get_missing_user_is_none() {
        let (store, _dir) = temp_store();
        assert_eq!(store.get("U404").unwrap(), None);
    }

    #[test]
    fn put_and_get_account() {
        let (store, _dir) = temp_store();
        store.put(&Account::new("U1", 12)).unwrap();

        let loaded = store.get("U1").unwrap().unwrap();
        assert_eq!(loaded, Account::new("U1", 12));
        assert!(!loaded.is_new);
    }

    #[test]
    fn put_overwrites_balance_only() {
        let (store, _dir) = temp_store();
        insert_raw(
            &store,
            "U1",
            br#"{"user":"U1","balance":3,"display_name":"willow"}"#,
        );

        store.put(&Account::new("U1", 8)).unwrap();

        let write_txn = store.db.begin_read().unwrap();
        let table = write_txn.open_table(store.definition()).unwrap();
        let raw: Value = serde_json::from_slice(table.get("U1").unwrap().unwrap().value()).unwrap();
        assert_eq!(raw["balance"], 8);
        assert_eq!(raw["display_name"], "willow");
    }

    #[test]
    fn compare_and_put_requires_absent_row_for_none() {
        let (store, _dir) = temp_store();
        store.compare_and_put(&Account::new("U1", 1), None).unwrap();

        let err = store.compare_and_put(&Account::new("U1", 2), None).unwrap_err();
        assert_eq!(err, StoreError::ConditionFailed { user: "U1".into() });
        assert_eq!(store.get("U1").unwrap().unwrap().balance, 1);
    }

    #[test]
    fn compare_and_put_checks_prior_balance() {
        let (store, _dir) = temp_store();
        store.put(&Account::new("U1", 10)).unwrap();

        store.compare_and_put(&Account::new("U1", 7), Some(10)).unwrap();
        let err = store.compare_and_put(&Account::new("U1", 4), Some(10)).unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed { .. }));
        assert_eq!(store.get("U1").unwrap().unwrap().balance, 7);
    }

    #[test]
    fn scan_all_returns_every_row() {
        let (store, _dir) = temp_store();
        for (user, balance) in [("U1", 1), ("U2", 2), ("U3", 3)] {
            store.put(&Account::new(user, balance)).unwrap();
        }

        let mut all = store.scan_all().unwrap();
        all.sort_by(|a, b| a.user.cmp(&b.user));
        assert_eq!(
            all,
            vec![
                Account::new("U1", 1),
                Account::new("U2", 2),
                Account::new("U3", 3)
            ]
        );
    }

    #[test]
    fn malformed_row_is_reported() {
        let (store, _dir) = temp_store();
        insert_raw(&store, "U1", b"not json");

        let err = store.get("U1").unwrap_err();
        assert!(matches!(err, StoreError::Malformed { ref user, .. } if user == "U1"));
        assert!(store.scan_all().is_err());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.redb");
        {
            let store = RedbAccountStore::open(&path, "Bank").unwrap();
            store.put(&Account::new("U1", 42)).unwrap();
        }

        let store = RedbAccountStore::open(&path, "Bank").unwrap();
        assert_eq!(store.table_name(), "Bank");
        assert_eq!(store.get("U1").unwrap().unwrap().balance, 42);
    }
}
