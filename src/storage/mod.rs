// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Account Storage
//!
//! Durable key-value access to account rows in a single named table, one
//! record per user identifier.
//!
//! ## Backends
//!
//! - [`RedbAccountStore`] - embedded redb file under `DATA_DIR`
//! - [`InMemoryAccountStore`] - process-local map, used by tests
//!
//! Either can be wrapped in [`RetryingStore`] to retry transient failures.
//!
//! ## Important Notes
//!
//! - Writes replace the `balance` attribute only; other attributes survive
//! - Scans are unpaginated full-table reads
//! - Nothing here locks across calls; see `compare_and_put` for lost-update
//!   detection

pub mod accounts;
pub mod memory;
pub mod redb_store;
pub mod retry;

pub use accounts::{AccountStore, StoreError, StoreResult};
pub use memory::InMemoryAccountStore;
pub use redb_store::{RedbAccountStore, DEFAULT_TABLE_NAME};
pub use retry::{RetryPolicy, RetryingStore};
