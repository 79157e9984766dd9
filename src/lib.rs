// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Willowbucks - Reaction-driven Virtual Currency
//!
//! Chat reactions credit, debit or transfer willowbucks between users.
//! Balances live in an embedded redb table keyed by chat user identifier.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers (Axum): webhooks, balance routes, health
//! - `commands` - balance slash commands
//! - `events` - reaction event decoding and dispatch
//! - `ledger` - credit, debit, transfer and ranking rules
//! - `slack` - chat platform client
//! - `storage` - account store trait, redb and in-memory backends

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod models;
pub mod slack;
pub mod state;
pub mod storage;
