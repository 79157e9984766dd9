// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the redb database file | `./data` |
//! | `WILLOWBUCKS_TABLE` | Balance table name | `WillowTreeBank` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SLACK_TOKEN` | Bot token for the Slack Web API | Required |
//! | `SLACK_API_BASE_URL` | Web API base URL | `https://slack.com/api/` |
//! | `NOTIFY_CHANNEL` | Channel for public announcements | Optional |
//! | `REACTIONS` | `name=amount` pairs, comma separated | `willowbuck=1,willowbuck5=5,willowbuck10=10` |
//! | `REACTION_MODE` | `grant` or `transfer` | `grant` |
//! | `DEFAULT_BALANCE_CREDIT` | New-account balance for credits and lookups | `0` |
//! | `DEFAULT_BALANCE_TRANSFER` | New-account balance for a transfer sender | `5` |
//! | `DEFAULT_BALANCE_TRANSFER_RECEIVER` | New-account balance for a transfer receiver | `DEFAULT_BALANCE_CREDIT` |
//! | `LEADERBOARD_SIZE` | Rows in the leaderboard command reply | `5` |
//! | `STORE_RETRY_ATTEMPTS` | Attempts per storage call on transient failure | `3` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::commands::DEFAULT_LEADERBOARD_SIZE;
use crate::events::{ReactionMode, ReactionTable};
use crate::ledger::LedgerPolicy;
use crate::slack::client::DEFAULT_API_BASE_URL;
use crate::storage::{RetryPolicy, DEFAULT_TABLE_NAME};

/// Environment variable name for the database directory.
///
/// The redb file `willowbucks.redb` is created inside it.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const TABLE_ENV: &str = "WILLOWBUCKS_TABLE";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const SLACK_TOKEN_ENV: &str = "SLACK_TOKEN";
pub const SLACK_API_BASE_URL_ENV: &str = "SLACK_API_BASE_URL";
pub const NOTIFY_CHANNEL_ENV: &str = "NOTIFY_CHANNEL";
pub const REACTIONS_ENV: &str = "REACTIONS";
pub const REACTION_MODE_ENV: &str = "REACTION_MODE";
pub const DEFAULT_BALANCE_CREDIT_ENV: &str = "DEFAULT_BALANCE_CREDIT";
pub const DEFAULT_BALANCE_TRANSFER_ENV: &str = "DEFAULT_BALANCE_TRANSFER";
pub const DEFAULT_BALANCE_TRANSFER_RECEIVER_ENV: &str = "DEFAULT_BALANCE_TRANSFER_RECEIVER";
pub const LEADERBOARD_SIZE_ENV: &str = "LEADERBOARD_SIZE";
pub const STORE_RETRY_ATTEMPTS_ENV: &str = "STORE_RETRY_ATTEMPTS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DB_FILE_NAME: &str = "willowbucks.redb";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?} (expected json or pretty)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub table: String,
    pub host: IpAddr,
    pub port: u16,
    pub slack_token: String,
    pub slack_api_base_url: Url,
    pub notify_channel: Option<String>,
    pub reactions: ReactionTable,
    pub reaction_mode: ReactionMode,
    pub ledger: LedgerPolicy,
    pub leaderboard_size: usize,
    pub retry: RetryPolicy,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source. Empty
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let slack_token = var(SLACK_TOKEN_ENV).ok_or(ConfigError::Missing(SLACK_TOKEN_ENV))?;

        let credit_default = parse_or(
            var(DEFAULT_BALANCE_CREDIT_ENV),
            DEFAULT_BALANCE_CREDIT_ENV,
            LedgerPolicy::default().credit_default,
        )?;
        let transfer_default = parse_or(
            var(DEFAULT_BALANCE_TRANSFER_ENV),
            DEFAULT_BALANCE_TRANSFER_ENV,
            LedgerPolicy::default().transfer_default,
        )?;
        let transfer_receiver_default = parse_or(
            var(DEFAULT_BALANCE_TRANSFER_RECEIVER_ENV),
            DEFAULT_BALANCE_TRANSFER_RECEIVER_ENV,
            credit_default,
        )?;

        let retry_attempts: u32 = parse_or(
            var(STORE_RETRY_ATTEMPTS_ENV),
            STORE_RETRY_ATTEMPTS_ENV,
            RetryPolicy::default().max_attempts,
        )?;
        if retry_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: STORE_RETRY_ATTEMPTS_ENV,
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            data_dir: var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            table: var(TABLE_ENV).unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            host: parse_or(var(HOST_ENV), HOST_ENV, IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(var(PORT_ENV), PORT_ENV, DEFAULT_PORT)?,
            slack_token,
            slack_api_base_url: parse_or(
                var(SLACK_API_BASE_URL_ENV),
                SLACK_API_BASE_URL_ENV,
                Url::parse(DEFAULT_API_BASE_URL).map_err(|e| ConfigError::Invalid {
                    var: SLACK_API_BASE_URL_ENV,
                    reason: e.to_string(),
                })?,
            )?,
            notify_channel: var(NOTIFY_CHANNEL_ENV),
            reactions: parse_or(var(REACTIONS_ENV), REACTIONS_ENV, ReactionTable::default())?,
            reaction_mode: parse_or(var(REACTION_MODE_ENV), REACTION_MODE_ENV, ReactionMode::default())?,
            ledger: LedgerPolicy {
                credit_default,
                transfer_default,
                transfer_receiver_default,
            },
            leaderboard_size: parse_or(
                var(LEADERBOARD_SIZE_ENV),
                LEADERBOARD_SIZE_ENV,
                DEFAULT_LEADERBOARD_SIZE,
            )?,
            retry: RetryPolicy::default().with_max_attempts(retry_attempts),
            log_format: parse_or(var(LOG_FORMAT_ENV), LOG_FORMAT_ENV, LogFormat::default())?,
        })
    }

    /// Path of the redb database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T>(value: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}
