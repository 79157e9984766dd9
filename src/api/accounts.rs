// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only balance endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::ApiError,
    ledger::{rank_limit, run_blocking},
    models::{BalanceResponse, LeaderboardResponse},
    state::AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LeaderboardQuery {
    /// Maximum number of rows. Negative returns every account; absent uses
    /// the configured leaderboard size.
    pub limit: Option<i64>,
}

/// Get a user's balance.
///
/// Unknown users report the new-account default with `is_new = true`;
/// nothing is written.
#[utoipa::path(
    get,
    path = "/v1/accounts/{user}/balance",
    tag = "Accounts",
    params(
        ("user" = String, Path, description = "Chat-platform user identifier")
    ),
    responses(
        (status = 200, body = BalanceResponse),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn get_balance(
    Path(user): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, ApiError> {
    if user.trim().is_empty() {
        return Err(ApiError::bad_request("user must not be empty"));
    }
    let default_balance = state.policy().credit_default;
    let account =
        run_blocking(&state.ledger, move |l| l.get_account(&user, default_balance)).await?;
    Ok(Json(account.into()))
}

/// Accounts ranked by balance, highest first.
#[utoipa::path(
    get,
    path = "/v1/leaderboard",
    tag = "Accounts",
    params(LeaderboardQuery),
    responses(
        (status = 200, body = LeaderboardResponse),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let limit = match params.limit {
        Some(limit) => rank_limit(limit),
        None => Some(state.leaderboard_size),
    };
    let accounts = run_blocking(&state.ledger, move |l| l.top_balances(limit)).await?;
    Ok(Json(LeaderboardResponse::from_ranked(accounts)))
}
