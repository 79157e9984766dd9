// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::ledger::LedgerError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::InvalidAmount(_) | LedgerError::SelfTransfer { .. } => {
                Self::bad_request(err.to_string())
            }
            LedgerError::InsufficientFunds { .. } | LedgerError::BalanceOverflow { .. } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            LedgerError::ConcurrentModification { .. } => Self::conflict(err.to_string()),
            LedgerError::StorageUnavailable(_) => {
                error!(error = %err, "Storage failure while serving request");
                Self::service_unavailable("storage unavailable")
            }
            LedgerError::PartialTransferFailure { .. } => {
                error!(error = %err, "Partial transfer while serving request");
                Self::internal("transfer incomplete")
            }
            LedgerError::Aborted(_) => {
                error!(error = %err, "Ledger task aborted while serving request");
                Self::internal("internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreError;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let down = ApiError::service_unavailable("down");
        assert_eq!(down.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn ledger_errors_map_to_status() {
        let cases = [
            (LedgerError::InvalidAmount(0), StatusCode::BAD_REQUEST),
            (
                LedgerError::InsufficientFunds {
                    requested: 5,
                    available: 1,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LedgerError::ConcurrentModification { user: "U1".into() },
                StatusCode::CONFLICT,
            ),
            (
                LedgerError::BalanceOverflow {
                    user: "U1".into(),
                    balance: i64::MAX,
                    amount: 1,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LedgerError::StorageUnavailable(StoreError::Unavailable("io".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                LedgerError::Aborted("panicked".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let err = ApiError::from(LedgerError::StorageUnavailable(StoreError::Unavailable(
            "disk path /secret".into(),
        )));
        assert_eq!(err.message, "storage unavailable");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }
}
