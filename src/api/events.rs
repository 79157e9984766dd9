// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chat-platform events webhook.
//!
//! The platform redelivers any event that is not acknowledged with 2xx within
//! its ack window. Only failures that happened before a ledger write (or that
//! the ledger reports as retryable) are answered with 503; everything else is
//! acknowledged so a redelivery cannot apply the same reaction twice.
//!
//! Chat notifications are posted from a background task after the reply, so
//! slow posts never delay the acknowledgement.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    events::{Applied, EventEnvelope, EventError},
    ledger::LedgerError,
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ChallengeResponse {
    pub challenge: String,
}

/// Receive an event callback.
#[utoipa::path(
    post,
    path = "/slack/events",
    tag = "Chat",
    request_body(
        content = serde_json::Value,
        content_type = "application/json",
        description = "Event envelope (url_verification or event_callback)"
    ),
    responses(
        (status = 200, description = "Event acknowledged", body = ChallengeResponse),
        (status = 503, description = "Transient failure; the platform should redeliver")
    )
)]
pub async fn receive_event(
    State(state): State<AppState>,
    Json(envelope): Json<EventEnvelope>,
) -> Response {
    let event = match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            info!("Answering URL verification");
            return Json(ChallengeResponse { challenge }).into_response();
        }
        EventEnvelope::Unsupported => {
            debug!("Ignoring unsupported envelope type");
            return StatusCode::OK.into_response();
        }
        EventEnvelope::EventCallback { event } => event,
    };

    let Applied { result, notices } = state.reactions.apply(&event).await;
    if !notices.is_empty() {
        let reactions = Arc::clone(&state.reactions);
        tokio::spawn(async move { reactions.deliver(notices).await });
    }

    match result {
        Ok(outcome) => {
            debug!(?outcome, reaction = %event.reaction, "Reaction handled");
            StatusCode::OK.into_response()
        }
        Err(err) if err.is_retryable() => {
            warn!(error = %err, event_ts = %event.event_ts, "Reaction failed; requesting redelivery");
            ApiError::service_unavailable(err.to_string()).into_response()
        }
        Err(EventError::Ledger(err @ LedgerError::PartialTransferFailure { .. })) => {
            error!(error = %err, event_ts = %event.event_ts, "Reaction left ledger inconsistent");
            StatusCode::OK.into_response()
        }
        Err(err) => {
            info!(error = %err, event_ts = %event.event_ts, "Reaction rejected");
            StatusCode::OK.into_response()
        }
    }
}
