// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Form, Json};

use crate::{
    commands::{CommandReply, SlashCommand},
    error::ApiError,
    state::AppState,
};

/// Answer a balance slash command.
#[utoipa::path(
    post,
    path = "/slack/commands",
    tag = "Chat",
    request_body(content = SlashCommand, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, body = CommandReply),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn run_command(
    State(state): State<AppState>,
    Form(command): Form<SlashCommand>,
) -> Result<Json<CommandReply>, ApiError> {
    let reply = state.commands.respond(&command).await?;
    Ok(Json(reply))
}
