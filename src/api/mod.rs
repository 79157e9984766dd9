// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    commands::{CommandReply, SlashCommand},
    models::{BalanceResponse, LeaderboardEntry, LeaderboardResponse},
    state::AppState,
};

pub mod accounts;
pub mod commands;
pub mod events;
pub mod health;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/accounts/{user}/balance", get(accounts::get_balance))
        .route("/leaderboard", get(accounts::leaderboard));

    let slack_routes = Router::new()
        .route("/events", post(events::receive_event))
        .route("/commands", post(commands::run_command));

    Router::new()
        .nest("/v1", v1_routes)
        .nest("/slack", slack_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        accounts::get_balance,
        accounts::leaderboard,
        events::receive_event,
        commands::run_command,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            BalanceResponse,
            LeaderboardEntry,
            LeaderboardResponse,
            SlashCommand,
            CommandReply,
            events::ChallengeResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Accounts", description = "Balance lookups and ranking"),
        (name = "Chat", description = "Chat-platform webhooks"),
        (name = "Health", description = "Liveness and storage probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::slack::fake::FakeChat;
    use crate::storage::{AccountStore, InMemoryAccountStore};

    fn chat() -> FakeChat {
        FakeChat::new()
            .with_user("UA", "ann", "Ann Oak")
            .with_user("UB", "bo", "Bo Birch")
            .with_channel("C1", "general")
    }

    fn app(store: Arc<InMemoryAccountStore>) -> Router {
        router(AppState::new(store, Arc::new(chat())))
    }

    fn reaction(kind: &str, reaction: &str, from: &str, to: &str) -> Value {
        json!({
            "type": "event_callback",
            "event": {
                "type": kind,
                "user": from,
                "item_user": to,
                "reaction": reaction,
                "item": {"type": "message", "channel": "C1", "ts": "1.0"},
                "event_ts": "1.1"
            }
        })
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn url_verification_echoes_challenge() {
        let app = app(Arc::new(InMemoryAccountStore::new()));
        let body = json!({"type": "url_verification", "token": "t", "challenge": "3eZbrw1aB"});

        let response = app.oneshot(post_json("/slack/events", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_json(response).await, json!({"challenge": "3eZbrw1aB"}));
    }

    #[tokio::test]
    async fn reaction_event_credits_receiver() {
        let store = Arc::new(InMemoryAccountStore::new());
        let app = app(store.clone());

        let response = app
            .oneshot(post_json(
                "/slack/events",
                &reaction("reaction_added", "willowbuck10", "UA", "UB"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.get("UB").unwrap().unwrap().balance, 10);
    }

    #[tokio::test]
    async fn slow_notifications_do_not_delay_the_ack() {
        let store = Arc::new(InMemoryAccountStore::new());
        let chat = Arc::new(chat().with_post_delay(Duration::from_secs(30)));
        let app = router(AppState::new(store.clone(), chat.clone()));

        let response = tokio::time::timeout(
            Duration::from_secs(2),
            app.oneshot(post_json(
                "/slack/events",
                &reaction("reaction_added", "willowbuck", "UA", "UB"),
            )),
        )
        .await
        .expect("event acknowledged while posts are pending")
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.get("UB").unwrap().unwrap().balance, 1);
        // The welcome is still waiting on the chat platform
        assert!(chat.ephemerals().is_empty());
    }

    #[tokio::test]
    async fn notifications_are_delivered_after_the_ack() {
        let store = Arc::new(InMemoryAccountStore::new());
        let chat = Arc::new(chat());
        let app = router(AppState::new(store, chat.clone()));

        let response = app
            .oneshot(post_json(
                "/slack/events",
                &reaction("reaction_added", "willowbuck", "UA", "UB"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::timeout(Duration::from_secs(2), async {
            while chat.ephemerals().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("welcome delivered");
        assert_eq!(chat.ephemerals()[0].user.as_deref(), Some("UB"));
    }

    #[tokio::test]
    async fn rejected_event_is_acknowledged() {
        let store = Arc::new(InMemoryAccountStore::new());
        let app = app(store.clone());

        let response = app
            .oneshot(post_json(
                "/slack/events",
                &reaction("reaction_added", "willowbuck", "UA", "UA"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn storage_outage_requests_redelivery() {
        let store = Arc::new(InMemoryAccountStore::new());
        store.set_unavailable(true);
        let app = app(store);

        let response = app
            .oneshot(post_json(
                "/slack/events",
                &reaction("reaction_added", "willowbuck", "UA", "UB"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn slash_command_reply() {
        let store = Arc::new(InMemoryAccountStore::with_accounts([("UA", 7)]));
        let app = app(store);

        let request = Request::builder()
            .method("POST")
            .uri("/slack/commands")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "command=%2Fwillowbuck-balance&text=&user_id=UA&channel_id=C1&team_id=T1",
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"response_type": "ephemeral", "text": "You currently have 7 :willowbuck:"})
        );
    }

    #[tokio::test]
    async fn balance_route() {
        let store = Arc::new(InMemoryAccountStore::with_accounts([("UA", 7)]));
        let response = app(store)
            .oneshot(get("/v1/accounts/UA/balance"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"user": "UA", "balance": 7, "is_new": false})
        );
    }

    #[tokio::test]
    async fn leaderboard_route() {
        let store = Arc::new(InMemoryAccountStore::with_accounts([("UA", 7), ("UB", 9)]));
        let response = app(store)
            .oneshot(get("/v1/leaderboard?limit=-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"entries": [
                {"rank": 1, "user": "UB", "balance": 9},
                {"rank": 2, "user": "UA", "balance": 7}
            ]})
        );
    }

    #[tokio::test]
    async fn health_reflects_storage() {
        let store = Arc::new(InMemoryAccountStore::new());
        let response = app(store.clone()).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        store.set_unavailable(true);
        let response = app(store).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["checks"]["storage"], "unavailable");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let response = app(Arc::new(InMemoryAccountStore::new()))
            .oneshot(get("/api-doc/openapi.json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["paths"]["/v1/leaderboard"].is_object());
        assert!(body["paths"]["/slack/events"]["post"]["requestBody"]["content"]
            ["application/json"]
            .is_object());
    }
}
