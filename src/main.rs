// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, process::ExitCode, sync::Arc};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use willowbucks::{
    api::router,
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER},
    slack::SlackClient,
    state::{AppState, SharedStore},
    storage::{RedbAccountStore, RetryingStore},
};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
            shutdown.cancel();
        }
        _ = shutdown.cancelled() => {}
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn Error>> {
    let db_path = config.db_path();
    let store = RedbAccountStore::open(&db_path, config.table.clone())?;
    info!(path = %db_path.display(), table = %store.table_name(), "Opened balance table");

    let store: SharedStore = Arc::new(RetryingStore::new(store, config.retry));
    let chat = Arc::new(SlackClient::new(
        config.slack_api_base_url.clone(),
        config.slack_token.clone(),
    )?);

    let state = AppState::from_config(store, chat, &config);
    let app = router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await?;
    info!(
        %addr,
        mode = %config.reaction_mode,
        reactions = config.reactions.len(),
        "Willowbucks listening (docs at /docs)"
    );

    let shutdown = CancellationToken::new();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    info!("Server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::default());
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
