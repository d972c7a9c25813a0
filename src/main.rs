// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use orders_server::{
    api::router,
    auth::{AuthError, OidcVerifier},
    config::{Config, ConfigError},
    logging::init_tracing,
    notify::{NotificationDispatcher, SmsError, SmsNotifier},
    state::AppState,
    storage::{RedbStore, StoreError},
};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open database: {0}")]
    Store(#[from] StoreError),

    #[error("identity provider discovery failed: {0}")]
    Auth(#[from] AuthError),

    #[error("failed to build SMS client: {0}")]
    Sms(#[from] SmsError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The subscriber may not be installed yet when config loading fails
            error!(error = %e, "Server failed to start");
            eprintln!("orders-server: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let store = RedbStore::open(&config.database_path)?;
    info!(path = %config.database_path.display(), "Database opened");

    let verifier =
        OidcVerifier::discover(&config.oidc_provider_url, &config.oidc_client_id).await?;
    info!(issuer = %config.oidc_provider_url, "Identity provider discovered");

    let notifier = SmsNotifier::from_settings(&config.sms)?;
    if !notifier.is_configured() {
        info!("SMS credentials not set, order notifications will be skipped");
    }
    let notifications =
        NotificationDispatcher::new(Arc::new(notifier), config.notify_max_in_flight);

    let state = AppState::new(Arc::new(store), Arc::new(verifier), notifications)
        .with_auth_timeout(config.auth_timeout);
    let app = router(state);

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(addr = %listener.local_addr()?, "Orders server listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Orders server stopped");
    Ok(())
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received, draining connections");
    shutdown.cancel();
}
