use anyhow::Result;
use axum::Router;
use nikola::{
    config::Config,
    http::{AppState, build_private_router, build_public_router, build_router},
    partner::{FileClientCredentialStore, HttpTokenIssuer, PartnerTokenManager},
    registration::RegistrationService,
    storage::{create_storage_backend, parse_storage_backend},
};
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "nikola=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();

    let version = nikola::config::version()?;

    env::args().for_each(|arg| {
        if arg == "--version" {
            println!("{version}");
            std::process::exit(0);
        }
    });

    tracing::info!(?version, "Starting nikola");

    let config = Config::new()?;

    let mut client_builder = reqwest::Client::builder();
    for ca_certificate in config.certificate_bundles.as_ref() {
        tracing::info!("Loading CA certificate: {:?}", ca_certificate);
        let cert = std::fs::read(ca_certificate)?;
        let cert = reqwest::Certificate::from_pem(&cert)?;
        client_builder = client_builder.add_root_certificate(cert);
    }

    client_builder = client_builder
        .user_agent(config.user_agent.clone())
        .timeout(*config.http_client_timeout.as_ref());
    let http_client = client_builder.build()?;

    let storage_backend =
        parse_storage_backend(&config.storage_backend, config.database_url.as_deref())?;
    let user_store = create_storage_backend(storage_backend).await?;

    let credentials = Arc::new(FileClientCredentialStore::new(
        config.client_id_path.clone(),
        config.client_secret_path.clone(),
    ));

    // The partner expects the fleet API base URL as the token audience.
    let token_issuer = Arc::new(HttpTokenIssuer::new(
        http_client.clone(),
        config.partner_token_url.as_ref().clone(),
        config.partner_base_url.trimmed().to_string(),
    ));
    let token_manager = Arc::new(PartnerTokenManager::new(
        credentials.clone(),
        token_issuer,
    ));

    let registration_service = Arc::new(RegistrationService::new(
        http_client,
        config.domain.as_ref().clone(),
        config.partner_base_url.as_ref().clone(),
        config.partner_authorize_url.as_ref().clone(),
        token_manager,
        credentials,
        user_store,
    ));

    let app_context = AppState {
        config: Arc::new(config.clone()),
        registration_service,
    };

    // Setup graceful shutdown
    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    {
        let tracker = tracker.clone();
        let inner_token = token.clone();

        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::spawn(async move {
            tokio::select! {
                () = inner_token.cancelled() => { },
                _ = terminate => {},
                _ = ctrl_c => {},
            }

            tracker.close();
            inner_token.cancel();
        });
    }

    let http_port = *config.http_port.as_ref();
    match *config.public_http_port.as_ref() {
        Some(public_http_port) => {
            let public_app = build_public_router(&config);
            spawn_server(&tracker, &token, "private", http_port, build_private_router(app_context))
                .await?;
            spawn_server(&tracker, &token, "public", public_http_port, public_app).await?;
        }
        None => {
            spawn_server(&tracker, &token, "combined", http_port, build_router(app_context))
                .await?;
        }
    }

    tracker.wait().await;

    Ok(())
}

/// Bind `port` and serve `app` until the token is cancelled.
async fn spawn_server(
    tracker: &TaskTracker,
    token: &CancellationToken,
    name: &'static str,
    port: u16,
    app: Router,
) -> Result<()> {
    let bind_address = format!("0.0.0.0:{port}");
    tracing::info!(listener = name, "Starting server on {bind_address}");
    let listener = TcpListener::bind(&bind_address).await?;

    let inner_token = token.clone();
    tracker.spawn(async move {
        let shutdown_token = inner_token.clone();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
                tracing::info!(listener = name, "axum graceful shutdown complete");
            })
            .await;
        if let Err(err) = result {
            tracing::error!(listener = name, "axum task failed: {}", err);
        }

        inner_token.cancel();
    });

    Ok(())
}
