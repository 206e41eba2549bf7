use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::{FromRef, MatchedPath},
    http::Request,
    routing::get,
    Router,
};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::campaign::BirthdayCampaign;
use crate::configuration::{DatabaseSettings, EmailClientSettings, Settings};
use crate::email_client::EmailClient;
use crate::routes::{check_health, list_users, register_user, run_birthday_campaign};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: Pool<Postgres>,
    pub campaign: BirthdayCampaign,
}

pub async fn run(listener: TcpListener, app_state: AppState) -> Result<(), std::io::Error> {
    let app = router(app_state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

pub fn get_app_state(configuration: &Settings) -> Result<AppState, anyhow::Error> {
    let pool = get_connection_pool(&configuration.database)
        .context("Failed to configure the Postgres connection pool")?;
    let email_client = get_email_client(&configuration.email_client)?;
    let campaign = BirthdayCampaign::new(pool.clone(), Arc::new(email_client));

    Ok(AppState { pool, campaign })
}

pub fn get_connection_pool(settings: &DatabaseSettings) -> Result<Pool<Postgres>, sqlx::Error> {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy(settings.connection_string().expose_secret())
}

pub fn get_email_client(settings: &EmailClientSettings) -> Result<EmailClient, anyhow::Error> {
    let sender = settings
        .sender()
        .map_err(anyhow::Error::msg)
        .context("Invalid sender email address")?;

    EmailClient::new(
        settings.access_url.clone(),
        sender,
        settings.authorization_token.clone(),
        settings.timeout(),
    )
    .context("Failed to build the email client")
}

pub fn router(app_state: AppState) -> Router {
    let api = Router::new()
        .route("/users", get(list_users).post(register_user))
        .route("/test-birthday-emails", get(run_birthday_campaign));

    Router::new()
        .nest("/api", api)
        .route("/health_check", get(check_health))
        .with_state(app_state)
        .layer(
            // Refer to https://github.com/tokio-rs/axum/blob/main/examples/tracing-aka-logging/Cargo.toml
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);
                tracing::info_span!(
                    "Starting HTTP request",
                    method = ?request.method(),
                    path,
                    request_id = %Uuid::new_v4(),
                )
            }),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
