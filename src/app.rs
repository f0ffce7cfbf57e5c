/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (gateway, admin client) → Router 組み立て
 * - Middleware の適用 (security headers / CORS / request id / trace / limits)
 * - axum::serve() で起動 (ConnectInfo 付き)
 */
use std::net::SocketAddr;
use std::panic;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::{Config, LogFormat};
use crate::error::AppError;
use crate::middleware;
use crate::services::{
    admin::{KeycloakAdmin, KeycloakAdminConfig},
    auth::BearerJwtGateway,
    sensors::InMemorySensorFeed,
};
use crate::state::{AccessSettings, AppState, ConsoleSettings};

fn init_tracing(format: LogFormat) {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,admin_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn init_panic_hook() {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get "lost".
        // No abort: a panic inside the gate's evaluation step is caught and
        // answered as a denial, and the server keeps running.
        tracing::error!(%info, "panic");
        default_hook(info);
    }))
}

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());
    init_panic_hook();

    let config = Config::from_env().context("loading configuration")?;
    tracing::info!(
        "starting admin gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    tracing::debug!(?config, "configuration loaded");

    let state = build_state(&config)?;
    let app = apply_transport(build_router(state), &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("admin gate stopped");
    Ok(())
}

pub fn build_state(config: &Config) -> Result<AppState> {
    // Build process-level services here and inject them into the shared application state.
    let gateway = BearerJwtGateway::new(
        &config.realm_public_key_pem,
        &config.auth_issuer,
        config.auth_audience.as_deref(),
        config.access_token_leeway_seconds,
    )
    .map_err(anyhow::Error::msg)?;

    let admin = KeycloakAdmin::new(KeycloakAdminConfig {
        base_url: config.keycloak_base_url.clone(),
        realm: config.keycloak_realm.clone(),
        client_id: config.keycloak_admin_client_id.clone(),
        client_secret: config.keycloak_admin_client_secret.clone(),
        timeout: config.upstream_timeout,
    })
    .map_err(anyhow::Error::msg)?;

    Ok(AppState::new(
        Arc::new(admin),
        Arc::new(InMemorySensorFeed::new(config.sensor_history_capacity)),
        Arc::new(gateway),
        AccessSettings {
            admin_role: config.admin_role.clone(),
            auth_timeout: config.auth_timeout,
            expose_role_details: config.expose_role_details,
            sensor_resource: config.sensor_resource.clone(),
        },
        ConsoleSettings {
            authorize_url: config.oidc_endpoint("auth"),
            end_session_url: config.oidc_endpoint("logout"),
            client_id: config.keycloak_client_id.clone(),
            public_base_url: config.public_base_url.clone(),
            environment: config.app_env.as_str(),
        },
    ))
}

/// Routes only (no transport layers); tests drive this directly.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::console::routes(&state))
        .nest("/api/v1/admin", api::v1::routes(&state))
        .nest("/api/v1/sensors", api::v1::sensor_routes(&state))
        .fallback(|| async { AppError::not_found("route") })
        .with_state(state)
}

fn apply_transport(router: Router, config: &Config) -> Router {
    let router = middleware::security_headers::apply(router, config.app_env);
    let router = middleware::cors::apply(router, config.app_env, &config.cors_allowed_origins);
    middleware::http::apply(
        router,
        middleware::http::HttpLimits {
            request_timeout: config.request_timeout,
            body_limit_bytes: config.request_body_limit_bytes,
        },
    )
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
