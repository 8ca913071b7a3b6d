pub mod auth;
pub mod authorization;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod recovery;
pub mod routes;
pub mod state;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::SystemMailer;
use crate::middleware::controller;
use crate::rate_limit::{LoginRateLimiter, RecoveryRateLimiter};
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> (Router, SharedState) {
    let system_mailer = config.smtp.as_ref().and_then(|smtp| {
        match SystemMailer::new(smtp) {
            Ok(mailer) => {
                tracing::info!("System SMTP configured");
                Some(Arc::new(mailer))
            }
            Err(e) => {
                tracing::warn!("System SMTP not available: {e}");
                None
            }
        }
    });

    let state: SharedState = Arc::new(AppState {
        pool,
        recovery_limiter: RecoveryRateLimiter::new(config.recovery.max_requests),
        login_limiter: LoginRateLimiter::new(),
        system_mailer,
        config,
    });

    let request_id = HeaderName::from_static(controller::REQUEST_ID_HEADER);

    let app = Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .fallback(controller::not_found)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(axum::middleware::map_response(controller::json_payload_too_large))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(controller::make_span))
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .with_state(state.clone());

    (app, state)
}

/// Periodically drop expired rate limiter windows.
pub fn spawn_limiter_cleanup(state: SharedState, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            state.login_limiter.cleanup();
            state.recovery_limiter.cleanup();
            tracing::debug!("Rate limiter windows cleaned");
        }
    })
}

async fn health() -> &'static str {
    "ok"
}
