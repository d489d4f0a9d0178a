// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use std::{any::Any, sync::Arc};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use runtime::ArtifactLoader;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, TraceLayer},
};
use tracing::{error, info};

use crate::{
    app_state::AppState,
    errors::PredictError,
    handler::{health, method_not_allowed, predict},
};

pub const PREDICT_PATH: &str = "/predict";
/// Route used by the form client.
pub const API_PREDICT_PATH: &str = "/api/predict";
pub const HEALTH_PATH: &str = "/health";

/// Largest request body accepted. A feature vector is well under a kilobyte.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the predictor router over the given state.
pub fn router<L: ArtifactLoader>(state: Arc<AppState<L>>) -> Router {
    let cors = state.config.cors;

    let mut app = Router::new()
        .route(PREDICT_PATH, post(predict::<L>).fallback(method_not_allowed))
        .route(API_PREDICT_PATH, post(predict::<L>).fallback(method_not_allowed))
        .route(HEALTH_PATH, get(health::<L>))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(panic_response));

    if cors {
        // Setup a permissive CORS policy
        app = app.layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_origin(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );
    }

    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(tracing::Level::DEBUG))
            .on_failure(DefaultOnFailure::new().level(tracing::Level::DEBUG)),
    )
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Request handler panicked: {message}");
    PredictError::Internal(message.to_string()).into_response()
}

/// Bind the configured address and serve until ctrl-c.
pub async fn start_predictor<L: ArtifactLoader>(state: Arc<AppState<L>>) -> anyhow::Result<()> {
    let addr = state.config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Predictor listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Predictor shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
