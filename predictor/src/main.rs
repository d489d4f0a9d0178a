// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use predictor::{
    app_state::AppState, logging::init_tracing, predictor_config::PredictorArgs,
    server::start_predictor,
};
use runtime::{ArtifactLocator, build_model_cache};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = PredictorArgs::parse().into_config()?;

    let locator: ArtifactLocator = config
        .model_locator
        .parse()
        .with_context(|| format!("Invalid model locator {:?}", config.model_locator))?;
    info!("Serving model from {}", locator);

    let state = Arc::new(AppState::new(build_model_cache(locator), config));

    if state.config.preload {
        // A failed preload leaves the cache retryable on the first request.
        if let Err(e) = state.cache.get_or_load().await {
            warn!("Model preload failed: {e}");
        }
    }

    start_predictor(state).await
}
