// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::BytesRejection},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use models::{
    ModelAPI,
    tensor_conversions::{output_values, row_tensor},
};
use runtime::ArtifactLoader;
use tracing::{debug, error, warn};

use crate::{
    app_state::AppState,
    errors::PredictError,
    predictor_types::{FeatureVector, HealthResponse, PredictResponse, Prediction},
};

/// `POST /predict`
pub async fn predict<L: ArtifactLoader>(
    State(state): State<Arc<AppState<L>>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let outcome = match body {
        Ok(body) => run_prediction(&state, &body).await,
        Err(rejection) => Err(PredictError::from(rejection)),
    };
    match outcome {
        Ok(prediction) => {
            let mut response = Json(PredictResponse { prediction }).into_response();
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            response
        }
        Err(err) => {
            let kind: &'static str = (&err).into();
            match &err {
                e if e.is_client_error() => debug!("Rejected prediction request ({kind}): {e}"),
                PredictError::Load(e) => warn!("Model unavailable ({kind}): {e}"),
                e => error!("Prediction failed ({kind}): {e}"),
            }
            err.into_http(state.config.expose_error_detail)
        }
    }
}

async fn run_prediction<L: ArtifactLoader>(
    state: &AppState<L>,
    body: &[u8],
) -> Result<Prediction, PredictError> {
    // Validation happens before the model is touched.
    let features = FeatureVector::from_body(body)?;

    let model = state.cache.get_or_load().await.map_err(PredictError::Load)?;

    let input = state.resources.scope(row_tensor::<<L::Model as ModelAPI>::Backend>(
        features.as_slice(),
        model.device(),
    ));
    let output = state
        .resources
        .scope(model.predict((*input).clone()).await.map_err(PredictError::Inference)?);

    let values = output_values((*output).clone().into_data()).map_err(PredictError::Inference)?;
    Ok(Prediction::from_values(values))
}

/// Any method on a prediction route other than `POST`.
pub async fn method_not_allowed() -> Response {
    PredictError::MethodNotAllowed.into_response()
}

/// `GET /health`
pub async fn health<L: ArtifactLoader>(State(state): State<Arc<AppState<L>>>) -> Response {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.cache.phase().as_str().to_string(),
    })
    .into_response()
}
