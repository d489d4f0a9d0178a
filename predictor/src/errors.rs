// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use strum::IntoStaticStr;
use thiserror::Error;
use types::{
    FEATURE_COUNT,
    error::{InferenceError, LoadError},
};

use crate::predictor_types::ErrorResponse;

#[derive(Debug, Error, IntoStaticStr)]
pub enum PredictError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Payload Too Large")]
    PayloadTooLarge,

    #[error("Input must be an array of {} numbers", FEATURE_COUNT)]
    InvalidInput,

    #[error("Model unavailable: {0}")]
    Load(LoadError),

    #[error("Inference failed: {0}")]
    Inference(InferenceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PredictError {
    pub fn status(&self) -> StatusCode {
        match self {
            PredictError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            PredictError::InvalidJson | PredictError::InvalidInput => StatusCode::BAD_REQUEST,
            PredictError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            PredictError::Load(_) | PredictError::Inference(_) | PredictError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Message safe to return to any caller.
    pub fn public_message(&self) -> String {
        match self {
            PredictError::Load(_) => "Model unavailable".to_string(),
            PredictError::Inference(_) | PredictError::Internal(_) => {
                "Internal server error".to_string()
            }
            client => client.to_string(),
        }
    }

    /// Build the HTTP response. Server-side failures carry the underlying
    /// message in `detail` only when `expose_detail` is set.
    pub fn into_http(self, expose_detail: bool) -> Response {
        let detail = match &self {
            PredictError::Load(e) if expose_detail => Some(e.to_string()),
            PredictError::Inference(e) if expose_detail => Some(e.to_string()),
            PredictError::Internal(e) if expose_detail => Some(e.clone()),
            _ => None,
        };
        let body = ErrorResponse { error: self.public_message(), detail };
        (self.status(), Json(body)).into_response()
    }
}

/// A body that could not be buffered never reaches JSON parsing.
impl From<BytesRejection> for PredictError {
    fn from(rejection: BytesRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => PredictError::PayloadTooLarge,
            _ => PredictError::InvalidJson,
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        self.into_http(false)
    }
}
