// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;
use types::FEATURE_COUNT;

use crate::errors::PredictError;

/// Exactly [`FEATURE_COUNT`] finite values, in request order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; FEATURE_COUNT]);

impl FeatureVector {
    /// Parse a raw request body. An empty body is treated as `{}`.
    pub fn from_body(body: &[u8]) -> Result<Self, PredictError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::from_input(None);
        }
        let value: Value = serde_json::from_slice(body).map_err(|_| PredictError::InvalidJson)?;
        Self::from_input(value.get("input"))
    }

    pub fn from_input(input: Option<&Value>) -> Result<Self, PredictError> {
        let Some(Value::Array(items)) = input else {
            return Err(PredictError::InvalidInput);
        };
        if items.len() != FEATURE_COUNT {
            return Err(PredictError::InvalidInput);
        }

        let mut features = [0.0f32; FEATURE_COUNT];
        for (slot, item) in features.iter_mut().zip(items) {
            *slot = item
                .as_f64()
                .filter(|v| v.is_finite())
                .map(|v| v as f32)
                .filter(|v| v.is_finite())
                .ok_or(PredictError::InvalidInput)?;
        }
        Ok(Self(features))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// One value for single-output models, the full row otherwise.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Prediction {
    Scalar(f32),
    Vector(Vec<f32>),
}

impl Prediction {
    pub fn from_values(mut values: Vec<f32>) -> Self {
        if values.len() == 1 {
            Prediction::Scalar(values.remove(0))
        } else {
            Prediction::Vector(values)
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PredictResponse {
    pub prediction: Prediction,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}
