// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fully-connected regressor decoded from a safetensors artifact.
//!
//! The artifact stores one `layers.{i}.weight` (`[d_input, d_output]`) and one
//! `layers.{i}.bias` (`[d_output]`) per layer. Hidden layers apply a ReLU; the
//! final layer is linear.

use async_trait::async_trait;
use burn::{
    Tensor,
    prelude::Backend,
    tensor::{TensorData, activation::relu},
};
use safetensors::SafeTensors;
use types::error::{InferenceError, LoadError, LoadResult, ModelResult};

use crate::{ModelAPI, tensor_conversions::IntoTensorData};

#[derive(Debug, Clone)]
struct DenseLayer<B: Backend> {
    weight: Tensor<B, 2>,
    bias: Tensor<B, 1>,
}

impl<B: Backend> DenseLayer<B> {
    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        input.matmul(self.weight.clone()) + self.bias.clone().unsqueeze::<2>()
    }
}

#[derive(Debug, Clone)]
pub struct DenseRegressor<B: Backend> {
    layers: Vec<DenseLayer<B>>,
    device: B::Device,
}

impl<B: Backend> DenseRegressor<B> {
    /// Decode an artifact and check that its first layer accepts `input_dim` features.
    pub fn from_safetensors(bytes: &[u8], input_dim: usize, device: &B::Device) -> LoadResult<Self> {
        let st = SafeTensors::deserialize(bytes)
            .map_err(|e| LoadError::MalformedArtifact(e.to_string()))?;

        let mut layers = Vec::new();
        let mut expected_input = input_dim;
        loop {
            let idx = layers.len();
            let weight = match st.tensor(&format!("layers.{idx}.weight")) {
                Ok(view) => view,
                Err(_) if idx > 0 => break,
                Err(e) => return Err(LoadError::MalformedArtifact(e.to_string())),
            };
            let bias = st
                .tensor(&format!("layers.{idx}.bias"))
                .map_err(|e| LoadError::MalformedArtifact(format!("layer {idx}: {e}")))?;

            let weight_data = weight.to_tensor_data().map_err(malformed)?;
            let bias_data = bias.to_tensor_data().map_err(malformed)?;
            let [d_input, d_output] = dims2(&weight_data, idx)?;
            if d_input != expected_input {
                return Err(LoadError::IncompatibleArtifact(format!(
                    "layer {idx} expects {d_input} inputs, previous layer provides {expected_input}"
                )));
            }
            if bias_data.shape != [d_output] {
                return Err(LoadError::IncompatibleArtifact(format!(
                    "layer {idx} bias shape {:?} does not match output width {d_output}",
                    bias_data.shape
                )));
            }

            layers.push(DenseLayer {
                weight: Tensor::from_data(weight_data, device),
                bias: Tensor::from_data(bias_data, device),
            });
            expected_input = d_output;
        }

        Ok(Self { layers, device: device.clone() })
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map(|l| l.weight.dims()[0]).unwrap_or_default()
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.weight.dims()[1]).unwrap_or_default()
    }

    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let last = self.layers.len() - 1;
        self.layers.iter().enumerate().fold(input, |x, (idx, layer)| {
            let x = layer.forward(x);
            if idx < last { relu(x) } else { x }
        })
    }
}

fn malformed(e: InferenceError) -> LoadError {
    LoadError::MalformedArtifact(e.to_string())
}

fn dims2(data: &TensorData, idx: usize) -> LoadResult<[usize; 2]> {
    match data.shape.as_slice() {
        [d_input, d_output] => Ok([*d_input, *d_output]),
        other => Err(LoadError::IncompatibleArtifact(format!(
            "layer {idx} weight must be 2-dimensional, got {other:?}"
        ))),
    }
}

#[async_trait]
impl<B: Backend> ModelAPI for DenseRegressor<B> {
    type Backend = B;

    fn device(&self) -> &B::Device {
        &self.device
    }

    async fn predict(&self, input: Tensor<B, 2>) -> ModelResult<Tensor<B, 2>> {
        let [batch, features] = input.dims();
        if features != self.input_dim() {
            return Err(InferenceError::ShapeMismatch {
                expected: vec![batch, self.input_dim()],
                actual: vec![batch, features],
            });
        }
        Ok(self.forward(input))
    }
}
