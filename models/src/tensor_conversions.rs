// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use std::borrow;

use burn::{
    Tensor,
    prelude::Backend,
    tensor::{DType, TensorData},
};
use types::error::{InferenceError, ModelResult};

pub trait IntoTensorData {
    fn to_tensor_data(self) -> ModelResult<TensorData>;
}

impl IntoTensorData for safetensors::tensor::TensorView<'_> {
    fn to_tensor_data(self) -> ModelResult<TensorData> {
        if self.dtype() != safetensors::Dtype::F32 {
            return Err(InferenceError::FailedTypeVerification(format!(
                "expected F32 weights, got {:?}",
                self.dtype()
            )));
        }
        let values = self
            .data()
            .chunks_exact(DType::F32.size())
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect::<Vec<_>>();
        Ok(TensorData::new(values, self.shape().to_vec()))
    }
}

/// Build a single-row `[1, features]` tensor.
pub fn row_tensor<B: Backend>(features: &[f32], device: &B::Device) -> Tensor<B, 2> {
    Tensor::from_data(TensorData::new(features.to_vec(), [1, features.len()]), device)
}

/// Flatten a model output into plain `f32` values.
pub fn output_values(data: TensorData) -> ModelResult<Vec<f32>> {
    let values = data
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| InferenceError::TensorData(format!("{e:?}")))?;
    if values.is_empty() {
        return Err(InferenceError::EmptyOutput);
    }
    if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
        return Err(InferenceError::NonFiniteOutput(idx));
    }
    Ok(values)
}

/// Owned `f32` tensor that can be written with `safetensors::serialize`.
pub struct F32View {
    shape: Vec<usize>,
    bytes: Vec<u8>,
}

impl F32View {
    pub fn new(values: &[f32], shape: &[usize]) -> ModelResult<Self> {
        let expected = shape.iter().product::<usize>();
        if values.len() != expected {
            return Err(InferenceError::ShapeMismatch {
                expected: shape.to_vec(),
                actual: vec![values.len()],
            });
        }
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Ok(Self { shape: shape.to_vec(), bytes })
    }
}

impl safetensors::View for F32View {
    fn dtype(&self) -> safetensors::Dtype {
        safetensors::Dtype::F32
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn data(&self) -> borrow::Cow<'_, [u8]> {
        borrow::Cow::Borrowed(&self.bytes)
    }

    fn data_len(&self) -> usize {
        self.bytes.len()
    }
}
