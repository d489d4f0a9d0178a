// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use burn::{Tensor, prelude::Backend};
use types::error::ModelResult;

pub mod dense;
pub mod tensor_conversions;

pub use dense::DenseRegressor;

/// A loaded, read-only inference engine.
///
/// Implementations must be pure functions of their input: the same tensor
/// always yields the same output and no per-call state is retained.
#[async_trait]
pub trait ModelAPI: Send + Sync + 'static {
    type Backend: Backend;

    fn device(&self) -> &<Self::Backend as Backend>::Device;

    /// Run a `[batch, features]` tensor through the model, returning `[batch, outputs]`.
    async fn predict(
        &self,
        input: Tensor<Self::Backend, 2>,
    ) -> ModelResult<Tensor<Self::Backend, 2>>;
}
