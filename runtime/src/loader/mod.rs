// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use models::ModelAPI;
use types::error::LoadResult;

use crate::ArtifactLocator;

pub mod store;

/// Fetches and decodes the model artifact.
#[async_trait]
pub trait ArtifactLoader: Send + Sync + 'static {
    type Model: ModelAPI;

    async fn load(&self, locator: &ArtifactLocator) -> LoadResult<Self::Model>;
}
