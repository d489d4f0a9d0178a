// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use burn::backend::NdArray;

pub mod cache;
pub mod loader;
pub mod locator;
pub mod resources;

pub use cache::{LoadPhase, ModelCache, ModelHandle};
pub use loader::{ArtifactLoader, store::ObjectStoreLoader};
pub use locator::ArtifactLocator;
pub use resources::{ResourceTracker, Scoped};

/// Backend used by the shipped service. Inference runs on the CPU.
pub type DefaultBackend = NdArray<f32>;

/// Build the cache for the configured artifact, backed by the object store loader.
pub fn build_model_cache(
    locator: ArtifactLocator,
) -> ModelCache<ObjectStoreLoader<DefaultBackend>> {
    ModelCache::new(Arc::new(ObjectStoreLoader::new(Default::default())), locator)
}
