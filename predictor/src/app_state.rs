// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use runtime::{ArtifactLoader, ModelCache, ResourceTracker};
use types::config::server_config::ServerConfig;

pub struct AppState<L: ArtifactLoader> {
    pub cache: ModelCache<L>,
    /// Tracks the tensors each request holds while it runs.
    pub resources: ResourceTracker,
    pub config: ServerConfig,
}

impl<L: ArtifactLoader> AppState<L> {
    pub fn new(cache: ModelCache<L>, config: ServerConfig) -> Self {
        Self { cache, resources: ResourceTracker::new(), config }
    }
}
