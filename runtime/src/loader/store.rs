// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use burn::prelude::Backend;
use bytes::Bytes;
use models::DenseRegressor;
use object_store::{ObjectStore, local::LocalFileSystem, path::Path};
use tracing::debug;
use types::{
    FEATURE_COUNT,
    error::{LoadError, LoadResult},
};

use crate::{ArtifactLocator, loader::ArtifactLoader};

/// Loads a [`DenseRegressor`] from the local filesystem or an HTTP(S) server.
pub struct ObjectStoreLoader<B: Backend> {
    device: B::Device,
}

impl<B: Backend> ObjectStoreLoader<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    async fn fetch(locator: &ArtifactLocator) -> LoadResult<Bytes> {
        let (store, path): (Box<dyn ObjectStore>, Path) = match locator {
            ArtifactLocator::Local(fs_path) => {
                let path = Path::from_filesystem_path(fs_path)
                    .map_err(|e| LoadError::NotFound(format!("{}: {e}", fs_path.display())))?;
                (Box::new(LocalFileSystem::new()), path)
            }
            ArtifactLocator::Remote(url) => object_store::parse_url(url)
                .map_err(|e| LoadError::InvalidLocator(format!("{url}: {e}")))?,
        };

        let result = store.get(&path).await.map_err(store_error)?;
        result.bytes().await.map_err(store_error)
    }
}

fn store_error(e: object_store::Error) -> LoadError {
    match e {
        object_store::Error::NotFound { path, .. } => LoadError::NotFound(path),
        other => LoadError::ObjectStoreError(other.to_string()),
    }
}

#[async_trait]
impl<B: Backend> ArtifactLoader for ObjectStoreLoader<B> {
    type Model = DenseRegressor<B>;

    async fn load(&self, locator: &ArtifactLocator) -> LoadResult<Self::Model> {
        let bytes = Self::fetch(locator).await?;
        debug!("Fetched {} artifact bytes from {}", bytes.len(), locator);
        DenseRegressor::from_safetensors(&bytes, FEATURE_COUNT, &self.device)
    }
}
