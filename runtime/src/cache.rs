// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

//! Single-flight cache for the model artifact.
//!
//! ```text
//! get_or_load()
//!       │
//!       ├─ Loaded?     return the shared handle, no I/O
//!       ├─ Loading?    subscribe to the in-flight load and wait
//!       └─ NotLoaded?  install Loading, spawn the load, subscribe and wait
//!                           │
//!                           ├─ Ok:  Loaded(handle), broadcast to waiters
//!                           └─ Err: NotLoaded, broadcast error (next call retries)
//! ```
//!
//! The load runs on its own task, so a caller that is cancelled while waiting
//! never strands the state in `Loading`. Every transition and every subscription
//! happens under the same mutex, which means a waiter that observed `Loading` is
//! always subscribed before the outcome is broadcast.

use std::{sync::Arc, time::Instant};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{info, warn};
use types::error::{LoadError, LoadResult};

use crate::{ArtifactLocator, loader::ArtifactLoader};

/// Shared, read-only reference to the loaded model.
pub type ModelHandle<M> = Arc<M>;

type LoadOutcome<M> = LoadResult<ModelHandle<M>>;

enum LoadState<M> {
    NotLoaded,
    Loading(broadcast::Sender<LoadOutcome<M>>),
    Loaded(ModelHandle<M>),
}

/// Observable phase of the cache, without the handle itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    NotLoaded,
    Loading,
    Loaded,
}

impl LoadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotLoaded => "not_loaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
        }
    }
}

pub struct ModelCache<L: ArtifactLoader> {
    loader: Arc<L>,
    locator: ArtifactLocator,
    state: Arc<Mutex<LoadState<L::Model>>>,
}

impl<L: ArtifactLoader> ModelCache<L> {
    pub fn new(loader: Arc<L>, locator: ArtifactLocator) -> Self {
        Self { loader, locator, state: Arc::new(Mutex::new(LoadState::NotLoaded)) }
    }

    pub fn locator(&self) -> &ArtifactLocator {
        &self.locator
    }

    pub fn phase(&self) -> LoadPhase {
        match &*self.state.lock() {
            LoadState::NotLoaded => LoadPhase::NotLoaded,
            LoadState::Loading(_) => LoadPhase::Loading,
            LoadState::Loaded(_) => LoadPhase::Loaded,
        }
    }

    /// Return the shared model, loading it if no load has succeeded yet.
    ///
    /// Concurrent callers share one in-flight load and all receive its outcome.
    pub async fn get_or_load(&self) -> LoadOutcome<L::Model> {
        let (mut rx, leader) = {
            let mut state = self.state.lock();
            let follower = match &*state {
                LoadState::Loaded(model) => return Ok(model.clone()),
                LoadState::Loading(tx) => Some(tx.subscribe()),
                LoadState::NotLoaded => None,
            };
            match follower {
                Some(rx) => (rx, None),
                None => {
                    let (tx, rx) = broadcast::channel(1);
                    *state = LoadState::Loading(tx.clone());
                    (rx, Some(tx))
                }
            }
        };

        if let Some(tx) = leader {
            self.spawn_load(tx);
        }

        rx.recv().await.map_err(|_| LoadError::Interrupted)?
    }

    fn spawn_load(&self, tx: broadcast::Sender<LoadOutcome<L::Model>>) {
        let loader = self.loader.clone();
        let locator = self.locator.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            let mut guard = LoadingGuard { state: state.clone(), resolved: false };
            info!("Loading model artifact from {}", locator);
            let start = Instant::now();

            let outcome = loader.load(&locator).await.map(Arc::new);

            {
                let mut state = state.lock();
                *state = match &outcome {
                    Ok(model) => {
                        info!("Model loaded from {} in {:?}", locator, start.elapsed());
                        LoadState::Loaded(model.clone())
                    }
                    Err(e) => {
                        warn!("Model load from {} failed after {:?}: {e}", locator, start.elapsed());
                        LoadState::NotLoaded
                    }
                };
                guard.resolved = true;
            }

            // Ignore send errors: every waiter may already have gone away.
            let _ = tx.send(outcome);
        });
    }
}

/// Resets `Loading` back to `NotLoaded` if the load task unwinds before resolving.
struct LoadingGuard<M> {
    state: Arc<Mutex<LoadState<M>>>,
    resolved: bool,
}

impl<M> Drop for LoadingGuard<M> {
    fn drop(&mut self) {
        if !self.resolved {
            warn!("Model load task ended without resolving; resetting load state");
            *self.state.lock() = LoadState::NotLoaded;
        }
    }
}
