// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use std::{
    ops::{Deref, DerefMut},
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

#[derive(Default)]
struct Counters {
    live: AtomicUsize,
    acquired: AtomicU64,
}

/// Counts transient per-request resources (input tensors, output buffers).
///
/// Every resource is wrapped in a [`Scoped`] guard whose `Drop` releases it, so
/// `live()` returns to its baseline on every exit path, including errors and
/// cancelled requests.
#[derive(Clone, Default)]
pub struct ResourceTracker {
    counters: Arc<Counters>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope<T>(&self, value: T) -> Scoped<T> {
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Scoped { value, tracker: self.clone() }
    }

    /// Resources currently held by in-flight requests.
    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    /// Resources acquired since the tracker was created.
    pub fn total_acquired(&self) -> u64 {
        self.counters.acquired.load(Ordering::SeqCst)
    }
}

/// A resource released when the guard goes out of scope.
pub struct Scoped<T> {
    value: T,
    tracker: ResourceTracker,
}

impl<T> Deref for Scoped<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Scoped<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T> Drop for Scoped<T> {
    fn drop(&mut self) {
        self.tracker.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}
