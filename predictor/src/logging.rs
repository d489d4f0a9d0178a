// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

const DEFAULT_FILTER: &str = "info";
static INIT: Once = Once::new();

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let subscriber = tracing_subscriber::registry().with(filter).with(fmt::layer());

        // Ignore error if a global default subscriber has already been set
        // (e.g., by a test harness in the same process).
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
