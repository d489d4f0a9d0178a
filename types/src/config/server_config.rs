// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Default port the prediction service listens on
pub const DEFAULT_PREDICTOR_PORT: u16 = 9184;

/// Default artifact locator, relative to the working directory
pub const DEFAULT_MODEL_LOCATOR: &str = "model/model.safetensors";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Host IP to bind to
    #[serde(default = "default_host_ip")]
    pub host_ip: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Filesystem path, `file://` URL or `http(s)://` URL of the model artifact.
    #[serde(default = "default_model_locator")]
    pub model_locator: String,

    /// Include the underlying error message in 500 responses. Development only.
    #[serde(default)]
    pub expose_error_detail: bool,

    /// Answer CORS preflights with permissive headers.
    #[serde(default = "default_true")]
    pub cors: bool,

    /// Load the model at startup instead of on the first request.
    #[serde(default)]
    pub preload: bool,
}

impl Config for ServerConfig {}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host_ip, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid predictor address: {e}"))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host_ip: default_host_ip(),
            port: default_port(),
            model_locator: default_model_locator(),
            expose_error_detail: false,
            cors: true,
            preload: false,
        }
    }
}

fn default_host_ip() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PREDICTOR_PORT
}

fn default_model_locator() -> String {
    DEFAULT_MODEL_LOCATOR.to_string()
}

fn default_true() -> bool {
    true
}
