// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use types::config::{Config, PREDICTOR_CONFIG, server_config::ServerConfig};

#[derive(Parser, Debug, Clone, Default)]
#[clap(name = "predictor", about = "Single-model prediction service")]
pub struct PredictorArgs {
    /// YAML config file. Falls back to `predictor.yaml` in the working
    /// directory when present.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Host IP to bind to
    #[clap(long)]
    pub host_ip: Option<String>,

    /// Port to listen on
    #[clap(long)]
    pub port: Option<u16>,

    /// Model artifact: filesystem path, file:// URL or http(s):// URL
    #[clap(long)]
    pub model: Option<String>,

    /// Load the model at startup
    #[clap(long)]
    pub preload: bool,

    /// Include underlying error messages in 500 responses
    #[clap(long)]
    pub expose_error_detail: bool,
}

impl PredictorArgs {
    /// Resolve the effective config: file (if any), then command-line overrides.
    pub fn into_config(self) -> Result<ServerConfig> {
        let default_path = Path::new(PREDICTOR_CONFIG);
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None if default_path.exists() => ServerConfig::load(default_path)?,
            None => ServerConfig::default(),
        };

        if let Some(host_ip) = self.host_ip {
            config.host_ip = host_ip;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(model) = self.model {
            config.model_locator = model;
        }
        config.preload |= self.preload;
        config.expose_error_detail |= self.expose_error_detail;

        info!("Predictor config: {:?}", config);
        Ok(config)
    }
}
