// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::trace;

pub mod server_config;

pub const PREDICTOR_CONFIG: &str = "predictor.yaml";

pub trait Config
where
    Self: DeserializeOwned + Serialize,
{
    fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        trace!("Reading config from {}", path.display());
        let reader = fs::File::open(path)
            .with_context(|| format!("Unable to load config from {}", path.display()))?;
        serde_yaml::from_reader(reader)
            .with_context(|| format!("Unable to parse config at {}", path.display()))
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        trace!("Writing config to {}", path.display());
        let config = serde_yaml::to_string(&self)?;
        fs::write(path, config)
            .with_context(|| format!("Unable to save config to {}", path.display()))?;
        Ok(())
    }
}
