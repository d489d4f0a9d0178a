// Copyright (c) Soma Contributors
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, path::PathBuf, str::FromStr};

use types::error::LoadError;
use url::Url;

/// Where the model artifact lives. The format behind it is the loader's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactLocator {
    Local(PathBuf),
    Remote(Url),
}

impl FromStr for ArtifactLocator {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(LoadError::InvalidLocator("empty locator".to_string()));
        }
        if !s.contains("://") {
            return Ok(Self::Local(PathBuf::from(s)));
        }

        let url = Url::parse(s).map_err(|e| LoadError::InvalidLocator(format!("{s}: {e}")))?;
        match url.scheme() {
            "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| LoadError::InvalidLocator(format!("{s}: not a local file path"))),
            _ => Ok(Self::Remote(url)),
        }
    }
}

impl fmt::Display for ArtifactLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}
