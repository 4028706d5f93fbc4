// SPDX-License-Identifier: MIT

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ecsfs::prelude::{FormatOptions, FsLimits};
use serde::Deserialize;

/// Picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "ecsfs.toml";

/// Settings file:
///
/// ```toml
/// [limits]
/// max_files = 64
/// max_open_files = 8
///
/// [format]
/// data_blocks = 1024
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub limits: FsLimits,
    pub format: FormatOptions,
}

impl Config {
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Loads `explicit`, or `ecsfs.toml` if it exists, or the defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            return Self::from_file(&fallback);
        }
        Ok(Self::default())
    }

    /// Command-line values win over the file.
    pub fn with_overrides(mut self, max_files: Option<usize>, max_open_files: Option<usize>) -> Self {
        if let Some(n) = max_files {
            self.limits.max_files = n;
        }
        if let Some(n) = max_open_files {
            self.limits.max_open_files = n;
        }
        self
    }
}
