//! Configuration file for the command-line validator

use anyhow::{Context, Result};
use clap::ValueEnum;
use nxv_validation::ValidationPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// How validation records are written to stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One human-readable line per record
    #[default]
    Text,
    /// One JSON object per record
    Json,
    /// Records become `tracing` events on stderr
    Tracing,
}

/// Settings read from a YAML file
///
/// ```yaml
/// nxdl_dir: /usr/share/nexus/definitions
/// format: json
/// policy:
///   missing_units: error
///   undocumented: info
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Directory searched for `<name>.nxdl.xml`
    pub nxdl_dir: Option<PathBuf>,

    /// Severity policy passed to the validator
    pub policy: ValidationPolicy,

    /// Output format
    pub format: Option<OutputFormat>,
}

impl CliConfig {
    /// Parse a configuration document
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse config")
    }

    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }
}
