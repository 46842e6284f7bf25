// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for netprint

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::Catalog;
use crate::selector::MatchPolicy;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    /// Fingerprint catalog file; the bundled catalog is used when unset
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// How the winning fingerprint is picked
    #[serde(default)]
    pub policy: MatchPolicy,

    /// Result output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Stream classification settings
    #[serde(default)]
    pub stream: StreamConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OutputConfig {
    /// `text`, `json` or `jsonl`
    #[serde(default = "default_format")]
    pub format: String,
    /// Include per-signal score breakdowns
    #[serde(default)]
    pub explain: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StreamConfig {
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

// Default value functions
fn default_format() -> String { "text".to_string() }
fn default_max_in_flight() -> usize { 64 }

const OUTPUT_FORMATS: [&str; 3] = ["text", "json", "jsonl"];

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            explain: false,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::NetprintError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings that parse but make no sense
    pub fn validate(&self) -> crate::Result<()> {
        if !OUTPUT_FORMATS.contains(&self.output.format.as_str()) {
            return Err(crate::NetprintError::Config(format!(
                "Unknown output format '{}', expected one of {:?}",
                self.output.format, OUTPUT_FORMATS
            )));
        }
        if self.stream.max_in_flight == 0 {
            return Err(crate::NetprintError::Config(
                "stream.max_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load the configured catalog, or the bundled one
    pub fn load_catalog(&self) -> crate::Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::load(Path::new(path)),
            None => Ok(Catalog::builtin()?),
        }
    }
}
