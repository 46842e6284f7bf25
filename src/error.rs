// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for netprint

use thiserror::Error;

/// Result type alias for netprint operations
pub type Result<T> = std::result::Result<T, NetprintError>;

/// Errors raised while loading a fingerprint catalog or building an engine.
///
/// These only ever occur at construction time. Matching itself has no error
/// path: a sparse or odd observation simply scores nothing.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog is empty")]
    Empty,

    #[error("Catalog entry {index} has no integration identifier")]
    MissingIntegration { index: usize },

    #[error("Catalog entry {index} is malformed: {reason}")]
    MalformedEntry { index: usize, reason: String },

    #[error("Catalog entry {index} ({integration}) has an invalid MAC prefix: {value:?}")]
    InvalidMacPrefix {
        index: usize,
        integration: String,
        value: String,
    },

    #[error("Catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// netprint error types
#[derive(Error, Debug)]
pub enum NetprintError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid observation: {0}")]
    Observation(String),

    #[error("Classification task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
