// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! netprint: Local Network Device Fingerprint Matching
//!
//! Classifies devices seen on a local network (DHCP lease data, Zeroconf
//! service types, SSDP descriptions) against a catalog of integration
//! fingerprints and picks the integration each device most likely is.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod scorer;
pub mod selector;
pub mod stream;

pub use catalog::Catalog;
pub use config::AppConfig;
pub use engine::MatchEngine;
pub use error::{CatalogError, NetprintError, Result};
pub use model::{DeviceObservation, IntegrationFingerprint, MatchResult};
pub use selector::MatchPolicy;
