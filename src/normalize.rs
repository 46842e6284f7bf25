// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Signal normalization
//!
//! Converts raw observation fields into the canonical form the scorer
//! compares against. Missing or empty fields become "no signal".

use std::collections::BTreeMap;

use crate::model::DeviceObservation;

/// Lower-case a MAC address and drop everything that is not a hex digit.
///
/// `"44:5C:E9:86:51:9C"`, `"445c.e986.519c"` and `"44-5c-e9-86-51-9c"` all
/// become `"445ce986519c"`. Returns `None` when nothing is left.
pub fn normalize_mac(raw: &str) -> Option<String> {
    let mac: String = raw
        .chars()
        .filter(char::is_ascii_hexdigit)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if mac.is_empty() {
        None
    } else {
        Some(mac)
    }
}

/// Normalize a catalog MAC prefix.
///
/// Only the usual separators (`:`, `-`, `.`, whitespace) are dropped; any other
/// non-hex character makes the prefix invalid and yields `None`.
pub fn normalize_mac_prefix(raw: &str) -> Option<String> {
    let mut prefix = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            ':' | '-' | '.' => continue,
            c if c.is_whitespace() => continue,
            c if c.is_ascii_hexdigit() => prefix.push(c.to_ascii_lowercase()),
            _ => return None,
        }
    }

    if prefix.is_empty() {
        None
    } else {
        Some(prefix)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Comparable view of a [`DeviceObservation`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedObservation<'a> {
    pub mac: Option<String>,
    pub hostname: Option<String>,
    /// Service types are already canonical and compared exactly
    pub mdns_service_type: Option<&'a str>,
    /// Field names as given, values lower-cased
    pub ssdp_fields: BTreeMap<&'a str, String>,
}

impl<'a> NormalizedObservation<'a> {
    pub fn new(observation: &'a DeviceObservation) -> Self {
        Self {
            mac: observation.mac_address.as_deref().and_then(normalize_mac),
            hostname: non_empty(observation.hostname.as_deref()).map(str::to_lowercase),
            mdns_service_type: non_empty(observation.mdns_service_type.as_deref()),
            ssdp_fields: observation
                .ssdp_fields
                .iter()
                .map(|(k, v)| (k.as_str(), v.to_lowercase()))
                .collect(),
        }
    }

    /// True when the observation carries no usable signal at all
    pub fn is_empty(&self) -> bool {
        self.mac.is_none()
            && self.hostname.is_none()
            && self.mdns_service_type.is_none()
            && self.ssdp_fields.is_empty()
    }
}

impl<'a> From<&'a DeviceObservation> for NormalizedObservation<'a> {
    fn from(observation: &'a DeviceObservation) -> Self {
        Self::new(observation)
    }
}
