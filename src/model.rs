// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Fingerprint and observation data model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// DHCP lease criteria
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpCriteria {
    /// Lower-case hex MAC prefix without separators (e.g. `445ce9`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_prefix: Option<String>,
    /// Lower-case substring expected somewhere in the advertised hostname
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname_fragment: Option<String>,
}

/// Zeroconf / mDNS criteria
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroconfCriteria {
    /// Exact service type, e.g. `_hue._tcp.local.`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
}

/// A declarative rule set that resolves a device to one integration.
///
/// Fingerprints are built once when a catalog is validated and never change
/// afterwards. String criteria are stored in their normalized form (see
/// [`crate::catalog::Catalog::new`]), so the scorer can compare them directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationFingerprint {
    pub integration_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp: Option<DhcpCriteria>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zeroconf: Option<ZeroconfCriteria>,
    /// SSDP field name -> expected value (lower-cased). Empty means no SSDP criterion.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ssdp: BTreeMap<String, String>,
}

impl IntegrationFingerprint {
    pub fn new(integration_id: impl Into<String>) -> Self {
        Self {
            integration_id: integration_id.into(),
            ..Default::default()
        }
    }

    pub fn with_mac_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.dhcp.get_or_insert_with(DhcpCriteria::default).mac_prefix = Some(prefix.into());
        self
    }

    pub fn with_hostname_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.dhcp.get_or_insert_with(DhcpCriteria::default).hostname_fragment = Some(fragment.into());
        self
    }

    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.zeroconf = Some(ZeroconfCriteria {
            service_type: Some(service_type.into()),
        });
        self
    }

    pub fn with_ssdp_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.ssdp.insert(field.into(), value.into());
        self
    }

    pub fn mac_prefix(&self) -> Option<&str> {
        self.dhcp.as_ref().and_then(|d| d.mac_prefix.as_deref())
    }

    pub fn hostname_fragment(&self) -> Option<&str> {
        self.dhcp.as_ref().and_then(|d| d.hostname_fragment.as_deref())
    }

    pub fn service_type(&self) -> Option<&str> {
        self.zeroconf.as_ref().and_then(|z| z.service_type.as_deref())
    }

    /// True when no criterion is set; such a fingerprint can never win
    pub fn has_no_criteria(&self) -> bool {
        self.mac_prefix().is_none()
            && self.hostname_fragment().is_none()
            && self.service_type().is_none()
            && self.ssdp.is_empty()
    }
}

/// Snapshot of one discovered device, as handed over by a discovery collector.
///
/// Every field is optional; absent data is "no signal", never an error. The
/// short aliases accept the record shape emitted by older collectors
/// (`mac`, `mdns_type`, `ssdp`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceObservation {
    /// Raw MAC address in any separator formatting
    #[serde(default, alias = "mac", skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, alias = "mdns_type", skip_serializing_if = "Option::is_none")]
    pub mdns_service_type: Option<String>,
    #[serde(default, alias = "ssdp", skip_serializing_if = "BTreeMap::is_empty")]
    pub ssdp_fields: BTreeMap<String, String>,
}

impl DeviceObservation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac_address = Some(mac.into());
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_mdns_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.mdns_service_type = Some(service_type.into());
        self
    }

    pub fn with_ssdp_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.ssdp_fields.insert(field.into(), value.into());
        self
    }
}

/// Outcome of a successful match: the winning fingerprint and its score.
///
/// A result always carries a positive score; "nothing matched" is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub fingerprint: IntegrationFingerprint,
    pub score: u32,
}

impl MatchResult {
    pub fn integration_id(&self) -> &str {
        &self.fingerprint.integration_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_fills_blocks() {
        let fp = IntegrationFingerprint::new("samsung_tv")
            .with_mac_prefix("445ce9")
            .with_service_type("_samsungtv._tcp.local.");

        assert_eq!(fp.mac_prefix(), Some("445ce9"));
        assert_eq!(fp.hostname_fragment(), None);
        assert_eq!(fp.service_type(), Some("_samsungtv._tcp.local."));
        assert!(!fp.has_no_criteria());
        assert!(IntegrationFingerprint::new("empty").has_no_criteria());
    }

    #[test]
    fn test_observation_accepts_short_aliases() {
        let json = r#"{
            "mac": "A4:C1:38:12:34:56",
            "hostname": "esphome-bedroom",
            "mdns_type": "_esphomelib._tcp.local.",
            "ssdp": {"manufacturer": "Unknown"}
        }"#;
        let obs: DeviceObservation = serde_json::from_str(json).unwrap();

        assert_eq!(obs.mac_address.as_deref(), Some("A4:C1:38:12:34:56"));
        assert_eq!(obs.mdns_service_type.as_deref(), Some("_esphomelib._tcp.local."));
        assert_eq!(obs.ssdp_fields.get("manufacturer").map(String::as_str), Some("Unknown"));
    }

    #[test]
    fn test_empty_observation_deserializes() {
        let obs: DeviceObservation = serde_json::from_str("{}").unwrap();
        assert_eq!(obs, DeviceObservation::new());
    }
}
