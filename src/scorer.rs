// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Fingerprint scoring
//!
//! Each signal category is evaluated on its own and the contributions are
//! summed, so one fingerprint can collect points from DHCP, Zeroconf and SSDP
//! at the same time.

use serde::Serialize;
use tracing::trace;

use crate::model::IntegrationFingerprint;
use crate::normalize::NormalizedObservation;

/// Observation MAC starts with the fingerprint's prefix
pub const DHCP_MAC_WEIGHT: u32 = 10;
/// Fingerprint hostname fragment appears anywhere in the hostname
pub const DHCP_HOSTNAME_WEIGHT: u32 = 20;
/// mDNS service type is identical
pub const ZEROCONF_WEIGHT: u32 = 5;
/// Per SSDP field, only awarded when every required field matches
pub const SSDP_FIELD_WEIGHT: u32 = 3;

/// Signal category that contributed to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    DhcpMac,
    DhcpHostname,
    Zeroconf,
    Ssdp,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::DhcpMac => "dhcp_mac",
            Signal::DhcpHostname => "dhcp_hostname",
            Signal::Zeroconf => "zeroconf",
            Signal::Ssdp => "ssdp",
        }
    }
}

/// Per-signal contributions for one fingerprint/observation pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub dhcp_mac: u32,
    pub dhcp_hostname: u32,
    pub zeroconf: u32,
    pub ssdp: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.dhcp_mac + self.dhcp_hostname + self.zeroconf + self.ssdp
    }

    /// True when at least one signal scored
    pub fn is_match(&self) -> bool {
        self.total() > 0
    }

    /// Non-zero contributions, in table order
    pub fn contributions(&self) -> Vec<(Signal, u32)> {
        [
            (Signal::DhcpMac, self.dhcp_mac),
            (Signal::DhcpHostname, self.dhcp_hostname),
            (Signal::Zeroconf, self.zeroconf),
            (Signal::Ssdp, self.ssdp),
        ]
        .into_iter()
        .filter(|(_, points)| *points > 0)
        .collect()
    }

    /// Signals that contributed, in table order
    pub fn matched_signals(&self) -> Vec<Signal> {
        self.contributions().into_iter().map(|(signal, _)| signal).collect()
    }
}

fn score_mac(fingerprint: &IntegrationFingerprint, observation: &NormalizedObservation) -> u32 {
    match (fingerprint.mac_prefix(), observation.mac.as_deref()) {
        (Some(prefix), Some(mac)) if mac.starts_with(prefix) => DHCP_MAC_WEIGHT,
        _ => 0,
    }
}

fn score_hostname(fingerprint: &IntegrationFingerprint, observation: &NormalizedObservation) -> u32 {
    match (fingerprint.hostname_fragment(), observation.hostname.as_deref()) {
        (Some(fragment), Some(hostname)) if hostname.contains(fragment) => DHCP_HOSTNAME_WEIGHT,
        _ => 0,
    }
}

fn score_zeroconf(fingerprint: &IntegrationFingerprint, observation: &NormalizedObservation) -> u32 {
    match (fingerprint.service_type(), observation.mdns_service_type) {
        (Some(expected), Some(observed)) if expected == observed => ZEROCONF_WEIGHT,
        _ => 0,
    }
}

fn score_ssdp(fingerprint: &IntegrationFingerprint, observation: &NormalizedObservation) -> u32 {
    if fingerprint.ssdp.is_empty() {
        return 0;
    }

    // All or nothing: one mismatching or missing field voids the whole block
    let all_match = fingerprint.ssdp.iter().all(|(field, expected)| {
        observation
            .ssdp_fields
            .get(field.as_str())
            .is_some_and(|observed| observed == expected)
    });

    if all_match {
        SSDP_FIELD_WEIGHT * fingerprint.ssdp.len() as u32
    } else {
        0
    }
}

/// Break down the score of `fingerprint` against `observation` per signal.
///
/// The fingerprint's criteria must already be normalized, which every
/// fingerprint held by a [`crate::catalog::Catalog`] is.
pub fn explain(fingerprint: &IntegrationFingerprint, observation: &NormalizedObservation) -> ScoreBreakdown {
    let breakdown = ScoreBreakdown {
        dhcp_mac: score_mac(fingerprint, observation),
        dhcp_hostname: score_hostname(fingerprint, observation),
        zeroconf: score_zeroconf(fingerprint, observation),
        ssdp: score_ssdp(fingerprint, observation),
    };
    trace!(
        integration = %fingerprint.integration_id,
        score = breakdown.total(),
        "scored fingerprint"
    );
    breakdown
}

/// Total score of `fingerprint` against `observation`
pub fn score(fingerprint: &IntegrationFingerprint, observation: &NormalizedObservation) -> u32 {
    explain(fingerprint, observation).total()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceObservation;

    fn hue() -> IntegrationFingerprint {
        IntegrationFingerprint::new("philips_hue")
            .with_ssdp_field("manufacturer", "philips")
            .with_ssdp_field("deviceType", "urn:schemas-upnp-org:device:basic:1")
    }

    #[test]
    fn test_mac_prefix_scores_ten() {
        let fp = IntegrationFingerprint::new("samsung_tv").with_mac_prefix("445ce9");
        let obs = DeviceObservation::new().with_mac("44:5C:E9:86:51:9C");
        let other = DeviceObservation::new().with_mac("00:5C:E9:86:51:9C");

        assert_eq!(score(&fp, &NormalizedObservation::new(&obs)), 10);
        assert_eq!(score(&fp, &NormalizedObservation::new(&other)), 0);
    }

    #[test]
    fn test_hostname_fragment_is_substring_not_prefix() {
        let fp = IntegrationFingerprint::new("roomba").with_hostname_fragment("roomba");
        let obs = DeviceObservation::new().with_hostname("Upstairs-ROOMBA-960");

        assert_eq!(score(&fp, &NormalizedObservation::new(&obs)), 20);
    }

    #[test]
    fn test_zeroconf_is_case_sensitive() {
        let fp = IntegrationFingerprint::new("hue").with_service_type("_hue._tcp.local.");
        let exact = DeviceObservation::new().with_mdns_service_type("_hue._tcp.local.");
        let shouty = DeviceObservation::new().with_mdns_service_type("_HUE._tcp.local.");

        assert_eq!(score(&fp, &NormalizedObservation::new(&exact)), 5);
        assert_eq!(score(&fp, &NormalizedObservation::new(&shouty)), 0);
    }

    #[test]
    fn test_ssdp_scores_three_per_field() {
        let obs = DeviceObservation::new()
            .with_ssdp_field("manufacturer", "Philips")
            .with_ssdp_field("deviceType", "urn:schemas-upnp-org:device:Basic:1")
            .with_ssdp_field("modelName", "BSB002");

        assert_eq!(score(&hue(), &NormalizedObservation::new(&obs)), 6);
    }

    #[test]
    fn test_ssdp_partial_match_scores_nothing() {
        let obs = DeviceObservation::new()
            .with_ssdp_field("manufacturer", "Philips")
            .with_ssdp_field("deviceType", "urn:schemas-upnp-org:device:MediaRenderer:1");
        let missing = DeviceObservation::new().with_ssdp_field("manufacturer", "Philips");

        assert_eq!(score(&hue(), &NormalizedObservation::new(&obs)), 0);
        assert_eq!(score(&hue(), &NormalizedObservation::new(&missing)), 0);
    }

    #[test]
    fn test_signals_accumulate() {
        let fp = IntegrationFingerprint::new("amazon_fire_tv")
            .with_mac_prefix("ec8ac4")
            .with_hostname_fragment("aftv")
            .with_service_type("_amzn-wplay._tcp.local.")
            .with_ssdp_field("manufacturer", "amazon.com");
        let obs = DeviceObservation::new()
            .with_mac("EC:8A:C4:00:11:22")
            .with_hostname("aftv-cube")
            .with_mdns_service_type("_amzn-wplay._tcp.local.")
            .with_ssdp_field("manufacturer", "Amazon.com");

        let breakdown = explain(&fp, &NormalizedObservation::new(&obs));
        assert_eq!(breakdown.total(), 10 + 20 + 5 + 3);
        assert_eq!(
            breakdown.matched_signals(),
            vec![Signal::DhcpMac, Signal::DhcpHostname, Signal::Zeroconf, Signal::Ssdp]
        );
    }

    #[test]
    fn test_missing_data_scores_zero() {
        let obs = DeviceObservation::new();
        let breakdown = explain(&hue(), &NormalizedObservation::new(&obs));

        assert!(!breakdown.is_match());
        assert!(breakdown.matched_signals().is_empty());
        assert_eq!(score(&IntegrationFingerprint::new("empty"), &NormalizedObservation::new(&obs)), 0);
    }
}
