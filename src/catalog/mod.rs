// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Fingerprint catalog loading and validation
//!
//! The catalog resource is a JSON array of records:
//!
//! ```json
//! [
//!   {
//!     "integration": "samsung_tv",
//!     "match": {
//!       "dhcp": { "macaddress": "44:5C:E9", "hostname": "samsung" },
//!       "zeroconf": { "type": "_samsungtv._tcp.local." },
//!       "ssdp": { "manufacturer": "Samsung Electronics" }
//!     }
//!   }
//! ]
//! ```
//!
//! Records are validated once, here, and turned into typed
//! [`IntegrationFingerprint`]s. Source order is preserved exactly because the
//! selector resolves ties by catalog position.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::model::{DhcpCriteria, IntegrationFingerprint, ZeroconfCriteria};
use crate::normalize::normalize_mac_prefix;

const BUILTIN_CATALOG: &str = include_str!("builtin.json");

#[derive(Debug, Default, Deserialize)]
struct RawMatch {
    #[serde(default)]
    dhcp: Option<RawDhcp>,
    #[serde(default)]
    zeroconf: Option<RawZeroconf>,
    #[serde(default)]
    ssdp: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDhcp {
    #[serde(default)]
    macaddress: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
}

// Extra keys such as `properties` are tolerated and ignored
#[derive(Debug, Default, Deserialize)]
struct RawZeroconf {
    #[serde(default, rename = "type")]
    service_type: Option<String>,
}

/// Ordered, validated, read-only list of fingerprints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    fingerprints: Vec<IntegrationFingerprint>,
}

impl Catalog {
    /// Validate and normalize `fingerprints`, keeping their order.
    ///
    /// Fails on an empty list, a missing identifier, an unusable MAC prefix, or
    /// an empty hostname fragment / service type. Entries without any criteria
    /// are accepted; they just never score.
    pub fn new(fingerprints: Vec<IntegrationFingerprint>) -> Result<Self, CatalogError> {
        if fingerprints.is_empty() {
            return Err(CatalogError::Empty);
        }

        let fingerprints = fingerprints
            .into_iter()
            .enumerate()
            .map(|(index, fingerprint)| normalize_fingerprint(index, fingerprint))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { fingerprints })
    }

    /// Parse a catalog from its JSON form
    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let records: Vec<Value> = serde_json::from_str(content)?;

        let fingerprints = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| parse_record(index, record))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(fingerprints)
    }

    /// Load a catalog from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        info!(
            "Loaded {} fingerprints for {} integrations from {:?} (digest {})",
            catalog.len(),
            catalog.integrations().len(),
            path,
            catalog.digest()
        );
        Ok(catalog)
    }

    /// The fingerprint index bundled with netprint
    pub fn builtin() -> Result<Self, CatalogError> {
        let catalog = Self::from_json_str(BUILTIN_CATALOG)?;
        debug!("Loaded built-in catalog with {} fingerprints", catalog.len());
        Ok(catalog)
    }

    /// Serialize back to the record format, in catalog order
    pub fn to_json_string(&self) -> Result<String, CatalogError> {
        let records: Vec<Value> = self.fingerprints.iter().map(to_record).collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Save the catalog to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// blake3 digest of the normalized catalog, as lower-case hex
    pub fn digest(&self) -> String {
        let records: Vec<Value> = self.fingerprints.iter().map(to_record).collect();
        let canonical = Value::Array(records).to_string();
        blake3::hash(canonical.as_bytes()).to_hex().to_string()
    }

    /// Distinct integration identifiers in first-seen order
    pub fn integrations(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for fingerprint in &self.fingerprints {
            if !seen.contains(&fingerprint.integration_id.as_str()) {
                seen.push(&fingerprint.integration_id);
            }
        }
        seen
    }

    pub fn fingerprints(&self) -> &[IntegrationFingerprint] {
        &self.fingerprints
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IntegrationFingerprint> {
        self.fingerprints.iter()
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    /// Always false for a constructed catalog
    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a IntegrationFingerprint;
    type IntoIter = std::slice::Iter<'a, IntegrationFingerprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn malformed(index: usize, reason: impl Into<String>) -> CatalogError {
    CatalogError::MalformedEntry {
        index,
        reason: reason.into(),
    }
}

/// Turn one raw JSON record into a fingerprint (not yet normalized)
fn parse_record(index: usize, record: Value) -> Result<IntegrationFingerprint, CatalogError> {
    let Value::Object(mut record) = record else {
        return Err(malformed(index, "entry is not an object"));
    };

    let integration_id = match record.remove("integration") {
        None | Some(Value::Null) => return Err(CatalogError::MissingIntegration { index }),
        Some(Value::String(id)) => id,
        Some(other) => {
            return Err(malformed(index, format!("integration must be a string, got {}", other)))
        }
    };

    let raw: RawMatch = match record.remove("match") {
        None | Some(Value::Null) => RawMatch::default(),
        Some(value @ Value::Object(_)) => serde_json::from_value(value)
            .map_err(|e| malformed(index, format!("invalid match block: {}", e)))?,
        Some(_) => return Err(malformed(index, "match must be an object")),
    };

    Ok(IntegrationFingerprint {
        integration_id,
        dhcp: raw.dhcp.map(|d| DhcpCriteria {
            mac_prefix: d.macaddress,
            hostname_fragment: d.hostname,
        }),
        zeroconf: raw.zeroconf.map(|z| ZeroconfCriteria {
            service_type: z.service_type,
        }),
        ssdp: raw.ssdp.unwrap_or_default(),
    })
}

/// Bring a fingerprint's criteria into the form the scorer compares against
fn normalize_fingerprint(
    index: usize,
    mut fingerprint: IntegrationFingerprint,
) -> Result<IntegrationFingerprint, CatalogError> {
    if fingerprint.integration_id.trim().is_empty() {
        return Err(CatalogError::MissingIntegration { index });
    }

    if let Some(dhcp) = fingerprint.dhcp.as_mut() {
        if let Some(raw) = dhcp.mac_prefix.take() {
            let prefix = normalize_mac_prefix(&raw).ok_or_else(|| CatalogError::InvalidMacPrefix {
                index,
                integration: fingerprint.integration_id.clone(),
                value: raw.clone(),
            })?;
            dhcp.mac_prefix = Some(prefix);
        }
        if let Some(fragment) = dhcp.hostname_fragment.as_mut() {
            if fragment.is_empty() {
                return Err(malformed(index, "dhcp hostname fragment is empty"));
            }
            *fragment = fragment.to_lowercase();
        }
    }

    if let Some(service_type) = fingerprint.zeroconf.as_ref().and_then(|z| z.service_type.as_deref()) {
        if service_type.is_empty() {
            return Err(malformed(index, "zeroconf type is empty"));
        }
    }

    for expected in fingerprint.ssdp.values_mut() {
        *expected = expected.to_lowercase();
    }

    Ok(fingerprint)
}

/// Record form of a fingerprint, omitting absent criteria
fn to_record(fingerprint: &IntegrationFingerprint) -> Value {
    let mut criteria = Map::new();

    if let Some(dhcp) = &fingerprint.dhcp {
        let mut block = Map::new();
        if let Some(prefix) = &dhcp.mac_prefix {
            block.insert("macaddress".to_string(), json!(prefix));
        }
        if let Some(fragment) = &dhcp.hostname_fragment {
            block.insert("hostname".to_string(), json!(fragment));
        }
        criteria.insert("dhcp".to_string(), Value::Object(block));
    }

    if let Some(zeroconf) = &fingerprint.zeroconf {
        let mut block = Map::new();
        if let Some(service_type) = &zeroconf.service_type {
            block.insert("type".to_string(), json!(service_type));
        }
        criteria.insert("zeroconf".to_string(), Value::Object(block));
    }

    if !fingerprint.ssdp.is_empty() {
        criteria.insert("ssdp".to_string(), json!(fingerprint.ssdp));
    }

    json!({
        "integration": fingerprint.integration_id,
        "match": criteria,
    })
}
