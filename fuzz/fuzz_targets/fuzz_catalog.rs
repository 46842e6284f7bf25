// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::collections::BTreeMap;

use netprint::{Catalog, DeviceObservation, MatchEngine};

#[derive(Arbitrary, Debug)]
struct Input {
    catalog: String,
    mac: Option<String>,
    hostname: Option<String>,
    mdns_type: Option<String>,
    ssdp: BTreeMap<String, String>,
}

fuzz_target!(|input: Input| {
    let Ok(catalog) = Catalog::from_json_str(&input.catalog) else {
        return;
    };

    // A validated catalog must survive its own serialization unchanged
    let json = catalog.to_json_string().expect("serialize catalog");
    let reloaded = Catalog::from_json_str(&json).expect("reload catalog");
    assert_eq!(reloaded, catalog);

    let engine = MatchEngine::from_catalog(catalog);
    let observation = DeviceObservation {
        mac_address: input.mac,
        hostname: input.hostname,
        mdns_service_type: input.mdns_type,
        ssdp_fields: input.ssdp,
    };

    let result = engine.match_observation(&observation);
    let ranked = engine.rank(&observation, engine.len());
    match result {
        Some(winner) => {
            assert!(winner.score > 0);
            assert_eq!(ranked.first(), Some(&winner));
        }
        None => assert!(ranked.is_empty()),
    }
});
