// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Best-match selection over an ordered catalog

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::model::IntegrationFingerprint;
use crate::normalize::NormalizedObservation;
use crate::scorer::score;

/// How a winner is picked from the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Highest total score wins, earlier catalog entries win ties
    #[default]
    BestScore,
    /// First fingerprint with any positive score wins
    FirstMatch,
}

/// A fingerprint paired with the score it earned
pub type Scored<'c> = (&'c IntegrationFingerprint, u32);

/// Scan `catalog` in order and return the highest scoring fingerprint.
///
/// The incumbent is only replaced on a strictly greater score, so ties go to
/// the earlier entry and a zero score can never win.
pub fn select_best<'c>(
    catalog: &'c [IntegrationFingerprint],
    observation: &NormalizedObservation,
) -> Option<Scored<'c>> {
    let mut best = None;
    let mut best_score = 0;

    for fingerprint in catalog {
        let candidate = score(fingerprint, observation);
        if candidate > best_score {
            best_score = candidate;
            best = Some(fingerprint);
        }
    }

    best.map(|fingerprint| (fingerprint, best_score))
}

/// Return the first fingerprint in catalog order that scores at all.
pub fn select_first<'c>(
    catalog: &'c [IntegrationFingerprint],
    observation: &NormalizedObservation,
) -> Option<Scored<'c>> {
    catalog
        .iter()
        .map(|fingerprint| (fingerprint, score(fingerprint, observation)))
        .find(|(_, score)| *score > 0)
}

/// Pick a winner according to `policy`
pub fn select<'c>(
    policy: MatchPolicy,
    catalog: &'c [IntegrationFingerprint],
    observation: &NormalizedObservation,
) -> Option<Scored<'c>> {
    match policy {
        MatchPolicy::BestScore => select_best(catalog, observation),
        MatchPolicy::FirstMatch => select_first(catalog, observation),
    }
}

/// All positive-scoring fingerprints, best first, ties in catalog order.
///
/// The first element (if any) is always what [`select_best`] returns.
pub fn rank<'c>(
    catalog: &'c [IntegrationFingerprint],
    observation: &NormalizedObservation,
    limit: usize,
) -> Vec<Scored<'c>> {
    let mut scored: Vec<Scored<'c>> = catalog
        .iter()
        .map(|fingerprint| (fingerprint, score(fingerprint, observation)))
        .filter(|(_, score)| *score > 0)
        .collect();

    // sort_by_key is stable, which keeps catalog order among equal scores
    scored.sort_by_key(|(_, score)| Reverse(*score));
    scored.truncate(limit);
    scored
}
