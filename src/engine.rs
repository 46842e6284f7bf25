// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Matching engine
//!
//! [`MatchEngine`] owns a validated [`Catalog`] and classifies observations
//! against it. It holds no mutable state, so one instance can be shared
//! behind an `Arc` by any number of threads or tasks. To switch catalogs,
//! build a new engine and swap it in.

use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::model::{DeviceObservation, IntegrationFingerprint, MatchResult};
use crate::normalize::NormalizedObservation;
use crate::scorer::{self, ScoreBreakdown};
use crate::selector::{self, MatchPolicy};

/// Per-fingerprint scoring detail, used to answer "why did (or didn't) this match"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    /// Position in the catalog
    pub index: usize,
    pub integration_id: String,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone)]
pub struct MatchEngine {
    catalog: Catalog,
    policy: MatchPolicy,
}

impl MatchEngine {
    /// Build an engine from raw fingerprints.
    ///
    /// Fails when the list is empty or an entry has no identifier.
    pub fn new(fingerprints: Vec<IntegrationFingerprint>) -> Result<Self, CatalogError> {
        Ok(Self::from_catalog(Catalog::new(fingerprints)?))
    }

    /// Build an engine around an already validated catalog
    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            catalog,
            policy: MatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Classify one observation.
    ///
    /// Returns `None` when no fingerprint scores above zero. Never fails and
    /// has no side effects beyond logging.
    pub fn match_observation(&self, observation: &DeviceObservation) -> Option<MatchResult> {
        let normalized = NormalizedObservation::new(observation);
        let result = selector::select(self.policy, self.catalog.fingerprints(), &normalized).map(
            |(fingerprint, score)| MatchResult {
                fingerprint: fingerprint.clone(),
                score,
            },
        );

        match &result {
            Some(m) => debug!(integration = %m.integration_id(), score = m.score, "matched device"),
            None => debug!("no fingerprint matched"),
        }
        result
    }

    /// Up to `limit` positive-scoring candidates, best first.
    ///
    /// Ranking always orders by score, whatever the engine's policy.
    pub fn rank(&self, observation: &DeviceObservation, limit: usize) -> Vec<MatchResult> {
        let normalized = NormalizedObservation::new(observation);
        selector::rank(self.catalog.fingerprints(), &normalized, limit)
            .into_iter()
            .map(|(fingerprint, score)| MatchResult {
                fingerprint: fingerprint.clone(),
                score,
            })
            .collect()
    }

    /// Score breakdown of every catalog entry, in catalog order
    pub fn explain(&self, observation: &DeviceObservation) -> Vec<Explanation> {
        let normalized = NormalizedObservation::new(observation);
        self.catalog
            .iter()
            .enumerate()
            .map(|(index, fingerprint)| Explanation {
                index,
                integration_id: fingerprint.integration_id.clone(),
                breakdown: scorer::explain(fingerprint, &normalized),
            })
            .collect()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}
