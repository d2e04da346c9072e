//! Engine configuration: the fixed constants the derivation depends on,
//! gathered in one struct so tests can swap in alternate constant sets.
//!
//! Every field has a serde default, so a partial JSON document (or `{}`)
//! yields a complete configuration.

use serde::{Deserialize, Serialize};

use crate::domain::{CitizenGroup, Mechanism};
use crate::errors::CoreError;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Seconds a queued proposal may wait before it counts as passed when it
/// carries no on-chain calldata (10 days).
pub const DEFAULT_QUEUE_PASS_WINDOW_SECS: u64 = 10 * 24 * 60 * 60;

/// Per-group weights of a hybrid (delegates + citizens) tally. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridWeights {
    pub delegates: f64,
    pub users: f64,
    pub apps: f64,
    pub chains: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            delegates: 0.5,
            users: 1.0 / 6.0,
            apps: 1.0 / 6.0,
            chains: 1.0 / 6.0,
        }
    }
}

impl HybridWeights {
    pub fn for_group(&self, group: CitizenGroup) -> f64 {
        match group {
            CitizenGroup::App => self.apps,
            CitizenGroup::User => self.users,
            CitizenGroup::Chain => self.chains,
        }
    }

    pub fn sum(&self) -> f64 {
        self.delegates + self.users + self.apps + self.chains
    }
}

/// Fixed number of eligible voters per citizen group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitizenEligibility {
    pub user: u64,
    pub app: u64,
    pub chain: u64,
}

impl Default for CitizenEligibility {
    fn default() -> Self {
        Self { user: 1000, app: 100, chain: 15 }
    }
}

impl CitizenEligibility {
    pub fn for_group(&self, group: CitizenGroup) -> f64 {
        match group {
            CitizenGroup::App => self.app as f64,
            CitizenGroup::User => self.user as f64,
            CitizenGroup::Chain => self.chain as f64,
        }
    }
}

/// Default veto tiers (percent), ordered by increasing strictness:
/// `[0]` is the threshold all four groups must reach, `[2]` the one two
/// groups must reach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VetoTierDefaults {
    pub hybrid_tiered: [f64; 3],
    pub offchain_tiered: [f64; 3],
    pub offchain_simple: [f64; 3],
    pub fallback: [f64; 3],
}

impl Default for VetoTierDefaults {
    fn default() -> Self {
        Self {
            hybrid_tiered: [11.0, 14.0, 17.0],
            offchain_tiered: [11.0, 14.0, 17.0],
            offchain_simple: [20.0, 20.0, 20.0],
            fallback: [50.0, 50.0, 50.0],
        }
    }
}

impl VetoTierDefaults {
    pub fn for_mechanism(&self, mechanism: Mechanism) -> [f64; 3] {
        match mechanism {
            Mechanism::HybridOptimisticTiered => self.hybrid_tiered,
            Mechanism::OffchainOptimisticTiered => self.offchain_tiered,
            Mechanism::OffchainOptimistic => self.offchain_simple,
            _ => self.fallback,
        }
    }
}

/// Everything the derivation needs besides the record, the token decimals and "now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: HybridWeights,
    pub eligible: CitizenEligibility,
    pub veto_tiers: VetoTierDefaults,
    pub queue_pass_window_secs: u64,
    /// Share of total voting power used as approval quorum when nothing else resolves.
    pub approval_fallback_quorum_pct: f64,
    /// Weighted participation a hybrid approval proposal must reach.
    pub hybrid_approval_quorum_pct: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: HybridWeights::default(),
            eligible: CitizenEligibility::default(),
            veto_tiers: VetoTierDefaults::default(),
            queue_pass_window_secs: DEFAULT_QUEUE_PASS_WINDOW_SECS,
            approval_fallback_quorum_pct: 30.0,
            hybrid_approval_quorum_pct: 30.0,
        }
    }
}

impl EngineConfig {
    /// Domain checks; run once after loading, the engine itself assumes a valid config.
    pub fn validate(&self) -> Result<(), CoreError> {
        let w = &self.weights;
        let parts = [w.delegates, w.users, w.apps, w.chains];
        if parts.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(CoreError::DomainOutOfRange("weights"));
        }
        let sum = w.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CoreError::WeightsNotNormalized(sum));
        }

        if self.eligible.user == 0 {
            return Err(CoreError::ZeroEligibleCount("USER"));
        }
        if self.eligible.app == 0 {
            return Err(CoreError::ZeroEligibleCount("APP"));
        }
        if self.eligible.chain == 0 {
            return Err(CoreError::ZeroEligibleCount("CHAIN"));
        }

        let t = &self.veto_tiers;
        for (name, tiers) in [
            ("hybrid_tiered", &t.hybrid_tiered),
            ("offchain_tiered", &t.offchain_tiered),
            ("offchain_simple", &t.offchain_simple),
            ("fallback", &t.fallback),
        ] {
            if tiers.iter().any(|v| !v.is_finite() || *v < 0.0 || *v > 100.0) {
                return Err(CoreError::InvalidTiers(name));
            }
        }

        for (name, pct) in [
            ("approval_fallback_quorum_pct", self.approval_fallback_quorum_pct),
            ("hybrid_approval_quorum_pct", self.hybrid_approval_quorum_pct),
        ] {
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                return Err(CoreError::DomainOutOfRange(name));
            }
        }
        Ok(())
    }
}
