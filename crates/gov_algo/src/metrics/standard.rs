//! Standard (for / against / abstain) metrics.
//!
//! Inputs:
//! - the record and its resolved `Thresholds` (eligible delegates for hybrids)
//! - token `decimals`, engine `cfg` (hybrid weights, eligible counts)
//!
//! Output by shape:
//! - Hybrid: weighted percentages, not token amounts (`weighted == true`).
//! - Citizens: raw counts summed over APP/USER/CHAIN, unweighted.
//! - On-chain totals / token holders: amounts scaled by `decimals`.
//! - Unsupported: zeros.

use gov_core::numeric::{clamp_percentage, percent_of};
use gov_core::record::RawProposalRecord;
use gov_core::EngineConfig;
use num_bigint::BigInt;
use num_traits::FromPrimitive;
use serde::Serialize;

use crate::classify::{voting_data, VotingData};
use crate::metrics::weighted::{citizen_counts, raw, scaled, weighted_percent, ABSTAIN, AGAINST, FOR};
use crate::thresholds::Thresholds;

/// Display shares, each clamped to `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Segments {
    pub for_pct: f64,
    pub against_pct: f64,
    pub abstain_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VoteMetrics {
    pub for_votes: f64,
    pub against_votes: f64,
    pub abstain_votes: f64,
    /// Base-unit amounts (delegate side for hybrids, summed counts for citizens).
    #[serde(with = "gov_core::numeric::big_int_string")]
    pub for_raw: BigInt,
    #[serde(with = "gov_core::numeric::big_int_string")]
    pub against_raw: BigInt,
    #[serde(with = "gov_core::numeric::big_int_string")]
    pub abstain_raw: BigInt,
    pub segments: Segments,
    pub has_votes: bool,
    /// Values are weighted percentages (hybrid).
    pub weighted: bool,
}

impl VoteMetrics {
    pub fn total(&self) -> f64 {
        self.for_votes + self.against_votes + self.abstain_votes
    }

    fn finish(mut self) -> Self {
        self.segments = if self.weighted {
            Segments {
                for_pct: clamp_percentage(self.for_votes),
                against_pct: clamp_percentage(self.against_votes),
                abstain_pct: clamp_percentage(self.abstain_votes),
            }
        } else {
            let total = self.total();
            Segments {
                for_pct: clamp_percentage(percent_of(self.for_votes, total)),
                against_pct: clamp_percentage(percent_of(self.against_votes, total)),
                abstain_pct: clamp_percentage(percent_of(self.abstain_votes, total)),
            }
        };
        self.has_votes = self.total() > 0.0 || self.weighted;
        self
    }
}

fn floor_big(v: f64) -> BigInt {
    BigInt::from_f64(v.floor()).unwrap_or_default()
}

pub fn extract_standard_metrics(
    r: &RawProposalRecord,
    thresholds: &Thresholds,
    decimals: u32,
    cfg: &EngineConfig,
) -> VoteMetrics {
    let data = voting_data(r);
    let m = match data {
        VotingData::Onchain { .. } | VotingData::TokenHolders { .. } => {
            let flat = data.flat();
            VoteMetrics {
                for_votes: scaled(flat, FOR, decimals),
                against_votes: scaled(flat, AGAINST, decimals),
                abstain_votes: scaled(flat, ABSTAIN, decimals),
                for_raw: raw(flat, FOR),
                against_raw: raw(flat, AGAINST),
                abstain_raw: raw(flat, ABSTAIN),
                ..VoteMetrics::default()
            }
        }
        VotingData::Citizens { outcome } => {
            let f = citizen_counts(outcome, FOR).sum();
            let a = citizen_counts(outcome, AGAINST).sum();
            let ab = citizen_counts(outcome, ABSTAIN).sum();
            VoteMetrics {
                for_votes: f,
                against_votes: a,
                abstain_votes: ab,
                for_raw: floor_big(f),
                against_raw: floor_big(a),
                abstain_raw: floor_big(ab),
                ..VoteMetrics::default()
            }
        }
        VotingData::Hybrid { citizens, .. } => {
            let flat = data.flat();
            let eligible = thresholds.eligible_delegates();
            let side = |code: &str| {
                weighted_percent(
                    scaled(flat, code, decimals),
                    eligible,
                    &citizen_counts(citizens, code),
                    cfg,
                )
            };
            VoteMetrics {
                for_votes: side(FOR),
                against_votes: side(AGAINST),
                abstain_votes: side(ABSTAIN),
                for_raw: raw(flat, FOR),
                against_raw: raw(flat, AGAINST),
                abstain_raw: raw(flat, ABSTAIN),
                weighted: true,
                ..VoteMetrics::default()
            }
        }
        VotingData::Unsupported => VoteMetrics::default(),
    };
    m.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thresholds::resolve_thresholds;
    use serde_json::json;

    fn run(v: serde_json::Value, decimals: u32) -> VoteMetrics {
        let r: RawProposalRecord = serde_json::from_value(v).unwrap();
        let t = resolve_thresholds(&r, decimals);
        extract_standard_metrics(&r, &t, decimals, &EngineConfig::default())
    }

    #[test]
    fn onchain_totals_scale_by_decimals() {
        let m = run(
            json!({
                "data_eng_properties": {"source": "dao_node"},
                "totals": {"no-param": {
                    "1": "3000000000000000000000",
                    "0": "1000000000000000000000",
                }},
            }),
            18,
        );
        assert_eq!(m.for_votes, 3000.0);
        assert_eq!(m.against_votes, 1000.0);
        assert_eq!(m.abstain_votes, 0.0);
        assert_eq!(m.for_raw.to_string(), "3000000000000000000000");
        assert_eq!(m.segments.for_pct, 75.0);
        assert!(m.has_votes && !m.weighted);
    }

    #[test]
    fn token_holders_read_outcome() {
        let m = run(
            json!({
                "data_eng_properties": {"source": "eas-oodao"},
                "outcome": {"token-holders": {"1": "500", "0": "250", "2": "250"}},
            }),
            2,
        );
        assert_eq!(m.for_votes, 5.0);
        assert_eq!(m.against_votes, 2.5);
        assert_eq!(m.segments.abstain_pct, 25.0);
    }

    #[test]
    fn citizens_sum_unweighted_counts() {
        let m = run(
            json!({
                "data_eng_properties": {"source": "eas-atlas"},
                "outcome": {
                    "USER": {"1": 10, "0": 2},
                    "APP": {"1": 5},
                    "CHAIN": {"2": 1},
                },
            }),
            18,
        );
        assert_eq!((m.for_votes, m.against_votes, m.abstain_votes), (15.0, 2.0, 1.0));
        assert_eq!(m.for_raw, BigInt::from(15));
    }

    #[test]
    fn hybrid_values_are_weighted_percentages() {
        let m = run(
            json!({
                "data_eng_properties": {"source": "dao_node"},
                "hybrid": true,
                "total_voting_power_at_start": "100",
                "totals": {"no-param": {"1": "50"}},
                "govless_proposal": {"outcome": {"USER": {"1": 500}, "APP": {"1": 50}, "CHAIN": {"1": 15}}},
            }),
            0,
        );
        // delegates 50% * 0.5 + users 50% / 6 + apps 50% / 6 + chains 100% / 6
        let expected = 25.0 + 50.0 / 6.0 + 50.0 / 6.0 + 100.0 / 6.0;
        assert!((m.for_votes - expected).abs() < 1e-9);
        assert!(m.weighted && m.has_votes);
        assert!((m.segments.for_pct - expected).abs() < 1e-9);
        assert_eq!(m.against_votes, 0.0);
    }

    #[test]
    fn hybrid_without_total_voting_power_uses_unit_eligibility() {
        // votableSupply is not total voting power; delegates are scored against 1
        let m = run(
            json!({
                "data_eng_properties": {"source": "dao_node"},
                "hybrid": true,
                "votableSupply": "100",
                "totals": {"no-param": {"1": "50"}},
                "govless_proposal": {},
            }),
            0,
        );
        assert_eq!(m.for_votes, 2500.0);
        assert!(m.weighted);
    }

    #[test]
    fn unsupported_and_empty_are_zero() {
        let snap = run(json!({"data_eng_properties": {"source": "snapshot"}, "totals": {"no-param": {"1": "9"}}}), 0);
        assert_eq!(snap, VoteMetrics::default());

        let empty = run(json!({"data_eng_properties": {"source": "dao_node"}}), 18);
        assert_eq!(empty.total(), 0.0);
        assert!(!empty.has_votes);
        assert_eq!(empty.segments, Segments::default());
    }
}
