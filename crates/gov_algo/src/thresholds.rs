//! Threshold resolution: effective quorum, approval threshold and votable supply.
//!
//! Contract:
//! - A pending-approval descriptor (`proposal_type_approval == "PENDING"` with
//!   `default_proposal_type_ranges`) always wins; its minimums are divided by 100.
//! - Otherwise a fixed proposal-type object supplies basis points (÷100 → percent);
//!   its quorum is a share of votable supply.
//! - Otherwise the record's own `quorum` (native supply, base units) and
//!   `approval_threshold` (basis points) are used.
//! - An explicitly present quorum of `0` is honoured.
//! - Quorum and votable supply are reported in the same decimal scale as vote amounts.
//! - Votable supply is `total_voting_power_at_start` only. The simple-majority
//!   veto reads its own supply (`votableSupply`, `votable_supply`, then total
//!   voting power).

use gov_core::record::{FixedProposalType, RangeProposalType, RawProposalRecord};
use gov_core::{to_big_int, to_decimal, RawNumeric};
use num_bigint::BigInt;
use serde::Serialize;

/// Resolved quorum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Quorum {
    /// Votes in human units.
    Absolute(f64),
    /// Percent of votable supply.
    PercentOfSupply(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thresholds {
    pub quorum: Quorum,
    pub approval_threshold_pct: f64,
    /// Human units; `0` when the record carries no supply figure.
    pub votable_supply: f64,
    #[serde(with = "gov_core::numeric::big_int_string")]
    pub votable_supply_raw: BigInt,
    /// Supply the simple-majority veto compares against, in base units.
    #[serde(with = "gov_core::numeric::big_int_string")]
    pub veto_supply_raw: BigInt,
    /// Resolved from provisional pending-approval ranges.
    pub pending: bool,
}

impl Thresholds {
    /// Quorum in human units.
    pub fn quorum_absolute(&self) -> f64 {
        match self.quorum {
            Quorum::Absolute(v) => v,
            Quorum::PercentOfSupply(pct) => self.votable_supply * pct / 100.0,
        }
    }

    /// Whether a positive total voting power is known for the proposal.
    pub fn supply_known(&self) -> bool {
        self.votable_supply > 0.0
    }

    /// Eligible delegate power for weighted percentages; `1` without a known supply.
    pub fn eligible_delegates(&self) -> f64 {
        if self.supply_known() {
            self.votable_supply
        } else {
            1.0
        }
    }
}

fn pct_of_bps(raw: Option<&RawNumeric>) -> f64 {
    to_decimal(raw, 0) / 100.0
}

fn veto_supply_field(r: &RawProposalRecord) -> Option<&RawNumeric> {
    r.votable_supply_camel
        .as_ref()
        .or(r.votable_supply.as_ref())
        .or(r.total_voting_power_at_start.as_ref())
}

fn pending_ranges(r: &RawProposalRecord) -> Option<&RangeProposalType> {
    let pending = r
        .proposal_type_approval
        .as_deref()
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("PENDING"));
    if pending {
        r.default_proposal_type_ranges.as_ref()
    } else {
        None
    }
}

/// Fixed proposal-type object, from the record or its embedded off-chain half.
pub fn fixed_proposal_type(r: &RawProposalRecord) -> Option<&FixedProposalType> {
    r.proposal_type
        .as_ref()
        .and_then(|p| p.fixed())
        .or_else(|| r.govless()?.proposal_type.as_ref()?.fixed())
}

pub fn resolve_thresholds(r: &RawProposalRecord, decimals: u32) -> Thresholds {
    let supply = r.total_voting_power_at_start.as_ref();
    let votable_supply = to_decimal(supply, decimals);
    let votable_supply_raw = to_big_int(supply);
    let veto_supply_raw = to_big_int(veto_supply_field(r));

    let ranges = pending_ranges(r).or_else(|| r.govless().and_then(pending_ranges));
    if let Some(ranges) = ranges {
        return Thresholds {
            quorum: Quorum::PercentOfSupply(pct_of_bps(ranges.min_quorum_pct.as_ref())),
            approval_threshold_pct: pct_of_bps(ranges.min_approval_threshold_pct.as_ref()),
            votable_supply,
            votable_supply_raw,
            veto_supply_raw: veto_supply_raw.clone(),
            pending: true,
        };
    }

    if let Some(fixed) = fixed_proposal_type(r) {
        return Thresholds {
            quorum: Quorum::PercentOfSupply(pct_of_bps(fixed.quorum.as_ref())),
            approval_threshold_pct: pct_of_bps(fixed.approval_threshold.as_ref()),
            votable_supply,
            votable_supply_raw,
            veto_supply_raw: veto_supply_raw.clone(),
            pending: false,
        };
    }

    let quorum_raw = r.quorum.as_ref().or(r.quorum_votes.as_ref());
    Thresholds {
        quorum: Quorum::Absolute(to_decimal(quorum_raw, decimals)),
        approval_threshold_pct: pct_of_bps(r.approval_threshold.as_ref()),
        votable_supply,
        votable_supply_raw,
        veto_supply_raw,
        pending: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: serde_json::Value) -> RawProposalRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn onchain_quorum_is_native_supply() {
        let r = rec(json!({
            "data_eng_properties": {"source": "dao_node"},
            "quorum": "2000000000000000000000",
            "approval_threshold": 5000,
            "total_voting_power_at_start": "10000000000000000000000",
        }));
        let t = resolve_thresholds(&r, 18);
        assert_eq!(t.quorum, Quorum::Absolute(2000.0));
        assert_eq!(t.quorum_absolute(), 2000.0);
        assert_eq!(t.approval_threshold_pct, 50.0);
        assert_eq!(t.votable_supply, 10000.0);
        assert!(t.supply_known());
        assert!(!t.pending);
    }

    #[test]
    fn pending_ranges_take_precedence() {
        let r = rec(json!({
            "proposal_type": {"class": "STANDARD", "quorum": 3000, "approval_threshold": 5000},
            "proposal_type_approval": "PENDING",
            "default_proposal_type_ranges": {"min_quorum_pct": 1000, "min_approval_threshold_pct": 2500},
            "total_voting_power_at_start": "1000",
        }));
        let t = resolve_thresholds(&r, 0);
        assert!(t.pending);
        assert_eq!(t.quorum, Quorum::PercentOfSupply(10.0));
        assert_eq!(t.approval_threshold_pct, 25.0);
        assert_eq!(t.quorum_absolute(), 100.0);
    }

    #[test]
    fn approved_type_uses_fixed_bps() {
        let r = rec(json!({
            "proposal_type": {"class": "STANDARD", "quorum": 3000, "approval_threshold": 5100},
            "proposal_type_approval": "APPROVED",
            "default_proposal_type_ranges": {"min_quorum_pct": 1000},
            "total_voting_power_at_start": "200",
        }));
        let t = resolve_thresholds(&r, 0);
        assert_eq!(t.quorum, Quorum::PercentOfSupply(30.0));
        assert_eq!(t.approval_threshold_pct, 51.0);
        assert_eq!(t.quorum_absolute(), 60.0);
    }

    #[test]
    fn explicit_zero_quorum_is_honoured() {
        let r = rec(json!({"quorum": "0", "quorumVotes": "500"}));
        assert_eq!(resolve_thresholds(&r, 0).quorum, Quorum::Absolute(0.0));

        let fallback = rec(json!({"quorumVotes": "500"}));
        assert_eq!(resolve_thresholds(&fallback, 0).quorum, Quorum::Absolute(500.0));
    }

    #[test]
    fn votable_supply_is_total_voting_power_only() {
        let r = rec(json!({"votableSupply": "40", "votable_supply": "99"}));
        let t = resolve_thresholds(&r, 0);
        assert_eq!(t.votable_supply, 0.0);
        assert!(!t.supply_known());
        assert_eq!(t.eligible_delegates(), 1.0);
        assert_eq!(t.veto_supply_raw, BigInt::from(40));

        let both = rec(json!({"total_voting_power_at_start": "70", "votable_supply": "99"}));
        let t = resolve_thresholds(&both, 0);
        assert_eq!(t.votable_supply_raw, BigInt::from(70));
        assert_eq!(t.eligible_delegates(), 70.0);
        assert_eq!(t.veto_supply_raw, BigInt::from(99));

        let tvp_only = rec(json!({"total_voting_power_at_start": "70"}));
        assert_eq!(resolve_thresholds(&tvp_only, 0).veto_supply_raw, BigInt::from(70));

        let none = resolve_thresholds(&rec(json!({})), 18);
        assert_eq!(none.votable_supply, 0.0);
        assert!(!none.supply_known());
        assert_eq!(none.quorum_absolute(), 0.0);
        assert_eq!(none.approval_threshold_pct, 0.0);
    }
}
