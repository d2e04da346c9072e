//! Optimistic (veto) metrics.
//!
//! Contract:
//! - Simple majority (plain `dao_node` OPTIMISTIC only): veto iff
//!   `against > votable_supply / 2`, compared exactly in base units. An unknown
//!   or zero supply never vetoes.
//! - Off-chain tiered: veto iff the average of the three citizen-group veto
//!   percentages reaches `tiers[0]`.
//! - Every other optimistic flavour (hybrid, off-chain simple, `eas-oodao`): veto
//!   iff ≥2 of the four groups reach `tiers[2]`, or ≥3 reach `tiers[1]`, or all
//!   4 reach `tiers[0]`. Delegates count only for hybrids with a known supply.
//! - Raising any group's against-votes never turns a veto back into a pass.

use gov_core::numeric::{clamp_percentage, percent_of, scale_big_int};
use gov_core::record::RawProposalRecord;
use gov_core::{to_decimal, CitizenGroup, EngineConfig, Mechanism, RawNumeric, Source};
use num_bigint::BigInt;
use num_traits::Signed;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::classify::{derive_mechanism, voting_data, voting_record, VotingData};
use crate::metrics::weighted::{citizen_counts, citizen_percents, raw, scaled, GroupCounts, AGAINST};
use crate::thresholds::{fixed_proposal_type, Thresholds};

/// Default defeat threshold in basis points when the payload carries none.
const DEFAULT_DEFEAT_THRESHOLD_BPS: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VetoRule {
    SimpleMajority,
    OffchainAverage,
    Tiered,
}

/// Veto percentage per group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GroupVeto {
    pub delegates: f64,
    pub app: f64,
    pub user: f64,
    pub chain: f64,
}

impl GroupVeto {
    fn all(&self) -> [f64; 4] {
        [self.delegates, self.app, self.user, self.chain]
    }

    pub fn citizen_average(&self) -> f64 {
        (self.app + self.user + self.chain) / 3.0
    }

    /// Groups at or above `threshold`.
    pub fn count_reaching(&self, threshold: f64) -> usize {
        self.all().iter().filter(|v| **v >= threshold).count()
    }

    pub fn max(&self) -> f64 {
        self.all().into_iter().fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimisticMetrics {
    pub veto_triggered: bool,
    pub rule: VetoRule,
    /// Simple majority: scaled token amount. Tiered: citizen count across groups.
    pub against_votes: f64,
    /// Simple majority: share of votable supply. Off-chain average: the average.
    /// Tiered: the highest group percentage.
    pub against_pct: f64,
    pub group_veto: Option<GroupVeto>,
    /// Ascending, in percent.
    pub tiers: [f64; 3],
    /// Display only; the veto decision never reads it.
    pub defeat_threshold_pct: f64,
}

// ---------------- Rule selection ----------------

pub fn veto_rule(r: &RawProposalRecord, mechanism: Mechanism) -> VetoRule {
    match r.source() {
        Some(Source::DaoNode) if mechanism == Mechanism::Optimistic => VetoRule::SimpleMajority,
        _ if mechanism == Mechanism::OffchainOptimisticTiered => VetoRule::OffchainAverage,
        _ => VetoRule::Tiered,
    }
}

// ---------------- Tiers ----------------

/// Record tiers, normalised: basis points (> 100) become percent, short lists
/// repeat their last entry, the result is sorted ascending. `None` when the
/// record carries no usable tier.
pub fn normalize_tiers(raw: &[RawNumeric]) -> Option<[f64; 3]> {
    let mut vals: Vec<f64> = raw
        .iter()
        .map(|t| to_decimal(Some(t), 0))
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| if v > 100.0 { v / 100.0 } else { v })
        .collect();
    let last = *vals.last()?;
    vals.resize(3.max(vals.len()), last);
    vals.truncate(3);
    vals.sort_by(f64::total_cmp);
    Some([vals[0], vals[1], vals[2]])
}

fn record_tiers(r: &RawProposalRecord) -> Option<&[RawNumeric]> {
    [Some(voting_record(r)), Some(r), r.govless()]
        .into_iter()
        .flatten()
        .find_map(|rec| rec.tiers.as_deref().filter(|t| !t.is_empty()))
}

pub fn resolve_tiers(r: &RawProposalRecord, mechanism: Mechanism, cfg: &EngineConfig) -> [f64; 3] {
    record_tiers(r)
        .and_then(normalize_tiers)
        .unwrap_or_else(|| cfg.veto_tiers.for_mechanism(mechanism))
}

// ---------------- Defeat threshold ----------------

fn bps_value(v: &Value) -> f64 {
    serde_json::from_value::<RawNumeric>(v.clone())
        .map(|n| to_decimal(Some(&n), 0))
        .unwrap_or(0.0)
}

pub fn defeat_threshold_pct(r: &RawProposalRecord) -> f64 {
    if r.source() == Some(Source::EasOodao) {
        let bps = fixed_proposal_type(r)
            .and_then(|f| f.approval_threshold.as_ref())
            .or(r.approval_threshold.as_ref());
        return to_decimal(bps, 0) / 100.0;
    }
    let decoded = voting_record(r)
        .decoded_proposal_data
        .as_ref()
        .or(r.decoded_proposal_data.as_ref());
    let bps = decoded
        .and_then(|d| d.get(0)?.get(0))
        .map(bps_value)
        .filter(|v| *v != 0.0)
        .unwrap_or(DEFAULT_DEFEAT_THRESHOLD_BPS);
    bps / 100.0
}

// ---------------- Extractors ----------------

/// Dispatch on the record's veto rule.
pub fn extract_optimistic_metrics(
    r: &RawProposalRecord,
    thresholds: &Thresholds,
    decimals: u32,
    cfg: &EngineConfig,
) -> OptimisticMetrics {
    let mechanism = derive_mechanism(r);
    match veto_rule(r, mechanism) {
        VetoRule::SimpleMajority => simple_majority(r, mechanism, thresholds, decimals, cfg),
        _ => extract_optimistic_tiered_metrics(r, thresholds, decimals, cfg),
    }
}

fn simple_majority(
    r: &RawProposalRecord,
    mechanism: Mechanism,
    thresholds: &Thresholds,
    decimals: u32,
    cfg: &EngineConfig,
) -> OptimisticMetrics {
    let flat = voting_data(r).flat();
    let against_raw: BigInt = raw(flat, AGAINST);
    let supply = &thresholds.veto_supply_raw;
    let veto = supply.is_positive() && (&against_raw * 2u32) > *supply;
    let against_votes = scaled(flat, AGAINST, decimals);
    trace!(against = %against_raw, supply = %supply, veto, "simple-majority veto");
    OptimisticMetrics {
        veto_triggered: veto,
        rule: VetoRule::SimpleMajority,
        against_votes,
        against_pct: clamp_percentage(percent_of(against_votes, scale_big_int(supply, decimals))),
        group_veto: None,
        tiers: resolve_tiers(r, mechanism, cfg),
        defeat_threshold_pct: defeat_threshold_pct(r),
    }
}

/// Tiered / off-chain-average veto over the citizen groups (plus delegates for hybrids).
pub fn extract_optimistic_tiered_metrics(
    r: &RawProposalRecord,
    thresholds: &Thresholds,
    decimals: u32,
    cfg: &EngineConfig,
) -> OptimisticMetrics {
    let mechanism = derive_mechanism(r);
    let tiers = resolve_tiers(r, mechanism, cfg);
    let data = voting_data(r);

    let against: GroupCounts = citizen_counts(data.citizens(), AGAINST);
    let pcts = citizen_percents(&against, cfg);
    let delegates = match data {
        VotingData::Hybrid { .. } if thresholds.supply_known() => {
            percent_of(scaled(data.flat(), AGAINST, decimals), thresholds.votable_supply)
        }
        _ => 0.0,
    };
    let groups = GroupVeto {
        delegates,
        app: pcts.get(CitizenGroup::App),
        user: pcts.get(CitizenGroup::User),
        chain: pcts.get(CitizenGroup::Chain),
    };

    let (rule, veto, against_pct) = if mechanism == Mechanism::OffchainOptimisticTiered {
        let avg = groups.citizen_average();
        (VetoRule::OffchainAverage, avg >= tiers[0], avg)
    } else {
        let veto = groups.count_reaching(tiers[2]) >= 2
            || groups.count_reaching(tiers[1]) >= 3
            || groups.count_reaching(tiers[0]) >= 4;
        (VetoRule::Tiered, veto, groups.max())
    };
    trace!(?rule, ?groups, ?tiers, veto, "tiered veto");

    OptimisticMetrics {
        veto_triggered: veto,
        rule,
        against_votes: against.sum(),
        against_pct: clamp_percentage(against_pct),
        group_veto: Some(groups),
        tiers,
        defeat_threshold_pct: defeat_threshold_pct(r),
    }
}
