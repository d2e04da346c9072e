//! Outcome gates for closed proposals.
//!
//! Standard: quorum → approval threshold → for/against comparison (tie → FAILED).
//! Approval: an approval-specific quorum, then the THRESHOLD / TOP_CHOICES criteria.
//! Three approval branches keep their own units:
//! - off-chain only: unique voters vs quorum; THRESHOLD compares approvals to the
//!   criteria value as plain counts
//! - hybrid: weighted participation vs a fixed percentage; THRESHOLD compares each
//!   choice's weighted percentage to the criteria value read as basis points
//! - on-chain / default: for + abstain vs an absolute quorum (skipped at 0);
//!   THRESHOLD compares raw base-unit approvals to the raw criteria value

use std::cmp::Ordering;

use gov_algo::classify::{voting_data, voting_record, VotingData};
use gov_algo::metrics::weighted::{participation, weighted_percent, GroupCounts, ABSTAIN, FOR};
use gov_algo::thresholds::fixed_proposal_type;
use gov_algo::{ApprovalMetrics, Criteria, Thresholds, VoteMetrics};
use gov_core::record::{AmountMap, RawProposalRecord};
use gov_core::{to_big_int_opt, to_decimal, CitizenGroup, EngineConfig, Mechanism, RawNumeric, Status};
use num_bigint::BigInt;
use num_traits::Signed;
use serde::Serialize;

// ---------------- Standard ----------------

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StandardGate {
    /// `for / (for + against) * 100`.
    pub vote_percent: f64,
    /// For-only when the record counts quorum that way, else for + abstain.
    pub quorum_votes: f64,
    pub quorum: f64,
    pub quorum_met: bool,
    pub threshold_met: bool,
}

/// `calculationOptions == 1`: only for-votes count toward quorum.
fn for_only_quorum(r: &RawProposalRecord) -> bool {
    let raw = voting_record(r)
        .calculation_options
        .as_ref()
        .or(r.calculation_options.as_ref());
    to_big_int_opt(raw).is_some_and(|n| n == BigInt::from(1))
}

pub fn standard_gate(
    r: &RawProposalRecord,
    mechanism: Mechanism,
    m: &VoteMetrics,
    t: &Thresholds,
) -> StandardGate {
    let decided = m.for_votes + m.against_votes;
    let vote_percent = if decided > 0.0 {
        m.for_votes / decided * 100.0
    } else {
        0.0
    };
    let quorum_votes = if for_only_quorum(r) {
        m.for_votes
    } else {
        m.for_votes + m.abstain_votes
    };
    let quorum = t.quorum_absolute();
    StandardGate {
        vote_percent,
        quorum_votes,
        quorum,
        // hybrid metrics already fold participation into the weighted values
        quorum_met: !t.supply_known() || mechanism.is_hybrid() || quorum_votes >= quorum,
        threshold_met: t.approval_threshold_pct == 0.0 || vote_percent >= t.approval_threshold_pct,
    }
}

/// Compared in base units unless the values are weighted percentages.
fn compare_for_against(m: &VoteMetrics) -> Ordering {
    if m.weighted {
        m.for_votes.total_cmp(&m.against_votes)
    } else {
        m.for_raw.cmp(&m.against_raw)
    }
}

pub fn standard_status(gate: &StandardGate, m: &VoteMetrics) -> Status {
    if !gate.quorum_met || !gate.threshold_met {
        return Status::Defeated;
    }
    match compare_for_against(m) {
        Ordering::Greater => Status::Succeeded,
        Ordering::Less => Status::Defeated,
        Ordering::Equal => Status::Failed,
    }
}

// ---------------- Approval ----------------

/// Which approval rule set applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalBranch {
    OffchainOnly,
    Hybrid,
    Onchain,
}

/// Branch by mechanism tag: `HYBRID_*`, `OFFCHAIN_*`, everything else on-chain.
pub fn approval_branch(mechanism: Mechanism) -> ApprovalBranch {
    if mechanism.is_hybrid() {
        ApprovalBranch::Hybrid
    } else if mechanism.is_offchain() {
        ApprovalBranch::OffchainOnly
    } else {
        ApprovalBranch::Onchain
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApprovalGate {
    pub branch: ApprovalBranch,
    /// Voters, weighted percent or human-unit votes, by branch.
    pub participation: f64,
    pub quorum: f64,
    pub quorum_met: bool,
    pub criteria: Criteria,
    /// Winning choice indices, best first.
    pub winners: Vec<usize>,
}

impl ApprovalGate {
    pub fn status(&self) -> Status {
        if !self.quorum_met {
            return Status::Defeated;
        }
        match self.criteria {
            Criteria::TopChoices => Status::Succeeded,
            Criteria::Threshold if self.winners.is_empty() => Status::Defeated,
            Criteria::Threshold => Status::Succeeded,
        }
    }
}

fn positive(raw: Option<&RawNumeric>) -> Option<&RawNumeric> {
    raw.filter(|n| to_big_int_opt(Some(*n)).is_some_and(|v| v.is_positive()))
}

/// Approval quorum in human units: explicit `quorum` > 0, then `quorumVotes` > 0,
/// then the fixed type's basis points of total voting power (hybrid / off-chain
/// tags only), then the configured fallback share of total voting power.
pub fn approval_quorum(
    r: &RawProposalRecord,
    mechanism: Mechanism,
    t: &Thresholds,
    decimals: u32,
    cfg: &EngineConfig,
) -> f64 {
    let explicit = [Some(r), Some(voting_record(r))]
        .into_iter()
        .flatten()
        .find_map(|rec| positive(rec.quorum.as_ref()).or(positive(rec.quorum_votes.as_ref())));
    if let Some(q) = explicit {
        return to_decimal(Some(q), decimals);
    }
    if mechanism.is_hybrid() || mechanism.is_offchain() {
        let bps = to_decimal(fixed_proposal_type(r).and_then(|f| f.quorum.as_ref()), 0);
        let q = t.votable_supply * bps / 10_000.0;
        if q > 0.0 {
            return q;
        }
    }
    t.votable_supply * cfg.approval_fallback_quorum_pct / 100.0
}

/// Flat for + abstain; `None` when the map has no flat cells (per-option layout).
fn for_plus_abstain(map: Option<&AmountMap>, decimals: u32) -> Option<f64> {
    let map = map?;
    let cells: Vec<_> = [FOR, ABSTAIN]
        .iter()
        .filter_map(|code| map.get(*code)?.flat_amount())
        .collect();
    if cells.is_empty() {
        return None;
    }
    Some(cells.into_iter().map(|n| to_decimal(Some(n), decimals)).sum())
}

fn max_approvals(m: &ApprovalMetrics) -> f64 {
    m.choices.iter().map(|c| c.approvals).fold(0.0, f64::max)
}

/// Weighted turnout across delegates and citizen groups. Each group counts its
/// flat against/for/abstain cells, or its busiest option for per-option layouts.
fn weighted_participation(data: &VotingData<'_>, t: &Thresholds, decimals: u32, cfg: &EngineConfig) -> f64 {
    let mut delegates = participation(data.flat(), decimals);
    if delegates == 0.0 {
        delegates = data
            .option_totals()
            .map(|totals| {
                totals
                    .values()
                    .map(|m| participation(Some(m), decimals))
                    .fold(0.0, f64::max)
            })
            .unwrap_or(0.0);
    }
    let citizens = data.citizens();
    let group = |g: CitizenGroup| participation(citizens.and_then(|o| o.get(g.as_str())), 0);
    let counts = GroupCounts {
        app: group(CitizenGroup::App),
        user: group(CitizenGroup::User),
        chain: group(CitizenGroup::Chain),
    };
    weighted_percent(delegates, t.votable_supply, &counts, cfg)
}

fn take_top(m: &ApprovalMetrics) -> Vec<usize> {
    let n = match m.max_approvals {
        0 => m.choices.len(),
        n => usize::try_from(n).unwrap_or(usize::MAX),
    };
    m.choices.iter().take(n).map(|c| c.index).collect()
}

pub fn approval_gate(
    r: &RawProposalRecord,
    mechanism: Mechanism,
    m: &ApprovalMetrics,
    t: &Thresholds,
    decimals: u32,
    cfg: &EngineConfig,
) -> ApprovalGate {
    let branch = approval_branch(mechanism);
    let data = voting_data(r);

    let (participation, quorum, quorum_met) = match branch {
        ApprovalBranch::OffchainOnly => {
            let q = approval_quorum(r, mechanism, t, 0, cfg);
            let voters = m.total_voters as f64;
            (voters, q, voters >= q)
        }
        ApprovalBranch::Hybrid => {
            let p = weighted_participation(&data, t, decimals, cfg);
            let q = cfg.hybrid_approval_quorum_pct;
            (p, q, p >= q)
        }
        ApprovalBranch::Onchain => {
            let votes = for_plus_abstain(data.flat(), decimals).unwrap_or_else(|| max_approvals(m));
            let q = approval_quorum(r, mechanism, t, decimals, cfg);
            (votes, q, q <= 0.0 || votes >= q)
        }
    };

    let winners = match m.criteria {
        Criteria::TopChoices => take_top(m),
        Criteria::Threshold => {
            let value = m.criteria_value_f64();
            m.choices
                .iter()
                .filter(|c| match branch {
                    ApprovalBranch::OffchainOnly => c.approvals > value,
                    ApprovalBranch::Hybrid => c.weighted_pct.unwrap_or(0.0) > value / 100.0,
                    ApprovalBranch::Onchain => c.approvals_raw > m.criteria_value,
                })
                .map(|c| c.index)
                .collect()
        }
    };

    ApprovalGate {
        branch,
        participation,
        quorum,
        quorum_met,
        criteria: m.criteria,
        winners,
    }
}
