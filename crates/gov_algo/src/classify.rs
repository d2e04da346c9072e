//! Source classification.
//!
//! Contract:
//! - Pure field-presence checks; never mutates, never fails.
//! - Callers see vote totals only through `VotingData`, an exhaustive
//!   one-variant-per-shape view. Unknown sources map to `Unsupported` and
//!   downstream extractors treat that as zero-valued metrics.
//! - Mechanism tags follow the archive conventions: `HYBRID_*` when the hybrid
//!   flag is set, `OFFCHAIN_*` for EAS sources without an on-chain proposal id,
//!   `*_TIERED` when veto tiers are configured.

use gov_core::record::{AmountMap, RawProposalRecord, TallyMap, NO_PARAM, TOKEN_HOLDERS};
use gov_core::{Mechanism, MechanismClass, RawNumeric, Source};
use serde::Serialize;
use tracing::debug;

// ---------------- Source predicates ----------------

/// On-chain governor record.
pub fn is_dao_node(r: &RawProposalRecord) -> bool {
    r.source() == Some(Source::DaoNode)
}

/// Citizen attestation record.
pub fn is_eas_atlas(r: &RawProposalRecord) -> bool {
    r.source() == Some(Source::EasAtlas)
}

/// Token-holder attestation record.
pub fn is_eas_oodao(r: &RawProposalRecord) -> bool {
    r.source() == Some(Source::EasOodao)
}

pub fn is_snapshot(r: &RawProposalRecord) -> bool {
    r.source() == Some(Source::Snapshot)
}

/// Hybrid flag set **and** the off-chain half embedded.
pub fn is_hybrid(r: &RawProposalRecord) -> bool {
    r.is_hybrid()
}

/// The record that carries the voting configuration: the embedded off-chain
/// half for hybrids, the record itself otherwise.
pub fn voting_record(r: &RawProposalRecord) -> &RawProposalRecord {
    match r.govless() {
        Some(g) if r.is_hybrid() => g,
        _ => r,
    }
}

// ---------------- Mechanism ----------------

fn has_tiers(r: &RawProposalRecord) -> bool {
    r.tiers.as_ref().is_some_and(|t| !t.is_empty())
}

/// Only a numeric `0` or an empty string means "not linked"; text `"0"` is an id.
fn has_onchain_id(r: &RawProposalRecord) -> bool {
    match &r.onchain_proposalid {
        Some(RawNumeric::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(RawNumeric::Text(s)) => !s.is_empty(),
        None => false,
    }
}

fn class_name(r: &RawProposalRecord) -> String {
    r.proposal_type
        .as_ref()
        .and_then(|p| p.class_name())
        .map(|s| s.trim().to_ascii_uppercase())
        .unwrap_or_default()
}

/// Base class and whether veto tiers apply.
fn base_class(r: &RawProposalRecord) -> (MechanismClass, bool) {
    match r.source() {
        Some(Source::DaoNode) => {
            let module = r.voting_module_name.as_deref().map(str::trim).unwrap_or("");
            if module.eq_ignore_ascii_case("approval") {
                (MechanismClass::Approval, false)
            } else if module.eq_ignore_ascii_case("optimistic") {
                (MechanismClass::Optimistic, r.govless().is_some_and(has_tiers))
            } else {
                (MechanismClass::Standard, false)
            }
        }
        Some(Source::EasAtlas) => match class_name(r).as_str() {
            "APPROVAL" => (MechanismClass::Approval, false),
            "OPTIMISTIC" => (MechanismClass::Optimistic, has_tiers(r)),
            "OPTIMISTIC_TIERED" => (MechanismClass::Optimistic, true),
            _ => (MechanismClass::Standard, false),
        },
        Some(Source::EasOodao) => {
            let name = class_name(r);
            let class = MechanismClass::from_name(&name).unwrap_or(MechanismClass::Standard);
            (class, name == "OPTIMISTIC_TIERED")
        }
        Some(Source::Snapshot) | None => (MechanismClass::Standard, false),
    }
}

/// Mechanism tag for a record.
pub fn derive_mechanism(r: &RawProposalRecord) -> Mechanism {
    let source = r.source();
    if source == Some(Source::Snapshot) {
        return Mechanism::Snapshot;
    }
    let (class, tiered) = base_class(r);
    let hybrid = r.hybrid == Some(true);
    let offchain =
        matches!(source, Some(Source::EasAtlas | Source::EasOodao)) && !has_onchain_id(r);
    Mechanism::compose(class, tiered, hybrid, offchain)
}

pub fn is_approval_voting(r: &RawProposalRecord) -> bool {
    derive_mechanism(r).is_approval()
}

pub fn is_optimistic_voting(r: &RawProposalRecord) -> bool {
    derive_mechanism(r).is_optimistic()
}

pub fn is_optimistic_tiered(r: &RawProposalRecord) -> bool {
    derive_mechanism(r).is_tiered()
}

/// Everything the extractors and the status engine branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub source: Option<Source>,
    pub hybrid: bool,
    pub mechanism: Mechanism,
}

pub fn classify(r: &RawProposalRecord) -> Classification {
    Classification {
        source: r.source(),
        hybrid: r.is_hybrid(),
        mechanism: derive_mechanism(r),
    }
}

// ---------------- Vote shapes ----------------

/// Normalised handle to whichever vote-totals shape a record exposes.
#[derive(Debug, Clone, Copy)]
pub enum VotingData<'a> {
    /// `dao_node`: `totals["no-param"]` for standard/optimistic, `totals[option]` for approval.
    Onchain { totals: Option<&'a TallyMap> },
    /// `eas-oodao`: `outcome["token-holders"]`.
    TokenHolders {
        outcome: Option<&'a TallyMap>,
        totals: Option<&'a TallyMap>,
    },
    /// `eas-atlas`: `outcome[USER|APP|CHAIN]`, plain counts.
    Citizens { outcome: Option<&'a TallyMap> },
    /// On-chain delegate totals plus the embedded citizen outcome.
    Hybrid {
        totals: Option<&'a TallyMap>,
        citizens: Option<&'a TallyMap>,
    },
    Unsupported,
}

impl<'a> VotingData<'a> {
    /// Flat `{"0","1","2"}` map (against/for/abstain) of the on-chain side.
    pub fn flat(&self) -> Option<&'a AmountMap> {
        match *self {
            VotingData::Onchain { totals } | VotingData::Hybrid { totals, .. } => {
                totals?.get(NO_PARAM)
            }
            VotingData::TokenHolders { outcome, totals } => outcome
                .and_then(|o| o.get(TOKEN_HOLDERS).or_else(|| o.get(NO_PARAM)))
                .or_else(|| totals.and_then(|t| t.get(NO_PARAM))),
            VotingData::Citizens { .. } | VotingData::Unsupported => None,
        }
    }

    /// Citizen outcome keyed by group.
    pub fn citizens(&self) -> Option<&'a TallyMap> {
        match *self {
            VotingData::Citizens { outcome } => outcome,
            VotingData::Hybrid { citizens, .. } => citizens,
            _ => None,
        }
    }

    /// Per-option on-chain totals (approval layout).
    pub fn option_totals(&self) -> Option<&'a TallyMap> {
        match *self {
            VotingData::Onchain { totals } | VotingData::Hybrid { totals, .. } => totals,
            _ => None,
        }
    }

    fn is_empty(&self) -> bool {
        match *self {
            VotingData::Onchain { totals } => totals.is_none(),
            VotingData::TokenHolders { outcome, totals } => outcome.is_none() && totals.is_none(),
            VotingData::Citizens { outcome } => outcome.is_none(),
            VotingData::Hybrid { totals, citizens } => totals.is_none() && citizens.is_none(),
            VotingData::Unsupported => true,
        }
    }
}

/// Select the vote shape for `r`.
pub fn voting_data(r: &RawProposalRecord) -> VotingData<'_> {
    let data = match r.source() {
        Some(Source::EasOodao) => VotingData::TokenHolders {
            outcome: r.outcome.as_ref(),
            totals: r.totals.as_ref(),
        },
        Some(Source::DaoNode | Source::EasAtlas) if r.is_hybrid() => VotingData::Hybrid {
            totals: r.totals.as_ref(),
            citizens: r.govless().and_then(|g| g.outcome.as_ref()),
        },
        Some(Source::EasAtlas) => VotingData::Citizens {
            outcome: r.outcome.as_ref(),
        },
        Some(Source::DaoNode) => VotingData::Onchain {
            totals: r.totals.as_ref(),
        },
        Some(Source::Snapshot) | None => {
            debug!(source = ?r.source_tag(), id = ?r.id, "unsupported source; metrics degrade to zero");
            return VotingData::Unsupported;
        }
    };
    if data.is_empty() {
        debug!(source = ?r.source_tag(), id = ?r.id, "no vote totals on record");
    }
    data
}
