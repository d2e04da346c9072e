//! record.rs — the raw archive record, as produced by upstream archival jobs.
//!
//! Contract:
//! - Read-only to the engine; nothing here mutates a record after parsing.
//! - Every field is optional and parsed **leniently**: a value whose JSON shape
//!   does not match the expected type becomes `None` (or an empty default for
//!   lifecycle events) instead of failing the whole record.
//! - Three vote shapes coexist: flat `totals` (`{"no-param": {"0","1","2"}}`),
//!   citizen `outcome` (`{"USER": {...}, "APP": {...}, "CHAIN": {...}}`) and
//!   token-holder `outcome` (`{"token-holders": {...}}`). Hybrid records carry
//!   the citizen half under `govless_proposal`.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{Source, Timestamp};
use crate::numeric::{to_timestamp, RawNumeric};

// ---------------- Lenient field parsing ----------------

fn lenient<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Value::deserialize(d)?;
    Ok(serde_json::from_value(v).ok())
}

/// Presence is what matters for events: any non-null value counts.
fn lenient_event<'de, D>(d: D) -> Result<Option<LifecycleEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    if v.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(v).unwrap_or_default()))
}

// ---------------- Vote shapes ----------------

/// One cell of a vote-totals map: an amount, or a per-support-code map
/// (approval layouts nest `{"1": amount}` under each option index).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TallyCell {
    Amount(RawNumeric),
    Nested(BTreeMap<String, RawNumeric>),
    Unknown(Value),
}

impl TallyCell {
    /// Amount carried by the cell; nested cells yield their `"1"` entry.
    pub fn amount(&self) -> Option<&RawNumeric> {
        match self {
            TallyCell::Amount(n) => Some(n),
            TallyCell::Nested(m) => m.get("1"),
            TallyCell::Unknown(_) => None,
        }
    }

    /// Plain amount only; nested cells are `None`.
    pub fn flat_amount(&self) -> Option<&RawNumeric> {
        match self {
            TallyCell::Amount(n) => Some(n),
            _ => None,
        }
    }

    pub fn nested(&self, code: &str) -> Option<&RawNumeric> {
        match self {
            TallyCell::Nested(m) => m.get(code),
            _ => None,
        }
    }
}

/// `support code | option index -> cell`.
pub type AmountMap = BTreeMap<String, TallyCell>;

/// `group key -> AmountMap`. Group keys: `"no-param"`, option indices,
/// `"USER"`/`"APP"`/`"CHAIN"`, `"token-holders"`.
pub type TallyMap = BTreeMap<String, AmountMap>;

pub const NO_PARAM: &str = "no-param";
pub const TOKEN_HOLDERS: &str = "token-holders";

// ---------------- Nested descriptors ----------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LifecycleEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub blocktime: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub eta: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub attestation_time: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub transaction_hash: Option<String>,
}

impl LifecycleEvent {
    /// When the event happened: `timestamp`, else `blocktime`, else attestation time.
    pub fn time(&self) -> Option<Timestamp> {
        to_timestamp(self.timestamp.as_ref())
            .or_else(|| to_timestamp(self.blocktime.as_ref()))
            .or_else(|| to_timestamp(self.attestation_time.as_ref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataEngProperties {
    #[serde(default, deserialize_with = "lenient")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub liveness: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub hash: Option<String>,
}

/// Fixed proposal type object (EAS sources). `quorum` and `approval_threshold`
/// are basis points.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixedProposalType {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub class: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub quorum: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub approval_threshold: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub eas_uid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
}

/// `proposal_type` comes as a numeric id (`dao_node`), a class name
/// (`eas-atlas`) or a full object (`eas-oodao`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProposalTypeField {
    Fixed(FixedProposalType),
    Id(u64),
    Name(String),
}

impl ProposalTypeField {
    pub fn fixed(&self) -> Option<&FixedProposalType> {
        match self {
            ProposalTypeField::Fixed(f) => Some(f),
            _ => None,
        }
    }

    /// Class name: the name itself, or the object's `class`.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            ProposalTypeField::Fixed(f) => f.class.as_deref(),
            ProposalTypeField::Name(n) => Some(n.as_str()),
            ProposalTypeField::Id(_) => None,
        }
    }
}

/// Provisional ranges attached while a proposal type awaits approval.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeProposalType {
    #[serde(default, deserialize_with = "lenient")]
    pub min_quorum_pct: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub max_quorum_pct: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub min_approval_threshold_pct: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub max_approval_threshold_pct: Option<RawNumeric>,
}

/// Approval settings nested under `kwargs` by EAS sources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Kwargs {
    #[serde(default, deserialize_with = "lenient")]
    pub choices: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub max_approvals: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub criteria: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub criteria_value: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub budget_token: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub budget_amount: Option<RawNumeric>,
}

// ---------------- The record ----------------

/// A proposal as archived by one of the upstream backends.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProposalRecord {
    // identity
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub proposer: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub data_eng_properties: Option<DataEngProperties>,

    // lifecycle
    #[serde(default, deserialize_with = "lenient_event")]
    pub cancel_event: Option<LifecycleEvent>,
    #[serde(default, deserialize_with = "lenient_event")]
    pub execute_event: Option<LifecycleEvent>,
    #[serde(default, deserialize_with = "lenient_event")]
    pub queue_event: Option<LifecycleEvent>,
    #[serde(default, deserialize_with = "lenient_event")]
    pub delete_event: Option<LifecycleEvent>,
    #[serde(default, deserialize_with = "lenient")]
    pub lifecycle_stage: Option<String>,

    // time window
    #[serde(default, deserialize_with = "lenient")]
    pub start_blocktime: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub end_blocktime: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub start_block: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub end_block: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_time: Option<RawNumeric>,

    // votes
    #[serde(default, deserialize_with = "lenient")]
    pub totals: Option<TallyMap>,
    #[serde(default, deserialize_with = "lenient")]
    pub outcome: Option<TallyMap>,
    #[serde(default, deserialize_with = "lenient")]
    pub num_of_votes: Option<RawNumeric>,

    // mechanism
    #[serde(default, deserialize_with = "lenient")]
    pub proposal_type: Option<ProposalTypeField>,
    #[serde(default, deserialize_with = "lenient")]
    pub proposal_type_id: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub proposal_type_approval: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub default_proposal_type_ranges: Option<RangeProposalType>,
    #[serde(default, deserialize_with = "lenient")]
    pub voting_module: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub voting_module_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub hybrid: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub govless_proposal: Option<Box<RawProposalRecord>>,
    #[serde(default, deserialize_with = "lenient")]
    pub onchain_proposalid: Option<RawNumeric>,

    // approval
    #[serde(default, deserialize_with = "lenient")]
    pub choices: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub max_approvals: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub criteria: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub criteria_value: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub kwargs: Option<Kwargs>,
    #[serde(default, deserialize_with = "lenient")]
    pub decoded_proposal_data: Option<Value>,

    // optimistic
    #[serde(default, deserialize_with = "lenient")]
    pub tiers: Option<Vec<RawNumeric>>,

    // thresholds & supply
    #[serde(default, deserialize_with = "lenient")]
    pub quorum: Option<RawNumeric>,
    #[serde(default, rename = "quorumVotes", deserialize_with = "lenient")]
    pub quorum_votes: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub approval_threshold: Option<RawNumeric>,
    #[serde(default, rename = "votableSupply", deserialize_with = "lenient")]
    pub votable_supply_camel: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub votable_supply: Option<RawNumeric>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_voting_power_at_start: Option<RawNumeric>,
    #[serde(default, rename = "calculationOptions", deserialize_with = "lenient")]
    pub calculation_options: Option<RawNumeric>,

    // execution payload
    #[serde(default, deserialize_with = "lenient")]
    pub calldatas: Option<Vec<Value>>,
}

impl RawProposalRecord {
    /// Upstream source tag, verbatim.
    pub fn source_tag(&self) -> Option<&str> {
        self.data_eng_properties.as_ref()?.source.as_deref()
    }

    pub fn source(&self) -> Option<Source> {
        Source::from_tag(self.source_tag())
    }

    /// `hybrid: true` **and** an embedded off-chain half.
    pub fn is_hybrid(&self) -> bool {
        self.hybrid == Some(true) && self.govless_proposal.is_some()
    }

    pub fn govless(&self) -> Option<&RawProposalRecord> {
        self.govless_proposal.as_deref()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }

    /// Voting opens; the embedded off-chain half supplies a missing value.
    pub fn start_time(&self) -> Option<Timestamp> {
        to_timestamp(self.start_blocktime.as_ref())
            .or_else(|| self.govless().and_then(|g| to_timestamp(g.start_blocktime.as_ref())))
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        to_timestamp(self.end_blocktime.as_ref())
            .or_else(|| self.govless().and_then(|g| to_timestamp(g.end_blocktime.as_ref())))
    }

    /// `outcome[group]`, if present.
    pub fn outcome_group(&self, group: &str) -> Option<&AmountMap> {
        self.outcome.as_ref()?.get(group)
    }

    /// `totals[key]`, if present.
    pub fn totals_group(&self, key: &str) -> Option<&AmountMap> {
        self.totals.as_ref()?.get(key)
    }
}
