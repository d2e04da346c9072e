// crates/gov_pipeline/src/lib.rs
#![forbid(unsafe_code)]

//! gov_pipeline — per-record status derivation and evaluation
//! (classify → resolve thresholds → extract metrics → gates → status).
//!
//! Contract:
//! - Pure and synchronous; the evaluation instant is an explicit argument.
//! - Never fails on record content. Degraded records end up DEFEATED or FAILED,
//!   which callers read as "not confirmed to have passed".
//! - The only fallible entry point is `StatusEngine::try_new` (config validation).

pub mod gates;
pub mod listing;
pub mod status;

use gov_algo::metrics::{extract_approval_metrics, extract_optimistic_metrics, extract_standard_metrics};
use gov_algo::{classify, resolve_thresholds, ApprovalMetrics, OptimisticMetrics, Thresholds, VoteMetrics};
use gov_core::record::RawProposalRecord;
use gov_core::{CoreError, EngineConfig, Mechanism, MechanismClass, Status, Timestamp};
use serde::Serialize;
use tracing::trace;

pub use gates::{ApprovalBranch, ApprovalGate, StandardGate};
pub use listing::{prepare_listing, ArchiveFilter};
pub use status::StatusRule;

// ---------------------------- Evaluation output ----------------------------

/// Mechanism metrics plus the gate that decided the outcome.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalMetrics {
    Standard { metrics: VoteMetrics, gate: StandardGate },
    Approval { metrics: ApprovalMetrics, gate: ApprovalGate },
    Optimistic { metrics: OptimisticMetrics },
}

impl ProposalMetrics {
    /// Status of a closed vote.
    pub fn outcome(&self) -> Status {
        match self {
            ProposalMetrics::Standard { metrics, gate } => gates::standard_status(gate, metrics),
            ProposalMetrics::Approval { gate, .. } => gate.status(),
            ProposalMetrics::Optimistic { metrics } if metrics.veto_triggered => Status::Defeated,
            ProposalMetrics::Optimistic { .. } => Status::Succeeded,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProposalEvaluation {
    pub id: Option<String>,
    pub status: Status,
    /// Rule of the state machine that produced `status`.
    pub rule: StatusRule,
    pub mechanism: Mechanism,
    pub thresholds: Thresholds,
    pub metrics: ProposalMetrics,
}

// ---------------------------- Engine ----------------------------

/// Status engine bound to one configuration.
#[derive(Clone, Debug, Default)]
pub struct StatusEngine {
    config: EngineConfig,
}

impl StatusEngine {
    /// Trusts `config`; use `try_new` for configs read from outside.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn try_new(config: EngineConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Metrics and gate for the record's mechanism.
    pub fn metrics(&self, r: &RawProposalRecord, mechanism: Mechanism, t: &Thresholds, decimals: u32) -> ProposalMetrics {
        let cfg = &self.config;
        match mechanism.class() {
            MechanismClass::Optimistic => ProposalMetrics::Optimistic {
                metrics: extract_optimistic_metrics(r, t, decimals, cfg),
            },
            MechanismClass::Approval => {
                let metrics = extract_approval_metrics(r, t, decimals, cfg);
                let gate = gates::approval_gate(r, mechanism, &metrics, t, decimals, cfg);
                ProposalMetrics::Approval { metrics, gate }
            }
            MechanismClass::Standard => {
                let metrics = extract_standard_metrics(r, t, decimals, cfg);
                let gate = gates::standard_gate(r, mechanism, &metrics, t);
                ProposalMetrics::Standard { metrics, gate }
            }
        }
    }

    /// Full evaluation: status, the rule behind it, thresholds and metrics.
    pub fn evaluate(&self, r: &RawProposalRecord, decimals: u32, now: Timestamp) -> ProposalEvaluation {
        let mechanism = classify(r).mechanism;
        let thresholds = resolve_thresholds(r, decimals);
        let metrics = self.metrics(r, mechanism, &thresholds, decimals);

        let (status, rule) = match status::lifecycle_status(r, now, &self.config) {
            Some(hit) => hit,
            None => {
                let s = metrics.outcome();
                trace!(id = ?r.id, %mechanism, status = %s, "outcome rule");
                (s, StatusRule::Outcome)
            }
        };

        ProposalEvaluation {
            id: r.id.clone(),
            status,
            rule,
            mechanism,
            thresholds,
            metrics,
        }
    }

    /// Status only; skips the metric work when a lifecycle rule decides.
    pub fn derive_status(&self, r: &RawProposalRecord, decimals: u32, now: Timestamp) -> Status {
        if let Some((s, _)) = status::lifecycle_status(r, now, &self.config) {
            return s;
        }
        let mechanism = classify(r).mechanism;
        let thresholds = resolve_thresholds(r, decimals);
        let s = self.metrics(r, mechanism, &thresholds, decimals).outcome();
        trace!(id = ?r.id, %mechanism, status = %s, "outcome rule");
        s
    }

    /// Prepare a listing and evaluate every record in it.
    pub fn evaluate_listing(
        &self,
        records: Vec<RawProposalRecord>,
        filter: ArchiveFilter,
        decimals: u32,
        now: Timestamp,
    ) -> Vec<ProposalEvaluation> {
        prepare_listing(records, filter)
            .iter()
            .map(|r| self.evaluate(r, decimals, now))
            .collect()
    }
}

/// `derive_status` with the default configuration.
pub fn derive_status(r: &RawProposalRecord, decimals: u32, now: Timestamp) -> Status {
    StatusEngine::default().derive_status(r, decimals, now)
}
