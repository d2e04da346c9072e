// crates/gov_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Algorithm layer over raw archive records. Every entry point is a total,
//! pure function: degraded input yields zero-valued metrics, never an error.

pub mod classify;
pub mod thresholds;

// ----------------------------- Metric extractors (public surface) -----------------------------

pub mod metrics {
    // File modules (actual implementations)
    pub mod approval;
    pub mod optimistic;
    pub mod standard;
    pub mod weighted;

    pub use approval::{extract_approval_metrics, ApprovalChoice, ApprovalMetrics, Criteria};
    pub use optimistic::{
        extract_optimistic_metrics, extract_optimistic_tiered_metrics, GroupVeto, OptimisticMetrics,
        VetoRule,
    };
    pub use standard::{extract_standard_metrics, Segments, VoteMetrics};
}

// Convenience re-exports (pipeline imports these from crate root)
pub use classify::{classify, voting_data, Classification, VotingData};
pub use metrics::{ApprovalMetrics, Criteria, OptimisticMetrics, VoteMetrics};
pub use thresholds::{resolve_thresholds, Quorum, Thresholds};
