//! gov_core — Core types, domains, numeric conversions and engine configuration.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`gov_io`, `gov_algo`, `gov_pipeline`).
//!
//! - Raw archive record model (`record`), deserialized leniently
//! - Total numeric conversions (`numeric`): decimal display values, big integers, timestamps
//! - Wire domains (`domain`): `Status`, `Source`, `Mechanism`, `Timestamp`
//! - Engine configuration (`config`): hybrid weights, citizen eligibility, veto tiers
//!
//! Nothing here reads a clock; "now" is always supplied by the caller.

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    /// Minimal error set for configuration validation & token parsing.
    #[derive(Clone, Debug, PartialEq)]
    pub enum CoreError {
        InvalidToken(String),
        WeightsNotNormalized(f64),
        ZeroEligibleCount(&'static str),
        InvalidTiers(&'static str),
        DomainOutOfRange(&'static str),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidToken(t) => write!(f, "invalid token: {t}"),
                CoreError::WeightsNotNormalized(s) => {
                    write!(f, "hybrid weights must sum to 1.0 (got {s})")
                }
                CoreError::ZeroEligibleCount(g) => write!(f, "eligible count for {g} must be > 0"),
                CoreError::InvalidTiers(k) => write!(f, "invalid veto tiers: {k}"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod config;
pub mod domain;
pub mod numeric;
pub mod record;

pub use config::{CitizenEligibility, EngineConfig, HybridWeights, VetoTierDefaults};
pub use domain::{CitizenGroup, Mechanism, MechanismClass, Source, Status, Timestamp};
pub use errors::CoreError;
pub use numeric::{to_big_int, to_big_int_opt, to_decimal, to_raw_string, to_timestamp, RawNumeric};
pub use record::RawProposalRecord;
