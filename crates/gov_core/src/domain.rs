//! Wire domains shared by every layer: lifecycle `Status`, archive `Source`,
//! voting `Mechanism`, citizen groups and the `Timestamp` newtype.
//!
//! Tokens are explicit and stable; they match what the archive and the UI
//! layer exchange (`"SUCCEEDED"`, `"HYBRID_OPTIMISTIC_TIERED"`, `"eas-atlas"`).

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Define a serde'd enum with explicit wire tokens plus `as_str`/`FromStr`.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident => { $($variant:ident = $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok($name::$variant),)+
                    other => Err(CoreError::InvalidToken(other.to_string())),
                }
            }
        }
    };
}

wire_enum!(
    /// Lifecycle status of a proposal. `Cancelled` and `Executed` are terminal;
    /// everything else is recomputed from the record on each call.
    Status => {
        Pending   = "PENDING",
        Active    = "ACTIVE",
        Queued    = "QUEUED",
        Passed    = "PASSED",
        Executed  = "EXECUTED",
        Cancelled = "CANCELLED",
        Succeeded = "SUCCEEDED",
        Defeated  = "DEFEATED",
        Failed    = "FAILED",
    }
);

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Cancelled | Status::Executed)
    }
}

wire_enum!(
    /// Archive backend a record was produced by.
    Source => {
        DaoNode  = "dao_node",
        EasAtlas = "eas-atlas",
        EasOodao = "eas-oodao",
        Snapshot = "snapshot",
    }
);

impl Source {
    /// Lenient lookup: unknown or absent tags are `None`, never an error.
    pub fn from_tag(tag: Option<&str>) -> Option<Source> {
        tag.and_then(|t| t.trim().parse().ok())
    }
}

wire_enum!(
    /// Off-chain citizen constituencies, keyed as they appear in vote outcomes.
    CitizenGroup => {
        App   = "APP",
        User  = "USER",
        Chain = "CHAIN",
    }
);

wire_enum!(
    /// Voting mechanism tag, qualified by source (`HYBRID_*`, `OFFCHAIN_*`)
    /// and veto flavour (`*_TIERED`).
    Mechanism => {
        Standard                 = "STANDARD",
        Approval                 = "APPROVAL",
        Optimistic               = "OPTIMISTIC",
        OptimisticTiered         = "OPTIMISTIC_TIERED",
        HybridStandard           = "HYBRID_STANDARD",
        HybridApproval           = "HYBRID_APPROVAL",
        HybridOptimistic         = "HYBRID_OPTIMISTIC",
        HybridOptimisticTiered   = "HYBRID_OPTIMISTIC_TIERED",
        OffchainStandard         = "OFFCHAIN_STANDARD",
        OffchainApproval         = "OFFCHAIN_APPROVAL",
        OffchainOptimistic       = "OFFCHAIN_OPTIMISTIC",
        OffchainOptimisticTiered = "OFFCHAIN_OPTIMISTIC_TIERED",
        Snapshot                 = "SNAPSHOT",
    }
);

/// Base voting class behind a mechanism tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MechanismClass {
    Standard,
    Approval,
    Optimistic,
}

impl MechanismClass {
    /// Class names as used by EAS proposal-type objects (`"class": "APPROVAL"`).
    pub fn from_name(name: &str) -> Option<MechanismClass> {
        match name.trim().to_ascii_uppercase().as_str() {
            "STANDARD" => Some(MechanismClass::Standard),
            "APPROVAL" => Some(MechanismClass::Approval),
            "OPTIMISTIC" | "OPTIMISTIC_TIERED" => Some(MechanismClass::Optimistic),
            _ => None,
        }
    }
}

impl Mechanism {
    pub fn class(self) -> MechanismClass {
        use Mechanism::*;
        match self {
            Approval | HybridApproval | OffchainApproval => MechanismClass::Approval,
            Optimistic | OptimisticTiered | HybridOptimistic | HybridOptimisticTiered
            | OffchainOptimistic | OffchainOptimisticTiered => MechanismClass::Optimistic,
            Standard | HybridStandard | OffchainStandard | Snapshot => MechanismClass::Standard,
        }
    }

    /// Compose a tag from its parts. `hybrid` wins over `offchain`.
    pub fn compose(class: MechanismClass, tiered: bool, hybrid: bool, offchain: bool) -> Mechanism {
        use Mechanism::*;
        match (class, hybrid, offchain) {
            (MechanismClass::Standard, true, _) => HybridStandard,
            (MechanismClass::Approval, true, _) => HybridApproval,
            (MechanismClass::Optimistic, true, _) if tiered => HybridOptimisticTiered,
            (MechanismClass::Optimistic, true, _) => HybridOptimistic,
            (MechanismClass::Standard, false, true) => OffchainStandard,
            (MechanismClass::Approval, false, true) => OffchainApproval,
            (MechanismClass::Optimistic, false, true) if tiered => OffchainOptimisticTiered,
            (MechanismClass::Optimistic, false, true) => OffchainOptimistic,
            (MechanismClass::Standard, false, false) => Standard,
            (MechanismClass::Approval, false, false) => Approval,
            (MechanismClass::Optimistic, false, false) if tiered => OptimisticTiered,
            (MechanismClass::Optimistic, false, false) => Optimistic,
        }
    }

    pub fn is_approval(self) -> bool {
        self.class() == MechanismClass::Approval
    }

    pub fn is_optimistic(self) -> bool {
        self.class() == MechanismClass::Optimistic
    }

    pub fn is_tiered(self) -> bool {
        matches!(
            self,
            Mechanism::OptimisticTiered
                | Mechanism::HybridOptimisticTiered
                | Mechanism::OffchainOptimisticTiered
        )
    }

    pub fn is_hybrid(self) -> bool {
        self.as_str().starts_with("HYBRID_")
    }

    pub fn is_offchain(self) -> bool {
        self.as_str().starts_with("OFFCHAIN_")
    }
}

/// Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_secs(secs: u64) -> Self {
        Timestamp(secs)
    }

    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// Seconds from `earlier` to `self`; `0` when `earlier` is in the future.
    pub fn saturating_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
