//! Multi-group arithmetic shared by the extractors.
//!
//! Citizen outcomes are plain counts (no decimal scaling); delegate totals are
//! base-unit amounts scaled by the token decimals. Hybrid values combine the
//! four groups as `Σ percent(group) * weight(group)`.

use gov_core::numeric::percent_of;
use gov_core::record::{AmountMap, TallyCell, TallyMap};
use gov_core::{to_big_int, to_decimal, CitizenGroup, EngineConfig, RawNumeric};
use num_bigint::BigInt;
use serde::Serialize;

/// Support codes used by every vote-totals layout.
pub const AGAINST: &str = "0";
pub const FOR: &str = "1";
pub const ABSTAIN: &str = "2";

pub fn cell<'a>(map: Option<&'a AmountMap>, code: &str) -> Option<&'a RawNumeric> {
    map?.get(code)?.amount()
}

/// Amount under `code`, scaled by `decimals`.
pub fn scaled(map: Option<&AmountMap>, code: &str, decimals: u32) -> f64 {
    to_decimal(cell(map, code), decimals)
}

/// Amount under `code` in base units.
pub fn raw(map: Option<&AmountMap>, code: &str) -> BigInt {
    to_big_int(cell(map, code))
}

/// Per-citizen-group values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GroupCounts {
    pub app: f64,
    pub user: f64,
    pub chain: f64,
}

impl GroupCounts {
    pub fn get(&self, group: CitizenGroup) -> f64 {
        match group {
            CitizenGroup::App => self.app,
            CitizenGroup::User => self.user,
            CitizenGroup::Chain => self.chain,
        }
    }

    pub fn sum(&self) -> f64 {
        self.app + self.user + self.chain
    }

    fn from_fn(mut f: impl FnMut(CitizenGroup) -> f64) -> Self {
        GroupCounts {
            app: f(CitizenGroup::App),
            user: f(CitizenGroup::User),
            chain: f(CitizenGroup::Chain),
        }
    }
}

pub fn citizen_group(outcome: Option<&TallyMap>, group: CitizenGroup) -> Option<&AmountMap> {
    outcome?.get(group.as_str())
}

/// Count under `code` for each citizen group.
pub fn citizen_counts(outcome: Option<&TallyMap>, code: &str) -> GroupCounts {
    GroupCounts::from_fn(|g| scaled(citizen_group(outcome, g), code, 0))
}

/// `count / eligible * 100` for each citizen group.
pub fn citizen_percents(counts: &GroupCounts, cfg: &EngineConfig) -> GroupCounts {
    GroupCounts::from_fn(|g| percent_of(counts.get(g), cfg.eligible.for_group(g)))
}

/// Weighted percentage across delegates and the three citizen groups.
pub fn weighted_percent(
    delegate_votes: f64,
    eligible_delegates: f64,
    citizens: &GroupCounts,
    cfg: &EngineConfig,
) -> f64 {
    let pcts = citizen_percents(citizens, cfg);
    let mut out = percent_of(delegate_votes, eligible_delegates) * cfg.weights.delegates;
    for g in CitizenGroup::ALL {
        out += pcts.get(*g) * cfg.weights.for_group(*g);
    }
    out
}

/// Votes cast in one group's map: the sum of flat against/for/abstain cells,
/// or, for per-option layouts, the largest option's approvals.
pub fn participation(map: Option<&AmountMap>, decimals: u32) -> f64 {
    let Some(map) = map else { return 0.0 };
    let flat: f64 = [AGAINST, FOR, ABSTAIN]
        .iter()
        .filter_map(|code| map.get(*code)?.flat_amount())
        .map(|n| to_decimal(Some(n), decimals))
        .sum();
    if flat > 0.0 {
        return flat;
    }
    map.values()
        .filter_map(TallyCell::amount)
        .map(|n| to_decimal(Some(n), decimals))
        .fold(0.0, f64::max)
}
