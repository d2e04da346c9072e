//! Approval (multi-choice) metrics.
//!
//! Choice lists come from, in order: the on-chain `decoded_proposal_data`
//! option list, `kwargs.choices`, then a plain `choices` array (the embedded
//! off-chain half first for hybrids). Per-option approvals are read from the
//! shape the source exposes:
//! - on-chain / hybrid delegates: `totals[index]["1"]` (older dumps: `["0"]`), scaled
//! - token holders: `outcome["token-holders"][index]["1"]`, scaled
//! - citizens: `Σ outcome[group][index]["1"]`, plain counts
//!
//! Hybrid choices also carry a weighted percentage across the four groups.
//! Choices are ranked by approvals (highest first, ties by index).

use gov_core::numeric::{clamp_percentage, percent_of};
use gov_core::record::{Kwargs, RawProposalRecord};
use gov_core::{to_big_int, to_big_int_opt, to_decimal, CitizenGroup, EngineConfig, RawNumeric};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use serde::Serialize;
use serde_json::Value;

use crate::classify::{voting_data, voting_record, VotingData};
use crate::metrics::weighted::{cell, citizen_group, weighted_percent, GroupCounts, AGAINST, FOR};
use crate::thresholds::Thresholds;

/// How winners are decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Criteria {
    /// An option wins when its approvals exceed the criteria value.
    #[default]
    Threshold,
    /// The top N options win.
    TopChoices,
}

impl Criteria {
    /// `0`/`99`/`"THRESHOLD"` → threshold, `1`/`"TOP_CHOICES"` → top choices.
    /// Anything else reads as threshold.
    pub fn parse(raw: Option<&RawNumeric>) -> Criteria {
        let Some(raw) = raw else {
            return Criteria::Threshold;
        };
        let text = raw.as_text().trim().to_ascii_uppercase();
        if text == "TOP_CHOICES" {
            return Criteria::TopChoices;
        }
        match to_big_int_opt(Some(raw)).and_then(|n| n.to_u64()) {
            Some(1) => Criteria::TopChoices,
            _ => Criteria::Threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalChoice {
    pub index: usize,
    pub text: String,
    /// Human units (token amounts or citizen counts).
    pub approvals: f64,
    #[serde(with = "gov_core::numeric::big_int_string")]
    pub approvals_raw: BigInt,
    /// Share of all approvals, `[0, 100]`.
    pub share_pct: f64,
    /// Hybrid only.
    pub weighted_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApprovalMetrics {
    pub choices: Vec<ApprovalChoice>,
    /// Distinct voters; one voter may approve several options.
    pub total_voters: u64,
    pub criteria: Criteria,
    /// Verbatim from the record.
    #[serde(with = "gov_core::numeric::big_int_string")]
    pub criteria_value: BigInt,
    pub max_approvals: u64,
    pub budget_token: Option<String>,
    #[serde(with = "gov_core::numeric::big_int_string")]
    pub budget_amount: BigInt,
}

impl ApprovalMetrics {
    pub fn criteria_value_f64(&self) -> f64 {
        self.criteria_value.to_f64().filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    pub fn total_approvals(&self) -> f64 {
        self.choices.iter().map(|c| c.approvals).sum()
    }
}

// ---------------- Choice list ----------------

#[derive(Default)]
struct ChoiceSpec {
    texts: Vec<String>,
    max_approvals: Option<RawNumeric>,
    criteria: Option<RawNumeric>,
    criteria_value: Option<RawNumeric>,
    budget_token: Option<String>,
    budget_amount: Option<RawNumeric>,
}

fn value_num(v: Option<&Value>) -> Option<RawNumeric> {
    v.and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// `[[option...], [max_approvals, criteria, budget_token, criteria_value, budget_amount]]`,
/// where an option is `[targets, values, calldatas, (?), description, ...]`.
fn from_decoded(decoded: &Value) -> Option<ChoiceSpec> {
    let parts = decoded.as_array()?;
    let options = parts.first()?.as_array()?;
    if options.is_empty() {
        return None;
    }
    let texts = options
        .iter()
        .enumerate()
        .map(|(i, opt)| {
            let opt = opt.as_array();
            let pos = if opt.is_some_and(|o| o.len() == 4) { 3 } else { 4 };
            opt.and_then(|o| o.get(pos))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Option {}", i + 1))
        })
        .collect();
    let settings = parts.get(1).and_then(Value::as_array);
    let setting = |i: usize| settings.and_then(|s| s.get(i));
    Some(ChoiceSpec {
        texts,
        max_approvals: value_num(setting(0)),
        criteria: value_num(setting(1)),
        budget_token: setting(2).and_then(Value::as_str).map(str::to_string),
        criteria_value: value_num(setting(3)),
        budget_amount: value_num(setting(4)),
    })
}

fn from_kwargs(k: &Kwargs) -> Option<ChoiceSpec> {
    Some(ChoiceSpec {
        texts: k.choices.clone()?,
        max_approvals: k.max_approvals.clone(),
        criteria: k.criteria.clone(),
        criteria_value: k.criteria_value.clone(),
        budget_token: k.budget_token.clone(),
        budget_amount: k.budget_amount.clone(),
    })
}

fn from_choices(r: &RawProposalRecord) -> Option<ChoiceSpec> {
    Some(ChoiceSpec {
        texts: r.choices.clone()?,
        max_approvals: r.max_approvals.clone(),
        criteria: r.criteria.clone(),
        criteria_value: r.criteria_value.clone(),
        ..ChoiceSpec::default()
    })
}

fn choice_spec(r: &RawProposalRecord) -> ChoiceSpec {
    let v = voting_record(r);
    let mut spec = r
        .decoded_proposal_data
        .as_ref()
        .and_then(from_decoded)
        .or_else(|| v.kwargs.as_ref().and_then(from_kwargs))
        .or_else(|| r.kwargs.as_ref().and_then(from_kwargs))
        .or_else(|| from_choices(v))
        .or_else(|| from_choices(r))
        .unwrap_or_default();

    // Criteria settings may sit at top level even when the list does not.
    for rec in [v, r] {
        spec.max_approvals = spec.max_approvals.take().or_else(|| rec.max_approvals.clone());
        spec.criteria = spec.criteria.take().or_else(|| rec.criteria.clone());
        spec.criteria_value = spec.criteria_value.take().or_else(|| rec.criteria_value.clone());
    }
    spec
}

// ---------------- Votes per option ----------------

fn floor_big(v: f64) -> BigInt {
    BigInt::from_f64(v.floor()).unwrap_or_default()
}

fn citizen_option_counts(data: &VotingData<'_>, key: &str) -> GroupCounts {
    let outcome = data.citizens();
    let count = |g: CitizenGroup| to_decimal(cell(citizen_group(outcome, g), key), 0);
    GroupCounts {
        app: count(CitizenGroup::App),
        user: count(CitizenGroup::User),
        chain: count(CitizenGroup::Chain),
    }
}

/// `(approvals, approvals_raw)` of the delegate / token side for option `key`.
fn token_option(data: &VotingData<'_>, key: &str, decimals: u32) -> (f64, BigInt) {
    let raw = match data {
        VotingData::TokenHolders { .. } => data
            .flat()
            .and_then(|m| m.get(key))
            .and_then(|c| c.amount()),
        _ => {
            let m = data.option_totals().and_then(|t| t.get(key));
            cell(m, FOR).or_else(|| cell(m, AGAINST))
        }
    };
    (to_decimal(raw, decimals), to_big_int(raw))
}

pub fn extract_approval_metrics(
    r: &RawProposalRecord,
    thresholds: &Thresholds,
    decimals: u32,
    cfg: &EngineConfig,
) -> ApprovalMetrics {
    let data = voting_data(r);
    let spec = choice_spec(r);

    let mut choices: Vec<ApprovalChoice> = spec
        .texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let key = index.to_string();
            let (approvals, approvals_raw, weighted_pct) = match data {
                VotingData::Citizens { .. } => {
                    let n = citizen_option_counts(&data, &key).sum();
                    (n, floor_big(n), None)
                }
                VotingData::Hybrid { .. } => {
                    let (a, raw) = token_option(&data, &key, decimals);
                    let citizens = citizen_option_counts(&data, &key);
                    let w = weighted_percent(a, thresholds.votable_supply, &citizens, cfg);
                    (a, raw, Some(w))
                }
                VotingData::Onchain { .. } | VotingData::TokenHolders { .. } => {
                    let (a, raw) = token_option(&data, &key, decimals);
                    (a, raw, None)
                }
                VotingData::Unsupported => (0.0, BigInt::default(), None),
            };
            ApprovalChoice {
                index,
                text,
                approvals,
                approvals_raw,
                share_pct: 0.0,
                weighted_pct,
            }
        })
        .collect();

    let total: f64 = choices.iter().map(|c| c.approvals).sum();
    for c in &mut choices {
        c.share_pct = clamp_percentage(percent_of(c.approvals, total));
    }
    choices.sort_by(|a, b| b.approvals.total_cmp(&a.approvals).then(a.index.cmp(&b.index)));

    let voters = voting_record(r).num_of_votes.as_ref().or(r.num_of_votes.as_ref());
    ApprovalMetrics {
        choices,
        total_voters: to_big_int(voters).to_u64().unwrap_or(0),
        criteria: Criteria::parse(spec.criteria.as_ref()),
        criteria_value: to_big_int(spec.criteria_value.as_ref()),
        max_approvals: to_big_int(spec.max_approvals.as_ref()).to_u64().unwrap_or(0),
        budget_token: spec.budget_token.filter(|t| !t.is_empty()),
        budget_amount: to_big_int(spec.budget_amount.as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thresholds::resolve_thresholds;
    use serde_json::json;

    fn run(v: serde_json::Value, decimals: u32) -> ApprovalMetrics {
        let r: RawProposalRecord = serde_json::from_value(v).unwrap();
        let t = resolve_thresholds(&r, decimals);
        extract_approval_metrics(&r, &t, decimals, &EngineConfig::default())
    }

    #[test]
    fn criteria_parsing() {
        assert_eq!(Criteria::parse(None), Criteria::Threshold);
        assert_eq!(Criteria::parse(Some(&RawNumeric::int(99))), Criteria::Threshold);
        assert_eq!(Criteria::parse(Some(&RawNumeric::int(0))), Criteria::Threshold);
        assert_eq!(Criteria::parse(Some(&RawNumeric::int(1))), Criteria::TopChoices);
        assert_eq!(Criteria::parse(Some(&RawNumeric::text("top_choices"))), Criteria::TopChoices);
        assert_eq!(Criteria::parse(Some(&RawNumeric::text("THRESHOLD"))), Criteria::Threshold);
    }

    #[test]
    fn onchain_choices_from_decoded_options() {
        let m = run(
            json!({
                "data_eng_properties": {"source": "dao_node"},
                "voting_module_name": "approval",
                "decoded_proposal_data": [
                    [
                        [[], [], [], "Legacy option"],
                        [[], [], [], 0, "Grant A", "100"],
                        [[], [], [], 0]
                    ],
                    [2, 99, "0xtoken", "1000000000000000000", "5"]
                ],
                "totals": {
                    "0": {"1": "2000000000000000000"},
                    "1": {"1": "3000000000000000000"},
                    "2": {"0": "1000000000000000000"},
                },
                "num_of_votes": 4,
            }),
            18,
        );
        assert_eq!(m.criteria, Criteria::Threshold);
        assert_eq!(m.criteria_value.to_string(), "1000000000000000000");
        assert_eq!(m.max_approvals, 2);
        assert_eq!(m.total_voters, 4);
        assert_eq!(m.budget_token.as_deref(), Some("0xtoken"));

        let ranked: Vec<_> = m.choices.iter().map(|c| (c.index, c.text.as_str(), c.approvals)).collect();
        assert_eq!(
            ranked,
            vec![(1, "Grant A", 3.0), (0, "Legacy option", 2.0), (2, "Option 3", 1.0)]
        );
        assert_eq!(m.choices[0].approvals_raw.to_string(), "3000000000000000000");
        assert!((m.choices[0].share_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn citizens_sum_across_groups() {
        let m = run(
            json!({
                "data_eng_properties": {"source": "eas-atlas"},
                "proposal_type": "APPROVAL",
                "choices": ["a", "b"],
                "criteria": 99,
                "criteria_value": 100,
                "num_of_votes": 60,
                "outcome": {
                    "USER": {"0": {"1": 30}, "1": {"1": 100}},
                    "APP": {"0": {"1": 20}, "1": {"1": 50}},
                },
            }),
            18,
        );
        let by_index: Vec<_> = m.choices.iter().map(|c| (c.index, c.approvals)).collect();
        assert_eq!(by_index, vec![(1, 150.0), (0, 50.0)]);
        assert_eq!(m.criteria_value_f64(), 100.0);
        assert_eq!(m.total_voters, 60);
        assert!(m.choices.iter().all(|c| c.weighted_pct.is_none()));
    }

    #[test]
    fn token_holders_and_kwargs() {
        let m = run(
            json!({
                "data_eng_properties": {"source": "eas-oodao"},
                "kwargs": {"choices": ["x", "y"], "criteria": 1, "criteria_value": 1, "max_approvals": 1},
                "outcome": {"token-holders": {"0": {"1": "250"}, "1": {"1": "750"}}},
            }),
            2,
        );
        assert_eq!(m.criteria, Criteria::TopChoices);
        assert_eq!(m.choices[0].text, "y");
        assert_eq!(m.choices[0].approvals, 7.5);
        assert_eq!(m.choices[0].approvals_raw, BigInt::from(750));
        assert_eq!(m.total_approvals(), 10.0);
    }

    #[test]
    fn hybrid_choices_carry_weighted_percent() {
        let m = run(
            json!({
                "data_eng_properties": {"source": "dao_node"},
                "voting_module_name": "approval",
                "hybrid": true,
                "total_voting_power_at_start": "100",
                "totals": {"0": {"1": "40"}},
                "govless_proposal": {
                    "choices": ["only"],
                    "outcome": {"USER": {"0": {"1": 1000}}},
                },
            }),
            0,
        );
        let c = &m.choices[0];
        // delegates 40% * 0.5 + users 100% / 6
        let expected = 20.0 + 100.0 / 6.0;
        assert!((c.weighted_pct.unwrap() - expected).abs() < 1e-9);
        assert_eq!(c.approvals, 40.0);
    }

    #[test]
    fn no_choices_is_empty() {
        let m = run(json!({"data_eng_properties": {"source": "dao_node"}}), 18);
        assert!(m.choices.is_empty());
        assert_eq!(m.total_voters, 0);
        assert_eq!(m.criteria, Criteria::Threshold);
    }
}
