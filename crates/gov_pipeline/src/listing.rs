//! Archive listing preparation: de-duplicate hybrid halves, order newest first,
//! apply the listing filter.

use core::str::FromStr;

use gov_core::record::RawProposalRecord;
use gov_core::{to_big_int_opt, CoreError, Source};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::status::is_cancelled;

pub const TEMP_CHECK_TAG: &str = "tempcheck";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFilter {
    #[default]
    All,
    /// Hides cancelled and deleted proposals.
    Relevant,
    TempChecks,
}

impl FromStr for ArchiveFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(ArchiveFilter::All),
            "relevant" => Ok(ArchiveFilter::Relevant),
            "temp-checks" => Ok(ArchiveFilter::TempChecks),
            other => Err(CoreError::InvalidToken(other.to_string())),
        }
    }
}

impl ArchiveFilter {
    pub fn accepts(self, r: &RawProposalRecord) -> bool {
        match self {
            ArchiveFilter::All => true,
            ArchiveFilter::Relevant => !is_cancelled(r),
            ArchiveFilter::TempChecks => r.has_tag(TEMP_CHECK_TAG),
        }
    }
}

/// `eas-atlas` copy of a hybrid proposal; the `dao_node` record embeds it.
fn is_hybrid_copy(r: &RawProposalRecord) -> bool {
    r.source() == Some(Source::EasAtlas) && r.hybrid == Some(true)
}

/// Start time, falling back to the start block. Missing sorts last.
fn sort_key(r: &RawProposalRecord) -> u64 {
    to_big_int_opt(r.start_blocktime.as_ref())
        .or_else(|| to_big_int_opt(r.start_block.as_ref()))
        .and_then(|n| n.to_u64())
        .unwrap_or(0)
}

pub fn prepare_listing(records: Vec<RawProposalRecord>, filter: ArchiveFilter) -> Vec<RawProposalRecord> {
    let mut out: Vec<RawProposalRecord> = records
        .into_iter()
        .filter(|r| !is_hybrid_copy(r) && filter.accepts(r))
        .collect();
    out.sort_by_key(|r| core::cmp::Reverse(sort_key(r)));
    out
}
