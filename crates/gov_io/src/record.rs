//! Single-record JSON documents (one proposal per file).

use std::fs;
use std::path::Path;

use gov_core::RawProposalRecord;

use crate::IoResult;

pub fn record_from_str(text: &str) -> IoResult<RawProposalRecord> {
    Ok(serde_json::from_str(text)?)
}

pub fn read_record(path: &Path) -> IoResult<RawProposalRecord> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
