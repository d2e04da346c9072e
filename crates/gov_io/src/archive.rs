//! NDJSON archive dumps: one proposal record per line.
//!
//! Contract:
//! - Blank lines are ignored; `\r\n` endings and a leading UTF-8 BOM are tolerated.
//! - Lenient reads skip a malformed line with a `warn!` and keep going; one bad
//!   record never aborts a listing.
//! - Strict reads stop at the first malformed line and report its 1-based number.

use std::fs;
use std::path::Path;

use gov_core::RawProposalRecord;
use serde::Serialize;
use tracing::warn;

use crate::{IoError, IoResult};

/// A line the lenient reader dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub line: usize,
    pub reason: String,
}

/// Records parsed from one archive dump.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBatch {
    pub records: Vec<RawProposalRecord>,
    pub skipped: Vec<SkippedLine>,
    /// SHA-256 of the raw dump bytes (feature `hash`, file reads only).
    pub sha256: Option<String>,
}

impl ArchiveBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Non-blank lines with their 1-based numbers.
fn lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end_matches('\r').trim()))
        .filter(|(_, l)| !l.is_empty())
}

/// Parse an NDJSON dump, skipping malformed lines.
pub fn parse_ndjson(text: &str) -> ArchiveBatch {
    let mut batch = ArchiveBatch::default();
    for (line, raw) in lines(text) {
        match serde_json::from_str::<RawProposalRecord>(raw) {
            Ok(rec) => batch.records.push(rec),
            Err(e) => {
                warn!(line, error = %e, "skipping malformed archive line");
                batch.skipped.push(SkippedLine {
                    line,
                    reason: e.to_string(),
                });
            }
        }
    }
    batch
}

/// Parse an NDJSON dump, failing on the first malformed line.
pub fn parse_ndjson_strict(text: &str) -> IoResult<Vec<RawProposalRecord>> {
    lines(text)
        .map(|(line, raw)| {
            serde_json::from_str::<RawProposalRecord>(raw).map_err(|e| IoError::Line {
                line,
                msg: e.to_string(),
            })
        })
        .collect()
}

/// Lenient read of an archive file; fills in the dump digest when hashing is enabled.
pub fn read_ndjson(path: &Path) -> IoResult<ArchiveBatch> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let mut batch = parse_ndjson(&text);
    #[cfg(feature = "hash")]
    {
        batch.sha256 = Some(crate::hasher::sha256_hex(&bytes));
    }
    Ok(batch)
}

pub fn read_ndjson_strict(path: &Path) -> IoResult<Vec<RawProposalRecord>> {
    let text = fs::read_to_string(path)?;
    parse_ndjson_strict(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = concat!(
        "\u{feff}{\"id\":\"1\",\"data_eng_properties\":{\"source\":\"dao_node\"}}\r\n",
        "\n",
        "{not json}\n",
        "{\"id\":\"2\",\"hybrid\":\"maybe\"}\n",
    );

    #[test]
    fn lenient_skips_bad_lines() {
        let batch = parse_ndjson(DUMP);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.records[0].id.as_deref(), Some("1"));
        assert_eq!(batch.records[1].hybrid, None);
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].line, 3);
        assert!(batch.sha256.is_none());
    }

    #[test]
    fn strict_reports_line_number() {
        match parse_ndjson_strict(DUMP) {
            Err(IoError::Line { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected line error, got {other:?}"),
        }
    }

    #[test]
    fn non_object_line_is_malformed() {
        let batch = parse_ndjson("42\n\"text\"\n{}\n");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.skipped.iter().map(|s| s.line).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn empty_dump_is_empty() {
        assert!(parse_ndjson("").is_empty());
        assert!(parse_ndjson_strict("\n\n").unwrap().is_empty());
    }
}
