//! gov_io — the only crate that touches the filesystem.
//!
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - `archive`: NDJSON archive dumps → `RawProposalRecord`s (lenient and strict).
//! - `record`: single JSON record documents.
//! - `config`: engine configuration files.
//! - `hasher` (feature `hash`): SHA-256 digests of raw archive bytes.

#![forbid(unsafe_code)]

use gov_core::CoreError;
use thiserror::Error;

/// Unified error for gov_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors.
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON errors for whole-document reads.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// A malformed NDJSON line (1-based), reported by strict reads.
    #[error("ndjson line {line}: {msg}")]
    Line { line: usize, msg: String },

    /// A configuration that parsed but failed domain validation.
    #[error("config error: {0}")]
    Config(#[from] CoreError),
}

pub type IoResult<T> = Result<T, IoError>;

/* ---------------- From conversions (used by file modules) ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps line/column, not a pointer.
        IoError::Json {
            pointer: "/".to_string(),
            msg: e.to_string(),
        }
    }
}

pub mod archive;
pub mod config;
#[cfg(feature = "hash")]
pub mod hasher;
pub mod record;

pub mod prelude {
    pub use crate::archive::{parse_ndjson, parse_ndjson_strict, read_ndjson, read_ndjson_strict, ArchiveBatch};
    pub use crate::config::{engine_config_from_str, load_engine_config};
    pub use crate::record::{read_record, record_from_str};
    pub use crate::{IoError, IoResult};
}
