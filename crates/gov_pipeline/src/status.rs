//! Status state machine. First matching rule wins:
//!
//! 1. cancel / delete event, or lifecycle stage `CANCELLED` → CANCELLED
//! 2. execute event → EXECUTED
//! 3. queue event → PASSED once the queue window has elapsed and there is no
//!    calldata to execute, else QUEUED
//! 4. `now < start` → PENDING
//! 5. `now < end` → ACTIVE
//! 6. mechanism outcome (optimistic veto, approval gate, standard gate)
//!
//! "now" is always a parameter; nothing here reads a clock.

use gov_core::record::RawProposalRecord;
use gov_core::{EngineConfig, Status, Timestamp};
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

/// The rule that decided a status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusRule {
    Cancelled,
    Executed,
    Queue,
    Pending,
    Active,
    Outcome,
}

pub fn is_cancelled(r: &RawProposalRecord) -> bool {
    r.cancel_event.is_some()
        || r.delete_event.is_some()
        || r
            .lifecycle_stage
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("CANCELLED"))
}

/// `""`, `"0x"`, all-zero hex and `null` carry nothing to execute.
fn is_empty_payload(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => {
            let hex = s.trim();
            let hex = hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X")).unwrap_or(hex);
            hex.chars().all(|c| c == '0')
        }
        _ => false,
    }
}

/// Whether the proposal carries on-chain calldata to execute.
pub fn has_calldata(r: &RawProposalRecord) -> bool {
    r.calldatas
        .as_ref()
        .is_some_and(|c| c.iter().any(|v| !is_empty_payload(v)))
}

fn queue_status(r: &RawProposalRecord, now: Timestamp, cfg: &EngineConfig) -> Status {
    let queued_at = r.queue_event.as_ref().and_then(|e| e.time());
    match queued_at {
        Some(t) if now.saturating_since(t) > cfg.queue_pass_window_secs && !has_calldata(r) => {
            Status::Passed
        }
        _ => Status::Queued,
    }
}

/// Rules 1–5. `None` means the vote has closed and the outcome decides.
pub fn lifecycle_status(
    r: &RawProposalRecord,
    now: Timestamp,
    cfg: &EngineConfig,
) -> Option<(Status, StatusRule)> {
    let hit = if is_cancelled(r) {
        Some((Status::Cancelled, StatusRule::Cancelled))
    } else if r.execute_event.is_some() {
        Some((Status::Executed, StatusRule::Executed))
    } else if r.queue_event.is_some() {
        Some((queue_status(r, now, cfg), StatusRule::Queue))
    } else if r.start_time().is_some_and(|s| now < s) {
        Some((Status::Pending, StatusRule::Pending))
    } else if r.end_time().is_some_and(|e| now < e) {
        Some((Status::Active, StatusRule::Active))
    } else {
        None
    };
    if let Some((status, rule)) = hit {
        trace!(id = ?r.id, ?rule, %status, "lifecycle rule");
    }
    hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> RawProposalRecord {
        serde_json::from_value(v).unwrap()
    }

    const NOW: Timestamp = Timestamp::from_secs(2_000_000);

    #[test]
    fn cancel_beats_execute() {
        let r = rec(json!({"cancel_event": {"timestamp": 1}, "execute_event": {"timestamp": 2}}));
        assert_eq!(lifecycle_status(&r, NOW, &EngineConfig::default()), Some((Status::Cancelled, StatusRule::Cancelled)));

        let staged = rec(json!({"lifecycle_stage": "cancelled", "execute_event": {}}));
        assert_eq!(lifecycle_status(&staged, NOW, &EngineConfig::default()).map(|h| h.0), Some(Status::Cancelled));

        let deleted = rec(json!({"delete_event": {"attestation_time": 5}}));
        assert!(is_cancelled(&deleted));
    }

    #[test]
    fn calldata_detection() {
        let none = rec(json!({"calldatas": ["", "0x", "0x0000", null]}));
        assert!(!has_calldata(&none));
        assert!(!has_calldata(&rec(json!({}))));
        assert!(!has_calldata(&rec(json!({"calldatas": []}))));
        assert!(has_calldata(&rec(json!({"calldatas": ["0x", "0xa9059cbb"]}))));
    }

    #[test]
    fn queue_window() {
        let cfg = EngineConfig::default();
        let window = cfg.queue_pass_window_secs;
        let queued = |t: u64, calldata: &str| {
            rec(json!({"queue_event": {"timestamp": t}, "calldatas": [calldata]}))
        };
        let old = NOW.as_secs() - window - 1;
        assert_eq!(queue_status(&queued(old, "0x"), NOW, &cfg), Status::Passed);
        assert_eq!(queue_status(&queued(old, "0xdead"), NOW, &cfg), Status::Queued);
        // exactly at the window edge is still queued
        let edge = NOW.as_secs() - window;
        assert_eq!(queue_status(&queued(edge, "0x"), NOW, &cfg), Status::Queued);
        // unknown queue time
        let no_time = rec(json!({"queue_event": {}}));
        assert_eq!(queue_status(&no_time, NOW, &cfg), Status::Queued);
        // falls back to blocktime
        let bt = rec(json!({"queue_event": {"blocktime": old}}));
        assert_eq!(queue_status(&bt, NOW, &cfg), Status::Passed);
    }

    #[test]
    fn time_windows() {
        let cfg = EngineConfig::default();
        let s = NOW.as_secs();
        let pending = rec(json!({"start_blocktime": s + 10, "end_blocktime": s + 20}));
        assert_eq!(lifecycle_status(&pending, NOW, &cfg).map(|h| h.0), Some(Status::Pending));
        let active = rec(json!({"start_blocktime": s - 10, "end_blocktime": s + 20}));
        assert_eq!(lifecycle_status(&active, NOW, &cfg).map(|h| h.0), Some(Status::Active));
        let closed = rec(json!({"start_blocktime": s - 20, "end_blocktime": s}));
        assert_eq!(lifecycle_status(&closed, NOW, &cfg), None);
        assert_eq!(lifecycle_status(&rec(json!({})), NOW, &cfg), None);
    }
}
