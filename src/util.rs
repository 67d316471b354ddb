use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Human-readable UTC timestamp.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Fractional unix seconds, used as a sorted-set score.
pub fn now_score() -> f64 {
    score_of(Utc::now())
}

#[allow(clippy::cast_precision_loss)]
pub fn score_of(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// Twelve hex characters of randomness.
pub fn short_uid() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}

pub fn prefixed_id(prefix: &str) -> String {
    format!("{prefix}_{}", short_uid())
}

/// `sess_{YYYYmmdd_HHMMSS}_{12 hex}`.
pub fn new_session_id() -> String {
    format!(
        "sess_{}_{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        short_uid()
    )
}
