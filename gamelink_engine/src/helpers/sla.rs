//! Response-time bookkeeping. Everything here is pure: the caller supplies "now".
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_SLA_MINUTES: i64 = 30;
pub const DISPUTE_WINDOW_HOURS: i64 = 24;

pub fn default_sla() -> Duration {
    Duration::minutes(DEFAULT_SLA_MINUTES)
}

pub fn dispute_window() -> Duration {
    Duration::hours(DISPUTE_WINDOW_HOURS)
}

pub fn sla_deadline(start: DateTime<Utc>, sla: Duration) -> DateTime<Utc> {
    start + sla
}

/// Time left until the deadline. Never negative.
pub fn sla_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (deadline - now).max(Duration::zero())
}

/// Strictly after the deadline. At the deadline itself the SLA still holds.
pub fn is_overdue(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > deadline
}

/// A dispute may be raised within the window after the order was placed, or within the window after it was completed.
pub fn dispute_window_open(
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    if now - created_at <= window {
        return true;
    }
    completed_at.is_some_and(|completed| now - completed <= window)
}
