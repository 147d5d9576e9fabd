use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{AssignmentSource, Cents, DisputeRaisedBy, DisputeResolution, Order, OrderDispute, Player},
    engine_api::recommendation::CandidateRecommendation,
    helpers::sla,
};

pub const DEFAULT_CANDIDATE_LIMIT: usize = 10;

/// Tunables of the engine. The defaults are a 30 minute SLA, a 24 hour dispute window and 10 roster candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub sla: Duration,
    pub dispute_window: Duration,
    pub candidate_limit: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { sla: sla::default_sla(), dispute_window: sla::dispute_window(), candidate_limit: DEFAULT_CANDIDATE_LIMIT }
    }
}

impl EngineOptions {
    pub fn with_sla(mut self, sla: Duration) -> Self {
        self.sla = sla;
        self
    }

    pub fn with_dispute_window(mut self, window: Duration) -> Self {
        self.dispute_window = window;
        self
    }

    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit;
        self
    }
}

//--------------------------------------   PendingAssignment   ---------------------------------------------------------
/// An unassigned order annotated with its assignment SLA.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingAssignment {
    #[serde(flatten)]
    pub order: Order,
    pub sla_deadline: DateTime<Utc>,
    pub sla_remaining_seconds: i64,
    pub is_overdue: bool,
}

impl PendingAssignment {
    pub fn new(order: Order, sla: Duration, now: DateTime<Utc>) -> Self {
        let sla_deadline = sla::sla_deadline(order.created_at, sla);
        let sla_remaining_seconds = sla::sla_remaining(sla_deadline, now).num_seconds();
        let is_overdue = sla::is_overdue(sla_deadline, now);
        Self { order, sla_deadline, sla_remaining_seconds, is_overdue }
    }
}

//--------------------------------------       Candidate       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Roster,
    Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub player_id: i64,
    pub nickname: String,
    /// Only known for roster candidates.
    pub hourly_rate: Option<Cents>,
    pub score: f64,
    pub source: CandidateSource,
    pub reason: Option<String>,
}

impl From<Player> for Candidate {
    fn from(player: Player) -> Self {
        Self {
            player_id: player.id,
            nickname: player.nickname,
            hourly_rate: Some(player.hourly_rate),
            score: 0.0,
            source: CandidateSource::Roster,
            reason: None,
        }
    }
}

impl From<CandidateRecommendation> for Candidate {
    fn from(rec: CandidateRecommendation) -> Self {
        Self {
            player_id: rec.player_id,
            nickname: rec.nickname,
            hourly_rate: None,
            score: rec.score,
            source: CandidateSource::Recommendation,
            reason: Some(rec.reason),
        }
    }
}

//--------------------------------------        Inputs         ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignInput {
    pub player_id: i64,
    /// `Unknown` is treated as `Manual`.
    #[serde(default)]
    pub source: AssignmentSource,
    pub actor_user_id: Option<i64>,
    /// Correlates the audit entry with the caller's request. Generated when blank.
    #[serde(default)]
    pub trace_id: String,
}

impl AssignInput {
    pub fn new(player_id: i64) -> Self {
        Self { player_id, ..Default::default() }
    }

    pub fn with_source(mut self, source: AssignmentSource) -> Self {
        self.source = source;
        self
    }

    pub fn by(mut self, actor_user_id: i64) -> Self {
        self.actor_user_id = Some(actor_user_id);
        self
    }

    pub fn with_trace_id<S: Into<String>>(mut self, trace_id: S) -> Self {
        self.trace_id = trace_id.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelAssignInput {
    #[serde(default)]
    pub reason: String,
    pub actor_user_id: Option<i64>,
    #[serde(default)]
    pub trace_id: String,
}

impl CancelAssignInput {
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self { reason: reason.into(), ..Default::default() }
    }

    pub fn by(mut self, actor_user_id: i64) -> Self {
        self.actor_user_id = Some(actor_user_id);
        self
    }

    pub fn with_trace_id<S: Into<String>>(mut self, trace_id: S) -> Self {
        self.trace_id = trace_id.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeRequest {
    pub raised_by: DisputeRaisedBy,
    pub raised_by_user_id: Option<i64>,
    pub reason: String,
    #[serde(default)]
    pub evidence_urls: Vec<String>,
    #[serde(default)]
    pub trace_id: String,
}

impl DisputeRequest {
    pub fn new<S: Into<String>>(raised_by: DisputeRaisedBy, reason: S) -> Self {
        Self { raised_by, raised_by_user_id: None, reason: reason.into(), evidence_urls: Vec::new(), trace_id: String::new() }
    }

    pub fn by(mut self, user_id: i64) -> Self {
        self.raised_by_user_id = Some(user_id);
        self
    }

    pub fn with_evidence<S: Into<String>>(mut self, url: S) -> Self {
        self.evidence_urls.push(url.into());
        self
    }

    pub fn with_trace_id<S: Into<String>>(mut self, trace_id: S) -> Self {
        self.trace_id = trace_id.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediateInput {
    pub resolution: DisputeResolution,
    #[serde(default)]
    pub note: String,
    pub refund_amount: Option<Cents>,
    /// Only used by `reassign`. `None` (or 0) unassigns the order instead.
    pub reassign_player_id: Option<i64>,
    pub actor_user_id: Option<i64>,
    #[serde(default)]
    pub trace_id: String,
}

impl MediateInput {
    pub fn new(resolution: DisputeResolution) -> Self {
        Self { resolution, ..Default::default() }
    }

    pub fn refund(amount: Cents) -> Self {
        Self { resolution: DisputeResolution::Refund, refund_amount: Some(amount), ..Default::default() }
    }

    pub fn reassign(player_id: Option<i64>) -> Self {
        Self { resolution: DisputeResolution::Reassign, reassign_player_id: player_id, ..Default::default() }
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = note.into();
        self
    }

    pub fn by(mut self, actor_user_id: i64) -> Self {
        self.actor_user_id = Some(actor_user_id);
        self
    }

    pub fn with_trace_id<S: Into<String>>(mut self, trace_id: S) -> Self {
        self.trace_id = trace_id.into();
        self
    }
}

//--------------------------------------        Results        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediationResult {
    pub order: Order,
    pub dispute: OrderDispute,
}

/// Disputes flagged by one run of the SLA sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlaSweepResult {
    pub breached: Vec<OrderDispute>,
}

impl SlaSweepResult {
    pub fn count(&self) -> usize {
        self.breached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breached.is_empty()
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;
    use crate::db_types::{OrderDisputeStatus, OrderStatusType};

    fn order_created_at(created_at: DateTime<Utc>) -> Order {
        Order {
            id: 1,
            user_id: 10,
            player_id: None,
            title: "Coaching".into(),
            status: OrderStatusType::Pending,
            assignment_source: AssignmentSource::Unknown,
            dispute_status: OrderDisputeStatus::None,
            price: Cents::from_major(20),
            refund_amount: Cents::default(),
            created_at,
            updated_at: created_at,
            completed_at: None,
        }
    }

    #[test]
    fn fresh_order_has_full_sla() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let p = PendingAssignment::new(order_created_at(now), sla::default_sla(), now);
        assert_eq!(p.sla_remaining_seconds, 30 * 60);
        assert!(!p.is_overdue);
    }

    #[test]
    fn old_order_is_overdue_with_no_time_left() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let p = PendingAssignment::new(order_created_at(now - Duration::minutes(45)), sla::default_sla(), now);
        assert_eq!(p.sla_remaining_seconds, 0);
        assert!(p.is_overdue);
        assert_eq!(p.sla_deadline, now - Duration::minutes(15));
    }

    #[test]
    fn pending_assignment_serializes_flat() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let p = PendingAssignment::new(order_created_at(now), sla::default_sla(), now);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["is_overdue"], false);
    }
}
