use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use gamelink_common::Cents;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

/// Gives a unit enum its canonical text form, shared by the database column, serde and log output.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    s => Err(ConversionError(format!("Invalid {}: {s}", stringify!($name)))),
                }
            }
        }
    };
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed and is waiting for a player.
    Pending,
    /// The order has been accepted and is scheduled.
    Confirmed,
    /// The play session is under way.
    InProgress,
    /// The session has finished.
    Completed,
    /// The order was cancelled by the user or an admin.
    Canceled,
    /// The order was refunded, usually as the outcome of a dispute.
    Refunded,
}

text_enum!(OrderStatusType {
    Pending => "pending",
    Confirmed => "confirmed",
    InProgress => "in_progress",
    Completed => "completed",
    Canceled => "canceled",
    Refunded => "refunded",
});

impl OrderStatusType {
    /// Terminal orders are immutable as far as assignment is concerned.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::Completed | Self::Refunded)
    }
}

//--------------------------------------   AssignmentSource    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    #[default]
    Unknown,
    Manual,
    System,
    Rollback,
}

text_enum!(AssignmentSource {
    Unknown => "unknown",
    Manual => "manual",
    System => "system",
    Rollback => "rollback",
});

//--------------------------------------  OrderDisputeStatus   ---------------------------------------------------------
/// The dispute state as mirrored on the order itself. It always tracks the latest dispute for the order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderDisputeStatus {
    #[default]
    None,
    Pending,
    InMediation,
    Resolved,
}

text_enum!(OrderDisputeStatus {
    None => "none",
    Pending => "pending",
    InMediation => "in_mediation",
    Resolved => "resolved",
});

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// The customer that placed the order
    pub user_id: i64,
    /// The player currently assigned to the order, if any
    pub player_id: Option<i64>,
    pub title: String,
    pub status: OrderStatusType,
    pub assignment_source: AssignmentSource,
    pub dispute_status: OrderDisputeStatus,
    pub price: Cents,
    pub refund_amount: Cents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Rows written by older clients use `0` rather than `NULL` for "no player", so both count as unassigned.
    pub fn has_assigned_player(&self) -> bool {
        self.player_id.is_some_and(|id| id != 0)
    }
}

/// A new order, as accepted by the order store. The engine never creates orders itself; this exists for the order
/// intake path and for seeding test databases.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub title: String,
    pub price: Cents,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NewOrder {
    pub fn new(user_id: i64, title: impl Into<String>, price: Cents) -> Self {
        Self {
            user_id,
            title: title.into(),
            price,
            status: OrderStatusType::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = status;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn completed_at(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = Some(completed_at);
        self
    }
}

//--------------------------------------        Player         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub user_id: i64,
    pub nickname: String,
    pub hourly_rate: Cents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub user_id: i64,
    pub nickname: String,
    pub hourly_rate: Cents,
}

impl NewPlayer {
    pub fn new(user_id: i64, nickname: impl Into<String>, hourly_rate: Cents) -> Self {
        Self { user_id, nickname: nickname.into(), hourly_rate }
    }
}

//--------------------------------------   DisputeRaisedBy     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DisputeRaisedBy {
    User,
    Player,
    System,
}

text_enum!(DisputeRaisedBy {
    User => "user",
    Player => "player",
    System => "system",
});

//--------------------------------------     DisputeStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Pending,
    /// Routed to a customer-service agent. Set by the case-routing desk, never by the assignment engine.
    Assigned,
    Resolved,
}

text_enum!(DisputeStatus {
    Pending => "pending",
    Assigned => "assigned",
    Resolved => "resolved",
});

//--------------------------------------   DisputeResolution   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DisputeResolution {
    #[default]
    None,
    Refund,
    Reassign,
    Reject,
}

text_enum!(DisputeResolution {
    None => "none",
    Refund => "refund",
    Reassign => "reassign",
    Reject => "reject",
});

//--------------------------------------     OrderDispute      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct OrderDispute {
    pub id: i64,
    pub order_id: i64,
    pub raised_by: DisputeRaisedBy,
    pub raised_by_user_id: Option<i64>,
    pub reason: String,
    pub evidence_urls: Json<Vec<String>>,
    pub status: DisputeStatus,
    pub resolution: DisputeResolution,
    pub resolution_note: String,
    pub refund_amount: Cents,
    pub handled_by_id: Option<i64>,
    pub handled_at: Option<DateTime<Utc>>,
    /// The time by which a mediator must respond before the dispute counts as an SLA breach
    pub response_deadline: DateTime<Utc>,
    pub sla_breached: bool,
    pub sla_breached_at: Option<DateTime<Utc>>,
    pub trace_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderDispute {
    pub fn is_resolved(&self) -> bool {
        self.status == DisputeStatus::Resolved
    }
}

#[derive(Debug, Clone)]
pub struct NewOrderDispute {
    pub order_id: i64,
    pub raised_by: DisputeRaisedBy,
    pub raised_by_user_id: Option<i64>,
    pub reason: String,
    pub evidence_urls: Vec<String>,
    pub response_deadline: DateTime<Utc>,
    pub trace_id: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     OperationLog      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OperationEntityType {
    Order,
}

text_enum!(OperationEntityType {
    Order => "order",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OperationAction {
    AssignPlayer,
    AssignRollback,
    CreateDispute,
    MediateDispute,
    SlaBreached,
}

text_enum!(OperationAction {
    AssignPlayer => "assign_player",
    AssignRollback => "assign_rollback",
    CreateDispute => "create_dispute",
    MediateDispute => "mediate_dispute",
    SlaBreached => "sla_breached",
});

/// An immutable audit record. Rows are only ever appended.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct OperationLog {
    pub id: i64,
    pub entity_type: OperationEntityType,
    pub entity_id: i64,
    pub actor_user_id: Option<i64>,
    pub action: OperationAction,
    pub metadata: Json<Value>,
    pub trace_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOperationLog {
    pub entity_type: OperationEntityType,
    pub entity_id: i64,
    pub actor_user_id: Option<i64>,
    pub action: OperationAction,
    pub metadata: Value,
    pub trace_id: String,
    pub created_at: DateTime<Utc>,
}

impl NewOperationLog {
    pub fn for_order(order_id: i64, action: OperationAction, trace_id: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            entity_type: OperationEntityType::Order,
            entity_id: order_id,
            actor_user_id: None,
            action,
            metadata: Value::Null,
            trace_id: trace_id.to_string(),
            created_at,
        }
    }

    pub fn with_actor(mut self, actor_user_id: Option<i64>) -> Self {
        self.actor_user_id = actor_user_id;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

//--------------------------------------  NotificationEvent    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
}

text_enum!(NotificationPriority {
    Low => "low",
    Normal => "normal",
    High => "high",
});

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub channel: String,
    pub priority: NotificationPriority,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub channel: String,
    pub priority: NotificationPriority,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    pub fn new(
        user_id: i64,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            channel: "web".to_string(),
            priority: NotificationPriority::default(),
            reference_type: None,
            reference_id: None,
            created_at,
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_reference(mut self, reference_type: &str, reference_id: i64) -> Self {
        self.reference_type = Some(reference_type.to_string());
        self.reference_id = Some(reference_id);
        self
    }
}
