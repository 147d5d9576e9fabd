use std::{future::Future, pin::Pin};

use log::*;

use crate::{
    db::traits::NotificationManagement,
    db_types::{DisputeResolution, NewNotification, NotificationPriority},
    events::DisputeMediatedEvent,
};

pub const ORDER_REFERENCE: &str = "order";

/// The notification the order owner receives when their dispute has been mediated.
pub fn dispute_mediated_notification(event: &DisputeMediatedEvent) -> NewNotification {
    let order = &event.order;
    let outcome = match event.resolution() {
        DisputeResolution::Refund => format!("a refund of {} has been approved", event.dispute.refund_amount),
        DisputeResolution::Reassign if order.player_id.is_some() => "a new player has been assigned".to_string(),
        DisputeResolution::Reassign => "the order is waiting for a new player".to_string(),
        DisputeResolution::Reject => "the dispute was rejected".to_string(),
        DisputeResolution::None => "no action was taken".to_string(),
    };
    let message = format!("The dispute on order #{} has been resolved: {outcome}.", order.id);
    let created_at = event.dispute.handled_at.unwrap_or(event.dispute.updated_at);
    NewNotification::new(order.user_id, "Dispute resolved", message, created_at)
        .with_priority(NotificationPriority::High)
        .with_reference(ORDER_REFERENCE, order.id)
}

/// Builds the hook that turns [`DisputeMediatedEvent`]s into notifications for the order owner. Failures are logged
/// and dropped.
pub fn notify_on_dispute_mediated<B>(
    db: B,
) -> impl Fn(DisputeMediatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static
where B: NotificationManagement + Clone + Send + Sync + 'static {
    move |event: DisputeMediatedEvent| {
        let db = db.clone();
        Box::pin(async move {
            let notification = dispute_mediated_notification(&event);
            let trace_id = event.dispute.trace_id.clone();
            match db.create_notification(notification).await {
                Ok(n) => debug!("📬️ Notification #{} sent to user #{} [{trace_id}]", n.id, n.user_id),
                Err(e) => error!("📬️ Could not notify user #{} about order #{}: {e}", event.order.user_id, event.order.id),
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use sqlx::types::Json;

    use super::*;
    use crate::db_types::{
        AssignmentSource,
        Cents,
        DisputeRaisedBy,
        DisputeStatus,
        Order,
        OrderDispute,
        OrderDisputeStatus,
        OrderStatusType,
    };

    fn event(resolution: DisputeResolution, player_id: Option<i64>) -> DisputeMediatedEvent {
        let now = Utc::now();
        let order = Order {
            id: 7,
            user_id: 42,
            player_id,
            title: "Ranked duo".into(),
            status: OrderStatusType::Refunded,
            assignment_source: AssignmentSource::Manual,
            dispute_status: OrderDisputeStatus::Resolved,
            price: Cents::from_major(50),
            refund_amount: Cents::from_major(15),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        let dispute = OrderDispute {
            id: 3,
            order_id: 7,
            raised_by: DisputeRaisedBy::User,
            raised_by_user_id: Some(42),
            reason: "no show".into(),
            evidence_urls: Json(vec![]),
            status: DisputeStatus::Resolved,
            resolution,
            resolution_note: String::new(),
            refund_amount: Cents::from_major(15),
            handled_by_id: Some(1),
            handled_at: Some(now),
            response_deadline: now,
            sla_breached: false,
            sla_breached_at: None,
            trace_id: "abc".into(),
            created_at: now,
            updated_at: now,
        };
        DisputeMediatedEvent::new(order, dispute)
    }

    #[test]
    fn refund_notification_targets_order_owner() {
        let n = dispute_mediated_notification(&event(DisputeResolution::Refund, None));
        assert_eq!(n.user_id, 42);
        assert_eq!(n.priority, NotificationPriority::High);
        assert_eq!(n.reference_type.as_deref(), Some("order"));
        assert_eq!(n.reference_id, Some(7));
        assert_eq!(n.message, "The dispute on order #7 has been resolved: a refund of 15.00 has been approved.");
    }

    #[test]
    fn notification_is_stamped_with_the_mediation_time() {
        let mut e = event(DisputeResolution::Reject, None);
        let handled = Utc::now() - chrono::Duration::days(3);
        e.dispute.handled_at = Some(handled);
        assert_eq!(dispute_mediated_notification(&e).created_at, handled);
    }

    #[test]
    fn reassign_message_depends_on_player() {
        let n = dispute_mediated_notification(&event(DisputeResolution::Reassign, Some(9)));
        assert!(n.message.ends_with("a new player has been assigned."));
        let n = dispute_mediated_notification(&event(DisputeResolution::Reassign, None));
        assert!(n.message.ends_with("the order is waiting for a new player."));
    }
}
