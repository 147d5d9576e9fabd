use std::{str::FromStr, time::Duration as StdDuration};

use chrono::Duration;
use cucumber::{given, then, when};
use gamelink_engine::{
    db_types::{
        AssignmentSource,
        Cents,
        DisputeRaisedBy,
        DisputeResolution,
        DisputeStatus,
        NewOrder,
        NewPlayer,
        OperationAction,
        OperationEntityType,
        OrderDisputeStatus,
        OrderStatusType,
    },
    helpers::Clock,
    AssignInput,
    CancelAssignInput,
    DisputeManagement,
    DisputeRequest,
    MediateInput,
    OperationLogManagement,
};

use crate::cucumber::{AssignmentSystem, GameLinkWorld};

//--------------------------------------        Given          ---------------------------------------------------------

#[given("a fresh marketplace")]
async fn fresh_marketplace(world: &mut GameLinkWorld) {
    world.system = Some(AssignmentSystem::new().await);
}

#[given(expr = "player {string} on the roster")]
async fn player_on_roster(world: &mut GameLinkWorld, nickname: String) {
    let player = NewPlayer::new(500, nickname.clone(), Cents::from_major(30));
    let player = world.api().db().insert_player(player).await.expect("Error inserting player");
    world.players.insert(nickname, player.id);
}

#[given(expr = "a {word} order {string} from user {int}")]
async fn order_from_user(world: &mut GameLinkWorld, status: String, name: String, user_id: i64) {
    let status = OrderStatusType::from_str(&status).expect("Unknown order status");
    let now = world.system().clock.now();
    let order = NewOrder::new(user_id, name.clone(), Cents::from_major(50)).with_status(status).created_at(now);
    let order = world.api().db().insert_order(order).await.expect("Error inserting order");
    world.orders.insert(name, order.id);
}

//--------------------------------------         When          ---------------------------------------------------------

#[when(expr = "{int} minute(s) pass(es)")]
async fn minutes_pass(world: &mut GameLinkWorld, minutes: i64) {
    world.system().clock.advance(Duration::minutes(minutes));
}

#[when(expr = "{int} hour(s) pass(es)")]
async fn hours_pass(world: &mut GameLinkWorld, hours: i64) {
    world.system().clock.advance(Duration::hours(hours));
}

#[when(expr = "I assign {string} to order {string}")]
async fn assign(world: &mut GameLinkWorld, player: String, order: String) {
    let input = AssignInput::new(world.player_id(&player)).by(1).with_trace_id(format!("assign-{order}"));
    let result = world.api().assign(world.order_id(&order), input).await;
    world.record(result);
}

#[when(expr = "I roll back the assignment of order {string} because {string}")]
async fn roll_back(world: &mut GameLinkWorld, order: String, reason: String) {
    let input = CancelAssignInput::new(reason).by(1).with_trace_id(format!("rollback-{order}"));
    let result = world.api().cancel_assignment(world.order_id(&order), input).await;
    world.record(result);
}

#[when(expr = "user {int} disputes order {string} because {string}")]
async fn dispute(world: &mut GameLinkWorld, user_id: i64, order: String, reason: String) {
    let request = DisputeRequest::new(DisputeRaisedBy::User, reason)
        .by(user_id)
        .with_evidence("https://img/1.png")
        .with_trace_id(format!("dispute-{order}"));
    let result = world.api().create_dispute(world.order_id(&order), request).await;
    world.record(result);
}

#[when(expr = "the mediator refunds order {string} with {int} cents")]
async fn mediate_refund(world: &mut GameLinkWorld, order: String, cents: i64) {
    let input = MediateInput::refund(Cents::from(cents))
        .with_note("refund approved")
        .by(1)
        .with_trace_id(format!("mediate-{order}"));
    let result = world.api().mediate_dispute(world.order_id(&order), input).await;
    world.record(result);
}

#[when(expr = "the mediator rejects the dispute on order {string}")]
async fn mediate_reject(world: &mut GameLinkWorld, order: String) {
    let input = MediateInput::new(DisputeResolution::Reject)
        .with_note("no evidence")
        .by(1)
        .with_trace_id(format!("mediate-{order}"));
    let result = world.api().mediate_dispute(world.order_id(&order), input).await;
    world.record(result);
}

#[when(expr = "the mediator reassigns order {string} to {string}")]
async fn mediate_reassign(world: &mut GameLinkWorld, order: String, player: String) {
    let input = MediateInput::reassign(Some(world.player_id(&player))).by(1).with_trace_id(format!("mediate-{order}"));
    let result = world.api().mediate_dispute(world.order_id(&order), input).await;
    world.record(result);
}

#[when(expr = "the mediator reassigns order {string} to nobody")]
async fn mediate_unassign(world: &mut GameLinkWorld, order: String) {
    let input = MediateInput::reassign(None).with_trace_id(format!("mediate-{order}"));
    let result = world.api().mediate_dispute(world.order_id(&order), input).await;
    world.record(result);
}

#[when("the SLA sweep runs")]
async fn sla_sweep(world: &mut GameLinkWorld) {
    let result = world.api().mark_sla_breaches().await;
    world.last_sweep = result.as_ref().ok().cloned();
    world.record(result);
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut GameLinkWorld, ms: u64) {
    tokio::time::sleep(StdDuration::from_millis(ms)).await;
}

//--------------------------------------         Then          ---------------------------------------------------------

#[then("the request succeeds")]
async fn request_succeeds(world: &mut GameLinkWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
}

#[then("the request fails validation")]
async fn request_fails_validation(world: &mut GameLinkWorld) {
    let err = world.last_error.as_ref().expect("The request should have failed");
    assert!(err.is_validation(), "Expected a validation error, got {err}");
}

#[then(expr = "the request fails because the {word} does not exist")]
async fn request_fails_not_found(world: &mut GameLinkWorld, entity: String) {
    let err = world.last_error.as_ref().expect("The request should have failed");
    assert!(err.is_not_found(), "Expected a not-found error, got {err}");
    assert!(err.to_string().to_lowercase().contains(&entity), "{err} does not mention {entity}");
}

#[then(expr = "order {string} has player {string}")]
async fn order_has_player(world: &mut GameLinkWorld, order: String, player: String) {
    assert_eq!(world.order(&order).await.player_id, Some(world.player_id(&player)));
}

#[then(expr = "order {string} has no player")]
async fn order_has_no_player(world: &mut GameLinkWorld, order: String) {
    assert!(!world.order(&order).await.has_assigned_player());
}

#[then(expr = "order {string} has assignment source {string}")]
async fn order_has_source(world: &mut GameLinkWorld, order: String, source: String) {
    let source = AssignmentSource::from_str(&source).expect("Unknown assignment source");
    assert_eq!(world.order(&order).await.assignment_source, source);
}

#[then(expr = "order {string} has status {string}")]
async fn order_has_status(world: &mut GameLinkWorld, order: String, status: String) {
    let status = OrderStatusType::from_str(&status).expect("Unknown order status");
    assert_eq!(world.order(&order).await.status, status);
}

#[then(expr = "order {string} has dispute status {string}")]
async fn order_has_dispute_status(world: &mut GameLinkWorld, order: String, status: String) {
    let status = OrderDisputeStatus::from_str(&status).expect("Unknown dispute status");
    assert_eq!(world.order(&order).await.dispute_status, status);
}

#[then(expr = "order {string} has a refund of {int} cents")]
async fn order_has_refund(world: &mut GameLinkWorld, order: String, cents: i64) {
    assert_eq!(world.order(&order).await.refund_amount, Cents::from(cents));
}

#[then(expr = "the audit trail of order {string} is {string}")]
async fn audit_trail_is(world: &mut GameLinkWorld, order: String, actions: String) {
    let expected = actions
        .split(',')
        .map(|a| OperationAction::from_str(a.trim()).expect("Unknown audit action"))
        .collect::<Vec<_>>();
    let logs = world
        .api()
        .db()
        .fetch_operation_logs(OperationEntityType::Order, world.order_id(&order))
        .await
        .expect("Error fetching audit trail");
    assert_eq!(logs.iter().map(|l| l.action).collect::<Vec<_>>(), expected);
}

#[then(expr = "the audit trail of order {string} is empty")]
async fn audit_trail_is_empty(world: &mut GameLinkWorld, order: String) {
    let logs = world
        .api()
        .db()
        .fetch_operation_logs(OperationEntityType::Order, world.order_id(&order))
        .await
        .expect("Error fetching audit trail");
    assert!(logs.is_empty(), "Expected no audit entries, found {}", logs.len());
}

#[then(expr = "every audit entry of order {string} carries trace id {string}")]
async fn audit_trace_ids(world: &mut GameLinkWorld, order: String, trace_id: String) {
    let logs = world
        .api()
        .db()
        .fetch_operation_logs(OperationEntityType::Order, world.order_id(&order))
        .await
        .expect("Error fetching audit trail");
    assert!(!logs.is_empty());
    assert!(logs.iter().all(|l| l.trace_id == trace_id));
}

#[then(expr = "the audit trace ids of order {string} are {string}")]
async fn audit_trace_id_list(world: &mut GameLinkWorld, order: String, trace_ids: String) {
    let logs = world
        .api()
        .db()
        .fetch_operation_logs(OperationEntityType::Order, world.order_id(&order))
        .await
        .expect("Error fetching audit trail");
    let actual = logs.iter().map(|l| l.trace_id.as_str()).collect::<Vec<_>>();
    let expected = trace_ids.split(',').map(str::trim).collect::<Vec<_>>();
    assert_eq!(actual, expected);
}

#[then(expr = "{int} order(s) wait(s) for a player")]
async fn pending_assignment_count(world: &mut GameLinkWorld, expected: usize) {
    let (_, count) = world.api().list_pending_assignments(1, 20).await.expect("Error listing pending assignments");
    assert_eq!(count, expected);
}

#[then(expr = "pending order {string} has {int} seconds left")]
async fn pending_order_seconds_left(world: &mut GameLinkWorld, order: String, seconds: i64) {
    let id = world.order_id(&order);
    let (items, _) = world.api().list_pending_assignments(1, 20).await.expect("Error listing pending assignments");
    let item = items.iter().find(|p| p.order.id == id).expect("Order is not waiting for a player");
    assert_eq!(item.sla_remaining_seconds, seconds);
    assert!(!item.is_overdue);
}

#[then(expr = "pending order {string} is overdue")]
async fn pending_order_overdue(world: &mut GameLinkWorld, order: String) {
    let id = world.order_id(&order);
    let (items, _) = world.api().list_pending_assignments(1, 20).await.expect("Error listing pending assignments");
    let item = items.iter().find(|p| p.order.id == id).expect("Order is not waiting for a player");
    assert!(item.is_overdue);
    assert_eq!(item.sla_remaining_seconds, 0);
}

#[then(expr = "the latest dispute on order {string} is {string}")]
async fn latest_dispute_status(world: &mut GameLinkWorld, order: String, status: String) {
    let status = DisputeStatus::from_str(&status).expect("Unknown dispute status");
    let dispute = world
        .api()
        .db()
        .fetch_latest_dispute_for_order(world.order_id(&order))
        .await
        .expect("Error fetching dispute")
        .expect("Order has no dispute");
    assert_eq!(dispute.status, status);
}

#[then(expr = "order {string} has {int} dispute(s)")]
async fn dispute_count(world: &mut GameLinkWorld, order: String, expected: usize) {
    let disputes = world.api().list_disputes(world.order_id(&order)).await.expect("Error listing disputes");
    assert_eq!(disputes.len(), expected);
}

#[then(expr = "{int} dispute(s) is/are flagged as breached")]
async fn disputes_flagged(world: &mut GameLinkWorld, expected: usize) {
    let sweep = world.last_sweep.as_ref().expect("The SLA sweep has not run");
    assert_eq!(sweep.count(), expected);
    assert!(sweep.breached.iter().all(|d| d.sla_breached));
}

#[then(expr = "user {int} receives {int} notification(s)")]
async fn user_notifications(world: &mut GameLinkWorld, user_id: i64, expected: usize) {
    let found = world.notifications_for(user_id, expected).await;
    tokio::time::sleep(StdDuration::from_millis(50)).await;
    assert_eq!(found.len(), expected);
    assert_eq!(world.notifications_for(user_id, expected).await.len(), expected);
}
