use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Utc};
use log::*;
use serde_json::json;

use crate::{
    db::traits::{
        DisputeManagement,
        DisputeRepository,
        OperationLogRepository,
        OrderManagement,
        OrderQueryFilter,
        OrderRepository,
        Page,
        PlayerManagement,
        PlayerRepository,
        TransactionScope,
        UnitOfWork,
    },
    db_types::{
        AssignmentSource,
        DisputeResolution,
        DisputeStatus,
        NewOperationLog,
        NewOrderDispute,
        OperationAction,
        Order,
        OrderDispute,
        OrderDisputeStatus,
        OrderStatusType,
    },
    engine_api::{
        assignment_objects::{
            AssignInput,
            CancelAssignInput,
            Candidate,
            DisputeRequest,
            EngineOptions,
            MediateInput,
            MediationResult,
            PendingAssignment,
            SlaSweepResult,
        },
        errors::{db_error, AssignmentApiError},
        recommendation::{NoRecommender, RecommendationClient},
    },
    events::{DisputeMediatedEvent, EventProducers},
    helpers::{ensure_trace_id, sla, Clock, SystemClock},
};

/// `AssignmentApi` is the order assignment and dispute mediation engine.
///
/// Every mutating method runs inside exactly one unit of work obtained from the backend: it re-reads the rows it
/// needs, validates, writes its changes plus one audit entry, and commits. If anything fails the transaction is rolled
/// back and nothing is persisted. Side effects that must not influence the outcome (notifications) are published to
/// the event hooks only after the commit.
pub struct AssignmentApi<B, R = NoRecommender> {
    db: B,
    producers: EventProducers,
    clock: Arc<dyn Clock>,
    options: EngineOptions,
    recommender: Option<R>,
}

impl<B, R> Debug for AssignmentApi<B, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AssignmentApi ({:?})", self.options)
    }
}

impl<B> AssignmentApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, clock: Arc::new(SystemClock), options: EngineOptions::default(), recommender: None }
    }
}

impl<B, R> AssignmentApi<B, R> {
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_recommender<R2: RecommendationClient>(self, recommender: R2) -> AssignmentApi<B, R2> {
        AssignmentApi {
            db: self.db,
            producers: self.producers,
            clock: self.clock,
            options: self.options,
            recommender: Some(recommender),
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }
}

impl<B, R> AssignmentApi<B, R>
where
    B: UnitOfWork + OrderManagement + PlayerManagement + DisputeManagement,
    R: RecommendationClient,
{
    /// Orders that are waiting for a player, annotated with their assignment SLA.
    ///
    /// Orders in `pending` or `confirmed` status are loaded page by page, and any that already carry a player are
    /// dropped. The second element of the result is the number of orders returned, which can be less than the page
    /// size even when more pages exist.
    pub async fn list_pending_assignments(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<PendingAssignment>, usize), AssignmentApiError> {
        let query = OrderQueryFilter::default()
            .with_status(OrderStatusType::Pending)
            .with_status(OrderStatusType::Confirmed)
            .with_page(Page::new(page, page_size));
        let (orders, total) = self.db.fetch_orders(query).await.map_err(db_error)?;
        let now = self.clock.now();
        let pending = orders
            .into_iter()
            .filter(|o| !o.has_assigned_player())
            .map(|o| PendingAssignment::new(o, self.options.sla, now))
            .collect::<Vec<_>>();
        let count = pending.len();
        trace!("🧭️ {count} of {total} open orders are waiting for a player");
        Ok((pending, count))
    }

    /// Players who could take the order. Roster players come first (score 0), followed by whatever the recommendation
    /// service suggests. A `limit` of zero uses the configured default.
    pub async fn list_candidates(&self, order_id: i64, limit: usize) -> Result<Vec<Candidate>, AssignmentApiError> {
        let order = self.db.fetch_order(order_id).await.map_err(db_error)?.ok_or(AssignmentApiError::OrderNotFound)?;
        let limit = if limit == 0 { self.options.candidate_limit } else { limit };
        let page = Page::new(1, i64::try_from(limit).unwrap_or(i64::MAX));
        let (players, _) = self.db.fetch_players(page).await.map_err(db_error)?;
        let mut candidates = players.into_iter().map(Candidate::from).collect::<Vec<_>>();
        if let Some(recommender) = &self.recommender {
            match recommender.recommend(&order).await {
                Ok(recommendations) => {
                    trace!("🧭️ {} recommended players for order #{order_id}", recommendations.len());
                    candidates.extend(recommendations.into_iter().map(Candidate::from));
                },
                Err(e) => warn!("🧭️ Recommendation lookup for order #{order_id} failed. Using the roster only. {e}"),
            }
        }
        Ok(candidates)
    }

    /// All disputes raised against the order, newest first.
    pub async fn list_disputes(&self, order_id: i64) -> Result<Vec<OrderDispute>, AssignmentApiError> {
        self.db.fetch_order(order_id).await.map_err(db_error)?.ok_or(AssignmentApiError::OrderNotFound)?;
        self.db.fetch_disputes_for_order(order_id).await.map_err(db_error)
    }

    /// Assigns a player to the order.
    ///
    /// Terminal orders cannot be assigned. If the order has a pending dispute, the dispute moves to `in_mediation`,
    /// since someone is now actively handling it.
    pub async fn assign(&self, order_id: i64, input: AssignInput) -> Result<Order, AssignmentApiError> {
        if input.player_id <= 0 {
            return Err(AssignmentApiError::validation("A player id is required"));
        }
        let source = match input.source {
            AssignmentSource::Unknown => AssignmentSource::Manual,
            s => s,
        };
        let trace_id = ensure_trace_id(&input.trace_id);
        let now = self.clock.now();
        let mut tx = self.db.begin().await.map_err(db_error)?;
        let result = self.assign_in_tx(&mut tx, order_id, &input, source, &trace_id, now).await;
        let order = finish(tx, result, &trace_id).await?;
        info!("🧭️ Order #{order_id} assigned to player #{} ({source}) [{trace_id}]", input.player_id);
        Ok(order)
    }

    async fn assign_in_tx(
        &self,
        tx: &mut B::Tx,
        order_id: i64,
        input: &AssignInput,
        source: AssignmentSource,
        trace_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Order, AssignmentApiError> {
        let mut order = load_order(tx, order_id).await?;
        if order.status.is_terminal() {
            return Err(AssignmentApiError::Validation(format!(
                "Order #{order_id} is {} and can no longer be assigned",
                order.status
            )));
        }
        tx.player_by_id(input.player_id).await.map_err(db_error)?.ok_or(AssignmentApiError::PlayerNotFound)?;
        order.player_id = Some(input.player_id);
        order.assignment_source = source;
        if order.dispute_status == OrderDisputeStatus::Pending {
            debug!("🧭️ Order #{order_id} has a pending dispute. Moving it into mediation.");
            order.dispute_status = OrderDisputeStatus::InMediation;
        }
        order.updated_at = now;
        tx.update_order(&order).await.map_err(db_error)?;
        let entry = NewOperationLog::for_order(order_id, OperationAction::AssignPlayer, trace_id, now)
            .with_actor(input.actor_user_id)
            .with_metadata(json!({ "player_id": input.player_id, "source": source }));
        tx.append_operation_log(entry).await.map_err(db_error)?;
        Ok(order)
    }

    /// Removes the player from the order, whatever state the order is in.
    pub async fn cancel_assignment(&self, order_id: i64, input: CancelAssignInput) -> Result<Order, AssignmentApiError> {
        let trace_id = ensure_trace_id(&input.trace_id);
        let now = self.clock.now();
        let mut tx = self.db.begin().await.map_err(db_error)?;
        let result = self.cancel_in_tx(&mut tx, order_id, &input, &trace_id, now).await;
        let order = finish(tx, result, &trace_id).await?;
        info!("🧭️ Assignment of order #{order_id} rolled back. Reason: {} [{trace_id}]", input.reason);
        Ok(order)
    }

    async fn cancel_in_tx(
        &self,
        tx: &mut B::Tx,
        order_id: i64,
        input: &CancelAssignInput,
        trace_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Order, AssignmentApiError> {
        let mut order = load_order(tx, order_id).await?;
        order.player_id = None;
        order.assignment_source = AssignmentSource::Rollback;
        order.updated_at = now;
        tx.update_order(&order).await.map_err(db_error)?;
        let entry = NewOperationLog::for_order(order_id, OperationAction::AssignRollback, trace_id, now)
            .with_actor(input.actor_user_id)
            .with_metadata(json!({ "reason": input.reason }));
        tx.append_operation_log(entry).await.map_err(db_error)?;
        Ok(order)
    }

    /// Opens a dispute on the order.
    ///
    /// Disputes can be raised within the dispute window (24 hours by default) of the order being placed or of it being
    /// completed. The dispute must be answered within the SLA.
    pub async fn create_dispute(
        &self,
        order_id: i64,
        request: DisputeRequest,
    ) -> Result<OrderDispute, AssignmentApiError> {
        let trace_id = ensure_trace_id(&request.trace_id);
        let now = self.clock.now();
        let mut tx = self.db.begin().await.map_err(db_error)?;
        let result = self.create_dispute_in_tx(&mut tx, order_id, request, &trace_id, now).await;
        let dispute = finish(tx, result, &trace_id).await?;
        info!(
            "🧭️ Dispute #{} opened on order #{order_id} by {}. Response due by {} [{trace_id}]",
            dispute.id, dispute.raised_by, dispute.response_deadline
        );
        Ok(dispute)
    }

    async fn create_dispute_in_tx(
        &self,
        tx: &mut B::Tx,
        order_id: i64,
        request: DisputeRequest,
        trace_id: &str,
        now: DateTime<Utc>,
    ) -> Result<OrderDispute, AssignmentApiError> {
        let mut order = load_order(tx, order_id).await?;
        if !sla::dispute_window_open(order.created_at, order.completed_at, now, self.options.dispute_window) {
            return Err(AssignmentApiError::Validation(format!(
                "The dispute window for order #{order_id} has closed"
            )));
        }
        let actor = request.raised_by_user_id;
        let new_dispute = NewOrderDispute {
            order_id,
            raised_by: request.raised_by,
            raised_by_user_id: request.raised_by_user_id,
            reason: request.reason,
            evidence_urls: request.evidence_urls,
            response_deadline: sla::sla_deadline(now, self.options.sla),
            trace_id: trace_id.to_string(),
            created_at: now,
        };
        let dispute = tx.insert_dispute(new_dispute).await.map_err(db_error)?;
        order.dispute_status = OrderDisputeStatus::Pending;
        order.updated_at = now;
        tx.update_order(&order).await.map_err(db_error)?;
        let entry = NewOperationLog::for_order(order_id, OperationAction::CreateDispute, trace_id, now)
            .with_actor(actor)
            .with_metadata(json!({
                "dispute_id": dispute.id,
                "raised_by": dispute.raised_by,
                "reason": dispute.reason,
                "evidence_count": dispute.evidence_urls.len(),
            }));
        tx.append_operation_log(entry).await.map_err(db_error)?;
        Ok(dispute)
    }

    /// Records the mediator's decision on the latest dispute of the order.
    ///
    /// * `refund` refunds the order (with the given amount, if any).
    /// * `reassign` hands the order to another player, or puts it back in the queue if no player is given.
    /// * `reject` closes the dispute and leaves the order alone.
    ///
    /// A dispute can only be resolved once. After the commit, a [`DisputeMediatedEvent`] is published so that the
    /// order owner can be notified.
    pub async fn mediate_dispute(
        &self,
        order_id: i64,
        input: MediateInput,
    ) -> Result<MediationResult, AssignmentApiError> {
        if input.resolution == DisputeResolution::None {
            return Err(AssignmentApiError::validation("A resolution is required"));
        }
        if input.refund_amount.is_some_and(|r| r.value() < 0) {
            return Err(AssignmentApiError::validation("The refund amount cannot be negative"));
        }
        let trace_id = ensure_trace_id(&input.trace_id);
        let now = self.clock.now();
        let mut tx = self.db.begin().await.map_err(db_error)?;
        let result = self.mediate_in_tx(&mut tx, order_id, &input, &trace_id, now).await;
        let outcome = finish(tx, result, &trace_id).await?;
        info!(
            "🧭️ Dispute #{} on order #{order_id} resolved: {}. Order is now {} [{trace_id}]",
            outcome.dispute.id, outcome.dispute.resolution, outcome.order.status
        );
        self.publish_dispute_mediated(&outcome);
        Ok(outcome)
    }

    async fn mediate_in_tx(
        &self,
        tx: &mut B::Tx,
        order_id: i64,
        input: &MediateInput,
        trace_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MediationResult, AssignmentApiError> {
        let mut order = load_order(tx, order_id).await?;
        let mut dispute =
            tx.latest_dispute_for_order(order_id).await.map_err(db_error)?.ok_or(AssignmentApiError::DisputeNotFound)?;
        if dispute.is_resolved() {
            return Err(AssignmentApiError::Validation(format!("Dispute #{} has already been resolved", dispute.id)));
        }
        dispute.status = DisputeStatus::Resolved;
        dispute.resolution = input.resolution;
        dispute.resolution_note = input.note.clone();
        dispute.handled_by_id = input.actor_user_id;
        dispute.handled_at = Some(now);
        dispute.updated_at = now;
        if let Some(amount) = input.refund_amount {
            dispute.refund_amount = amount;
        }
        match input.resolution {
            DisputeResolution::Refund => {
                if let Some(amount) = input.refund_amount {
                    order.refund_amount = amount;
                }
                order.status = OrderStatusType::Refunded;
            },
            DisputeResolution::Reassign => match input.reassign_player_id.filter(|id| *id > 0) {
                Some(player_id) => {
                    tx.player_by_id(player_id).await.map_err(db_error)?.ok_or(AssignmentApiError::PlayerNotFound)?;
                    order.player_id = Some(player_id);
                    order.assignment_source = AssignmentSource::Manual;
                    order.status = OrderStatusType::Confirmed;
                },
                None => {
                    order.player_id = None;
                    order.assignment_source = AssignmentSource::Rollback;
                    order.status = OrderStatusType::Pending;
                },
            },
            DisputeResolution::Reject | DisputeResolution::None => {},
        }
        order.dispute_status = OrderDisputeStatus::Resolved;
        order.updated_at = now;
        tx.update_dispute(&dispute).await.map_err(db_error)?;
        tx.update_order(&order).await.map_err(db_error)?;
        let entry = NewOperationLog::for_order(order_id, OperationAction::MediateDispute, trace_id, now)
            .with_actor(input.actor_user_id)
            .with_metadata(json!({
                "dispute_id": dispute.id,
                "resolution": input.resolution,
                "note": input.note,
                "refund": input.refund_amount,
                "reassign_player_id": input.reassign_player_id,
            }));
        tx.append_operation_log(entry).await.map_err(db_error)?;
        Ok(MediationResult { order, dispute })
    }

    /// Flags every pending dispute whose response deadline has passed.
    ///
    /// Each newly flagged dispute gets one `sla_breached` audit entry carrying the dispute's trace id. Disputes that
    /// were flagged before are skipped, so running the sweep repeatedly is harmless.
    pub async fn mark_sla_breaches(&self) -> Result<SlaSweepResult, AssignmentApiError> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await.map_err(db_error)?;
        let result = self.mark_sla_breaches_in_tx(&mut tx, now).await;
        let breached = finish(tx, result, "sla-sweep").await?;
        if !breached.is_empty() {
            info!("🧭️ {} disputes have breached their response SLA", breached.len());
        }
        Ok(SlaSweepResult { breached })
    }

    async fn mark_sla_breaches_in_tx(
        &self,
        tx: &mut B::Tx,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderDispute>, AssignmentApiError> {
        let overdue = tx.overdue_disputes(now).await.map_err(db_error)?;
        let mut breached = Vec::new();
        for mut dispute in overdue {
            if !tx.mark_sla_breached(dispute.id, now).await.map_err(db_error)? {
                continue;
            }
            dispute.sla_breached = true;
            dispute.sla_breached_at = Some(now);
            dispute.updated_at = now;
            let overdue_by = now - dispute.response_deadline;
            let entry = NewOperationLog::for_order(dispute.order_id, OperationAction::SlaBreached, &dispute.trace_id, now)
                .with_metadata(json!({
                    "dispute_id": dispute.id,
                    "response_deadline": dispute.response_deadline,
                    "overdue_seconds": overdue_by.num_seconds(),
                }));
            tx.append_operation_log(entry).await.map_err(db_error)?;
            debug!("🧭️ Dispute #{} on order #{} is overdue by {overdue_by}", dispute.id, dispute.order_id);
            breached.push(dispute);
        }
        Ok(breached)
    }

    fn publish_dispute_mediated(&self, outcome: &MediationResult) {
        for producer in &self.producers.dispute_mediated_producer {
            let event = DisputeMediatedEvent::new(outcome.order.clone(), outcome.dispute.clone());
            let producer = producer.clone();
            debug!("🧭️ Notifying dispute mediation hook subscribers");
            tokio::spawn(async move {
                producer.publish_event(event).await;
            });
        }
    }
}

async fn load_order<Tx: OrderRepository>(tx: &mut Tx, order_id: i64) -> Result<Order, AssignmentApiError> {
    tx.order_by_id(order_id).await.map_err(db_error)?.ok_or(AssignmentApiError::OrderNotFound)
}

/// Commits the transaction if the operation succeeded, otherwise rolls it back and hands back the original error.
async fn finish<T, Tx: TransactionScope>(
    tx: Tx,
    result: Result<T, AssignmentApiError>,
    trace_id: &str,
) -> Result<T, AssignmentApiError> {
    match result {
        Ok(value) => {
            tx.commit().await.map_err(db_error)?;
            Ok(value)
        },
        Err(e) => {
            debug!("🧭️ Operation failed, rolling back. {e} [{trace_id}]");
            if let Err(rollback_err) = tx.rollback().await {
                warn!("🧭️ Rollback failed: {rollback_err} [{trace_id}]");
            }
            Err(e)
        },
    }
}
