use gamelink_engine::{
    events::EventProducers,
    AssignmentApi,
    AssignmentApiError,
    DisputeManagement,
    EngineOptions,
    OrderManagement,
    PlayerManagement,
    RecommendationClient,
    SqliteDatabase,
    UnitOfWork,
};
use log::*;
use tokio::task::JoinHandle;

/// Starts the dispute SLA worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The sweep never publishes events, so its engine instance gets no hook producers.
pub fn start_sla_worker(db: SqliteDatabase, options: EngineOptions, interval: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = AssignmentApi::new(db, EventProducers::default()).with_options(options);
        info!("⏱️ Dispute SLA worker started. Sweeping every {}s", interval.as_secs_f32());
        loop {
            timer.tick().await;
            if let Err(e) = run_sla_sweep(&api).await {
                error!("⏱️ Error running the dispute SLA sweep: {e}");
            }
        }
    })
}

/// Runs a single sweep and returns the number of disputes that were newly flagged.
pub async fn run_sla_sweep<B, R>(api: &AssignmentApi<B, R>) -> Result<usize, AssignmentApiError>
where
    B: UnitOfWork + OrderManagement + PlayerManagement + DisputeManagement,
    R: RecommendationClient,
{
    trace!("⏱️ Running dispute SLA sweep");
    let result = api.mark_sla_breaches().await?;
    if result.is_empty() {
        trace!("⏱️ No disputes breached their SLA");
    } else {
        let list = result
            .breached
            .iter()
            .map(|d| format!("[{}] order #{} due {}", d.id, d.order_id, d.response_deadline))
            .collect::<Vec<String>>()
            .join(", ");
        info!("⏱️ {} disputes flagged as SLA breached: {list}", result.count());
    }
    Ok(result.count())
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use gamelink_engine::{
        db_types::{Cents, DisputeRaisedBy, NewOrder, OrderStatusType},
        helpers::ManualClock,
        test_utils::prepare_env::{prepare_test_env, random_db_path, tear_down},
        DisputeRequest,
    };

    use super::*;

    async fn open_dispute(api: &AssignmentApi<SqliteDatabase>, created_at: chrono::DateTime<Utc>) -> i64 {
        let order = NewOrder::new(7, "Placement matches", Cents::from_major(20))
            .with_status(OrderStatusType::InProgress)
            .created_at(created_at);
        let order = api.db().insert_order(order).await.expect("Error inserting order");
        let request = DisputeRequest::new(DisputeRaisedBy::User, "Player never showed up").by(7);
        api.create_dispute(order.id, request).await.expect("Error creating dispute");
        order.id
    }

    #[tokio::test]
    async fn sweep_flags_each_overdue_dispute_once() {
        let db = prepare_test_env(&random_db_path()).await;
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(t0);
        let api = AssignmentApi::new(db.clone(), EventProducers::default()).with_clock(Arc::new(clock.clone()));
        let order_id = open_dispute(&api, t0).await;

        clock.advance(Duration::minutes(30));
        assert_eq!(run_sla_sweep(&api).await.unwrap(), 0, "exactly on the deadline is not a breach");

        clock.advance(Duration::seconds(1));
        assert_eq!(run_sla_sweep(&api).await.unwrap(), 1);
        assert_eq!(run_sla_sweep(&api).await.unwrap(), 0);

        let dispute = db.fetch_latest_dispute_for_order(order_id).await.unwrap().unwrap();
        assert!(dispute.sla_breached);
        assert_eq!(dispute.sla_breached_at, Some(t0 + Duration::seconds(1801)));
        tear_down(&db).await;
    }

    #[tokio::test]
    async fn worker_sweeps_on_its_own() {
        let db = prepare_test_env(&random_db_path()).await;
        let options = EngineOptions::default().with_sla(Duration::zero());
        let api = AssignmentApi::new(db.clone(), EventProducers::default()).with_options(options);
        let order_id = open_dispute(&api, Utc::now()).await;

        let handle = start_sla_worker(db.clone(), options, std::time::Duration::from_millis(20));
        let mut flagged = false;
        for _ in 0..50 {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            let dispute = db.fetch_latest_dispute_for_order(order_id).await.unwrap().unwrap();
            if dispute.sla_breached {
                flagged = true;
                break;
            }
        }
        handle.abort();
        assert!(flagged, "the worker never flagged the overdue dispute");
        tear_down(&db).await;
    }
}
