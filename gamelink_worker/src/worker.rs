use gamelink_engine::{
    events::{notify_on_dispute_mediated, EventHandlers, EventHooks},
    AssignmentApi,
    SqliteDatabase,
};
use log::*;
use tokio::task::JoinHandle;

use crate::{config::WorkerConfig, errors::WorkerError, sla_worker::start_sla_worker};

/// Builds the event hooks for the worker. Mediation outcomes are turned into notifications unless they are disabled.
pub fn create_event_handlers(config: &WorkerConfig, db: &SqliteDatabase) -> EventHandlers {
    let mut hooks = EventHooks::default();
    if config.notifications_enabled {
        hooks.on_dispute_mediated(notify_on_dispute_mediated(db.clone()));
    }
    EventHandlers::new(config.event_buffer_size, hooks)
}

/// The running engine: an [`AssignmentApi`] wired to the event hooks, plus the background SLA sweep.
///
/// A process that serves mediation requests should do so through [`EngineRuntime::api`]. Only that instance
/// publishes to the hooks, so only mediations made through it produce notifications.
pub struct EngineRuntime {
    db: SqliteDatabase,
    api: AssignmentApi<SqliteDatabase>,
    sla_worker: JoinHandle<()>,
    hook_tasks: Vec<JoinHandle<()>>,
}

impl EngineRuntime {
    /// Opens the database named in the config, brings the schema up to date if configured to, and starts the runtime.
    pub async fn open(config: &WorkerConfig) -> Result<Self, WorkerError> {
        let db = SqliteDatabase::new_with_url(config.database_url.reveal(), config.max_connections)
            .await
            .map_err(|e| WorkerError::InitializeError(e.to_string()))?;
        if config.run_migrations {
            db.run_migrations().await?;
            info!("🚀️ Database schema is up to date");
        }
        Ok(Self::start(config, db).await)
    }

    pub async fn start(config: &WorkerConfig, db: SqliteDatabase) -> Self {
        let handlers = create_event_handlers(config, &db);
        let api = AssignmentApi::new(db.clone(), handlers.producers()).with_options(config.engine_options());
        let hook_tasks = handlers.start_handlers().await;
        let sla_worker = start_sla_worker(db.clone(), config.engine_options(), config.sweep_interval);
        Self { db, api, sla_worker, hook_tasks }
    }

    pub fn api(&self) -> &AssignmentApi<SqliteDatabase> {
        &self.api
    }

    /// Stops the sweep, lets the hooks finish the events already published, then closes the pool.
    pub async fn shutdown(self) {
        let Self { db, api, sla_worker, hook_tasks } = self;
        sla_worker.abort();
        let _ = sla_worker.await;
        // The hook tasks run until the last producer is gone.
        drop(api);
        for task in hook_tasks {
            if let Err(e) = task.await {
                warn!("🚀️ An event hook ended abnormally. {e}");
            }
        }
        db.close().await;
        info!("🚀️ Engine runtime stopped");
    }
}

/// Runs the worker until Ctrl-C is received.
pub async fn run_worker(config: WorkerConfig) -> Result<(), WorkerError> {
    let runtime = EngineRuntime::open(&config).await?;
    info!("🚀️ GameLink worker is running. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("🚀️ Shutting down");
    runtime.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use gamelink_engine::{
        db_types::{Cents, DisputeRaisedBy, NewOrder, OrderStatusType},
        test_utils::prepare_env::{prepare_test_env, random_db_path, tear_down},
        DisputeRequest,
        MediateInput,
        NotificationManagement,
    };

    use super::*;

    #[tokio::test]
    async fn notification_hook_follows_the_config() {
        let db = prepare_test_env(&random_db_path()).await;
        let enabled = WorkerConfig::default();
        assert!(create_event_handlers(&enabled, &db).on_dispute_mediated.is_some());
        assert_eq!(create_event_handlers(&enabled, &db).producers().dispute_mediated_producer.len(), 1);

        let disabled = WorkerConfig { notifications_enabled: false, ..Default::default() };
        let handlers = create_event_handlers(&disabled, &db);
        assert!(handlers.on_dispute_mediated.is_none());
        assert!(handlers.producers().is_empty());
        tear_down(&db).await;
    }

    #[tokio::test]
    async fn mediation_through_the_runtime_notifies_before_shutdown_completes() {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let runtime = EngineRuntime::start(&WorkerConfig::default(), db.clone()).await;

        let order = NewOrder::new(100, "Ranked duo", Cents::from_major(50))
            .with_status(OrderStatusType::Confirmed)
            .created_at(Utc::now());
        let order = db.insert_order(order).await.expect("Error inserting order");
        let request = DisputeRequest::new(DisputeRaisedBy::User, "no show").by(100);
        runtime.api().create_dispute(order.id, request).await.expect("Error creating dispute");
        runtime.api().mediate_dispute(order.id, MediateInput::refund(Cents::from(1500))).await.expect("Error mediating");
        runtime.shutdown().await;

        let reopened = SqliteDatabase::new_with_url(&url, 1).await.expect("Error reopening database");
        let notifications = reopened.fetch_notifications_for_user(100).await.expect("Error fetching notifications");
        assert_eq!(notifications.len(), 1);
        tear_down(&reopened).await;
    }
}
