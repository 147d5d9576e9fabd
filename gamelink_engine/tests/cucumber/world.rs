use std::{collections::HashMap, sync::Arc, time::Duration};

use cucumber::World;
use gamelink_engine::{
    db_types::{NotificationEvent, Order},
    events::{notify_on_dispute_mediated, EventHandlers, EventHooks},
    helpers::ManualClock,
    AssignmentApi,
    AssignmentApiError,
    NotificationManagement,
    OrderManagement,
    SlaSweepResult,
    SqliteDatabase,
};
use log::*;

use crate::support::prepare_env::{prepare_test_env, random_db_path};

#[derive(Debug, Default, World)]
pub struct GameLinkWorld {
    pub system: Option<AssignmentSystem>,
    /// Scenario names of orders and players, mapped to their database ids.
    pub orders: HashMap<String, i64>,
    pub players: HashMap<String, i64>,
    pub last_error: Option<AssignmentApiError>,
    pub last_sweep: Option<SlaSweepResult>,
}

#[derive(Debug)]
pub struct AssignmentSystem {
    pub db_path: String,
    pub api: AssignmentApi<SqliteDatabase>,
    pub clock: ManualClock,
}

impl AssignmentSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("🚀️ Created database: {db_path}");
        let clock = ManualClock::default();
        let mut hooks = EventHooks::default();
        hooks.on_dispute_mediated(notify_on_dispute_mediated(db.clone()));
        let handlers = EventHandlers::new(8, hooks);
        let api = AssignmentApi::new(db, handlers.producers()).with_clock(Arc::new(clock.clone()));
        handlers.start_handlers().await;
        Self { db_path, api, clock }
    }
}

impl GameLinkWorld {
    pub fn system(&self) -> &AssignmentSystem {
        self.system.as_ref().expect("The marketplace has not been set up")
    }

    pub fn api(&self) -> &AssignmentApi<SqliteDatabase> {
        &self.system().api
    }

    pub fn order_id(&self, name: &str) -> i64 {
        *self.orders.get(name).unwrap_or_else(|| panic!("Unknown order {name}"))
    }

    pub fn player_id(&self, name: &str) -> i64 {
        *self.players.get(name).unwrap_or_else(|| panic!("Unknown player {name}"))
    }

    pub async fn order(&self, name: &str) -> Order {
        let id = self.order_id(name);
        self.api().db().fetch_order(id).await.expect("Error fetching order").expect("Order has gone missing")
    }

    pub fn record<T>(&mut self, result: Result<T, AssignmentApiError>) {
        self.last_error = result.err();
        if let Some(e) = &self.last_error {
            debug!("🚀️ Request failed: {e}");
        }
    }

    /// Notifications are written by a hook task, so give it a moment to catch up.
    pub async fn notifications_for(&self, user_id: i64, expected: usize) -> Vec<NotificationEvent> {
        let db = self.api().db();
        let mut found = Vec::new();
        for _ in 0..50 {
            found = db.fetch_notifications_for_user(user_id).await.expect("Error fetching notifications");
            if found.len() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        found
    }
}
