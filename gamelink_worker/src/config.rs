use std::env;

use chrono::Duration;
use gamelink_common::{
    helpers::{parse_boolean_flag, parse_positive_int},
    Secret,
};
use gamelink_engine::EngineOptions;
use log::*;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/gamelink.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SLA_MINUTES: i64 = 30;
const DEFAULT_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);
const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub database_url: Secret<String>,
    pub max_connections: u32,
    /// Time a dispute may go unanswered before it is flagged as an SLA breach.
    pub sla: Duration,
    pub sweep_interval: std::time::Duration,
    pub event_buffer_size: usize,
    /// When false, mediation outcomes are not turned into user notifications.
    pub notifications_enabled: bool,
    pub run_migrations: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            database_url: Secret::new(DEFAULT_DATABASE_URL.to_string()),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            sla: Duration::minutes(DEFAULT_SLA_MINUTES),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            notifications_enabled: true,
            run_migrations: true,
        }
    }
}

impl WorkerConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("GL_DATABASE_URL").unwrap_or_else(|_| {
            warn!("🪛️ GL_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = configure_max_connections(env::var("GL_DB_MAX_CONNECTIONS").ok().as_deref());
        let sla = configure_sla(env::var("GL_SLA_MINUTES").ok().as_deref());
        let sweep_interval = configure_sweep_interval(env::var("GL_SLA_SWEEP_INTERVAL_SECS").ok().as_deref());
        let event_buffer_size = configure_event_buffer_size(env::var("GL_EVENT_BUFFER_SIZE").ok().as_deref());
        let notifications_enabled = parse_boolean_flag(env::var("GL_NOTIFICATIONS").ok(), true);
        if !notifications_enabled {
            warn!("🪛️ Notifications are disabled. Users will not hear about mediation outcomes.");
        }
        let run_migrations = parse_boolean_flag(env::var("GL_RUN_MIGRATIONS").ok(), true);
        Self {
            database_url: Secret::new(database_url),
            max_connections,
            sla,
            sweep_interval,
            event_buffer_size,
            notifications_enabled,
            run_migrations,
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions::default().with_sla(self.sla)
    }
}

fn configure_max_connections(value: Option<&str>) -> u32 {
    match parse_positive_int(value).and_then(|v| u32::try_from(v).ok()) {
        Some(v) => v,
        None => {
            if value.is_some() {
                warn!("🪛️ GL_DB_MAX_CONNECTIONS is not a valid pool size. Using the default, {DEFAULT_MAX_CONNECTIONS}.");
            }
            DEFAULT_MAX_CONNECTIONS
        },
    }
}

fn configure_sla(value: Option<&str>) -> Duration {
    match parse_positive_int(value).and_then(|v| i64::try_from(v).ok()) {
        Some(minutes) => {
            info!("🪛️ Dispute response SLA is {minutes} minutes");
            Duration::minutes(minutes)
        },
        None => {
            if value.is_some() {
                warn!("🪛️ GL_SLA_MINUTES must be a positive number of minutes. Using the default, {DEFAULT_SLA_MINUTES}.");
            }
            Duration::minutes(DEFAULT_SLA_MINUTES)
        },
    }
}

fn configure_sweep_interval(value: Option<&str>) -> std::time::Duration {
    match parse_positive_int(value) {
        Some(secs) => std::time::Duration::from_secs(secs),
        None => {
            if value.is_some() {
                warn!(
                    "🪛️ GL_SLA_SWEEP_INTERVAL_SECS must be a positive number of seconds. Using the default, {}s.",
                    DEFAULT_SWEEP_INTERVAL.as_secs()
                );
            }
            DEFAULT_SWEEP_INTERVAL
        },
    }
}

fn configure_event_buffer_size(value: Option<&str>) -> usize {
    match parse_positive_int(value).and_then(|v| usize::try_from(v).ok()) {
        Some(v) => v,
        None => {
            if value.is_some() {
                warn!("🪛️ GL_EVENT_BUFFER_SIZE is not a valid size. Using the default, {DEFAULT_EVENT_BUFFER_SIZE}.");
            }
            DEFAULT_EVENT_BUFFER_SIZE
        },
    }
}
