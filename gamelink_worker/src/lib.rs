//! # GameLink worker
//!
//! The long-running companion process of the GameLink assignment engine. It hosts the event hooks that turn dispute
//! mediation outcomes into user notifications, and it runs the periodic sweep that flags disputes whose response SLA
//! has lapsed.
//!
//! [`worker::EngineRuntime`] bundles both. Hooks only fire for mediations made through its
//! [`api`](worker::EngineRuntime::api), and [`shutdown`](worker::EngineRuntime::shutdown) waits for queued
//! notification jobs before closing the database.
//!
//! Configuration comes from the environment (see [`config::WorkerConfig`]).
pub mod cli;
pub mod config;
pub mod errors;
pub mod sla_worker;
pub mod worker;
