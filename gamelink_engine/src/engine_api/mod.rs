//! # GameLink engine public API
//!
//! The `engine_api` module exposes the programmatic API of the assignment and dispute mediation engine. It is invoked
//! by an HTTP layer (or a worker) that lives elsewhere and translates [`AssignmentApiError`]s into responses.
//!
//! * [`assignment_api`] assigns players to orders, rolls assignments back, opens disputes and records mediation
//!   decisions. It also runs the SLA-breach sweep.
//! * [`recommendation`] is the seam for an external candidate scoring service.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits the API requires,
//! plus the event producers for post-commit hooks.
//!
//! ```rust,ignore
//! use gamelink_engine::{events::EventProducers, AssignmentApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = AssignmentApi::new(db, EventProducers::default());
//! let order = api.assign(order_id, AssignInput::new(player_id)).await?;
//! ```
pub mod assignment_api;
pub mod assignment_objects;
pub mod errors;
pub mod recommendation;
