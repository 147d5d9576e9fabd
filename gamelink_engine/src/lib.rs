//! GameLink Assignment Engine
//!
//! The assignment engine is the part of the GameLink marketplace backend that puts a player on an order, keeps track
//! of the response SLA, lets users and players raise disputes about an order, and lets a mediator settle them. Every
//! state change is transactional and leaves an audit trail.
//!
//! The library is divided into these sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. The traits in
//!    [`db::traits`] describe what a backend must provide, including a unit of work that hands out
//!    transaction-scoped repositories. The data types stored in the database are defined in [`db_types`].
//! 2. The engine public API ([`mod@engine_api`]), chiefly [`AssignmentApi`].
//! 3. Post-commit events ([`mod@events`]). Hooks subscribe to events such as [`events::DisputeMediatedEvent`] and
//!    run on their own tasks, so they can never affect the outcome of the operation that emitted them.
//! 4. Helpers ([`mod@helpers`]): the injectable [`helpers::Clock`], SLA arithmetic and trace ids.
pub mod db;

pub mod db_types;
pub mod engine_api;
pub mod events;
pub mod helpers;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{
    DisputeManagement,
    NotificationManagement,
    OperationLogManagement,
    OrderManagement,
    PlayerManagement,
    UnitOfWork,
};
pub use engine_api::{
    assignment_api::AssignmentApi,
    assignment_objects::{
        AssignInput,
        CancelAssignInput,
        Candidate,
        CandidateSource,
        DisputeRequest,
        EngineOptions,
        MediateInput,
        MediationResult,
        PendingAssignment,
        SlaSweepResult,
    },
    errors::AssignmentApiError,
    recommendation::{CandidateRecommendation, NoRecommender, RecommendationClient},
};
