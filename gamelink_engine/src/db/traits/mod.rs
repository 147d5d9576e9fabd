//! #  Database management and control.
//!
//! This module defines the interface contracts that database *backends* must honour to support the assignment engine.
//!
//! There are two flavours of trait here.
//!
//! Pool-level traits run a single query on a pooled connection. The engine only uses them for read paths that do not
//! need transactional consistency (listing pending orders, candidates and dispute history).
//! * [`OrderManagement`] queries orders.
//! * [`PlayerManagement`] queries the player roster.
//! * [`DisputeManagement`] queries dispute history.
//! * [`OperationLogManagement`] reads the audit trail. The engine itself never reads it.
//! * [`NotificationManagement`] is the notification sink. Its futures are `Send` so that it can be driven from event
//!   hook tasks.
//!
//! Transaction-scoped traits are implemented by the handle returned from [`UnitOfWork::begin`]. Every mutating engine
//! operation opens exactly one such handle, does all of its reads and writes through it, and then commits. Dropping a
//! handle without committing rolls the transaction back.
//! * [`TransactionScope`] finishes the transaction.
//! * [`OrderRepository`], [`PlayerRepository`], [`DisputeRepository`] and [`OperationLogRepository`] are the
//!   repository handles bound to the open transaction.
mod data_objects;
mod dispute_management;
mod notification_management;
mod operation_log_management;
mod order_management;
mod player_management;
mod unit_of_work;

pub use data_objects::{OrderQueryFilter, Page, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use dispute_management::DisputeManagement;
pub use notification_management::NotificationManagement;
pub use operation_log_management::OperationLogManagement;
pub use order_management::OrderManagement;
pub use player_management::PlayerManagement;
pub use unit_of_work::{
    DisputeRepository,
    OperationLogRepository,
    OrderRepository,
    PlayerRepository,
    TransactionScope,
    UnitOfWork,
};
