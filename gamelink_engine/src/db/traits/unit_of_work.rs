use chrono::{DateTime, Utc};

use crate::db_types::{NewOperationLog, NewOrderDispute, Order, OrderDispute, Player};

/// Opens one database transaction and hands out a handle bound to it. The handle implements every transaction-scoped
/// repository trait, so all reads and writes of an operation see (and produce) one consistent snapshot.
#[allow(async_fn_in_trait)]
pub trait UnitOfWork {
    type Error: std::error::Error;
    type Tx: TransactionScope<Error = Self::Error>
        + OrderRepository
        + PlayerRepository
        + DisputeRepository
        + OperationLogRepository;

    async fn begin(&self) -> Result<Self::Tx, Self::Error>;
}

/// Finishes a transaction. A handle that is dropped without calling either method is rolled back.
#[allow(async_fn_in_trait)]
pub trait TransactionScope: Sized {
    type Error: std::error::Error;

    async fn commit(self) -> Result<(), Self::Error>;

    async fn rollback(self) -> Result<(), Self::Error>;
}

#[allow(async_fn_in_trait)]
pub trait OrderRepository: TransactionScope {
    async fn order_by_id(&mut self, order_id: i64) -> Result<Option<Order>, Self::Error>;

    /// Persists the assignment-related fields of the order: player, status, assignment source, dispute status and
    /// refund amount. Other columns are owned by the order intake path and left untouched.
    async fn update_order(&mut self, order: &Order) -> Result<(), Self::Error>;
}

#[allow(async_fn_in_trait)]
pub trait PlayerRepository: TransactionScope {
    async fn player_by_id(&mut self, player_id: i64) -> Result<Option<Player>, Self::Error>;
}

#[allow(async_fn_in_trait)]
pub trait DisputeRepository: TransactionScope {
    async fn latest_dispute_for_order(&mut self, order_id: i64) -> Result<Option<OrderDispute>, Self::Error>;

    /// Stores a new dispute in `pending` status and returns the stored record.
    async fn insert_dispute(&mut self, dispute: NewOrderDispute) -> Result<OrderDispute, Self::Error>;

    /// Persists the mediation outcome of a dispute: status, resolution, note, refund and handler details.
    async fn update_dispute(&mut self, dispute: &OrderDispute) -> Result<(), Self::Error>;

    /// Disputes still waiting for a response whose deadline passed before `now`, and that have not been flagged as SLA
    /// breaches yet.
    async fn overdue_disputes(&mut self, now: DateTime<Utc>) -> Result<Vec<OrderDispute>, Self::Error>;

    /// Flags the dispute as having breached its response SLA. Returns `false` if the dispute was already flagged, so
    /// that concurrent sweeps cannot flag (and audit) the same dispute twice.
    async fn mark_sla_breached(&mut self, dispute_id: i64, at: DateTime<Utc>) -> Result<bool, Self::Error>;
}

#[allow(async_fn_in_trait)]
pub trait OperationLogRepository: TransactionScope {
    /// Appends an entry to the audit trail and returns its id.
    async fn append_operation_log(&mut self, entry: NewOperationLog) -> Result<i64, Self::Error>;
}
