use crate::db_types::OrderDispute;

/// Read access to dispute history outside of a transaction.
#[allow(async_fn_in_trait)]
pub trait DisputeManagement {
    type Error: std::error::Error;

    /// All disputes ever raised against the order, newest first.
    async fn fetch_disputes_for_order(&self, order_id: i64) -> Result<Vec<OrderDispute>, Self::Error>;

    /// The most recent dispute for the order. Only this dispute is actionable.
    async fn fetch_latest_dispute_for_order(&self, order_id: i64) -> Result<Option<OrderDispute>, Self::Error>;
}
