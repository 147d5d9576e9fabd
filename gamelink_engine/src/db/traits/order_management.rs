use crate::{db::traits::OrderQueryFilter, db_types::Order};

/// The `OrderManagement` trait defines the behaviour for querying information about orders in the database backend.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    type Error: std::error::Error;

    /// Fetches the order with the given id. If no such order exists, `None` is returned.
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, Self::Error>;

    /// Fetches orders according to the criteria in `filter`, oldest first.
    ///
    /// Returns the requested page of orders along with the total number of orders matching the filter, ignoring
    /// paging.
    async fn fetch_orders(&self, filter: OrderQueryFilter) -> Result<(Vec<Order>, i64), Self::Error>;
}
