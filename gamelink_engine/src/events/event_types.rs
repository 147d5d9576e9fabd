use crate::db_types::{DisputeResolution, Order, OrderDispute};

/// Published once a mediation decision has been committed.
#[derive(Debug, Clone, PartialEq)]
pub struct DisputeMediatedEvent {
    /// The order as it was written by the mediation transaction.
    pub order: Order,
    /// The dispute, now resolved.
    pub dispute: OrderDispute,
}

impl DisputeMediatedEvent {
    pub fn new(order: Order, dispute: OrderDispute) -> Self {
        Self { order, dispute }
    }

    pub fn resolution(&self) -> DisputeResolution {
        self.dispute.resolution
    }
}
