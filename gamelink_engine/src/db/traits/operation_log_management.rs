use crate::db_types::{OperationEntityType, OperationLog};

/// Read access to the audit trail, for auditors and dashboards.
#[allow(async_fn_in_trait)]
pub trait OperationLogManagement {
    type Error: std::error::Error;

    /// All audit entries for the given entity, in the order they were appended.
    async fn fetch_operation_logs(
        &self,
        entity_type: OperationEntityType,
        entity_id: i64,
    ) -> Result<Vec<OperationLog>, Self::Error>;
}
