use log::trace;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewOperationLog, OperationEntityType, OperationLog},
};

pub async fn append_operation_log(
    entry: NewOperationLog,
    conn: &mut SqliteConnection,
) -> Result<i64, SqliteDatabaseError> {
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO operation_logs (entity_type, entity_id, actor_user_id, action, metadata, trace_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
        "#,
    )
    .bind(entry.entity_type)
    .bind(entry.entity_id)
    .bind(entry.actor_user_id)
    .bind(entry.action)
    .bind(Json(&entry.metadata))
    .bind(&entry.trace_id)
    .bind(entry.created_at)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    trace!("🗃️ Audit entry #{id}: {} on {} #{} [{}]", entry.action, entry.entity_type, entry.entity_id, entry.trace_id);
    Ok(id)
}

/// The audit trail of an entity, in the order the entries were written.
pub async fn fetch_operation_logs(
    entity_type: OperationEntityType,
    entity_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OperationLog>, SqliteDatabaseError> {
    let logs = sqlx::query_as::<_, OperationLog>(
        r#"
            SELECT id, entity_type, entity_id, actor_user_id, action, metadata, trace_id, created_at
            FROM operation_logs
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY id ASC
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .fetch_all(conn)
    .await?;
    Ok(logs)
}
