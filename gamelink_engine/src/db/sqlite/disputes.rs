use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{DisputeStatus, NewOrderDispute, OrderDispute},
};

const DISPUTE_COLUMNS: &str = "id, order_id, raised_by, raised_by_user_id, reason, evidence_urls, status, resolution, \
                               resolution_note, refund_amount, handled_by_id, handled_at, response_deadline, \
                               sla_breached, sla_breached_at, trace_id, created_at, updated_at";

pub async fn insert_dispute(
    dispute: NewOrderDispute,
    conn: &mut SqliteConnection,
) -> Result<OrderDispute, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO order_disputes (order_id, raised_by, raised_by_user_id, reason, evidence_urls, status, \
         response_deadline, trace_id, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
         RETURNING {DISPUTE_COLUMNS}"
    );
    let dispute = sqlx::query_as::<_, OrderDispute>(&sql)
        .bind(dispute.order_id)
        .bind(dispute.raised_by)
        .bind(dispute.raised_by_user_id)
        .bind(dispute.reason)
        .bind(Json(dispute.evidence_urls))
        .bind(DisputeStatus::Pending)
        .bind(dispute.response_deadline)
        .bind(dispute.trace_id)
        .bind(dispute.created_at)
.fetch_all(conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;
    debug!("🗃️ Dispute #{} opened for order #{}", dispute.id, dispute.order_id);
    Ok(dispute)
}

pub async fn fetch_disputes_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderDispute>, SqliteDatabaseError> {
    let sql = format!("SELECT {DISPUTE_COLUMNS} FROM order_disputes WHERE order_id = $1 ORDER BY id DESC");
    let disputes = sqlx::query_as::<_, OrderDispute>(&sql).bind(order_id).fetch_all(conn).await?;
    Ok(disputes)
}

pub async fn fetch_latest_dispute_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderDispute>, SqliteDatabaseError> {
    let sql = format!("SELECT {DISPUTE_COLUMNS} FROM order_disputes WHERE order_id = $1 ORDER BY id DESC LIMIT 1");
    let dispute = sqlx::query_as::<_, OrderDispute>(&sql).bind(order_id).fetch_all(conn).await?.into_iter().next();
    Ok(dispute)
}

pub async fn update_dispute(dispute: &OrderDispute, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            UPDATE order_disputes SET
                status = $1,
                resolution = $2,
                resolution_note = $3,
                refund_amount = $4,
                handled_by_id = $5,
                handled_at = $6,
                updated_at = $7
            WHERE id = $8
        "#,
    )
    .bind(dispute.status)
    .bind(dispute.resolution)
    .bind(&dispute.resolution_note)
    .bind(dispute.refund_amount)
    .bind(dispute.handled_by_id)
    .bind(dispute.handled_at)
    .bind(dispute.updated_at)
    .bind(dispute.id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::RecordNotFound(format!("Dispute #{}", dispute.id)));
    }
    trace!("🗃️ Dispute #{} updated. Status: {}, resolution: {}", dispute.id, dispute.status, dispute.resolution);
    Ok(())
}

/// Pending, unflagged disputes whose response deadline is strictly before `now`, earliest deadline first.
pub async fn fetch_overdue_disputes(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderDispute>, SqliteDatabaseError> {
    let sql = format!(
        "SELECT {DISPUTE_COLUMNS} FROM order_disputes WHERE status = $1 AND sla_breached = 0 AND response_deadline \
         < $2 ORDER BY response_deadline ASC, id ASC"
    );
    let disputes =
        sqlx::query_as::<_, OrderDispute>(&sql).bind(DisputeStatus::Pending).bind(now).fetch_all(conn).await?;
    Ok(disputes)
}

/// Returns `true` if this call flagged the dispute, `false` if it was already flagged.
pub async fn mark_sla_breached(
    dispute_id: i64,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE order_disputes SET sla_breached = 1, sla_breached_at = $1, updated_at = $1 WHERE id = $2 AND \
         sla_breached = 0",
    )
    .bind(at)
    .bind(dispute_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
