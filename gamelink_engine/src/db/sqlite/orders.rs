use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::OrderQueryFilter},
    db_types::{NewOrder, Order},
};

const ORDER_COLUMNS: &str = "id, user_id, player_id, title, status, assignment_source, dispute_status, price, \
                             refund_amount, created_at, updated_at, completed_at";

/// Inserts a new order. Orders normally arrive through the order intake service; this is used to seed the store.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO orders (user_id, title, status, price, created_at, updated_at, completed_at) VALUES ($1, $2, \
         $3, $4, $5, $5, $6) RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(order.user_id)
        .bind(order.title)
        .bind(order.status)
        .bind(order.price)
        .bind(order.created_at)
        .bind(order.completed_at)
.fetch_all(conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;
    debug!("🗃️ Order #{} has been saved in the DB", order.id);
    Ok(order)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(id).fetch_all(conn).await?.into_iter().next();
    Ok(order)
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, query: &OrderQueryFilter) {
    if query.is_empty() {
        return;
    }
    builder.push(" WHERE status IN (");
    let mut statuses = builder.separated(", ");
    for status in &query.statuses {
        statuses.push_bind(status.as_str());
    }
    statuses.push_unseparated(")");
}

/// Fetches the orders matching the filter, oldest first, together with the total number of matches ignoring paging.
pub async fn fetch_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Order>, i64), SqliteDatabaseError> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filter(&mut count, &query);
    let total = count.build_query_scalar::<i64>().fetch_all(&mut *conn).await?.into_iter().next().unwrap_or_default();

    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
    push_filter(&mut builder, &query);
    builder.push(" ORDER BY created_at ASC, id ASC");
    if let Some(page) = query.page {
        builder.push(" LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ {} of {total} orders match the query", orders.len());
    Ok((orders, total))
}

/// Writes back the columns owned by the assignment engine.
pub async fn update_order(order: &Order, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET
                player_id = $1,
                status = $2,
                assignment_source = $3,
                dispute_status = $4,
                refund_amount = $5,
                updated_at = $6
            WHERE id = $7
        "#,
    )
    .bind(order.player_id)
    .bind(order.status)
    .bind(order.assignment_source)
    .bind(order.dispute_status)
    .bind(order.refund_amount)
    .bind(order.updated_at)
    .bind(order.id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::RecordNotFound(format!("Order #{}", order.id)));
    }
    trace!("🗃️ Order #{} updated. Status: {}, player: {:?}", order.id, order.status, order.player_id);
    Ok(())
}
