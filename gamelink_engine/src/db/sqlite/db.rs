use std::{fmt::Debug, future::Future};

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, Sqlite, SqlitePool, Transaction};

use super::{disputes, new_pool, notifications, operation_logs, orders, players, SqliteDatabaseError};
use crate::{
    db::traits::{
        DisputeManagement,
        DisputeRepository,
        NotificationManagement,
        OperationLogManagement,
        OperationLogRepository,
        OrderManagement,
        OrderQueryFilter,
        OrderRepository,
        Page,
        PlayerManagement,
        PlayerRepository,
        TransactionScope,
        UnitOfWork,
    },
    db_types::{
        NewNotification,
        NewOperationLog,
        NewOrder,
        NewOrderDispute,
        NewPlayer,
        NotificationEvent,
        OperationEntityType,
        OperationLog,
        Order,
        OrderDispute,
        Player,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({} connections)", self.pool.size())
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Migrations that have already been applied are skipped.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn insert_order(&self, order: NewOrder) -> Result<Order, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    pub async fn insert_player(&self, player: NewPlayer) -> Result<Player, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        players::insert_player(player, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<(Vec<Order>, i64), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders(query, &mut conn).await
    }
}

impl PlayerManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn fetch_player(&self, player_id: i64) -> Result<Option<Player>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        players::fetch_player(player_id, &mut conn).await
    }

    async fn fetch_players(&self, page: Page) -> Result<(Vec<Player>, i64), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        players::fetch_players(page, &mut conn).await
    }
}

impl DisputeManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn fetch_disputes_for_order(&self, order_id: i64) -> Result<Vec<OrderDispute>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        disputes::fetch_disputes_for_order(order_id, &mut conn).await
    }

    async fn fetch_latest_dispute_for_order(&self, order_id: i64) -> Result<Option<OrderDispute>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        disputes::fetch_latest_dispute_for_order(order_id, &mut conn).await
    }
}

impl OperationLogManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn fetch_operation_logs(
        &self,
        entity_type: OperationEntityType,
        entity_id: i64,
    ) -> Result<Vec<OperationLog>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        operation_logs::fetch_operation_logs(entity_type, entity_id, &mut conn).await
    }
}

impl NotificationManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    fn create_notification(
        &self,
        notification: NewNotification,
    ) -> impl Future<Output = Result<NotificationEvent, Self::Error>> + Send {
        async move {
            let mut conn = self.pool.acquire().await?;
            notifications::insert_notification(notification, &mut conn).await
        }
    }

    fn fetch_notifications_for_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<NotificationEvent>, Self::Error>> + Send {
        async move {
            let mut conn = self.pool.acquire().await?;
            notifications::fetch_notifications_for_user(user_id, &mut conn).await
        }
    }
}

impl UnitOfWork for SqliteDatabase {
    type Error = SqliteDatabaseError;
    type Tx = SqliteTransaction;

    async fn begin(&self) -> Result<Self::Tx, Self::Error> {
        let tx = self.pool.begin().await?;
        trace!("🗃️ Transaction started");
        Ok(SqliteTransaction { tx })
    }
}

/// A unit of work on the SQLite backend. Dropping it without committing rolls everything back.
pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl Debug for SqliteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteTransaction")
    }
}

impl TransactionScope for SqliteTransaction {
    type Error = SqliteDatabaseError;

    async fn commit(self) -> Result<(), Self::Error> {
        self.tx.commit().await?;
        trace!("🗃️ Transaction committed");
        Ok(())
    }

    async fn rollback(self) -> Result<(), Self::Error> {
        self.tx.rollback().await?;
        trace!("🗃️ Transaction rolled back");
        Ok(())
    }
}

impl OrderRepository for SqliteTransaction {
    async fn order_by_id(&mut self, order_id: i64) -> Result<Option<Order>, Self::Error> {
        orders::fetch_order(order_id, &mut self.tx).await
    }

    async fn update_order(&mut self, order: &Order) -> Result<(), Self::Error> {
        orders::update_order(order, &mut self.tx).await
    }
}

impl PlayerRepository for SqliteTransaction {
    async fn player_by_id(&mut self, player_id: i64) -> Result<Option<Player>, Self::Error> {
        players::fetch_player(player_id, &mut self.tx).await
    }
}

impl DisputeRepository for SqliteTransaction {
    async fn latest_dispute_for_order(&mut self, order_id: i64) -> Result<Option<OrderDispute>, Self::Error> {
        disputes::fetch_latest_dispute_for_order(order_id, &mut self.tx).await
    }

    async fn insert_dispute(&mut self, dispute: NewOrderDispute) -> Result<OrderDispute, Self::Error> {
        disputes::insert_dispute(dispute, &mut self.tx).await
    }

    async fn update_dispute(&mut self, dispute: &OrderDispute) -> Result<(), Self::Error> {
        disputes::update_dispute(dispute, &mut self.tx).await
    }

    async fn overdue_disputes(&mut self, now: DateTime<Utc>) -> Result<Vec<OrderDispute>, Self::Error> {
        disputes::fetch_overdue_disputes(now, &mut self.tx).await
    }

    async fn mark_sla_breached(&mut self, dispute_id: i64, at: DateTime<Utc>) -> Result<bool, Self::Error> {
        disputes::mark_sla_breached(dispute_id, at, &mut self.tx).await
    }
}

impl OperationLogRepository for SqliteTransaction {
    async fn append_operation_log(&mut self, entry: NewOperationLog) -> Result<i64, Self::Error> {
        operation_logs::append_operation_log(entry, &mut self.tx).await
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::prepare_env::{prepare_test_env, random_db_path, tear_down};

    #[tokio::test]
    async fn debug_output_hides_the_database_url() {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let printed = format!("{db:?}");
        assert!(printed.starts_with("SqliteDatabase"));
        assert!(!printed.contains(&url));
        assert!(!printed.contains("gamelink_test_"));
        tear_down(&db).await;
    }
}
