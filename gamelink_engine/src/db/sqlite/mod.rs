//! SQLite backend.
//!
//! Every query fn runs its statement to completion (`fetch_all`/`execute`), including single-row lookups. A
//! half-read statement keeps a read transaction open on the pooled connection, and the next transaction handed that
//! connection would start from a stale snapshot.
pub mod db;
mod errors;

pub mod disputes;
pub mod notifications;
pub mod operation_logs;
pub mod orders;
pub mod players;

pub use db::{SqliteDatabase, SqliteTransaction};
pub use errors::SqliteDatabaseError;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
