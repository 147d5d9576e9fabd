use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::Page},
    db_types::{NewPlayer, Player},
};

const PLAYER_COLUMNS: &str = "id, user_id, nickname, hourly_rate, created_at, updated_at";

pub async fn insert_player(player: NewPlayer, conn: &mut SqliteConnection) -> Result<Player, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO players (user_id, nickname, hourly_rate) VALUES ($1, $2, $3) RETURNING {PLAYER_COLUMNS}"
    );
    let player = sqlx::query_as::<_, Player>(&sql)
        .bind(player.user_id)
        .bind(player.nickname)
        .bind(player.hourly_rate)
.fetch_all(conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;
    debug!("🗃️ Player #{} ({}) has been saved in the DB", player.id, player.nickname);
    Ok(player)
}

pub async fn fetch_player(id: i64, conn: &mut SqliteConnection) -> Result<Option<Player>, SqliteDatabaseError> {
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1");
    let player = sqlx::query_as::<_, Player>(&sql).bind(id).fetch_all(conn).await?.into_iter().next();
    Ok(player)
}

/// A page of players in registration order, and the total number of players.
pub async fn fetch_players(page: Page, conn: &mut SqliteConnection) -> Result<(Vec<Player>, i64), SqliteDatabaseError> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM players")
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .next()
        .unwrap_or_default();
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM players ORDER BY id ASC LIMIT $1 OFFSET $2");
    let players =
        sqlx::query_as::<_, Player>(&sql).bind(page.limit()).bind(page.offset()).fetch_all(conn).await?;
    Ok((players, total))
}
