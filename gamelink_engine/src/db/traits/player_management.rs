use crate::{db::traits::Page, db_types::Player};

/// Read access to the player roster.
#[allow(async_fn_in_trait)]
pub trait PlayerManagement {
    type Error: std::error::Error;

    async fn fetch_player(&self, player_id: i64) -> Result<Option<Player>, Self::Error>;

    /// Fetches one page of the roster, ordered by player id, along with the total roster size.
    async fn fetch_players(&self, page: Page) -> Result<(Vec<Player>, i64), Self::Error>;
}
