//! StatsApi trait abstraction for data sources

use crate::client::NhlClient;
use crate::types::{Game, GameType, PlayerRecord, Season};
use async_trait::async_trait;

/// Read-only view of the stats API used by the update pipeline.
/// Implemented by both the real `NhlClient` and `MockStatsApi`.
///
/// Every method answers "no data" with an empty collection; transport
/// failures are logged by the implementation, not surfaced.
#[async_trait]
pub trait StatsApi: Send + Sync {
    /// The `count` most recent finished seasons, oldest first
    async fn last_seasons(&self, count: i64) -> Vec<Season>;

    /// Games of one type in a season
    async fn season_games(&self, season: Season, game_type: GameType) -> Vec<Game>;

    /// Players who recorded stats in a game
    async fn game_players(&self, game_pk: i64) -> Vec<PlayerRecord>;
}

#[async_trait]
impl StatsApi for NhlClient {
    async fn last_seasons(&self, count: i64) -> Vec<Season> {
        NhlClient::last_seasons(self, count).await
    }

    async fn season_games(&self, season: Season, game_type: GameType) -> Vec<Game> {
        NhlClient::season_games(self, season, game_type).await
    }

    async fn game_players(&self, game_pk: i64) -> Vec<PlayerRecord> {
        NhlClient::game_players(self, game_pk).await
    }
}
