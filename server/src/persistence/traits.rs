//! Async repository trait definitions for the persistence layer.
//!
//! Each trait abstracts over one aggregate so the update pipeline and the
//! HTTP handlers stay generic over the backend.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send`, which axum handlers require.

use super::{GameSummary, PersistenceError, PlayerStatSheet, TopPlayer};
use nhl_client::{Game, PlayerRecord, Season};
use std::future::Future;

/// Repository for games.
pub trait GameRepository: Send + Sync {
    /// Insert or replace the game keyed by its `gamePk`.
    fn store_game(&self, game: &Game) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn load_game(
        &self,
        game_pk: i64,
    ) -> impl Future<Output = Result<Option<GameSummary>, PersistenceError>> + Send;
    /// Distinct seasons with at least one stored game, in no particular order.
    fn list_seasons(&self) -> impl Future<Output = Result<Vec<Season>, PersistenceError>> + Send;
}

/// Repository for per-game player rows and their stat lines.
///
/// Implementations must write the player row and its stat row together and
/// keep exactly one stat row (goalie or skater) per player row.
pub trait PlayerRepository: Send + Sync {
    fn store_player_stat(
        &self,
        game: &Game,
        player: &PlayerRecord,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn load_player_stat(
        &self,
        person_id: i64,
        game_pk: i64,
    ) -> impl Future<Output = Result<Option<PlayerStatSheet>, PersistenceError>> + Send;
    /// Players with at least one playoff and one all-star game in `season`,
    /// each with their highest playoff `gamePk` of that season.
    fn top_players(
        &self,
        season: Season,
    ) -> impl Future<Output = Result<Vec<TopPlayer>, PersistenceError>> + Send;
}
