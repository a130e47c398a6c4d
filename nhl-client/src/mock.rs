//! Mock StatsApi implementation for testing

use crate::traits::StatsApi;
use crate::types::{Game, GameType, PlayerRecord, Season};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Canned stats API - only compiled in test mode or with the mock feature
#[derive(Clone, Default)]
pub struct MockStatsApi {
    data: Arc<Mutex<MockData>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Default)]
struct MockData {
    seasons: Vec<Season>,
    games: HashMap<(Season, GameType), Vec<Game>>,
    players: HashMap<i64, Vec<PlayerRecord>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    LastSeasons { count: i64 },
    SeasonGames { season: Season, game_type: GameType },
    GamePlayers { game_pk: i64 },
}

impl MockStatsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished seasons, oldest first; `last_seasons` returns the tail.
    pub fn with_seasons(self, seasons: Vec<Season>) -> Self {
        self.data.lock().unwrap().seasons = seasons;
        self
    }

    pub fn with_games(self, season: Season, game_type: GameType, games: Vec<Game>) -> Self {
        self.data
            .lock()
            .unwrap()
            .games
            .insert((season, game_type), games);
        self
    }

    pub fn with_players(self, game_pk: i64, players: Vec<PlayerRecord>) -> Self {
        self.data.lock().unwrap().players.insert(game_pk, players);
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    fn record(&self, call: MockCall) {
        self.call_log.lock().unwrap().push(call);
    }
}

#[async_trait]
impl StatsApi for MockStatsApi {
    async fn last_seasons(&self, count: i64) -> Vec<Season> {
        self.record(MockCall::LastSeasons { count });
        let count = crate::extract::clamp_season_count(count);
        let data = self.data.lock().unwrap();
        data.seasons[data.seasons.len().saturating_sub(count)..].to_vec()
    }

    async fn season_games(&self, season: Season, game_type: GameType) -> Vec<Game> {
        self.record(MockCall::SeasonGames { season, game_type });
        self.data
            .lock()
            .unwrap()
            .games
            .get(&(season, game_type))
            .cloned()
            .unwrap_or_default()
    }

    async fn game_players(&self, game_pk: i64) -> Vec<PlayerRecord> {
        self.record(MockCall::GamePlayers { game_pk });
        self.data
            .lock()
            .unwrap()
            .players
            .get(&game_pk)
            .cloned()
            .unwrap_or_default()
    }
}
