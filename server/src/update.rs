//! Update pipeline: pull all-star and final games of recent seasons from the
//! stats API and store them with every player's stat line.

use nhl_client::extract::{final_games, MAX_SEASONS, MIN_SEASONS};
use nhl_client::{GameType, InvalidSeason, Season, StatsApi};

use crate::persistence::traits::{GameRepository, PlayerRepository};
use crate::persistence::PersistenceError;

/// Season count used when an update is requested without one.
pub const DEFAULT_SEASON_COUNT: i64 = 3;

/// Smallest value treated as a literal season id rather than a count.
const FIRST_SEASON_ESCAPE: i64 = 20062007;

/// Which seasons an update covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateScope {
    /// The `n` most recent finished seasons.
    Recent(usize),
    /// A single season given by id.
    Season(Season),
}

impl UpdateScope {
    /// Interpret the `count` path segment of an update request.
    ///
    /// Counts are clamped to `[1, 15]`, except that values from `20062007`
    /// up name one season directly.
    pub fn from_count(count: i64) -> Result<Self, UpdateError> {
        if count < FIRST_SEASON_ESCAPE {
            let n = count.clamp(MIN_SEASONS as i64, MAX_SEASONS as i64) as usize;
            return Ok(UpdateScope::Recent(n));
        }
        Ok(UpdateScope::Season(Season::try_from(count)?))
    }
}

impl Default for UpdateScope {
    fn default() -> Self {
        UpdateScope::Recent(DEFAULT_SEASON_COUNT as usize)
    }
}

/// Counts of what an update stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub seasons: Vec<Season>,
    pub games: usize,
    pub players: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error(transparent)]
    InvalidSeason(#[from] InvalidSeason),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Fetch and store every all-star and final game of the seasons in `scope`.
///
/// Remote failures leave a season (or game) empty; persistence errors abort.
#[tracing::instrument(skip(api, games, players))]
pub async fn run_update<A, G, P>(
    api: &A,
    games: &G,
    players: &P,
    scope: UpdateScope,
) -> Result<UpdateSummary, UpdateError>
where
    A: StatsApi + ?Sized,
    G: GameRepository,
    P: PlayerRepository,
{
    let seasons = match scope {
        UpdateScope::Recent(n) => api.last_seasons(n as i64).await,
        UpdateScope::Season(season) => vec![season],
    };
    tracing::info!(count = seasons.len(), "Updating seasons");

    let mut summary = UpdateSummary {
        seasons: seasons.clone(),
        ..UpdateSummary::default()
    };

    for season in seasons {
        let all_star = api.season_games(season, GameType::AllStar).await;
        let playoffs = api.season_games(season, GameType::Playoff).await;
        let finals = final_games(playoffs);
        tracing::info!(
            season = %season,
            all_star = all_star.len(),
            finals = finals.len(),
            "Storing season"
        );

        for game in all_star.iter().chain(&finals) {
            let roster = api.game_players(game.game_pk).await;
            games.store_game(game).await?;
            for player in &roster {
                players.store_player_stat(game, player).await?;
            }
            summary.games += 1;
            summary.players += roster.len();
            tracing::debug!(game_pk = game.game_pk, players = roster.len(), "Stored game");
        }
    }

    tracing::info!(games = summary.games, players = summary.players, "Update finished");
    Ok(summary)
}
