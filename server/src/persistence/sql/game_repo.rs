//! Repository for the `games` table.

use nhl_client::{Game, GameType, Season};
use sqlx::AnyPool;

use crate::persistence::traits::GameRepository;
use crate::persistence::{GameSummary, PersistenceError};

#[derive(sqlx::FromRow)]
struct GameRow {
    game_pk: i64,
    season: i64,
    game_type: String,
    game_date: Option<String>,
    away_team_id: Option<i64>,
    away_team_name: Option<String>,
    away_score: Option<i64>,
    home_team_id: Option<i64>,
    home_team_name: Option<String>,
    home_score: Option<i64>,
}

impl TryFrom<GameRow> for GameSummary {
    type Error = PersistenceError;

    fn try_from(r: GameRow) -> Result<Self, Self::Error> {
        Ok(Self {
            game_pk: r.game_pk,
            season: season_column(r.season)?,
            game_type: GameType::from_code(&r.game_type),
            game_date: r.game_date,
            away_team_id: r.away_team_id,
            away_team_name: r.away_team_name,
            away_score: r.away_score,
            home_team_id: r.home_team_id,
            home_team_name: r.home_team_name,
            home_score: r.home_score,
        })
    }
}

pub(super) fn season_column(value: i64) -> Result<Season, PersistenceError> {
    Season::try_from(value).map_err(|_| PersistenceError::InvalidValue {
        column: "season",
        value: value.to_string(),
    })
}

/// [`GameRepository`] over a sqlx `Any` pool.
pub struct SqlGameRepository {
    pool: AnyPool,
}

impl SqlGameRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

impl GameRepository for SqlGameRepository {
    async fn store_game(&self, game: &Game) -> Result<(), PersistenceError> {
        let away = &game.teams.away;
        let home = &game.teams.home;
        sqlx::query(
            "REPLACE INTO games (game_pk, season, game_type, game_date, \
             away_team_id, away_team_name, away_score, home_team_id, home_team_name, home_score) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(game.game_pk)
        .bind(i64::from(game.season.id()))
        .bind(game.game_type.code())
        .bind(game.game_date.as_str())
        .bind(away.team.id)
        .bind(away.team.name.as_str())
        .bind(away.score)
        .bind(home.team.id)
        .bind(home.team.name.as_str())
        .bind(home.score)
        .execute(&self.pool)
        .await?;

        tracing::debug!(game_pk = game.game_pk, season = %game.season, "Stored game");
        Ok(())
    }

    async fn load_game(&self, game_pk: i64) -> Result<Option<GameSummary>, PersistenceError> {
        let row: Option<GameRow> = sqlx::query_as(
            "SELECT game_pk, season, game_type, game_date, away_team_id, away_team_name, \
             away_score, home_team_id, home_team_name, home_score \
             FROM games WHERE game_pk = ?",
        )
        .bind(game_pk)
        .fetch_optional(&self.pool)
        .await?;

        row.map(GameSummary::try_from).transpose()
    }

    async fn list_seasons(&self) -> Result<Vec<Season>, PersistenceError> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT DISTINCT season FROM games")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|(s,)| season_column(s)).collect()
    }
}
