//! Repository for per-game player rows and their goalie/skater stat rows.

use nhl_client::{Game, GoalieStats, PlayerRecord, Season, SkaterStats, StatLine, GOALIE_POSITION};
use sqlx::{Any, AnyPool, Transaction};

use crate::persistence::traits::PlayerRepository;
use crate::persistence::{PersistenceError, PlayerStatSheet, TopPlayer};

#[derive(sqlx::FromRow)]
struct PlayerRow {
    game_pk: i64,
    person_id: i64,
    full_name: String,
    birth_date: Option<String>,
    birth_city: Option<String>,
    birth_country: Option<String>,
    nationality: Option<String>,
    jersey_number: Option<i64>,
    position_name: String,
    team_name: Option<String>,
    team_id: Option<i64>,
}

impl PlayerRow {
    fn into_sheet(self, stats: Option<StatLine>) -> PlayerStatSheet {
        PlayerStatSheet {
            game_pk: self.game_pk,
            person_id: self.person_id,
            full_name: self.full_name,
            birth_date: self.birth_date,
            birth_city: self.birth_city,
            birth_country: self.birth_country,
            nationality: self.nationality,
            jersey_number: self.jersey_number,
            position_name: self.position_name,
            team_name: self.team_name,
            team_id: self.team_id,
            stats,
        }
    }
}

#[derive(sqlx::FromRow)]
struct GoalieRow {
    time_on_ice: String,
    assists: i64,
    goals: i64,
    pim: i64,
    shots: i64,
    saves: i64,
    power_play_saves: i64,
    short_handed_saves: i64,
    even_saves: i64,
    short_handed_shots_against: i64,
    even_shots_against: i64,
    power_play_shots_against: i64,
    save_percentage: f64,
}

impl From<GoalieRow> for GoalieStats {
    fn from(r: GoalieRow) -> Self {
        Self {
            time_on_ice: r.time_on_ice,
            assists: r.assists,
            goals: r.goals,
            pim: r.pim,
            shots: r.shots,
            saves: r.saves,
            power_play_saves: r.power_play_saves,
            short_handed_saves: r.short_handed_saves,
            even_saves: r.even_saves,
            short_handed_shots_against: r.short_handed_shots_against,
            even_shots_against: r.even_shots_against,
            power_play_shots_against: r.power_play_shots_against,
            save_percentage: r.save_percentage,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SkaterRow {
    time_on_ice: String,
    assists: i64,
    goals: i64,
    shots: i64,
    hits: i64,
    power_play_goals: i64,
    power_play_assists: i64,
    penalty_minutes: i64,
    face_off_wins: i64,
    faceoff_taken: i64,
    takeaways: i64,
    giveaways: i64,
    short_handed_goals: i64,
    short_handed_assists: i64,
    blocked: i64,
    plus_minus: i64,
    even_time_on_ice: String,
    power_play_time_on_ice: String,
    short_handed_time_on_ice: String,
}

impl From<SkaterRow> for SkaterStats {
    fn from(r: SkaterRow) -> Self {
        Self {
            time_on_ice: r.time_on_ice,
            assists: r.assists,
            goals: r.goals,
            shots: r.shots,
            hits: r.hits,
            power_play_goals: r.power_play_goals,
            power_play_assists: r.power_play_assists,
            penalty_minutes: r.penalty_minutes,
            face_off_wins: r.face_off_wins,
            faceoff_taken: r.faceoff_taken,
            takeaways: r.takeaways,
            giveaways: r.giveaways,
            short_handed_goals: r.short_handed_goals,
            short_handed_assists: r.short_handed_assists,
            blocked: r.blocked,
            plus_minus: r.plus_minus,
            even_time_on_ice: r.even_time_on_ice,
            power_play_time_on_ice: r.power_play_time_on_ice,
            short_handed_time_on_ice: r.short_handed_time_on_ice,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TopPlayerRow {
    person_id: i64,
    full_name: String,
    game_pk: i64,
}

/// [`PlayerRepository`] over a sqlx `Any` pool.
pub struct SqlPlayerRepository {
    pool: AnyPool,
}

impl SqlPlayerRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

async fn replace_goalie_stats(
    tx: &mut Transaction<'_, Any>,
    game_pk: i64,
    person_id: i64,
    s: &GoalieStats,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "REPLACE INTO goalie_stats (game_pk, person_id, time_on_ice, assists, goals, pim, \
         shots, saves, power_play_saves, short_handed_saves, even_saves, \
         short_handed_shots_against, even_shots_against, power_play_shots_against, \
         save_percentage) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(game_pk)
    .bind(person_id)
    .bind(s.time_on_ice.as_str())
    .bind(s.assists)
    .bind(s.goals)
    .bind(s.pim)
    .bind(s.shots)
    .bind(s.saves)
    .bind(s.power_play_saves)
    .bind(s.short_handed_saves)
    .bind(s.even_saves)
    .bind(s.short_handed_shots_against)
    .bind(s.even_shots_against)
    .bind(s.power_play_shots_against)
    .bind(s.save_percentage)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn replace_skater_stats(
    tx: &mut Transaction<'_, Any>,
    game_pk: i64,
    person_id: i64,
    s: &SkaterStats,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "REPLACE INTO skater_stats (game_pk, person_id, time_on_ice, assists, goals, shots, \
         hits, power_play_goals, power_play_assists, penalty_minutes, face_off_wins, \
         faceoff_taken, takeaways, giveaways, short_handed_goals, short_handed_assists, \
         blocked, plus_minus, even_time_on_ice, power_play_time_on_ice, \
         short_handed_time_on_ice) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(game_pk)
    .bind(person_id)
    .bind(s.time_on_ice.as_str())
    .bind(s.assists)
    .bind(s.goals)
    .bind(s.shots)
    .bind(s.hits)
    .bind(s.power_play_goals)
    .bind(s.power_play_assists)
    .bind(s.penalty_minutes)
    .bind(s.face_off_wins)
    .bind(s.faceoff_taken)
    .bind(s.takeaways)
    .bind(s.giveaways)
    .bind(s.short_handed_goals)
    .bind(s.short_handed_assists)
    .bind(s.blocked)
    .bind(s.plus_minus)
    .bind(s.even_time_on_ice.as_str())
    .bind(s.power_play_time_on_ice.as_str())
    .bind(s.short_handed_time_on_ice.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

impl PlayerRepository for SqlPlayerRepository {
    async fn store_player_stat(
        &self,
        game: &Game,
        player: &PlayerRecord,
    ) -> Result<(), PersistenceError> {
        let game_pk = game.game_pk;
        let person_id = player.person.id;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "REPLACE INTO players (game_pk, person_id, full_name, birth_date, birth_city, \
             birth_country, nationality, jersey_number, position_name, team_name, team_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(game_pk)
        .bind(person_id)
        .bind(player.person.full_name.as_str())
        .bind(player.person.birth_date.clone())
        .bind(player.person.birth_city.clone())
        .bind(player.person.birth_country.clone())
        .bind(player.person.nationality.clone())
        .bind(player.jersey_number)
        .bind(player.position_name.as_str())
        .bind(player.team.name.as_str())
        .bind(player.team.id)
        .execute(&mut *tx)
        .await?;

        // A player row carries exactly one stat row
        let stale_table = match &player.stats {
            StatLine::Goalie(stats) => {
                replace_goalie_stats(&mut tx, game_pk, person_id, stats).await?;
                "skater_stats"
            }
            StatLine::Skater(stats) => {
                replace_skater_stats(&mut tx, game_pk, person_id, stats).await?;
                "goalie_stats"
            }
        };
        sqlx::query(&format!(
            "DELETE FROM {stale_table} WHERE game_pk = ? AND person_id = ?"
        ))
        .bind(game_pk)
        .bind(person_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(game_pk, person_id, goalie = player.is_goalie(), "Stored player stat");
        Ok(())
    }

    async fn load_player_stat(
        &self,
        person_id: i64,
        game_pk: i64,
    ) -> Result<Option<PlayerStatSheet>, PersistenceError> {
        let player: Option<PlayerRow> = sqlx::query_as(
            "SELECT game_pk, person_id, full_name, birth_date, birth_city, birth_country, \
             nationality, jersey_number, position_name, team_name, team_id \
             FROM players WHERE person_id = ? AND game_pk = ?",
        )
        .bind(person_id)
        .bind(game_pk)
        .fetch_optional(&self.pool)
        .await?;

        let Some(player) = player else {
            return Ok(None);
        };

        let stats = if player.position_name == GOALIE_POSITION {
            let row: Option<GoalieRow> = sqlx::query_as(
                "SELECT time_on_ice, assists, goals, pim, shots, saves, power_play_saves, \
                 short_handed_saves, even_saves, short_handed_shots_against, \
                 even_shots_against, power_play_shots_against, save_percentage \
                 FROM goalie_stats WHERE person_id = ? AND game_pk = ?",
            )
            .bind(person_id)
            .bind(game_pk)
            .fetch_optional(&self.pool)
            .await?;
            row.map(|r| StatLine::Goalie(r.into()))
        } else {
            let row: Option<SkaterRow> = sqlx::query_as(
                "SELECT time_on_ice, assists, goals, shots, hits, power_play_goals, \
                 power_play_assists, penalty_minutes, face_off_wins, faceoff_taken, \
                 takeaways, giveaways, short_handed_goals, short_handed_assists, blocked, \
                 plus_minus, even_time_on_ice, power_play_time_on_ice, short_handed_time_on_ice \
                 FROM skater_stats WHERE person_id = ? AND game_pk = ?",
            )
            .bind(person_id)
            .bind(game_pk)
            .fetch_optional(&self.pool)
            .await?;
            row.map(|r| StatLine::Skater(r.into()))
        };

        Ok(Some(player.into_sheet(stats)))
    }

    async fn top_players(&self, season: Season) -> Result<Vec<TopPlayer>, PersistenceError> {
        let rows: Vec<TopPlayerRow> = sqlx::query_as(
            // The name comes from the row of the chosen playoff game
            "SELECT t.person_id AS person_id, p.full_name AS full_name, t.game_pk AS game_pk \
             FROM (SELECT p.person_id AS person_id, \
                   MAX(CASE WHEN g.game_type = 'P' THEN p.game_pk END) AS game_pk \
                   FROM players p JOIN games g ON g.game_pk = p.game_pk \
                   WHERE g.season = ? \
                   GROUP BY p.person_id \
                   HAVING SUM(CASE WHEN g.game_type = 'P' THEN 1 ELSE 0 END) > 0 \
                   AND SUM(CASE WHEN g.game_type = 'A' THEN 1 ELSE 0 END) > 0) t \
             JOIN players p ON p.person_id = t.person_id AND p.game_pk = t.game_pk \
             ORDER BY p.full_name, t.person_id",
        )
        .bind(i64::from(season.id()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TopPlayer {
                person_id: r.person_id,
                full_name: r.full_name,
                game_pk: r.game_pk,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sql::test_fixtures::{goalie, sample_game, skater};
    use crate::persistence::sql::Database;
    use crate::persistence::traits::GameRepository;
    use nhl_client::GameType;

    async fn count(db: &Database, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap();
        n
    }

    #[tokio::test]
    async fn test_store_and_load_skater() {
        let db = Database::new_in_memory().await.unwrap();
        let game = sample_game(2018040643, GameType::AllStar);
        let kane = skater(8474141, "Patrick Kane", 2);

        db.games().store_game(&game).await.unwrap();
        db.players().store_player_stat(&game, &kane).await.unwrap();
        let sheet = db
            .players()
            .load_player_stat(8474141, 2018040643)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(sheet.full_name, "Patrick Kane");
        assert_eq!(sheet.jersey_number, Some(88));
        assert_eq!(sheet.team_name.as_deref(), Some("Central All-Stars"));
        assert_eq!(sheet.birth_city.as_deref(), Some("Buffalo"));
        assert_eq!(sheet.stats, Some(kane.stats));
    }

    #[tokio::test]
    async fn test_store_and_load_goalie() {
        let db = Database::new_in_memory().await.unwrap();
        let game = sample_game(2018030417, GameType::Playoff);
        let binnington = goalie(8476412, "Jordan Binnington", 0.94);

        db.games().store_game(&game).await.unwrap();
        db.players().store_player_stat(&game, &binnington).await.unwrap();
        let sheet = db
            .players()
            .load_player_stat(8476412, 2018030417)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(sheet.position_name, "Goalie");
        match sheet.stats {
            Some(StatLine::Goalie(g)) => assert_eq!(g.save_percentage, 0.94),
            other => panic!("expected goalie stats, got {other:?}"),
        }
        assert_eq!(count(&db, "skater_stats").await, 0);
    }

    #[tokio::test]
    async fn test_load_missing_player() {
        let db = Database::new_in_memory().await.unwrap();
        assert!(db.players().load_player_stat(1, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_write_wins() {
        let db = Database::new_in_memory().await.unwrap();
        let game = sample_game(2018040643, GameType::AllStar);
        db.games().store_game(&game).await.unwrap();
        let repo = db.players();

        repo.store_player_stat(&game, &skater(8474141, "Patrick Kane", 1))
            .await
            .unwrap();
        repo.store_player_stat(&game, &skater(8474141, "Patrick Kane", 3))
            .await
            .unwrap();

        assert_eq!(count(&db, "players").await, 1);
        assert_eq!(count(&db, "skater_stats").await, 1);
        let sheet = repo.load_player_stat(8474141, 2018040643).await.unwrap().unwrap();
        match sheet.stats {
            Some(StatLine::Skater(s)) => assert_eq!(s.goals, 3),
            other => panic!("expected skater stats, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_position_change_keeps_one_stat_row() {
        let db = Database::new_in_memory().await.unwrap();
        let game = sample_game(2018040643, GameType::AllStar);
        db.games().store_game(&game).await.unwrap();
        let repo = db.players();

        let mut as_skater = skater(8470000, "Utility Player", 0);
        repo.store_player_stat(&game, &as_skater).await.unwrap();

        as_skater = goalie(8470000, "Utility Player", 0.9);
        repo.store_player_stat(&game, &as_skater).await.unwrap();

        assert_eq!(count(&db, "skater_stats").await, 0);
        assert_eq!(count(&db, "goalie_stats").await, 1);
    }

    #[tokio::test]
    async fn test_top_players_needs_both_game_types() {
        let db = Database::new_in_memory().await.unwrap();
        let games = db.games();
        let players = db.players();

        let all_star = sample_game(2018040643, GameType::AllStar);
        let final_one = sample_game(2018030411, GameType::Playoff);
        let final_seven = sample_game(2018030417, GameType::Playoff);
        for game in [&all_star, &final_one, &final_seven] {
            games.store_game(game).await.unwrap();
        }

        // Both types, two finals
        let kane = skater(8474141, "Patrick Kane", 1);
        players.store_player_stat(&all_star, &kane).await.unwrap();
        players.store_player_stat(&final_one, &kane).await.unwrap();
        players.store_player_stat(&final_seven, &kane).await.unwrap();
        // All-star only
        let hall = skater(8475791, "Taylor Hall", 0);
        players.store_player_stat(&all_star, &hall).await.unwrap();
        // Playoffs only
        let binnington = goalie(8476412, "Jordan Binnington", 0.9);
        players.store_player_stat(&final_seven, &binnington).await.unwrap();

        let top = players.top_players(all_star.season).await.unwrap();
        assert_eq!(
            top,
            vec![TopPlayer {
                person_id: 8474141,
                full_name: "Patrick Kane".to_string(),
                game_pk: 2018030417,
            }]
        );

        let other_season: Season = "20172018".parse().unwrap();
        assert!(players.top_players(other_season).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_top_player_name_comes_from_final_row() {
        let db = Database::new_in_memory().await.unwrap();
        let all_star = sample_game(2018040643, GameType::AllStar);
        let final_seven = sample_game(2018030417, GameType::Playoff);
        db.games().store_game(&all_star).await.unwrap();
        db.games().store_game(&final_seven).await.unwrap();

        // Spelled differently per game, the all-star spelling sorts last
        let players = db.players();
        players
            .store_player_stat(&all_star, &skater(8474141, "Zach Kane", 1))
            .await
            .unwrap();
        players
            .store_player_stat(&final_seven, &skater(8474141, "Patrick Kane", 0))
            .await
            .unwrap();

        let top = players.top_players(all_star.season).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].full_name, "Patrick Kane");
        assert_eq!(top[0].game_pk, 2018030417);
    }
}
