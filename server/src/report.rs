//! Top players per stored season: the landing page content and the
//! `report` command's text output.

use nhl_client::{GameType, GoalieStats, Season, SkaterStats, StatLine};
use std::fmt::Write;

use crate::persistence::traits::{GameRepository, PlayerRepository};
use crate::persistence::{GameSummary, PersistenceError, PlayerStatSheet, TopPlayer};

/// One season with the players who appeared in both its all-star game and
/// its finals.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonTopPlayers {
    pub season: Season,
    pub players: Vec<TopPlayer>,
}

/// A top player with their final game and stat sheet for that game.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub player: TopPlayer,
    pub game: Option<GameSummary>,
    pub sheet: Option<PlayerStatSheet>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonReport {
    pub season: Season,
    pub entries: Vec<ReportEntry>,
}

/// Every stored season, oldest first, with its top players.
pub async fn top_players_by_season<G, P>(
    games: &G,
    players: &P,
) -> Result<Vec<SeasonTopPlayers>, PersistenceError>
where
    G: GameRepository,
    P: PlayerRepository,
{
    let mut seasons = games.list_seasons().await?;
    seasons.sort();

    let mut report = Vec::with_capacity(seasons.len());
    for season in seasons {
        let top = players.top_players(season).await?;
        report.push(SeasonTopPlayers {
            season,
            players: top,
        });
    }
    Ok(report)
}

/// [`top_players_by_season`] with each player's game summary and stat sheet
/// loaded.
pub async fn detailed_report<G, P>(
    games: &G,
    players: &P,
) -> Result<Vec<SeasonReport>, PersistenceError>
where
    G: GameRepository,
    P: PlayerRepository,
{
    let seasons = top_players_by_season(games, players).await?;

    let mut report = Vec::with_capacity(seasons.len());
    for season in seasons {
        let mut entries = Vec::with_capacity(season.players.len());
        for player in season.players {
            let game = games.load_game(player.game_pk).await?;
            let sheet = players
                .load_player_stat(player.person_id, player.game_pk)
                .await?;
            entries.push(ReportEntry {
                player,
                game,
                sheet,
            });
        }
        report.push(SeasonReport {
            season: season.season,
            entries,
        });
    }
    Ok(report)
}

pub fn game_type_name(game_type: GameType) -> &'static str {
    match game_type {
        GameType::AllStar => "All-Star game",
        GameType::Playoff => "Playoff game",
        GameType::Regular => "Regular season game",
        GameType::Preseason => "Preseason game",
        GameType::Other => "Game",
    }
}

fn goalie_fields(s: &GoalieStats) -> Vec<(&'static str, String)> {
    vec![
        ("Time on ice", s.time_on_ice.clone()),
        ("Assists", s.assists.to_string()),
        ("Goals", s.goals.to_string()),
        ("Penalty minutes", s.pim.to_string()),
        ("Shots against", s.shots.to_string()),
        ("Saves", s.saves.to_string()),
        ("Power play saves", s.power_play_saves.to_string()),
        ("Short handed saves", s.short_handed_saves.to_string()),
        ("Even saves", s.even_saves.to_string()),
        ("Short handed shots against", s.short_handed_shots_against.to_string()),
        ("Even shots against", s.even_shots_against.to_string()),
        ("Power play shots against", s.power_play_shots_against.to_string()),
        ("Save percentage", format!("{:.2}", s.save_percentage)),
    ]
}

fn skater_fields(s: &SkaterStats) -> Vec<(&'static str, String)> {
    vec![
        ("Time on ice", s.time_on_ice.clone()),
        ("Assists", s.assists.to_string()),
        ("Goals", s.goals.to_string()),
        ("Shots", s.shots.to_string()),
        ("Hits", s.hits.to_string()),
        ("Power play goals", s.power_play_goals.to_string()),
        ("Power play assists", s.power_play_assists.to_string()),
        ("Penalty minutes", s.penalty_minutes.to_string()),
        ("Faceoff wins", s.face_off_wins.to_string()),
        ("Faceoffs taken", s.faceoff_taken.to_string()),
        ("Takeaways", s.takeaways.to_string()),
        ("Giveaways", s.giveaways.to_string()),
        ("Short handed goals", s.short_handed_goals.to_string()),
        ("Short handed assists", s.short_handed_assists.to_string()),
        ("Blocked shots", s.blocked.to_string()),
        ("Plus/minus", s.plus_minus.to_string()),
        ("Even time on ice", s.even_time_on_ice.clone()),
        ("Power play time on ice", s.power_play_time_on_ice.clone()),
        ("Short handed time on ice", s.short_handed_time_on_ice.clone()),
    ]
}

/// Labelled values of a stat line, unescaped.
pub fn stat_fields(line: &StatLine) -> Vec<(&'static str, String)> {
    match line {
        StatLine::Goalie(s) => goalie_fields(s),
        StatLine::Skater(s) => skater_fields(s),
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn write_game(out: &mut String, g: &GameSummary) {
    let _ = writeln!(
        out,
        "    {} {}, {}",
        game_type_name(g.game_type),
        g.game_pk,
        or_dash(g.game_date.as_deref())
    );
    let score = |s: Option<i64>| s.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    let _ = writeln!(
        out,
        "    {} {} at {} {}",
        or_dash(g.away_team_name.as_deref()),
        score(g.away_score),
        or_dash(g.home_team_name.as_deref()),
        score(g.home_score)
    );
}

fn write_sheet(out: &mut String, p: &PlayerStatSheet) {
    let number = p
        .jersey_number
        .map(|n| format!(" #{n}"))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "    {}{}, {}",
        p.position_name,
        number,
        or_dash(p.team_name.as_deref())
    );
    let _ = writeln!(
        out,
        "    Born {} in {}, {}; nationality {}",
        or_dash(p.birth_date.as_deref()),
        or_dash(p.birth_city.as_deref()),
        or_dash(p.birth_country.as_deref()),
        or_dash(p.nationality.as_deref())
    );
    if let Some(stats) = &p.stats {
        for (label, value) in stat_fields(stats) {
            let _ = writeln!(out, "      {label}: {value}");
        }
    }
}

/// Plain-text rendering for the terminal.
pub fn render_text(report: &[SeasonReport]) -> String {
    if report.is_empty() {
        return "The database is empty. Run `nhltop-server update` to fetch data.\n".to_string();
    }

    let mut out = String::new();
    for season in report {
        let _ = writeln!(out, "Season: {}", season.season.label());
        for entry in &season.entries {
            let player = &entry.player;
            let _ = writeln!(
                out,
                "  {} (personId={}, gamePk={})",
                player.full_name, player.person_id, player.game_pk
            );
            if let Some(game) = &entry.game {
                write_game(&mut out, game);
            }
            if let Some(sheet) = &entry.sheet {
                write_sheet(&mut out, sheet);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sql::test_fixtures::{goalie, sample_game, skater};
    use crate::persistence::sql::Database;

    #[tokio::test]
    async fn test_report_on_empty_database() {
        let db = Database::new_in_memory().await.unwrap();
        let report = detailed_report(&db.games(), &db.players()).await.unwrap();
        assert!(report.is_empty());
        assert!(render_text(&report).contains("database is empty"));
    }

    #[tokio::test]
    async fn test_report_lists_seasons_in_order() {
        let db = Database::new_in_memory().await.unwrap();
        let kane = skater(8474141, "Patrick Kane", 1);
        for pk in [2018040643, 2017040643] {
            let game = sample_game(pk, GameType::AllStar);
            db.games().store_game(&game).await.unwrap();
            db.players().store_player_stat(&game, &kane).await.unwrap();
        }
        let final_game = sample_game(2018030415, GameType::Playoff);
        db.games().store_game(&final_game).await.unwrap();
        db.players().store_player_stat(&final_game, &kane).await.unwrap();

        let top = top_players_by_season(&db.games(), &db.players()).await.unwrap();
        let seasons: Vec<String> = top.iter().map(|r| r.season.label()).collect();
        assert_eq!(seasons, vec!["2017-2018", "2018-2019"]);
        assert!(top[0].players.is_empty());
        assert_eq!(top[1].players.len(), 1);

        let report = detailed_report(&db.games(), &db.players()).await.unwrap();
        assert_eq!(report.len(), 2);
        let entry = &report[1].entries[0];
        assert_eq!(entry.game.as_ref().map(|g| g.game_pk), Some(2018030415));
        assert_eq!(entry.sheet.as_ref().and_then(|s| s.stats.clone()), Some(kane.stats.clone()));

        let text = render_text(&report);
        assert!(text.starts_with(
            "Season: 2017-2018\nSeason: 2018-2019\n  Patrick Kane (personId=8474141, gamePk=2018030415)\n"
        ));
        assert!(text.contains("    Playoff game 2018030415, 2019-01-26\n"));
        assert!(text.contains("    Metropolitan All-Stars 4 at Central All-Stars 5\n"));
        assert!(text.contains("    Right Wing #88, Central All-Stars\n"));
        assert!(text.contains("    Born 1988-11-19 in Buffalo, USA; nationality USA\n"));
        assert!(text.contains("      Time on ice: 14:31\n"));
        assert!(text.contains("      Shots: 5\n"));
        assert!(!text.contains("Saves"));
    }

    #[tokio::test]
    async fn test_report_prints_goalie_line() {
        let db = Database::new_in_memory().await.unwrap();
        let binnington = goalie(8476412, "Jordan Binnington", 0.94);
        for (pk, game_type) in [(2018040643, GameType::AllStar), (2018030417, GameType::Playoff)] {
            let game = sample_game(pk, game_type);
            db.games().store_game(&game).await.unwrap();
            db.players().store_player_stat(&game, &binnington).await.unwrap();
        }

        let text = render_text(&detailed_report(&db.games(), &db.players()).await.unwrap());
        assert!(text.contains("  Jordan Binnington (personId=8476412, gamePk=2018030417)\n"));
        assert!(text.contains("    Goalie #50, Central All-Stars\n"));
        assert!(text.contains("      Save percentage: 0.94\n"));
        assert!(!text.contains("Faceoff wins"));
    }
}
