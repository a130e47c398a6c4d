//! Pure transformations from API payloads to the records the pipeline stores.

use crate::types::{
    Boxscore, BoxscoreTeam, Game, PlayerRecord, RosterEntry, ScheduleResponse, Season, StatLine,
    TeamRef, GOALIE_POSITION,
};

/// Smallest and largest number of seasons a single update may cover.
pub const MIN_SEASONS: usize = 1;
pub const MAX_SEASONS: usize = 15;

/// Index (0-based) of the `gamePk` digit that marks the playoff round.
const ROUND_DIGIT_INDEX: usize = 7;
/// Round digit of the final series.
const FINAL_ROUND_DIGIT: char = '4';

/// Clamp a requested season count to `[1, 15]`.
pub fn clamp_season_count(count: i64) -> usize {
    count.clamp(MIN_SEASONS as i64, MAX_SEASONS as i64) as usize
}

/// Pick the `count` most recent finished seasons from the full listing.
///
/// If the newest listed season is the one in progress it is skipped. The
/// result keeps the listing's (oldest-first) order.
pub fn select_last_seasons(listing: &[Season], current: Season, count: usize) -> Vec<Season> {
    let skip = usize::from(listing.last() == Some(&current));
    let end = listing.len().saturating_sub(skip);
    let start = end.saturating_sub(count);
    listing[start..end].to_vec()
}

/// Flatten a schedule into games, stamping each with its listing date.
///
/// The embedded `gameDate` is a UTC timestamp that can roll over to the next
/// day; the listing date is the local game day.
pub fn flatten_schedule(schedule: ScheduleResponse) -> Vec<Game> {
    schedule
        .dates
        .into_iter()
        .flat_map(|day| {
            let date = day.date;
            day.games.into_iter().map(move |mut game| {
                game.game_date = date.clone();
                game
            })
        })
        .collect()
}

/// True when the `gamePk` carries the final-series marker.
pub fn is_final_game(game_pk: i64) -> bool {
    game_pk.to_string().chars().nth(ROUND_DIGIT_INDEX) == Some(FINAL_ROUND_DIGIT)
}

/// Keep only the final-series games of a playoff schedule.
pub fn final_games(playoff_games: Vec<Game>) -> Vec<Game> {
    playoff_games
        .into_iter()
        .filter(|game| is_final_game(game.game_pk))
        .collect()
}

/// Players who recorded stats in the game, away roster first.
pub fn flatten_boxscore(boxscore: Boxscore) -> Vec<PlayerRecord> {
    let Boxscore { teams } = boxscore;
    let mut players = roster_records(teams.away);
    players.extend(roster_records(teams.home));
    players
}

fn roster_records(roster: BoxscoreTeam) -> Vec<PlayerRecord> {
    let BoxscoreTeam { team, players } = roster;
    players
        .into_values()
        .filter(|entry| !entry.stats.is_empty())
        .filter_map(|entry| {
            let person_id = entry.person.id;
            let record = player_record(entry, &team);
            if record.is_none() {
                tracing::warn!(person_id, team = %team.name, "stat line does not match position, skipping");
            }
            record
        })
        .collect()
}

fn player_record(entry: RosterEntry, team: &TeamRef) -> Option<PlayerRecord> {
    let RosterEntry {
        person,
        jersey_number,
        position,
        stats,
    } = entry;

    let stats = if position.name == GOALIE_POSITION {
        StatLine::Goalie(stats.goalie_stats?)
    } else {
        StatLine::Skater(stats.skater_stats?)
    };

    Some(PlayerRecord {
        person,
        jersey_number: jersey_number.and_then(|n| n.trim().parse().ok()),
        position_name: position.name,
        team: team.clone(),
        stats,
    })
}
