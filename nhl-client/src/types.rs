//! Typed records for the stats API payloads.
//!
//! Wire structs mirror the JSON layout closely enough for serde to validate
//! it on decode; the flattened [`PlayerRecord`] is what the rest of the
//! system works with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Position name the API uses for goaltenders.
pub const GOALIE_POSITION: &str = "Goalie";

// ── Season ─────────────────────────────────────────────────────────────

/// An 8-digit season identifier such as `20182019`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "SeasonRepr", into = "String")]
pub struct Season(u32);

#[derive(Deserialize)]
#[serde(untagged)]
enum SeasonRepr {
    Text(String),
    Number(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid season identifier {0:?}: expected 8 digits")]
pub struct InvalidSeason(pub String);

impl Season {
    /// Numeric form, as stored in the database.
    pub fn id(self) -> u32 {
        self.0
    }

    pub fn start_year(self) -> u32 {
        self.0 / 10_000
    }

    pub fn end_year(self) -> u32 {
        self.0 % 10_000
    }

    /// Human-readable form, e.g. `2018-2019`.
    pub fn label(self) -> String {
        format!("{}-{}", self.start_year(), self.end_year())
    }
}

impl FromStr for Season {
    type Err = InvalidSeason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) || s.starts_with('0') {
            return Err(InvalidSeason(s.to_string()));
        }
        s.parse().map(Season).map_err(|_| InvalidSeason(s.to_string()))
    }
}

impl TryFrom<u64> for Season {
    type Error = InvalidSeason;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        value.to_string().parse()
    }
}

impl TryFrom<i64> for Season {
    type Error = InvalidSeason;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        value.to_string().parse()
    }
}

impl TryFrom<SeasonRepr> for Season {
    type Error = InvalidSeason;

    fn try_from(repr: SeasonRepr) -> Result<Self, Self::Error> {
        match repr {
            SeasonRepr::Text(s) => s.parse(),
            SeasonRepr::Number(n) => Season::try_from(n),
        }
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.to_string()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

// ── GameType ───────────────────────────────────────────────────────────

/// Competitive context of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameType {
    #[serde(rename = "A")]
    AllStar,
    #[serde(rename = "P")]
    Playoff,
    #[serde(rename = "R")]
    Regular,
    #[serde(rename = "PR")]
    Preseason,
    #[serde(other)]
    Other,
}

impl GameType {
    pub fn code(self) -> &'static str {
        match self {
            GameType::AllStar => "A",
            GameType::Playoff => "P",
            GameType::Regular => "R",
            GameType::Preseason => "PR",
            GameType::Other => "?",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "A" => GameType::AllStar,
            "P" => GameType::Playoff,
            "R" => GameType::Regular,
            "PR" => GameType::Preseason,
            _ => GameType::Other,
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ── Seasons endpoint ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonsResponse {
    #[serde(default)]
    pub seasons: Vec<SeasonEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonEntry {
    pub season_id: Season,
}

// ── Schedule endpoint ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub dates: Vec<ScheduleDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleDate {
    pub date: String,
    #[serde(default)]
    pub games: Vec<Game>,
}

/// One scheduled game with its final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub game_pk: i64,
    pub season: Season,
    pub game_type: GameType,
    #[serde(default)]
    pub game_date: String,
    pub teams: Matchup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub away: TeamScore,
    pub home: TeamScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamScore {
    pub team: TeamRef,
    #[serde(default)]
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: i64,
    pub name: String,
}

// ── Boxscore endpoint ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Boxscore {
    pub teams: BoxscoreTeams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoxscoreTeams {
    pub away: BoxscoreTeam,
    pub home: BoxscoreTeam,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoxscoreTeam {
    pub team: TeamRef,
    #[serde(default)]
    pub players: BTreeMap<String, RosterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub person: Person,
    #[serde(default)]
    pub jersey_number: Option<String>,
    pub position: Position,
    #[serde(default)]
    pub stats: RosterStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub birth_city: Option<String>,
    #[serde(default)]
    pub birth_country: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Position {
    pub name: String,
}

/// A roster entry's `stats` object; empty for players who did not dress.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStats {
    #[serde(default)]
    pub skater_stats: Option<SkaterStats>,
    #[serde(default)]
    pub goalie_stats: Option<GoalieStats>,
}

impl RosterStats {
    pub fn is_empty(&self) -> bool {
        self.skater_stats.is_none() && self.goalie_stats.is_none()
    }
}

/// Per-game goaltender line. `pim` and `save_percentage` are missing for
/// some games and default to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalieStats {
    pub time_on_ice: String,
    pub assists: i64,
    pub goals: i64,
    #[serde(default)]
    pub pim: i64,
    pub shots: i64,
    pub saves: i64,
    pub power_play_saves: i64,
    pub short_handed_saves: i64,
    pub even_saves: i64,
    pub short_handed_shots_against: i64,
    pub even_shots_against: i64,
    pub power_play_shots_against: i64,
    #[serde(default)]
    pub save_percentage: f64,
}

/// Per-game skater line. Hits, takeaways, giveaways and blocked shots are
/// not recorded for every game (all-star games in particular).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkaterStats {
    pub time_on_ice: String,
    pub assists: i64,
    pub goals: i64,
    pub shots: i64,
    #[serde(default)]
    pub hits: i64,
    pub power_play_goals: i64,
    pub power_play_assists: i64,
    pub penalty_minutes: i64,
    pub face_off_wins: i64,
    pub faceoff_taken: i64,
    #[serde(default)]
    pub takeaways: i64,
    #[serde(default)]
    pub giveaways: i64,
    pub short_handed_goals: i64,
    pub short_handed_assists: i64,
    #[serde(default)]
    pub blocked: i64,
    pub plus_minus: i64,
    pub even_time_on_ice: String,
    pub power_play_time_on_ice: String,
    pub short_handed_time_on_ice: String,
}

// ── Flattened records ──────────────────────────────────────────────────

/// A player's stat line for one game; goalies and skaters never mix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StatLine {
    Goalie(GoalieStats),
    Skater(SkaterStats),
}

/// One player's appearance in one game, with the team they dressed for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    pub person: Person,
    pub jersey_number: Option<i64>,
    pub position_name: String,
    pub team: TeamRef,
    pub stats: StatLine,
}

impl PlayerRecord {
    pub fn is_goalie(&self) -> bool {
        matches!(self.stats, StatLine::Goalie(_))
    }
}
