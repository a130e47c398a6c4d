//! Relational storage for games, per-game player rows and stat lines.
//!
//! The schema is owned by [`sql::schema`]; repositories in [`sql`] implement
//! the traits in [`traits`] against any sqlx `Any` backend (MySQL/MariaDB in
//! production, SQLite for local runs and tests).

pub mod sql;
pub mod traits;

use nhl_client::{GameType, Season, StatLine};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid value {value:?} in column {column}")]
    InvalidValue { column: &'static str, value: String },
}

impl PersistenceError {
    /// Driver error number (MySQL) or code (SQLSTATE / SQLite result code),
    /// as shown on error pages.
    pub fn code(&self) -> Option<String> {
        match self {
            PersistenceError::Database(sqlx::Error::Database(db)) => {
                if let Some(mysql) = db.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
                    return Some(mysql.number().to_string());
                }
                db.code().map(|c| c.into_owned())
            }
            PersistenceError::Database(sqlx::Error::Io(e)) | PersistenceError::Io(e) => {
                e.raw_os_error().map(|c| c.to_string())
            }
            _ => None,
        }
    }

    /// Driver message without the wrapper prefix.
    pub fn message(&self) -> String {
        match self {
            PersistenceError::Database(sqlx::Error::Database(db)) => db.message().to_string(),
            PersistenceError::Database(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

/// A stored game as shown on the stats page.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    pub game_pk: i64,
    pub season: Season,
    pub game_type: GameType,
    pub game_date: Option<String>,
    pub away_team_id: Option<i64>,
    pub away_team_name: Option<String>,
    pub away_score: Option<i64>,
    pub home_team_id: Option<i64>,
    pub home_team_name: Option<String>,
    pub home_score: Option<i64>,
}

/// A player's personal data and stat line for one game.
///
/// `stats` is `None` when the player row exists without its stat row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatSheet {
    pub game_pk: i64,
    pub person_id: i64,
    pub full_name: String,
    pub birth_date: Option<String>,
    pub birth_city: Option<String>,
    pub birth_country: Option<String>,
    pub nationality: Option<String>,
    pub jersey_number: Option<i64>,
    pub position_name: String,
    pub team_name: Option<String>,
    pub team_id: Option<i64>,
    pub stats: Option<StatLine>,
}

/// A player who appeared in both an all-star and a playoff game of a season,
/// with their latest playoff game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopPlayer {
    pub person_id: i64,
    pub full_name: String,
    pub game_pk: i64,
}
