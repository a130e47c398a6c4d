//! Versioned schema for the stats tables.
//!
//! There are no incremental migrations: when the stored version is missing or
//! differs from [`SCHEMA_VERSION`], every table is dropped and recreated. The
//! data is a cache of the remote API and can always be fetched again.

use sqlx::AnyPool;

use crate::persistence::PersistenceError;

/// Version the tables below are created at.
pub const SCHEMA_VERSION: i64 = 1;

/// What [`ensure_schema`] found and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    /// The version table did not exist; all tables were created.
    Created,
    /// A different (or no) version was recorded; all tables were recreated.
    Reset { previous: Option<i64> },
    /// Already at [`SCHEMA_VERSION`]; nothing was touched.
    UpToDate,
}

/// Children first, so foreign keys never block a drop.
const DROP_STATEMENTS: &[&str] = &[
    "DROP TABLE IF EXISTS schema_version",
    "DROP TABLE IF EXISTS goalie_stats",
    "DROP TABLE IF EXISTS skater_stats",
    "DROP TABLE IF EXISTS players",
    "DROP TABLE IF EXISTS games",
];

const CREATE_STATEMENTS: &[&str] = &[
    "CREATE TABLE games (
        game_pk BIGINT NOT NULL PRIMARY KEY,
        season BIGINT NOT NULL,
        game_type VARCHAR(4) NOT NULL,
        game_date VARCHAR(10),
        away_team_id BIGINT,
        away_team_name VARCHAR(255),
        away_score BIGINT,
        home_team_id BIGINT,
        home_team_name VARCHAR(255),
        home_score BIGINT
    )",
    "CREATE INDEX idx_games_season ON games (season)",
    "CREATE TABLE players (
        game_pk BIGINT NOT NULL,
        person_id BIGINT NOT NULL,
        full_name VARCHAR(255) NOT NULL,
        birth_date VARCHAR(10),
        birth_city VARCHAR(255),
        birth_country VARCHAR(255),
        nationality VARCHAR(255),
        jersey_number BIGINT,
        position_name VARCHAR(64) NOT NULL,
        team_name VARCHAR(255),
        team_id BIGINT,
        PRIMARY KEY (game_pk, person_id),
        FOREIGN KEY (game_pk) REFERENCES games (game_pk)
            ON DELETE CASCADE ON UPDATE CASCADE
    )",
    "CREATE INDEX idx_players_person ON players (person_id)",
    "CREATE TABLE goalie_stats (
        game_pk BIGINT NOT NULL,
        person_id BIGINT NOT NULL,
        time_on_ice VARCHAR(16) NOT NULL,
        assists BIGINT NOT NULL,
        goals BIGINT NOT NULL,
        pim BIGINT NOT NULL,
        shots BIGINT NOT NULL,
        saves BIGINT NOT NULL,
        power_play_saves BIGINT NOT NULL,
        short_handed_saves BIGINT NOT NULL,
        even_saves BIGINT NOT NULL,
        short_handed_shots_against BIGINT NOT NULL,
        even_shots_against BIGINT NOT NULL,
        power_play_shots_against BIGINT NOT NULL,
        save_percentage DOUBLE NOT NULL,
        PRIMARY KEY (game_pk, person_id),
        FOREIGN KEY (game_pk, person_id) REFERENCES players (game_pk, person_id)
            ON DELETE CASCADE ON UPDATE CASCADE
    )",
    "CREATE TABLE skater_stats (
        game_pk BIGINT NOT NULL,
        person_id BIGINT NOT NULL,
        time_on_ice VARCHAR(16) NOT NULL,
        assists BIGINT NOT NULL,
        goals BIGINT NOT NULL,
        shots BIGINT NOT NULL,
        hits BIGINT NOT NULL,
        power_play_goals BIGINT NOT NULL,
        power_play_assists BIGINT NOT NULL,
        penalty_minutes BIGINT NOT NULL,
        face_off_wins BIGINT NOT NULL,
        faceoff_taken BIGINT NOT NULL,
        takeaways BIGINT NOT NULL,
        giveaways BIGINT NOT NULL,
        short_handed_goals BIGINT NOT NULL,
        short_handed_assists BIGINT NOT NULL,
        blocked BIGINT NOT NULL,
        plus_minus BIGINT NOT NULL,
        even_time_on_ice VARCHAR(16) NOT NULL,
        power_play_time_on_ice VARCHAR(16) NOT NULL,
        short_handed_time_on_ice VARCHAR(16) NOT NULL,
        PRIMARY KEY (game_pk, person_id),
        FOREIGN KEY (game_pk, person_id) REFERENCES players (game_pk, person_id)
            ON DELETE CASCADE ON UPDATE CASCADE
    )",
    "CREATE TABLE schema_version (version BIGINT NOT NULL PRIMARY KEY)",
];

/// True when `err` says the queried table does not exist.
///
/// MySQL reports SQLSTATE `42S02` (error 1146); SQLite only has the generic
/// result code, so its message is checked instead.
pub fn is_missing_table(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db) = err else {
        return false;
    };
    if let Some(mysql) = db.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
        if mysql.number() == 1146 {
            return true;
        }
    }
    db.code().as_deref() == Some("42S02") || db.message().contains("no such table")
}

/// Bring the tables to [`SCHEMA_VERSION`], recreating them if needed.
///
/// Errors other than a missing version table are returned as-is.
#[tracing::instrument(skip_all)]
pub async fn ensure_schema(pool: &AnyPool) -> Result<SchemaStatus, PersistenceError> {
    let found: Result<Option<(i64,)>, sqlx::Error> =
        sqlx::query_as("SELECT version FROM schema_version")
            .fetch_optional(pool)
            .await;

    let status = match found {
        Ok(Some((version,))) if version == SCHEMA_VERSION => {
            tracing::debug!(version, "Schema is up to date");
            return Ok(SchemaStatus::UpToDate);
        }
        Ok(row) => SchemaStatus::Reset {
            previous: row.map(|(v,)| v),
        },
        Err(e) if is_missing_table(&e) => SchemaStatus::Created,
        Err(e) => return Err(e.into()),
    };

    tracing::info!(?status, version = SCHEMA_VERSION, "Recreating schema");
    reset(pool).await?;
    Ok(status)
}

async fn reset(pool: &AnyPool) -> Result<(), PersistenceError> {
    let mut tx = pool.begin().await?;
    for stmt in DROP_STATEMENTS.iter().chain(CREATE_STATEMENTS) {
        sqlx::query(stmt).execute(&mut *tx).await?;
    }
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sql::Database;

    async fn table_count(pool: &AnyPool) -> i64 {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('games', 'players', 'goalie_stats', 'skater_stats', 'schema_version')",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        row.0
    }

    #[tokio::test]
    async fn test_fresh_database_gets_all_tables() {
        let db = Database::new_in_memory().await.unwrap();
        assert_eq!(table_count(db.pool()).await, 5);

        let (version,): (i64,) = sqlx::query_as("SELECT version FROM schema_version")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_second_call_keeps_data() {
        let db = Database::new_in_memory().await.unwrap();
        sqlx::query("INSERT INTO games (game_pk, season, game_type) VALUES (?, ?, ?)")
            .bind(2018040641_i64)
            .bind(20182019_i64)
            .bind("A")
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(db.ensure_schema().await.unwrap(), SchemaStatus::UpToDate);
        assert_eq!(db.ensure_schema().await.unwrap(), SchemaStatus::UpToDate);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM games")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_version_mismatch_resets_tables() {
        let db = Database::new_in_memory().await.unwrap();
        sqlx::query("INSERT INTO games (game_pk, season, game_type) VALUES (?, ?, ?)")
            .bind(2018040641_i64)
            .bind(20182019_i64)
            .bind("A")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("UPDATE schema_version SET version = 0")
            .execute(db.pool())
            .await
            .unwrap();

        let status = db.ensure_schema().await.unwrap();
        assert_eq!(status, SchemaStatus::Reset { previous: Some(0) });

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM games")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_empty_version_table_resets() {
        let db = Database::new_in_memory().await.unwrap();
        sqlx::query("DELETE FROM schema_version")
            .execute(db.pool())
            .await
            .unwrap();

        let status = db.ensure_schema().await.unwrap();
        assert_eq!(status, SchemaStatus::Reset { previous: None });
        assert_eq!(db.ensure_schema().await.unwrap(), SchemaStatus::UpToDate);
    }

    #[tokio::test]
    async fn test_version_is_a_single_row_key() {
        let db = Database::new_in_memory().await.unwrap();
        let duplicate = sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(SCHEMA_VERSION)
            .execute(db.pool())
            .await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let db = Database::new_in_memory().await.unwrap();
        db.pool().close().await;
        assert!(db.ensure_schema().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_table_detection() {
        let db = Database::new_in_memory().await.unwrap();
        let err = sqlx::query("SELECT * FROM no_such_table_here")
            .execute(db.pool())
            .await
            .unwrap_err();
        assert!(is_missing_table(&err));

        let err = sqlx::query("SELEC nonsense")
            .execute(db.pool())
            .await
            .unwrap_err();
        assert!(!is_missing_table(&err));
    }
}
