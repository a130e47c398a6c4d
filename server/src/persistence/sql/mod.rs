//! SQL-backed persistence over the sqlx `Any` driver.

mod database;
mod game_repo;
mod player_repo;
pub mod schema;


pub use database::Database;
