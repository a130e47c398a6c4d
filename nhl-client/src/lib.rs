//! NHL stats API client library
//!
//! Fetches seasons, schedules and boxscores from the public stats API and
//! flattens them into typed records ready for storage.
//!
//! Every GET goes through [`NhlClient::fetch`], which retries throttling and
//! gateway errors with exponential backoff and reports the outcome as a
//! [`Fetched`] value. The higher-level helpers ([`NhlClient::last_seasons`],
//! [`NhlClient::season_games`], [`NhlClient::game_players`]) treat any
//! failure as "no data" and return an empty collection.
//!
//! # Example
//!
//! ```no_run
//! use nhl_client::{GameType, NhlClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NhlClient::new()?;
//!     for season in client.last_seasons(3).await {
//!         let games = client.season_games(season, GameType::AllStar).await;
//!         println!("{}: {} all-star games", season.label(), games.len());
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
pub mod extract;
mod fetch;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod traits;
mod types;

pub use client::{NhlClient, DEFAULT_BASE_URL};
pub use error::{ClientError, ClientResult, FetchError};
pub use fetch::{Fetched, RetryPolicy, RETRYABLE_STATUSES};
pub use traits::StatsApi;
pub use types::*;
