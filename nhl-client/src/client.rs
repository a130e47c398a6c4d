//! HTTP client for the NHL stats API

use crate::error::{ClientError, ClientResult, FetchError};
use crate::extract;
use crate::fetch::{Fetched, RetryPolicy};
use crate::types::{
    Boxscore, Game, GameType, PlayerRecord, ScheduleResponse, Season, SeasonsResponse,
};
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Public stats API root.
pub const DEFAULT_BASE_URL: &str = "https://statsapi.web.nhl.com/api/v1";

const USER_AGENT: &str = concat!("nhltop/", env!("CARGO_PKG_VERSION"));

/// Network client for the stats API. Cheap to clone; clones share a
/// connection pool.
#[derive(Debug, Clone)]
pub struct NhlClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl NhlClient {
    /// Client for the public API with the default retry policy.
    pub fn new() -> ClientResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, RetryPolicy::default())
    }

    /// Client for an API rooted at `base_url`.
    pub fn with_base_url(base_url: &str, retry: RetryPolicy) -> ClientResult<Self> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(retry.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `url` and decode the body, retrying transient statuses.
    pub async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Fetched<T> {
        let mut retries = 0;

        loop {
            let response = match self.http.get(url).send().await {
                Ok(response) => response,
                Err(e) if is_transport_failure(&e) && retries < self.retry.max_retries => {
                    retries += 1;
                    let delay = self.retry.backoff(retries);
                    tracing::debug!(url, error = %e, retries, ?delay, "retrying after transport error");
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) => return request_failure(url, e),
            };

            let status = response.status();
            if self.retry.is_retryable(status) {
                if retries >= self.retry.max_retries {
                    return Fetched::Transient(FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                retries += 1;

                let header = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok());
                let delay = self
                    .retry
                    .retry_after(status, header)
                    .unwrap_or_else(|| self.retry.backoff(retries));
                tracing::debug!(url, status = status.as_u16(), retries, ?delay, "retrying");
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                return Fetched::Permanent(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) if is_transport_failure(&e) && retries < self.retry.max_retries => {
                    retries += 1;
                    let delay = self.retry.backoff(retries);
                    tracing::debug!(url, error = %e, retries, ?delay, "retrying after body read error");
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) => return request_failure(url, e),
            };
            if body.iter().all(u8::is_ascii_whitespace) {
                return Fetched::NoData;
            }

            return match serde_json::from_slice(&body) {
                Ok(value) => Fetched::Data(value),
                Err(source) => Fetched::Permanent(FetchError::Decode {
                    url: url.to_string(),
                    source,
                }),
            };
        }
    }

    /// GET `url` as raw JSON, or an empty object if anything went wrong.
    pub async fn fetch_value(&self, url: &str) -> Value {
        self.fetch::<Value>(url)
            .await
            .into_data()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }

    /// The `count` (clamped to 1..=15) most recent finished seasons,
    /// oldest first. Empty when the API is unreachable.
    pub async fn last_seasons(&self, count: i64) -> Vec<Season> {
        let count = extract::clamp_season_count(count);

        let Some(current) = self
            .fetch::<SeasonsResponse>(&self.endpoint("seasons/current"))
            .await
            .into_data()
        else {
            return Vec::new();
        };
        let Some(current) = current.seasons.first().map(|s| s.season_id) else {
            tracing::warn!("current season listing is empty");
            return Vec::new();
        };

        let Some(listing) = self
            .fetch::<SeasonsResponse>(&self.endpoint("seasons"))
            .await
            .into_data()
        else {
            return Vec::new();
        };
        let listing: Vec<Season> = listing.seasons.iter().map(|s| s.season_id).collect();

        extract::select_last_seasons(&listing, current, count)
    }

    /// All games of one type in a season, each dated by its schedule day.
    pub async fn season_games(&self, season: Season, game_type: GameType) -> Vec<Game> {
        let url = self.endpoint(&format!(
            "schedule?season={season}&gameType={}",
            game_type.code()
        ));
        self.fetch::<ScheduleResponse>(&url)
            .await
            .into_data()
            .map(extract::flatten_schedule)
            .unwrap_or_default()
    }

    /// Players who recorded stats in the game.
    pub async fn game_players(&self, game_pk: i64) -> Vec<PlayerRecord> {
        let url = self.endpoint(&format!("game/{game_pk}/boxscore"));
        self.fetch::<Boxscore>(&url)
            .await
            .into_data()
            .map(extract::flatten_boxscore)
            .unwrap_or_default()
    }
}

/// Connection refused or dropped, timeouts, and responses cut off mid-body.
fn is_transport_failure(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_request() || e.is_body()
}

fn request_failure<T>(url: &str, e: reqwest::Error) -> Fetched<T> {
    let url = url.to_string();
    if e.is_timeout() {
        Fetched::Transient(FetchError::Timeout { url })
    } else if e.is_connect() {
        Fetched::Transient(FetchError::Connect { url, source: e })
    } else if is_transport_failure(&e) {
        Fetched::Transient(FetchError::Request { url, source: e })
    } else {
        Fetched::Permanent(FetchError::Request { url, source: e })
    }
}
