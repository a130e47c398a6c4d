//! HTTP surface: HTML pages over the stats database, an update trigger,
//! a health check and request metrics.
//!
//! - endpoints: axum handlers, one module per page group
//! - views: HTML rendering
//! - parsers: query parameter parsing
//! - metrics: counters exposed on `/metrics`

mod endpoints;
mod metrics;
mod parsers;
mod views;

use axum::extract::{MatchedPath, Request, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use nhl_client::StatsApi;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::persistence::sql::Database;

pub use metrics::Metrics;

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub db: Database,
    pub api: Arc<dyn StatsApi>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: ServerConfig, db: Database, api: Arc<dyn StatsApi>) -> Self {
        Self {
            config: Arc::new(config),
            db,
            api,
            metrics: Arc::new(Metrics::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(endpoints::pages::home))
        .route("/stats", get(endpoints::pages::stats))
        .route("/update/", get(endpoints::update::update_default))
        .route("/update/:count", get(endpoints::update::update_count))
        .route("/check/", get(endpoints::health::check))
        .route("/metrics", get(endpoints::health::metrics))
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_requests,
        ))
        .layer(middleware::map_response(no_cache))
        .with_state(state)
}

async fn track_requests(
    State(metrics): State<Arc<Metrics>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    metrics.record_request(method.as_str(), &path, response.status().as_u16());
    response
}

async fn no_cache(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sql::test_fixtures::{goalie, sample_game, skater};
    use crate::persistence::traits::GameRepository;
    use axum::body::Body;
    use axum::http::StatusCode;
    use nhl_client::mock::MockStatsApi;
    use nhl_client::{GameType, Season};
    use tower::ServiceExt;

    fn config() -> ServerConfig {
        ServerConfig::from_lookup(|_| None).unwrap()
    }

    fn mock_api() -> MockStatsApi {
        let season: Season = "20182019".parse().unwrap();
        MockStatsApi::new()
            .with_seasons(vec![season])
            .with_games(
                season,
                GameType::AllStar,
                vec![sample_game(2018040643, GameType::AllStar)],
            )
            .with_games(
                season,
                GameType::Playoff,
                vec![sample_game(2018030417, GameType::Playoff)],
            )
            .with_players(2018040643, vec![skater(8474141, "Patrick Kane", 1)])
            .with_players(
                2018030417,
                vec![
                    skater(8474141, "Patrick Kane", 2),
                    goalie(8476412, "Jordan Binnington", 0.9),
                ],
            )
    }

    async fn app() -> (Router, AppState) {
        let db = Database::new_in_memory().await.unwrap();
        let state = AppState::new(config(), db, Arc::new(mock_api()));
        (router(state.clone()), state)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = app
            .clone()
            .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = app().await;
        let (status, headers, body) = get(&app, "/check/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
        assert_eq!(headers[CACHE_CONTROL], "no-cache, no-store");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_cached() {
        let (app, _) = app().await;
        let (status, headers, _) = get(&app, "/cpuburn/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(headers[CACHE_CONTROL], "no-cache, no-store");
    }

    #[tokio::test]
    async fn test_home_on_empty_database() {
        let (app, _) = app().await;
        let (status, _, body) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Database empty"));
        assert!(body.contains("href=\"/update/\""));
    }

    #[tokio::test]
    async fn test_update_then_browse() {
        let (app, _) = app().await;

        let (status, _, body) = get(&app, "/update/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Database updated"));

        let (_, _, home) = get(&app, "/").await;
        assert!(home.contains("Season: 2018-2019"));
        assert!(home.contains("/stats?gamePk=2018030417&amp;personId=8474141"));
        assert!(!home.contains("Binnington"));

        let (status, _, stats) = get(&app, "/stats?gamePk=2018030417&personId=8474141").await;
        assert_eq!(status, StatusCode::OK);
        assert!(stats.contains("Playoff game 2018030417"));
        assert!(stats.contains("<h2>Patrick Kane</h2>"));
        assert!(stats.contains("<tr><th>Goals</th><td>2</td></tr>"));
    }

    #[tokio::test]
    async fn test_stats_with_bad_params_renders_empty_sections() {
        let (app, _) = app().await;
        let (status, _, body) = get(&app, "/stats?gamePk=abc").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h2>Game</h2>"));
        assert!(body.contains("<h2>Player</h2>"));
    }

    #[tokio::test]
    async fn test_update_with_invalid_season() {
        let (app, state) = app().await;
        let (status, _, body) = get(&app, "/update/123456789").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("invalid season identifier"));
        assert!(state.db.games().list_seasons().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_single_season() {
        let (app, state) = app().await;
        let (status, _, _) = get(&app, "/update/20182019").await;
        assert_eq!(status, StatusCode::OK);
        let seasons = state.db.games().list_seasons().await.unwrap();
        assert_eq!(seasons, vec!["20182019".parse().unwrap()]);
    }

    #[tokio::test]
    async fn test_database_error_page() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=ro", dir.path().join("missing.db").display());
        let db = Database::connect_lazy(&url).unwrap();
        let app = router(AppState::new(config(), db, Arc::new(mock_api())));

        let (status, headers, body) = get(&app, "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("<title>Database error</title>"));
        assert!(body.contains("Error no: "));
        assert_eq!(headers[CACHE_CONTROL], "no-cache, no-store");
    }

    #[tokio::test]
    async fn test_metrics_counts_requests() {
        let (app, _) = app().await;
        get(&app, "/check/").await;
        get(&app, "/check/").await;
        get(&app, "/update/2").await;

        let (status, headers, body) = get(&app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[axum::http::header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert!(body.contains("path=\"/check/\",status=\"200\"} 2"));
        assert!(body.contains("path=\"/update/:count\",status=\"200\"} 1"));
        assert!(body.contains("nhltop_updates_total 1"));
        assert!(body.contains("nhltop_players_stored_total 3"));
    }
}
