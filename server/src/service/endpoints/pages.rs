//! Landing and player statistics pages

use axum::extract::{Query, State};
use axum::response::Html;
use std::collections::HashMap;

use super::PageError;
use crate::persistence::traits::{GameRepository, PlayerRepository};
use crate::report::top_players_by_season;
use crate::service::parsers::int_param;
use crate::service::{views, AppState};

/// Top players of every stored season, or a pointer to `/update/` when the
/// database is empty.
pub async fn home(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    tracing::info!("GET /");
    state.db.ensure_schema().await?;

    let report = top_players_by_season(&state.db.games(), &state.db.players()).await?;
    if report.is_empty() {
        return Ok(Html(views::empty_database_page()));
    }
    Ok(Html(views::home_page(&report)))
}

/// Game summary and player stat sheet for `?gamePk=&personId=`.
pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, PageError> {
    let game_pk = int_param(&params, "gamePk");
    let person_id = int_param(&params, "personId");
    tracing::info!(game_pk, person_id, "GET /stats");
    state.db.ensure_schema().await?;

    let game = state.db.games().load_game(game_pk).await?;
    let player = state
        .db
        .players()
        .load_player_stat(person_id, game_pk)
        .await?;
    Ok(Html(views::stats_page(game.as_ref(), player.as_ref())))
}
