//! Update trigger: runs the whole pipeline inside the request

use axum::extract::{Path, State};
use axum::response::Html;

use super::PageError;
use crate::service::{views, AppState};
use crate::update::{run_update, UpdateScope, DEFAULT_SEASON_COUNT};

pub async fn update_default(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    update(state, DEFAULT_SEASON_COUNT).await
}

pub async fn update_count(
    State(state): State<AppState>,
    Path(count): Path<i64>,
) -> Result<Html<String>, PageError> {
    update(state, count).await
}

async fn update(state: AppState, count: i64) -> Result<Html<String>, PageError> {
    tracing::info!(count, api = %state.config.api_base, "GET /update");
    state.db.ensure_schema().await?;
    let scope = UpdateScope::from_count(count)?;

    let summary = run_update(
        state.api.as_ref(),
        &state.db.games(),
        &state.db.players(),
        scope,
    )
    .await?;
    state.metrics.record_update(&summary);

    Ok(Html(views::updated_page()))
}
