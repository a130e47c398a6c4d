//! Endpoint handlers organized by page

pub mod health;
pub mod pages;
pub mod update;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use super::views;
use crate::persistence::PersistenceError;
use crate::update::UpdateError;

/// Failures rendered as an HTML error page.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Database(#[from] PersistenceError),
    #[error("{0}")]
    BadRequest(String),
}

impl From<UpdateError> for PageError {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::Persistence(e) => PageError::Database(e),
            UpdateError::InvalidSeason(e) => PageError::BadRequest(e.to_string()),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                let page = views::database_error_page(e.code().as_deref(), &e.message());
                (StatusCode::INTERNAL_SERVER_ERROR, Html(page)).into_response()
            }
            PageError::BadRequest(msg) => {
                tracing::warn!(%msg, "Bad request");
                let page = views::message_page("Bad request", &format!("<p>{}</p>", views::escape(&msg)));
                (StatusCode::BAD_REQUEST, Html(page)).into_response()
            }
        }
    }
}
