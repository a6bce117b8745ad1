//! Global application error types and handlers.
//!
//! Missing objects, unknown routes and server failures all send the visitor
//! back to the index page; only a denied admin request surfaces as a status.

use adapters::StoreError;
use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, info};

use crate::auth::AuthError;

pub const INDEX_PATH: &str = "/";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("forbidden")]
    Forbidden,

    #[error("store failure: {0}")]
    Store(StoreError),

    #[error("failed to build page context: {0}")]
    Context(#[from] serde_json::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        if err.is_not_found() {
            AppError::NotFound(err.to_string())
        } else {
            AppError::Store(err)
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden => AppError::Forbidden,
            AuthError::Store(err) => AppError::from(err),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// `302 Found` to the index page.
pub fn redirect_to_index() -> Response {
    (StatusCode::FOUND, [(LOCATION, INDEX_PATH)]).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Forbidden => StatusCode::FORBIDDEN.into_response(),
            AppError::NotFound(_) | AppError::BadRequest(_) => {
                info!(error = %self, "Redirecting to index");
                redirect_to_index()
            }
            AppError::Store(_) | AppError::Context(_) => {
                error!(error = %self, "Request failed");
                redirect_to_index()
            }
        }
    }
}
