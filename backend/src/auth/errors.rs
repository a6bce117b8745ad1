//! Custom error types specific to authentication failures.

use adapters::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("superuser access required")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Forbidden => StatusCode::FORBIDDEN.into_response(),
            AuthError::Store(err) => crate::errors::AppError::from(err).into_response(),
        }
    }
}
