//! Defines the HTTP routes for the account pages.

use std::sync::Arc;

use axum::{routing::get, Router};

use super::handlers::account;
use crate::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new().route("/account/", get(account))
}
