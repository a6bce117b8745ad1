//! Defines the HTTP routes for the public content pages.

use std::sync::Arc;

use axum::{routing::get, Router};

use super::handlers::{app_detail, app_result, index, photos, result_fragment, story_detail};
use crate::AppState;

pub fn content_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/app/{slug}/", get(app_detail))
        .route("/app/{slug}/result/", get(result_fragment))
        .route("/app/{slug}/result/{uid}/", get(app_result))
        .route("/app/{slug}/photos/", get(photos))
        .route("/story/{slug}/", get(story_detail))
}
