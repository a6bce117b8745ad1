//! Defines the HTTP routes for the admin monitoring pages.
//!
//! Every route here sits behind `require_superuser`.

use std::sync::Arc;

use axum::{middleware::from_fn, routing::get, Router};

use super::handlers::record_monitor;
use crate::{auth::require_superuser, AppState};

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/monitor/records/", get(record_monitor))
        .route_layer(from_fn(require_superuser))
}
