//! Central module for organizing the application's HTTP surface.
//!
//! Each page domain contributes its own router; `router` merges them, applies
//! the viewer and tracing layers, and sends unknown paths back to the index.

pub mod admin;
pub mod content;
pub mod user;

use std::sync::Arc;

use adapters::PageNumber;
use axum::{middleware::from_fn_with_state, response::Response, routing::get, Router};
use serde::Deserialize;

use crate::{
    auth::resolve_viewer,
    errors::{redirect_to_index, AppError},
    middleware::with_http_trace,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

/// Page requested by `?page=`: absent means the first page, `last` the final
/// one, anything else must be a 1-based number.
pub fn page_number(query: &PageQuery) -> Result<PageNumber, AppError> {
    match query.page.as_deref().map(str::trim) {
        None | Some("") => Ok(PageNumber::Number(1)),
        Some("last") => Ok(PageNumber::Last),
        Some(raw) => match raw.parse::<u32>() {
            Ok(0) | Err(_) => Err(AppError::BadRequest(format!("invalid page {raw:?}"))),
            Ok(number) => Ok(PageNumber::Number(number)),
        },
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn fallback() -> Response {
    redirect_to_index()
}

pub fn router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .merge(content::routes::content_router())
        .merge(user::routes::user_router())
        .merge(admin::routes::admin_router())
        .route("/health", get(health))
        .fallback(fallback)
        .method_not_allowed_fallback(fallback)
        .layer(from_fn_with_state(state.clone(), resolve_viewer))
        .with_state(state);
    with_http_trace(router)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
        }
    }

    #[test]
    fn page_numbers() {
        assert_eq!(page_number(&query(None)).unwrap(), PageNumber::Number(1));
        assert_eq!(page_number(&query(Some("3"))).unwrap(), PageNumber::Number(3));
        assert_eq!(page_number(&query(Some("last"))).unwrap(), PageNumber::Last);
        assert!(page_number(&query(Some("0"))).is_err());
        assert!(page_number(&query(Some("first"))).is_err());
    }
}
