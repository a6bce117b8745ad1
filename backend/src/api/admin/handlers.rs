//! Handler functions for the admin monitoring pages.

use std::sync::Arc;

use axum::extract::{rejection::QueryRejection, Query, State};

use crate::{
    api::{page_number, PageQuery},
    errors::AppError,
    services::{context::Rendered, pages},
    AppState,
};

pub async fn record_monitor(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Rendered, AppError> {
    let Query(query) = query?;
    let page = page_number(&query)?;
    pages::record_monitor(&state, page).await
}
