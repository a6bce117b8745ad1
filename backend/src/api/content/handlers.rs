//! Handler functions for the public content pages.
//!
//! These extract the path, query and viewer, then delegate to
//! `services::pages` for the context. Malformed paths and query strings are
//! taken as `Result`s so they redirect like any other bad request.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, RawQuery, State,
    },
    http::{header::HOST, HeaderMap, Uri},
};
use serde::Deserialize;

use crate::{
    api::{page_number, PageQuery},
    auth::Viewer,
    errors::AppError,
    services::{context::Rendered, pages},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    utm_source: Option<String>,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    headers: HeaderMap,
    uri: Uri,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Rendered, AppError> {
    let Query(query) = query?;
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.host());
    let page = page_number(&query)?;
    pages::index(&state, host, page, &viewer).await
}

pub async fn app_detail(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    slug: Result<Path<String>, PathRejection>,
    query: Result<Query<DetailQuery>, QueryRejection>,
) -> Result<Rendered, AppError> {
    let Path(slug) = slug?;
    let Query(query) = query?;
    pages::app_detail(&state, &slug, &viewer, query.utm_source.as_deref()).await
}

pub async fn story_detail(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    slug: Result<Path<String>, PathRejection>,
) -> Result<Rendered, AppError> {
    let Path(slug) = slug?;
    pages::story_detail(&state, &slug, &viewer).await
}

pub async fn app_result(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Rendered, AppError> {
    let Path((slug, uid)) = path?;
    pages::app_result(&state, &slug, &uid, &viewer).await
}

pub async fn result_fragment(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    slug: Result<Path<String>, PathRejection>,
    RawQuery(query): RawQuery,
) -> Result<Rendered, AppError> {
    let Path(slug) = slug?;
    pages::result_fragment(&state, &slug, query.as_deref(), &viewer).await
}

pub async fn photos(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    slug: Result<Path<String>, PathRejection>,
) -> Result<Rendered, AppError> {
    let Path(slug) = slug?;
    pages::photos(&state, &slug, &viewer).await
}
