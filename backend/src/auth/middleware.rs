//! Middleware resolving the viewer and guarding superuser-only routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::{
    errors::AuthError,
    models::Viewer,
    service::{authenticate, session_token},
};
use crate::AppState;

/// Inserts the request's `Viewer` into its extensions. A failing session
/// lookup degrades to an anonymous viewer.
pub async fn resolve_viewer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = session_token(request.headers());
    let viewer = match authenticate(state.store.as_ref(), token.as_deref()).await {
        Ok(viewer) => viewer,
        Err(err) => {
            warn!(error = %err, "Session lookup failed, continuing anonymously");
            Viewer::Anonymous
        }
    };
    request.extensions_mut().insert(viewer);
    next.run(request).await
}

pub async fn require_superuser(
    viewer: Viewer,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if !viewer.is_superuser() {
        warn!(
            user = viewer.user().map(|user| user.username.as_str()),
            path = %request.uri().path(),
            "Rejected non-superuser"
        );
        return Err(AuthError::Forbidden);
    }
    Ok(next.run(request).await)
}
