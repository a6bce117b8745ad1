//! Data structures describing who is making a request.

use std::convert::Infallible;

use adapters::User;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Viewer {
    #[default]
    Anonymous,
    User(User),
}

impl Viewer {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Viewer::User(_))
    }

    pub fn is_superuser(&self) -> bool {
        matches!(self, Viewer::User(user) if user.is_superuser)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Viewer::User(user) => Some(user),
            Viewer::Anonymous => None,
        }
    }
}

/// Reads the viewer placed in the request extensions by `resolve_viewer`.
/// Requests that bypassed the middleware are anonymous.
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Viewer>().cloned().unwrap_or_default())
    }
}
