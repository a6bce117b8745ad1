//! Session resolution and social identity lookups.

use adapters::{ContentStore, StoreResult};
use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap,
};

use super::models::Viewer;

pub const SESSION_COOKIE: &str = "session";

/// Session token from `Authorization: Bearer` or the `session` cookie.
/// Only non-empty hex tokens are accepted. They are returned as sent, since
/// stores compare tokens exactly.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let cookie = || {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, token)| token.trim())
    };

    let token = bearer.or_else(cookie)?;
    if token.is_empty() || hex::decode(token).is_err() {
        return None;
    }
    Some(token.to_string())
}

pub async fn authenticate(store: &dyn ContentStore, token: Option<&str>) -> StoreResult<Viewer> {
    let Some(token) = token else {
        return Ok(Viewer::Anonymous);
    };
    Ok(store
        .user_by_session(token)
        .await?
        .map(Viewer::User)
        .unwrap_or_default())
}

/// Social-account uid shown to an ordinary signed-in user: their first
/// account's uid, or `fallback` when they have none. Anonymous visitors and
/// superusers get `None`.
pub async fn viewer_uid(
    store: &dyn ContentStore,
    viewer: &Viewer,
    fallback: &str,
) -> StoreResult<Option<String>> {
    let Some(user) = viewer.user() else {
        return Ok(None);
    };
    if user.is_superuser {
        return Ok(None);
    }
    let uid = store
        .first_social_account(user.id)
        .await?
        .map(|account| account.uid)
        .unwrap_or_else(|| fallback.to_string());
    Ok(Some(uid))
}
