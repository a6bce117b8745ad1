//! Maps the request subdomain to a catalog language.

use adapters::{ContentStore, Lang, StoreError};
use tracing::debug;

use crate::{config::Config, errors::AppError};

/// First label of a `Host` header value, port removed and lower-cased.
pub fn subdomain(host: Option<&str>) -> Option<String> {
    let host = host?.trim();
    let host = host.rsplit_once(':').map_or(host, |(name, _)| name);
    let label = host.split('.').next()?.trim();
    if label.is_empty() {
        return None;
    }
    Some(label.to_ascii_lowercase())
}

/// Language the index should be filtered by, or `None` when locale filtering
/// is disabled. Unknown or missing subdomains fall back to the default locale,
/// which must exist.
pub async fn resolve_language(
    store: &dyn ContentStore,
    host: Option<&str>,
    config: &Config,
) -> Result<Option<Lang>, AppError> {
    if !config.locale_enabled {
        return Ok(None);
    }

    if let Some(code) = subdomain(host) {
        if let Some(lang) = store.lang(&code).await? {
            return Ok(Some(lang));
        }
        debug!(code = %code, "Unknown locale subdomain, using default");
    }

    let lang = store
        .lang(&config.default_locale)
        .await?
        .ok_or_else(|| StoreError::not_found("lang", &config.default_locale))
        .map_err(AppError::Store)?;
    Ok(Some(lang))
}
