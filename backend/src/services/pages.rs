//! Context assembly for every page the site serves.
//!
//! Each function maps one view to its template and context. Detail-style
//! pages start from the ads context; all of them add the viewer's social uid
//! for ordinary signed-in users.

use adapters::{App, AppFilter, ContentStore, Lookup, PageNumber, PageRequest, StoreResult};
use tracing::{debug, info};

use super::{
    ads::AdsContext,
    context::{Context, Rendered},
    locale::resolve_language,
};
use crate::{
    auth::{viewer_uid, Viewer},
    errors::AppError,
    AppState,
};

pub const APP_DETAIL_TEMPLATE: &str = "content/detail.html";
pub const STORY_DETAIL_TEMPLATE: &str = "content/story_detail.html";
pub const PROFILE_TEMPLATE: &str = "content/profile.html";
pub const INDEX_TEMPLATE: &str = "content/index.html";
pub const RESULT_TEMPLATE: &str = "content/result.html";
pub const RESULT_FRAGMENT_TEMPLATE: &str = "content/result_ajax.html";
pub const PHOTOS_TEMPLATE: &str = "content/photos.html";
pub const RECORD_MONITOR_TEMPLATE: &str = "content/record_monitoring.html";

/// Ads context plus `object`, `uid` and `is_detail_view`.
async fn detail_context<T: serde::Serialize>(
    state: &AppState,
    object_id: i64,
    object: &T,
    viewer: &Viewer,
    is_detail_view: bool,
) -> Result<(Context, AdsContext), AppError> {
    let store = state.store.as_ref();
    let ads = AdsContext::compose(
        store,
        state.config.site_id,
        object_id,
        state.config.related_limit,
    )
    .await?;

    let mut ctx = Context::new();
    ads.apply(&mut ctx)?;
    ctx.set("object", object)?
        .set("is_detail_view", &is_detail_view)?;
    set_uid(&mut ctx, store, viewer, &state.config.fallback_uid).await?;
    Ok((ctx, ads))
}

async fn set_uid(
    ctx: &mut Context,
    store: &dyn ContentStore,
    viewer: &Viewer,
    fallback: &str,
) -> Result<(), AppError> {
    if let Some(uid) = viewer_uid(store, viewer, fallback).await? {
        ctx.set("uid", &uid)?;
    }
    Ok(())
}

pub async fn app_detail(
    state: &AppState,
    slug: &str,
    viewer: &Viewer,
    utm_source: Option<&str>,
) -> Result<Rendered, AppError> {
    let app = state.store.app(&Lookup::Slug(slug.to_string())).await?;
    let (mut ctx, _) = detail_context(state, app.id, &app, viewer, true).await?;
    ctx.set("is_google", &(utm_source == Some("google")))?
        .set("scope", &app.scope())?
        .set("slug", &app)?;
    Ok(Rendered::new(APP_DETAIL_TEMPLATE, ctx))
}

pub async fn story_detail(
    state: &AppState,
    slug: &str,
    viewer: &Viewer,
) -> Result<Rendered, AppError> {
    let store = state.store.as_ref();
    let story = store.story(&Lookup::Slug(slug.to_string())).await?;
    let (mut ctx, _) = detail_context(state, story.id, &story, viewer, true).await?;
    let stories = store
        .sample_stories(story.id, state.config.related_limit)
        .await?;
    ctx.set("apps", &stories)?;
    Ok(Rendered::new(STORY_DETAIL_TEMPLATE, ctx))
}

pub fn account(viewer: &Viewer) -> Result<Rendered, AppError> {
    let mut ctx = Context::new();
    ctx.set("user", viewer)?;
    Ok(Rendered::new(PROFILE_TEMPLATE, ctx))
}

pub async fn index(
    state: &AppState,
    host: Option<&str>,
    page: PageNumber,
    viewer: &Viewer,
) -> Result<Rendered, AppError> {
    let store = state.store.as_ref();
    let language = resolve_language(store, host, &state.config).await?;
    let filter = AppFilter {
        language: language.map(|lang| lang.code),
    };
    let apps = store
        .list_apps(
            &filter,
            PageRequest {
                number: page,
                per_page: state.config.index_page_size,
            },
        )
        .await?;

    let mut ctx = Context::new();
    ctx.paginate("app_list", &apps)?
        .set("is_detail_view", &false)?
        .set("languages", &store.languages().await?)?;
    set_uid(&mut ctx, store, viewer, &state.config.fallback_uid).await?;
    Ok(Rendered::new(INDEX_TEMPLATE, ctx))
}

/// Image of the result record owned by the user behind social uid `uid`.
async fn result_image(store: &dyn ContentStore, app: &App, uid: &str) -> StoreResult<Option<String>> {
    let Some(account) = store.social_account_by_uid(uid).await? else {
        return Ok(None);
    };
    let record = store.record_for(app.id, account.user_id).await?;
    Ok(record
        .and_then(|record| record.image)
        .filter(|image| !image.is_empty()))
}

pub async fn app_result(
    state: &AppState,
    slug: &str,
    uid: &str,
    viewer: &Viewer,
) -> Result<Rendered, AppError> {
    let store = state.store.as_ref();
    let app = store.app(&Lookup::Slug(slug.to_string())).await?;
    let (mut ctx, ads) = detail_context(state, app.id, &app, viewer, false).await?;
    ctx.set("random_app", &ads.related.first())?;

    let image = match result_image(store, &app, uid).await {
        Ok(Some(image)) => image,
        Ok(None) => {
            info!(app = %app.slug, uid, "No result record, using og image");
            app.og_image.clone()
        }
        Err(err) => {
            info!(app = %app.slug, uid, error = %err, "Result lookup failed, using og image");
            app.og_image.clone()
        }
    };
    ctx.set("result_image", &image)?;
    Ok(Rendered::new(RESULT_TEMPLATE, ctx))
}

pub async fn result_fragment(
    state: &AppState,
    slug: &str,
    query: Option<&str>,
    viewer: &Viewer,
) -> Result<Rendered, AppError> {
    debug!(slug, query, "Result fragment requested");
    let app = state.store.app(&Lookup::Slug(slug.to_string())).await?;
    let (mut ctx, ads) = detail_context(state, app.id, &app, viewer, false).await?;
    ctx.set("random_app", &ads.related.first())?;
    Ok(Rendered::new(RESULT_FRAGMENT_TEMPLATE, ctx))
}

pub async fn photos(state: &AppState, slug: &str, viewer: &Viewer) -> Result<Rendered, AppError> {
    let app = state.store.app(&Lookup::Slug(slug.to_string())).await?;
    let (ctx, _) = detail_context(state, app.id, &app, viewer, false).await?;
    Ok(Rendered::new(PHOTOS_TEMPLATE, ctx))
}

/// Admin view; callers must already have checked for a superuser.
pub async fn record_monitor(state: &AppState, page: PageNumber) -> Result<Rendered, AppError> {
    let records = state
        .store
        .records(PageRequest {
            number: page,
            per_page: state.config.monitor_page_size,
        })
        .await?;
    let mut ctx = Context::new();
    ctx.paginate("records", &records)?;
    Ok(Rendered::new(RECORD_MONITOR_TEMPLATE, ctx))
}
