#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Router-level tests driving the full axum stack against a memory store.

use std::sync::Arc;

use adapters::{
    AdSnippet, App, AppFilter, ContentStore, Fixtures, Lang, Lookup, MemoryStore, Page,
    PageRequest, Record, Session, SocialAccount, Story, StoreError, StoreResult, User,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, COOKIE, HOST, LOCATION},
        Method, Request, StatusCode,
    },
    Router,
};
use backend::{api::router, config::Config, AppState};
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const ALICE_TOKEN: &str = "a11ce0";
const ROOT_TOKEN: &str = "f00d00";
const BOB_TOKEN: &str = "b0b0";
const ADMIN_TOKEN: &str = "ABCD";

fn fixtures() -> Fixtures {
    let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let apps = (1..=16)
        .map(|id| App {
            id,
            slug: format!("app-{id}"),
            title: format!("App {id}"),
            description: format!("Description {id}"),
            og_image: format!("og-{id}.png"),
            permissions: vec!["public_profile".into(), "user_photos".into()],
            paused: id == 16,
            created: base + Duration::days(id),
            tags: vec!["quiz".into()],
            languages: vec![if id % 4 == 0 { "de" } else { "en" }.into()],
        })
        .collect();
    let stories = (1..=3)
        .map(|id| Story {
            id,
            slug: format!("story-{id}"),
            title: format!("Story {id}"),
            body: String::new(),
            og_image: String::new(),
            paused: false,
            created: base,
        })
        .collect();

    Fixtures {
        languages: vec![
            Lang {
                name: "English".into(),
                code: "en".into(),
            },
            Lang {
                name: "Deutsch".into(),
                code: "de".into(),
            },
        ],
        apps,
        stories,
        users: vec![
            User {
                id: 1,
                username: "alice".into(),
                is_superuser: false,
            },
            User {
                id: 2,
                username: "root".into(),
                is_superuser: true,
            },
            User {
                id: 3,
                username: "bob".into(),
                is_superuser: false,
            },
            User {
                id: 4,
                username: "admin".into(),
                is_superuser: true,
            },
        ],
        social_accounts: vec![SocialAccount {
            id: 1,
            user_id: 1,
            provider: "facebook".into(),
            uid: "777".into(),
        }],
        sessions: vec![
            Session {
                token: ALICE_TOKEN.into(),
                user_id: 1,
            },
            Session {
                token: ROOT_TOKEN.into(),
                user_id: 2,
            },
            Session {
                token: BOB_TOKEN.into(),
                user_id: 3,
            },
            Session {
                token: ADMIN_TOKEN.into(),
                user_id: 4,
            },
        ],
        records: (1..=61)
            .map(|id| Record {
                id,
                app_id: if id == 1 { 1 } else { 2 },
                user_id: 1,
                image: Some(format!("record-{id}.png")),
                created: base,
            })
            .collect(),
        ad_snippets: vec![AdSnippet {
            site_id: 1,
            ad_above_content: "<ins>above</ins>".into(),
            ad_below_image: "<ins>image</ins>".into(),
            ad_below_content: "<ins>below</ins>".into(),
            ad_sidebar_content: "<ins>side</ins>".into(),
            header: "<script>header</script>".into(),
            footer: "<script>footer</script>".into(),
        }],
    }
}

/// Memory store whose social account lookups fail like a broken database.
struct FailingAccounts(MemoryStore);

#[async_trait]
impl ContentStore for FailingAccounts {
    async fn app(&self, lookup: &Lookup) -> StoreResult<App> {
        self.0.app(lookup).await
    }

    async fn story(&self, lookup: &Lookup) -> StoreResult<Story> {
        self.0.story(lookup).await
    }

    async fn sample_apps(&self, exclude: i64, limit: usize) -> StoreResult<Vec<App>> {
        self.0.sample_apps(exclude, limit).await
    }

    async fn sample_stories(&self, exclude: i64, limit: usize) -> StoreResult<Vec<Story>> {
        self.0.sample_stories(exclude, limit).await
    }

    async fn list_apps(&self, filter: &AppFilter, page: PageRequest) -> StoreResult<Page<App>> {
        self.0.list_apps(filter, page).await
    }

    async fn languages(&self) -> StoreResult<Vec<Lang>> {
        self.0.languages().await
    }

    async fn lang(&self, code: &str) -> StoreResult<Option<Lang>> {
        self.0.lang(code).await
    }

    async fn ad_snippet(&self, site_id: i64) -> StoreResult<Option<AdSnippet>> {
        self.0.ad_snippet(site_id).await
    }

    async fn first_social_account(&self, user_id: i64) -> StoreResult<Option<SocialAccount>> {
        self.0.first_social_account(user_id).await
    }

    async fn social_account_by_uid(&self, _uid: &str) -> StoreResult<Option<SocialAccount>> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn record_for(&self, app_id: i64, user_id: i64) -> StoreResult<Option<Record>> {
        self.0.record_for(app_id, user_id).await
    }

    async fn records(&self, page: PageRequest) -> StoreResult<Page<Record>> {
        self.0.records(page).await
    }

    async fn user_by_session(&self, token: &str) -> StoreResult<Option<User>> {
        self.0.user_by_session(token).await
    }
}

fn app(config: Config) -> Router {
    let store = Arc::new(MemoryStore::from_fixtures(fixtures()));
    router(AppState::new(config, store))
}

async fn get(router: Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(LOCATION)
        .map(|value| value.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, location, body)
}

fn request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn app_detail_page() {
    let (status, _, body) = get(app(Config::default()), request("/app/app-2/?utm_source=google")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"], json!("content/detail.html"));

    let ctx = &body["context"];
    assert_eq!(ctx["object"]["slug"], json!("app-2"));
    assert_eq!(ctx["is_detail_view"], json!(true));
    assert_eq!(ctx["is_google"], json!(true));
    assert_eq!(ctx["scope"], json!("public_profile,user_photos"));
    assert_eq!(ctx["ad_above_content"], json!("<ins>above</ins>"));
    assert_eq!(ctx["header_scripts"], json!("<script>header</script>"));
    assert_eq!(ctx["footer_scripts"], json!("<script>footer</script>"));
    assert_eq!(ctx["languages"].as_array().unwrap().len(), 2);
    assert!(ctx.get("uid").is_none());

    let related = ctx["apps"].as_array().unwrap();
    assert_eq!(related.len(), 12);
    assert!(related
        .iter()
        .all(|a| a["slug"] != json!("app-2") && a["slug"] != json!("app-16")));
}

#[tokio::test]
async fn uid_depends_on_viewer() {
    let (_, _, alice) = get(app(Config::default()), authed("/app/app-2/", ALICE_TOKEN)).await;
    assert_eq!(alice["context"]["uid"], json!("777"));

    let (_, _, bob) = get(app(Config::default()), authed("/app/app-2/", BOB_TOKEN)).await;
    assert_eq!(bob["context"]["uid"], json!("4"));

    let (_, _, root) = get(app(Config::default()), authed("/app/app-2/", ROOT_TOKEN)).await;
    assert!(root["context"].get("uid").is_none());
}

#[tokio::test]
async fn session_cookie_is_accepted() {
    let request = Request::builder()
        .uri("/account/")
        .header(COOKIE, format!("session={ALICE_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = get(app(Config::default()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"], json!("content/profile.html"));
    assert_eq!(body["context"]["user"]["username"], json!("alice"));
}

#[tokio::test]
async fn missing_app_redirects_to_index() {
    let (status, location, _) = get(app(Config::default()), request("/app/nope/")).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/"));
}

#[tokio::test]
async fn unknown_route_redirects_to_index() {
    let (status, location, _) = get(app(Config::default()), request("/no/such/page")).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/"));
}

#[tokio::test]
async fn index_is_paginated_newest_first() {
    let (status, _, body) = get(app(Config::default()), request("/")).await;
    assert_eq!(status, StatusCode::OK);
    let ctx = &body["context"];
    let slugs: Vec<&str> = ctx["app_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs.len(), 13);
    assert_eq!(slugs[0], "app-15");
    assert_eq!(ctx["is_detail_view"], json!(false));
    assert_eq!(ctx["paginator"]["num_pages"], json!(2));

    let (_, _, second) = get(app(Config::default()), request("/?page=2")).await;
    assert_eq!(second["context"]["app_list"].as_array().unwrap().len(), 2);

    let (status, location, _) = get(app(Config::default()), request("/?page=9")).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/"));
}

#[tokio::test]
async fn index_follows_subdomain_locale() {
    let config = Config {
        locale_enabled: true,
        ..Config::default()
    };
    let request = Request::builder()
        .uri("/")
        .header(HOST, "de.funapps.example")
        .body(Body::empty())
        .unwrap();
    let (_, _, body) = get(app(config.clone()), request).await;
    let slugs: Vec<&str> = body["context"]["app_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["app-12", "app-8", "app-4"]);

    let request = Request::builder()
        .uri("/")
        .header(HOST, "www.funapps.example")
        .body(Body::empty())
        .unwrap();
    let (_, _, body) = get(app(config), request).await;
    let listed = body["context"]["app_list"].as_array().unwrap();
    assert!(listed.iter().all(|a| a["languages"] == json!(["en"])));
}

#[tokio::test]
async fn story_detail_page() {
    let (status, _, body) = get(app(Config::default()), request("/story/story-1/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"], json!("content/story_detail.html"));
    let related = body["context"]["apps"].as_array().unwrap();
    assert_eq!(related.len(), 2);
    assert!(related.iter().all(|s| s["slug"] != json!("story-1")));
}

#[tokio::test]
async fn result_page_uses_record_image() {
    let (status, _, body) = get(app(Config::default()), request("/app/app-1/result/777/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"], json!("content/result.html"));
    assert_eq!(body["context"]["result_image"], json!("record-1.png"));
    assert_eq!(body["context"]["is_detail_view"], json!(false));
    assert!(body["context"]["random_app"].is_object());
}

#[tokio::test]
async fn result_page_falls_back_to_og_image() {
    let (_, _, body) = get(app(Config::default()), request("/app/app-3/result/unknown/")).await;
    assert_eq!(body["context"]["result_image"], json!("og-3.png"));
}

#[tokio::test]
async fn result_page_survives_failed_lookup() {
    let store = Arc::new(FailingAccounts(MemoryStore::from_fixtures(fixtures())));
    let router = router(AppState::new(Config::default(), store));
    let (status, location, body) = get(router, request("/app/app-1/result/777/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(location, None);
    assert_eq!(body["context"]["result_image"], json!("og-1.png"));
}

#[tokio::test]
async fn result_fragment_and_photos() {
    let (status, _, body) = get(app(Config::default()), request("/app/app-1/result/?fb=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"], json!("content/result_ajax.html"));
    assert!(body["context"]["random_app"].is_object());

    let (status, _, body) = get(app(Config::default()), request("/app/app-1/photos/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["template"], json!("content/photos.html"));
    assert_eq!(body["context"]["is_detail_view"], json!(false));
}

#[tokio::test]
async fn record_monitor_requires_superuser() {
    let (status, _, _) = get(app(Config::default()), request("/monitor/records/")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = get(app(Config::default()), authed("/monitor/records/", ALICE_TOKEN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = get(app(Config::default()), authed("/monitor/records/", ROOT_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    let records = body["context"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 60);
    assert_eq!(records[0]["id"], json!(61));

    let (_, _, last) = get(
        app(Config::default()),
        authed("/monitor/records/?page=2", ROOT_TOKEN),
    )
    .await;
    assert_eq!(last["context"]["records"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn session_tokens_match_exactly() {
    let (status, _, _) = get(app(Config::default()), authed("/monitor/records/", ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = get(app(Config::default()), authed("/monitor/records/", "abcd")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn last_page_keyword() {
    let (status, _, body) = get(app(Config::default()), request("/?page=last")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["context"]["app_list"].as_array().unwrap().len(), 2);
    assert_eq!(body["context"]["page_obj"]["number"], json!(2));

    let (status, location, _) = get(app(Config::default()), request("/?page=first")).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/"));
}

#[tokio::test]
async fn malformed_requests_redirect_to_index() {
    let post = Request::builder()
        .method(Method::POST)
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let (status, location, _) = get(app(Config::default()), post).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/"));

    let (status, location, _) = get(
        app(Config::default()),
        request("/app/app-2/?utm_source=google&utm_source=x"),
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/"));

    let (status, location, _) = get(app(Config::default()), request("/app/%FF/")).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/"));
}

#[tokio::test]
async fn health_check() {
    let response = app(Config::default())
        .oneshot(request("/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
