//! Data models shared by every `ContentStore` implementation.
//!
//! These are the read-side representations of the catalog (apps, stories,
//! result records, ad snippets, languages) and of the identities the HTTP
//! layer needs (users, social accounts, sessions). They serialize directly
//! into page contexts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct App {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub og_image: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub paused: bool,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Language codes the app is published under.
    #[serde(default)]
    pub languages: Vec<String>,
}

impl App {
    /// OAuth scope string requested by the app, e.g. `"public_profile,email"`.
    pub fn scope(&self) -> String {
        self.permissions.join(",")
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Story {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub og_image: String,
    #[serde(default)]
    pub paused: bool,
    pub created: DateTime<Utc>,
}

/// A generated result image for one user of one app.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub app_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub image: Option<String>,
    pub created: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AdSnippet {
    pub site_id: i64,
    #[serde(default)]
    pub ad_above_content: String,
    #[serde(default)]
    pub ad_below_image: String,
    #[serde(default)]
    pub ad_below_content: String,
    #[serde(default)]
    pub ad_sidebar_content: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub footer: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Lang {
    pub name: String,
    pub code: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SocialAccount {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub provider: String,
    pub uid: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
}

/// How a single object is addressed in a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Pk(i64),
    Slug(String),
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lookup::Pk(pk) => write!(f, "pk={pk}"),
            Lookup::Slug(slug) => write!(f, "slug={slug}"),
        }
    }
}

/// Restricts the app listing. `language` is a language code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppFilter {
    pub language: Option<String>,
}

/// Which page of a listing to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    /// 1-based page number.
    Number(u32),
    /// Whatever the final page turns out to be once the total is known.
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: PageNumber,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(number: u32, per_page: u32) -> Self {
        Self {
            number: PageNumber::Number(number),
            per_page,
        }
    }

    pub fn last(per_page: u32) -> Self {
        Self {
            number: PageNumber::Last,
            per_page,
        }
    }
}

/// Row offset of the 1-based page `number`.
pub(crate) fn offset(number: u32, per_page: u32) -> u64 {
    u64::from(number.saturating_sub(1)) * u64::from(per_page)
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    /// Number of pages; an empty listing still has a single page.
    pub fn num_pages(&self) -> u32 {
        num_pages(self.total, self.per_page)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

pub(crate) fn num_pages(total: u64, per_page: u32) -> u32 {
    if per_page == 0 || total == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(per_page));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Seed document accepted by both stores.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Fixtures {
    pub languages: Vec<Lang>,
    pub apps: Vec<App>,
    pub stories: Vec<Story>,
    pub users: Vec<User>,
    pub social_accounts: Vec<SocialAccount>,
    pub sessions: Vec<Session>,
    pub records: Vec<Record>,
    pub ad_snippets: Vec<AdSnippet>,
}

impl Fixtures {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
