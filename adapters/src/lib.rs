//! Core `adapters` crate abstracting access to the content catalog.
//!
//! This crate defines the `ContentStore` trait, the read-side query interface
//! every page is assembled from, and provides the concrete implementations
//! (SQLite through sqlx, and an in-process memory store).

pub mod errors;
pub mod memory;
pub mod models;
pub mod sqlite;

use async_trait::async_trait;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use models::*;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetches one app by primary key or slug, paused or not.
    async fn app(&self, lookup: &Lookup) -> StoreResult<App>;

    async fn story(&self, lookup: &Lookup) -> StoreResult<Story>;

    /// Up to `limit` non-paused apps other than `exclude`, in random order.
    async fn sample_apps(&self, exclude: i64, limit: usize) -> StoreResult<Vec<App>>;

    /// Up to `limit` non-paused stories other than `exclude`, in random order.
    async fn sample_stories(&self, exclude: i64, limit: usize) -> StoreResult<Vec<Story>>;

    /// Non-paused apps, newest first, tags loaded.
    async fn list_apps(&self, filter: &AppFilter, page: PageRequest) -> StoreResult<Page<App>>;

    async fn languages(&self) -> StoreResult<Vec<Lang>>;

    async fn lang(&self, code: &str) -> StoreResult<Option<Lang>>;

    async fn ad_snippet(&self, site_id: i64) -> StoreResult<Option<AdSnippet>>;

    async fn first_social_account(&self, user_id: i64) -> StoreResult<Option<SocialAccount>>;

    async fn social_account_by_uid(&self, uid: &str) -> StoreResult<Option<SocialAccount>>;

    async fn record_for(&self, app_id: i64, user_id: i64) -> StoreResult<Option<Record>>;

    /// All records, newest id first.
    async fn records(&self, page: PageRequest) -> StoreResult<Page<Record>>;

    async fn user_by_session(&self, token: &str) -> StoreResult<Option<User>>;
}

/// Resolves the requested page against `total`, rejecting numbers outside
/// `1..=num_pages`.
pub(crate) fn check_page(page: PageRequest, total: u64) -> StoreResult<u32> {
    let last = models::num_pages(total, page.per_page);
    match page.number {
        PageNumber::Last => Ok(last),
        PageNumber::Number(number) if number == 0 || number > last => {
            Err(StoreError::PageOutOfRange { number, last })
        }
        PageNumber::Number(number) => Ok(number),
    }
}
