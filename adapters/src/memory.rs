//! In-process implementation of `ContentStore`.
//!
//! Holds a `Fixtures` snapshot behind a `parking_lot::RwLock`. Used by the
//! test suites and for running the server without a database.

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::seq::SliceRandom;

use crate::{
    check_page,
    errors::{StoreError, StoreResult},
    models::*,
    ContentStore,
};

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Fixtures>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        Self {
            data: RwLock::new(fixtures),
        }
    }

    /// Merges the given fixtures into the current snapshot. Entities whose key
    /// is already present are replaced in place, as the SQLite store does.
    pub fn load_fixtures(&self, fixtures: Fixtures) {
        let mut data = self.data.write();
        upsert(&mut data.languages, fixtures.languages, |lang| lang.code.clone());
        upsert(&mut data.apps, fixtures.apps, |app| app.id);
        upsert(&mut data.stories, fixtures.stories, |story| story.id);
        upsert(&mut data.users, fixtures.users, |user| user.id);
        upsert(&mut data.social_accounts, fixtures.social_accounts, |account| account.id);
        upsert(&mut data.sessions, fixtures.sessions, |session| session.token.clone());
        upsert(&mut data.records, fixtures.records, |record| record.id);
        upsert(&mut data.ad_snippets, fixtures.ad_snippets, |snippet| snippet.site_id);
    }
}

fn upsert<T, K: PartialEq>(existing: &mut Vec<T>, incoming: Vec<T>, key: impl Fn(&T) -> K) {
    for item in incoming {
        let id = key(&item);
        match existing.iter_mut().find(|current| key(current) == id) {
            Some(current) => *current = item,
            None => existing.push(item),
        }
    }
}

fn matches_app(app: &App, lookup: &Lookup) -> bool {
    match lookup {
        Lookup::Pk(pk) => app.id == *pk,
        Lookup::Slug(slug) => &app.slug == slug,
    }
}

fn matches_story(story: &Story, lookup: &Lookup) -> bool {
    match lookup {
        Lookup::Pk(pk) => story.id == *pk,
        Lookup::Slug(slug) => &story.slug == slug,
    }
}

fn paginate<T: Clone>(items: Vec<T>, page: PageRequest) -> StoreResult<Page<T>> {
    let total = items.len() as u64;
    let number = check_page(page, total)?;
    let skip = usize::try_from(offset(number, page.per_page)).unwrap_or(usize::MAX);
    let items = items
        .into_iter()
        .skip(skip)
        .take(page.per_page as usize)
        .collect();
    Ok(Page {
        items,
        number,
        per_page: page.per_page,
        total,
    })
}

fn sample<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    items.shuffle(&mut rand::rng());
    items.truncate(limit);
    items
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn app(&self, lookup: &Lookup) -> StoreResult<App> {
        self.data
            .read()
            .apps
            .iter()
            .find(|app| matches_app(app, lookup))
            .cloned()
            .ok_or_else(|| StoreError::not_found("app", lookup))
    }

    async fn story(&self, lookup: &Lookup) -> StoreResult<Story> {
        self.data
            .read()
            .stories
            .iter()
            .find(|story| matches_story(story, lookup))
            .cloned()
            .ok_or_else(|| StoreError::not_found("story", lookup))
    }

    async fn sample_apps(&self, exclude: i64, limit: usize) -> StoreResult<Vec<App>> {
        let candidates = self
            .data
            .read()
            .apps
            .iter()
            .filter(|app| !app.paused && app.id != exclude)
            .cloned()
            .collect();
        Ok(sample(candidates, limit))
    }

    async fn sample_stories(&self, exclude: i64, limit: usize) -> StoreResult<Vec<Story>> {
        let candidates = self
            .data
            .read()
            .stories
            .iter()
            .filter(|story| !story.paused && story.id != exclude)
            .cloned()
            .collect();
        Ok(sample(candidates, limit))
    }

    async fn list_apps(&self, filter: &AppFilter, page: PageRequest) -> StoreResult<Page<App>> {
        let mut apps: Vec<App> = self
            .data
            .read()
            .apps
            .iter()
            .filter(|app| !app.paused)
            .filter(|app| match &filter.language {
                Some(code) => app.languages.iter().any(|lang| lang == code),
                None => true,
            })
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        paginate(apps, page)
    }

    async fn languages(&self) -> StoreResult<Vec<Lang>> {
        let mut languages = self.data.read().languages.clone();
        languages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(languages)
    }

    async fn lang(&self, code: &str) -> StoreResult<Option<Lang>> {
        Ok(self
            .data
            .read()
            .languages
            .iter()
            .find(|lang| lang.code == code)
            .cloned())
    }

    async fn ad_snippet(&self, site_id: i64) -> StoreResult<Option<AdSnippet>> {
        Ok(self
            .data
            .read()
            .ad_snippets
            .iter()
            .find(|snippet| snippet.site_id == site_id)
            .cloned())
    }

    async fn first_social_account(&self, user_id: i64) -> StoreResult<Option<SocialAccount>> {
        Ok(self
            .data
            .read()
            .social_accounts
            .iter()
            .filter(|account| account.user_id == user_id)
            .min_by_key(|account| account.id)
            .cloned())
    }

    async fn social_account_by_uid(&self, uid: &str) -> StoreResult<Option<SocialAccount>> {
        Ok(self
            .data
            .read()
            .social_accounts
            .iter()
            .filter(|account| account.uid == uid)
            .min_by_key(|account| account.id)
            .cloned())
    }

    async fn record_for(&self, app_id: i64, user_id: i64) -> StoreResult<Option<Record>> {
        Ok(self
            .data
            .read()
            .records
            .iter()
            .filter(|record| record.app_id == app_id && record.user_id == user_id)
            .min_by_key(|record| record.id)
            .cloned())
    }

    async fn records(&self, page: PageRequest) -> StoreResult<Page<Record>> {
        let mut records = self.data.read().records.clone();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        paginate(records, page)
    }

    async fn user_by_session(&self, token: &str) -> StoreResult<Option<User>> {
        let data = self.data.read();
        let Some(session) = data.sessions.iter().find(|s| s.token == token) else {
            return Ok(None);
        };
        Ok(data
            .users
            .iter()
            .find(|user| user.id == session.user_id)
            .cloned())
    }
}
