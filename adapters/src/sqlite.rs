//! SQLite implementation of `ContentStore` on top of a sqlx pool.
//!
//! Tables are created by `migrate`; `load_fixtures` seeds them. Apps carry
//! their tags and language codes in side tables which are loaded for a whole
//! result set at once.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqlitePool, SqlitePoolOptions},
    FromRow, QueryBuilder, Sqlite,
};
use tracing::{debug, info};

use crate::{
    check_page,
    errors::{StoreError, StoreResult},
    models::*,
    ContentStore,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS langs (
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS apps (
        id INTEGER PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        og_image TEXT NOT NULL DEFAULT '',
        permissions TEXT NOT NULL DEFAULT '[]',
        paused INTEGER NOT NULL DEFAULT 0,
        created TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS apps_created ON apps (created DESC)",
    "CREATE TABLE IF NOT EXISTS app_tags (
        app_id INTEGER NOT NULL REFERENCES apps (id) ON DELETE CASCADE,
        tag TEXT NOT NULL,
        PRIMARY KEY (app_id, tag)
    )",
    "CREATE TABLE IF NOT EXISTS app_languages (
        app_id INTEGER NOT NULL REFERENCES apps (id) ON DELETE CASCADE,
        lang_code TEXT NOT NULL REFERENCES langs (code),
        PRIMARY KEY (app_id, lang_code)
    )",
    "CREATE TABLE IF NOT EXISTS stories (
        id INTEGER PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        body TEXT NOT NULL DEFAULT '',
        og_image TEXT NOT NULL DEFAULT '',
        paused INTEGER NOT NULL DEFAULT 0,
        created TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        is_superuser INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS social_accounts (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        provider TEXT NOT NULL DEFAULT '',
        uid TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS social_accounts_uid ON social_accounts (uid)",
    "CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY,
        app_id INTEGER NOT NULL REFERENCES apps (id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        image TEXT,
        created TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS records_app_user ON records (app_id, user_id)",
    "CREATE TABLE IF NOT EXISTS ad_snippets (
        site_id INTEGER PRIMARY KEY,
        ad_above_content TEXT NOT NULL DEFAULT '',
        ad_below_image TEXT NOT NULL DEFAULT '',
        ad_below_content TEXT NOT NULL DEFAULT '',
        ad_sidebar_content TEXT NOT NULL DEFAULT '',
        header TEXT NOT NULL DEFAULT '',
        footer TEXT NOT NULL DEFAULT ''
    )",
];

const APP_COLUMNS: &str = "id, slug, title, description, og_image, permissions, paused, created";
const STORY_COLUMNS: &str = "id, slug, title, body, og_image, paused, created";

#[derive(FromRow)]
struct AppRow {
    id: i64,
    slug: String,
    title: String,
    description: String,
    og_image: String,
    permissions: String,
    paused: bool,
    created: DateTime<Utc>,
}

impl AppRow {
    fn into_app(self) -> StoreResult<App> {
        let permissions: Vec<String> =
            serde_json::from_str(&self.permissions).map_err(|err| StoreError::Decode {
                column: "apps.permissions",
                reason: err.to_string(),
            })?;
        Ok(App {
            id: self.id,
            slug: self.slug,
            title: self.title,
            description: self.description,
            og_image: self.og_image,
            permissions,
            paused: self.paused,
            created: self.created,
            tags: Vec::new(),
            languages: Vec::new(),
        })
    }
}

#[derive(FromRow)]
struct StoryRow {
    id: i64,
    slug: String,
    title: String,
    body: String,
    og_image: String,
    paused: bool,
    created: DateTime<Utc>,
}

impl From<StoryRow> for Story {
    fn from(row: StoryRow) -> Self {
        Story {
            id: row.id,
            slug: row.slug,
            title: row.title,
            body: row.body,
            og_image: row.og_image,
            paused: row.paused,
            created: row.created,
        }
    }
}

#[derive(FromRow)]
struct RecordRow {
    id: i64,
    app_id: i64,
    user_id: i64,
    image: Option<String>,
    created: DateTime<Utc>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Record {
            id: row.id,
            app_id: row.app_id,
            user_id: row.user_id,
            image: row.image,
            created: row.created,
        }
    }
}

#[derive(FromRow)]
struct SnippetRow {
    site_id: i64,
    ad_above_content: String,
    ad_below_image: String,
    ad_below_content: String,
    ad_sidebar_content: String,
    header: String,
    footer: String,
}

impl From<SnippetRow> for AdSnippet {
    fn from(row: SnippetRow) -> Self {
        AdSnippet {
            site_id: row.site_id,
            ad_above_content: row.ad_above_content,
            ad_below_image: row.ad_below_image,
            ad_below_content: row.ad_below_content,
            ad_sidebar_content: row.ad_sidebar_content,
            header: row.header,
            footer: row.footer,
        }
    }
}

#[derive(FromRow)]
struct AccountRow {
    id: i64,
    user_id: i64,
    provider: String,
    uid: String,
}

impl From<AccountRow> for SocialAccount {
    fn from(row: AccountRow) -> Self {
        SocialAccount {
            id: row.id,
            user_id: row.user_id,
            provider: row.provider,
            uid: row.uid,
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    is_superuser: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            is_superuser: row.is_superuser,
        }
    }
}

#[derive(FromRow)]
struct LangRow {
    name: String,
    code: String,
}

impl From<LangRow> for Lang {
    fn from(row: LangRow) -> Self {
        Lang {
            name: row.name,
            code: row.code,
        }
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let mut options = SqlitePoolOptions::new().max_connections(max_connections);
        if url.contains(":memory:") {
            // Every pooled connection to `:memory:` is a separate database.
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = options.connect(url).await?;
        debug!(url, "Connected to SQLite");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|err| StoreError::Migration(err.to_string()))?;
        }
        tx.commit().await?;
        info!(statements = SCHEMA.len(), "Schema is up to date");
        Ok(())
    }

    /// Upserts every entity of `fixtures` in one transaction.
    ///
    /// Existing rows are updated in place rather than replaced, so re-seeding a
    /// parent never cascades into the rows that reference it.
    pub async fn load_fixtures(&self, fixtures: &Fixtures) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        for lang in &fixtures.languages {
            sqlx::query(
                "INSERT INTO langs (code, name) VALUES (?, ?)
                 ON CONFLICT(code) DO UPDATE SET name = excluded.name",
            )
            .bind(&lang.code)
            .bind(&lang.name)
            .execute(&mut *tx)
            .await?;
        }

        for app in &fixtures.apps {
            let permissions =
                serde_json::to_string(&app.permissions).map_err(|err| StoreError::Decode {
                    column: "apps.permissions",
                    reason: err.to_string(),
                })?;
            sqlx::query(
                "INSERT INTO apps
                 (id, slug, title, description, og_image, permissions, paused, created)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    slug = excluded.slug,
                    title = excluded.title,
                    description = excluded.description,
                    og_image = excluded.og_image,
                    permissions = excluded.permissions,
                    paused = excluded.paused,
                    created = excluded.created",
            )
            .bind(app.id)
            .bind(&app.slug)
            .bind(&app.title)
            .bind(&app.description)
            .bind(&app.og_image)
            .bind(permissions)
            .bind(app.paused)
            .bind(app.created)
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM app_tags WHERE app_id = ?")
                .bind(app.id)
                .execute(&mut *tx)
                .await?;
            for tag in &app.tags {
                sqlx::query("INSERT OR IGNORE INTO app_tags (app_id, tag) VALUES (?, ?)")
                    .bind(app.id)
                    .bind(tag)
                    .execute(&mut *tx)
                    .await?;
            }

            sqlx::query("DELETE FROM app_languages WHERE app_id = ?")
                .bind(app.id)
                .execute(&mut *tx)
                .await?;
            for code in &app.languages {
                sqlx::query("INSERT OR IGNORE INTO app_languages (app_id, lang_code) VALUES (?, ?)")
                    .bind(app.id)
                    .bind(code)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        for story in &fixtures.stories {
            sqlx::query(
                "INSERT INTO stories (id, slug, title, body, og_image, paused, created)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    slug = excluded.slug,
                    title = excluded.title,
                    body = excluded.body,
                    og_image = excluded.og_image,
                    paused = excluded.paused,
                    created = excluded.created",
            )
            .bind(story.id)
            .bind(&story.slug)
            .bind(&story.title)
            .bind(&story.body)
            .bind(&story.og_image)
            .bind(story.paused)
            .bind(story.created)
            .execute(&mut *tx)
            .await?;
        }

        for user in &fixtures.users {
            sqlx::query(
                "INSERT INTO users (id, username, is_superuser) VALUES (?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    username = excluded.username,
                    is_superuser = excluded.is_superuser",
            )
            .bind(user.id)
            .bind(&user.username)
            .bind(user.is_superuser)
            .execute(&mut *tx)
            .await?;
        }

        for account in &fixtures.social_accounts {
            sqlx::query(
                "INSERT INTO social_accounts (id, user_id, provider, uid)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    user_id = excluded.user_id,
                    provider = excluded.provider,
                    uid = excluded.uid",
            )
            .bind(account.id)
            .bind(account.user_id)
            .bind(&account.provider)
            .bind(&account.uid)
            .execute(&mut *tx)
            .await?;
        }

        for session in &fixtures.sessions {
            sqlx::query(
                "INSERT INTO sessions (token, user_id) VALUES (?, ?)
                 ON CONFLICT(token) DO UPDATE SET user_id = excluded.user_id",
            )
            .bind(&session.token)
            .bind(session.user_id)
            .execute(&mut *tx)
            .await?;
        }

        for record in &fixtures.records {
            sqlx::query(
                "INSERT INTO records (id, app_id, user_id, image, created)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    app_id = excluded.app_id,
                    user_id = excluded.user_id,
                    image = excluded.image,
                    created = excluded.created",
            )
            .bind(record.id)
            .bind(record.app_id)
            .bind(record.user_id)
            .bind(&record.image)
            .bind(record.created)
            .execute(&mut *tx)
            .await?;
        }

        for snippet in &fixtures.ad_snippets {
            sqlx::query(
                "INSERT INTO ad_snippets
                 (site_id, ad_above_content, ad_below_image, ad_below_content,
                  ad_sidebar_content, header, footer)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(site_id) DO UPDATE SET
                    ad_above_content = excluded.ad_above_content,
                    ad_below_image = excluded.ad_below_image,
                    ad_below_content = excluded.ad_below_content,
                    ad_sidebar_content = excluded.ad_sidebar_content,
                    header = excluded.header,
                    footer = excluded.footer",
            )
            .bind(snippet.site_id)
            .bind(&snippet.ad_above_content)
            .bind(&snippet.ad_below_image)
            .bind(&snippet.ad_below_content)
            .bind(&snippet.ad_sidebar_content)
            .bind(&snippet.header)
            .bind(&snippet.footer)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            apps = fixtures.apps.len(),
            stories = fixtures.stories.len(),
            records = fixtures.records.len(),
            "Fixtures loaded"
        );
        Ok(())
    }

    /// Converts rows and loads tags and language codes for all of them.
    async fn hydrate(&self, rows: Vec<AppRow>) -> StoreResult<Vec<App>> {
        let mut apps = rows
            .into_iter()
            .map(AppRow::into_app)
            .collect::<StoreResult<Vec<_>>>()?;
        if apps.is_empty() {
            return Ok(apps);
        }

        let tags = self.side_table(&apps, "SELECT app_id, tag FROM app_tags WHERE app_id IN (").await?;
        let languages = self
            .side_table(&apps, "SELECT app_id, lang_code FROM app_languages WHERE app_id IN (")
            .await?;

        for app in &mut apps {
            app.tags = tags.get(&app.id).cloned().unwrap_or_default();
            app.languages = languages.get(&app.id).cloned().unwrap_or_default();
        }
        Ok(apps)
    }

    async fn side_table(
        &self,
        apps: &[App],
        select: &str,
    ) -> StoreResult<HashMap<i64, Vec<String>>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(select);
        let mut ids = query.separated(", ");
        for app in apps {
            ids.push_bind(app.id);
        }
        ids.push_unseparated(") ORDER BY 2");

        let rows: Vec<(i64, String)> = query.build_query_as().fetch_all(&self.pool).await?;
        let mut grouped: HashMap<i64, Vec<String>> = HashMap::new();
        for (app_id, value) in rows {
            grouped.entry(app_id).or_default().push(value);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn app(&self, lookup: &Lookup) -> StoreResult<App> {
        let row: Option<AppRow> = match lookup {
            Lookup::Pk(pk) => {
                sqlx::query_as(&format!("SELECT {APP_COLUMNS} FROM apps WHERE id = ?"))
                    .bind(pk)
                    .fetch_optional(&self.pool)
                    .await?
            }
            Lookup::Slug(slug) => {
                sqlx::query_as(&format!("SELECT {APP_COLUMNS} FROM apps WHERE slug = ?"))
                    .bind(slug)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };
        let row = row.ok_or_else(|| StoreError::not_found("app", lookup))?;
        self.hydrate(vec![row])
            .await?
            .pop()
            .ok_or_else(|| StoreError::not_found("app", lookup))
    }

    async fn story(&self, lookup: &Lookup) -> StoreResult<Story> {
        let row: Option<StoryRow> = match lookup {
            Lookup::Pk(pk) => {
                sqlx::query_as(&format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?"))
                    .bind(pk)
                    .fetch_optional(&self.pool)
                    .await?
            }
            Lookup::Slug(slug) => {
                sqlx::query_as(&format!("SELECT {STORY_COLUMNS} FROM stories WHERE slug = ?"))
                    .bind(slug)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };
        row.map(Story::from)
            .ok_or_else(|| StoreError::not_found("story", lookup))
    }

    async fn sample_apps(&self, exclude: i64, limit: usize) -> StoreResult<Vec<App>> {
        let rows: Vec<AppRow> = sqlx::query_as(&format!(
            "SELECT {APP_COLUMNS} FROM apps WHERE paused = 0 AND id != ? ORDER BY RANDOM() LIMIT ?"
        ))
        .bind(exclude)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    async fn sample_stories(&self, exclude: i64, limit: usize) -> StoreResult<Vec<Story>> {
        let rows: Vec<StoryRow> = sqlx::query_as(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE paused = 0 AND id != ? ORDER BY RANDOM() LIMIT ?"
        ))
        .bind(exclude)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Story::from).collect())
    }

    async fn list_apps(&self, filter: &AppFilter, page: PageRequest) -> StoreResult<Page<App>> {
        let language_clause = "AND EXISTS (SELECT 1 FROM app_languages l \
                               WHERE l.app_id = apps.id AND l.lang_code = ?)";
        let clause = if filter.language.is_some() {
            language_clause
        } else {
            ""
        };

        let count_sql = format!("SELECT COUNT(*) FROM apps WHERE paused = 0 {clause}");
        let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(code) = &filter.language {
            count = count.bind(code);
        }
        let total = u64::try_from(count.fetch_one(&self.pool).await?).unwrap_or_default();
        let number = check_page(page, total)?;

        let select_sql = format!(
            "SELECT {APP_COLUMNS} FROM apps WHERE paused = 0 {clause} \
             ORDER BY created DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut select = sqlx::query_as::<_, AppRow>(&select_sql);
        if let Some(code) = &filter.language {
            select = select.bind(code);
        }
        let rows = select
            .bind(i64::from(page.per_page))
            .bind(i64::try_from(offset(number, page.per_page)).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items: self.hydrate(rows).await?,
            number,
            per_page: page.per_page,
            total,
        })
    }

    async fn languages(&self) -> StoreResult<Vec<Lang>> {
        let rows: Vec<LangRow> = sqlx::query_as("SELECT name, code FROM langs ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Lang::from).collect())
    }

    async fn lang(&self, code: &str) -> StoreResult<Option<Lang>> {
        let row: Option<LangRow> = sqlx::query_as("SELECT name, code FROM langs WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Lang::from))
    }

    async fn ad_snippet(&self, site_id: i64) -> StoreResult<Option<AdSnippet>> {
        let row: Option<SnippetRow> = sqlx::query_as(
            "SELECT site_id, ad_above_content, ad_below_image, ad_below_content,
                    ad_sidebar_content, header, footer
             FROM ad_snippets WHERE site_id = ?",
        )
        .bind(site_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AdSnippet::from))
    }

    async fn first_social_account(&self, user_id: i64) -> StoreResult<Option<SocialAccount>> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, user_id, provider, uid FROM social_accounts
             WHERE user_id = ? ORDER BY id LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SocialAccount::from))
    }

    async fn social_account_by_uid(&self, uid: &str) -> StoreResult<Option<SocialAccount>> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, user_id, provider, uid FROM social_accounts
             WHERE uid = ? ORDER BY id LIMIT 1",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SocialAccount::from))
    }

    async fn record_for(&self, app_id: i64, user_id: i64) -> StoreResult<Option<Record>> {
        let row: Option<RecordRow> = sqlx::query_as(
            "SELECT id, app_id, user_id, image, created FROM records
             WHERE app_id = ? AND user_id = ? ORDER BY id LIMIT 1",
        )
        .bind(app_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Record::from))
    }

    async fn records(&self, page: PageRequest) -> StoreResult<Page<Record>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
            .fetch_one(&self.pool)
            .await?;
        let total = u64::try_from(total).unwrap_or_default();
        let number = check_page(page, total)?;

        let rows: Vec<RecordRow> = sqlx::query_as(
            "SELECT id, app_id, user_id, image, created FROM records
             ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(i64::from(page.per_page))
        .bind(i64::try_from(offset(number, page.per_page)).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items: rows.into_iter().map(Record::from).collect(),
            number,
            per_page: page.per_page,
            total,
        })
    }

    async fn user_by_session(&self, token: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT u.id, u.username, u.is_superuser FROM sessions s
             JOIN users u ON u.id = s.user_id WHERE s.token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }
}
