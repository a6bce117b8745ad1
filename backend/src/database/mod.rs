//! Module for database connection setup and seeding.
//!
//! Opens the SQLite store named by the configuration, keeps its schema
//! current, and loads fixture files.

use std::path::Path;

use adapters::{Fixtures, MemoryStore, SqliteStore};
use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;

/// Connects to `database_url` and brings the schema up to date.
pub async fn open_store(config: &Config) -> Result<SqliteStore> {
    let store = SqliteStore::connect(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("failed to connect to {}", config.database_url))?;
    store.migrate().await.context("failed to migrate schema")?;
    info!(url = %config.database_url, "Database ready");
    Ok(store)
}

pub fn read_fixtures(path: &Path) -> Result<Fixtures> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixtures from {}", path.display()))?;
    Fixtures::from_json(&raw).with_context(|| format!("invalid fixtures in {}", path.display()))
}

pub async fn seed(config: &Config, path: &Path) -> Result<()> {
    let fixtures = read_fixtures(path)?;
    let store = open_store(config).await?;
    store
        .load_fixtures(&fixtures)
        .await
        .context("failed to load fixtures")?;
    Ok(())
}

/// In-process store, optionally pre-seeded, for running without a database.
pub fn memory_store(fixtures: Option<&Path>) -> Result<MemoryStore> {
    let store = MemoryStore::new();
    if let Some(path) = fixtures {
        store.load_fixtures(read_fixtures(path)?);
    }
    Ok(store)
}
