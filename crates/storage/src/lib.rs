use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use shared::{
    domain::ReferenceId,
    protocol::{store_key, SubmittedRecord},
};

pub const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

/// Append-only key-value persistence for accepted grievances.
///
/// `put` must fail rather than overwrite when the reference id is already taken.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put(&self, record: &SubmittedRecord) -> Result<()>;
    async fn get(&self, reference_id: &ReferenceId) -> Result<Option<SubmittedRecord>>;
}

#[async_trait]
impl<T> RecordStore for Arc<T>
where
    T: RecordStore + ?Sized,
{
    async fn put(&self, record: &SubmittedRecord) -> Result<()> {
        (**self).put(record).await
    }

    async fn get(&self, reference_id: &ReferenceId) -> Result<Option<SubmittedRecord>> {
        (**self).get(reference_id).await
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = pool_options(database_url)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open grievance database '{database_url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(%database_url, "grievance store ready");
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn count_records(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM grievances")
            .fetch_one(&self.pool)
            .await
            .context("failed to count grievance records")?;
        Ok(count)
    }
}

#[async_trait]
impl RecordStore for Storage {
    async fn put(&self, record: &SubmittedRecord) -> Result<()> {
        let payload = record
            .to_json()
            .context("failed to serialize grievance record")?;
        let result = sqlx::query(
            "INSERT INTO grievances (reference_id, store_key, organization, payload, submitted_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(record.reference_id.as_str())
        .bind(record.store_key())
        .bind(record.organization.as_str())
        .bind(payload)
        .bind(record.submitted_at_iso())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(reference_id = %record.reference_id, "stored grievance record");
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                bail!(
                    "grievance record {} already exists",
                    record.reference_id
                )
            }
            Err(err) => Err(anyhow!(err).context(format!(
                "failed to store grievance record {}",
                record.reference_id
            ))),
        }
    }

    async fn get(&self, reference_id: &ReferenceId) -> Result<Option<SubmittedRecord>> {
        let row = sqlx::query("SELECT payload FROM grievances WHERE reference_id = ?")
            .bind(reference_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load grievance record {reference_id}"))?;

        row.map(|r| {
            let payload: String = r.get(0);
            SubmittedRecord::from_json(&payload)
                .with_context(|| format!("corrupt payload for grievance record {reference_id}"))
        })
        .transpose()
    }
}

/// Process-local store keyed like browser local storage (`grievance_<ID>` -> JSON).
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, record: &SubmittedRecord) -> Result<()> {
        let key = record.store_key();
        let payload = record
            .to_json()
            .context("failed to serialize grievance record")?;
        let mut entries = self.entries.write().await;
        if entries.contains_key(&key) {
            bail!("grievance record {} already exists", record.reference_id);
        }
        entries.insert(key, payload);
        Ok(())
    }

    async fn get(&self, reference_id: &ReferenceId) -> Result<Option<SubmittedRecord>> {
        let entries = self.entries.read().await;
        entries
            .get(&store_key(reference_id))
            .map(|payload| {
                SubmittedRecord::from_json(payload).with_context(|| {
                    format!("corrupt payload for grievance record {reference_id}")
                })
            })
            .transpose()
    }
}

/// An in-memory database lives only as long as some connection to it, so the pool
/// keeps exactly one open connection and never reaps it.
fn pool_options(database_url: &str) -> SqlitePoolOptions {
    if database_url == MEMORY_DATABASE_URL {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == MEMORY_DATABASE_URL || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
