#![allow(dead_code)]

use std::{
    fs,
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use sqlx::sqlite::SqliteConnection;

use student_registry::config::StorageConfig;
use student_registry::db::{ConnectionFactory, StudentStorage, ensure_schema};
use student_registry::db::sqlite::{LockRetry, release};

/// A schema-initialized SQLite file removed (with its WAL side files) on drop.
pub struct TempDb {
    pub path: PathBuf,
    pub url: String,
}

impl TempDb {
    pub async fn new(tag: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();

        let mut path = std::env::temp_dir();
        path.push(format!(
            "student-registry-{tag}-{}-{}.sqlite",
            std::process::id(),
            nanos
        ));
        let url = format!("sqlite:{}", path.display());

        let factory = ConnectionFactory::new(&url, &StorageConfig::default())
            .expect("invalid database url")
            .create_if_missing(true);
        ensure_schema(&factory).await.expect("schema init failed");

        Self { path, url }
    }

    pub fn storage(&self, cfg: &StorageConfig) -> StudentStorage {
        let factory = ConnectionFactory::new(&self.url, cfg).expect("invalid database url");
        StudentStorage::new(factory, LockRetry::from_config(cfg))
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        for suffix in ["-wal", "-shm"] {
            let mut side = self.path.clone().into_os_string();
            side.push(suffix);
            let _ = fs::remove_file(side);
        }
    }
}

/// Storage settings for contention tests: no SQLite-level waiting, so every
/// lock conflict surfaces immediately to the retry loop.
pub fn no_wait_storage() -> StorageConfig {
    StorageConfig {
        busy_timeout_ms: 0,
        ..StorageConfig::default()
    }
}

/// Take the write lock on a separate connection and hold it until `hold` elapses.
pub async fn hold_write_lock(storage: &StudentStorage, hold: Duration) -> tokio::task::JoinHandle<()> {
    let mut holder: SqliteConnection = storage.factory().acquire().await.expect("connect failed");
    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut holder)
        .await
        .expect("failed to take write lock");
    tokio::spawn(async move {
        tokio::time::sleep(hold).await;
        sqlx::query("ROLLBACK")
            .execute(&mut holder)
            .await
            .expect("failed to release write lock");
        release(holder).await;
    })
}
