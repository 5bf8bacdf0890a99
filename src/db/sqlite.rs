use crate::config::StorageConfig;
use crate::db::models::{Student, StudentFields};
use crate::error::{StudentError, is_lock_contention};
use backon::{ConstantBuilder, RetryableWithContext};
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteJournalMode,
    SqliteQueryResult, SqliteSynchronous,
};
use sqlx::{ConnectOptions, Connection, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

type OwnedQuery = Query<'static, Sqlite, SqliteArguments<'static>>;

const SELECT_ALL: &str = "SELECT id, name, age, grade, email FROM students";
const INSERT: &str = "INSERT INTO students (name, age, grade, email) VALUES (?, ?, ?, ?)";
const UPDATE: &str = "UPDATE students SET name = ?, age = ?, grade = ?, email = ? WHERE id = ?";
const DELETE: &str = "DELETE FROM students WHERE id = ?";

/// Opens one dedicated connection per call. Nothing is pooled or shared, so
/// concurrent handlers only ever contend on SQLite's own file locks.
#[derive(Debug, Clone)]
pub struct ConnectionFactory {
    options: SqliteConnectOptions,
}

impl ConnectionFactory {
    /// Every connection waits up to `busy_timeout` on a held lock, runs in WAL
    /// mode and commits with `synchronous = NORMAL`.
    pub fn new(database_url: &str, storage: &StorageConfig) -> Result<Self, StudentError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .busy_timeout(storage.busy_timeout())
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
        Ok(Self { options })
    }

    /// The server never creates the database file; only the initializer does.
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.options = self.options.create_if_missing(create);
        self
    }

    pub fn filename(&self) -> &Path {
        self.options.get_filename()
    }

    pub async fn acquire(&self) -> Result<SqliteConnection, StudentError> {
        Ok(self.options.connect().await?)
    }
}

/// Close a connection, logging rather than failing if the close itself errors.
pub async fn release(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        warn!(error = %e, "failed to close sqlite connection");
    }
}

/// Bounded fixed-delay retry for writes rejected by a concurrent writer.
#[derive(Debug, Clone, Copy)]
pub struct LockRetry {
    attempts: usize,
    delay: Duration,
    all_writes: bool,
}

impl LockRetry {
    pub fn from_config(cfg: &StorageConfig) -> Self {
        Self {
            attempts: cfg.lock_retry_attempts.max(1),
            delay: cfg.lock_retry_delay(),
            all_writes: cfg.retry_all_writes,
        }
    }

    fn backoff(&self, enabled: bool) -> ConstantBuilder {
        let retries = if enabled { self.attempts - 1 } else { 0 };
        ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(retries)
    }
}

/// Repository over the `students` table, one method per operation.
#[derive(Debug, Clone)]
pub struct StudentStorage {
    factory: ConnectionFactory,
    retry: LockRetry,
}

impl StudentStorage {
    pub fn new(factory: ConnectionFactory, retry: LockRetry) -> Self {
        Self { factory, retry }
    }

    pub fn from_config(database_url: &str, storage: &StorageConfig) -> Result<Self, StudentError> {
        let factory = ConnectionFactory::new(database_url, storage)?;
        Ok(Self::new(factory, LockRetry::from_config(storage)))
    }

    pub fn factory(&self) -> &ConnectionFactory {
        &self.factory
    }

    /// All rows in storage order.
    pub async fn list(&self) -> Result<Vec<Student>, StudentError> {
        let mut conn = self.factory.acquire().await?;
        let outcome = sqlx::query_as::<_, Student>(SELECT_ALL)
            .fetch_all(&mut conn)
            .await;
        release(conn).await;
        Ok(outcome?)
    }

    /// Insert a row and return its assigned id.
    pub async fn create(&self, fields: &StudentFields) -> Result<i64, StudentError> {
        let result = self
            .execute_write("create", self.retry.all_writes, || {
                sqlx::query(INSERT)
                    .bind(fields.name.clone())
                    .bind(fields.age)
                    .bind(fields.grade.clone())
                    .bind(fields.email.clone())
            })
            .await?;
        let id = result.last_insert_rowid();
        info!(id, "student created");
        Ok(id)
    }

    /// Overwrite every column of row `id`. Returns the number of rows touched.
    pub async fn update(&self, id: i64, fields: &StudentFields) -> Result<u64, StudentError> {
        let result = self
            .execute_write("update", self.retry.all_writes, || {
                sqlx::query(UPDATE)
                    .bind(fields.name.clone())
                    .bind(fields.age)
                    .bind(fields.grade.clone())
                    .bind(fields.email.clone())
                    .bind(id)
            })
            .await?;
        let affected = result.rows_affected();
        if affected == 0 {
            debug!(id, "update matched no student");
        }
        Ok(affected)
    }

    /// Delete row `id`, retrying while another writer holds the lock.
    pub async fn delete(&self, id: i64) -> Result<u64, StudentError> {
        let result = self
            .execute_write("delete", true, || sqlx::query(DELETE).bind(id))
            .await?;
        let affected = result.rows_affected();
        if affected == 0 {
            debug!(id, "delete matched no student");
        }
        Ok(affected)
    }

    /// Run one write statement on a fresh connection. The same connection is
    /// reused across retry attempts and closed once, whatever the outcome.
    async fn execute_write<F>(
        &self,
        op: &'static str,
        retry_on_lock: bool,
        build: F,
    ) -> Result<SqliteQueryResult, StudentError>
    where
        F: Fn() -> OwnedQuery + Send + Sync,
    {
        let conn = self.factory.acquire().await?;
        let (conn, outcome) = (|mut conn: SqliteConnection| {
            let query = build();
            async move {
                let res = query.execute(&mut conn).await;
                (conn, res)
            }
        })
        .retry(self.retry.backoff(retry_on_lock))
        .context(conn)
        .when(is_lock_contention)
        .notify(|err: &sqlx::Error, delay: Duration| {
            warn!(op, error = %err, ?delay, "storage locked; retrying");
        })
        .await;
        release(conn).await;
        Ok(outcome?)
    }
}
