use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration, layered from defaults and the environment.
///
/// Precedence (lowest to highest):
/// - `Config::default()`
/// - `STUDENTS_*` variables, nested keys separated by `__`
///   (e.g. `STUDENTS_STORAGE__BUSY_TIMEOUT_MS=500`)
/// - bare `PORT`, `DATABASE_URL` and `LOGLEVEL`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub loglevel: String,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// How long SQLite waits on a held lock before reporting it busy.
    pub busy_timeout_ms: u64,
    /// Total attempts for a write that hits lock contention, first try included.
    pub lock_retry_attempts: usize,
    pub lock_retry_delay_ms: u64,
    /// Apply the lock retry policy to create and update as well as delete.
    pub retry_all_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:students.db".to_string(),
            port: 5000,
            loglevel: "info".to_string(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 10_000,
            lock_retry_attempts: 5,
            lock_retry_delay_ms: 200,
            retry_all_writes: false,
        }
    }
}

impl StorageConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn lock_retry_delay(&self) -> Duration {
        Duration::from_millis(self.lock_retry_delay_ms)
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("STUDENTS_").split("__"))
            .merge(Env::raw().only(&["port", "database_url", "loglevel"]))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}
