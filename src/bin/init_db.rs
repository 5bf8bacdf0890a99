//! One-time schema setup. Run before the first server launch.

use student_registry::config::Config;
use student_registry::db::{ConnectionFactory, ensure_schema};
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;
    student_registry::telemetry::init(&cfg.loglevel);

    let factory = ConnectionFactory::new(&cfg.database_url, &cfg.storage)?.create_if_missing(true);
    if let Err(e) = ensure_schema(&factory).await {
        error!(database_url = %cfg.database_url, error = %e, "schema initialization failed");
        return Err(e.into());
    }
    Ok(())
}
