use mimalloc::MiMalloc;
use student_registry::config::Config;
use student_registry::db::StudentStorage;
use student_registry::router::{StudentsState, students_router};
use tokio::net::TcpListener;
use tracing::info;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;
    student_registry::telemetry::init(&cfg.loglevel);

    info!(
        database_url = %cfg.database_url,
        port = cfg.port,
        loglevel = %cfg.loglevel,
        busy_timeout_ms = cfg.storage.busy_timeout_ms,
        retry_all_writes = cfg.storage.retry_all_writes,
    );

    // Schema setup is a separate step (`init_db`); a missing file is an error here.
    let storage = StudentStorage::from_config(&cfg.database_url, &cfg.storage)?;
    let app = students_router(StudentsState::new(storage));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
