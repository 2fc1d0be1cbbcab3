//! Binary entrypoint: configuration, logging, wiring, and serving

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use review_pulse::config::AppConfig;
use review_pulse::db::Database;
use review_pulse::logging::init_logging;
use review_pulse::metrics::MetricsCollector;
use review_pulse::repository::{
    BusinessRepository, ReviewRepository, SqliteBusinessRepository, SqliteReviewRepository,
};
use review_pulse::routes::{build_router, start_server};
use review_pulse::service::{AnalyticsService, BusinessService};
use review_pulse::state::AppState;

#[derive(Parser)]
#[command(author, version, about = "Read-only business review analytics API")]
struct Cli {
    /// Host to bind (overrides configuration)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides configuration)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the SQLite database (overrides configuration)
    #[arg(short, long)]
    database: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(database) = cli.database {
        config.database.path = database;
    }
    if let Some(log_level) = cli.log_level {
        config.logging.level = log_level;
    }
    config.validate()?;

    let log_file = config.logging.file_path.clone().map(PathBuf::from);
    let _guard = init_logging(Some(&config.get_log_level()), log_file.as_deref())?;

    MetricsCollector::init()?;
    let metrics = MetricsCollector::default();

    let database = Arc::new(Database::with_pool_options(
        &config.get_database_path(),
        config.database.max_connections,
        Duration::from_secs(config.database.connection_timeout_secs),
    )?);
    metrics.update_connection_pool_size(database.pool_size() as usize);

    let business_repo: Arc<dyn BusinessRepository> = Arc::new(SqliteBusinessRepository::new(
        Arc::clone(&database),
        metrics,
    ));
    let review_repo: Arc<dyn ReviewRepository> = Arc::new(SqliteReviewRepository::new(
        Arc::clone(&database),
        metrics,
    ));

    let business_service = Arc::new(BusinessService::new(
        Arc::clone(&business_repo),
        Arc::clone(&review_repo),
        config.api.clone(),
    ));
    let analytics_service = Arc::new(AnalyticsService::new(review_repo, business_repo));

    let state = AppState::new(business_service, analytics_service);
    let router = build_router(state, &config.server.allowed_origins);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.bind_addr(),
        "starting review-pulse"
    );
    start_server(router, &config.bind_addr()).await
}
