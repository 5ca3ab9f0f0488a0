use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::domain::error::AppError;
use crate::infrastructure::config::ConfigService;
use crate::interfaces::http::{add_log, start_server};

/// Load configuration, initialise logging and serve the dashboard API until shutdown
pub async fn run() -> Result<(), AppError> {
    let config = ConfigService::load()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| AppError::ConfigError(format!("Invalid log filter: {}", e)))?;
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let logs = Arc::new(Mutex::new(Vec::new()));
    add_log(
        &logs,
        "INFO",
        "System",
        &format!("Starting dashboard API on {}:{}", config.host, config.port),
    );
    info!(
        host = %config.host,
        port = config.port,
        boundary_path = %config.boundary_path.display(),
        "Starting dashboard API"
    );

    start_server(config, logs)?.await?;
    Ok(())
}
