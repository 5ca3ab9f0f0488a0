use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::path::Path;
use tracing::debug;

use crate::domain::dashboard_config::DashboardConfig;
use crate::domain::error::{AppError, Result};

/// Default configuration file, looked up in the working directory
pub const CONFIG_FILE: &str = "dashboard.toml";

/// Prefix of environment overrides, e.g. `SALES_DASHBOARD_PORT=9000`
pub const ENV_PREFIX: &str = "SALES_DASHBOARD_";

pub struct ConfigService;

impl ConfigService {
    /// Defaults, then `dashboard.toml`, then `SALES_DASHBOARD_*` variables
    pub fn load() -> Result<DashboardConfig> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<DashboardConfig> {
        let config: DashboardConfig = Self::figment(path)
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;

        config.validate().map_err(AppError::ConfigError)?;
        Ok(config)
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(DashboardConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }
}
