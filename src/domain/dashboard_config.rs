//! Dashboard configuration
//! Server binding, boundary location and pipeline tuning knobs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Colour scale used to shade the choropleth
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColorScale {
    #[default]
    Viridis,
    Blues,
    Greens,
    Reds,
    YlOrRd,
    RdYlGn,
}

impl ColorScale {
    pub const ALL: [ColorScale; 6] = [
        ColorScale::Viridis,
        ColorScale::Blues,
        ColorScale::Greens,
        ColorScale::Reds,
        ColorScale::YlOrRd,
        ColorScale::RdYlGn,
    ];
}

impl fmt::Display for ColorScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Viridis => write!(f, "Viridis"),
            Self::Blues => write!(f, "Blues"),
            Self::Greens => write!(f, "Greens"),
            Self::Reds => write!(f, "Reds"),
            Self::YlOrRd => write!(f, "YlOrRd"),
            Self::RdYlGn => write!(f, "RdYlGn"),
        }
    }
}

impl std::str::FromStr for ColorScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scale| scale.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown color scale: {}", s))
    }
}

/// Runtime configuration of the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    /// Interface the HTTP server binds to
    pub host: String,

    /// Port the HTTP server listens on
    pub port: u16,

    /// Division boundaries: an ESRI shapefile (`.shp`) or a GeoJSON file
    pub boundary_path: PathBuf,

    /// Maximum number of MAT windows offered (default: 24)
    pub max_mat_periods: usize,

    /// Text columns with distinct/rows below this ratio are dictionary-coded (default: 0.5)
    pub categorical_ratio: f64,

    /// Rows shown in the data table preview (default: 1000)
    pub display_row_limit: usize,

    /// Largest accepted upload, in megabytes
    pub max_upload_mb: usize,

    /// Colour scale used when a map request does not name one
    pub default_color_scale: ColorScale,

    /// `tracing` filter directive
    pub log_filter: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            boundary_path: PathBuf::from("shapefiles").join("adm01.shp"),
            max_mat_periods: 24,
            categorical_ratio: 0.5,
            display_row_limit: 1000,
            max_upload_mb: 200,
            default_color_scale: ColorScale::Viridis,
            log_filter: "info".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be > 0".to_string());
        }
        if self.max_mat_periods == 0 {
            return Err("max_mat_periods must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.categorical_ratio) {
            return Err("categorical_ratio must be between 0.0 and 1.0".to_string());
        }
        if self.display_row_limit == 0 {
            return Err("display_row_limit must be > 0".to_string());
        }
        if self.max_upload_mb == 0 {
            return Err("max_upload_mb must be > 0".to_string());
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DashboardConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_ratio() {
        let config = DashboardConfig {
            categorical_ratio: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_color_scale_parsing() {
        assert_eq!("ylorrd".parse::<ColorScale>(), Ok(ColorScale::YlOrRd));
        assert_eq!(ColorScale::RdYlGn.to_string(), "RdYlGn");
        assert!("Magma".parse::<ColorScale>().is_err());
    }
}
