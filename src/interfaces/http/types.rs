use serde::{Deserialize, Serialize};

use crate::domain::dashboard_config::ColorScale;
use crate::domain::sales::{AggregationKind, Dataset, FilterSet, KnownField};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

fn default_value_column() -> String {
    KnownField::Amount.column_name().to_string()
}

fn default_group_column() -> String {
    KnownField::AdmDiv.column_name().to_string()
}

/// Row selection shared by every analysis request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub filters: FilterSet,
    /// Label of a MAT window, e.g. `MAT_DEC_2023`
    #[serde(default)]
    pub mat_period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MapRequest {
    #[serde(flatten)]
    pub scope: AnalysisRequest,
    #[serde(default = "default_value_column")]
    pub value: String,
    #[serde(default = "default_group_column")]
    pub group: String,
    #[serde(default)]
    pub color_scale: Option<ColorScale>,
}

#[derive(Debug, Deserialize)]
pub struct TrendRequest {
    #[serde(flatten)]
    pub scope: AnalysisRequest,
    pub time: String,
    #[serde(default = "default_value_column")]
    pub value: String,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub aggregation: AggregationKind,
}

/// Bar chart and summary table request
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    #[serde(flatten)]
    pub scope: AnalysisRequest,
    pub category: String,
    #[serde(default = "default_value_column")]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct TableRequest {
    #[serde(flatten)]
    pub scope: AnalysisRequest,
    /// Rows to return, capped by the configured display limit
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Data table preview
#[derive(Debug, Serialize)]
pub struct TableResponse {
    /// Rows matching the request before truncation
    pub total_rows: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableResponse {
    pub fn from_view(view: &Dataset, total_rows: usize) -> Self {
        let rows = (0..view.len())
            .map(|row| {
                view.columns()
                    .iter()
                    .map(|c| c.data.text(row).into_owned())
                    .collect()
            })
            .collect();

        Self {
            total_rows,
            columns: view.column_names(),
            rows,
        }
    }
}
