// ============================================================
// DASHBOARD SESSION
// ============================================================
// One uploaded dataset plus everything derived from it once

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use super::aggregation::unique_values;
use super::filter_engine::{filter_by_mat, filter_data};
use super::period_calculator::calculate_mat_periods;
use super::record_ingestor::RecordIngestor;
use crate::domain::boundary::Boundaries;
use crate::domain::dashboard_config::DashboardConfig;
use crate::domain::error::{AppError, Result};
use crate::domain::sales::{Dataset, FilterSet, IngestReport, KnownField, MatPeriod};

/// Columns never offered as grouping parameters
const EXCLUDED_PARAMETERS: [&str; 4] = ["DivisionName", "DepotName", "DistributorName", "MonthName"];

/// Columns never offered for trend breakdowns
const EXCLUDED_TREND_PARAMETERS: [&str; 3] = ["DivisionName", "DepotName", "DistributorName"];

/// Time axes offered for trends, in display order
const TIME_COLUMNS: [KnownField; 4] = [
    KnownField::Year,
    KnownField::Quarter,
    KnownField::MonthName,
    KnownField::YearMonth,
];

/// Columns whose distinct values populate the filter choices
const FILTER_COLUMNS: [KnownField; 5] = [
    KnownField::DivName,
    KnownField::Brand,
    KnownField::Year,
    KnownField::FiscalYear,
    KnownField::Quarter,
];

/// Overview of the loaded dataset
#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub session_id: Uuid,
    pub loaded_at: DateTime<Local>,
    pub record_count: usize,
    pub columns: Vec<String>,
    /// First and last `Year` value
    pub year_range: Option<(String, String)>,
    /// Division names of the boundary set, when boundaries are available
    pub divisions: Option<Vec<String>>,
    pub boundaries_available: bool,
    pub variables: Vec<String>,
    pub parameters: Vec<String>,
    pub trend_params: Vec<String>,
    pub time_columns: Vec<String>,
    /// Choices for each filterable column present
    pub filter_options: BTreeMap<String, Vec<String>>,
    pub report: IngestReport,
}

/// State of one upload
#[derive(Debug, Clone)]
pub struct DashboardSession {
    pub id: Uuid,
    pub loaded_at: DateTime<Local>,
    pub dataset: Dataset,
    pub report: IngestReport,
    pub boundaries: Boundaries,
    /// Measure columns present
    pub variables: Vec<String>,
    /// Non-measure columns usable for grouping
    pub parameters: Vec<String>,
    pub trend_params: Vec<String>,
    pub time_columns: Vec<String>,
    /// Most recent first
    pub mat_periods: Vec<MatPeriod>,
}

impl DashboardSession {
    /// Ingest an upload and derive the session artifacts
    pub fn from_upload(bytes: &[u8], boundaries: Boundaries, config: &DashboardConfig) -> Result<Self> {
        let (dataset, report) = RecordIngestor::new(config.categorical_ratio).ingest(bytes)?;
        Self::from_dataset(dataset, report, boundaries, config)
    }

    pub fn from_dataset(
        dataset: Dataset,
        report: IngestReport,
        boundaries: Boundaries,
        config: &DashboardConfig,
    ) -> Result<Self> {
        if dataset.is_empty() {
            return Err(AppError::EmptyDataset);
        }

        let variables: Vec<String> = dataset
            .schema()
            .measures()
            .iter()
            .map(|f| f.column_name().to_string())
            .collect();

        let parameters: Vec<String> = dataset
            .column_names()
            .into_iter()
            .filter(|c| !variables.contains(c) && !EXCLUDED_PARAMETERS.contains(&c.as_str()))
            .collect();

        let trend_params = parameters
            .iter()
            .filter(|c| !EXCLUDED_TREND_PARAMETERS.contains(&c.as_str()))
            .cloned()
            .collect();

        let time_columns = TIME_COLUMNS
            .iter()
            .filter(|f| dataset.schema().has(**f))
            .map(|f| f.column_name().to_string())
            .collect();

        let mat_periods = calculate_mat_periods(&dataset, config.max_mat_periods);

        let session = Self {
            id: Uuid::new_v4(),
            loaded_at: Local::now(),
            dataset,
            report,
            boundaries,
            variables,
            parameters,
            trend_params,
            time_columns,
            mat_periods,
        };

        info!(
            session_id = %session.id,
            rows = session.dataset.len(),
            mat_periods = session.mat_periods.len(),
            boundaries = session.boundaries.is_available(),
            "Dashboard session created"
        );
        Ok(session)
    }

    /// MAT window by label
    pub fn period(&self, label: &str) -> Result<&MatPeriod> {
        self.mat_periods
            .iter()
            .find(|p| p.label == label)
            .ok_or_else(|| AppError::NotFound(format!("MAT period '{}' not found", label)))
    }

    /// Dataset restricted by equality filters, then by the optional MAT window
    pub fn filtered(&self, filters: &FilterSet, mat_period: Option<&str>) -> Result<Dataset> {
        let filtered = filter_data(&self.dataset, filters);
        match mat_period {
            Some(label) => Ok(filter_by_mat(&filtered, &self.period(label)?.months)),
            None => Ok(filtered),
        }
    }

    pub fn dataset_info(&self) -> DatasetInfo {
        let years = unique_values(&self.dataset, KnownField::Year.column_name());
        let year_range = match (years.first(), years.last()) {
            (Some(first), Some(last)) => Some((first.clone(), last.clone())),
            _ => None,
        };

        let filter_options = FILTER_COLUMNS
            .iter()
            .map(|f| f.column_name())
            .filter(|c| self.dataset.has_column(c))
            .map(|c| (c.to_string(), unique_values(&self.dataset, c)))
            .collect();

        DatasetInfo {
            session_id: self.id,
            loaded_at: self.loaded_at,
            record_count: self.dataset.len(),
            columns: self.dataset.column_names(),
            year_range,
            divisions: self.boundaries.available().map(|b| b.division_names()),
            boundaries_available: self.boundaries.is_available(),
            variables: self.variables.clone(),
            parameters: self.parameters.clone(),
            trend_params: self.trend_params.clone(),
            time_columns: self.time_columns.clone(),
            filter_options,
            report: self.report.clone(),
        }
    }
}
