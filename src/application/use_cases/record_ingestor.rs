// ============================================================
// RECORD INGESTOR USE CASE
// ============================================================
// Turn uploaded bytes into a typed Dataset: decode, parse, coerce,
// derive time columns, dictionary-code low-cardinality text

use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::error::AppError;
use crate::domain::sales::{
    is_measure_column, month_name, parse_number, CategoricalColumn, Column,
    ColumnData, Dataset, IngestReport, KnownField, UNKNOWN,
};
use crate::infrastructure::csv::CsvParser;
use crate::shared::text::normalize_division_name;

/// Default distinct/rows ratio below which text columns are dictionary-coded
pub const DEFAULT_CATEGORICAL_RATIO: f64 = 0.5;

/// Record ingestion use case
pub struct RecordIngestor {
    categorical_ratio: f64,
}

impl RecordIngestor {
    pub fn new(categorical_ratio: f64) -> Self {
        Self { categorical_ratio }
    }

    /// Decode, parse and type an uploaded sales file
    pub fn ingest(&self, bytes: &[u8]) -> Result<(Dataset, IngestReport), AppError> {
        let start = Instant::now();

        let (parsed, encoding) = CsvParser::new().parse_bytes(bytes)?;
        let row_count = parsed.len();

        let mut zero_filled = BTreeMap::new();
        let mut unknown_filled = BTreeMap::new();
        let mut columns = Vec::with_capacity(parsed.headers.len() + 3);

        for (idx, header) in parsed.headers.iter().enumerate() {
            let data = if is_measure_column(header) {
                let mut substituted = 0usize;
                let values = parsed
                    .column(idx)
                    .map(|cell| match cell.and_then(parse_number) {
                        Some(n) => n,
                        None => {
                            substituted += 1;
                            0.0
                        }
                    })
                    .collect();
                if substituted > 0 {
                    zero_filled.insert(header.clone(), substituted);
                }
                ColumnData::Measure(values)
            } else {
                let mut substituted = 0usize;
                let mut values: Vec<String> = parsed
                    .column(idx)
                    .map(|cell| match cell {
                        Some(value) => value.to_string(),
                        None => {
                            substituted += 1;
                            UNKNOWN.to_string()
                        }
                    })
                    .collect();
                if substituted > 0 {
                    unknown_filled.insert(header.clone(), substituted);
                }

                if header == KnownField::AdmDiv.column_name() {
                    values = values.iter().map(|v| normalize_division_name(v)).collect();
                }

                if header == KnownField::Month.column_name() {
                    ColumnData::Integer(values.iter().map(|v| parse_month(v)).collect())
                } else {
                    ColumnData::Text(values)
                }
            };

            columns.push(Column::new(header.clone(), data));
        }

        let dataset = derive_time_columns(Dataset::new(columns)?)?;
        let (dataset, categorical_columns) = self.optimize_categories(dataset)?;

        let report = IngestReport {
            encoding,
            row_count,
            headers: parsed.headers,
            zero_filled,
            unknown_filled,
            categorical_columns,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            rows = report.row_count,
            columns = dataset.columns().len(),
            encoding = encoding.label(),
            substituted_cells = report.warning_count(),
            "Ingested sales upload"
        );
        debug!(
            zero_filled = ?report.zero_filled,
            unknown_filled = ?report.unknown_filled,
            categorical = ?report.categorical_columns,
            "{}",
            report.summary()
        );

        Ok((dataset, report))
    }

    /// Dictionary-code text columns whose distinct/rows ratio is below the threshold
    fn optimize_categories(&self, dataset: Dataset) -> Result<(Dataset, Vec<String>), AppError> {
        let rows = dataset.len();
        if rows == 0 {
            return Ok((dataset, Vec::new()));
        }

        let candidates: Vec<(String, CategoricalColumn)> = dataset
            .columns()
            .iter()
            .filter_map(|column| match &column.data {
                ColumnData::Text(values) => {
                    let ratio = column.data.distinct_count() as f64 / rows as f64;
                    (ratio < self.categorical_ratio)
                        .then(|| (column.name.clone(), CategoricalColumn::encode(values)))
                }
                _ => None,
            })
            .collect();

        let names = candidates.iter().map(|(name, _)| name.clone()).collect();
        let mut dataset = dataset;
        for (name, encoded) in candidates {
            dataset = dataset.with_column(Column::new(name, ColumnData::Categorical(encoded)))?;
        }

        Ok((dataset, names))
    }
}

impl Default for RecordIngestor {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORICAL_RATIO)
    }
}

/// Month number from a numeric cell; fractional and non-numeric cells are missing
fn parse_month(raw: &str) -> Option<i64> {
    parse_number(raw)
        .filter(|n| n.fract() == 0.0 && n.abs() <= i64::MAX as f64)
        .map(|n| n as i64)
}

/// Append `MonthName`, `YearMonth` and `YearQuarter` when their inputs exist
fn derive_time_columns(dataset: Dataset) -> Result<Dataset, AppError> {
    let rows = dataset.len();
    let mut derived = Vec::new();

    if let Some(ColumnData::Integer(months)) = dataset.column(KnownField::Month.column_name()) {
        derived.push(Column::new(
            KnownField::MonthName.column_name(),
            ColumnData::Text(months.iter().map(|m| month_name(*m).to_string()).collect()),
        ));

        if let Some(years) = dataset.column(KnownField::Year.column_name()) {
            let values = (0..rows)
                .map(|row| match months[row] {
                    Some(month) => format!("{}-{:02}", years.text(row), month),
                    None => UNKNOWN.to_string(),
                })
                .collect();
            derived.push(Column::new(
                KnownField::YearMonth.column_name(),
                ColumnData::Text(values),
            ));
        }
    }

    if let (Some(years), Some(quarters)) = (
        dataset.column(KnownField::Year.column_name()),
        dataset.column(KnownField::Quarter.column_name()),
    ) {
        let values = (0..rows)
            .map(|row| format!("{}-Q{}", years.text(row), quarters.text(row)))
            .collect();
        derived.push(Column::new(
            KnownField::YearQuarter.column_name(),
            ColumnData::Text(values),
        ));
    }

    derived
        .into_iter()
        .try_fold(dataset, |dataset, column| dataset.with_column(column))
}
