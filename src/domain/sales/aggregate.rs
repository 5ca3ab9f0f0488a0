// ============================================================
// AGGREGATION RESULTS
// ============================================================
// Tabular outputs consumed by charts, tables and the map

use serde::{Deserialize, Serialize};

/// How grouped values are reduced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    #[default]
    Sum,
    Mean,
}

/// One group of an aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Group key values, aligned with `AggregateTable::key_columns`
    pub keys: Vec<String>,
    pub value: f64,
}

/// Grouped and reduced values.
///
/// An empty table is a normal result (no data, or a referenced column absent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateTable {
    pub key_columns: Vec<String>,
    pub value_column: String,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Value of the group whose keys equal `keys`
    pub fn value_of(&self, keys: &[&str]) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.keys.iter().map(String::as_str).eq(keys.iter().copied()))
            .map(|row| row.value)
    }
}

/// Per-group statistics for the summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub key: String,
    pub total: f64,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub column: String,
    pub value_column: String,
    pub rows: Vec<SummaryRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureTotal {
    pub column: String,
    pub total: f64,
}

/// Headline numbers of a (filtered) dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub totals: Vec<MeasureTotal>,
    pub record_count: usize,
}

impl KeyMetrics {
    pub fn total(&self, column: &str) -> Option<f64> {
        self.totals
            .iter()
            .find(|t| t.column == column)
            .map(|t| t.total)
    }
}

/// Aggregated value of one boundary polygon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRow {
    /// Index of the polygon in the boundary set
    pub boundary_index: usize,
    #[serde(rename = "AdmDiv")]
    pub adm_div: String,
    #[serde(rename = "Value")]
    pub value: f64,
}

/// Map aggregation, one row per boundary polygon in boundary order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapTable {
    pub value_column: String,
    pub rows: Vec<MapRow>,
}

impl MapTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
