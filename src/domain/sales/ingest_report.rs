// ============================================================
// INGESTION REPORT
// ============================================================
// What happened while turning an upload into a Dataset

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::TextEncoding;

/// Statistics of one ingestion run.
///
/// Cell-level coercion failures are not errors; they are counted here per
/// column so callers can surface them if they want to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Encoding that decoded the upload
    pub encoding: TextEncoding,

    /// Number of records
    pub row_count: usize,

    /// Column headers after trimming and de-duplication
    pub headers: Vec<String>,

    /// Measure cells replaced with 0, per column
    pub zero_filled: BTreeMap<String, usize>,

    /// Dimension cells replaced with "Unknown", per column
    pub unknown_filled: BTreeMap<String, usize>,

    /// Columns stored dictionary-coded
    pub categorical_columns: Vec<String>,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl IngestReport {
    /// Total number of substituted cells
    pub fn warning_count(&self) -> usize {
        self.zero_filled.values().sum::<usize>() + self.unknown_filled.values().sum::<usize>()
    }

    /// Get human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Ingestion ({} rows, {} columns, {}):\n\
             - Zero-filled measure cells: {}\n\
             - Unknown-filled dimension cells: {}\n\
             - Categorical columns: {}",
            self.row_count,
            self.headers.len(),
            self.encoding.label(),
            self.zero_filled.values().sum::<usize>(),
            self.unknown_filled.values().sum::<usize>(),
            self.categorical_columns.len()
        )
    }
}
