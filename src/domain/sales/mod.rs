// ============================================================
// SALES DOMAIN LAYER
// ============================================================
// Core types and value objects for the sales dashboard pipeline
// No I/O, no async

mod aggregate;
mod column;
mod dataset;
mod filter;
mod ingest_report;
mod period;
mod schema;
mod text_encoding;

pub use aggregate::{
    AggregateRow, AggregateTable, AggregationKind, KeyMetrics, MapRow, MapTable, MeasureTotal,
    SummaryRow, SummaryTable,
};
pub use column::{parse_number, CategoricalColumn, Column, ColumnData};
pub use dataset::Dataset;
pub use filter::{FilterSet, ALL};
pub use ingest_report::IngestReport;
pub use period::{month_from_name, month_name, MatPeriod, YearMonth};
pub use schema::{is_measure_column, KnownField, Schema, UNKNOWN};
pub use text_encoding::TextEncoding;
