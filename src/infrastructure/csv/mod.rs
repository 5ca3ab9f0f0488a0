// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Encoding fallback, CSV parsing and CSV export

mod csv_parser;
mod csv_writer;

pub use csv_parser::{CsvParser, ParsedCsv};
pub use csv_writer::write_dataset;
