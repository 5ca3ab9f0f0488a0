pub mod use_cases;

pub use use_cases::aggregation::{
    aggregate_for_bar, aggregate_for_map, aggregate_for_trend, key_metrics, summarize_by,
    unique_values,
};
pub use use_cases::export::{display_view, export_csv, export_file_name, preview};
pub use use_cases::filter_engine::{filter_by_mat, filter_data};
pub use use_cases::period_calculator::calculate_mat_periods;
pub use use_cases::record_ingestor::RecordIngestor;
pub use use_cases::session::{DashboardSession, DatasetInfo};
