// ============================================================
// EXPORT USE CASE
// ============================================================
// Presentation view of a dataset, CSV download and table preview

use chrono::{DateTime, Local};
use tracing::info;

use crate::domain::error::AppError;
use crate::domain::sales::{Dataset, KnownField};
use crate::infrastructure::csv::write_dataset;

/// Dataset as shown to users: the month appears by name under `Month`.
///
/// Applies only when both `Month` and `MonthName` exist.
pub fn display_view(dataset: &Dataset) -> Dataset {
    let month = KnownField::Month.column_name();
    let month_name = KnownField::MonthName.column_name();

    if dataset.has_column(month) && dataset.has_column(month_name) {
        dataset
            .clone()
            .without_column(month)
            .rename_column(month_name, month)
    } else {
        dataset.clone()
    }
}

/// First `limit` rows of the display view
pub fn preview(dataset: &Dataset, limit: usize) -> Dataset {
    display_view(&dataset.head(limit))
}

/// CSV text of the display view
pub fn export_csv(dataset: &Dataset) -> Result<String, AppError> {
    let view = display_view(dataset);
    let content = write_dataset(&view)?;

    info!(
        rows = view.len(),
        columns = view.columns().len(),
        bytes = content.len(),
        "Exported dataset to CSV"
    );
    Ok(content)
}

/// Download name for an export made at `now`
pub fn export_file_name(now: DateTime<Local>) -> String {
    format!("sales_data_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::aggregation::key_metrics;
    use crate::application::use_cases::record_ingestor::RecordIngestor;
    use chrono::TimeZone;

    const SALES_CSV: &str = "\
Year,Month,Brand,AdmDiv,Qty_(Pcs),Amount_(BDT)
2023,1,Alpha,Dhaka,10,100.5
2023,2,\"Beta, Ltd\",Khulna,,bad
2023,14,Gamma,Sylhet,3,20";

    fn ingest(content: &str) -> Dataset {
        RecordIngestor::default().ingest(content.as_bytes()).unwrap().0
    }

    #[test]
    fn test_display_view_replaces_month() {
        let view = display_view(&ingest(SALES_CSV));

        assert!(!view.has_column("MonthName"));
        assert_eq!(view.column("Month").unwrap().text(0), "January");
        assert_eq!(view.column("Month").unwrap().text(2), "Unknown");
    }

    #[test]
    fn test_export_header_uses_display_columns() {
        let content = export_csv(&ingest(SALES_CSV)).unwrap();
        let header = content.lines().next().unwrap();

        assert_eq!(
            header,
            "Year,Brand,AdmDiv,Qty_(Pcs),Amount_(BDT),Month,YearMonth"
        );
        assert!(content.contains("\"Beta, Ltd\""));
    }

    #[test]
    fn test_export_then_ingest_keeps_rows_and_sums() {
        let original = ingest(SALES_CSV);
        let reloaded = ingest(&export_csv(&original).unwrap());

        assert_eq!(reloaded.len(), original.len());
        let before = key_metrics(&original);
        let after = key_metrics(&reloaded);
        assert_eq!(after.total("Amount_(BDT)"), before.total("Amount_(BDT)"));
        assert_eq!(after.total("Qty_(Pcs)"), before.total("Qty_(Pcs)"));
        // Month is written by name and does not read back as a number
        assert_eq!(reloaded.column("Month").unwrap().number(1), None);
        assert_eq!(reloaded.column("MonthName").unwrap().text(1), "Unknown");
    }

    #[test]
    fn test_preview_is_limited() {
        let view = preview(&ingest(SALES_CSV), 2);

        assert_eq!(view.len(), 2);
        assert!(!view.has_column("MonthName"));
    }

    #[test]
    fn test_export_file_name() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(export_file_name(now), "sales_data_20240305_140709.csv");
    }
}
