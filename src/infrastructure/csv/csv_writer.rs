// ============================================================
// CSV WRITER
// ============================================================
// Serialize a Dataset back to comma-delimited text

use csv::WriterBuilder;

use crate::domain::error::AppError;
use crate::domain::sales::Dataset;

/// Write the header row and every record of `dataset` as UTF-8 CSV
pub fn write_dataset(dataset: &Dataset) -> Result<String, AppError> {
    let mut writer = WriterBuilder::new().delimiter(b',').from_writer(Vec::new());

    writer.write_record(dataset.columns().iter().map(|c| c.name.as_str()))?;

    for row in 0..dataset.len() {
        writer.write_record(dataset.columns().iter().map(|c| c.data.text(row).into_owned()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::IoError(format!("Failed to flush CSV export: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("CSV export is not valid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sales::{Column, ColumnData};

    #[test]
    fn test_write_quotes_embedded_delimiters() {
        let dataset = Dataset::new(vec![
            Column::new(
                "Brand",
                ColumnData::Text(vec!["Alpha, Ltd".into(), "Beta".into()]),
            ),
            Column::new("Amount_(BDT)", ColumnData::Measure(vec![100.0, 2.5])),
        ])
        .unwrap();

        let text = write_dataset(&dataset).unwrap();
        assert_eq!(text, "Brand,Amount_(BDT)\n\"Alpha, Ltd\",100\nBeta,2.5\n");
    }
}
