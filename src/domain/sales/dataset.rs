// ============================================================
// DATASET
// ============================================================
// Ordered, columnar collection of sales records for one session

use serde::{Deserialize, Serialize};

use super::column::{Column, ColumnData};
use super::schema::Schema;
use crate::domain::error::{AppError, Result};

/// Columnar table of sales records.
///
/// Every column has exactly `row_count` values. Operations that restrict or
/// reshape a dataset return a new one; the source is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
    schema: Schema,
}

impl Dataset {
    /// Build a dataset, checking that all columns have the same length
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(|c| c.data.len()).unwrap_or(0);

        if let Some(bad) = columns.iter().find(|c| c.data.len() != row_count) {
            return Err(AppError::Internal(format!(
                "Column '{}' has {} values, expected {}",
                bad.name,
                bad.data.len(),
                row_count
            )));
        }

        let schema = Schema::from_columns(columns.iter().map(|c| c.name.as_str()));
        Ok(Self {
            columns,
            row_count,
            schema,
        })
    }

    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            row_count: 0,
            schema: Schema::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.data)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Fail with `MissingColumn` naming the first absent column
    pub fn require(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|n| !self.has_column(n)) {
            Some(missing) => Err(AppError::MissingColumn(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Like [`Dataset::require`], but the column must also be numeric
    pub fn require_numeric(&self, name: &str) -> Result<&ColumnData> {
        match self.column(name) {
            Some(data) if data.is_numeric() => Ok(data),
            Some(_) => Err(AppError::ValidationError(format!(
                "Column '{}' is not numeric",
                name
            ))),
            None => Err(AppError::MissingColumn(name.to_string())),
        }
    }

    /// New dataset holding the given rows in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.data.take(rows)))
            .collect();

        Dataset {
            columns,
            row_count: rows.len(),
            schema: self.schema.clone(),
        }
    }

    /// Replace a column in place or append it when absent
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        if !self.columns.is_empty() && column.data.len() != self.row_count {
            return Err(AppError::Internal(format!(
                "Column '{}' has {} values, expected {}",
                column.name,
                column.data.len(),
                self.row_count
            )));
        }

        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => existing.data = column.data,
            None => {
                if self.columns.is_empty() {
                    self.row_count = column.data.len();
                }
                self.columns.push(column);
            }
        }

        self.schema = Schema::from_columns(self.columns.iter().map(|c| c.name.as_str()));
        Ok(self)
    }

    pub fn without_column(mut self, name: &str) -> Self {
        self.columns.retain(|c| c.name != name);
        self.schema = Schema::from_columns(self.columns.iter().map(|c| c.name.as_str()));
        self
    }

    pub fn rename_column(mut self, from: &str, to: &str) -> Self {
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == from) {
            column.name = to.to_string();
        }
        self.schema = Schema::from_columns(self.columns.iter().map(|c| c.name.as_str()));
        self
    }

    /// First `limit` rows
    pub fn head(&self, limit: usize) -> Dataset {
        let rows: Vec<usize> = (0..self.row_count.min(limit)).collect();
        self.select_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sales::KnownField;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::new(
                "Brand",
                ColumnData::Text(vec!["A".into(), "B".into(), "C".into()]),
            ),
            Column::new("Amount_(BDT)", ColumnData::Measure(vec![1.0, 2.0, 3.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let result = Dataset::new(vec![
            Column::new("A", ColumnData::Measure(vec![1.0])),
            Column::new("B", ColumnData::Measure(vec![1.0, 2.0])),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_select_rows_keeps_order_and_schema() {
        let ds = sample();
        let picked = ds.select_rows(&[2, 0]);

        assert_eq!(picked.len(), 2);
        assert_eq!(picked.column("Brand").unwrap().text(0), "C");
        assert!(picked.schema().has(KnownField::Amount));
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn test_require_reports_missing_column() {
        let ds = sample();
        assert!(ds.require(&["Brand"]).is_ok());
        assert_eq!(
            ds.require(&["Brand", "Year"]),
            Err(AppError::MissingColumn("Year".to_string()))
        );
        assert!(ds.require_numeric("Brand").is_err());
        assert!(ds.require_numeric("Amount_(BDT)").is_ok());
    }

    #[test]
    fn test_rename_and_drop_update_schema() {
        let ds = sample()
            .rename_column("Brand", "Year")
            .without_column("Amount_(BDT)");

        assert_eq!(ds.column_names(), vec!["Year".to_string()]);
        assert!(ds.schema().has(KnownField::Year));
        assert!(!ds.schema().has(KnownField::Amount));
    }
}
