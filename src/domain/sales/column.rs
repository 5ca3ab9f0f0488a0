// ============================================================
// COLUMN STORAGE
// ============================================================
// Typed column vectors backing a Dataset

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Dictionary-coded text column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    /// Distinct values in first-seen order
    pub dictionary: Vec<String>,

    /// One index into `dictionary` per row
    pub codes: Vec<u32>,
}

impl CategoricalColumn {
    /// Dictionary-code a text vector
    pub fn encode(values: &[String]) -> Self {
        let mut dictionary: Vec<String> = Vec::new();
        let mut lookup: HashMap<&str, u32> = HashMap::new();
        let mut codes = Vec::with_capacity(values.len());

        for value in values {
            let code = match lookup.get(value.as_str()) {
                Some(code) => *code,
                None => {
                    let code = dictionary.len() as u32;
                    dictionary.push(value.clone());
                    lookup.insert(value.as_str(), code);
                    code
                }
            };
            codes.push(code);
        }

        Self { dictionary, codes }
    }

    pub fn value(&self, row: usize) -> &str {
        &self.dictionary[self.codes[row] as usize]
    }
}

/// Values of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    /// Numeric measure, never missing
    Measure(Vec<f64>),

    /// Nullable integer (month numbers)
    Integer(Vec<Option<i64>>),

    /// Plain text
    Text(Vec<String>),

    /// Dictionary-coded text
    Categorical(CategoricalColumn),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Measure(v) => v.len(),
            ColumnData::Integer(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Categorical(c) => c.codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the column holds numbers that can be summed
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Measure(_) | ColumnData::Integer(_))
    }

    /// Whether the column holds text (plain or dictionary-coded)
    pub fn is_text(&self) -> bool {
        matches!(self, ColumnData::Text(_) | ColumnData::Categorical(_))
    }

    /// Text rendering of a cell, as used for filtering, grouping and export
    pub fn text(&self, row: usize) -> Cow<'_, str> {
        match self {
            ColumnData::Measure(v) => Cow::Owned(v[row].to_string()),
            ColumnData::Integer(v) => match v[row] {
                Some(n) => Cow::Owned(n.to_string()),
                None => Cow::Borrowed(""),
            },
            ColumnData::Text(v) => Cow::Borrowed(v[row].as_str()),
            ColumnData::Categorical(c) => Cow::Borrowed(c.value(row)),
        }
    }

    /// Numeric reading of a cell.
    ///
    /// Text cells are parsed leniently (surrounding whitespace ignored);
    /// anything that does not parse to a finite number is `None`.
    pub fn number(&self, row: usize) -> Option<f64> {
        match self {
            ColumnData::Measure(v) => Some(v[row]),
            ColumnData::Integer(v) => v[row].map(|n| n as f64),
            ColumnData::Text(_) | ColumnData::Categorical(_) => {
                parse_number(&self.text(row))
            }
        }
    }

    /// New column holding only the given rows, in the given order
    pub fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Measure(v) => ColumnData::Measure(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Integer(v) => ColumnData::Integer(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&i| v[i].clone()).collect()),
            ColumnData::Categorical(c) => ColumnData::Categorical(CategoricalColumn {
                dictionary: c.dictionary.clone(),
                codes: rows.iter().map(|&i| c.codes[i]).collect(),
            }),
        }
    }

    /// Number of distinct values (text rendering)
    pub fn distinct_count(&self) -> usize {
        match self {
            ColumnData::Categorical(c) => {
                let mut seen = vec![false; c.dictionary.len()];
                c.codes.iter().for_each(|&code| seen[code as usize] = true);
                seen.into_iter().filter(|s| *s).count()
            }
            _ => {
                let mut seen = std::collections::HashSet::new();
                for row in 0..self.len() {
                    seen.insert(self.text(row));
                }
                seen.len()
            }
        }
    }
}

/// Parse a trimmed cell as a finite float
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_categorical_encoding_preserves_values() {
        let values = strings(&["Dhaka", "Khulna", "Dhaka", "Sylhet", "Khulna"]);
        let encoded = CategoricalColumn::encode(&values);

        assert_eq!(encoded.dictionary, strings(&["Dhaka", "Khulna", "Sylhet"]));
        assert_eq!(encoded.codes, vec![0, 1, 0, 2, 1]);
        assert_eq!(encoded.value(3), "Sylhet");
    }

    #[test]
    fn test_cell_rendering() {
        let measure = ColumnData::Measure(vec![100.0, 2.5]);
        let month = ColumnData::Integer(vec![Some(3), None]);

        assert_eq!(measure.text(0), "100");
        assert_eq!(measure.text(1), "2.5");
        assert_eq!(month.text(0), "3");
        assert_eq!(month.text(1), "");
        assert_eq!(month.number(1), None);
    }

    #[test]
    fn test_text_number_parsing() {
        let years = ColumnData::Text(strings(&["2023", " 2024 ", "Unknown", "2023.0"]));

        assert_eq!(years.number(0), Some(2023.0));
        assert_eq!(years.number(1), Some(2024.0));
        assert_eq!(years.number(2), None);
        assert_eq!(years.number(3), Some(2023.0));
    }

    #[test]
    fn test_take_and_distinct_count() {
        let data = ColumnData::Categorical(CategoricalColumn::encode(&strings(&[
            "A", "B", "A", "C",
        ])));
        let taken = data.take(&[0, 2]);

        assert_eq!(taken.len(), 2);
        assert_eq!(taken.text(1), "A");
        assert_eq!(taken.distinct_count(), 1);
        assert_eq!(data.distinct_count(), 3);
    }
}
