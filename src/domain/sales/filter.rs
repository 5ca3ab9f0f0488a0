use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel meaning "no restriction on this column"
pub const ALL: &str = "All";

/// Column → allowed values, supplied per request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(BTreeMap<String, Vec<String>>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, values: &[&str]) -> Self {
        self.insert(column, values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, values: Vec<String>) {
        self.0.insert(column.into(), values);
    }

    /// Filters that actually restrict rows: non-empty and without the `All` sentinel
    pub fn active(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .filter(|(_, values)| !values.is_empty() && !values.iter().any(|v| v == ALL))
            .map(|(column, values)| (column.as_str(), values.as_slice()))
    }

    pub fn is_unrestricted(&self) -> bool {
        self.active().next().is_none()
    }
}

impl From<BTreeMap<String, Vec<String>>> for FilterSet {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}
