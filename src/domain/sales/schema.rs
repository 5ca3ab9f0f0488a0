// ============================================================
// SALES SCHEMA
// ============================================================
// Known column names and the set of fields present after ingestion

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sentinel used for missing dimensional values
pub const UNKNOWN: &str = "Unknown";

/// Fields the pipeline knows by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KnownField {
    QtyPcs,
    QtyKg,
    Amount,
    Year,
    Month,
    Quarter,
    FiscalYear,
    Brand,
    DivName,
    AdmDiv,
    MonthName,
    YearMonth,
    YearQuarter,
}

impl KnownField {
    pub const ALL: [KnownField; 13] = [
        KnownField::QtyPcs,
        KnownField::QtyKg,
        KnownField::Amount,
        KnownField::Year,
        KnownField::Month,
        KnownField::Quarter,
        KnownField::FiscalYear,
        KnownField::Brand,
        KnownField::DivName,
        KnownField::AdmDiv,
        KnownField::MonthName,
        KnownField::YearMonth,
        KnownField::YearQuarter,
    ];

    /// Measure columns, in display order
    pub const MEASURES: [KnownField; 3] = [KnownField::QtyPcs, KnownField::QtyKg, KnownField::Amount];

    /// Column header as it appears in the sales file
    pub fn column_name(&self) -> &'static str {
        match self {
            KnownField::QtyPcs => "Qty_(Pcs)",
            KnownField::QtyKg => "Qty_(KG)",
            KnownField::Amount => "Amount_(BDT)",
            KnownField::Year => "Year",
            KnownField::Month => "Month",
            KnownField::Quarter => "Quarter",
            KnownField::FiscalYear => "FY",
            KnownField::Brand => "Brand",
            KnownField::DivName => "DivName",
            KnownField::AdmDiv => "AdmDiv",
            KnownField::MonthName => "MonthName",
            KnownField::YearMonth => "YearMonth",
            KnownField::YearQuarter => "YearQuarter",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column_name() == name)
    }

    pub fn is_measure(&self) -> bool {
        Self::MEASURES.contains(self)
    }
}

/// Whether a column name is one of the three measure columns
pub fn is_measure_column(name: &str) -> bool {
    KnownField::from_column_name(name)
        .map(|f| f.is_measure())
        .unwrap_or(false)
}

/// Known fields present in a dataset.
///
/// Produced once at ingestion; downstream operations ask it whether their
/// required fields exist instead of probing column names ad hoc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    present: BTreeSet<KnownField>,
}

impl Schema {
    pub fn from_columns<'a>(columns: impl IntoIterator<Item = &'a str>) -> Self {
        let present = columns
            .into_iter()
            .filter_map(KnownField::from_column_name)
            .collect();
        Self { present }
    }

    pub fn has(&self, field: KnownField) -> bool {
        self.present.contains(&field)
    }

    pub fn has_all(&self, fields: &[KnownField]) -> bool {
        fields.iter().all(|f| self.has(*f))
    }

    /// Present measure columns in display order
    pub fn measures(&self) -> Vec<KnownField> {
        KnownField::MEASURES
            .into_iter()
            .filter(|f| self.has(*f))
            .collect()
    }
}
