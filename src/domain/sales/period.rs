// ============================================================
// MAT PERIODS
// ============================================================
// Calendar months and rolling 12-month (Moving Annual Total) windows

use serde::{Deserialize, Serialize};

use super::schema::UNKNOWN;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Full month name for 1–12, `"Unknown"` otherwise
pub fn month_name(month: Option<i64>) -> &'static str {
    match month {
        Some(m @ 1..=12) => MONTH_NAMES[(m - 1) as usize],
        _ => UNKNOWN,
    }
}

/// Month number from a full or three-letter English name, case-insensitive
pub fn month_from_name(name: &str) -> Option<i64> {
    let lower = name.trim().to_lowercase();
    if lower.len() < 3 {
        return None;
    }

    MONTH_NAMES
        .iter()
        .position(|full| {
            let full = full.to_lowercase();
            full == lower || (lower.len() == 3 && full.starts_with(&lower))
        })
        .map(|idx| idx as i64 + 1)
}

/// A calendar month, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth(pub i32, pub u32);

impl YearMonth {
    pub fn year(&self) -> i32 {
        self.0
    }

    pub fn month(&self) -> u32 {
        self.1
    }

    /// Combined sortable key `year * 100 + month`
    pub fn key(&self) -> i64 {
        self.0 as i64 * 100 + self.1 as i64
    }

    /// The month before this one, wrapping January to December of the prior year.
    /// `None` when the prior year is not representable.
    pub fn previous(&self) -> Option<YearMonth> {
        if self.1 <= 1 {
            self.0.checked_sub(1).map(|year| YearMonth(year, 12))
        } else {
            Some(YearMonth(self.0, self.1 - 1))
        }
    }

    /// Upper-case three-letter month abbreviation
    pub fn month_abbr(&self) -> String {
        month_name(Some(self.1 as i64))
            .chars()
            .take(3)
            .collect::<String>()
            .to_uppercase()
    }
}

/// Rolling 12-month window identified by its last month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatPeriod {
    /// Display label, e.g. `MAT_DEC_2023`
    pub label: String,

    /// The 12 months of the window, oldest first
    pub months: Vec<YearMonth>,

    pub end_year: i32,
    pub end_month: u32,
}

impl MatPeriod {
    /// Window of 12 months ending at (and including) `end`, truncated at the
    /// first representable year
    pub fn ending_at(end: YearMonth) -> Self {
        let mut months = Vec::with_capacity(12);
        let mut cursor = Some(end);
        while months.len() < 12 {
            let Some(month) = cursor else { break };
            months.push(month);
            cursor = month.previous();
        }
        months.reverse();

        Self {
            label: format!("MAT_{}_{}", end.month_abbr(), end.year()),
            months,
            end_year: end.year(),
            end_month: end.month(),
        }
    }

    pub fn contains(&self, month: YearMonth) -> bool {
        self.months.contains(&month)
    }
}
