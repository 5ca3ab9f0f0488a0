// ============================================================
// PERIOD CALCULATOR USE CASE
// ============================================================
// Derive the Moving Annual Total windows available in a dataset

use tracing::debug;

use crate::domain::sales::{ColumnData, Dataset, KnownField, MatPeriod, YearMonth};

/// Default number of MAT windows offered
pub const DEFAULT_MAX_MAT_PERIODS: usize = 24;

/// Accepted calendar years
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// Calendar month of a row, when both `Year` and `Month` are integral, the year is
/// within 1–9999 and the month is 1–12
pub fn row_year_month(years: &ColumnData, months: &ColumnData, row: usize) -> Option<YearMonth> {
    let year = years.number(row).filter(|y| y.fract() == 0.0)?;
    let month = months.number(row).filter(|m| m.fract() == 0.0)?;

    if !(1.0..=12.0).contains(&month) {
        return None;
    }
    let year = i32::try_from(year as i64)
        .ok()
        .filter(|y| YEAR_RANGE.contains(y))?;
    Some(YearMonth(year, month as u32))
}

/// MAT windows, most recent first.
///
/// The first window ends at the latest month in the data; each following
/// window ends one month earlier, down to the earliest month or `limit`.
pub fn calculate_mat_periods(dataset: &Dataset, limit: usize) -> Vec<MatPeriod> {
    let (Some(years), Some(months)) = (
        dataset.column(KnownField::Year.column_name()),
        dataset.column(KnownField::Month.column_name()),
    ) else {
        debug!("Year/Month columns absent, no MAT periods");
        return Vec::new();
    };

    let observed = (0..dataset.len()).filter_map(|row| row_year_month(years, months, row));
    let Some((earliest, latest)) = observed.fold(None, |acc: Option<(YearMonth, YearMonth)>, ym| {
        Some(match acc {
            Some((lo, hi)) => (lo.min(ym), hi.max(ym)),
            None => (ym, ym),
        })
    }) else {
        debug!("No valid Year/Month pairs, no MAT periods");
        return Vec::new();
    };

    let mut periods = Vec::new();
    let mut current = latest;
    while current >= earliest && periods.len() < limit {
        periods.push(MatPeriod::ending_at(current));
        current = match current.previous() {
            Some(previous) => previous,
            None => break,
        };
    }

    debug!(
        count = periods.len(),
        earliest = earliest.key(),
        latest = latest.key(),
        "Calculated MAT periods"
    );
    periods
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sales::Column;

    fn dataset(pairs: &[(&str, Option<i64>)]) -> Dataset {
        Dataset::new(vec![
            Column::new(
                "Year",
                ColumnData::Text(pairs.iter().map(|(y, _)| y.to_string()).collect()),
            ),
            Column::new(
                "Month",
                ColumnData::Integer(pairs.iter().map(|(_, m)| *m).collect()),
            ),
        ])
        .unwrap()
    }

    fn two_years() -> Dataset {
        let pairs: Vec<(&str, Option<i64>)> = ["2022", "2023"]
            .iter()
            .flat_map(|y| (1..=12).map(move |m| (*y, Some(m))))
            .collect();
        dataset(&pairs)
    }

    #[test]
    fn test_latest_period_first() {
        let periods = calculate_mat_periods(&two_years(), DEFAULT_MAX_MAT_PERIODS);

        assert_eq!(periods.len(), 24);
        assert_eq!(periods[0].label, "MAT_DEC_2023");
        assert_eq!(periods[0].months.first(), Some(&YearMonth(2023, 1)));
        assert_eq!(periods[0].months.last(), Some(&YearMonth(2023, 12)));
        assert_eq!(periods[1].label, "MAT_NOV_2023");
        assert_eq!(periods[23].label, "MAT_JAN_2022");
        assert_eq!(periods[23].months[0], YearMonth(2021, 2));
    }

    #[test]
    fn test_limit_caps_periods() {
        let periods = calculate_mat_periods(&two_years(), 5);

        assert_eq!(periods.len(), 5);
        assert_eq!(periods[4].label, "MAT_AUG_2023");
    }

    #[test]
    fn test_invalid_rows_are_ignored() {
        let periods = calculate_mat_periods(
            &dataset(&[
                ("2023", Some(3)),
                ("2023", Some(13)),
                ("abc", Some(5)),
                ("2024", None),
                ("2023", Some(2)),
            ]),
            24,
        );

        let labels: Vec<_> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["MAT_MAR_2023", "MAT_FEB_2023"]);
    }

    #[test]
    fn test_missing_columns_give_no_periods() {
        let data = Dataset::new(vec![Column::new(
            "Year",
            ColumnData::Text(vec!["2023".into()]),
        )])
        .unwrap();

        assert!(calculate_mat_periods(&data, 24).is_empty());
        assert!(calculate_mat_periods(&Dataset::empty(), 24).is_empty());
    }

    #[test]
    fn test_row_year_month_accepts_integral_text() {
        let years = ColumnData::Text(vec!["2023.0".into(), "2023.5".into()]);
        let months = ColumnData::Integer(vec![Some(7), Some(7)]);

        assert_eq!(row_year_month(&years, &months, 0), Some(YearMonth(2023, 7)));
        assert_eq!(row_year_month(&years, &months, 1), None);
    }

    #[test]
    fn test_out_of_range_years_are_ignored() {
        let years = ColumnData::Text(vec![
            "-2147483648".into(),
            "1e12".into(),
            "0".into(),
            "2023".into(),
        ]);
        let months = ColumnData::Integer(vec![Some(3); 4]);

        assert_eq!(row_year_month(&years, &months, 0), None);
        assert_eq!(row_year_month(&years, &months, 1), None);
        assert_eq!(row_year_month(&years, &months, 2), None);
        assert_eq!(row_year_month(&years, &months, 3), Some(YearMonth(2023, 3)));

        let periods = calculate_mat_periods(
            &dataset(&[("-2147483648", Some(3)), ("99999999999", Some(1))]),
            24,
        );
        assert!(periods.is_empty());
    }
}
