// ============================================================
// FILTER ENGINE USE CASE
// ============================================================
// Row restriction by equality filters and MAT windows

use std::collections::HashSet;
use tracing::{debug, warn};

use super::period_calculator::row_year_month;
use crate::domain::sales::{Dataset, FilterSet, KnownField, YearMonth};

/// Rows whose cell text is allowed by every active filter.
///
/// Filters naming absent columns are ignored.
pub fn filter_data(dataset: &Dataset, filters: &FilterSet) -> Dataset {
    if filters.is_unrestricted() {
        return dataset.clone();
    }

    let active: Vec<_> = filters
        .active()
        .filter_map(|(name, allowed)| {
            let column = dataset.column(name);
            if column.is_none() {
                debug!(column = name, "Ignoring filter on absent column");
            }
            column.map(|data| (data, allowed.iter().map(String::as_str).collect::<HashSet<_>>()))
        })
        .collect();

    if active.is_empty() {
        return dataset.clone();
    }

    let rows: Vec<usize> = (0..dataset.len())
        .filter(|&row| {
            active
                .iter()
                .all(|(data, allowed)| allowed.contains(data.text(row).as_ref()))
        })
        .collect();

    debug!(
        before = dataset.len(),
        after = rows.len(),
        filters = active.len(),
        "Applied filters"
    );
    dataset.select_rows(&rows)
}

/// Rows whose `(Year, Month)` falls in `months`.
///
/// An empty window set, or a dataset without `Year`/`Month`, is returned unchanged.
pub fn filter_by_mat(dataset: &Dataset, months: &[YearMonth]) -> Dataset {
    if months.is_empty() {
        return dataset.clone();
    }

    let (Some(years), Some(month_col)) = (
        dataset.column(KnownField::Year.column_name()),
        dataset.column(KnownField::Month.column_name()),
    ) else {
        warn!("Year/Month columns absent, MAT filter not applied");
        return dataset.clone();
    };

    let window: HashSet<YearMonth> = months.iter().copied().collect();
    let rows: Vec<usize> = (0..dataset.len())
        .filter(|&row| {
            row_year_month(years, month_col, row).is_some_and(|ym| window.contains(&ym))
        })
        .collect();

    debug!(
        before = dataset.len(),
        after = rows.len(),
        "Applied MAT filter"
    );
    dataset.select_rows(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sales::{Column, ColumnData, MatPeriod};

    fn sales() -> Dataset {
        Dataset::new(vec![
            Column::new(
                "Year",
                ColumnData::Text(vec!["2022".into(), "2023".into(), "2023".into(), "2023".into()]),
            ),
            Column::new(
                "Month",
                ColumnData::Integer(vec![Some(12), Some(1), Some(6), None]),
            ),
            Column::new(
                "Brand",
                ColumnData::Text(vec!["A".into(), "B".into(), "A".into(), "C".into()]),
            ),
            Column::new("Amount_(BDT)", ColumnData::Measure(vec![1.0, 2.0, 3.0, 4.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_all_sentinel_is_identity() {
        let data = sales();
        let filters = FilterSet::new().with("Year", &["All"]);

        assert_eq!(filter_data(&data, &filters), data);
    }

    #[test]
    fn test_equality_filters() {
        let filters = FilterSet::new()
            .with("Brand", &["A", "C"])
            .with("Year", &["2023"]);
        let filtered = filter_data(&sales(), &filters);

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.column("Amount_(BDT)").unwrap().number(0), Some(3.0));
        assert_eq!(filtered.column("Amount_(BDT)").unwrap().number(1), Some(4.0));
    }

    #[test]
    fn test_unknown_filter_column_is_ignored() {
        let data = sales();
        let filters = FilterSet::new().with("Depot", &["X"]);

        assert_eq!(filter_data(&data, &filters).len(), data.len());
    }

    #[test]
    fn test_source_is_not_mutated() {
        let data = sales();
        let _ = filter_data(&data, &FilterSet::new().with("Brand", &["B"]));

        assert_eq!(data.len(), 4);
    }

    #[test]
    fn test_mat_filter_subset() {
        let data = sales();
        let period = MatPeriod::ending_at(YearMonth(2023, 6));
        let filtered = filter_by_mat(&data, &period.months);

        assert_eq!(filtered.len(), 3);
        assert!(filtered.len() <= data.len());
    }

    #[test]
    fn test_mat_filter_shrinking_window_is_monotonic() {
        let data = sales();
        let period = MatPeriod::ending_at(YearMonth(2023, 6));

        let mut previous = data.len();
        for keep in (0..=period.months.len()).rev().filter(|k| *k > 0) {
            let count = filter_by_mat(&data, &period.months[..keep]).len();
            assert!(count <= previous);
            previous = count;
        }
        assert_eq!(filter_by_mat(&data, &period.months[..1]).len(), 0);
    }

    #[test]
    fn test_mat_filter_without_time_columns() {
        let data = Dataset::new(vec![Column::new(
            "Brand",
            ColumnData::Text(vec!["A".into()]),
        )])
        .unwrap();

        assert_eq!(filter_by_mat(&data, &[YearMonth(2023, 1)]), data);
    }

    #[test]
    fn test_empty_window_is_identity() {
        let data = sales();
        assert_eq!(filter_by_mat(&data, &[]), data);
    }
}
