// ============================================================
// AGGREGATION USE CASE
// ============================================================
// Group-and-reduce views for the map, charts and summary tables.
// Every entry point degrades to an empty result when a referenced
// column is absent or the value column is not numeric.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::domain::boundary::Boundaries;
use crate::domain::error::{AppError, Result};
use crate::domain::sales::{
    month_from_name, parse_number, AggregateRow, AggregateTable, AggregationKind, Dataset, KeyMetrics,
    KnownField, MapRow, MapTable, MeasureTotal, SummaryRow, SummaryTable, UNKNOWN,
};
use crate::shared::text::normalize_division_name;

/// Running sum and count of one group
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    fn reduce(&self, kind: AggregationKind) -> f64 {
        match kind {
            AggregationKind::Sum => self.sum,
            AggregationKind::Mean => self.mean(),
        }
    }
}

/// Sum/count of `value` per distinct tuple of `keys`, ordered by key text
fn group_by(dataset: &Dataset, keys: &[&str], value: &str) -> Result<BTreeMap<Vec<String>, Accumulator>> {
    dataset.require(keys)?;
    let values = dataset.require_numeric(value)?;
    let key_data: Vec<_> = keys.iter().filter_map(|k| dataset.column(k)).collect();

    let mut groups: BTreeMap<Vec<String>, Accumulator> = BTreeMap::new();
    for row in 0..dataset.len() {
        let key = key_data.iter().map(|d| d.text(row).into_owned()).collect();
        groups
            .entry(key)
            .or_default()
            .add(values.number(row).unwrap_or(0.0));
    }
    Ok(groups)
}

/// Empty result for schema mismatches; other errors are not expected here
fn or_empty<T: Default>(result: Result<T>, operation: &str) -> T {
    match result {
        Ok(value) => value,
        Err(AppError::MissingColumn(column)) => {
            debug!(operation, column = %column, "Column absent, returning empty result");
            T::default()
        }
        Err(e) => {
            debug!(operation, error = %e, "Returning empty result");
            T::default()
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Sum `value` per division and attach it to every boundary polygon.
///
/// One row per polygon in boundary order; divisions without sales get 0.
pub fn aggregate_for_map(
    dataset: &Dataset,
    boundaries: &Boundaries,
    group: &str,
    value: &str,
) -> MapTable {
    let Some(set) = boundaries.available() else {
        debug!("Boundaries unavailable, no map aggregation");
        return MapTable::default();
    };
    if dataset.is_empty() {
        return MapTable::default();
    }

    let result = group_by(dataset, &[group], value).map(|groups| {
        let mut totals: HashMap<String, f64> = HashMap::new();
        for (key, acc) in groups {
            *totals.entry(normalize_division_name(&key[0])).or_default() += acc.sum;
        }

        let rows = set
            .polygons
            .iter()
            .enumerate()
            .map(|(idx, polygon)| {
                let name = normalize_division_name(&polygon.adm_div);
                MapRow {
                    boundary_index: idx,
                    value: totals.get(&name).copied().unwrap_or(0.0),
                    adm_div: name,
                }
            })
            .collect();

        MapTable {
            value_column: value.to_string(),
            rows,
        }
    });

    or_empty(result, "aggregate_for_map")
}

/// Calendar position of a `MonthName` value, unknown names last
fn month_order(name: &str) -> i64 {
    month_from_name(name).unwrap_or(i64::MAX)
}

/// Numeric keys ascending by value, then the rest in text order
fn time_order(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Reduce `value` over `[time] + groups`, ascending by time
pub fn aggregate_for_trend(
    dataset: &Dataset,
    time: &str,
    value: &str,
    groups: &[String],
    kind: AggregationKind,
) -> AggregateTable {
    let mut keys = vec![time];
    keys.extend(groups.iter().map(String::as_str).filter(|g| *g != time));

    let result = group_by(dataset, &keys, value).map(|grouped| {
        let mut rows: Vec<AggregateRow> = grouped
            .into_iter()
            .map(|(group_keys, acc)| AggregateRow {
                keys: group_keys,
                value: acc.reduce(kind),
            })
            .collect();

        if time == KnownField::MonthName.column_name() {
            rows.sort_by_key(|row| month_order(&row.keys[0]));
        } else {
            rows.sort_by(|a, b| time_order(&a.keys[0], &b.keys[0]));
        }

        AggregateTable {
            key_columns: keys.iter().map(|k| k.to_string()).collect(),
            value_column: value.to_string(),
            rows,
        }
    });

    or_empty(result, "aggregate_for_trend")
}

/// Sum `value` per `category`, largest first
pub fn aggregate_for_bar(dataset: &Dataset, category: &str, value: &str) -> AggregateTable {
    let result = group_by(dataset, &[category], value).map(|grouped| {
        let mut rows: Vec<AggregateRow> = grouped
            .into_iter()
            .map(|(keys, acc)| AggregateRow {
                keys,
                value: acc.sum,
            })
            .collect();
        rows.sort_by(|a, b| descending(a.value, b.value));

        AggregateTable {
            key_columns: vec![category.to_string()],
            value_column: value.to_string(),
            rows,
        }
    });

    or_empty(result, "aggregate_for_bar")
}

/// Total, mean and count of `value` per `category`, rounded to 2 decimals, largest total first
pub fn summarize_by(dataset: &Dataset, category: &str, value: &str) -> SummaryTable {
    let result = group_by(dataset, &[category], value).map(|grouped| {
        let mut rows: Vec<SummaryRow> = grouped
            .into_iter()
            .map(|(mut keys, acc)| SummaryRow {
                key: keys.remove(0),
                total: round2(acc.sum),
                mean: round2(acc.mean()),
                count: acc.count,
            })
            .collect();
        rows.sort_by(|a, b| descending(a.total, b.total));

        SummaryTable {
            column: category.to_string(),
            value_column: value.to_string(),
            rows,
        }
    });

    or_empty(result, "summarize_by")
}

/// Totals of every present measure plus the record count
pub fn key_metrics(dataset: &Dataset) -> KeyMetrics {
    let totals = dataset
        .schema()
        .measures()
        .into_iter()
        .filter_map(|field| {
            let name = field.column_name();
            let data = dataset.column(name)?;
            let total = (0..dataset.len()).filter_map(|row| data.number(row)).sum();
            Some(MeasureTotal {
                column: name.to_string(),
                total,
            })
        })
        .collect();

    KeyMetrics {
        totals,
        record_count: dataset.len(),
    }
}

/// Sorted distinct values of `column`, without placeholders
pub fn unique_values(dataset: &Dataset, column: &str) -> Vec<String> {
    let Some(data) = dataset.column(column) else {
        return Vec::new();
    };

    let mut values: Vec<String> = (0..dataset.len())
        .map(|row| data.text(row))
        .filter(|v| v != UNKNOWN && v != "nan" && !v.is_empty())
        .map(|v| v.into_owned())
        .collect();
    values.sort();
    values.dedup();
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::boundary::{BoundaryPolygon, BoundarySet};
    use crate::domain::sales::{Column, ColumnData};
    use geo::{Geometry, Point};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn text(values: &[&str]) -> ColumnData {
        ColumnData::Text(values.iter().map(|v| v.to_string()).collect())
    }

    fn sales() -> Dataset {
        Dataset::new(vec![
            Column::new("AdmDiv", text(&["Dhaka", "Dhaka", "Khulna", "Unknown"])),
            Column::new("Brand", text(&["A", "B", "A", "C"])),
            Column::new("MonthName", text(&["March", "January", "January", "Unknown"])),
            Column::new("Year", text(&["2023", "2023", "2022", "2022"])),
            Column::new("Amount_(BDT)", ColumnData::Measure(vec![100.0, 50.0, 30.0, 5.0])),
            Column::new("Qty_(Pcs)", ColumnData::Measure(vec![1.0, 2.0, 3.0, 4.0])),
        ])
        .unwrap()
    }

    fn boundaries(names: &[&str]) -> Boundaries {
        let polygons = names
            .iter()
            .map(|name| BoundaryPolygon {
                adm_div: name.to_string(),
                geometry: Geometry::Point(Point::new(90.0, 23.0)),
                attributes: BTreeMap::new(),
            })
            .collect();

        Boundaries::Available(Arc::new(BoundarySet {
            polygons,
            source_epsg: 4326,
            name_column: "ADM1_EN".to_string(),
        }))
    }

    #[test]
    fn test_map_has_one_row_per_polygon() {
        let table = aggregate_for_map(
            &sales(),
            &boundaries(&["Dhaka", "Khulna", "Sylhet"]),
            "AdmDiv",
            "Amount_(BDT)",
        );

        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0].value, 150.0);
        assert_eq!(table.rows[1].value, 30.0);
        assert_eq!(table.rows[2].value, 0.0);
        assert_eq!(table.rows[2].adm_div, "Sylhet");
    }

    #[test]
    fn test_map_join_normalizes_names() {
        let data = Dataset::new(vec![
            Column::new("AdmDiv", text(&["  dhaka "])),
            Column::new("Amount_(BDT)", ColumnData::Measure(vec![100.0])),
        ])
        .unwrap();

        let table = aggregate_for_map(&data, &boundaries(&["DHAKA"]), "AdmDiv", "Amount_(BDT)");
        assert_eq!(table.rows[0].value, 100.0);
        assert_eq!(table.rows[0].adm_div, "Dhaka");
    }

    #[test]
    fn test_map_degrades_to_empty() {
        let set = boundaries(&["Dhaka"]);

        assert!(aggregate_for_map(&sales(), &set, "Division", "Amount_(BDT)").is_empty());
        assert!(aggregate_for_map(&sales(), &set, "AdmDiv", "Brand").is_empty());
        assert!(aggregate_for_map(&Dataset::empty(), &set, "AdmDiv", "Amount_(BDT)").is_empty());
        assert!(aggregate_for_map(
            &sales(),
            &Boundaries::Unavailable("missing".into()),
            "AdmDiv",
            "Amount_(BDT)"
        )
        .is_empty());
    }

    #[test]
    fn test_trend_orders_month_names_by_calendar() {
        let table = aggregate_for_trend(
            &sales(),
            "MonthName",
            "Amount_(BDT)",
            &[],
            AggregationKind::Sum,
        );

        let months: Vec<_> = table.rows.iter().map(|r| r.keys[0].as_str()).collect();
        assert_eq!(months, vec!["January", "March", "Unknown"]);
        assert_eq!(table.value_of(&["January"]), Some(80.0));
    }

    #[test]
    fn test_trend_orders_numeric_months_by_value() {
        let data = Dataset::new(vec![
            Column::new("Month", ColumnData::Integer(vec![Some(2), Some(10), Some(1), None])),
            Column::new("Amount_(BDT)", ColumnData::Measure(vec![20.0, 100.0, 10.0, 1.0])),
        ])
        .unwrap();

        let table = aggregate_for_trend(&data, "Month", "Amount_(BDT)", &[], AggregationKind::Sum);

        let months: Vec<_> = table.rows.iter().map(|r| r.keys[0].as_str()).collect();
        assert_eq!(&months[..3], &["1", "2", "10"]);
        assert_eq!(months.len(), 4);
        assert_eq!(table.value_of(&["10"]), Some(100.0));
    }

    #[test]
    fn test_trend_with_groups_and_mean() {
        let table = aggregate_for_trend(
            &sales(),
            "Year",
            "Amount_(BDT)",
            &["Brand".to_string()],
            AggregationKind::Mean,
        );

        assert_eq!(table.key_columns, vec!["Year", "Brand"]);
        assert_eq!(table.rows[0].keys, vec!["2022", "A"]);
        assert_eq!(table.value_of(&["2023", "B"]), Some(50.0));

        let by_year = aggregate_for_trend(&sales(), "Year", "Qty_(Pcs)", &[], AggregationKind::Mean);
        assert_eq!(by_year.value_of(&["2022"]), Some(3.5));
    }

    #[test]
    fn test_bar_is_descending() {
        let table = aggregate_for_bar(&sales(), "Brand", "Amount_(BDT)");

        let values: Vec<_> = table.rows.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![130.0, 50.0, 5.0]);
        assert_eq!(table.rows[0].keys, vec!["A"]);
    }

    #[test]
    fn test_missing_columns_give_empty_tables() {
        assert!(aggregate_for_bar(&sales(), "DivName", "Amount_(BDT)").is_empty());
        assert!(aggregate_for_trend(&sales(), "YearMonth", "Amount_(BDT)", &[], AggregationKind::Sum).is_empty());
        assert!(summarize_by(&sales(), "Brand", "Qty_(KG)").rows.is_empty());
    }

    #[test]
    fn test_summary_statistics() {
        let summary = summarize_by(&sales(), "AdmDiv", "Amount_(BDT)");

        assert_eq!(summary.rows[0].key, "Dhaka");
        assert_eq!(summary.rows[0].total, 150.0);
        assert_eq!(summary.rows[0].mean, 75.0);
        assert_eq!(summary.rows[0].count, 2);
        assert_eq!(summary.rows.len(), 3);
    }

    #[test]
    fn test_key_metrics() {
        let metrics = key_metrics(&sales());

        assert_eq!(metrics.record_count, 4);
        assert_eq!(metrics.total("Amount_(BDT)"), Some(185.0));
        assert_eq!(metrics.total("Qty_(Pcs)"), Some(10.0));
        assert_eq!(metrics.total("Qty_(KG)"), None);
    }

    #[test]
    fn test_unique_values_skip_placeholders() {
        assert_eq!(unique_values(&sales(), "AdmDiv"), vec!["Dhaka", "Khulna"]);
        assert_eq!(unique_values(&sales(), "Year"), vec!["2022", "2023"]);
        assert!(unique_values(&sales(), "FY").is_empty());
    }
}
