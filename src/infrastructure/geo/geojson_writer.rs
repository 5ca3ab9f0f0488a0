use geo::{BoundingRect, Geometry};
use geojson::{feature::Id, Feature, FeatureCollection, JsonObject, JsonValue};
use serde::Serialize;

use crate::domain::boundary::{Attribute, BoundarySet, ADM_DIV};
use crate::domain::dashboard_config::ColorScale;
use crate::domain::sales::MapTable;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything the browser needs to draw the choropleth
#[derive(Debug, Clone, Serialize)]
pub struct MapPayload {
    pub geojson: FeatureCollection,
    pub value_column: String,
    pub color_scale: ColorScale,
    /// `[longitude, latitude]` of the boundary bounding box centre
    pub center: Option<[f64; 2]>,
    pub max_value: f64,
}

/// Join aggregated values onto boundary geometries as a FeatureCollection
pub fn build_map_payload(
    boundaries: &BoundarySet,
    table: &MapTable,
    color_scale: ColorScale,
) -> MapPayload {
    let features = table
        .rows
        .iter()
        .filter_map(|row| {
            let polygon = boundaries.polygons.get(row.boundary_index)?;

            let mut properties = JsonObject::new();
            for (key, attribute) in &polygon.attributes {
                properties.insert(key.clone(), attribute_to_json(attribute));
            }
            properties.insert(ADM_DIV.to_string(), JsonValue::from(row.adm_div.clone()));
            properties.insert("Value".to_string(), JsonValue::from(row.value));

            Some(Feature {
                bbox: None,
                geometry: to_geojson_geometry(&polygon.geometry),
                id: Some(Id::Number(row.boundary_index.into())),
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect();

    let max_value = table.rows.iter().map(|r| r.value).fold(0.0, f64::max);

    MapPayload {
        geojson: FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
        value_column: table.value_column.clone(),
        color_scale,
        center: center_of(boundaries),
        max_value,
    }
}

/// Empty collections stand for source features without geometry
fn to_geojson_geometry(geometry: &Geometry<f64>) -> Option<geojson::Geometry> {
    match geometry {
        Geometry::GeometryCollection(collection) if collection.0.is_empty() => None,
        other => Some(geojson::Geometry::new(geojson::Value::from(other))),
    }
}

/// Temporal attributes are written as `%Y-%m-%d %H:%M:%S` strings
fn attribute_to_json(attribute: &Attribute) -> JsonValue {
    match attribute {
        Attribute::Null => JsonValue::Null,
        Attribute::Bool(b) => JsonValue::from(*b),
        Attribute::Number(n) => JsonValue::from(*n),
        Attribute::Text(s) => JsonValue::from(s.clone()),
        Attribute::Date(d) => match d.and_hms_opt(0, 0, 0) {
            Some(dt) => JsonValue::from(dt.format(DATETIME_FORMAT).to_string()),
            None => JsonValue::from(d.to_string()),
        },
        Attribute::DateTime(dt) => JsonValue::from(dt.format(DATETIME_FORMAT).to_string()),
    }
}

fn center_of(boundaries: &BoundarySet) -> Option<[f64; 2]> {
    let (min, max) = boundaries
        .polygons
        .iter()
        .filter_map(|p| p.geometry.bounding_rect())
        .fold(None, |acc: Option<(geo::Coord, geo::Coord)>, rect| {
            let (lo, hi) = (rect.min(), rect.max());
            Some(match acc {
                None => (lo, hi),
                Some((min, max)) => (
                    geo::Coord {
                        x: min.x.min(lo.x),
                        y: min.y.min(lo.y),
                    },
                    geo::Coord {
                        x: max.x.max(hi.x),
                        y: max.y.max(hi.y),
                    },
                ),
            })
        })?;

    Some([(min.x + max.x) / 2.0, (min.y + max.y) / 2.0])
}
