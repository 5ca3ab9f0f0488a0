// ============================================================
// BOUNDARY LOADER
// ============================================================
// Read division polygons from GeoJSON or an ESRI shapefile, resolve
// the name column and reproject to WGS84

use chrono::{NaiveDate, NaiveDateTime};
use geo::{Geometry, GeometryCollection};
use geojson::{GeoJson, JsonObject, JsonValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::reproject::Reprojector;
use super::shapefile_reader;
use crate::domain::boundary::{
    Attribute, Boundaries, BoundaryPolygon, BoundarySet, ADM_DIV, NAME_COLUMN_CANDIDATES,
    WGS84_EPSG,
};
use crate::domain::error::AppError;
use crate::domain::sales::UNKNOWN;
use crate::shared::text::normalize_division_name;

static EPSG_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)EPSG:(?:[^:]*:)?(\d+)$").expect("valid EPSG regex"));

/// One input feature before name resolution and reprojection
#[derive(Debug, Clone)]
pub(super) struct SourceFeature {
    pub geometry: Option<Geometry<f64>>,
    /// Attributes in source column order
    pub attributes: Vec<(String, Attribute)>,
}

/// Loads a boundary dataset from disk
pub struct BoundaryLoader {
    path: PathBuf,
}

impl BoundaryLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the dataset, turning every failure into `Boundaries::Unavailable`
    pub fn load(&self) -> Boundaries {
        match self.try_load() {
            Ok(set) => {
                info!(
                    path = %self.path.display(),
                    polygons = set.len(),
                    source_epsg = set.source_epsg,
                    name_column = %set.name_column,
                    "Loaded boundary dataset"
                );
                Boundaries::Available(Arc::new(set))
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Boundary data unavailable");
                Boundaries::Unavailable(err.to_string())
            }
        }
    }

    /// `.shp` paths are read as shapefiles, anything else as GeoJSON
    pub fn try_load(&self) -> Result<BoundarySet, AppError> {
        if !self.path.exists() {
            return Err(AppError::MissingBoundaryData(format!(
                "Shapefile not found at: {}",
                self.path.display()
            )));
        }

        if is_shapefile(&self.path) {
            let (features, source_epsg) = shapefile_reader::read(&self.path)?;
            return Self::build(features, source_epsg);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            AppError::MissingBoundaryData(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Self::parse(&content)
    }

    /// Parse GeoJSON text into a normalized boundary set
    pub fn parse(content: &str) -> Result<BoundarySet, AppError> {
        let geojson: GeoJson = content
            .parse()
            .map_err(|e| AppError::MissingBoundaryData(format!("Invalid GeoJSON: {}", e)))?;

        let (features, foreign_members) = match geojson {
            GeoJson::FeatureCollection(collection) => {
                (collection.features, collection.foreign_members)
            }
            GeoJson::Feature(feature) => {
                let foreign = feature.foreign_members.clone();
                (vec![feature], foreign)
            }
            GeoJson::Geometry(_) => {
                return Err(AppError::MissingBoundaryData(
                    "GeoJSON has no features".to_string(),
                ))
            }
        };

        let source_epsg = Self::detect_epsg(foreign_members.as_ref())?;

        let features = features
            .into_iter()
            .map(|feature| -> Result<SourceFeature, AppError> {
                let geometry = feature
                    .geometry
                    .map(Geometry::<f64>::try_from)
                    .transpose()
                    .map_err(|e| {
                        AppError::MissingBoundaryData(format!("Invalid geometry: {}", e))
                    })?;
                let attributes = feature
                    .properties
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(key, value)| (key, to_attribute(&value)))
                    .collect();
                Ok(SourceFeature {
                    geometry,
                    attributes,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::build(features, source_epsg)
    }

    /// Resolve the name column, reproject and type every feature.
    ///
    /// Features without geometry are kept with an empty geometry so the
    /// polygon count matches the source.
    fn build(features: Vec<SourceFeature>, source_epsg: u32) -> Result<BoundarySet, AppError> {
        if features.is_empty() {
            return Err(AppError::MissingBoundaryData(
                "Boundary file has no features".to_string(),
            ));
        }
        if features.iter().all(|f| f.geometry.is_none()) {
            return Err(AppError::MissingBoundaryData(
                "Boundary file has no features with geometry".to_string(),
            ));
        }

        let reprojector = Reprojector::to_wgs84(source_epsg)?;

        let columns = Self::attribute_columns(&features);
        let name_column = Self::resolve_name_column(&columns).ok_or_else(|| {
            AppError::MissingBoundaryData(
                "No attribute column usable as division name".to_string(),
            )
        })?;

        let mut polygons = Vec::with_capacity(features.len());
        for (idx, feature) in features.into_iter().enumerate() {
            if feature.geometry.is_none() {
                debug!(feature = idx, "Feature has no geometry, keeping it empty");
            }
            polygons.push(Self::to_polygon(feature, &name_column, &reprojector)?);
        }

        Ok(BoundarySet {
            polygons,
            source_epsg,
            name_column,
        })
    }

    /// EPSG code from the legacy `crs` member; absent means WGS84
    fn detect_epsg(foreign_members: Option<&JsonObject>) -> Result<u32, AppError> {
        let Some(crs) = foreign_members.and_then(|m| m.get("crs")) else {
            return Ok(WGS84_EPSG);
        };

        let name = crs
            .get("properties")
            .and_then(|p| p.get("name"))
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                AppError::MissingBoundaryData("Unrecognised crs member".to_string())
            })?;

        if name.to_uppercase().ends_with("CRS84") {
            return Ok(WGS84_EPSG);
        }

        EPSG_CODE
            .captures(name.trim())
            .and_then(|caps| caps.get(1))
            .and_then(|code| code.as_str().parse::<u32>().ok())
            .ok_or_else(|| AppError::MissingBoundaryData(format!("Unrecognised CRS name: {}", name)))
    }

    /// Attribute names in first-appearance order
    fn attribute_columns(features: &[SourceFeature]) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for (key, _) in features.iter().flat_map(|f| f.attributes.iter()) {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
        columns
    }

    /// First known name candidate present, else the first non-geometry column
    fn resolve_name_column(columns: &[String]) -> Option<String> {
        NAME_COLUMN_CANDIDATES
            .iter()
            .find(|candidate| columns.iter().any(|c| c == *candidate))
            .map(|candidate| candidate.to_string())
            .or_else(|| columns.iter().find(|c| c.as_str() != "geometry").cloned())
    }

    fn to_polygon(
        feature: SourceFeature,
        name_column: &str,
        reprojector: &Reprojector,
    ) -> Result<BoundaryPolygon, AppError> {
        let mut geometry = feature
            .geometry
            .unwrap_or_else(|| Geometry::GeometryCollection(GeometryCollection(Vec::new())));
        reprojector.reproject(&mut geometry)?;

        let adm_div = feature
            .attributes
            .iter()
            .find(|(key, _)| key == name_column)
            .and_then(|(_, value)| attribute_text(value))
            .map(|name| normalize_division_name(&name))
            .unwrap_or_else(|| UNKNOWN.to_string());

        let attributes: BTreeMap<String, Attribute> = feature
            .attributes
            .into_iter()
            .filter(|(key, _)| key.as_str() != name_column && key.as_str() != ADM_DIV)
            .collect();

        Ok(BoundaryPolygon {
            adm_div,
            geometry,
            attributes,
        })
    }
}

fn is_shapefile(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("shp"))
}

/// Division name text of a name-column cell
fn attribute_text(value: &Attribute) -> Option<String> {
    match value {
        Attribute::Text(s) => Some(s.clone()),
        Attribute::Number(n) => Some(n.to_string()),
        Attribute::Date(d) => Some(d.to_string()),
        Attribute::DateTime(dt) => Some(dt.to_string()),
        Attribute::Null | Attribute::Bool(_) => None,
    }
}

fn to_attribute(value: &JsonValue) -> Attribute {
    match value {
        JsonValue::Null => Attribute::Null,
        JsonValue::Bool(b) => Attribute::Bool(*b),
        JsonValue::Number(n) => n
            .as_f64()
            .map(Attribute::Number)
            .unwrap_or_else(|| Attribute::Text(n.to_string())),
        JsonValue::String(s) => text_attribute(s),
        other => Attribute::Text(other.to_string()),
    }
}

/// Date, datetime, or plain text
pub(super) fn text_attribute(value: &str) -> Attribute {
    parse_temporal(value).unwrap_or_else(|| Attribute::Text(value.to_string()))
}

fn parse_temporal(value: &str) -> Option<Attribute> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(Attribute::Date(date));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(Attribute::DateTime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DIVISIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"ADM1_PCODE": "BD30", "ADM1_EN": "  dhaka ", "date": "2020-11-13"},
                "geometry": {"type": "Polygon", "coordinates": [[[90.0, 23.5], [90.8, 23.5], [90.8, 24.2], [90.0, 23.5]]]}
            },
            {
                "type": "Feature",
                "properties": {"ADM1_PCODE": "BD40", "ADM1_EN": "KHULNA"},
                "geometry": {"type": "Polygon", "coordinates": [[[89.0, 22.0], [89.8, 22.0], [89.8, 23.0], [89.0, 22.0]]]}
            }
        ]
    }"#;

    #[test]
    fn test_parse_normalizes_division_names() {
        let set = BoundaryLoader::parse(DIVISIONS).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.name_column, "ADM1_EN");
        assert_eq!(set.source_epsg, WGS84_EPSG);
        assert_eq!(set.division_names(), vec!["Dhaka", "Khulna"]);
        assert!(matches!(
            set.polygons[0].attributes["date"],
            Attribute::Date(_) | Attribute::DateTime(_)
        ));
        assert!(!set.polygons[0].attributes.contains_key("ADM1_EN"));
    }

    #[test]
    fn test_name_column_falls_back_to_first_attribute() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"region_label": "sylhet", "code": 7},
                "geometry": {"type": "Point", "coordinates": [91.8, 24.9]}
            }]
        }"#;
        let set = BoundaryLoader::parse(content).unwrap();

        assert_eq!(set.name_column, "region_label");
        assert_eq!(set.polygons[0].adm_div, "Sylhet");
    }

    #[test]
    fn test_web_mercator_source_is_reprojected() {
        let content = r#"{
            "type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3857"}},
            "features": [{
                "type": "Feature",
                "properties": {"NAME_1": "Dhaka"},
                "geometry": {"type": "Point", "coordinates": [10064673.5, 2730309.3]}
            }]
        }"#;
        let set = BoundaryLoader::parse(content).unwrap();

        assert_eq!(set.source_epsg, 3857);
        let geo::Geometry::Point(p) = &set.polygons[0].geometry else {
            panic!("expected point");
        };
        assert!((p.x() - 90.4125).abs() < 0.01);
        assert!((p.y() - 23.8103).abs() < 0.01);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let loader = BoundaryLoader::new("does/not/exist/adm01.geojson");
        assert!(!loader.load().is_available());
    }

    #[test]
    fn test_corrupt_file_is_unavailable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not geojson").unwrap();

        let boundaries = BoundaryLoader::new(file.path()).load();
        assert!(matches!(boundaries, Boundaries::Unavailable(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DIVISIONS.as_bytes()).unwrap();

        let boundaries = BoundaryLoader::new(file.path()).load();
        assert_eq!(boundaries.available().map(|b| b.len()), Some(2));
    }

    #[test]
    fn test_feature_without_attributes_is_rejected() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": null,
                "geometry": {"type": "Point", "coordinates": [91.8, 24.9]}
            }]
        }"#;
        assert!(matches!(
            BoundaryLoader::parse(content),
            Err(AppError::MissingBoundaryData(_))
        ));
    }

    #[test]
    fn test_features_without_geometry_are_kept() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"ADM1_EN": "Dhaka"},
                    "geometry": {"type": "Point", "coordinates": [90.4, 23.8]}
                },
                {
                    "type": "Feature",
                    "properties": {"ADM1_EN": "Sylhet"},
                    "geometry": null
                }
            ]
        }"#;
        let set = BoundaryLoader::parse(content).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.division_names(), vec!["Dhaka", "Sylhet"]);
        assert_eq!(
            set.polygons[1].geometry,
            geo::Geometry::GeometryCollection(geo::GeometryCollection(Vec::new()))
        );
    }

    #[test]
    fn test_all_null_geometries_are_rejected() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "properties": {"ADM1_EN": "Dhaka"}, "geometry": null}]
        }"#;
        assert!(matches!(
            BoundaryLoader::parse(content),
            Err(AppError::MissingBoundaryData(_))
        ));
    }

    #[test]
    fn test_load_shapefile_from_disk() {
        use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
        use shapefile::{Point, Polygon, PolygonRing};

        let dir = tempfile::tempdir().unwrap();
        let shp = dir.path().join("adm01.shp");

        let table = TableWriterBuilder::new()
            .add_character_field(FieldName::try_from("ADM1_PCODE").unwrap(), 10)
            .add_character_field(FieldName::try_from("ADM1_EN").unwrap(), 50);
        let mut writer = shapefile::Writer::from_path(&shp, table).unwrap();

        for (code, name, x) in [("BD30", " dhaka ", 90.0), ("BD40", "KHULNA", 89.0)] {
            let ring = PolygonRing::Outer(vec![
                Point::new(x, 23.0),
                Point::new(x, 24.0),
                Point::new(x + 1.0, 24.0),
                Point::new(x + 1.0, 23.0),
                Point::new(x, 23.0),
            ]);
            let mut record = Record::default();
            record.insert("ADM1_PCODE".to_string(), FieldValue::Character(Some(code.to_string())));
            record.insert("ADM1_EN".to_string(), FieldValue::Character(Some(name.to_string())));
            writer.write_shape_and_record(&Polygon::new(ring), &record).unwrap();
        }
        drop(writer);

        std::fs::write(
            dir.path().join("adm01.prj"),
            r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],AUTHORITY["EPSG","4326"]]"#,
        )
        .unwrap();

        let boundaries = BoundaryLoader::new(&shp).load();
        let set = boundaries.available().unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.name_column, "ADM1_EN");
        assert_eq!(set.source_epsg, WGS84_EPSG);
        assert_eq!(set.division_names(), vec!["Dhaka", "Khulna"]);
        assert_eq!(
            set.polygons[0].attributes["ADM1_PCODE"],
            Attribute::Text("BD30".to_string())
        );
        assert!(matches!(set.polygons[0].geometry, geo::Geometry::MultiPolygon(_) | geo::Geometry::Polygon(_)));
    }

    #[test]
    fn test_missing_shapefile_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let boundaries = BoundaryLoader::new(dir.path().join("adm01.shp")).load();

        let Boundaries::Unavailable(reason) = boundaries else {
            panic!("expected unavailable boundaries");
        };
        assert!(reason.starts_with("Shapefile not found at:"));
    }
}
