// ============================================================
// SHAPEFILE READER
// ============================================================
// `.shp` geometries with their `.dbf` attributes, CRS from the `.prj`

use chrono::NaiveDate;
use geo::Geometry;
use once_cell::sync::Lazy;
use regex::Regex;
use shapefile::dbase::FieldValue;
use shapefile::{Reader, Shape};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::boundary_loader::{text_attribute, SourceFeature};
use crate::domain::boundary::{Attribute, WGS84_EPSG};
use crate::domain::error::AppError;

/// EPSG code EPSG:3857, spherical Web Mercator
const WEB_MERCATOR_EPSG: u32 = 3857;

/// `AUTHORITY["EPSG","4326"]` (WKT1) or `ID["EPSG",4326]` (WKT2)
static WKT_AUTHORITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:AUTHORITY|ID)\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#)
        .expect("valid authority regex")
});

/// Features of a shapefile and the EPSG code of its `.prj` (WGS84 when absent).
///
/// dBase records carry no column order, so attributes are sorted by name.
pub(super) fn read(path: &Path) -> Result<(Vec<SourceFeature>, u32), AppError> {
    let unreadable = |e: shapefile::Error| {
        AppError::MissingBoundaryData(format!("Failed to read {}: {}", path.display(), e))
    };

    let mut reader = Reader::from_path(path).map_err(unreadable)?;

    let mut features = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(unreadable)?;

        let mut attributes: Vec<(String, Attribute)> = record
            .into_iter()
            .map(|(name, value)| (name, to_attribute(value)))
            .collect();
        attributes.sort_by(|a, b| a.0.cmp(&b.0));

        features.push(SourceFeature {
            geometry: to_geometry(shape)?,
            attributes,
        });
    }

    let source_epsg = read_projection(&path.with_extension("prj"))?;
    debug!(
        path = %path.display(),
        features = features.len(),
        source_epsg,
        "Read shapefile"
    );
    Ok((features, source_epsg))
}

fn to_geometry(shape: Shape) -> Result<Option<Geometry<f64>>, AppError> {
    if matches!(shape, Shape::NullShape) {
        return Ok(None);
    }
    Geometry::<f64>::try_from(shape)
        .map(Some)
        .map_err(|e| AppError::MissingBoundaryData(format!("Invalid geometry: {}", e)))
}

fn to_attribute(value: FieldValue) -> Attribute {
    match value {
        FieldValue::Character(Some(s)) => text_attribute(s.trim()),
        FieldValue::Numeric(Some(n)) | FieldValue::Double(n) | FieldValue::Currency(n) => {
            Attribute::Number(n)
        }
        FieldValue::Float(Some(f)) => Attribute::Number(f as f64),
        FieldValue::Integer(i) => Attribute::Number(i as f64),
        FieldValue::Logical(Some(b)) => Attribute::Bool(b),
        FieldValue::Date(Some(d)) => NaiveDate::from_ymd_opt(d.year() as i32, d.month(), d.day())
            .map_or(Attribute::Null, Attribute::Date),
        FieldValue::Memo(s) => Attribute::Text(s),
        FieldValue::Character(None)
        | FieldValue::Numeric(None)
        | FieldValue::Float(None)
        | FieldValue::Logical(None)
        | FieldValue::Date(None) => Attribute::Null,
        other => Attribute::Text(format!("{:?}", other)),
    }
}

/// EPSG code declared by a `.prj` file; a missing file means WGS84
fn read_projection(prj: &Path) -> Result<u32, AppError> {
    if !prj.exists() {
        debug!(path = %prj.display(), "No .prj next to shapefile, assuming WGS84");
        return Ok(WGS84_EPSG);
    }

    let wkt = fs::read_to_string(prj).map_err(|e| {
        AppError::MissingBoundaryData(format!("Failed to read {}: {}", prj.display(), e))
    })?;
    epsg_from_wkt(&wkt)
}

/// The outermost EPSG authority of a WKT definition.
///
/// ESRI `.prj` files often omit authorities; WGS84 and Web Mercator are
/// recognised by name.
pub(super) fn epsg_from_wkt(wkt: &str) -> Result<u32, AppError> {
    // the outermost authority closes the definition, so it is the last match
    if let Some(code) = WKT_AUTHORITY
        .captures_iter(wkt)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|code| code.as_str().parse::<u32>().ok())
    {
        return Ok(code);
    }

    let upper = wkt.trim().to_uppercase();
    if upper.contains("WEB_MERCATOR") || upper.contains("PSEUDO-MERCATOR") {
        return Ok(WEB_MERCATOR_EPSG);
    }
    if upper.starts_with("GEOGCS") && (upper.contains("WGS_1984") || upper.contains("WGS 84")) {
        return Ok(WGS84_EPSG);
    }

    Err(AppError::MissingBoundaryData(format!(
        "Unrecognised projection: {}",
        wkt.trim()
    )))
}
