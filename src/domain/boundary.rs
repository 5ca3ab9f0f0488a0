use chrono::{NaiveDate, NaiveDateTime};
use geo::Geometry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Join-key column shared by sales records and boundary polygons
pub const ADM_DIV: &str = "AdmDiv";

/// Attribute names checked, in order, for the division name
pub const NAME_COLUMN_CANDIDATES: [&str; 7] = [
    "ADM1_EN", "NAME_1", "DIVISION", "DIV_NAME", "name", "Name", "NAME",
];

/// EPSG code of WGS84 longitude/latitude
pub const WGS84_EPSG: u32 = 4326;

/// Typed polygon attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Attribute {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

/// One administrative division's shape, in WGS84
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPolygon {
    /// Trimmed, title-cased division name
    pub adm_div: String,
    pub geometry: Geometry<f64>,
    /// Remaining source attributes
    pub attributes: BTreeMap<String, Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySet {
    pub polygons: Vec<BoundaryPolygon>,
    /// EPSG code the source was declared in
    pub source_epsg: u32,
    /// Source attribute renamed to `AdmDiv`
    pub name_column: String,
}

impl BoundarySet {
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn division_names(&self) -> Vec<String> {
        self.polygons.iter().map(|p| p.adm_div.clone()).collect()
    }
}

/// Boundary data as seen by the rest of the system.
///
/// A missing or corrupt boundary file is not fatal: geographic features are
/// disabled and everything else keeps working.
#[derive(Debug, Clone)]
pub enum Boundaries {
    Available(Arc<BoundarySet>),
    Unavailable(String),
}

impl Boundaries {
    pub fn available(&self) -> Option<&BoundarySet> {
        match self {
            Boundaries::Available(set) => Some(set.as_ref()),
            Boundaries::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available().is_some()
    }
}
