// ============================================================
// GEO INFRASTRUCTURE LAYER
// ============================================================
// Boundary loading (GeoJSON, shapefile), reprojection and map payload serialization

mod boundary_loader;
mod geojson_writer;
mod reproject;
mod shapefile_reader;

pub use boundary_loader::BoundaryLoader;
pub use geojson_writer::{build_map_payload, MapPayload};
pub use reproject::Reprojector;
