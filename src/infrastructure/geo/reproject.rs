use geo::{Coord, Geometry, MapCoords};
use proj4rs::proj::Proj;
use std::f64::consts::FRAC_PI_2;

use crate::domain::boundary::WGS84_EPSG;
use crate::domain::error::AppError;

const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Sphere radius used by Web Mercator
const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

/// EPSG codes that denote spherical Web Mercator
const WEB_MERCATOR_CODES: [u32; 4] = [3857, 3785, 900913, 102100];

enum Method {
    Identity,
    WebMercator,
    Proj {
        from: Proj,
        to: Proj,
        source_is_geographic: bool,
    },
}

/// Converts coordinates from a source EPSG reference system to WGS84 degrees
pub struct Reprojector {
    source_epsg: u32,
    method: Method,
}

impl Reprojector {
    pub fn to_wgs84(source_epsg: u32) -> Result<Self, AppError> {
        let method = if source_epsg == WGS84_EPSG {
            Method::Identity
        } else if WEB_MERCATOR_CODES.contains(&source_epsg) {
            Method::WebMercator
        } else {
            Self::proj_method(source_epsg)?
        };

        Ok(Self {
            source_epsg,
            method,
        })
    }

    fn proj_method(source_epsg: u32) -> Result<Method, AppError> {
        let unsupported =
            || AppError::MissingBoundaryData(format!("Unsupported CRS EPSG:{}", source_epsg));

        let code = u16::try_from(source_epsg).map_err(|_| unsupported())?;
        let definition = crs_definitions::from_code(code).ok_or_else(unsupported)?;

        let from = Proj::from_proj_string(definition.proj4).map_err(|e| {
            AppError::MissingBoundaryData(format!(
                "Invalid projection for EPSG:{}: {:?}",
                source_epsg, e
            ))
        })?;
        let to = Proj::from_proj_string(WGS84_PROJ4)
            .map_err(|e| AppError::Internal(format!("Invalid WGS84 projection: {:?}", e)))?;

        let source_is_geographic = definition.proj4.contains("+proj=longlat")
            || definition.proj4.contains("+proj=latlong");

        Ok(Method::Proj {
            from,
            to,
            source_is_geographic,
        })
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.method, Method::Identity)
    }

    /// Transform one coordinate; geographic input and output are in degrees
    pub fn transform(&self, coord: Coord<f64>) -> Result<Coord<f64>, AppError> {
        match &self.method {
            Method::Identity => Ok(coord),
            Method::WebMercator => Ok(Coord {
                x: (coord.x / WEB_MERCATOR_RADIUS).to_degrees(),
                y: (2.0 * (coord.y / WEB_MERCATOR_RADIUS).exp().atan() - FRAC_PI_2).to_degrees(),
            }),
            Method::Proj {
                from,
                to,
                source_is_geographic,
            } => {
                let mut point = if *source_is_geographic {
                    (coord.x.to_radians(), coord.y.to_radians(), 0.0)
                } else {
                    (coord.x, coord.y, 0.0)
                };

                proj4rs::transform::transform(from, to, &mut point).map_err(|e| {
                    AppError::MissingBoundaryData(format!(
                        "Failed to reproject ({}, {}) from EPSG:{}: {:?}",
                        coord.x, coord.y, self.source_epsg, e
                    ))
                })?;

                Ok(Coord {
                    x: point.0.to_degrees(),
                    y: point.1.to_degrees(),
                })
            }
        }
    }

    pub fn reproject(&self, geometry: &mut Geometry<f64>) -> Result<(), AppError> {
        if self.is_identity() {
            return Ok(());
        }
        *geometry = geometry.try_map_coords(|coord| self.transform(coord))?;
        Ok(())
    }
}
