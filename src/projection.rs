//! Planar projections used for area computation.
//!
//! Two strategies:
//! - **Flat**: equirectangular scaling around the polygon's mean latitude.
//!   Cheap and accurate for small parcels.
//! - **UTM**: transverse Mercator on the WGS84 ellipsoid for the zone that
//!   contains the polygon centroid. Used for larger extents.
//!
//! Zones are the plain 6° bands; the Norway/Svalbard exceptions are not
//! applied. Longitudes are not unwrapped at the antimeridian.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};
use crate::GpsPoint;

/// Meters per degree used by the flat projection.
pub const FLAT_METERS_PER_DEGREE: f64 = 111_000.0;

// WGS84 ellipsoid
const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;

// UTM parameters
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;
const UTM_MIN_LAT: f64 = -80.0;
const UTM_MAX_LAT: f64 = 84.0;

/// Project points onto a local plane in meters:
/// `x = lng * 111000 * cos(mean_lat)`, `y = lat * 111000`.
pub fn flat_project(points: &[GpsPoint], mean_latitude: f64) -> Vec<Coord<f64>> {
    let lng_scale = FLAT_METERS_PER_DEGREE * mean_latitude.to_radians().cos();
    points
        .iter()
        .map(|p| Coord {
            x: p.longitude * lng_scale,
            y: p.latitude * FLAT_METERS_PER_DEGREE,
        })
        .collect()
}

/// A UTM zone: number 1-60 plus hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmZone {
    pub number: u8,
    pub north: bool,
}

impl UtmZone {
    /// Zone containing `point`. Fails outside the UTM latitude band.
    pub fn for_point(point: &GpsPoint) -> Result<Self> {
        if !point.is_valid() {
            return Err(SurveyError::ProjectionFailure {
                message: format!(
                    "invalid coordinate ({}, {})",
                    point.latitude, point.longitude
                ),
            });
        }
        if point.latitude < UTM_MIN_LAT || point.latitude > UTM_MAX_LAT {
            return Err(SurveyError::ProjectionFailure {
                message: format!(
                    "latitude {:.4} outside UTM band [{}, {}]",
                    point.latitude, UTM_MIN_LAT, UTM_MAX_LAT
                ),
            });
        }

        // lng = 180 belongs to zone 60
        let number = (((point.longitude + 180.0) / 6.0).floor() as u8 + 1).min(60);
        Ok(Self {
            number,
            north: point.latitude >= 0.0,
        })
    }

    /// Longitude of the zone's central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        (self.number as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }
}

/// Forward transverse Mercator projection for one UTM zone.
#[derive(Debug, Clone, Copy)]
pub struct UtmProjection {
    zone: UtmZone,
    e2: f64,
    ep2: f64,
}

impl UtmProjection {
    pub fn new(zone: UtmZone) -> Result<Self> {
        if zone.number == 0 || zone.number > 60 {
            return Err(SurveyError::ProjectionFailure {
                message: format!("invalid UTM zone {}", zone.number),
            });
        }
        let e2 = WGS84_F * (2.0 - WGS84_F);
        Ok(Self {
            zone,
            e2,
            ep2: e2 / (1.0 - e2),
        })
    }

    pub fn zone(&self) -> UtmZone {
        self.zone
    }

    /// Meridional arc length from the equator to `lat_rad`.
    fn meridian_arc(&self, lat_rad: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        WGS84_A
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat_rad
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat_rad).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat_rad).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * lat_rad).sin())
    }

    /// Easting/northing in meters.
    pub fn project(&self, point: &GpsPoint) -> Result<Coord<f64>> {
        if point.latitude < UTM_MIN_LAT || point.latitude > UTM_MAX_LAT {
            return Err(SurveyError::ProjectionFailure {
                message: format!("latitude {:.4} outside UTM band", point.latitude),
            });
        }

        let lat = point.latitude.to_radians();
        let dlon = (point.longitude - self.zone.central_meridian()).to_radians();

        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let tan_lat = lat.tan();

        let n = WGS84_A / (1.0 - self.e2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = self.ep2 * cos_lat * cos_lat;
        let a = cos_lat * dlon;
        let m = self.meridian_arc(lat);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let easting = UTM_FALSE_EASTING
            + UTM_K0
                * n
                * (a + (1.0 - t + c) * a3 / 6.0
                    + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * a5 / 120.0);

        let mut northing = UTM_K0
            * (m + n
                * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2) * a6 / 720.0));
        if !self.zone.north {
            northing += UTM_FALSE_NORTHING_SOUTH;
        }

        if !easting.is_finite() || !northing.is_finite() {
            return Err(SurveyError::ProjectionFailure {
                message: format!(
                    "non-finite projection of ({}, {})",
                    point.latitude, point.longitude
                ),
            });
        }

        Ok(Coord {
            x: easting,
            y: northing,
        })
    }

    /// Project every point; fails on the first point that cannot be projected.
    pub fn project_all(&self, points: &[GpsPoint]) -> Result<Vec<Coord<f64>>> {
        points.iter().map(|p| self.project(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_numbers() {
        assert_eq!(UtmZone::for_point(&GpsPoint::new(0.0, -180.0)).unwrap().number, 1);
        assert_eq!(UtmZone::for_point(&GpsPoint::new(0.0, 0.0)).unwrap().number, 31);
        assert_eq!(UtmZone::for_point(&GpsPoint::new(0.0, 180.0)).unwrap().number, 60);
        // Pune
        let zone = UtmZone::for_point(&GpsPoint::new(18.5204, 73.8567)).unwrap();
        assert_eq!(zone.number, 43);
        assert!(zone.north);
        assert_eq!(zone.central_meridian(), 75.0);
    }

    #[test]
    fn test_zone_rejects_polar_latitudes() {
        assert!(UtmZone::for_point(&GpsPoint::new(85.0, 10.0)).is_err());
        assert!(UtmZone::for_point(&GpsPoint::new(-81.0, 10.0)).is_err());
    }

    #[test]
    fn test_central_meridian_on_equator() {
        let zone = UtmZone::for_point(&GpsPoint::new(0.0, 3.0)).unwrap();
        let proj = UtmProjection::new(zone).unwrap();
        let c = proj.project(&GpsPoint::new(0.0, 3.0)).unwrap();
        assert!((c.x - 500_000.0).abs() < 1e-6);
        assert!(c.y.abs() < 1e-6);
    }

    #[test]
    fn test_meridian_northing_at_45() {
        // WGS84 meridian arc to 45°N is 4 984 944.378 m, scaled by k0
        let point = GpsPoint::new(45.0, 9.0);
        let zone = UtmZone::for_point(&point).unwrap();
        assert_eq!(zone.number, 32);
        let c = UtmProjection::new(zone).unwrap().project(&point).unwrap();
        assert!((c.x - 500_000.0).abs() < 1e-6);
        assert!((c.y - 4_982_950.400).abs() < 0.01);
    }

    #[test]
    fn test_easting_grows_eastward() {
        let zone = UtmZone::for_point(&GpsPoint::new(18.5, 73.8)).unwrap();
        let proj = UtmProjection::new(zone).unwrap();
        let west = proj.project(&GpsPoint::new(18.5, 73.8)).unwrap();
        let east = proj.project(&GpsPoint::new(18.5, 73.81)).unwrap();
        // 0.01° of longitude at 18.5°N is ~1055 m
        assert!((east.x - west.x - 1055.0).abs() < 5.0);
    }

    #[test]
    fn test_southern_false_northing() {
        let point = GpsPoint::new(-1.0, 3.0);
        let zone = UtmZone::for_point(&point).unwrap();
        assert!(!zone.north);
        let c = UtmProjection::new(zone).unwrap().project(&point).unwrap();
        assert!(c.y < 10_000_000.0 && c.y > 9_800_000.0);
    }

    #[test]
    fn test_invalid_zone() {
        assert!(UtmProjection::new(UtmZone { number: 0, north: true }).is_err());
        assert!(UtmProjection::new(UtmZone { number: 61, north: true }).is_err());
    }

    #[test]
    fn test_flat_projection_scale() {
        let coords = flat_project(&[GpsPoint::new(1.0, 1.0)], 60.0);
        assert!((coords[0].y - 111_000.0).abs() < 1e-9);
        assert!((coords[0].x - 55_500.0).abs() < 1e-6);
    }
}
