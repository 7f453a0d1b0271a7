//! Utility functions for coordinate reference systems and distances

use crate::Coordinate;
use geo::{Coord, Point};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;
pub const EARTH_MERCATOR_MIN: f64 = -20037508.34;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// WGS84 ellipsoid semi-major axis in meters
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6378137.0;

/// WGS84 ellipsoid flattening
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257223563;

/// Mean Earth radius in meters, used for haversine distances
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Precomputed constant: 180.0 / EARTH_MERCATOR_MAX
const X_TO_LON_FACTOR: f64 = 180.0 / EARTH_MERCATOR_MAX;

/// Precomputed constant: PI / EARTH_MERCATOR_MAX
const Y_TO_LAT_FACTOR: f64 = std::f64::consts::PI / EARTH_MERCATOR_MAX;

/// Coordinate reference systems that parsed routes can be tagged with
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Crs {
    /// Geographic longitude/latitude in degrees (EPSG:4326)
    #[default]
    Wgs84,
    /// Web Mercator in meters (EPSG:3857)
    WebMercator,
    /// WGS 84 / World Equidistant Cylindrical in meters (EPSG:4087)
    WorldEquidistantCylindrical,
}

impl Crs {
    pub fn epsg(self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::WebMercator => 3857,
            Crs::WorldEquidistantCylindrical => 4087,
        }
    }

    /// Project a WGS84 coordinate into this system (x = easting, y = northing)
    #[inline]
    pub fn project(self, c: &Coordinate) -> Coord<f64> {
        match self {
            Crs::Wgs84 => Coord { x: c.lon, y: c.lat },
            Crs::WebMercator => wgs84_to_mercator(c.lat, c.lon).into(),
            Crs::WorldEquidistantCylindrical => wgs84_to_equidistant(c.lat, c.lon).into(),
        }
    }

    /// Inverse of [`Crs::project`]
    pub fn unproject(self, p: Coord<f64>) -> Coordinate {
        let (lat, lon) = match self {
            Crs::Wgs84 => (p.y, p.x),
            Crs::WebMercator => mercator_to_wgs84(p.x, p.y),
            Crs::WorldEquidistantCylindrical => equidistant_to_wgs84(p.x, p.y),
        };
        Coordinate::new(lat, lon)
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// # Arguments
/// * `lat` - Latitude in degrees (-85.05 to 85.05)
/// * `lon` - Longitude in degrees (-180 to 180)
///
/// # Returns
/// A `Point<f64>` with x (easting) and y (northing) in meters
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    // Clamp latitude to valid Web Mercator range
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon * LON_TO_X_FACTOR;

    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;

    Point::new(x, y)
}

/// Convert Web Mercator (x, y) in meters to WGS84 (lat, lon)
#[inline(always)]
pub fn mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = x * X_TO_LON_FACTOR;
    let lat =
        (std::f64::consts::PI / 2.0 - 2.0 * ((-y * Y_TO_LAT_FACTOR).exp()).atan()).to_degrees();
    (lat, lon)
}

/// First eccentricity squared of the WGS84 ellipsoid
#[inline(always)]
fn eccentricity_squared() -> f64 {
    WGS84_FLATTENING * (2.0 - WGS84_FLATTENING)
}

/// Leading coefficient of the meridian arc series
#[inline(always)]
fn meridian_factor(e2: f64) -> f64 {
    1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0
}

/// Convert WGS84 (lat, lon) to World Equidistant Cylindrical (x, y) in meters
///
/// Uses the ellipsoidal form with standard parallel 0: x is the equatorial arc,
/// y the meridian arc length from the equator.
#[inline]
pub fn wgs84_to_equidistant(lat: f64, lon: f64) -> Point<f64> {
    let e2 = eccentricity_squared();
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let phi = lat.to_radians();

    let m = WGS84_SEMI_MAJOR_AXIS
        * (meridian_factor(e2) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

    Point::new(WGS84_SEMI_MAJOR_AXIS * lon.to_radians(), m)
}

/// Convert World Equidistant Cylindrical (x, y) in meters to WGS84 (lat, lon)
#[inline]
pub fn equidistant_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let e2 = eccentricity_squared();
    let mu = y / (WGS84_SEMI_MAJOR_AXIS * meridian_factor(e2));
    let root = (1.0 - e2).sqrt();
    let e1 = (1.0 - root) / (1.0 + root);

    let phi = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    (phi.to_degrees(), (x / WGS84_SEMI_MAJOR_AXIS).to_degrees())
}

/// Haversine distance between two coordinates in meters
#[inline]
pub fn haversine_distance_m(p1: &Coordinate, p2: &Coordinate) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let delta_lat = (p2.lat - p1.lat).to_radians();
    let delta_lon = (p2.lon - p1.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}
