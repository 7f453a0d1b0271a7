//! Geometry types produced by the route parser
//!
//! Coordinates are stored latitude-first. Conversions into `geo` types follow the
//! `geo` convention instead (x = longitude, y = latitude).

use crate::utils::{self, Crs};
use crate::{PRIMARY_DELIMITER, SECONDARY_DELIMITER};
use geo::{BoundingRect, Coord, Geometry, LineString, MultiLineString, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 position in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build from the `lon,lat` order used by route strings
    #[inline]
    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        Self { lat, lon }
    }

    /// Encode back into a `lon,lat` route token
    pub fn to_token(&self) -> String {
        format!("{},{}", self.lon, self.lat)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

impl From<Coordinate> for Coord<f64> {
    #[inline]
    fn from(c: Coordinate) -> Self {
        Coord { x: c.lon, y: c.lat }
    }
}

/// Fewer than two coordinates were given for a [`Path`]
///
/// Holds the rejected coordinates unchanged.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("a path needs at least two coordinates, got {}", .0.len())]
pub struct TooFewCoordinates(pub Vec<Coordinate>);

/// No paths were given for a [`MultiPath`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("a multi path needs at least one path")]
pub struct EmptyMultiPath;

/// An unbranched route: two or more coordinates in travel order
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Coordinate>"))]
pub struct Path(Vec<Coordinate>);

impl TryFrom<Vec<Coordinate>> for Path {
    type Error = TooFewCoordinates;

    fn try_from(coordinates: Vec<Coordinate>) -> Result<Self, Self::Error> {
        if coordinates.len() < 2 {
            return Err(TooFewCoordinates(coordinates));
        }
        Ok(Path(coordinates))
    }
}

impl Path {
    #[inline]
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.0
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Coordinate> {
        self.0.iter()
    }

    /// Number of coordinates, always at least two
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for parity with `len`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        self.0.iter().copied().map(Coord::from).collect()
    }

    /// Great-circle length in meters
    pub fn haversine_length_m(&self) -> f64 {
        self.0
            .windows(2)
            .map(|w| utils::haversine_distance_m(&w[0], &w[1]))
            .sum()
    }

    /// Planar length in the units of `crs` (meters for projected systems, degrees for WGS84)
    pub fn projected_length(&self, crs: Crs) -> f64 {
        self.0
            .windows(2)
            .map(|w| {
                let a = crs.project(&w[0]);
                let b = crs.project(&w[1]);
                (b.x - a.x).hypot(b.y - a.y)
            })
            .sum()
    }

    /// Encode as `lon,lat` tokens joined by the primary delimiter
    pub fn to_route_string(&self) -> String {
        let tokens: Vec<String> = self.0.iter().map(Coordinate::to_token).collect();
        tokens.join(&PRIMARY_DELIMITER.to_string())
    }

    fn project(&self, crs: Crs) -> LineString<f64> {
        self.0.iter().map(|c| crs.project(c)).collect()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Coordinate;
    type IntoIter = std::slice::Iter<'a, Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A branched route: one path per branch segment, in segment order
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Path>"))]
pub struct MultiPath(Vec<Path>);

impl TryFrom<Vec<Path>> for MultiPath {
    type Error = EmptyMultiPath;

    fn try_from(paths: Vec<Path>) -> Result<Self, Self::Error> {
        if paths.is_empty() {
            return Err(EmptyMultiPath);
        }
        Ok(MultiPath(paths))
    }
}

impl MultiPath {
    #[inline]
    pub fn paths(&self) -> &[Path] {
        &self.0
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Path> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_multi_line_string(&self) -> MultiLineString<f64> {
        MultiLineString::new(self.0.iter().map(Path::to_line_string).collect())
    }
}

/// Parsed route geometry
///
/// The variant records whether the route string was branched, independently of how
/// many paths survived parsing.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RouteGeometry {
    Single(Path),
    Multi(MultiPath),
}

impl RouteGeometry {
    #[inline]
    pub fn is_branched(&self) -> bool {
        matches!(self, RouteGeometry::Multi(_))
    }

    /// All paths in order; a single route yields exactly one
    pub fn paths(&self) -> &[Path] {
        match self {
            RouteGeometry::Single(path) => std::slice::from_ref(path),
            RouteGeometry::Multi(multi) => multi.paths(),
        }
    }

    /// Every coordinate in order, path after path
    pub fn coordinates(&self) -> impl Iterator<Item = &Coordinate> {
        self.paths().iter().flat_map(Path::iter)
    }

    pub fn total_points(&self) -> usize {
        self.paths().iter().map(Path::len).sum()
    }

    /// Sum of great-circle path lengths in kilometers
    pub fn haversine_length_km(&self) -> f64 {
        self.paths().iter().map(Path::haversine_length_m).sum::<f64>() / 1000.0
    }

    /// Sum of planar path lengths in kilometers after projecting into `crs`
    pub fn projected_length_km(&self, crs: Crs) -> f64 {
        self.paths()
            .iter()
            .map(|p| p.projected_length(crs))
            .sum::<f64>()
            / 1000.0
    }

    /// WGS84 bounding box (x = longitude, y = latitude)
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            RouteGeometry::Single(path) => path.to_line_string().bounding_rect(),
            RouteGeometry::Multi(multi) => multi.to_multi_line_string().bounding_rect(),
        }
    }

    /// Convert into a `geo` geometry in the given reference system
    ///
    /// Single routes become a `LineString`, branched routes a `MultiLineString`.
    pub fn to_geo(&self, crs: Crs) -> Geometry<f64> {
        match self {
            RouteGeometry::Single(path) => Geometry::LineString(path.project(crs)),
            RouteGeometry::Multi(multi) => Geometry::MultiLineString(MultiLineString::new(
                multi.iter().map(|p| p.project(crs)).collect(),
            )),
        }
    }

    /// Encode back into route string form
    pub fn to_route_string(&self) -> String {
        let segments: Vec<String> = self.paths().iter().map(Path::to_route_string).collect();
        segments.join(&SECONDARY_DELIMITER.to_string())
    }
}

impl fmt::Display for RouteGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_route_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(points: &[(f64, f64)]) -> Path {
        Path::try_from(
            points
                .iter()
                .map(|&(lat, lon)| Coordinate::new(lat, lon))
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[test]
    fn test_path_rejects_single_coordinate() {
        let rejected = Path::try_from(vec![Coordinate::new(50.0, 10.0)]).unwrap_err();
        assert_eq!(rejected.0, vec![Coordinate::new(50.0, 10.0)]);
        assert_eq!(
            rejected.to_string(),
            "a path needs at least two coordinates, got 1"
        );
        assert!(Path::try_from(Vec::new()).is_err());
    }

    #[test]
    fn test_multipath_rejects_empty() {
        assert_eq!(MultiPath::try_from(Vec::new()), Err(EmptyMultiPath));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_enforces_path_length() {
        assert!(serde_json::from_str::<Path>("[]").is_err());
        assert!(serde_json::from_str::<Path>(r#"[{"lat": 50.0, "lon": 10.0}]"#).is_err());
        assert!(serde_json::from_str::<Path>("[[50.0, 10.0]]").is_err());

        let p: Path = serde_json::from_str(
            r#"[{"lat": 50.0, "lon": 10.0}, {"lat": 51.0, "lon": 11.0}]"#,
        )
        .unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(
            serde_json::to_string(&p).unwrap(),
            r#"[{"lat":50.0,"lon":10.0},{"lat":51.0,"lon":11.0}]"#
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_enforces_nonempty_multipath() {
        assert!(serde_json::from_str::<MultiPath>("[]").is_err());
        assert!(serde_json::from_str::<MultiPath>(r#"[[{"lat": 50.0, "lon": 10.0}]]"#).is_err());
        assert!(serde_json::from_str::<RouteGeometry>(r#"{"Multi": []}"#).is_err());
        assert!(serde_json::from_str::<RouteGeometry>(r#"{"Single": []}"#).is_err());
    }

    #[test]
    fn test_line_string_axis_order() {
        let p = path(&[(50.0, 10.0), (51.0, 11.0)]);
        let ls = p.to_line_string();
        assert_eq!(ls.0[0], Coord { x: 10.0, y: 50.0 });
        assert_eq!(ls.0[1], Coord { x: 11.0, y: 51.0 });
    }

    #[test]
    fn test_route_string_encoding() {
        let p = path(&[(50.5, 10.25), (51.0, -11.0)]);
        assert_eq!(p.to_route_string(), "10.25,50.5:-11,51");

        let multi = RouteGeometry::Multi(
            MultiPath::try_from(vec![p.clone(), path(&[(1.0, 2.0), (3.0, 4.0)])]).unwrap(),
        );
        assert_eq!(multi.to_route_string(), "10.25,50.5:-11,51;2,1:4,3");
    }

    #[test]
    fn test_haversine_length() {
        // One degree of latitude is roughly 111.2 km
        let p = path(&[(0.0, 0.0), (1.0, 0.0)]);
        let km = p.haversine_length_m() / 1000.0;
        assert!((km - 111.19).abs() < 0.1);
    }

    #[test]
    fn test_projected_length_equidistant() {
        // Along the equator the equidistant projection preserves distance
        let p = path(&[(0.0, 0.0), (0.0, 1.0)]);
        let km = p.projected_length(Crs::WorldEquidistantCylindrical) / 1000.0;
        assert!((km - 111.32).abs() < 0.01);
    }

    #[test]
    fn test_geometry_paths_and_points() {
        let single = RouteGeometry::Single(path(&[(50.0, 10.0), (51.0, 11.0), (52.0, 12.0)]));
        assert!(!single.is_branched());
        assert_eq!(single.paths().len(), 1);
        assert_eq!(single.total_points(), 3);

        let multi = RouteGeometry::Multi(
            MultiPath::try_from(vec![
                path(&[(50.0, 10.0), (51.0, 11.0)]),
                path(&[(60.0, 20.0), (61.0, 21.0), (62.0, 22.0)]),
            ])
            .unwrap(),
        );
        assert!(multi.is_branched());
        assert_eq!(multi.total_points(), 5);
        let lats: Vec<f64> = multi.coordinates().map(|c| c.lat).collect();
        assert_eq!(lats, vec![50.0, 51.0, 60.0, 61.0, 62.0]);
    }

    #[test]
    fn test_single_branch_multi_stays_multi() {
        let multi =
            RouteGeometry::Multi(MultiPath::try_from(vec![path(&[(1.0, 2.0), (3.0, 4.0)])]).unwrap());
        assert!(multi.is_branched());
        assert!(matches!(
            multi.to_geo(Crs::Wgs84),
            Geometry::MultiLineString(_)
        ));
    }

    #[test]
    fn test_bounding_rect() {
        let single = RouteGeometry::Single(path(&[(50.0, 10.0), (52.0, 8.0), (51.0, 12.0)]));
        let rect = single.bounding_rect().unwrap();
        assert_eq!(rect.min(), Coord { x: 8.0, y: 50.0 });
        assert_eq!(rect.max(), Coord { x: 12.0, y: 52.0 });
    }

    #[test]
    fn test_to_geo_projects() {
        let single = RouteGeometry::Single(path(&[(0.0, 0.0), (0.0, 1.0)]));
        match single.to_geo(Crs::WebMercator) {
            Geometry::LineString(ls) => {
                assert!(ls.0[0].x.abs() < 1e-6);
                assert!((ls.0[1].x - 111_319.49).abs() < 0.1);
            }
            other => panic!("expected LineString, got {other:?}"),
        }
    }
}
