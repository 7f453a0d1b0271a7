//! Route records and their parsed form
//!
//! A [`RouteRecord`] is the raw `(name, route string)` pair read from a table.
//! A [`ParsedRecord`] attaches the parsed geometry and metadata computed once at
//! construction.

use crate::{BranchPolicy, RouteError, RouteGeometry, parse_route_detailed, parser};
use geo::Rect;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A named raw route string, immutable once read
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteRecord {
    name: String,
    route: String,
}

impl RouteRecord {
    pub fn new(name: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            route: route.into(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn route(&self) -> &str {
        &self.route
    }
}

/// A record with its parsed geometry and precomputed metadata
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParsedRecord {
    /// The record as read
    record: RouteRecord,
    /// Parsed geometry
    geometry: RouteGeometry,
    /// Number of branch segments left out of the geometry
    dropped_segments: usize,
    /// Precomputed WGS84 bounding box (x = longitude, y = latitude)
    bounding_box: Rect<f64>,
    /// Cached total number of coordinates
    cached_total_points: usize,
    /// Cached great-circle length in kilometers
    cached_length_km: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ParsedRecord {
    /// Parse a record
    ///
    /// Dropped branch segments are logged at warn level and counted; any other
    /// failure is returned to the caller.
    pub fn parse(record: RouteRecord, policy: BranchPolicy) -> Result<Arc<Self>, RouteError> {
        #[cfg(feature = "profiling")]
        profiling::scope!("record::parse");

        let parsed = parse_route_detailed(record.name(), record.route(), policy)?;
        parser::log_dropped_segments(record.name(), &parsed.dropped);

        Ok(Arc::new(Self::from_geometry(
            record,
            parsed.geometry,
            parsed.dropped.len(),
        )))
    }

    /// Attach an already parsed geometry to its record
    pub fn from_geometry(
        record: RouteRecord,
        geometry: RouteGeometry,
        dropped_segments: usize,
    ) -> Self {
        let (bounding_box, total_points, length_km) = Self::compute_metadata(&geometry);
        Self {
            record,
            geometry,
            dropped_segments,
            bounding_box,
            cached_total_points: total_points,
            cached_length_km: length_km,
        }
    }

    /// Compute all metadata in a single pass over the coordinates
    ///
    /// Returns (bounding_box, total_points, length_km)
    fn compute_metadata(geometry: &RouteGeometry) -> (Rect<f64>, usize, f64) {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut total_points = 0;
        let mut total_m = 0.0;

        for path in geometry.paths() {
            total_points += path.len();
            total_m += path.haversine_length_m();
            for c in path {
                min_x = min_x.min(c.lon);
                min_y = min_y.min(c.lat);
                max_x = max_x.max(c.lon);
                max_y = max_y.max(c.lat);
            }
        }

        let bounding_box = Rect::new(
            geo::Coord { x: min_x, y: min_y },
            geo::Coord { x: max_x, y: max_y },
        );
        (bounding_box, total_points, total_m / 1000.0)
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.record.name()
    }

    #[inline]
    pub fn record(&self) -> &RouteRecord {
        &self.record
    }

    #[inline]
    pub fn geometry(&self) -> &RouteGeometry {
        &self.geometry
    }

    #[inline]
    pub fn dropped_segments(&self) -> usize {
        self.dropped_segments
    }

    /// Get the bounding box in WGS84 degrees
    #[inline]
    pub fn bounding_box(&self) -> Rect<f64> {
        self.bounding_box
    }

    /// Total number of coordinates across all paths
    ///
    /// This is O(1) as the value is cached during construction.
    #[inline]
    pub fn total_points(&self) -> usize {
        self.cached_total_points
    }

    /// Great-circle length across all paths in kilometers
    ///
    /// This is O(1) as the value is cached during construction.
    #[inline]
    pub fn length_km(&self) -> f64 {
        self.cached_length_km
    }
}
