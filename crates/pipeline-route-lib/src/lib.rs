//! Pipeline Route Library - Route-String Parsing for Gas Pipeline Tables
//!
//! This library turns the delimiter-encoded route strings found in pipeline tracker
//! tables into typed line and multi-line geometries, and carries the plumbing needed
//! to read those tables, keep the parsed records together and hand them downstream.
//!
//! # Architecture
//!
//! - **[`parse_route`]**: Pure parser from `(label, route string)` to [`RouteGeometry`]
//! - **[`RouteGeometry`]**: Tagged result, either a single [`Path`] or a [`MultiPath`]
//! - **[`ParsedRecord`]**: Immutable record with its geometry and cached metadata
//! - **[`RouteCollection`]**: Parallel bulk parsing with rejected-record bookkeeping
//! - **[`RouteSource`]**: Data-access interface; [`DelimitedSource`] reads CSV/TSV exports
//!
//! # Route string format
//!
//! ```text
//! lon,lat:lon,lat:lon,lat            single path
//! lon,lat:lon,lat;lon,lat:lon,lat    branched route, one segment per `;`
//! ```

mod collection;
mod export;
mod geometry;
mod parser;
mod record;
mod source;
pub mod utils;

// Public API exports
pub use collection::{CollectionInfo, Config, RejectedRecord, RouteCollection};
pub use export::{to_geojson, to_gpx, write_gpx};
pub use geometry::{Coordinate, EmptyMultiPath, MultiPath, Path, RouteGeometry, TooFewCoordinates};
pub use parser::{
    BranchPolicy, DroppedSegment, PRIMARY_DELIMITER, ParsedRoute, RouteString,
    SECONDARY_DELIMITER, parse_route, parse_route_detailed,
};
pub use record::{ParsedRecord, RouteRecord};
pub use source::{DEFAULT_SENTINELS, DelimitedSource, RouteSource, SourceConfig};
pub use utils::Crs;

/// Why a single `lon,lat` token could not be read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("expected exactly one comma between longitude and latitude")]
    PairArity,

    #[error("not a number: {0:?}")]
    NotANumber(String),

    #[error("non-finite value: {0:?}")]
    NonFinite(String),
}

/// Failure to turn a route string into geometry
///
/// Every variant names the record label and the zero-based segment index, so callers
/// can report the offending part of the route without re-parsing it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("route {label:?}: malformed token {token:?} in segment {segment}: {reason}")]
    MalformedToken {
        label: String,
        segment: usize,
        token: String,
        reason: TokenError,
    },

    #[error("route {label:?}: segment {segment} has no coordinates")]
    EmptySegment { label: String, segment: usize },

    #[error("route {label:?}: segment {segment} has a single coordinate {coordinate}")]
    DegeneratePath {
        label: String,
        segment: usize,
        coordinate: Coordinate,
    },

    #[error("route {label:?}: all {segments} branch segments were dropped")]
    NoValidSegments { label: String, segments: usize },
}

impl RouteError {
    /// Label of the record the error belongs to
    pub fn label(&self) -> &str {
        match self {
            RouteError::MalformedToken { label, .. }
            | RouteError::EmptySegment { label, .. }
            | RouteError::DegeneratePath { label, .. }
            | RouteError::NoValidSegments { label, .. } => label,
        }
    }
}

/// Error types for reading, parsing and exporting route data
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("Missing column: {0:?}")]
    MissingColumn(String),

    #[error("Empty table: no header row")]
    EmptyTable,

    #[error("GPX error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that all public types are accessible
        let _: fn(Config) -> RouteCollection = RouteCollection::new;
        let _: fn() -> Config = Config::default;
        let _: fn(&str, &str) -> std::result::Result<RouteGeometry, RouteError> = parse_route;
    }

    #[test]
    fn test_route_error_label() {
        let err = RouteError::EmptySegment {
            label: "Nord Stream".to_string(),
            segment: 2,
        };
        assert_eq!(err.label(), "Nord Stream");
        assert_eq!(
            err.to_string(),
            "route \"Nord Stream\": segment 2 has no coordinates"
        );
    }

    #[test]
    fn test_data_error_wraps_route_error() {
        let err: DataError = RouteError::NoValidSegments {
            label: "TAP".to_string(),
            segments: 3,
        }
        .into();
        assert!(matches!(err, DataError::Route(_)));
        assert!(err.to_string().contains("all 3 branch segments"));
    }
}
