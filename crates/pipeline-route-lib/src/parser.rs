//! Route-string parsing
//!
//! A route string holds `lon,lat` pairs separated by [`PRIMARY_DELIMITER`]. Branched
//! routes additionally separate their segments with [`SECONDARY_DELIMITER`].
//!
//! Failure handling differs between the two shapes. An unbranched route fails as a
//! whole on the first bad token. A branched route drops only the failing segment and
//! keeps the rest, unless [`BranchPolicy::Strict`] is requested.

use crate::{
    Coordinate, MultiPath, Path, RouteError, RouteGeometry, TokenError, TooFewCoordinates,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Separates coordinate-pair tokens within a segment
pub const PRIMARY_DELIMITER: char = ':';

/// Separates branch segments within a route
pub const SECONDARY_DELIMITER: char = ';';

/// Separates longitude from latitude within a token
const PAIR_SEPARATOR: char = ',';

/// How failing segments of a branched route are handled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BranchPolicy {
    /// Drop the failing segment and keep parsing its siblings
    #[default]
    BestEffort,
    /// Fail the whole route on the first failing segment
    Strict,
}

/// A route string split into its tokens, before any number is parsed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteString<'a> {
    /// No secondary delimiter: one list of `lon,lat` tokens
    Single(Vec<&'a str>),
    /// One token list per branch segment; a blank segment has no tokens
    Branched(Vec<Vec<&'a str>>),
}

impl<'a> RouteString<'a> {
    /// Split on the secondary delimiter, then split each segment on the primary one
    pub fn tokenize(raw: &'a str) -> Self {
        let segments: Vec<&str> = raw.split(SECONDARY_DELIMITER).collect();
        if segments.len() == 1 {
            RouteString::Single(split_tokens(raw))
        } else {
            RouteString::Branched(segments.into_iter().map(split_tokens).collect())
        }
    }
}

fn split_tokens(segment: &str) -> Vec<&str> {
    if segment.trim().is_empty() {
        return Vec::new();
    }
    segment.split(PRIMARY_DELIMITER).map(str::trim).collect()
}

/// A branch segment that was left out of a [`RouteGeometry::Multi`]
#[derive(Clone, Debug, PartialEq)]
pub struct DroppedSegment {
    /// Zero-based position of the segment in the route string
    pub index: usize,
    /// Coordinates read before the failure
    pub partial: Vec<Coordinate>,
    pub error: RouteError,
}

/// Geometry together with the branch segments that had to be dropped
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedRoute {
    pub geometry: RouteGeometry,
    pub dropped: Vec<DroppedSegment>,
}

/// Parse a route string, logging a warning for each dropped branch segment
///
/// `label` is only used in diagnostics.
pub fn parse_route(label: &str, raw: &str) -> Result<RouteGeometry, RouteError> {
    let parsed = parse_route_detailed(label, raw, BranchPolicy::BestEffort)?;
    log_dropped_segments(label, &parsed.dropped);
    Ok(parsed.geometry)
}

/// Warn about each branch segment left out of a route
pub(crate) fn log_dropped_segments(label: &str, dropped: &[DroppedSegment]) {
    for dropped in dropped {
        tracing::warn!(
            "Dropping segment {} of route {:?} after {:?}: {}",
            dropped.index,
            label,
            dropped.partial,
            dropped.error
        );
    }
}

/// Parse a route string and report dropped branch segments to the caller
///
/// Nothing is logged; the caller decides what to do with `ParsedRoute::dropped`.
pub fn parse_route_detailed(
    label: &str,
    raw: &str,
    policy: BranchPolicy,
) -> Result<ParsedRoute, RouteError> {
    #[cfg(feature = "profiling")]
    profiling::scope!("parser::parse_route");

    match RouteString::tokenize(raw) {
        RouteString::Single(tokens) => {
            let path = parse_segment(label, 0, &tokens).map_err(|(_, err)| err)?;
            Ok(ParsedRoute {
                geometry: RouteGeometry::Single(path),
                dropped: Vec::new(),
            })
        }
        RouteString::Branched(segments) => {
            let mut paths = Vec::with_capacity(segments.len());
            let mut dropped = Vec::new();

            for (index, tokens) in segments.iter().enumerate() {
                match parse_segment(label, index, tokens) {
                    Ok(path) => paths.push(path),
                    Err((_, err)) if policy == BranchPolicy::Strict => return Err(err),
                    Err((partial, error)) => dropped.push(DroppedSegment {
                        index,
                        partial,
                        error,
                    }),
                }
            }

            let multi = MultiPath::try_from(paths).map_err(|_| RouteError::NoValidSegments {
                label: label.to_string(),
                segments: segments.len(),
            })?;

            Ok(ParsedRoute {
                geometry: RouteGeometry::Multi(multi),
                dropped,
            })
        }
    }
}

/// Parse one segment, handing back the coordinates read so far on failure
fn parse_segment(
    label: &str,
    segment: usize,
    tokens: &[&str],
) -> Result<Path, (Vec<Coordinate>, RouteError)> {
    let mut coordinates = Vec::with_capacity(tokens.len());

    for token in tokens {
        match parse_token(token) {
            Ok(coordinate) => coordinates.push(coordinate),
            Err(reason) => {
                let err = RouteError::MalformedToken {
                    label: label.to_string(),
                    segment,
                    token: (*token).to_string(),
                    reason,
                };
                return Err((coordinates, err));
            }
        }
    }

    Path::try_from(coordinates).map_err(|TooFewCoordinates(coordinates)| {
        let err = match coordinates.first() {
            None => RouteError::EmptySegment {
                label: label.to_string(),
                segment,
            },
            Some(&coordinate) => RouteError::DegeneratePath {
                label: label.to_string(),
                segment,
                coordinate,
            },
        };
        (coordinates, err)
    })
}

/// Read one `lon,lat` token
fn parse_token(token: &str) -> Result<Coordinate, TokenError> {
    let mut halves = token.split(PAIR_SEPARATOR);
    let (Some(lon), Some(lat), None) = (halves.next(), halves.next(), halves.next()) else {
        return Err(TokenError::PairArity);
    };
    Ok(Coordinate::from_lon_lat(parse_number(lon)?, parse_number(lat)?))
}

fn parse_number(text: &str) -> Result<f64, TokenError> {
    let text = text.trim();
    let value: f64 = text
        .parse()
        .map_err(|_| TokenError::NotANumber(text.to_string()))?;
    if !value.is_finite() {
        return Err(TokenError::NonFinite(text.to_string()));
    }
    Ok(value)
}
