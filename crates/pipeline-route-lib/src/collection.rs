//! RouteCollection - Top-level manager for parsed route records
//!
//! This module provides the high-level API for parsing many records at once,
//! keeping track of the ones that failed, and summarizing what was parsed.

use crate::{BranchPolicy, ParsedRecord, Result, RouteError, RouteRecord, RouteSource};

use geo::Rect;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for the route collection
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// What to do with failing segments of branched routes.
    /// Default: best effort, dropping only the failing segment
    pub branch_policy: BranchPolicy,
    /// Batches at least this large are parsed on the rayon pool.
    /// Default: 64
    pub parallel_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            branch_policy: BranchPolicy::BestEffort,
            parallel_threshold: 64,
        }
    }
}

/// Information about the route collection
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollectionInfo {
    /// Number of parsed records
    pub route_count: usize,
    /// Parsed records whose route string was branched
    pub branched_count: usize,
    /// Records that failed to parse
    pub rejected_count: usize,
    /// Branch segments dropped across all parsed records
    pub dropped_segments: usize,
    /// Total number of coordinates
    pub total_points: usize,
    /// Total great-circle length in kilometers
    pub total_length_km: f64,
}

/// A record that could not be parsed, with the reason
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RejectedRecord {
    pub record: RouteRecord,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_display"))]
    pub error: RouteError,
}

#[cfg(feature = "serde")]
fn serialize_display<S: serde::Serializer>(
    error: &RouteError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Cached statistics for the collection
///
/// These are updated incrementally when records are added, avoiding expensive
/// recalculation.
#[derive(Debug, Clone, Default)]
struct CachedStats {
    branched_count: usize,
    dropped_segments: usize,
    total_points: usize,
    total_length_km: f64,
    /// Cached WGS84 bounding box (None if empty)
    bounding_box: Option<Rect<f64>>,
}

/// Top-level manager for parsed records
#[derive(Debug, Clone, Default)]
pub struct RouteCollection {
    /// Successfully parsed records, in input order
    records: Vec<Arc<ParsedRecord>>,
    /// Records that failed to parse, in input order
    rejected: Vec<RejectedRecord>,
    /// Configuration settings
    config: Config,
    /// Cached statistics (incrementally updated)
    cached_stats: CachedStats,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RouteCollection {
    /// Create a new route collection with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
            config,
            cached_stats: CachedStats::default(),
        }
    }

    /// Parse and add a single record
    ///
    /// On failure the record is kept in [`RouteCollection::rejected`] and the error
    /// is returned as well.
    pub fn add_record(&mut self, record: RouteRecord) -> std::result::Result<(), RouteError> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::add_record");

        match ParsedRecord::parse(record.clone(), self.config.branch_policy) {
            Ok(parsed) => {
                self.push_parsed(parsed);
                Ok(())
            }
            Err(error) => {
                self.push_rejected(record, error.clone());
                Err(error)
            }
        }
    }

    /// Parse and add many records, in parallel for large batches
    ///
    /// Failures do not stop the batch; they end up in [`RouteCollection::rejected`].
    /// Records keep their input order regardless of how they were parsed.
    ///
    /// Returns the number of records that parsed.
    pub fn add_records_parallel(&mut self, records: Vec<RouteRecord>) -> usize {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::add_records_parallel");

        let policy = self.config.branch_policy;
        let parse = |record: RouteRecord| match ParsedRecord::parse(record.clone(), policy) {
            Ok(parsed) => Ok(parsed),
            Err(error) => Err((record, error)),
        };

        let results: Vec<_> = if records.len() >= self.config.parallel_threshold {
            records.into_par_iter().map(parse).collect()
        } else {
            records.into_iter().map(parse).collect()
        };

        // Sequential merge keeps input order
        let mut accepted = 0;
        for result in results {
            match result {
                Ok(parsed) => {
                    self.push_parsed(parsed);
                    accepted += 1;
                }
                Err((record, error)) => self.push_rejected(record, error),
            }
        }
        accepted
    }

    /// Read every record from a source and add it
    ///
    /// Returns the number of records that parsed.
    pub fn load_from_source<S: RouteSource + ?Sized>(&mut self, source: &mut S) -> Result<usize> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::load_from_source");

        let records = source.read_records()?;
        let total = records.len();
        let accepted = self.add_records_parallel(records);
        tracing::info!(
            "Parsed {} of {} route records ({} rejected)",
            accepted,
            total,
            total - accepted
        );
        Ok(accepted)
    }

    /// Get all parsed records
    #[inline]
    pub fn records(&self) -> &[Arc<ParsedRecord>] {
        &self.records
    }

    /// Get all rejected records
    #[inline]
    pub fn rejected(&self) -> &[RejectedRecord] {
        &self.rejected
    }

    /// Get a reference to a specific record by index
    #[inline]
    pub fn get_record(&self, index: usize) -> Option<&Arc<ParsedRecord>> {
        self.records.get(index)
    }

    /// Find the first parsed record with the given name
    pub fn find(&self, name: &str) -> Option<&Arc<ParsedRecord>> {
        self.records.iter().find(|r| r.name() == name)
    }

    /// Get total number of parsed records
    #[inline]
    pub fn route_count(&self) -> usize {
        self.records.len()
    }

    /// Check if the collection has no parsed records
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get collection information
    ///
    /// This is O(1) as all values are cached.
    pub fn get_info(&self) -> CollectionInfo {
        CollectionInfo {
            route_count: self.records.len(),
            branched_count: self.cached_stats.branched_count,
            rejected_count: self.rejected.len(),
            dropped_segments: self.cached_stats.dropped_segments,
            total_points: self.cached_stats.total_points,
            total_length_km: self.cached_stats.total_length_km,
        }
    }

    /// Combined WGS84 bounding box of all parsed records
    ///
    /// Returns `None` if there are no records.
    /// Returns `Some((min_lat, min_lon, max_lat, max_lon))` otherwise.
    pub fn bounding_box_wgs84(&self) -> Option<(f64, f64, f64, f64)> {
        let bbox = self.cached_stats.bounding_box?;
        Some((bbox.min().y, bbox.min().x, bbox.max().y, bbox.max().x))
    }

    /// Clear all records, parsed and rejected
    pub fn clear(&mut self) {
        self.records.clear();
        self.rejected.clear();
        self.cached_stats = CachedStats::default();
    }

    fn push_parsed(&mut self, parsed: Arc<ParsedRecord>) {
        self.update_stats_for_added_record(&parsed);
        self.records.push(parsed);
    }

    fn push_rejected(&mut self, record: RouteRecord, error: RouteError) {
        tracing::warn!("Rejecting route record {:?}: {}", record.name(), error);
        self.rejected.push(RejectedRecord { record, error });
    }

    /// Update cached statistics when a record is added
    #[inline]
    fn update_stats_for_added_record(&mut self, record: &ParsedRecord) {
        let stats = &mut self.cached_stats;
        if record.geometry().is_branched() {
            stats.branched_count += 1;
        }
        stats.dropped_segments += record.dropped_segments();
        stats.total_points += record.total_points();
        stats.total_length_km += record.length_km();

        let record_bbox = record.bounding_box();
        stats.bounding_box = Some(match stats.bounding_box {
            Some(bbox) => Rect::new(
                geo::Coord {
                    x: bbox.min().x.min(record_bbox.min().x),
                    y: bbox.min().y.min(record_bbox.min().y),
                },
                geo::Coord {
                    x: bbox.max().x.max(record_bbox.max().x),
                    y: bbox.max().y.max(record_bbox.max().y),
                },
            ),
            None => record_bbox,
        });
    }
}
