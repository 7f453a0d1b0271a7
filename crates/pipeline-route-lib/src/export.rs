//! Export of parsed records as GeoJSON and GPX

use crate::{ParsedRecord, Path, Result, RouteGeometry};
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use serde_json::{Value, json};
use std::io::Write;
use std::sync::Arc;

fn path_positions(path: &Path) -> Value {
    path.iter().map(|c| json!([c.lon, c.lat])).collect()
}

fn geojson_geometry(geometry: &RouteGeometry) -> Value {
    match geometry {
        RouteGeometry::Single(path) => json!({
            "type": "LineString",
            "coordinates": path_positions(path),
        }),
        RouteGeometry::Multi(multi) => json!({
            "type": "MultiLineString",
            "coordinates": multi.iter().map(path_positions).collect::<Vec<_>>(),
        }),
    }
}

/// Build a GeoJSON FeatureCollection, one feature per record
///
/// Positions are `[longitude, latitude]` as GeoJSON requires.
pub fn to_geojson(records: &[Arc<ParsedRecord>]) -> Value {
    let features: Vec<Value> = records
        .iter()
        .map(|record| {
            json!({
                "type": "Feature",
                "geometry": geojson_geometry(record.geometry()),
                "properties": {
                    "name": record.name(),
                    "branched": record.geometry().is_branched(),
                    "points": record.total_points(),
                    "length_km": record.length_km(),
                    "dropped_segments": record.dropped_segments(),
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Build a GPX 1.1 document, one track per record and one track segment per path
pub fn to_gpx(records: &[Arc<ParsedRecord>]) -> Gpx {
    let mut gpx = Gpx::default();
    gpx.version = GpxVersion::Gpx11;
    gpx.creator = Some(concat!("pipeline-route-lib ", env!("CARGO_PKG_VERSION")).to_string());

    for record in records {
        let mut track = Track::new();
        track.name = Some(record.name().to_string());
        for path in record.geometry().paths() {
            let mut segment = TrackSegment::new();
            segment.points = path
                .iter()
                .map(|c| Waypoint::new(geo::Point::new(c.lon, c.lat)))
                .collect();
            track.segments.push(segment);
        }
        gpx.tracks.push(track);
    }

    gpx
}

/// Write records as a GPX document
pub fn write_gpx<W: Write>(records: &[Arc<ParsedRecord>], writer: W) -> Result<()> {
    gpx::write(&to_gpx(records), writer)?;
    Ok(())
}
