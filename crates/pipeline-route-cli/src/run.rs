use crate::settings::{OutputFormat, Settings};
use pipeline_route_lib::{
    Crs, DataError, DelimitedSource, RouteCollection, RouteError, RouteRecord, to_geojson,
    write_gpx,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("nothing to parse: pass --tables or --route")]
    NothingToDo,

    #[error("failed to load table {}: {source}", .path.display())]
    Table { path: PathBuf, source: DataError },

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load every requested route, then write the requested output
pub fn run(settings: &Settings) -> Result<(), CliError> {
    if settings.tables.is_empty() && settings.route.is_none() {
        return Err(CliError::NothingToDo);
    }

    let collection = load(settings)?;

    match &settings.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_output(&collection, settings.format, &mut writer)?;
            writer.flush()?;
            tracing::info!("Wrote {:?} output to {}", settings.format, path.display());
        }
        None => {
            let mut writer = std::io::stdout().lock();
            write_output(&collection, settings.format, &mut writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn load(settings: &Settings) -> Result<RouteCollection, CliError> {
    let mut collection = RouteCollection::new(settings.collection_config());

    for path in &settings.tables {
        let table_error = |source| CliError::Table {
            path: path.clone(),
            source,
        };
        let mut source =
            DelimitedSource::from_path(path, settings.source_config()).map_err(table_error)?;
        collection
            .load_from_source(&mut source)
            .map_err(table_error)?;
    }

    // A route given on the command line must parse
    if let Some(route) = &settings.route {
        collection.add_record(RouteRecord::new(&settings.label, route))?;
    }

    Ok(collection)
}

fn write_output<W: Write>(
    collection: &RouteCollection,
    format: OutputFormat,
    writer: &mut W,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Summary => write_summary(collection, writer)?,
        OutputFormat::Geojson => {
            serde_json::to_writer_pretty(&mut *writer, &to_geojson(collection.records()))
                .map_err(DataError::from)?;
            writeln!(writer)?;
        }
        OutputFormat::Gpx => write_gpx(collection.records(), &mut *writer)?,
    }
    Ok(())
}

fn write_summary<W: Write>(collection: &RouteCollection, out: &mut W) -> std::io::Result<()> {
    let info = collection.get_info();
    let projected_km: f64 = collection
        .records()
        .iter()
        .map(|r| r.geometry().projected_length_km(Crs::WorldEquidistantCylindrical))
        .sum();

    writeln!(
        out,
        "routes parsed:    {} ({} branched)",
        info.route_count, info.branched_count
    )?;
    writeln!(out, "routes rejected:  {}", info.rejected_count)?;
    writeln!(out, "segments dropped: {}", info.dropped_segments)?;
    writeln!(out, "points:           {}", info.total_points)?;
    writeln!(
        out,
        "length:           {:.1} km great-circle, {:.1} km {}",
        info.total_length_km,
        projected_km,
        Crs::WorldEquidistantCylindrical
    )?;
    if let Some((min_lat, min_lon, max_lat, max_lon)) = collection.bounding_box_wgs84() {
        writeln!(
            out,
            "bounding box:     lat {min_lat:.4}..{max_lat:.4}, lon {min_lon:.4}..{max_lon:.4}"
        )?;
    }

    if !collection.is_empty() {
        writeln!(out, "\nname\tpaths\tpoints\tlength_km")?;
        for record in collection.records() {
            writeln!(
                out,
                "{}\t{}\t{}\t{:.1}",
                record.name(),
                record.geometry().paths().len(),
                record.total_points(),
                record.length_km()
            )?;
        }
    }

    if !collection.rejected().is_empty() {
        writeln!(out, "\nrejected:")?;
        for rejected in collection.rejected() {
            writeln!(out, "  {}", rejected.error)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn collection() -> RouteCollection {
        let mut collection = RouteCollection::new(Default::default());
        collection.add_records_parallel(vec![
            RouteRecord::new("Single", "10.0,50.0:11.0,51.0"),
            RouteRecord::new("Branched", "10.0,50.0:11.0,51.0;bad;20.0,60.0:21.0,61.0"),
            RouteRecord::new("Broken", "10.0,x:11.0,51.0"),
        ]);
        collection
    }

    #[test]
    fn test_nothing_to_do() {
        let settings = Settings::try_parse_from(["pipeline-route"]).unwrap();
        assert!(matches!(run(&settings), Err(CliError::NothingToDo)));
    }

    #[test]
    fn test_summary() {
        let mut buffer = Vec::new();
        write_output(&collection(), OutputFormat::Summary, &mut buffer).unwrap();
        let summary = String::from_utf8(buffer).unwrap();
        assert!(summary.contains("routes parsed:    2 (1 branched)"));
        assert!(summary.contains("routes rejected:  1"));
        assert!(summary.contains("segments dropped: 1"));
        assert!(summary.contains("points:           6"));
        assert!(summary.contains("EPSG:4087"));
        assert!(summary.contains("Branched\t2\t4\t"));
        assert!(summary.contains("\"Broken\""));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_summary_write_failure_is_reported() {
        let err = write_output(&collection(), OutputFormat::Summary, &mut ClosedPipe).unwrap_err();
        match err {
            CliError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::BrokenPipe),
            other => panic!("expected an IO error, got {other:?}"),
        }
    }

    #[test]
    fn test_geojson_output() {
        let mut buffer = Vec::new();
        write_output(&collection(), OutputFormat::Geojson, &mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["features"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_gpx_output() {
        let mut buffer = Vec::new();
        write_output(&collection(), OutputFormat::Gpx, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("<trk>"));
        assert!(text.contains("Branched"));
    }

    #[test]
    fn test_invalid_cli_route_fails() {
        let settings =
            Settings::try_parse_from(["pipeline-route", "--route", "10.0,50.0", "--label", "Stub"])
                .unwrap();
        assert!(matches!(
            load(&settings),
            Err(CliError::Route(RouteError::DegeneratePath { .. }))
        ));
    }

    #[test]
    fn test_load_table_file() {
        let path = std::env::temp_dir().join(format!("pipeline-route-{}.tsv", std::process::id()));
        std::fs::write(
            &path,
            "PipelineName\tRoute\nEast Line\t30,40:31,41\nNo Line\tTBD\n",
        )
        .unwrap();

        let settings = Settings::try_parse_from([
            "pipeline-route",
            "--tables",
            path.to_str().unwrap(),
            "--route",
            "1,2:3,4",
        ])
        .unwrap();
        let collection = load(&settings).unwrap();
        std::fs::remove_file(&path).unwrap();

        let names: Vec<&str> = collection.records().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["East Line", "route"]);
    }

    #[test]
    fn test_missing_table_reports_path() {
        let settings =
            Settings::try_parse_from(["pipeline-route", "-t", "/nonexistent/pipes.tsv"]).unwrap();
        let err = load(&settings).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pipes.tsv"));
    }
}
