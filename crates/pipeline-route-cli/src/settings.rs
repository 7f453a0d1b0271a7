use clap::{Parser, ValueEnum};
use pipeline_route_lib::{BranchPolicy, Config, DEFAULT_SENTINELS, SourceConfig};
use std::path::PathBuf;

/// What to write once all routes are parsed
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable statistics and per-route table
    Summary,
    /// GeoJSON FeatureCollection
    Geojson,
    /// GPX 1.1 with one track per route
    Gpx,
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Pipeline Route - Parse pipeline route strings from tracker tables and export them as geometry
pub struct Settings {
    /// Delimited tables (TSV by default) to load
    #[clap(short, long, value_name = "FILE")]
    pub tables: Vec<PathBuf>,

    /// A single route string to parse, e.g. "10.0,50.0:11.0,51.0"
    #[clap(short, long, value_name = "ROUTE")]
    pub route: Option<String>,

    /// Label for --route, used in diagnostics and output
    #[clap(long, default_value = "route")]
    pub label: String,

    /// Field separator of the tables
    #[clap(long, default_value_t = '\t')]
    pub separator: char,

    /// Header of the column holding the route name
    #[clap(long, default_value = "PipelineName")]
    pub label_column: String,

    /// Header of the column holding the route string
    #[clap(long, default_value = "Route")]
    pub route_column: String,

    /// Extra route values meaning "no route available" (repeatable)
    #[clap(long, value_name = "VALUE")]
    pub sentinel: Vec<String>,

    /// Reject a branched route when any of its segments fails, instead of dropping the segment
    #[clap(long, default_value = "false")]
    pub strict_branches: bool,

    /// Output format
    #[clap(short, long, value_enum, default_value_t = OutputFormat::Summary)]
    pub format: OutputFormat,

    /// Write output to this file instead of stdout
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Record a Chrome trace of the run into this file
    #[cfg(feature = "profiling")]
    #[clap(long, value_name = "FILE")]
    pub trace_file: Option<PathBuf>,
}

impl Settings {
    /// Parse from the command line, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    pub fn collection_config(&self) -> Config {
        Config {
            branch_policy: if self.strict_branches {
                BranchPolicy::Strict
            } else {
                BranchPolicy::BestEffort
            },
            ..Config::default()
        }
    }

    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            separator: self.separator,
            label_column: self.label_column.clone(),
            route_column: self.route_column.clone(),
            sentinels: DEFAULT_SENTINELS
                .iter()
                .map(|s| s.to_string())
                .chain(self.sentinel.iter().cloned())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_parse_from(["pipeline-route", "-t", "pipes.tsv"]).unwrap();
        assert_eq!(settings.tables, vec![PathBuf::from("pipes.tsv")]);
        assert_eq!(settings.separator, '\t');
        assert_eq!(settings.format, OutputFormat::Summary);
        assert_eq!(
            settings.collection_config().branch_policy,
            BranchPolicy::BestEffort
        );

        let source = settings.source_config();
        assert_eq!(source.label_column, "PipelineName");
        assert_eq!(source.route_column, "Route");
        assert_eq!(source.sentinels.len(), DEFAULT_SENTINELS.len());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::try_parse_from([
            "pipeline-route",
            "--separator",
            ",",
            "--route-column",
            "WKTFormat",
            "--sentinel",
            "Not found",
            "--strict-branches",
            "--format",
            "geojson",
        ])
        .unwrap();
        assert_eq!(settings.separator, ',');
        assert_eq!(settings.format, OutputFormat::Geojson);
        assert_eq!(settings.collection_config().branch_policy, BranchPolicy::Strict);

        let source = settings.source_config();
        assert_eq!(source.route_column, "WKTFormat");
        assert_eq!(source.sentinels.last().map(String::as_str), Some("Not found"));
    }
}
