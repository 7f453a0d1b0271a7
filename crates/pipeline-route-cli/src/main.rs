//! Pipeline Route - command-line front end
//!
//! Reads pipeline tracker tables (or a single route string), parses every route and
//! writes a summary, GeoJSON or GPX.

mod logging;
mod run;
mod settings;

use settings::Settings;

fn main() {
    let settings = Settings::from_cli();
    let guard = logging::setup_logging(&settings);

    let result = run::run(&settings);
    if let Err(e) = &result {
        tracing::error!("{e}");
    }

    // Flush profiling output before a possible early exit
    drop(guard);
    if result.is_err() {
        std::process::exit(1);
    }
}
