//! trailstore CLI - inspect, query and build trailstore files.
//!
//! ```text
//! trailstore info visits.trl
//! trailstore dump visits.trl --trail 0 -f "action=click,page!=/home"
//! trailstore find visits.trl action=purchase
//! trailstore timeline visits.trl country=fi --json
//! trailstore sessions visits.trl --gap 600
//! trailstore build visits.trl --fields action,page,country < visits.tsv
//! ```

mod commands;
mod format;
mod parse;
mod run;

use std::process;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::OutputMode;
use parse::matches_to_action;

fn main() {
    let cli = build_cli();
    let matches = cli.get_matches();

    init_tracing(matches.get_count("verbose"));

    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("(error) {}", e);
            process::exit(1);
        }
    };

    let mut out = std::io::stdout().lock();
    if let Err(e) = run::execute(action, mode, &mut out) {
        eprintln!("(error) {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}
