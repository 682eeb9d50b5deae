//! Clap command tree for the `trailstore` binary.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the full command tree.
pub fn build_cli() -> Command {
    Command::new("trailstore")
        .about("Inspect, query and build trailstore files")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print JSON lines instead of text"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Raise log level (-v info, -vv debug); RUST_LOG overrides"),
        )
        .subcommand(info_cmd())
        .subcommand(dump_cmd())
        .subcommand(find_cmd())
        .subcommand(timeline_cmd())
        .subcommand(sessions_cmd())
        .subcommand(build_cmd())
}

fn path_arg() -> Arg {
    Arg::new("path")
        .required(true)
        .help("Store file")
}

fn pairs_arg() -> Arg {
    Arg::new("pairs")
        .num_args(1..)
        .required(true)
        .value_name("FIELD=VALUE")
        .help("Field values that must appear together on one event")
}

// =========================================================================
// Reading
// =========================================================================

fn info_cmd() -> Command {
    Command::new("info")
        .about("Show store metadata")
        .arg(path_arg())
}

fn dump_cmd() -> Command {
    Command::new("dump")
        .about("Print the events of one or all trails")
        .arg(path_arg())
        .arg(
            Arg::new("trail")
                .long("trail")
                .value_parser(value_parser!(u64))
                .conflicts_with("key")
                .help("Only this trail index"),
        )
        .arg(
            Arg::new("key")
                .long("key")
                .value_name("HEX")
                .help("Only the trail of this 32-digit hex entity key"),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .short('f')
                .action(ArgAction::Append)
                .value_name("EXPR")
                .help("Clause of comma-separated field=value / field!=value terms; repeat to OR clauses"),
        )
}

fn find_cmd() -> Command {
    Command::new("find")
        .about("List trails with an event carrying every given value")
        .arg(path_arg())
        .arg(pairs_arg())
}

fn timeline_cmd() -> Command {
    Command::new("timeline")
        .about("Merge the events of matching trails in time order")
        .arg(path_arg())
        .arg(pairs_arg())
        .arg(
            Arg::new("batch")
                .long("batch")
                .value_parser(value_parser!(usize))
                .default_value("1024")
                .help("Events pulled from the merge at a time"),
        )
}

fn sessions_cmd() -> Command {
    Command::new("sessions")
        .about("Count sessions per trail")
        .arg(path_arg())
        .arg(
            Arg::new("gap")
                .long("gap")
                .value_parser(value_parser!(u64))
                .default_value("1800")
                .value_name("SECONDS")
                .help("Idle time that starts a new session"),
        )
}

// =========================================================================
// Writing
// =========================================================================

fn build_cmd() -> Command {
    Command::new("build")
        .about("Build a store from tab-separated key, timestamp and value columns")
        .arg(Arg::new("path").required(true).help("Store file to create"))
        .arg(
            Arg::new("fields")
                .long("fields")
                .required(true)
                .value_delimiter(',')
                .help("Comma-separated field names"),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .value_name("FILE")
                .help("Read records from FILE instead of stdin"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("TOML builder options"),
        )
}
