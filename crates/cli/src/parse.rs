//! ArgMatches → CliAction conversion, plus the small text grammars the
//! commands accept: `field=value` pairs, filter clauses and TSV records.

use clap::ArgMatches;
use std::path::PathBuf;
use trailstore_core::{EntityKey, Timestamp};
use trailstore_query::FilterTerm;

/// Which trails `dump` prints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailSelector {
    All,
    Index(u64),
    Key(EntityKey),
}

/// One fully parsed invocation.
#[derive(Debug)]
pub enum CliAction {
    Info {
        path: PathBuf,
    },
    Dump {
        path: PathBuf,
        trails: TrailSelector,
        clauses: Vec<Vec<FilterTerm>>,
    },
    Find {
        path: PathBuf,
        pairs: Vec<(String, String)>,
    },
    Timeline {
        path: PathBuf,
        pairs: Vec<(String, String)>,
        batch: usize,
    },
    Sessions {
        path: PathBuf,
        gap: u64,
    },
    Build {
        path: PathBuf,
        fields: Vec<String>,
        input: Option<PathBuf>,
        config: Option<PathBuf>,
    },
}

/// Convert clap ArgMatches into a CliAction.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (sub_name, m) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    let path = || -> Result<PathBuf, String> {
        m.get_one::<String>("path")
            .map(PathBuf::from)
            .ok_or_else(|| "missing store path".to_string())
    };

    match sub_name {
        "info" => Ok(CliAction::Info { path: path()? }),
        "dump" => {
            let trails = if let Some(&index) = m.get_one::<u64>("trail") {
                TrailSelector::Index(index)
            } else if let Some(hex) = m.get_one::<String>("key") {
                let key = EntityKey::from_hex(hex).map_err(|e| e.to_string())?;
                TrailSelector::Key(key)
            } else {
                TrailSelector::All
            };
            let clauses = m
                .get_many::<String>("filter")
                .into_iter()
                .flatten()
                .map(|expr| parse_clause(expr))
                .collect::<Result<_, _>>()?;
            Ok(CliAction::Dump {
                path: path()?,
                trails,
                clauses,
            })
        }
        "find" => Ok(CliAction::Find {
            path: path()?,
            pairs: pairs(m)?,
        }),
        "timeline" => Ok(CliAction::Timeline {
            path: path()?,
            pairs: pairs(m)?,
            batch: m.get_one::<usize>("batch").copied().unwrap_or(1024).max(1),
        }),
        "sessions" => Ok(CliAction::Sessions {
            path: path()?,
            gap: m.get_one::<u64>("gap").copied().unwrap_or(1800),
        }),
        "build" => Ok(CliAction::Build {
            path: path()?,
            fields: m
                .get_many::<String>("fields")
                .into_iter()
                .flatten()
                .cloned()
                .collect(),
            input: m.get_one::<String>("input").map(PathBuf::from),
            config: m.get_one::<String>("config").map(PathBuf::from),
        }),
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn pairs(m: &ArgMatches) -> Result<Vec<(String, String)>, String> {
    m.get_many::<String>("pairs")
        .into_iter()
        .flatten()
        .map(|p| parse_pair(p))
        .collect()
}

// =========================================================================
// Grammars
// =========================================================================

/// `field=value`; the value may be empty and may itself contain `=`.
pub fn parse_pair(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => Err(format!("expected FIELD=VALUE, got '{}'", text)),
    }
}

/// `field=value` or `field!=value`
pub fn parse_term(text: &str) -> Result<FilterTerm, String> {
    let eq = text
        .find('=')
        .ok_or_else(|| format!("expected FIELD=VALUE or FIELD!=VALUE, got '{}'", text))?;
    let (field, negated) = match text[..eq].strip_suffix('!') {
        Some(field) => (field, true),
        None => (&text[..eq], false),
    };
    if field.is_empty() {
        return Err(format!("missing field name in '{}'", text));
    }
    let value = &text[eq + 1..];
    Ok(if negated {
        FilterTerm::ne(field, value)
    } else {
        FilterTerm::eq(field, value)
    })
}

/// Comma-separated terms that must all hold
pub fn parse_clause(expr: &str) -> Result<Vec<FilterTerm>, String> {
    expr.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(parse_term)
        .collect()
}

/// One input record: `key<TAB>timestamp<TAB>value...`
pub fn parse_record(line: &str) -> Result<(EntityKey, Timestamp, Vec<&str>), String> {
    let mut columns = line.split('\t');
    let key = columns
        .next()
        .filter(|k| !k.is_empty())
        .ok_or("missing key column")?;
    let key = EntityKey::from_hex(key.trim()).map_err(|e| e.to_string())?;
    let timestamp = columns
        .next()
        .ok_or("missing timestamp column")?
        .trim()
        .parse::<Timestamp>()
        .map_err(|e| format!("bad timestamp: {}", e))?;
    Ok((key, timestamp, columns.collect()))
}
