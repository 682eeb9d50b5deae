//! Executes parsed actions against stores.
//!
//! Everything is written to the given writer so tests can capture output.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use tracing::{debug, info};
use trailstore_core::Error;
use trailstore_query::{Cursor, EventFilter, FilterTerm, MultiCursor};
use trailstore_storage::{BuilderOptions, Store, StoreBuilder};

use crate::format::{
    format_event, format_info, format_sessions, format_summary, format_trail, OutputMode,
};
use crate::parse::{parse_record, CliAction, TrailSelector};

/// Failure of a CLI action.
#[derive(Debug)]
pub enum CliError {
    Store(Error),
    Io(std::io::Error),
    Input { line: usize, message: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Store(e) => write!(f, "{}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Input { line, message } => write!(f, "input line {}: {}", line, message),
        }
    }
}

impl From<Error> for CliError {
    fn from(e: Error) -> Self {
        CliError::Store(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

pub type CliResult<T> = Result<T, CliError>;

pub fn execute(action: CliAction, mode: OutputMode, out: &mut impl Write) -> CliResult<()> {
    match action {
        CliAction::Info { path } => {
            let store = Store::open(path)?;
            writeln!(out, "{}", format_info(&store, mode))?;
        }
        CliAction::Dump {
            path,
            trails,
            clauses,
        } => {
            let store = Store::open(path)?;
            dump(&store, &trails, &clauses, mode, out)?;
        }
        CliAction::Find { path, pairs } => {
            let store = Store::open(path)?;
            for trail in store.find_trails(pairs.as_slice())? {
                writeln!(out, "{}", format_trail(trail, &store.entity_key(trail)?, mode))?;
            }
        }
        CliAction::Timeline { path, pairs, batch } => {
            let store = Store::open(path)?;
            timeline(&store, &pairs, batch, mode, out)?;
        }
        CliAction::Sessions { path, gap } => {
            let store = Store::open(path)?;
            sessions(&store, gap, mode, out)?;
        }
        CliAction::Build {
            path,
            fields,
            input,
            config,
        } => {
            let options = match config {
                Some(config) => BuilderOptions::from_file(config)?,
                None => BuilderOptions::default(),
            };
            let mut builder = StoreBuilder::open_with(&path, fields.as_slice(), options)?;
            let reader: Box<dyn BufRead> = match input {
                Some(input) => Box::new(BufReader::new(File::open(input)?)),
                None => Box::new(std::io::stdin().lock()),
            };
            load_records(&mut builder, reader)?;
            let summary = builder.finalize()?;
            writeln!(out, "{}", format_summary(&summary, mode))?;
        }
    }
    Ok(())
}

fn dump(
    store: &Store,
    trails: &TrailSelector,
    clauses: &[Vec<FilterTerm>],
    mode: OutputMode,
    out: &mut impl Write,
) -> CliResult<()> {
    let selected: Vec<u64> = match trails {
        TrailSelector::All => (0..store.trail_count()).collect(),
        TrailSelector::Index(index) => vec![*index],
        TrailSelector::Key(key) => vec![store.entity_index(key)?],
    };

    let mut cursor = Cursor::new(store);
    if !clauses.is_empty() {
        cursor.set_filter(Arc::new(EventFilter::compile(store.dictionary(), clauses)));
    }
    for trail in selected {
        cursor.bind(trail)?;
        let key = store.entity_key(trail)?;
        while let Some(event) = cursor.next_event()? {
            writeln!(out, "{}", format_event(&key, &event, mode))?;
        }
    }
    Ok(())
}

fn timeline(
    store: &Store,
    pairs: &[(String, String)],
    batch: usize,
    mode: OutputMode,
    out: &mut impl Write,
) -> CliResult<()> {
    let trails = store.find_trails(pairs)?;
    let mut cursors = Vec::with_capacity(trails.len());
    for &trail in &trails {
        let mut cursor = Cursor::new(store);
        cursor.bind(trail)?;
        cursors.push(cursor);
    }
    debug!(trails = trails.len(), "Merging matching trails");

    let mut merge = MultiCursor::new(cursors)?;
    loop {
        let events = merge.next_batch(batch)?;
        if events.is_empty() {
            break;
        }
        for merged in &events {
            let key = store.entity_key(trails[merged.source])?;
            writeln!(out, "{}", format_event(&key, &merged.event, mode))?;
        }
    }
    Ok(())
}

/// Sessions in one trail: runs of events with no idle gap longer than `gap`.
fn count_sessions(cursor: &mut Cursor<'_>, gap: u64) -> trailstore_core::Result<(u64, u64)> {
    let mut events = 0u64;
    let mut sessions = 0u64;
    let mut previous = None;
    while let Some(ts) = cursor.next_timestamp()? {
        events += 1;
        match previous {
            Some(prev) if ts - prev <= gap => {}
            _ => sessions += 1,
        }
        previous = Some(ts);
    }
    Ok((events, sessions))
}

fn sessions(store: &Store, gap: u64, mode: OutputMode, out: &mut impl Write) -> CliResult<()> {
    let mut cursor = Cursor::new(store);
    for trail in 0..store.trail_count() {
        cursor.bind(trail)?;
        let (events, sessions) = count_sessions(&mut cursor, gap)?;
        writeln!(
            out,
            "{}",
            format_sessions(&store.entity_key(trail)?, events, sessions, mode)
        )?;
    }
    Ok(())
}

fn load_records(builder: &mut StoreBuilder, reader: impl BufRead) -> CliResult<()> {
    let mut loaded = 0u64;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (key, timestamp, values) = parse_record(&line).map_err(|message| CliError::Input {
            line: index + 1,
            message,
        })?;
        builder
            .add_event(key, timestamp, &values)
            .map_err(|e| CliError::Input {
                line: index + 1,
                message: e.to_string(),
            })?;
        loaded += 1;
    }
    info!(records = loaded, "Loaded input records");
    Ok(())
}
