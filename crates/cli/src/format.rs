//! Output formatting for human-readable text and JSON lines.

use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::json;
use trailstore_core::{EntityKey, Timestamp};
use trailstore_query::Event;
use trailstore_storage::{Store, StoreSummary};

/// Output mode for formatting results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Timestamp as seconds since the epoch, with its UTC rendering when it fits.
pub fn format_timestamp(ts: Timestamp) -> String {
    let utc = i64::try_from(ts)
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    match utc {
        Some(time) => format!("{} ({})", ts, time.to_rfc3339_opts(SecondsFormat::Secs, true)),
        None => ts.to_string(),
    }
}

pub fn format_info(store: &Store, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({
            "path": store.path().display().to_string(),
            "version": store.version(),
            "compressed": store.is_compressed(),
            "fields": store.field_names(),
            "trails": store.trail_count(),
            "events": store.event_count(),
            "min_timestamp": store.min_timestamp(),
            "max_timestamp": store.max_timestamp(),
        })
        .to_string(),
        OutputMode::Human => {
            let mut lines = vec![
                format!("path:       {}", store.path().display()),
                format!(
                    "version:    {}{}",
                    store.version(),
                    if store.is_compressed() { " (zstd)" } else { "" }
                ),
                format!("trails:     {}", store.trail_count()),
                format!("events:     {}", store.event_count()),
                format!("first:      {}", format_timestamp(store.min_timestamp())),
                format!("last:       {}", format_timestamp(store.max_timestamp())),
                "fields:".to_string(),
            ];
            let dict = store.dictionary();
            for name in store.field_names() {
                let values = store
                    .field_id(name)
                    .map(|id| dict.lexicon_len(id).saturating_sub(1))
                    .unwrap_or(0);
                lines.push(format!("  {:<20} {} values", name, values));
            }
            lines.join("\n")
        }
    }
}

pub fn format_event(key: &EntityKey, event: &Event<'_>, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({
            "key": key.to_string(),
            "time": event.timestamp(),
            "fields": event.as_map(),
        })
        .to_string(),
        OutputMode::Human => format!("{} {}", key, event),
    }
}

pub fn format_trail(trail: u64, key: &EntityKey, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({ "trail": trail, "key": key.to_string() }).to_string(),
        OutputMode::Human => format!("{}\t{}", trail, key),
    }
}

pub fn format_sessions(
    key: &EntityKey,
    events: u64,
    sessions: u64,
    mode: OutputMode,
) -> String {
    match mode {
        OutputMode::Json => json!({
            "key": key.to_string(),
            "events": events,
            "sessions": sessions,
        })
        .to_string(),
        OutputMode::Human => format!("{}\t{}\t{}", key, events, sessions),
    }
}

pub fn format_summary(summary: &StoreSummary, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({
            "path": summary.path.display().to_string(),
            "trails": summary.trail_count,
            "events": summary.event_count,
            "fields": summary.field_count,
            "bytes": summary.bytes_written,
        })
        .to_string(),
        OutputMode::Human => format!(
            "wrote {}: {} trails, {} events, {} bytes",
            summary.path.display(),
            summary.trail_count,
            summary.event_count,
            summary.bytes_written
        ),
    }
}
