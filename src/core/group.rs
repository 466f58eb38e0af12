// LogWeave - core/group.rs
//
// Second-granularity grouping: merges normal log entries and HAR entries
// into one chronologically sorted sequence, then buckets them into
// per-second groups bounded by fold-region marker pseudo-entries.
//
// The bucket map is a BTreeMap keyed by the second's epoch milliseconds,
// so iteration order is chronological — identical to the insertion order
// of the single sorted pass. Downstream rendering relies on this; an
// unordered hash map must never be substituted here.

use crate::core::model::LogEntry;
use crate::util::constants;
use crate::util::error::PipelineError;
use chrono::DateTime;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Static cleanup patterns removed from entry text during grouping.
/// The per-second fold header already shows the time, so inline
/// timestamps, hex process ids, and GUID-adjacent noise are stripped.
fn cleanup_regexes() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            // ISO timestamps with or without offset/Z suffix.
            r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}[.,]\d+(?:Z|[+-]\d{2}:\d{2})?\s?",
            // Hex process/thread ids.
            r"\b0x[0-9a-fA-F]{6,16}\b\s?",
            // Bracketed process-id noise adjacent to GUID-bearing lines.
            r"\s?<\d{4,6}>\s?",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("group: invalid cleanup regex"))
        .collect()
    })
}

/// Merge and bucket entries per second.
///
/// Each bucket starts with a `// <ISO-8601 second>` marker and ends with
/// a `// ======` marker, with the real entries in chronological order in
/// between. The cancel flag is checked each time a bucket is closed.
pub fn group_by_second(
    log_entries: &[LogEntry],
    har_entries: &[LogEntry],
    cancel: &AtomicBool,
) -> Result<BTreeMap<i64, Vec<LogEntry>>, PipelineError> {
    let mut merged: Vec<LogEntry> = Vec::with_capacity(log_entries.len() + har_entries.len());
    merged.extend_from_slice(log_entries);
    merged.extend_from_slice(har_entries);
    // Stable: entries within the same instant keep source order.
    merged.sort_by_key(|e| e.date);

    let mut grouped: BTreeMap<i64, Vec<LogEntry>> = BTreeMap::new();
    let mut current_second: Option<i64> = None;
    let mut bucket: Vec<LogEntry> = Vec::new();

    for entry in merged {
        let second = entry.date.timestamp();

        if current_second != Some(second) {
            if let Some(prev) = current_second {
                close_bucket(&mut grouped, prev, std::mem::take(&mut bucket));
                if cancel.load(Ordering::SeqCst) {
                    return Err(PipelineError::Cancelled);
                }
            }
            bucket.push(start_marker(second)?);
            current_second = Some(second);
        }

        let mut cleaned = entry;
        cleaned.text = clean_text(&cleaned.text);
        bucket.push(cleaned);
    }

    if let Some(last) = current_second {
        close_bucket(&mut grouped, last, bucket);
    }

    tracing::debug!(buckets = grouped.len(), "Entries grouped by second");
    Ok(grouped)
}

/// Append the end marker and commit the bucket under its millisecond key.
fn close_bucket(grouped: &mut BTreeMap<i64, Vec<LogEntry>>, second: i64, mut bucket: Vec<LogEntry>) {
    let date = DateTime::from_timestamp(second, 0).unwrap_or_else(constants::epoch_sentinel);
    bucket.push(LogEntry::marker(date, constants::END_MARKER.to_string()));
    grouped.insert(second * 1_000, bucket);
}

/// Build the fold-region start marker for a bucket second.
///
/// An unrepresentable second is a structural failure: it aborts the whole
/// render rather than emitting a malformed fold header.
fn start_marker(second: i64) -> Result<LogEntry, PipelineError> {
    let date = DateTime::from_timestamp(second, 0).ok_or_else(|| PipelineError::Group {
        reason: format!("cannot format bucket second {second}"),
    })?;
    let text = format!(
        "{}{}",
        constants::START_MARKER_PREFIX,
        date.format("%Y-%m-%dT%H:%M:%SZ")
    );
    Ok(LogEntry::marker(date, text))
}

/// Apply the cached static cleanup patterns to one entry's text.
fn clean_text(text: &str) -> String {
    let mut out = text.to_string();
    for re in cleanup_regexes() {
        if re.is_match(&out) {
            out = re.replace_all(&out, "").into_owned();
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
