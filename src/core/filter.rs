// LogWeave - core/filter.rs
//
// Multi-dimensional filter engine: keyword include-list, disabled log
// levels, time range, session-id anchor, and per-file enable/disable.
// Dimensions are AND-combined; keywords are OR-combined within their
// dimension. Core layer: pure logic, no I/O.

use crate::core::model::{LogEntry, LogLevel};
use crate::util::constants;
use crate::util::error::{FilterError, PipelineError};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

// =============================================================================
// Filter state
// =============================================================================

/// Complete filter state. Persists across regenerations until explicitly
/// reset; only the *selections* are ever persisted to disk, never parsed
/// content.
#[derive(Debug, Clone)]
pub struct FilterState {
    /// Inclusive lower time bound. Defaults to just after the epoch so
    /// epoch-sentinel (timestamp-less) entries are excluded by default.
    pub time_from: Option<DateTime<Utc>>,

    /// Inclusive upper time bound. None = open.
    pub time_till: Option<DateTime<Utc>>,

    /// OR'd include list. Keywords are treated as raw regex fragments —
    /// deliberately unescaped so power users can enter patterns. An empty
    /// list means no keyword filtering.
    pub keywords: Vec<String>,

    /// Levels excluded from the rendered document.
    pub disabled_levels: Vec<LogLevel>,

    /// Per-service toggle. Absent = enabled; present = the stored flag.
    pub disabled_files: HashMap<String, bool>,

    /// When set, `time_from` has been anchored to the earliest entry
    /// containing this id, minus one second.
    pub session_id: Option<String>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            time_from: Some(constants::minimum_date()),
            time_till: None,
            keywords: Vec::new(),
            disabled_levels: Vec::new(),
            disabled_files: HashMap::new(),
            session_id: None,
        }
    }
}

impl FilterState {
    /// Number of active filter dimensions, reported back to the UI.
    pub fn active_filter_count(&self) -> usize {
        let mut count = self.keywords.len() + self.disabled_levels.len();
        if self.time_till.is_some() {
            count += 1;
        }
        if self.time_from.is_some_and(|f| f > constants::minimum_date()) {
            count += 1;
        }
        count += self
            .disabled_files
            .values()
            .filter(|enabled| !**enabled)
            .count();
        count
    }

    /// Add or remove a keyword fragment.
    pub fn toggle_keyword(&mut self, keyword: &str) {
        match self.keywords.iter().position(|k| k == keyword) {
            Some(idx) => {
                self.keywords.remove(idx);
            }
            None => self.keywords.push(keyword.to_string()),
        }
    }

    /// Enable or disable one log level.
    pub fn toggle_level(&mut self, level: LogLevel) {
        match self.disabled_levels.iter().position(|l| *l == level) {
            Some(idx) => {
                self.disabled_levels.remove(idx);
            }
            None => self.disabled_levels.push(level),
        }
    }

    /// Set the per-service enabled flag.
    pub fn set_file_enabled(&mut self, service: &str, enabled: bool) {
        self.disabled_files.insert(service.to_string(), enabled);
    }

    /// Anchor the lower time bound to the earliest cached entry containing
    /// `session_id`, minus one second. Entries from the summary
    /// pseudo-service and epoch-sentinel entries are excluded from the
    /// scan. On no match the filter is NOT applied and prior state is
    /// retained.
    pub fn apply_session_id(
        &mut self,
        session_id: &str,
        entries: &[LogEntry],
    ) -> Result<(), FilterError> {
        let earliest = entries
            .iter()
            .filter(|e| {
                !e.is_marker
                    && e.date != constants::epoch_sentinel()
                    && e.service.as_deref() != Some(constants::SUMMARY_SERVICE)
                    && e.text.contains(session_id)
            })
            .map(|e| e.date)
            .min();

        match earliest {
            Some(date) => {
                self.session_id = Some(session_id.to_string());
                self.time_from = Some(date - Duration::seconds(1));
                tracing::debug!(session_id, from = %date, "Session id anchored");
                Ok(())
            }
            None => Err(FilterError::SessionIdNotFound {
                session_id: session_id.to_string(),
            }),
        }
    }

    /// Replace both time bounds. A `None` lower bound restores the default
    /// minimum; setting explicit bounds drops any session anchor.
    pub fn set_time_range(&mut self, from: Option<DateTime<Utc>>, till: Option<DateTime<Utc>>) {
        self.session_id = None;
        self.time_from = from.or_else(|| Some(constants::minimum_date()));
        self.time_till = till;
    }

    /// Drop the session anchor and restore the default lower bound.
    pub fn clear_session_id(&mut self) {
        self.session_id = None;
        self.time_from = Some(constants::minimum_date());
    }

    /// Bucket-level time check: the whole second survives iff
    /// `from ≤ timestamp ≤ till` for the open bounds that are set.
    pub fn matches_time_filter(&self, timestamp: DateTime<Utc>) -> bool {
        if self.time_from.is_some_and(|from| timestamp < from) {
            return false;
        }
        if self.time_till.is_some_and(|till| timestamp > till) {
            return false;
        }
        true
    }

    /// OR-combine the keyword fragments into one regex. Fragments that do
    /// not compile are skipped with a warning rather than failing the
    /// whole pass. None = no keyword filtering.
    fn keyword_regex(&self) -> Option<Regex> {
        if self.keywords.is_empty() {
            return None;
        }
        let valid: Vec<&str> = self
            .keywords
            .iter()
            .filter(|k| {
                if Regex::new(k).is_ok() {
                    true
                } else {
                    tracing::warn!(keyword = %k, "Keyword is not a valid regex fragment, skipped");
                    false
                }
            })
            .map(|k| k.as_str())
            .collect();
        if valid.is_empty() {
            return None;
        }
        Regex::new(&format!("(?:{})", valid.join(")|(?:"))).ok()
    }

    /// Combined disable-regex over the disabled levels' token patterns,
    /// rebuilt each filter pass.
    fn disabled_level_regex(&self) -> Option<Regex> {
        if self.disabled_levels.is_empty() {
            return None;
        }
        let joined = self
            .disabled_levels
            .iter()
            .map(|l| format!("(?:{})", l.pattern()))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&joined).ok()
    }

    /// Survives iff no explicit disable entry exists for the service, or
    /// the explicit entry says enabled.
    pub fn matches_file_filter(&self, service: Option<&str>) -> bool {
        match service.and_then(|s| self.disabled_files.get(s)) {
            Some(enabled) => *enabled,
            None => true,
        }
    }
}

// =============================================================================
// Filter application
// =============================================================================

/// Result of one filter pass over the grouped entries.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    /// Surviving buckets with `row_number` assigned to every entry.
    pub groups: BTreeMap<i64, Vec<LogEntry>>,

    /// Total rendered rows (markers count as two rows each, accounting
    /// for the blank line conventionally rendered around them).
    pub total_rows: usize,
}

/// Evaluate every bucket against the filter state.
///
/// Markers always survive so fold boundaries stay intact, but a bucket
/// whose only survivors are its two markers is dropped entirely — an
/// all-filtered second must not render an empty fold region — and its
/// row-number bookkeeping is rolled back. Implemented as "zero non-marker
/// survivors" so the rule stays correct if multi-marker buckets are ever
/// introduced.
pub fn apply(
    state: &FilterState,
    grouped: &BTreeMap<i64, Vec<LogEntry>>,
    cancel: &AtomicBool,
) -> Result<FilterOutcome, PipelineError> {
    let keyword_re = state.keyword_regex();
    let disabled_re = state.disabled_level_regex();

    let mut outcome = FilterOutcome::default();
    let mut row: usize = 0;

    for (key, entries) in grouped {
        if cancel.load(Ordering::SeqCst) {
            return Err(PipelineError::Cancelled);
        }

        let bucket_time = DateTime::from_timestamp_millis(*key)
            .unwrap_or_else(constants::epoch_sentinel);
        if !state.matches_time_filter(bucket_time) {
            continue;
        }

        let row_at_bucket_start = row;
        let mut survivors: Vec<LogEntry> = Vec::new();
        let mut real_survivors = 0usize;

        for entry in entries {
            let survives = entry.is_marker
                || (matches_keyword(&entry.text, keyword_re.as_ref())
                    && matches_log_level(&entry.text, disabled_re.as_ref())
                    && state.matches_file_filter(entry.service.as_deref()));
            if !survives {
                continue;
            }

            let mut kept = entry.clone();
            kept.row_number = Some(row);
            row += if kept.is_marker { 2 } else { 1 };
            if !kept.is_marker {
                real_survivors += 1;
            }
            survivors.push(kept);
        }

        if real_survivors == 0 {
            row = row_at_bucket_start;
            continue;
        }

        outcome.groups.insert(*key, survivors);
    }

    outcome.total_rows = row;
    Ok(outcome)
}

/// Survives iff the keyword list is empty or the OR-combined regex matches.
fn matches_keyword(text: &str, keyword_re: Option<&Regex>) -> bool {
    keyword_re.map_or(true, |re| re.is_match(text))
}

/// Survives iff no disabled-level pattern matches the text.
fn matches_log_level(text: &str, disabled_re: Option<&Regex>) -> bool {
    disabled_re.map_or(true, |re| !re.is_match(text))
}

// =============================================================================
// Tests
// =============================================================================
