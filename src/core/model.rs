// LogWeave - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// host-editor dependencies; these are the shared vocabulary across the
// whole pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// Log Entry (the atomic unit flowing through the pipeline)
// =============================================================================

/// A single normalised log event from any source (desktop log, web log,
/// HAR capture, or a synthetic fold-region marker).
///
/// Entries are immutable once created, except for the post-filter
/// `row_number` annotation used to map a document row back to an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Extracted timestamp in UTC, or the epoch sentinel
    /// (`1970-01-01T00:00:00Z`) when no timestamp was found.
    pub date: DateTime<Utc>,

    /// Normalised line content. May include a sequence-number prefix.
    pub text: String,

    /// Inferred logical source name (e.g. "MSTeams", "HAR"). Every
    /// non-marker entry belongs to exactly one service.
    pub service: Option<String>,

    /// Originating file, when applicable.
    pub file_path: Option<PathBuf>,

    /// True for synthetic fold-region boundary entries. Markers carry no
    /// real log content and no level.
    pub is_marker: bool,

    /// Classified severity. Defaults to Debug when no level token matches.
    /// Always `None` for markers.
    pub log_level: Option<LogLevel>,

    /// Assigned only after filtering; used for cursor/row mapping back
    /// into the rendered document.
    pub row_number: Option<usize>,
}

impl LogEntry {
    /// Build a real (non-marker) entry.
    pub fn new(
        date: DateTime<Utc>,
        text: String,
        service: String,
        file_path: Option<PathBuf>,
        log_level: LogLevel,
    ) -> Self {
        Self {
            date,
            text,
            service: Some(service),
            file_path,
            is_marker: false,
            log_level: Some(log_level),
            row_number: None,
        }
    }

    /// Build a synthetic fold-region boundary entry.
    pub fn marker(date: DateTime<Utc>, text: String) -> Self {
        Self {
            date,
            text,
            service: None,
            file_path: None,
            is_marker: true,
            log_level: None,
            row_number: None,
        }
    }
}

// =============================================================================
// Log level
// =============================================================================

/// Normalised severity levels in classification order: the parser tests
/// each level's pattern in this order and takes the first match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// All variants in classification order (first match wins).
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warning,
            LogLevel::Error,
        ]
    }

    /// Regex fragment matching this level's tokens in raw line text.
    ///
    /// Shared between the parser's classification pass and the filter
    /// engine's combined disabled-level regex so both agree on what a
    /// level token looks like.
    pub fn pattern(&self) -> &'static str {
        match self {
            LogLevel::Debug => r"(?i)<dbg>|\bdebug\b|\bverbose\b|\bdbg\b",
            LogLevel::Info => r"(?i)<info>|\binfo\b|\binf\b",
            LogLevel::Warning => r"(?i)<warn(?:ing)?>|\bwarn(?:ing)?\b",
            LogLevel::Error => r"(?i)<error>|\berror\b|\bfail(?:ed|ure)?\b|\bcritical\b",
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Service file grouping
// =============================================================================

/// On-disk files believed to belong to one logical producer, sorted by
/// descending filename-embedded timestamp once the group is large enough
/// to be worth sorting.
#[derive(Debug, Clone)]
pub struct ServiceFiles {
    /// Inferred service name (text before the first underscore in the
    /// possibly folder-prefixed filename).
    pub service_name: String,

    /// Files in this group.
    pub files: Vec<PathBuf>,
}

/// Output of the classification phase: service groups plus the longest
/// service name seen, used later for column alignment in rendering.
#[derive(Debug, Clone, Default)]
pub struct Classified {
    pub groups: Vec<ServiceFiles>,
    pub longest_service_name: usize,
}

// =============================================================================
// Display options
// =============================================================================

/// User-togglable rendering options. Changing any of these invalidates
/// only the rendered view, never the parsed-entry caches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DisplayOptions {
    /// Prefix each line with a padded `[service]` column instead of an emoji.
    pub file_names: bool,

    /// Append an inline `[HH:MM:SS.mmm]` UTC time to each non-marker line.
    pub inline_dates: bool,

    /// Prefix each parsed line with a zero-padded 7-digit sequence number.
    pub sequence_numbers: bool,

    /// Replace GUIDs in the rendered document with a placeholder token.
    pub scrub_guids: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            file_names: true,
            inline_dates: false,
            sequence_numbers: false,
            scrub_guids: false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_marker_has_no_level_or_service() {
        let date = Utc.with_ymd_and_hms(2024, 2, 8, 18, 11, 6).unwrap();
        let m = LogEntry::marker(date, "// ======".to_string());
        assert!(m.is_marker);
        assert!(m.log_level.is_none());
        assert!(m.service.is_none());
    }

    #[test]
    fn test_level_classification_order() {
        let order = LogLevel::all();
        assert_eq!(order[0], LogLevel::Debug);
        assert_eq!(order[3], LogLevel::Error);
    }
}
