// LogWeave - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

use chrono::{DateTime, Utc};

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogWeave";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LogWeave";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Discovery limits
// =============================================================================

/// Maximum number of log files ingested from one workspace scan.
pub const MAX_LOG_FILES: usize = 400;

/// Maximum number of HAR capture files parsed per workspace.
pub const MAX_HAR_FILES: usize = 5;

/// Maximum directory recursion depth during discovery.
pub const MAX_SCAN_DEPTH: usize = 10;

/// Include glob patterns for workspace log discovery.
pub const LOG_INCLUDE_PATTERNS: &[&str] = &["*.log", "*.txt"];

/// Glob pattern for HAR capture files.
pub const HAR_PATTERN: &str = "*.har";

/// Directory names never descended into during discovery.
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", ".git", "__pycache__"];

// =============================================================================
// Parsing limits
// =============================================================================

/// Line length (chars) above which a line is truncated. Corrupted or
/// null-byte-flooded lines longer than this would stall rendering.
pub const LINE_TRUNCATE_TRIGGER: usize = 4_000;

/// Length (chars) a truncated line is cut down to before the ellipsis.
pub const LINE_TRUNCATE_LENGTH: usize = 2_000;

/// Width of the zero-padded per-line sequence number prefix.
pub const SEQUENCE_NUMBER_WIDTH: usize = 7;

/// Minimum file count in a service group before the group is sorted by
/// filename-embedded timestamp. Smaller groups stay in discovery order;
/// content timestamps order them later anyway.
pub const GROUP_SORT_MIN_FILES: usize = 3;

// =============================================================================
// Rendering conventions
// =============================================================================
// The marker strings are a stable contract consumed by the companion
// folding-range feature. Do not change without versioning.

/// Prefix of every per-second fold-region start marker. The ISO-8601
/// second is appended at group time.
pub const START_MARKER_PREFIX: &str = "// ";

/// Fold-region end marker emitted after the last entry of each second.
pub const END_MARKER: &str = "// ======";

/// Replacement token for scrubbed GUIDs in rendered output.
pub const GUID_PLACEHOLDER: &str = "{guid}";

/// Emoji prefix for known desktop services when file names are hidden.
pub const DESKTOP_EMOJI: &str = "🖥";

/// Emoji prefix for HAR network entries when file names are hidden.
pub const HAR_EMOJI: &str = "🔗";

/// Fallback emoji prefix for web/unknown services.
pub const WEB_EMOJI: &str = "🌐";

/// Pseudo-service excluded from session-id anchoring scans.
pub const SUMMARY_SERVICE: &str = "summary";

/// Service name assigned to HAR-derived entries.
pub const HAR_SERVICE: &str = "HAR";

// =============================================================================
// Filtering
// =============================================================================

/// Default lower time bound: one millisecond after the epoch, so that
/// epoch-sentinel (timestamp-less) entries are excluded by default.
pub fn minimum_date() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1).unwrap_or(DateTime::UNIX_EPOCH)
}

/// The epoch sentinel assigned to lines with no parseable timestamp.
pub fn epoch_sentinel() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

// =============================================================================
// Watcher limits
// =============================================================================

/// How often the workspace watcher polls for file changes (ms).
pub const WATCH_POLL_INTERVAL_MS: u64 = 2_000;

/// How often the cancel flag is checked within each watcher poll sleep (ms).
pub const WATCH_CANCEL_CHECK_INTERVAL_MS: u64 = 100;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Persisted filter-selection file name (stored in the platform data dir).
pub const SESSION_FILE_NAME: &str = "filters.json";
