// LogWeave - app/session.rs
//
// Session persistence: save and restore the workspace path, filter
// selections, and display options between runs.
//
// Design principles:
// - The session is saved atomically (write→temp, rename→final) so a crash
//   during save never corrupts the previous good file.
// - Load errors are silently discarded: a corrupt or incompatible file
//   just means starting with default filters.
// - Parsed entries are never persisted; the workspace is re-read on
//   restore so the document always reflects current file content.

use crate::core::filter::FilterState;
use crate::core::model::{DisplayOptions, LogLevel};
use crate::util::constants::SESSION_FILE_NAME;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Version stamp for forward-compatibility checks.
///
/// Increment whenever `SessionData` changes shape in a breaking way.
/// Version mismatches silently discard the file.
pub const SESSION_VERSION: u32 = 1;

// =============================================================================
// On-disk data structures
// =============================================================================

/// Complete persistent session snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionData {
    /// Schema version, must equal `SESSION_VERSION` to be accepted.
    pub version: u32,

    /// Workspace folder aggregated in the last session.
    pub workspace_root: Option<PathBuf>,

    /// Filter selections, the serialisable subset of `FilterState`.
    pub filter: PersistedFilter,

    /// Display options, restored verbatim.
    #[serde(default)]
    pub display: DisplayOptions,
}

/// Serialisable snapshot of `FilterState`.
///
/// Compiled regexes are runtime-only and re-derived on restore.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PersistedFilter {
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub disabled_levels: Vec<LogLevel>,

    /// Per-service enabled flags as `(service, enabled)` pairs.
    #[serde(default)]
    pub disabled_files: Vec<(String, bool)>,

    #[serde(default)]
    pub time_from: Option<DateTime<Utc>>,

    #[serde(default)]
    pub time_till: Option<DateTime<Utc>>,

    /// The session anchor is persisted as the raw id; the derived
    /// `time_from` above already reflects it.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl PersistedFilter {
    pub fn from_state(state: &FilterState) -> Self {
        Self {
            keywords: state.keywords.clone(),
            disabled_levels: state.disabled_levels.clone(),
            disabled_files: state
                .disabled_files
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            time_from: state.time_from,
            time_till: state.time_till,
            session_id: state.session_id.clone(),
        }
    }

    pub fn into_state(self) -> FilterState {
        let mut state = FilterState::default();
        state.keywords = self.keywords;
        state.disabled_levels = self.disabled_levels;
        state.disabled_files = self.disabled_files.into_iter().collect();
        if let Some(from) = self.time_from {
            state.time_from = Some(from);
        }
        state.time_till = self.time_till;
        state.session_id = self.session_id;
        state
    }
}

// =============================================================================
// I/O helpers
// =============================================================================

/// Resolve the session file path from the platform data directory.
pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE_NAME)
}

/// Save `data` to `path` atomically (write temp → rename).
///
/// Creates parent directories as needed. Returns a descriptive error
/// string; callers typically log it and carry on.
pub fn save(data: &SessionData, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            format!(
                "cannot create session directory '{}': {e}",
                parent.display()
            )
        })?;
    }

    let json = serde_json::to_string_pretty(data)
        .map_err(|e| format!("failed to serialise session: {e}"))?;

    // A crash between write and rename loses the new session but never
    // corrupts the previous one.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json.as_bytes())
        .map_err(|e| format!("failed to write session temp file '{}': {e}", tmp.display()))?;

    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        format!("failed to finalise session file '{}': {e}", path.display())
    })?;

    tracing::debug!(path = %path.display(), "Session saved");
    Ok(())
}

/// Load and validate a `SessionData` from `path`.
///
/// Returns `None` on any error (file not found, JSON parse failure,
/// version mismatch). The caller treats `None` as "start fresh".
pub fn load(path: &Path) -> Option<SessionData> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "Cannot read session file");
            }
        })
        .ok()?;

    let data: SessionData = serde_json::from_str(&content)
        .map_err(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Session file is malformed — starting fresh"
            );
        })
        .ok()?;

    if data.version != SESSION_VERSION {
        tracing::warn!(
            found = data.version,
            expected = SESSION_VERSION,
            "Session file version mismatch — starting fresh"
        );
        return None;
    }

    tracing::info!(path = %path.display(), "Session file loaded");
    Some(data)
}

// =============================================================================
// Unit tests
// =============================================================================
