// LogWeave - app/provider.rs
//
// Content provider: owns all pipeline caches and drives regeneration
// end-to-end. A full regeneration walks the stages in order
//
//   Empty -> FileListLoaded -> EntriesParsed -> Grouped -> Filtered -> Rendered
//
// short-circuiting at any stage whose cache is already populated.
// File-system events invalidate the parsed-content caches wholesale;
// filter and display changes only invalidate the filtered view.
//
// Cancellation is polled between bounded units of work (per file, per
// bucket). A cancelled regeneration produces no output; caches committed
// before the cancellation point are kept, since each is idempotently
// rebuildable. Regeneration is not re-entrant: callers are expected to
// issue at most one regeneration at a time.

use crate::app::watcher::WatchEvent;
use crate::core::classify;
use crate::core::discovery;
use crate::core::filter::{self, FilterState};
use crate::core::group;
use crate::core::har;
use crate::core::model::{Classified, DisplayOptions, LogEntry};
use crate::core::parser;
use crate::core::render;
use crate::util::error::{FilterError, PipelineError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Orchestrates the aggregation pipeline over one workspace folder.
pub struct ContentProvider {
    workspace_root: PathBuf,

    /// Display options; changing them only invalidates the rendered view.
    pub display: DisplayOptions,

    /// Filter state; persists across regenerations until reset.
    pub filter: FilterState,

    // Stage caches, populated lazily and reset wholesale on file events.
    pub(crate) file_groups: Option<Classified>,
    pub(crate) har_paths: Vec<PathBuf>,
    pub(crate) log_entry_cache: Option<Vec<LogEntry>>,
    pub(crate) har_entry_cache: Option<Vec<LogEntry>>,
    pub(crate) grouped_cache: Option<BTreeMap<i64, Vec<LogEntry>>>,

    /// Previous successful render, kept visible after a failed or
    /// cancelled regeneration.
    pub(crate) last_rendered: Option<String>,

    /// Non-fatal warnings accumulated during the last regeneration.
    pub warnings: Vec<String>,
}

impl ContentProvider {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace_root,
            display: DisplayOptions::default(),
            filter: FilterState::default(),
            file_groups: None,
            har_paths: Vec::new(),
            log_entry_cache: None,
            har_entry_cache: None,
            grouped_cache: None,
            last_rendered: None,
            warnings: Vec::new(),
        }
    }

    /// Regenerate and return the full virtual-document content.
    ///
    /// On error or cancellation the previously rendered content (if any)
    /// remains available via `last_rendered`.
    pub fn provide_content(&mut self, cancel: &AtomicBool) -> Result<String, PipelineError> {
        self.warnings.clear();

        self.ensure_file_groups(cancel)?;
        self.ensure_log_entries(cancel)?;
        self.ensure_har_entries(cancel)?;
        self.ensure_grouped(cancel)?;

        let grouped = self.grouped_cache.get_or_insert_with(BTreeMap::new);

        let outcome = filter::apply(&self.filter, grouped, cancel)?;

        let longest = self
            .file_groups
            .as_ref()
            .map(|c| c.longest_service_name)
            .unwrap_or_default();
        let content = render::render(&outcome.groups, &self.display, longest, cancel)?;

        tracing::info!(
            buckets = outcome.groups.len(),
            rows = outcome.total_rows,
            bytes = content.len(),
            "Document regenerated"
        );

        self.last_rendered = Some(content.clone());
        Ok(content)
    }

    /// The previously rendered content, if any regeneration has succeeded.
    pub fn last_rendered(&self) -> Option<&str> {
        self.last_rendered.as_deref()
    }

    /// Clear every parsed-content cache. Used for file-system events and
    /// explicit reset; filter and display changes must NOT call this.
    pub fn reset_cache(&mut self) {
        self.file_groups = None;
        self.har_paths.clear();
        self.log_entry_cache = None;
        self.har_entry_cache = None;
        self.grouped_cache = None;
        tracing::debug!("Caches reset");
    }

    /// File-watcher events invalidate parsed content wholesale; the next
    /// regeneration rebuilds from disk.
    pub fn on_watch_event(&mut self, event: &WatchEvent) {
        tracing::debug!(?event, "Workspace change; resetting caches");
        self.reset_cache();
    }

    /// Anchor the time filter on the earliest cached entry mentioning
    /// `session_id`. Entries must have been parsed by a prior regeneration;
    /// against an empty cache this reports the id as not found.
    pub fn apply_session_id(&mut self, session_id: &str) -> Result<(), FilterError> {
        let entries: Vec<LogEntry> = self
            .log_entry_cache
            .iter()
            .flatten()
            .chain(self.har_entry_cache.iter().flatten())
            .cloned()
            .collect();
        self.filter.apply_session_id(session_id, &entries)
    }

    /// Per-service file counts and enabled flags for UI summaries.
    pub fn file_list(&self) -> Vec<(String, usize, bool)> {
        self.file_groups
            .iter()
            .flat_map(|c| &c.groups)
            .map(|g| {
                let enabled = self.filter.matches_file_filter(Some(&g.service_name));
                (g.service_name.clone(), g.files.len(), enabled)
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Pipeline stages
    // -------------------------------------------------------------------------

    fn ensure_file_groups(&mut self, cancel: &AtomicBool) -> Result<(), PipelineError> {
        if self.file_groups.is_some() {
            return Ok(());
        }

        let found = discovery::discover(&self.workspace_root, cancel)?;
        if cancel.load(Ordering::SeqCst) {
            return Err(PipelineError::Cancelled);
        }

        self.warnings.extend(found.warnings.iter().cloned());
        self.har_paths = found.har_files;
        self.file_groups = Some(classify::group_and_sort(&found.log_files));
        Ok(())
    }

    fn ensure_log_entries(&mut self, cancel: &AtomicBool) -> Result<(), PipelineError> {
        if self.log_entry_cache.is_some() {
            return Ok(());
        }

        let groups = self.file_groups.clone().unwrap_or_default();

        let mut entries: Vec<LogEntry> = Vec::new();
        let mut seq: u64 = 0;

        for group in &groups.groups {
            for path in &group.files {
                if cancel.load(Ordering::SeqCst) {
                    return Err(PipelineError::Cancelled);
                }

                let content = match std::fs::read_to_string(path) {
                    Ok(c) => c,
                    Err(e) => {
                        let msg = format!("Cannot read '{}': {e}", path.display());
                        tracing::warn!(warning = %msg, "Log file skipped");
                        self.warnings.push(msg);
                        continue;
                    }
                };

                let (parsed, next_seq) = parser::parse_content(
                    &content,
                    &group.service_name,
                    path,
                    seq,
                    &self.display,
                );
                seq = next_seq;
                entries.extend(parsed);
            }
        }

        tracing::debug!(entries = entries.len(), "Log entries parsed");
        self.log_entry_cache = Some(entries);
        Ok(())
    }

    fn ensure_har_entries(&mut self, cancel: &AtomicBool) -> Result<(), PipelineError> {
        if self.har_entry_cache.is_some() {
            return Ok(());
        }

        let (entries, har_warnings) = har::collect_entries(&self.har_paths, cancel)?;
        self.warnings
            .extend(har_warnings.iter().map(|w| w.to_string()));
        self.har_entry_cache = Some(entries);
        Ok(())
    }

    fn ensure_grouped(&mut self, cancel: &AtomicBool) -> Result<(), PipelineError> {
        if self.grouped_cache.is_some() {
            return Ok(());
        }

        let logs = self.log_entry_cache.as_deref().unwrap_or(&[]);
        let hars = self.har_entry_cache.as_deref().unwrap_or(&[]);

        self.grouped_cache = Some(group::group_by_second(logs, hars, cancel)?);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
