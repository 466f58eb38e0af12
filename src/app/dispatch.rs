// LogWeave - app/dispatch.rs
//
// Command dispatch: maps UI-facing commands onto filter/display state
// changes and answers with lightweight status replies. Commands never
// touch the parsed-content caches; callers re-render through the
// provider after dispatching.

use crate::app::provider::ContentProvider;
use crate::core::model::LogLevel;
use chrono::{DateTime, Utc};

// =============================================================================
// Commands and replies
// =============================================================================

/// State-changing commands accepted by the dispatch table.
#[derive(Debug, Clone)]
pub enum Command {
    /// Add the keyword if absent, remove it if present.
    ToggleKeyword(String),

    /// Enable the level if currently disabled, disable it otherwise.
    ToggleLogLevel(LogLevel),

    /// Replace both time bounds. `None` for `from` restores the default
    /// lower bound; `None` for `till` removes the upper bound.
    SetTimeRange {
        from: Option<DateTime<Utc>>,
        till: Option<DateTime<Utc>>,
    },

    /// Anchor the time window on the earliest occurrence of the id, or
    /// clear the anchor when `None`.
    SetSessionId(Option<String>),

    /// Include or exclude one service's files from the document.
    SetFileEnabled { service: String, enabled: bool },

    /// Toggle one display option. Only invalidates the rendered view.
    ToggleDisplay(DisplayToggle),

    /// Request the per-service file list and active filter count.
    RequestSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayToggle {
    FileNames,
    InlineDates,
    SequenceNumbers,
    ScrubGuids,
}

/// Status replies produced by dispatching a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Number of filter dimensions currently active.
    ActiveFilterCount(usize),

    /// Per-service file counts with their enabled flags.
    FileList(Vec<(String, usize, bool)>),

    /// A command could not be applied; prior state is retained.
    Rejected(String),
}

// =============================================================================
// Dispatch
// =============================================================================

/// Apply one command to the provider's filter/display state.
///
/// Every dispatch answers with the resulting active filter count so the
/// caller can refresh its indicator without a second query.
pub fn dispatch(provider: &mut ContentProvider, command: Command) -> Vec<Reply> {
    let mut replies = Vec::new();

    match command {
        Command::ToggleKeyword(keyword) => {
            provider.filter.toggle_keyword(&keyword);
        }
        Command::ToggleLogLevel(level) => {
            provider.filter.toggle_level(level);
        }
        Command::SetTimeRange { from, till } => {
            provider.filter.set_time_range(from, till);
        }
        Command::SetSessionId(Some(session_id)) => {
            if let Err(e) = provider.apply_session_id(&session_id) {
                tracing::warn!(error = %e, "Session id rejected");
                replies.push(Reply::Rejected(e.to_string()));
            }
        }
        Command::SetSessionId(None) => {
            provider.filter.clear_session_id();
        }
        Command::SetFileEnabled { service, enabled } => {
            provider.filter.set_file_enabled(&service, enabled);
        }
        Command::ToggleDisplay(toggle) => {
            let opts = &mut provider.display;
            match toggle {
                DisplayToggle::FileNames => opts.file_names = !opts.file_names,
                DisplayToggle::InlineDates => opts.inline_dates = !opts.inline_dates,
                DisplayToggle::SequenceNumbers => {
                    opts.sequence_numbers = !opts.sequence_numbers;
                    // Sequence numbers are stamped at parse time, so this
                    // toggle is the one display change that reparses.
                    provider.reset_cache();
                }
                DisplayToggle::ScrubGuids => opts.scrub_guids = !opts.scrub_guids,
            }
        }
        Command::RequestSummary => {
            replies.push(Reply::FileList(provider.file_list()));
        }
    }

    replies.push(Reply::ActiveFilterCount(provider.filter.active_filter_count()));
    replies
}

// =============================================================================
// Tests
// =============================================================================
