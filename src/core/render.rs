// LogWeave - core/render.rs
//
// Document content generation: renders the filtered, grouped entries into
// the full text of the virtual document, applying display options
// (service-name column or emoji substitution, inline timestamps, GUID
// scrubbing).

use crate::core::model::{DisplayOptions, LogEntry};
use crate::util::constants;
use crate::util::error::PipelineError;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Service-name prefixes rendered with the desktop emoji when the
/// service-name column is hidden.
const DESKTOP_SERVICE_PREFIXES: &[&str] = &["MSTeams", "Teams", "Skype", "core/", "user-"];

fn guid_scrub_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
            .expect("render: invalid GUID regex")
    })
}

/// Render the filtered groups into the final document text.
///
/// Buckets with two or fewer entries hold only their markers and are
/// skipped. Markers render as their own line followed by a
/// blank line, matching the two-row accounting used during filtering.
pub fn render(
    filtered: &BTreeMap<i64, Vec<LogEntry>>,
    opts: &DisplayOptions,
    longest_service_name: usize,
    cancel: &AtomicBool,
) -> Result<String, PipelineError> {
    let mut out = String::new();

    for entries in filtered.values() {
        if cancel.load(Ordering::SeqCst) {
            return Err(PipelineError::Cancelled);
        }

        if entries.len() <= 2 {
            continue;
        }

        for entry in entries {
            if entry.is_marker {
                out.push_str(&entry.text);
                out.push_str("\n\n");
                continue;
            }

            out.push_str(&prefix_for(entry, opts, longest_service_name));
            out.push_str(&entry.text);
            out.push('\n');
        }
    }

    if opts.scrub_guids {
        out = guid_scrub_regex()
            .replace_all(&out, constants::GUID_PLACEHOLDER)
            .into_owned();
    }

    Ok(out)
}

/// Compose the per-line prefix from the display options.
fn prefix_for(entry: &LogEntry, opts: &DisplayOptions, longest_service_name: usize) -> String {
    let service = entry.service.as_deref().unwrap_or("");

    let mut prefix = if opts.file_names {
        format!("[{service:<longest_service_name$}] ")
    } else if service == constants::HAR_SERVICE {
        format!("{} ", constants::HAR_EMOJI)
    } else if DESKTOP_SERVICE_PREFIXES
        .iter()
        .any(|p| service.starts_with(p))
    {
        format!("{} ", constants::DESKTOP_EMOJI)
    } else {
        format!("{} ", constants::WEB_EMOJI)
    };

    if opts.inline_dates {
        prefix.push_str(&format!("[{}] ", entry.date.format("%H:%M:%S%.3f")));
    }

    prefix
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::LogLevel;
    use chrono::{TimeZone, Utc};

    fn bucket(texts: &[&str], service: &str) -> BTreeMap<i64, Vec<LogEntry>> {
        let date = Utc.with_ymd_and_hms(2024, 2, 8, 12, 0, 0).unwrap();
        let mut entries = vec![LogEntry::marker(date, "// 2024-02-08T12:00:00Z".to_string())];
        for text in texts {
            entries.push(LogEntry::new(
                date,
                text.to_string(),
                service.to_string(),
                None,
                LogLevel::Info,
            ));
        }
        entries.push(LogEntry::marker(date, "// ======".to_string()));
        let mut map = BTreeMap::new();
        map.insert(date.timestamp() * 1_000, entries);
        map
    }

    fn no_cancel() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn test_service_column_padded_to_longest_name() {
        let map = bucket(&["hello"], "Svc");
        let opts = DisplayOptions::default();
        let out = render(&map, &opts, 8, &no_cancel()).unwrap();
        assert!(out.contains("[Svc     ] hello"), "got: {out}");
    }

    #[test]
    fn test_marker_lines_followed_by_blank_line() {
        let map = bucket(&["hello"], "Svc");
        let out = render(&map, &DisplayOptions::default(), 3, &no_cancel()).unwrap();
        assert!(out.starts_with("// 2024-02-08T12:00:00Z\n\n"));
        assert!(out.ends_with("// ======\n\n"));
    }

    #[test]
    fn test_emoji_substitution_when_file_names_hidden() {
        let opts = DisplayOptions {
            file_names: false,
            ..Default::default()
        };
        let out = render(&bucket(&["x"], "HAR"), &opts, 3, &no_cancel()).unwrap();
        assert!(out.contains(&format!("{} x", constants::HAR_EMOJI)));

        let out = render(&bucket(&["x"], "MSTeams"), &opts, 3, &no_cancel()).unwrap();
        assert!(out.contains(&format!("{} x", constants::DESKTOP_EMOJI)));

        let out = render(&bucket(&["x"], "somewebsvc"), &opts, 3, &no_cancel()).unwrap();
        assert!(out.contains(&format!("{} x", constants::WEB_EMOJI)));
    }

    #[test]
    fn test_inline_dates_appended_for_non_markers_only() {
        let opts = DisplayOptions {
            inline_dates: true,
            ..Default::default()
        };
        let out = render(&bucket(&["x"], "Svc"), &opts, 3, &no_cancel()).unwrap();
        assert!(out.contains("[12:00:00.000] x"), "got: {out}");
        assert!(!out.contains("[12:00:00.000] //"), "markers must not get dates");
    }

    /// Markers-only buckets are skipped even if they reach the renderer.
    #[test]
    fn test_markers_only_bucket_skipped() {
        let map = bucket(&[], "Svc");
        let out = render(&map, &DisplayOptions::default(), 3, &no_cancel()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_guid_scrubbing_final_pass() {
        let opts = DisplayOptions {
            scrub_guids: true,
            ..Default::default()
        };
        let map = bucket(&["call 05f3f692-27ba-4a63-a862-cc66a146f3f3 done"], "Svc");
        let out = render(&map, &opts, 3, &no_cancel()).unwrap();
        assert!(out.contains(&format!("call {} done", constants::GUID_PLACEHOLDER)));
        assert!(!out.contains("05f3f692"));
    }

    #[test]
    fn test_render_cancelled() {
        let map = bucket(&["x"], "Svc");
        let cancel = AtomicBool::new(true);
        assert!(matches!(
            render(&map, &DisplayOptions::default(), 3, &cancel),
            Err(PipelineError::Cancelled)
        ));
    }
}
