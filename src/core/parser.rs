// LogWeave - core/parser.rs
//
// Per-line log parsing: text normalisation, timestamp extraction, level
// classification, stutter suppression, and optional sequence numbering.
// Core layer: accepts file content as a string, never touches the
// filesystem.

use crate::core::model::{DisplayOptions, LogEntry, LogLevel};
use crate::core::timestamp;
use crate::util::constants;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Ordered literal replacements applied to file content before splitting.
/// De-noises known verbose prefixes that add nothing to a merged timeline.
const STATIC_REPLACEMENTS: &[(&str, &str)] = &[
    ("AuthenticationService: [Auth] ", "[Auth] "),
    ("TelemetryService: [Telemetry] ", "[Telemetry] "),
    ("\u{0000}", ""),
];

fn level_classifiers() -> &'static Vec<(LogLevel, Regex)> {
    static CLASSIFIERS: OnceLock<Vec<(LogLevel, Regex)>> = OnceLock::new();
    CLASSIFIERS.get_or_init(|| {
        LogLevel::all()
            .iter()
            .map(|level| {
                (
                    *level,
                    Regex::new(level.pattern()).expect("parser: invalid level regex"),
                )
            })
            .collect()
    })
}

/// Parse one file's content into normalised entries.
///
/// Per line: truncation of pathologically long lines, timestamp
/// extraction, consecutive-duplicate and empty-line skipping, first-match
/// level classification (debug → info → warning → error, default debug),
/// and an optional zero-padded sequence-number prefix. Input line order
/// is preserved; the grouping stage re-sorts globally by date.
///
/// Returns the parsed entries and the next sequence number.
pub fn parse_content(
    content: &str,
    service_name: &str,
    file_path: &Path,
    starting_seq: u64,
    opts: &DisplayOptions,
) -> (Vec<LogEntry>, u64) {
    let mut normalised = content.to_string();
    for (from, to) in STATIC_REPLACEMENTS {
        if normalised.contains(from) {
            normalised = normalised.replace(from, to);
        }
    }

    let mut entries = Vec::new();
    let mut seq = starting_seq;
    let mut previous_line: Option<String> = None;

    for line in normalised.lines() {
        if line.trim().is_empty() {
            continue;
        }

        // Stutter suppression: skip exact duplicates of the immediately
        // preceding line only. Identical lines separated by a distinct
        // line both survive.
        if previous_line.as_deref() == Some(line) {
            continue;
        }
        previous_line = Some(line.to_string());

        let truncated = truncate_line(line);
        let date = timestamp::extract_date(&truncated);
        let level = classify_level(&truncated);

        let text = if opts.sequence_numbers {
            format!(
                "{seq:0width$} {truncated}",
                width = constants::SEQUENCE_NUMBER_WIDTH
            )
        } else {
            truncated
        };
        seq += 1;

        entries.push(LogEntry::new(
            date,
            text,
            service_name.to_string(),
            Some(file_path.to_path_buf()),
            level,
        ));
    }

    tracing::trace!(
        file = %file_path.display(),
        service = service_name,
        entries = entries.len(),
        "File parsed"
    );

    (entries, seq)
}

/// Truncate lines longer than the trigger length. Corrupted or null-byte
/// flooded lines can otherwise stall downstream rendering.
fn truncate_line(line: &str) -> String {
    if line.chars().count() > constants::LINE_TRUNCATE_TRIGGER {
        let mut cut: String = line.chars().take(constants::LINE_TRUNCATE_LENGTH).collect();
        cut.push('…');
        cut
    } else {
        line.to_string()
    }
}

/// Classify severity by testing each level's pattern in fixed order and
/// taking the first match. Lines with no level token default to debug.
pub fn classify_level(text: &str) -> LogLevel {
    for (level, re) in level_classifiers() {
        if re.is_match(text) {
            return *level;
        }
    }
    LogLevel::Debug
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(content: &str) -> Vec<LogEntry> {
        parse_content(
            content,
            "TestSvc",
            &PathBuf::from("test.log"),
            0,
            &DisplayOptions::default(),
        )
        .0
    }

    #[test]
    fn test_consecutive_duplicates_collapse_to_one() {
        let entries = parse("same line\nsame line\n");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_separated_duplicates_both_survive() {
        let entries = parse("same line\nother line\nsame line\n");
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let entries = parse("first\n\n   \nsecond\n");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_level_classification_first_match_wins() {
        // Contains both a debug and an error token; debug is tested first.
        assert_eq!(classify_level("debug trace of error path"), LogLevel::Debug);
        assert_eq!(classify_level("request failed badly"), LogLevel::Error);
        assert_eq!(classify_level("<WARN> disk nearly full"), LogLevel::Warning);
        assert_eq!(classify_level("Info: session ready"), LogLevel::Info);
    }

    #[test]
    fn test_default_level_is_debug() {
        assert_eq!(classify_level("nothing notable here"), LogLevel::Debug);
    }

    #[test]
    fn test_long_line_truncated_with_ellipsis() {
        let long = "x".repeat(5_000);
        let entries = parse(&long);
        assert_eq!(entries.len(), 1);
        let count = entries[0].text.chars().count();
        assert_eq!(count, constants::LINE_TRUNCATE_LENGTH + 1);
        assert!(entries[0].text.ends_with('…'));
    }

    #[test]
    fn test_line_at_trigger_length_not_truncated() {
        let line = "y".repeat(constants::LINE_TRUNCATE_TRIGGER);
        let entries = parse(&line);
        assert_eq!(entries[0].text.chars().count(), constants::LINE_TRUNCATE_TRIGGER);
    }

    #[test]
    fn test_sequence_numbers_zero_padded() {
        let opts = DisplayOptions {
            sequence_numbers: true,
            ..Default::default()
        };
        let (entries, next) =
            parse_content("alpha\nbeta\n", "Svc", &PathBuf::from("s.log"), 41, &opts);
        assert_eq!(entries[0].text, "0000041 alpha");
        assert_eq!(entries[1].text, "0000042 beta");
        assert_eq!(next, 43);
    }

    #[test]
    fn test_timestamp_extracted_into_entry_date() {
        let entries = parse("2024-02-08T18:11:06.702Z service ready\n");
        assert_eq!(
            entries[0].date.format("%H:%M:%S").to_string(),
            "18:11:06"
        );
    }

    #[test]
    fn test_static_replacements_applied() {
        let entries = parse("AuthenticationService: [Auth] token refreshed\n");
        assert!(entries[0].text.starts_with("[Auth] token refreshed"));
    }
}
