// LogWeave - tests/e2e_pipeline.rs
//
// End-to-end tests for the aggregation pipeline.
//
// These tests exercise the real filesystem, real walkdir traversal, real
// chrono timestamp parsing, and real HAR JSON decoding — no mocks, no
// stubs. This covers the full path from raw files in a workspace folder
// to the rendered virtual document.

use logweave::app::dispatch::{dispatch, Command, DisplayToggle};
use logweave::app::provider::ContentProvider;
use logweave::core::model::LogLevel;
use logweave::util::error::PipelineError;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

const HAR_FIXTURE: &str = r#"{
  "log": {
    "entries": [
      {
        "startedDateTime": "2024-02-08T12:00:01.400Z",
        "request": {
          "method": "GET",
          "url": "https://api.example.com/v1/items",
          "headers": []
        },
        "response": {
          "status": 200,
          "statusText": "OK",
          "content": {}
        }
      },
      {
        "startedDateTime": "2024-02-08T12:00:02.100Z",
        "request": {
          "method": "POST",
          "url": "https://api.example.com/v1/items",
          "headers": []
        },
        "response": {
          "status": 500,
          "statusText": "Internal Server Error",
          "content": { "text": "boom" }
        }
      }
    ]
  }
}"#;

/// Build a workspace with nested service folders, two log services, and
/// one HAR capture, all inside the same few seconds.
fn build_workspace() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");

    let core_dir = dir.path().join("CoreService");
    fs::create_dir(&core_dir).unwrap();
    fs::write(
        core_dir.join("Engine_2024-02-08_12-00-00.log"),
        "2024-02-08T12:00:00.200Z info engine starting\n\
         2024-02-08T12:00:00.200Z info engine starting\n\
         2024-02-08T12:00:01.600Z warning engine slow response\n\
         2024-02-08T12:00:03.000Z error engine request failed req-777\n",
    )
    .unwrap();

    fs::write(
        dir.path().join("Gateway_2024-02-08_12-00-00.log"),
        "2024-02-08T12:00:00.700Z debug gateway probe\n\
         2024-02-08T12:00:01.100Z info gateway routed req-777\n\
         no timestamp on this line at all\n",
    )
    .unwrap();

    fs::write(dir.path().join("capture.har"), HAR_FIXTURE).unwrap();

    // Noise that discovery must skip.
    let excluded = dir.path().join("node_modules");
    fs::create_dir(&excluded).unwrap();
    fs::write(excluded.join("ignored.log"), "2024-02-08T12:00:00Z nope\n").unwrap();

    dir
}

fn render(provider: &mut ContentProvider) -> String {
    provider
        .provide_content(&AtomicBool::new(false))
        .expect("pipeline should succeed")
}

fn line_of<'a>(content: &'a str, needle: &str) -> &'a str {
    content
        .lines()
        .find(|l| l.contains(needle))
        .unwrap_or_else(|| panic!("line containing '{needle}' not found"))
}

// =============================================================================
// Full pipeline
// =============================================================================

#[test]
fn e2e_full_document_structure() {
    let dir = build_workspace();
    let mut provider = ContentProvider::new(dir.path().to_path_buf());
    let content = render(&mut provider);

    // One fold region per populated second, bracketed by markers.
    for second in ["12:00:00", "12:00:01", "12:00:02", "12:00:03"] {
        assert!(
            content.contains(&format!("// 2024-02-08T{second}Z")),
            "missing start marker for {second}"
        );
    }
    let start_markers = content.matches("// 2024-02-08T").count();
    let end_markers = content.matches("// ======").count();
    assert_eq!(start_markers, end_markers, "unbalanced marker pairs");
    assert_eq!(start_markers, 4);

    // Cross-source merge: within 12:00:01 the gateway entry (.100)
    // precedes the HAR entry (.400) which precedes the engine one (.600).
    let gateway = content.find("gateway routed").unwrap();
    let har_get = content.find("GET] https://api.example.com/v1/items").unwrap();
    let engine = content.find("engine slow response").unwrap();
    assert!(gateway < har_get && har_get < engine);

    // The duplicated engine line appears once.
    assert_eq!(content.matches("engine starting").count(), 1);

    // Excluded directories contribute nothing.
    assert!(!content.contains("nope"));

    // The timestamp-less line maps to the epoch sentinel and is excluded
    // by the default lower time bound.
    assert!(!content.contains("no timestamp on this line"));

    // Service column padding: both prefixes pad to the longest name.
    let engine_line = line_of(&content, "engine starting");
    let gateway_line = line_of(&content, "gateway probe");
    assert!(engine_line.starts_with('['));
    assert_eq!(
        engine_line.find(']').unwrap(),
        gateway_line.find(']').unwrap()
    );

    // HAR failure entries carry the response body.
    let failed = line_of(&content, "[POST]");
    assert!(failed.contains("[500 Internal Server Error]"));
    assert!(failed.contains("boom"));
}

#[test]
fn e2e_regeneration_is_deterministic() {
    let dir = build_workspace();
    let mut provider = ContentProvider::new(dir.path().to_path_buf());
    let first = render(&mut provider);

    // Warm re-render, filter round-trip, and cold re-render must all
    // reproduce the same bytes.
    assert_eq!(first, render(&mut provider));

    dispatch(&mut provider, Command::ToggleKeyword("req-777".into()));
    dispatch(&mut provider, Command::ToggleKeyword("req-777".into()));
    assert_eq!(first, render(&mut provider));

    provider.reset_cache();
    assert_eq!(first, render(&mut provider));
}

// =============================================================================
// Filtering through the dispatch layer
// =============================================================================

#[test]
fn e2e_keyword_filter_narrows_document() {
    let dir = build_workspace();
    let mut provider = ContentProvider::new(dir.path().to_path_buf());
    render(&mut provider);

    dispatch(&mut provider, Command::ToggleKeyword("req-777".into()));
    let content = render(&mut provider);

    assert!(content.contains("gateway routed req-777"));
    assert!(content.contains("engine request failed req-777"));
    // Seconds with no surviving entries lose their fold regions.
    assert!(!content.contains("// 2024-02-08T12:00:00Z"));
    assert!(!content.contains("// 2024-02-08T12:00:02Z"));
}

#[test]
fn e2e_level_and_file_filters() {
    let dir = build_workspace();
    let mut provider = ContentProvider::new(dir.path().to_path_buf());
    render(&mut provider);

    dispatch(&mut provider, Command::ToggleLogLevel(LogLevel::Debug));
    let content = render(&mut provider);
    assert!(!content.contains("gateway probe"));
    assert!(content.contains("gateway routed"));

    dispatch(
        &mut provider,
        Command::SetFileEnabled {
            service: "Gateway".into(),
            enabled: false,
        },
    );
    let content = render(&mut provider);
    assert!(!content.contains("gateway routed"));
    assert!(content.contains("engine slow response"));
    // HAR entries are unaffected by log-file toggles.
    assert!(content.contains("[GET]"));
}

#[test]
fn e2e_session_id_anchors_time_window() {
    let dir = build_workspace();
    let mut provider = ContentProvider::new(dir.path().to_path_buf());
    render(&mut provider);

    // Earliest req-777 mention is 12:00:01.100; anchor = one second earlier,
    // so the whole 12:00:00 second falls outside the window.
    dispatch(&mut provider, Command::SetSessionId(Some("req-777".into())));
    let content = render(&mut provider);
    assert!(!content.contains("engine starting"));
    assert!(content.contains("gateway routed req-777"));

    dispatch(&mut provider, Command::SetSessionId(None));
    let content = render(&mut provider);
    assert!(content.contains("engine starting"));
}

// =============================================================================
// Display options
// =============================================================================

#[test]
fn e2e_display_toggles_change_rendering_only() {
    let dir = build_workspace();
    let mut provider = ContentProvider::new(dir.path().to_path_buf());
    render(&mut provider);

    dispatch(&mut provider, Command::ToggleDisplay(DisplayToggle::InlineDates));
    let content = render(&mut provider);
    assert!(line_of(&content, "engine starting").contains("[12:00:00.200]"));

    dispatch(&mut provider, Command::ToggleDisplay(DisplayToggle::FileNames));
    let content = render(&mut provider);
    // Emoji mode: the HAR source gets its own glyph, log sources another.
    assert!(line_of(&content, "[GET]").starts_with("🔗"));
    assert!(!line_of(&content, "engine starting").starts_with('['));
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn e2e_cancellation_produces_no_output_and_preserves_previous() {
    let dir = build_workspace();
    let mut provider = ContentProvider::new(dir.path().to_path_buf());
    let first = render(&mut provider);

    let cancelled = AtomicBool::new(true);
    provider.reset_cache();
    let result = provider.provide_content(&cancelled);
    assert!(matches!(result, Err(PipelineError::Cancelled)));

    // The previous successful render stays available.
    assert_eq!(provider.last_rendered(), Some(first.as_str()));
}

// =============================================================================
// Workspace edge cases
// =============================================================================

#[test]
fn e2e_empty_workspace_renders_empty_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut provider = ContentProvider::new(dir.path().to_path_buf());
    let content = render(&mut provider);
    assert!(content.is_empty());
}

#[test]
fn e2e_malformed_har_is_nonfatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("Svc_2024-02-08_12-00-00.log"),
        "2024-02-08T12:00:00.100Z info still here\n",
    )
    .unwrap();
    fs::write(dir.path().join("broken.har"), "{ not json").unwrap();

    let mut provider = ContentProvider::new(dir.path().to_path_buf());
    let content = render(&mut provider);
    assert!(content.contains("still here"));
    assert!(!provider.warnings.is_empty(), "HAR failure surfaces as warning");
}

#[test]
fn e2e_missing_workspace_is_an_error() {
    let mut provider = ContentProvider::new(Path::new("/nonexistent/lw-e2e").to_path_buf());
    let result = provider.provide_content(&AtomicBool::new(false));
    assert!(matches!(result, Err(PipelineError::Discovery(_))));
}
