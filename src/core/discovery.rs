// LogWeave - core/discovery.rs
//
// Workspace file discovery: glob-based search for log and HAR capture
// files under the workspace root. Reads only metadata, never content.
// Per-entry I/O errors are non-fatal warnings; only an invalid root is
// a hard error.

use crate::util::constants;
use crate::util::error::DiscoveryError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Result of one workspace walk.
#[derive(Debug, Default)]
pub struct DiscoveredFiles {
    /// Log files matching the include patterns, capped at MAX_LOG_FILES.
    pub log_files: Vec<PathBuf>,

    /// HAR capture files, capped at MAX_HAR_FILES.
    pub har_files: Vec<PathBuf>,

    /// Non-fatal warnings (inaccessible entries, cap truncation).
    pub warnings: Vec<String>,
}

/// Discover log and HAR files under `root`.
///
/// The walk skips excluded directory subtrees entirely and stops
/// collecting log files at the cap. The cancel flag is polled on every
/// walker iteration.
pub fn discover(root: &Path, cancel: &AtomicBool) -> Result<DiscoveredFiles, DiscoveryError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(DiscoveryError::NotADirectory {
                path: root.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(DiscoveryError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
    }

    let include: Vec<glob::Pattern> = constants::LOG_INCLUDE_PATTERNS
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();
    let har_pattern =
        glob::Pattern::new(constants::HAR_PATTERN).expect("discovery: invalid HAR pattern");

    let mut result = DiscoveredFiles::default();

    let walker = walkdir::WalkDir::new(root)
        .max_depth(constants::MAX_SCAN_DEPTH)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.file_type().is_dir() && e.depth() > 0 {
                let name = e.file_name().to_str().unwrap_or("");
                return !constants::EXCLUDED_DIRS.contains(&name);
            }
            true
        });

    for entry_result in walker {
        if cancel.load(Ordering::SeqCst) {
            tracing::debug!("Discovery cancelled by request");
            break;
        }

        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                result.warnings.push(format!("Cannot access '{path}': {e}"));
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            result.warnings.push(format!(
                "Skipping '{}': non-UTF-8 filename",
                entry.path().display()
            ));
            continue;
        };

        if har_pattern.matches(file_name) {
            if result.har_files.len() < constants::MAX_HAR_FILES {
                result.har_files.push(entry.path().to_path_buf());
            }
            continue;
        }

        if include.iter().any(|p| p.matches(file_name)) {
            if result.log_files.len() < constants::MAX_LOG_FILES {
                result.log_files.push(entry.path().to_path_buf());
            } else {
                result.warnings.push(format!(
                    "Log file limit of {} reached; remaining files skipped",
                    constants::MAX_LOG_FILES
                ));
                break;
            }
        }
    }

    tracing::debug!(
        logs = result.log_files.len(),
        hars = result.har_files.len(),
        warnings = result.warnings.len(),
        "Discovery complete"
    );

    Ok(result)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_workspace() -> TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        fs::write(root.join("app.log"), "line\n").unwrap();
        fs::write(root.join("notes.txt"), "line\n").unwrap();
        fs::write(root.join("capture.har"), "{}").unwrap();
        fs::write(root.join("image.png"), "binary").unwrap();

        let node = root.join("node_modules");
        fs::create_dir(&node).unwrap();
        fs::write(node.join("dep.log"), "excluded\n").unwrap();
        dir
    }

    #[test]
    fn test_discovers_logs_and_hars_excluding_noise() {
        let dir = make_workspace();
        let cancel = AtomicBool::new(false);
        let found = discover(dir.path(), &cancel).unwrap();

        let names: Vec<&str> = found
            .log_files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert!(names.contains(&"app.log"));
        assert!(names.contains(&"notes.txt"));
        assert!(!names.contains(&"image.png"));
        assert!(!names.contains(&"dep.log"), "node_modules must be skipped");
        assert_eq!(found.har_files.len(), 1);
    }

    #[test]
    fn test_root_not_found() {
        let cancel = AtomicBool::new(false);
        let result = discover(Path::new("/nonexistent/logweave"), &cancel);
        assert!(matches!(result, Err(DiscoveryError::RootNotFound { .. })));
    }

    #[test]
    fn test_root_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("afile.log");
        fs::write(&file, "x").unwrap();
        let cancel = AtomicBool::new(false);
        let result = discover(&file, &cancel);
        assert!(matches!(result, Err(DiscoveryError::NotADirectory { .. })));
    }

    #[test]
    fn test_har_cap_respected() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..8 {
            fs::write(dir.path().join(format!("c{i}.har")), "{}").unwrap();
        }
        let cancel = AtomicBool::new(false);
        let found = discover(dir.path(), &cancel).unwrap();
        assert_eq!(found.har_files.len(), constants::MAX_HAR_FILES);
    }

    #[test]
    fn test_cancelled_walk_returns_partial() {
        let dir = make_workspace();
        let cancel = AtomicBool::new(true);
        let found = discover(dir.path(), &cancel).unwrap();
        assert!(found.log_files.is_empty());
    }
}
