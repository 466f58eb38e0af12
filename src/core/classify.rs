// LogWeave - core/classify.rs
//
// File classification and service grouping.
//
// Infers a logical "service" name per file from its filename and parent
// folder, groups files by service, and sorts each sufficiently large
// group by the timestamp embedded in the filename (descending).

use crate::core::model::{Classified, ServiceFiles};
use crate::util::constants;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Matches a GUID anywhere in a folder name, e.g.
/// `User (Primary; 05f3f692-27ba-4a63-a862-cc66a146f3f3)`.
fn guid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
            .expect("classify: invalid GUID regex")
    })
}

/// Matches the `_YYYY-MM-DD_HH-MM-SS` timestamp embedded in rotated log
/// filenames, capturing the sortable date portion.
fn filename_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"_(\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2})")
            .expect("classify: invalid filename date regex")
    })
}

/// Group workspace files by inferred service and sort large groups by
/// filename-embedded timestamp, newest first.
///
/// Folder conventions:
/// - A parent folder starting with "Core" prefixes the filename with
///   `core/` so distinct per-core-process logs do not collapse into one
///   group.
/// - A parent folder starting with "User" contributes a
///   `user-<first5hex>/` prefix from the GUID in the folder name, keeping
///   multiple user sessions distinguishable.
///
/// The service name is the text before the first underscore of the
/// (possibly prefixed) filename, with any extension suffix stripped.
pub fn group_and_sort(files: &[PathBuf]) -> Classified {
    let mut classified = Classified::default();

    for path in files {
        let service = service_name_for(path);

        classified.longest_service_name = classified.longest_service_name.max(service.len());

        match classified
            .groups
            .iter_mut()
            .find(|g| g.service_name == service)
        {
            Some(group) => group.files.push(path.clone()),
            None => classified.groups.push(ServiceFiles {
                service_name: service,
                files: vec![path.clone()],
            }),
        }
    }

    // Only groups that reach the threshold are worth sorting; small groups
    // are trivially ordered later by content timestamp anyway.
    for group in &mut classified.groups {
        if group.files.len() >= constants::GROUP_SORT_MIN_FILES {
            group.files.sort_by(|a, b| {
                filename_timestamp(b).cmp(&filename_timestamp(a))
            });
        }
    }

    tracing::debug!(
        groups = classified.groups.len(),
        longest = classified.longest_service_name,
        "Files classified"
    );

    classified
}

/// Infer the service name for one file path.
fn service_name_for(path: &Path) -> String {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let parent_name = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let prefixed = if parent_name.starts_with("Core") {
        format!("core/{file_name}")
    } else if parent_name.starts_with("User") {
        match guid_regex().find(parent_name) {
            Some(m) => format!("user-{}/{file_name}", &m.as_str()[..5]),
            None => file_name.to_string(),
        }
    } else {
        file_name.to_string()
    };

    // Text before the first underscore, extension stripped.
    let before_underscore = prefixed.split('_').next().unwrap_or(&prefixed);
    match before_underscore.rfind('.') {
        Some(idx) => before_underscore[..idx].to_string(),
        None => before_underscore.to_string(),
    }
}

/// Extract the sortable `YYYY-MM-DD_HH-MM-SS` portion of a rotated log
/// filename. Files without one sort as oldest.
fn filename_timestamp(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    filename_date_regex()
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_service_name_before_underscore() {
        let files = vec![PathBuf::from("/logs/MSTeams_2024-01-01_foo.log")];
        let c = group_and_sort(&files);
        assert_eq!(c.groups.len(), 1);
        assert_eq!(c.groups[0].service_name, "MSTeams");
    }

    #[test]
    fn test_extension_stripped_when_no_underscore() {
        let files = vec![PathBuf::from("/logs/summary.txt")];
        let c = group_and_sort(&files);
        assert_eq!(c.groups[0].service_name, "summary");
    }

    /// Same filename under a User-GUID folder and a Core folder must land
    /// in distinct groups.
    #[test]
    fn test_user_guid_folder_distinct_from_core() {
        let files = vec![
            PathBuf::from(
                "/ws/User (Primary; 05f3f692-27ba-4a63-a862-cc66a146f3f3)/MSTeams_2024-01-01_foo.log",
            ),
            PathBuf::from("/ws/Core/MSTeams_2024-01-01_foo.log"),
        ];
        let c = group_and_sort(&files);
        let names: Vec<&str> = c.groups.iter().map(|g| g.service_name.as_str()).collect();
        assert!(names.contains(&"user-05f3f/MSTeams"), "got {names:?}");
        assert!(names.contains(&"core/MSTeams"), "got {names:?}");
    }

    #[test]
    fn test_longest_service_name_tracked() {
        let files = vec![
            PathBuf::from("/logs/A_x.log"),
            PathBuf::from("/logs/LongServiceName_x.log"),
        ];
        let c = group_and_sort(&files);
        assert_eq!(c.longest_service_name, "LongServiceName".len());
    }

    /// Groups of three or more files are sorted descending by the
    /// filename-embedded timestamp.
    #[test]
    fn test_large_group_sorted_descending() {
        let files = vec![
            PathBuf::from("/logs/Svc_2024-01-01_00-00-00.log"),
            PathBuf::from("/logs/Svc_2024-03-01_00-00-00.log"),
            PathBuf::from("/logs/Svc_2024-02-01_00-00-00.log"),
        ];
        let c = group_and_sort(&files);
        let names: Vec<&str> = c.groups[0]
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "Svc_2024-03-01_00-00-00.log",
                "Svc_2024-02-01_00-00-00.log",
                "Svc_2024-01-01_00-00-00.log",
            ]
        );
    }

    /// Groups below the sort threshold keep discovery order.
    #[test]
    fn test_small_group_keeps_discovery_order() {
        let files = vec![
            PathBuf::from("/logs/Svc_2024-01-01_00-00-00.log"),
            PathBuf::from("/logs/Svc_2024-03-01_00-00-00.log"),
        ];
        let c = group_and_sort(&files);
        let names: Vec<&str> = c.groups[0]
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["Svc_2024-01-01_00-00-00.log", "Svc_2024-03-01_00-00-00.log"]
        );
    }
}
