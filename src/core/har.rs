// LogWeave - core/har.rs
//
// HTTP Archive (HAR v1.2) capture adapter: converts each network
// request/response pair into a synthetic log entry, including decoded
// bearer-token (JWT) metadata when present.
//
// Failure policy: a file that is not valid JSON or not a valid HAR
// structure is skipped with a surfaced warning; the remaining files are
// still processed. A malformed JWT payload degrades to a placeholder
// marker rather than failing the entry.

use crate::core::model::{LogEntry, LogLevel};
use crate::util::constants;
use crate::util::error::{HarError, PipelineError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::DateTime;
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

// =============================================================================
// HAR v1.2 structure (consumed read-only)
// =============================================================================

#[derive(Debug, Deserialize)]
struct HarFile {
    log: HarLog,
}

#[derive(Debug, Deserialize)]
struct HarLog {
    entries: Vec<HarRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HarRecord {
    started_date_time: String,
    request: HarRequest,
    response: HarResponse,
}

#[derive(Debug, Deserialize)]
struct HarRequest {
    method: String,
    url: String,
    #[serde(default)]
    headers: Vec<HarHeader>,
}

#[derive(Debug, Deserialize)]
struct HarHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HarResponse {
    status: u16,
    #[serde(default)]
    status_text: String,
    #[serde(default)]
    content: HarContent,
}

#[derive(Debug, Default, Deserialize)]
struct HarContent {
    #[serde(default)]
    text: Option<String>,
}

/// Minimal JWT payload: `aud`, `iat`, `exp` as unix seconds, optional `scp`.
#[derive(Debug, Deserialize)]
struct JwtPayload {
    aud: String,
    iat: i64,
    exp: i64,
    #[serde(default)]
    scp: Option<String>,
}

// =============================================================================
// Entry conversion
// =============================================================================

/// Parse the given HAR capture files into synthetic log entries.
///
/// Files are parsed concurrently; per-file failures become warnings in the
/// second tuple element. The cancel flag is checked per file.
pub fn collect_entries(
    paths: &[PathBuf],
    cancel: &AtomicBool,
) -> Result<(Vec<LogEntry>, Vec<HarError>), PipelineError> {
    let results: Vec<Result<Vec<LogEntry>, HarError>> = paths
        .par_iter()
        .map(|path| {
            if cancel.load(Ordering::SeqCst) {
                // Surfaced as Cancelled below; an empty batch keeps the
                // per-file result shape uniform.
                return Ok(Vec::new());
            }
            parse_har_file(path)
        })
        .collect();

    if cancel.load(Ordering::SeqCst) {
        return Err(PipelineError::Cancelled);
    }

    let mut entries = Vec::new();
    let mut warnings = Vec::new();
    for result in results {
        match result {
            Ok(batch) => entries.extend(batch),
            Err(e) => {
                tracing::warn!(error = %e, "HAR file skipped");
                warnings.push(e);
            }
        }
    }

    tracing::debug!(
        files = paths.len(),
        entries = entries.len(),
        skipped = warnings.len(),
        "HAR captures parsed"
    );

    Ok((entries, warnings))
}

/// Parse one HAR file into entries. JSON and schema failures are per-file
/// errors; they never abort the batch.
fn parse_har_file(path: &Path) -> Result<Vec<LogEntry>, HarError> {
    let content = std::fs::read_to_string(path).map_err(|e| HarError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    // Two-stage parse so "not JSON at all" and "JSON but not a HAR
    // capture" surface as distinct user-facing messages.
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| HarError::JsonParse {
            path: path.to_path_buf(),
            source: e,
        })?;

    let har: HarFile = serde_json::from_value(value).map_err(|e| HarError::SchemaValidation {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(har
        .log
        .entries
        .iter()
        .map(|record| to_log_entry(record, path))
        .collect())
}

/// Convert one request/response pair into a log entry.
fn to_log_entry(record: &HarRecord, path: &Path) -> LogEntry {
    let date = DateTime::parse_from_rfc3339(&record.started_date_time)
        .map(|dt| dt.into())
        .unwrap_or_else(|_| constants::epoch_sentinel());

    let level = derive_level(&record.request.url, record.response.status);
    let auth = auth_details(&record.request.headers);

    let mut text = format!(
        "{} [{}] {}{} -> [{} {}]",
        level.label().to_uppercase(),
        record.request.method,
        record.request.url,
        auth,
        record.response.status,
        record.response.status_text,
    );

    // Response body only for the levels where it aids diagnosis.
    if matches!(level, LogLevel::Warning | LogLevel::Error) {
        if let Some(body) = &record.response.content.text {
            if !body.is_empty() {
                text.push(' ');
                text.push_str(body);
            }
        }
    }

    LogEntry::new(
        date,
        text,
        constants::HAR_SERVICE.to_string(),
        Some(path.to_path_buf()),
        level,
    )
}

/// Level derivation: static assets are always debug regardless of status;
/// otherwise the status class decides.
fn derive_level(url: &str, status: u16) -> LogLevel {
    let path_only = url.split(['?', '#']).next().unwrap_or(url);
    if path_only.ends_with(".css") || path_only.ends_with(".js") {
        LogLevel::Debug
    } else if status < 400 {
        LogLevel::Info
    } else if status < 500 {
        LogLevel::Warning
    } else {
        LogLevel::Error
    }
}

// =============================================================================
// JWT decoding
// =============================================================================

/// Render inline auth details for a bearer token, if one is present.
///
/// The JWT payload (middle base64url segment) is decoded as plain JSON.
/// Malformed tokens degrade to a `[🔑?]` marker; the entry still renders.
fn auth_details(headers: &[HarHeader]) -> String {
    let bearer = headers.iter().find_map(|h| {
        if h.name.eq_ignore_ascii_case("authorization") {
            h.value.strip_prefix("Bearer ")
        } else {
            None
        }
    });

    let Some(token) = bearer else {
        return String::new();
    };

    match decode_jwt_payload(token) {
        Some(payload) => {
            let iat = DateTime::from_timestamp(payload.iat, 0)
                .map(|d| d.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                .unwrap_or_else(|| payload.iat.to_string());
            let exp = DateTime::from_timestamp(payload.exp, 0)
                .map(|d| d.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                .unwrap_or_else(|| payload.exp.to_string());
            match payload.scp {
                Some(scp) => {
                    format!(" [🔑 {} iat:{iat} exp:{exp} scp:'{scp}']", payload.aud)
                }
                None => format!(" [🔑 {} iat:{iat} exp:{exp}]", payload.aud),
            }
        }
        None => " [🔑?]".to_string(),
    }
}

/// Decode the middle segment of a three-segment JWT. Returns `None` on any
/// structural, base64, or JSON failure.
fn decode_jwt_payload(token: &str) -> Option<JwtPayload> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    let _signature = segments.next()?;

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

// =============================================================================
// Tests
// =============================================================================
