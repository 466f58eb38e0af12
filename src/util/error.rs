// LogWeave - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Per-item failures (one bad file, one bad HAR entry) never abort the batch;
// they are logged and skipped. Only structural failures in the grouping or
// rendering backbone abort a render, and cancellation is a typed
// short-circuit rather than an exception pattern.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all LogWeave operations.
#[derive(Debug)]
pub enum LogWeaveError {
    /// Workspace file discovery failed.
    Discovery(DiscoveryError),

    /// HAR capture parsing failed.
    Har(HarError),

    /// Filter operation failed.
    Filter(FilterError),

    /// Pipeline regeneration failed or was cancelled.
    Pipeline(PipelineError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for LogWeaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Har(e) => write!(f, "HAR error: {e}"),
            Self::Filter(e) => write!(f, "Filter error: {e}"),
            Self::Pipeline(e) => write!(f, "Pipeline error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LogWeaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Discovery(e) => Some(e),
            Self::Har(e) => Some(e),
            Self::Filter(e) => Some(e),
            Self::Pipeline(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to workspace file discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// No workspace folder is open / the root path does not exist.
    RootNotFound { path: PathBuf },

    /// The root path is not a directory.
    NotADirectory { path: PathBuf },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Workspace path '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Workspace path '{}' is not a directory", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {}

impl From<DiscoveryError> for LogWeaveError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// HAR errors
// ---------------------------------------------------------------------------

/// Errors related to HAR capture parsing. Both variants are
/// recoverable-user-facing: the offending file is skipped, the scan
/// continues for everything else.
#[derive(Debug)]
pub enum HarError {
    /// The file is not valid JSON.
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The JSON parsed but does not match the HAR v1.2 structure.
    SchemaValidation { path: PathBuf, reason: String },

    /// I/O error reading a HAR file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for HarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonParse { path, source } => {
                write!(f, "'{}' is not valid JSON: {source}", path.display())
            }
            Self::SchemaValidation { path, reason } => {
                write!(f, "'{}' is not a valid HAR capture: {reason}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "'{}': I/O error: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for HarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::JsonParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<HarError> for LogWeaveError {
    fn from(e: HarError) -> Self {
        Self::Har(e)
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors related to filter operations.
#[derive(Debug)]
pub enum FilterError {
    /// A session id was activated but no cached entry contains it.
    /// The filter is not applied; prior state is retained.
    SessionIdNotFound { session_id: String },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionIdNotFound { session_id } => {
                write!(f, "Session id '{session_id}' not found in any log entry")
            }
        }
    }
}

impl std::error::Error for FilterError {}

impl From<FilterError> for LogWeaveError {
    fn from(e: FilterError) -> Self {
        Self::Filter(e)
    }
}

// ---------------------------------------------------------------------------
// Pipeline errors
// ---------------------------------------------------------------------------

/// Failures of the regeneration backbone, plus the cooperative-cancellation
/// short-circuit. Cancellation is not a failure: it produces no output and
/// no cache corruption, and callers are expected to match on it explicitly.
#[derive(Debug)]
pub enum PipelineError {
    /// The regeneration was cancelled between two bounded units of work.
    Cancelled,

    /// Grouping-by-second failed structurally (fatal to this render;
    /// previously rendered content remains visible).
    Group { reason: String },

    /// Document rendering failed structurally.
    Render { reason: String },

    /// Workspace discovery failed, so there is nothing to regenerate.
    Discovery(DiscoveryError),
}

impl PipelineError {
    /// True when this value is the cooperative-cancellation short-circuit.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "Regeneration cancelled"),
            Self::Group { reason } => write!(f, "Grouping failed: {reason}"),
            Self::Render { reason } => write!(f, "Rendering failed: {reason}"),
            Self::Discovery(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Discovery(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for PipelineError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

impl From<PipelineError> for LogWeaveError {
    fn from(e: PipelineError) -> Self {
        Self::Pipeline(e)
    }
}

/// Convenience type alias for LogWeave results.
pub type Result<T> = std::result::Result<T, LogWeaveError>;
