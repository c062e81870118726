//! Error taxonomy for tree operations.
//!
//! Errors fall into three categories that decide how the engine treats them:
//! - Session: the connection cannot be used (closed, rejected, already open)
//! - Validation: a pre-flight check failed; the whole call aborts before any mutation
//! - Primitive: a single remote or local primitive refused or failed; recorded per node

use std::io;

/// Category of a tree-operation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The session is unusable until reconnected.
    Session,
    /// Pre-flight validation failure, nothing was mutated.
    Validation,
    /// A per-node primitive failure, folded into the report.
    Primitive,
}

/// Why an operation was refused as invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// The filesystem root was named as a delete target.
    RootDeletion,
    /// The destination equals or lies beneath one of the sources.
    DestinationInSource { source: String, destination: String },
    /// Several sources were given but the destination is a single file.
    MultipleSourcesToFile { destination: String },
}

#[derive(Debug)]
pub enum TreeError {
    /// Handshake or login was rejected.
    Connection { host: String, reason: String },
    /// `connect` was called on a live session.
    AlreadyConnected { host: String },
    /// An operation was requested on a session that was never opened or was terminated.
    SessionClosed,
    /// A directory change failed part way; `reached` is where the server actually is.
    Navigation {
        requested: String,
        component: String,
        reached: String,
    },
    NotFound { path: String },
    NotADirectory { path: String },
    InvalidOperation(InvalidReason),
    Create { path: String },
    Rename { from: String, to: String },
    Delete { path: String },
    Transfer { path: String, reason: String },
    /// The listing filter could not be compiled.
    Pattern { pattern: String, reason: String },
    /// Transport or local filesystem failure.
    Io { context: String, source: io::Error },
}

impl TreeError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn not_found(path: impl ToString) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    pub fn not_a_directory(path: impl ToString) -> Self {
        Self::NotADirectory {
            path: path.to_string(),
        }
    }

    pub fn transfer(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::Transfer {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TreeError::Connection { .. }
            | TreeError::AlreadyConnected { .. }
            | TreeError::SessionClosed => ErrorCategory::Session,
            TreeError::Navigation { .. }
            | TreeError::NotFound { .. }
            | TreeError::NotADirectory { .. }
            | TreeError::InvalidOperation(_)
            | TreeError::Pattern { .. } => ErrorCategory::Validation,
            TreeError::Create { .. }
            | TreeError::Rename { .. }
            | TreeError::Delete { .. }
            | TreeError::Transfer { .. }
            | TreeError::Io { .. } => ErrorCategory::Primitive,
        }
    }

    /// True when the error was raised before anything was mutated.
    pub fn is_preflight(&self) -> bool {
        self.category() != ErrorCategory::Primitive
    }
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeError::Connection { host, reason } => {
                write!(f, "connection to {} failed: {}", host, reason)
            }
            TreeError::AlreadyConnected { host } => {
                write!(f, "previous session to {} still alive", host)
            }
            TreeError::SessionClosed => write!(f, "session is not connected"),
            TreeError::Navigation {
                requested,
                component,
                reached,
            } => write!(
                f,
                "cannot move to directory {} while changing to {} (stopped at {})",
                component, requested, reached
            ),
            TreeError::NotFound { path } => write!(f, "non-existent path: {}", path),
            TreeError::NotADirectory { path } => write!(f, "path not a directory: {}", path),
            TreeError::InvalidOperation(reason) => match reason {
                InvalidReason::RootDeletion => write!(f, "cannot remove root path"),
                InvalidReason::DestinationInSource {
                    source,
                    destination,
                } => write!(
                    f,
                    "destination path {} is a subpath of the source path {}",
                    destination, source
                ),
                InvalidReason::MultipleSourcesToFile { destination } => write!(
                    f,
                    "cannot move several sources onto the single file {}",
                    destination
                ),
            },
            TreeError::Create { path } => write!(f, "cannot create directory: {}", path),
            TreeError::Rename { from, to } => write!(f, "cannot rename {} to {}", from, to),
            TreeError::Delete { path } => write!(f, "cannot remove: {}", path),
            TreeError::Transfer { path, reason } => write!(f, "{}: {}", path, reason),
            TreeError::Pattern { pattern, reason } => {
                write!(f, "invalid filter pattern '{}': {}", pattern, reason)
            }
            TreeError::Io { context, source } => write!(f, "{}: {}", context, source),
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TreeError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflight_errors_are_not_primitive() {
        assert!(TreeError::not_found("/a").is_preflight());
        assert!(TreeError::InvalidOperation(InvalidReason::RootDeletion).is_preflight());
        assert_eq!(TreeError::SessionClosed.category(), ErrorCategory::Session);
    }

    #[test]
    fn primitive_errors_are_recorded_per_node() {
        let err = TreeError::Delete {
            path: "/a/b".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Primitive);
        assert!(!err.is_preflight());
    }

    #[test]
    fn io_error_keeps_source() {
        use std::error::Error;

        let err = TreeError::io(
            "listing /a",
            io::Error::new(io::ErrorKind::ConnectionReset, "reset"),
        );
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "listing /a: reset");
    }

    #[test]
    fn navigation_names_reached_directory() {
        let err = TreeError::Navigation {
            requested: "/a/b/c".into(),
            component: "b".into(),
            reached: "/a".into(),
        };
        assert!(err.to_string().contains("stopped at /a"));
    }
}
