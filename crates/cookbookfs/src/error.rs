// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Errors surfaced by the cookbook collection, and the mapping from upload
//! failure causes to them.

use crate::cookbook::{LoadError, UploadError};
use crate::transport::TransportError;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

/// Operation being attempted on a node when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Write,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Write => write!(f, "write"),
        }
    }
}

/// Why an upload through the proxy workspace failed.
#[derive(Debug, thiserror::Error)]
pub enum UploadFailure {
    #[error("not a versioned cookbook name: {name}")]
    InvalidName { name: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Transport(TransportError),

    /// The uploader refused to overwrite an immutable version.
    #[error("cookbook {cookbook} version {version} is frozen")]
    Frozen { cookbook: String, version: String },

    #[error("{0}")]
    Uploader(String),
}

impl UploadFailure {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        UploadFailure::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<UploadError> for UploadFailure {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Frozen { cookbook, version } => UploadFailure::Frozen { cookbook, version },
            UploadError::Transport(e) => UploadFailure::Transport(e),
            UploadError::Other(message) => UploadFailure::Uploader(message),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{message}")]
    OperationFailed {
        operation: Operation,
        path: PathBuf,
        message: String,
        #[source]
        cause: UploadFailure,
    },

    #[error("{message}")]
    CookbookFrozen {
        operation: Operation,
        path: PathBuf,
        cookbook: String,
        message: String,
        #[source]
        cause: UploadFailure,
    },

    /// Listing failures, passed through as-is.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Upload failures with no domain meaning, passed through as-is.
    #[error(transparent)]
    Upload(UploadFailure),
}

impl Error {
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Error::OperationFailed { operation, .. } | Error::CookbookFrozen { operation, .. } => {
                Some(*operation)
            }
            _ => None,
        }
    }

    /// Path of the node the failed operation targeted.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::OperationFailed { path, .. } | Error::CookbookFrozen { path, .. } => Some(path),
            _ => None,
        }
    }

    #[must_use]
    pub fn cause(&self) -> Option<&UploadFailure> {
        match self {
            Error::OperationFailed { cause, .. } | Error::CookbookFrozen { cause, .. } => Some(cause),
            Error::Upload(cause) => Some(cause),
            Error::Transport(_) => None,
        }
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        matches!(self, Error::CookbookFrozen { .. })
    }
}

enum Kind {
    Failed,
    Frozen,
}

fn classify(cause: &UploadFailure, cookbook: &str) -> Option<(Kind, String)> {
    match cause {
        UploadFailure::Transport(e) if e.is_timeout() => {
            Some((Kind::Failed, format!("Timeout writing: {e}")))
        }
        UploadFailure::Transport(e) if e.is_conflict() => {
            Some((Kind::Frozen, format!("Cookbook {cookbook} is frozen")))
        }
        UploadFailure::Transport(e) => Some((Kind::Failed, format!("HTTP error writing: {e}"))),
        UploadFailure::Frozen { .. } => Some((Kind::Frozen, format!("Cookbook {cookbook} is frozen"))),
        _ => None,
    }
}

/// Map an upload failure on the node at `path` to the error a caller sees.
///
/// Transport and frozen-version failures become `OperationFailed` or
/// `CookbookFrozen` for a write; everything else is returned unchanged as
/// `Error::Upload`.
pub fn translate_upload_failure(cause: UploadFailure, path: &Path, cookbook: &str) -> Error {
    match classify(&cause, cookbook) {
        Some((Kind::Failed, message)) => Error::OperationFailed {
            operation: Operation::Write,
            path: path.to_path_buf(),
            message,
            cause,
        },
        Some((Kind::Frozen, message)) => Error::CookbookFrozen {
            operation: Operation::Write,
            path: path.to_path_buf(),
            cookbook: cookbook.to_string(),
            message,
            cause,
        },
        None => Error::Upload(cause),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE: &str = "/cookbooks";

    fn status(code: u16) -> UploadFailure {
        UploadFailure::Transport(TransportError::Status {
            url: "https://chef/cookbooks/apache2/1.0.0".into(),
            status: code,
            body: "{}".into(),
        })
    }

    #[test]
    fn test_timeout_is_operation_failed() {
        let cause = UploadFailure::Transport(TransportError::Timeout {
            url: "https://chef/sandboxes".into(),
            message: "operation timed out".into(),
        });
        let err = translate_upload_failure(cause, Path::new(NODE), "apache2-1.0.0");
        match &err {
            Error::OperationFailed { operation, path, message, cause } => {
                assert_eq!(*operation, Operation::Write);
                assert_eq!(path, Path::new(NODE));
                assert!(message.starts_with("Timeout writing: "));
                assert!(message.contains("operation timed out"));
                assert!(matches!(cause, UploadFailure::Transport(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().starts_with("Timeout writing: "));
    }

    #[test]
    fn test_conflict_is_frozen() {
        let err = translate_upload_failure(status(409), Path::new(NODE), "apache2-1.0.0");
        assert!(err.is_frozen());
        assert_eq!(err.to_string(), "Cookbook apache2-1.0.0 is frozen");
        assert_eq!(err.operation(), Some(Operation::Write));
        assert_eq!(err.path(), Some(Path::new(NODE)));
    }

    #[test]
    fn test_other_status_is_http_error() {
        let err = translate_upload_failure(status(500), Path::new(NODE), "apache2-1.0.0");
        assert!(matches!(err, Error::OperationFailed { .. }));
        assert!(err.to_string().starts_with("HTTP error writing: 500 response"));
    }

    #[test]
    fn test_uploader_frozen_violation() {
        let cause = UploadFailure::Frozen {
            cookbook: "apache2".into(),
            version: "1.0.0".into(),
        };
        let err = translate_upload_failure(cause, Path::new(NODE), "apache2-1.0.0");
        match err {
            Error::CookbookFrozen { cookbook, message, .. } => {
                assert_eq!(cookbook, "apache2-1.0.0");
                assert_eq!(message, "Cookbook apache2-1.0.0 is frozen");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_other_causes_pass_through() {
        let cause = UploadFailure::Load(LoadError {
            path: PathBuf::from("/tmp/x/apache2"),
            message: "metadata.rb missing".into(),
        });
        let err = translate_upload_failure(cause, Path::new(NODE), "apache2-1.0.0");
        assert!(matches!(err, Error::Upload(UploadFailure::Load(_))));
        assert_eq!(err.operation(), None);
        assert!(err.to_string().contains("metadata.rb missing"));

        let err = translate_upload_failure(
            UploadFailure::Uploader("checksum mismatch".into()),
            Path::new(NODE),
            "apache2-1.0.0",
        );
        assert!(matches!(err, Error::Upload(UploadFailure::Uploader(_))));
    }

    #[test]
    fn test_upload_error_conversion() {
        let failure: UploadFailure = UploadError::Frozen {
            cookbook: "mysql".into(),
            version: "1.0.0".into(),
        }
        .into();
        assert!(matches!(failure, UploadFailure::Frozen { .. }));

        let failure: UploadFailure = UploadError::Other("boom".into()).into();
        assert!(matches!(failure, UploadFailure::Uploader(m) if m == "boom"));
    }
}
