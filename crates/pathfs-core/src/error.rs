// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for the pathfs contract

use std::io;

/// Failure vocabulary shared by every filesystem operation.
///
/// Each kind corresponds to exactly one native status code; the mapping
/// itself lives on the bridge side of the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    AlreadyExists,
    Unsupported,
    ReadOnlyFilesystem,
    BadHandle,
    NoSuchAttribute,
    NameTooLong,
    /// Destination buffer too small for the value being written.
    OutOfRange,
    InvalidArgument,
    Io,
}

impl ErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::ReadOnlyFilesystem => "read-only filesystem",
            ErrorKind::BadHandle => "bad file handle",
            ErrorKind::NoSuchAttribute => "no such attribute",
            ErrorKind::NameTooLong => "name too long",
            ErrorKind::OutOfRange => "buffer too small",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Io => "io error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation failure: an error kind plus an optional message and cause.
///
/// Every filesystem operation either succeeds or returns one of these; the
/// dispatch boundary reduces it to a single native status code.
#[derive(Debug, thiserror::Error)]
#[error("{}{}", .kind, .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct FsError {
    kind: ErrorKind,
    message: Option<String>,
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl FsError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            cause: None,
        }
    }

    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
            cause: None,
        }
    }

    pub fn with_cause(
        kind: ErrorKind,
        message: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            kind,
            message: Some(message.into()),
            cause: Some(cause.into()),
        }
    }

    /// Failure returned by every operation a filesystem does not override.
    pub fn unsupported() -> Self {
        Self::new(ErrorKind::Unsupported)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl From<ErrorKind> for FsError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<io::Error> for FsError {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
            _ => ErrorKind::Io,
        };
        Self {
            kind,
            message: None,
            cause: Some(Box::new(err)),
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;
