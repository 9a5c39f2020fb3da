// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Failure-kind to native status code translation

use libc::c_int;
use pathfs_core::ErrorKind;

/// `ENOATTR` spelling differs per platform; Linux reports missing
/// attributes as `ENODATA`.
#[cfg(target_os = "linux")]
pub const ENOATTR: c_int = libc::ENODATA;
#[cfg(not(target_os = "linux"))]
pub const ENOATTR: c_int = libc::ENOATTR;

/// Map a declared failure kind to its positive errno value.
pub fn errno(kind: ErrorKind) -> c_int {
    match kind {
        ErrorKind::NotFound => libc::ENOENT,
        ErrorKind::PermissionDenied => libc::EACCES,
        ErrorKind::AlreadyExists => libc::EEXIST,
        ErrorKind::Unsupported => libc::ENOSYS,
        ErrorKind::ReadOnlyFilesystem => libc::EROFS,
        ErrorKind::BadHandle => libc::EBADF,
        ErrorKind::NoSuchAttribute => ENOATTR,
        ErrorKind::NameTooLong => libc::ENAMETOOLONG,
        ErrorKind::OutOfRange => libc::ERANGE,
        ErrorKind::InvalidArgument => libc::EINVAL,
        ErrorKind::Io => libc::EIO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_errno() {
        let kinds = [
            ErrorKind::NotFound,
            ErrorKind::PermissionDenied,
            ErrorKind::AlreadyExists,
            ErrorKind::Unsupported,
            ErrorKind::ReadOnlyFilesystem,
            ErrorKind::BadHandle,
            ErrorKind::NoSuchAttribute,
            ErrorKind::NameTooLong,
            ErrorKind::OutOfRange,
            ErrorKind::InvalidArgument,
            ErrorKind::Io,
        ];
        let mut codes: Vec<c_int> = kinds.iter().map(|&k| errno(k)).collect();
        assert!(codes.iter().all(|&c| c > 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn range_error_is_distinguishable_for_retry() {
        assert_eq!(errno(ErrorKind::OutOfRange), libc::ERANGE);
        assert_ne!(errno(ErrorKind::OutOfRange), errno(ErrorKind::Io));
    }
}
