// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The high-level filesystem contract
//!
//! Most operations work like the well-known UNIX calls. The notable
//! differences:
//!
//! - Every operation returns [`FsResult`]; the default bodies fail with
//!   [`ErrorKind::Unsupported`], so an implementation overrides only what it
//!   supports and declares that set through [`Filesystem::capabilities`].
//! - `getdir` is the whole opendir/readdir/closedir sequence in one call,
//!   pushing entries through a [`DirFiller`].
//! - `open`/`create` produce an opaque [`Filesystem::Handle`] that is passed
//!   back, untouched, to every later `read`/`write`/`flush`/`release`/`fsync`
//!   of the same session. The path argument of those calls may differ from
//!   the open-time path after a rename.
//! - `flush` runs on every descriptor close and may run several times per
//!   handle; `release` runs once, when the last descriptor is closed, and
//!   consumes the handle.

use crate::attr::{FileAttr, FsStatfs};
use crate::buf::OutBuf;
use crate::error::{ErrorKind, FsError, FsResult};
use crate::session::OpenSession;
use encoding_rs::Encoding;

/// Native `setxattr` flag for create-only mode.
pub const XATTR_CREATE: u32 = 0x1;
/// Native `setxattr` flag for replace-only mode.
pub const XATTR_REPLACE: u32 = 0x2;

/// Refinement of `setxattr` semantics.
///
/// `Create` fails with `AlreadyExists` if the attribute is present;
/// `Replace` fails with `NoSuchAttribute` if it is absent. No mode means
/// create-or-replace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XattrSetMode {
    Create,
    Replace,
}

impl XattrSetMode {
    /// Decode the native flag word. Zero means no refinement; anything other
    /// than the two known flags is an invalid argument.
    pub fn from_flags(flags: u32) -> FsResult<Option<XattrSetMode>> {
        match flags {
            0 => Ok(None),
            XATTR_CREATE => Ok(Some(XattrSetMode::Create)),
            XATTR_REPLACE => Ok(Some(XattrSetMode::Replace)),
            other => Err(FsError::with_message(
                ErrorKind::InvalidArgument,
                format!("no valid setxattr flag {other:#x}"),
            )),
        }
    }
}

/// Sink for directory entries produced by `getdir`.
///
/// Entries are forwarded as they are added; nothing is retained after the
/// listing call returns.
pub trait DirFiller {
    fn add(&mut self, name: &str, inode: u64, mode: u32);
}

/// Sink for extended-attribute names produced by `listxattr`.
pub trait XattrLister {
    fn add(&mut self, name: &str);
}

macro_rules! fs_operations {
    ($($variant:ident => $name:literal,)+) => {
        /// The named operations of the [`Filesystem`] contract.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum FsOperation {
            $($variant,)+
        }

        impl FsOperation {
            pub const ALL: &'static [FsOperation] = &[$(FsOperation::$variant,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(FsOperation::$variant => $name,)+
                }
            }

            /// Look an operation up by its contract name.
            pub fn from_name(name: &str) -> Option<FsOperation> {
                match name {
                    $($name => Some(FsOperation::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

fs_operations! {
    Getattr => "getattr",
    Readlink => "readlink",
    Getdir => "getdir",
    Mknod => "mknod",
    Create => "create",
    Mkdir => "mkdir",
    Unlink => "unlink",
    Rmdir => "rmdir",
    Symlink => "symlink",
    Rename => "rename",
    Link => "link",
    Chmod => "chmod",
    Chown => "chown",
    Truncate => "truncate",
    Utime => "utime",
    Statfs => "statfs",
    Open => "open",
    Read => "read",
    Write => "write",
    Flush => "flush",
    Release => "release",
    Fsync => "fsync",
    Getxattrsize => "getxattrsize",
    Getxattr => "getxattr",
    Listxattr => "listxattr",
    Setxattr => "setxattr",
    Removexattr => "removexattr",
}

/// Set of operations a filesystem implementation provides.
///
/// Declared by the implementation and captured once when it is registered
/// with a bridge, so the native layer can skip calls that would only fail
/// with `Unsupported`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    bits: u32,
}

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn all() -> Self {
        Self::of(FsOperation::ALL)
    }

    pub fn of(ops: &[FsOperation]) -> Self {
        let mut set = Self::empty();
        for &op in ops {
            set.insert(op);
        }
        set
    }

    pub const fn with(mut self, op: FsOperation) -> Self {
        self.bits |= 1 << op as u32;
        self
    }

    pub fn insert(&mut self, op: FsOperation) {
        self.bits |= 1 << op as u32;
    }

    pub fn contains(&self, op: FsOperation) -> bool {
        self.bits & (1 << op as u32) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl FromIterator<FsOperation> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = FsOperation>>(iter: I) -> Self {
        let mut set = Self::empty();
        for op in iter {
            set.insert(op);
        }
        set
    }
}

/// A path-based filesystem implementation.
///
/// All paths are absolute, `/`-separated text, decoded fresh from native
/// bytes for each call.
pub trait Filesystem: Send + Sync {
    /// Opaque per-open-session token. Created in `open`/`create`, threaded
    /// unmodified through the per-handle operations, consumed by `release`.
    type Handle: Send + Sync;

    /// The operations this implementation overrides.
    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::empty()
    }

    /// Encoding used for paths and attribute names on the native boundary.
    fn path_encoding(&self) -> &'static Encoding {
        crate::encoding::default_path_encoding()
    }

    fn getattr(&self, path: &str) -> FsResult<FileAttr> {
        let _ = path;
        Err(FsError::unsupported())
    }

    fn readlink(&self, path: &str) -> FsResult<String> {
        let _ = path;
        Err(FsError::unsupported())
    }

    fn getdir(&self, path: &str, filler: &mut dyn DirFiller) -> FsResult<()> {
        let _ = (path, filler);
        Err(FsError::unsupported())
    }

    fn mknod(&self, path: &str, mode: u32, rdev: u64) -> FsResult<()> {
        let _ = (path, mode, rdev);
        Err(FsError::unsupported())
    }

    fn create(&self, path: &str, mode: u32, session: &OpenSession) -> FsResult<Self::Handle> {
        let _ = (path, mode, session);
        Err(FsError::unsupported())
    }

    fn mkdir(&self, path: &str, mode: u32) -> FsResult<()> {
        let _ = (path, mode);
        Err(FsError::unsupported())
    }

    fn unlink(&self, path: &str) -> FsResult<()> {
        let _ = path;
        Err(FsError::unsupported())
    }

    fn rmdir(&self, path: &str) -> FsResult<()> {
        let _ = path;
        Err(FsError::unsupported())
    }

    fn symlink(&self, target: &str, link: &str) -> FsResult<()> {
        let _ = (target, link);
        Err(FsError::unsupported())
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        let _ = (from, to);
        Err(FsError::unsupported())
    }

    fn link(&self, from: &str, to: &str) -> FsResult<()> {
        let _ = (from, to);
        Err(FsError::unsupported())
    }

    fn chmod(&self, path: &str, mode: u32) -> FsResult<()> {
        let _ = (path, mode);
        Err(FsError::unsupported())
    }

    fn chown(&self, path: &str, uid: u32, gid: u32) -> FsResult<()> {
        let _ = (path, uid, gid);
        Err(FsError::unsupported())
    }

    fn truncate(&self, path: &str, size: u64) -> FsResult<()> {
        let _ = (path, size);
        Err(FsError::unsupported())
    }

    fn utime(&self, path: &str, atime: i64, mtime: i64) -> FsResult<()> {
        let _ = (path, atime, mtime);
        Err(FsError::unsupported())
    }

    fn statfs(&self) -> FsResult<FsStatfs> {
        Err(FsError::unsupported())
    }

    fn open(&self, path: &str, session: &OpenSession) -> FsResult<Self::Handle> {
        let _ = (path, session);
        Err(FsError::unsupported())
    }

    /// Read into `buf` at `offset`, returning the number of bytes read.
    fn read(
        &self,
        path: &str,
        handle: &Self::Handle,
        offset: u64,
        buf: &mut [u8],
    ) -> FsResult<usize> {
        let _ = (path, handle, offset, buf);
        Err(FsError::unsupported())
    }

    /// Write `data` at `offset`, returning the number of bytes written.
    /// `writepage` is set when the write was caused by a page writeback.
    fn write(
        &self,
        path: &str,
        handle: &Self::Handle,
        writepage: bool,
        offset: u64,
        data: &[u8],
    ) -> FsResult<usize> {
        let _ = (path, handle, writepage, offset, data);
        Err(FsError::unsupported())
    }

    fn flush(&self, path: &str, handle: &Self::Handle) -> FsResult<()> {
        let _ = (path, handle);
        Err(FsError::unsupported())
    }

    /// Tear down an open session. `flags` are the open-time flags.
    fn release(&self, path: &str, handle: Self::Handle, flags: u32) -> FsResult<()> {
        let _ = (path, handle, flags);
        Err(FsError::unsupported())
    }

    /// Sync file contents. `datasync` restricts the sync to user data.
    fn fsync(&self, path: &str, handle: &Self::Handle, datasync: bool) -> FsResult<()> {
        let _ = (path, handle, datasync);
        Err(FsError::unsupported())
    }

    /// Exact byte length of an extended-attribute value.
    fn getxattr_size(&self, path: &str, name: &str) -> FsResult<usize> {
        let _ = (path, name);
        Err(FsError::unsupported())
    }

    /// Write the value of an extended attribute into `dst`. A destination
    /// smaller than the value must fail with `OutOfRange` (which
    /// [`OutBuf::put`] produces) rather than truncate.
    fn getxattr(&self, path: &str, name: &str, dst: &mut OutBuf<'_>) -> FsResult<()> {
        let _ = (path, name, dst);
        Err(FsError::unsupported())
    }

    /// Enumerate extended-attribute names through the lister.
    fn listxattr(&self, path: &str, lister: &mut dyn XattrLister) -> FsResult<()> {
        let _ = (path, lister);
        Err(FsError::unsupported())
    }

    fn setxattr(
        &self,
        path: &str,
        name: &str,
        value: &[u8],
        mode: Option<XattrSetMode>,
    ) -> FsResult<()> {
        let _ = (path, name, value, mode);
        Err(FsError::unsupported())
    }

    fn removexattr(&self, path: &str, name: &str) -> FsResult<()> {
        let _ = (path, name);
        Err(FsError::unsupported())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nothing;

    impl Filesystem for Nothing {
        type Handle = ();
    }

    #[test]
    fn defaults_fail_with_unsupported() {
        let fs = Nothing;
        assert_eq!(
            fs.getattr("/x").unwrap_err().kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(fs.statfs().unwrap_err().kind(), ErrorKind::Unsupported);
        assert_eq!(
            fs.setxattr("/x", "user.a", b"v", None).unwrap_err().kind(),
            ErrorKind::Unsupported
        );
        assert!(fs.capabilities().is_empty());
    }

    #[test]
    fn operation_names_round_trip() {
        for &op in FsOperation::ALL {
            assert_eq!(FsOperation::from_name(op.name()), Some(op));
        }
        // The two-phase size queries are bridge-internal shapes, not
        // contract operations.
        assert_eq!(FsOperation::from_name("listxattrsize"), None);
        assert_eq!(FsOperation::from_name("frobnicate"), None);
    }

    #[test]
    fn capability_set_membership() {
        let caps = CapabilitySet::of(&[FsOperation::Getattr, FsOperation::Read]);
        assert!(caps.contains(FsOperation::Getattr));
        assert!(caps.contains(FsOperation::Read));
        assert!(!caps.contains(FsOperation::Write));

        let all = CapabilitySet::all();
        assert!(FsOperation::ALL.iter().all(|&op| all.contains(op)));
    }

    #[test]
    fn setxattr_flag_decoding() {
        assert_eq!(XattrSetMode::from_flags(0).unwrap(), None);
        assert_eq!(
            XattrSetMode::from_flags(XATTR_CREATE).unwrap(),
            Some(XattrSetMode::Create)
        );
        assert_eq!(
            XattrSetMode::from_flags(XATTR_REPLACE).unwrap(),
            Some(XattrSetMode::Replace)
        );
        assert_eq!(
            XattrSetMode::from_flags(XATTR_CREATE | XATTR_REPLACE)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidArgument
        );
    }
}
