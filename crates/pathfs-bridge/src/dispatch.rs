// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Operation dispatch between the native callback surface and a
//! [`Filesystem`] implementation
//!
//! Every native-facing call follows the same shape: decode the byte-buffer
//! arguments, invoke the high-level operation, marshal the result into the
//! caller's sink, and reduce any failure to a status code. The dispatch
//! keeps no state across calls beyond the codec and the capability table
//! captured at construction, so it can be driven concurrently from any
//! number of native threads.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use libc::c_int;
use pathfs_core::{
    CapabilitySet, DirFiller, ErrorKind, Filesystem, FsError, FsOperation, FsResult, OpenSession,
    OutBuf, XattrLister, XattrSetMode,
};
use tracing::{debug, error};

use crate::codec::PathCodec;
use crate::errno;
use crate::sink::{AttrSink, DirSink, OpenSink, SizeSink, StatfsSink};

/// Success status for the native surface; failures are positive errno
/// values from [`errno::errno`].
pub const OK: c_int = 0;

/// Adapts the byte-level native callback surface to a [`Filesystem`].
pub struct FsDispatch<F: Filesystem> {
    fs: F,
    codec: PathCodec,
    capabilities: CapabilitySet,
}

impl<F: Filesystem> FsDispatch<F> {
    /// Register a filesystem, taking its preferred path encoding and its
    /// declared capability set.
    pub fn new(fs: F) -> Self {
        let codec = PathCodec::new(fs.path_encoding());
        Self::with_codec(fs, codec)
    }

    pub fn with_codec(fs: F, codec: PathCodec) -> Self {
        let capabilities = fs.capabilities();
        Self {
            fs,
            codec,
            capabilities,
        }
    }

    pub fn codec(&self) -> &PathCodec {
        &self.codec
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Invoke one operation, containing declared failures and
    /// implementation panics alike. Nothing unwinds past this point.
    fn run<T>(&self, op: &'static str, call: impl FnOnce() -> FsResult<T>) -> Result<T, c_int> {
        match catch_unwind(AssertUnwindSafe(call)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                debug!(target: "pathfs::bridge", op, error = %err, "operation failed");
                Err(errno::errno(err.kind()))
            }
            Err(payload) => {
                error!(
                    target: "pathfs::bridge",
                    op,
                    panic = panic_message(payload.as_ref()),
                    "filesystem implementation fault"
                );
                Err(libc::EFAULT)
            }
        }
    }

    fn status(result: Result<(), c_int>) -> c_int {
        match result {
            Ok(()) => OK,
            Err(code) => code,
        }
    }

    pub fn getattr(&self, path: &[u8], out: &mut dyn AttrSink) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "getattr", path = %path);
        match self.run("getattr", || self.fs.getattr(&path)) {
            Ok(attr) => {
                out.set(
                    attr.inode,
                    attr.mode,
                    attr.nlink,
                    attr.uid,
                    attr.gid,
                    attr.rdev,
                    attr.size,
                    attr.blocks,
                    attr.atime,
                    attr.mtime,
                    attr.ctime,
                );
                OK
            }
            Err(code) => code,
        }
    }

    /// The destination is pre-sized by the native caller; a target that does
    /// not fit after encoding fails with `ENAMETOOLONG`.
    pub fn readlink(&self, path: &[u8], link: &mut OutBuf<'_>) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "readlink", path = %path);
        Self::status(self.run("readlink", || {
            let target = self.fs.readlink(&path)?;
            self.codec.encode(&target, link).map_err(|err| {
                if err.kind() == ErrorKind::OutOfRange {
                    FsError::with_message(
                        ErrorKind::NameTooLong,
                        "buffer overflow while encoding link target",
                    )
                } else {
                    err
                }
            })
        }))
    }

    /// One listing call per request; each entry the filesystem pushes is
    /// encoded and forwarded to `sink` immediately, so partial results stay
    /// visible to the native side even if the listing fails midway.
    pub fn getdir(&self, path: &[u8], sink: &mut dyn DirSink) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "getdir", path = %path);
        Self::status(self.run("getdir", || {
            let mut filler = DirEncoder {
                codec: &self.codec,
                sink,
            };
            self.fs.getdir(&path, &mut filler)
        }))
    }

    pub fn mknod(&self, path: &[u8], mode: u32, rdev: u64) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "mknod", path = %path, mode = %format_args!("{mode:o}"), rdev);
        Self::status(self.run("mknod", || self.fs.mknod(&path, mode, rdev)))
    }

    pub fn create(
        &self,
        path: &[u8],
        mode: u32,
        flags: u32,
        out: &mut dyn OpenSink<F::Handle>,
    ) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "create", path = %path, mode = %format_args!("{mode:o}"), flags);
        let session = OpenSession {
            flags,
            direct_io: out.direct_io(),
            keep_cache: out.keep_cache(),
        };
        match self.run("create", || self.fs.create(&path, mode, &session)) {
            Ok(handle) => {
                out.set_handle(handle);
                OK
            }
            Err(code) => code,
        }
    }

    pub fn mkdir(&self, path: &[u8], mode: u32) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "mkdir", path = %path, mode = %format_args!("{mode:o}"));
        Self::status(self.run("mkdir", || self.fs.mkdir(&path, mode)))
    }

    pub fn unlink(&self, path: &[u8]) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "unlink", path = %path);
        Self::status(self.run("unlink", || self.fs.unlink(&path)))
    }

    pub fn rmdir(&self, path: &[u8]) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "rmdir", path = %path);
        Self::status(self.run("rmdir", || self.fs.rmdir(&path)))
    }

    pub fn symlink(&self, target: &[u8], link: &[u8]) -> c_int {
        let target = self.codec.decode(target);
        let link = self.codec.decode(link);
        debug!(target: "pathfs::bridge", op = "symlink", link_target = %target, link = %link);
        Self::status(self.run("symlink", || self.fs.symlink(&target, &link)))
    }

    pub fn rename(&self, from: &[u8], to: &[u8]) -> c_int {
        let from = self.codec.decode(from);
        let to = self.codec.decode(to);
        debug!(target: "pathfs::bridge", op = "rename", from = %from, to = %to);
        Self::status(self.run("rename", || self.fs.rename(&from, &to)))
    }

    pub fn link(&self, from: &[u8], to: &[u8]) -> c_int {
        let from = self.codec.decode(from);
        let to = self.codec.decode(to);
        debug!(target: "pathfs::bridge", op = "link", from = %from, to = %to);
        Self::status(self.run("link", || self.fs.link(&from, &to)))
    }

    pub fn chmod(&self, path: &[u8], mode: u32) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "chmod", path = %path, mode = %format_args!("{mode:o}"));
        Self::status(self.run("chmod", || self.fs.chmod(&path, mode)))
    }

    pub fn chown(&self, path: &[u8], uid: u32, gid: u32) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "chown", path = %path, uid, gid);
        Self::status(self.run("chown", || self.fs.chown(&path, uid, gid)))
    }

    pub fn truncate(&self, path: &[u8], size: u64) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "truncate", path = %path, size);
        Self::status(self.run("truncate", || self.fs.truncate(&path, size)))
    }

    pub fn utime(&self, path: &[u8], atime: i64, mtime: i64) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "utime", path = %path, atime, mtime);
        Self::status(self.run("utime", || self.fs.utime(&path, atime, mtime)))
    }

    pub fn statfs(&self, out: &mut dyn StatfsSink) -> c_int {
        debug!(target: "pathfs::bridge", op = "statfs");
        match self.run("statfs", || self.fs.statfs()) {
            Ok(stats) => {
                out.set(
                    stats.block_size,
                    stats.blocks,
                    stats.blocks_free,
                    stats.blocks_avail,
                    stats.files,
                    stats.files_free,
                    stats.namelen,
                );
                OK
            }
            Err(code) => code,
        }
    }

    pub fn open(&self, path: &[u8], flags: u32, out: &mut dyn OpenSink<F::Handle>) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "open", path = %path, flags);
        let session = OpenSession {
            flags,
            direct_io: out.direct_io(),
            keep_cache: out.keep_cache(),
        };
        match self.run("open", || self.fs.open(&path, &session)) {
            Ok(handle) => {
                out.set_handle(handle);
                OK
            }
            Err(code) => code,
        }
    }

    /// On success the buffer position has advanced by the number of bytes
    /// read.
    pub fn read(&self, path: &[u8], handle: &F::Handle, buf: &mut OutBuf<'_>, offset: u64) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "read", path = %path, offset, capacity = buf.remaining());
        Self::status(self.run("read", || {
            let n = self.fs.read(&path, handle, offset, buf.unfilled())?;
            buf.advance(n)
        }))
    }

    pub fn write(
        &self,
        path: &[u8],
        handle: &F::Handle,
        writepage: bool,
        data: &[u8],
        offset: u64,
        written: &mut dyn SizeSink,
    ) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "write", path = %path, writepage, offset, len = data.len());
        Self::status(self.run("write", || {
            let n = self.fs.write(&path, handle, writepage, offset, data)?;
            written.set_size(n);
            Ok(())
        }))
    }

    pub fn flush(&self, path: &[u8], handle: &F::Handle) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "flush", path = %path);
        Self::status(self.run("flush", || self.fs.flush(&path, handle)))
    }

    /// Ends the open session. The handle is handed back to the
    /// implementation by value; it cannot be used after this call.
    pub fn release(&self, path: &[u8], handle: F::Handle, flags: u32) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "release", path = %path, flags);
        Self::status(self.run("release", move || self.fs.release(&path, handle, flags)))
    }

    pub fn fsync(&self, path: &[u8], handle: &F::Handle, datasync: bool) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "fsync", path = %path, datasync);
        Self::status(self.run("fsync", || self.fs.fsync(&path, handle, datasync)))
    }

    pub fn getxattrsize(&self, path: &[u8], name: &[u8], out: &mut dyn SizeSink) -> c_int {
        let path = self.codec.decode(path);
        let name = self.codec.decode(name);
        debug!(target: "pathfs::bridge", op = "getxattrsize", path = %path, name = %name);
        Self::status(self.run("getxattrsize", || {
            let size = self.fs.getxattr_size(&path, &name)?;
            out.set_size(size);
            Ok(())
        }))
    }

    /// Fill phase of the attribute-value protocol. No size is cached from a
    /// prior [`getxattrsize`](Self::getxattrsize) call; the value is read
    /// against current state and a too-small destination fails with
    /// `ERANGE`.
    pub fn getxattr(&self, path: &[u8], name: &[u8], value: &mut OutBuf<'_>) -> c_int {
        let path = self.codec.decode(path);
        let name = self.codec.decode(name);
        debug!(target: "pathfs::bridge", op = "getxattr", path = %path, name = %name, capacity = value.capacity());
        Self::status(self.run("getxattr", || self.fs.getxattr(&path, &name, value)))
    }

    /// Size phase of the attribute-name listing: runs the full enumeration
    /// and sums the exact encoded length of each name plus its terminator
    /// byte.
    pub fn listxattrsize(&self, path: &[u8], out: &mut dyn SizeSink) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "listxattrsize", path = %path);
        Self::status(self.run("listxattrsize", || {
            let mut lister = XattrSizeLister {
                codec: &self.codec,
                size: 0,
            };
            self.fs.listxattr(&path, &mut lister)?;
            out.set_size(lister.size);
            Ok(())
        }))
    }

    /// Fill phase of the attribute-name listing: re-enumerates and writes
    /// each encoded name followed by a single zero byte.
    pub fn listxattr(&self, path: &[u8], list: &mut OutBuf<'_>) -> c_int {
        let path = self.codec.decode(path);
        debug!(target: "pathfs::bridge", op = "listxattr", path = %path, capacity = list.capacity());
        Self::status(self.run("listxattr", || {
            let mut lister = XattrNameEncoder {
                codec: &self.codec,
                dst: list,
                overflow: false,
            };
            self.fs.listxattr(&path, &mut lister)?;
            if lister.overflow {
                Err(FsError::with_message(
                    ErrorKind::OutOfRange,
                    "attribute name list does not fit destination",
                ))
            } else {
                Ok(())
            }
        }))
    }

    pub fn setxattr(&self, path: &[u8], name: &[u8], value: &[u8], flags: u32) -> c_int {
        let path = self.codec.decode(path);
        let name = self.codec.decode(name);
        debug!(target: "pathfs::bridge", op = "setxattr", path = %path, name = %name, len = value.len(), flags);
        Self::status(self.run("setxattr", || {
            let mode = XattrSetMode::from_flags(flags)?;
            self.fs.setxattr(&path, &name, value, mode)
        }))
    }

    pub fn removexattr(&self, path: &[u8], name: &[u8]) -> c_int {
        let path = self.codec.decode(path);
        let name = self.codec.decode(name);
        debug!(target: "pathfs::bridge", op = "removexattr", path = %path, name = %name);
        Self::status(self.run("removexattr", || self.fs.removexattr(&path, &name)))
    }

    /// Capability query: writes whether the registered filesystem declared
    /// the named operation, or fails with `EINVAL` for names outside the
    /// contract vocabulary.
    pub fn is_implemented(&self, name: &[u8], out: &mut bool) -> c_int {
        let name = self.codec.decode(name);
        debug!(target: "pathfs::bridge", op = "is_implemented", name = %name);
        match FsOperation::from_name(&name) {
            Some(op) => {
                *out = self.capabilities.contains(op);
                OK
            }
            None => libc::EINVAL,
        }
    }
}

/// Forwards directory entries to the native accumulator, encoding names on
/// the way through. No buffering; each add is relayed as it happens.
struct DirEncoder<'a> {
    codec: &'a PathCodec,
    sink: &'a mut dyn DirSink,
}

impl DirFiller for DirEncoder<'_> {
    fn add(&mut self, name: &str, inode: u64, mode: u32) {
        self.sink.add(&self.codec.encode_vec(name), inode, mode);
    }
}

/// Sums exact encoded name lengths, one terminator byte per name.
struct XattrSizeLister<'a> {
    codec: &'a PathCodec,
    size: usize,
}

impl XattrLister for XattrSizeLister<'_> {
    fn add(&mut self, name: &str) {
        self.size += self.codec.encoded_len(name) + 1;
    }
}

/// Writes each name into the destination, zero-terminated. The first name
/// that does not fit latches the overflow flag; nothing partial is written
/// for it and later names are dropped, since the whole call will report
/// `ERANGE`.
struct XattrNameEncoder<'a, 'b> {
    codec: &'a PathCodec,
    dst: &'a mut OutBuf<'b>,
    overflow: bool,
}

impl XattrLister for XattrNameEncoder<'_, '_> {
    fn add(&mut self, name: &str) {
        if self.overflow {
            return;
        }
        if self.codec.encode(name, self.dst).is_err() || self.dst.push(0).is_err() {
            self.overflow = true;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SizeSink;
    use pathfs_core::{FileAttr, FsResult};

    struct Inert;

    impl Filesystem for Inert {
        type Handle = u64;
    }

    struct Faulty;

    impl Filesystem for Faulty {
        type Handle = u64;

        fn getattr(&self, path: &str) -> FsResult<FileAttr> {
            panic!("defect while handling {path}");
        }
    }

    struct NullAttrSink;

    impl AttrSink for NullAttrSink {
        #[allow(clippy::too_many_arguments)]
        fn set(
            &mut self,
            _inode: u64,
            _mode: u32,
            _nlink: u32,
            _uid: u32,
            _gid: u32,
            _rdev: u64,
            _size: u64,
            _blocks: u64,
            _atime: i64,
            _mtime: i64,
            _ctime: i64,
        ) {
        }
    }

    #[test]
    fn unimplemented_operations_return_enosys() {
        let bridge = FsDispatch::new(Inert);
        assert_eq!(bridge.getattr(b"/x", &mut NullAttrSink), libc::ENOSYS);
        assert_eq!(bridge.unlink(b"/x"), libc::ENOSYS);
        assert_eq!(bridge.rename(b"/a", b"/b"), libc::ENOSYS);
        let mut size = 0usize;
        assert_eq!(
            bridge.getxattrsize(b"/x", b"user.a", &mut size),
            libc::ENOSYS
        );
    }

    #[test]
    fn implementation_panic_becomes_efault_and_bridge_survives() {
        let bridge = FsDispatch::new(Faulty);
        assert_eq!(bridge.getattr(b"/x", &mut NullAttrSink), libc::EFAULT);
        // The next call still dispatches normally.
        assert_eq!(bridge.unlink(b"/x"), libc::ENOSYS);
    }

    #[test]
    fn is_implemented_rejects_unknown_names() {
        let bridge = FsDispatch::new(Inert);
        let mut implemented = true;
        assert_eq!(bridge.is_implemented(b"getattr", &mut implemented), OK);
        assert!(!implemented);
        assert_eq!(
            bridge.is_implemented(b"listxattrsize", &mut implemented),
            libc::EINVAL
        );
    }

    #[test]
    fn setxattr_rejects_unknown_flag_combinations() {
        let bridge = FsDispatch::new(Inert);
        assert_eq!(bridge.setxattr(b"/x", b"user.a", b"v", 0x3), libc::EINVAL);
        assert_eq!(bridge.setxattr(b"/x", b"user.a", b"v", 0x40), libc::EINVAL);
    }

    #[test]
    fn size_sink_impl_for_usize_records_value() {
        let mut size = 0usize;
        SizeSink::set_size(&mut size, 17);
        assert_eq!(size, 17);
    }
}
