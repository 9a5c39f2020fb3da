// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Attribute and statistics value objects

/// POSIX mode bit vocabulary used throughout the contract.
pub mod mode {
    /// Mask for the permission bits, including SUID/SGID/sticky.
    pub const PERMISSION_MASK: u32 = 0o007777;

    pub const SUID_BIT: u32 = 0o004000;
    pub const SGID_BIT: u32 = 0o002000;
    pub const STICKY_BIT: u32 = 0o001000;

    pub const OWNER_MASK: u32 = 0o000700;
    pub const OWNER_READ: u32 = 0o000400;
    pub const OWNER_WRITE: u32 = 0o000200;
    pub const OWNER_EXECUTE: u32 = 0o000100;

    pub const GROUP_MASK: u32 = 0o000070;
    pub const GROUP_READ: u32 = 0o000040;
    pub const GROUP_WRITE: u32 = 0o000020;
    pub const GROUP_EXECUTE: u32 = 0o000010;

    pub const OTHER_MASK: u32 = 0o000007;
    pub const OTHER_READ: u32 = 0o000004;
    pub const OTHER_WRITE: u32 = 0o000002;
    pub const OTHER_EXECUTE: u32 = 0o000001;

    pub const TYPE_MASK: u32 = 0o170000;
    pub const TYPE_SOCKET: u32 = 0o140000;
    pub const TYPE_SYMLINK: u32 = 0o120000;
    pub const TYPE_FILE: u32 = 0o100000;
    pub const TYPE_BLOCKDEV: u32 = 0o060000;
    pub const TYPE_DIR: u32 = 0o040000;
    pub const TYPE_CHARDEV: u32 = 0o020000;
    pub const TYPE_FIFO: u32 = 0o010000;
}

/// File type. Every attribute snapshot carries exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    Socket,
    Symlink,
    Regular,
    BlockDevice,
    Directory,
    CharDevice,
    Fifo,
}

impl FileKind {
    /// The `TYPE_*` bit group for this kind.
    pub const fn bits(self) -> u32 {
        match self {
            FileKind::Socket => mode::TYPE_SOCKET,
            FileKind::Symlink => mode::TYPE_SYMLINK,
            FileKind::Regular => mode::TYPE_FILE,
            FileKind::BlockDevice => mode::TYPE_BLOCKDEV,
            FileKind::Directory => mode::TYPE_DIR,
            FileKind::CharDevice => mode::TYPE_CHARDEV,
            FileKind::Fifo => mode::TYPE_FIFO,
        }
    }

    /// Extract the kind from a full mode word, if the type bits are valid.
    pub fn from_mode(mode_word: u32) -> Option<FileKind> {
        match mode_word & mode::TYPE_MASK {
            mode::TYPE_SOCKET => Some(FileKind::Socket),
            mode::TYPE_SYMLINK => Some(FileKind::Symlink),
            mode::TYPE_FILE => Some(FileKind::Regular),
            mode::TYPE_BLOCKDEV => Some(FileKind::BlockDevice),
            mode::TYPE_DIR => Some(FileKind::Directory),
            mode::TYPE_CHARDEV => Some(FileKind::CharDevice),
            mode::TYPE_FIFO => Some(FileKind::Fifo),
            _ => None,
        }
    }
}

/// File metadata snapshot returned by `getattr`.
///
/// Timestamps are seconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileAttr {
    pub inode: u64,
    pub mode: u32,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u64,
    pub size: u64,
    pub blocks: u64,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
}

impl FileAttr {
    pub fn builder(kind: FileKind) -> FileAttrBuilder {
        FileAttrBuilder {
            kind,
            perm: 0,
            inode: 0,
            nlink: 0,
            uid: 0,
            gid: 0,
            rdev: 0,
            size: 0,
            blocks: 0,
            atime: 0,
            mtime: 0,
            ctime: 0,
        }
    }

    pub fn kind(&self) -> Option<FileKind> {
        FileKind::from_mode(self.mode)
    }

    pub fn perm(&self) -> u32 {
        self.mode & mode::PERMISSION_MASK
    }
}

/// Builder for [`FileAttr`]. The type bits come from the [`FileKind`] the
/// builder was created with and the permission bits from `perm`; the two are
/// merged exactly once in [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct FileAttrBuilder {
    kind: FileKind,
    perm: u32,
    inode: u64,
    nlink: u32,
    uid: u32,
    gid: u32,
    rdev: u64,
    size: u64,
    blocks: u64,
    atime: i64,
    mtime: i64,
    ctime: i64,
}

impl FileAttrBuilder {
    pub fn build(self) -> FileAttr {
        FileAttr {
            inode: self.inode,
            mode: self.kind.bits() | (self.perm & mode::PERMISSION_MASK),
            nlink: self.nlink,
            uid: self.uid,
            gid: self.gid,
            rdev: self.rdev,
            size: self.size,
            blocks: self.blocks,
            atime: self.atime,
            mtime: self.mtime,
            ctime: self.ctime,
        }
    }

    pub fn perm(mut self, perm: u32) -> Self {
        self.perm = perm;
        self
    }

    pub fn inode(mut self, inode: u64) -> Self {
        self.inode = inode;
        self
    }

    pub fn nlink(mut self, nlink: u32) -> Self {
        self.nlink = nlink;
        self
    }

    pub fn uid(mut self, uid: u32) -> Self {
        self.uid = uid;
        self
    }

    pub fn gid(mut self, gid: u32) -> Self {
        self.gid = gid;
        self
    }

    pub fn rdev(mut self, rdev: u64) -> Self {
        self.rdev = rdev;
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn blocks(mut self, blocks: u64) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn atime(mut self, atime: i64) -> Self {
        self.atime = atime;
        self
    }

    pub fn mtime(mut self, mtime: i64) -> Self {
        self.mtime = mtime;
        self
    }

    pub fn ctime(mut self, ctime: i64) -> Self {
        self.ctime = ctime;
        self
    }
}

/// Filesystem statistics returned by `statfs`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FsStatfs {
    pub block_size: u32,
    pub blocks: u64,
    pub blocks_free: u64,
    pub blocks_avail: u64,
    pub files: u64,
    pub files_free: u64,
    pub namelen: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_merges_type_and_permission_bits_once() {
        let attr = FileAttr::builder(FileKind::Regular)
            .perm(0o644)
            .inode(42)
            .nlink(1)
            .size(17)
            .blocks(1)
            .build();
        assert_eq!(attr.mode, mode::TYPE_FILE | 0o644);
        assert_eq!(attr.kind(), Some(FileKind::Regular));
        assert_eq!(attr.perm(), 0o644);
    }

    #[test]
    fn builder_masks_stray_type_bits_out_of_perm() {
        let attr = FileAttr::builder(FileKind::Directory).perm(0o40755).build();
        assert_eq!(attr.mode, mode::TYPE_DIR | 0o755);
    }

    #[test]
    fn kind_round_trips_through_mode_bits() {
        for kind in [
            FileKind::Socket,
            FileKind::Symlink,
            FileKind::Regular,
            FileKind::BlockDevice,
            FileKind::Directory,
            FileKind::CharDevice,
            FileKind::Fifo,
        ] {
            assert_eq!(FileKind::from_mode(kind.bits() | 0o777), Some(kind));
        }
        assert_eq!(FileKind::from_mode(0), None);
    }
}
