// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Native-facing output contracts
//!
//! Each trait mirrors one setter surface of the native callback ABI; the
//! dispatch marshals high-level results into these instead of returning
//! structured values across the boundary.

/// Receives the fields of an attribute snapshot.
pub trait AttrSink {
    #[allow(clippy::too_many_arguments)]
    fn set(
        &mut self,
        inode: u64,
        mode: u32,
        nlink: u32,
        uid: u32,
        gid: u32,
        rdev: u64,
        size: u64,
        blocks: u64,
        atime: i64,
        mtime: i64,
        ctime: i64,
    );
}

/// Receives the fields of a statistics snapshot.
pub trait StatfsSink {
    #[allow(clippy::too_many_arguments)]
    fn set(
        &mut self,
        block_size: u32,
        blocks: u64,
        blocks_free: u64,
        blocks_avail: u64,
        files: u64,
        files_free: u64,
        namelen: u32,
    );
}

/// Receives the byte length reported by a size-probe query.
pub trait SizeSink {
    fn set_size(&mut self, size: usize);
}

impl SizeSink for usize {
    fn set_size(&mut self, size: usize) {
        *self = size;
    }
}

/// Open negotiation: carries the native cache hints in and the opaque
/// session handle out.
pub trait OpenSink<H> {
    fn direct_io(&self) -> bool;
    fn keep_cache(&self) -> bool;
    fn set_handle(&mut self, handle: H);
}

/// Native directory-entry accumulator. Entries arrive one at a time, in the
/// order the filesystem pushed them, names already encoded.
pub trait DirSink {
    fn add(&mut self, name: &[u8], inode: u64, mode: u32);
}
