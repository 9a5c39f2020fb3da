// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! pathfs contract — the high-level, path-based filesystem surface
//!
//! A user filesystem implements [`Filesystem`] over text paths and structured
//! value objects; the companion `pathfs-bridge` crate adapts that contract to
//! a native, byte-oriented callback surface.

pub mod attr;
pub mod buf;
pub mod encoding;
pub mod error;
pub mod fs;
pub mod session;

pub use attr::{mode, FileAttr, FileAttrBuilder, FileKind, FsStatfs};
pub use buf::OutBuf;
pub use error::{ErrorKind, FsError, FsResult};
pub use fs::{
    CapabilitySet, DirFiller, Filesystem, FsOperation, XattrLister, XattrSetMode, XATTR_CREATE,
    XATTR_REPLACE,
};
pub use session::{AccessMode, OpenSession};
