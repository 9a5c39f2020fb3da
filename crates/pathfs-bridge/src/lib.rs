// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! pathfs bridge — native byte-level dispatch over the pathfs contract
//!
//! The native side speaks byte buffers and errno status codes; the high
//! level side speaks text paths and structured results. [`FsDispatch`]
//! translates between the two, one self-contained call at a time: no
//! failure, declared or not, crosses the boundary as anything but a status
//! code.

pub mod codec;
pub mod dispatch;
pub mod errno;
pub mod sink;

pub use codec::{CodecConfig, PathCodec};
pub use dispatch::{FsDispatch, OK};
pub use errno::errno;
pub use sink::{AttrSink, DirSink, OpenSink, SizeSink, StatfsSink};

// The bounded destination buffer is part of both surfaces; re-export it so
// native embedders need only this crate.
pub use pathfs_core::OutBuf;
