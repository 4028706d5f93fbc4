// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

//! Single-volume, FAT-style file storage engine on a fixed-size block device.
//!
//! A volume is a superblock, an allocation table of 16-bit entries, one
//! directory block of 128 slots, and the data blocks. [`FileSystem`] mounts a
//! volume from any [`ecsio::BlockDevice`] and exposes create / delete / open /
//! read / write / seek / stat / close on it.

extern crate alloc;

// Core Modules
pub mod core;
pub mod fs;

// Reusable types and traits
pub use crate::core::errors::*;
pub use crate::core::traits::*;

pub use crate::fs::prelude::{FileHandle, FileSystem, FsLimits, VolumeInfo};

/// Everything needed to format, mount and drive a volume.
pub mod prelude {
    pub use super::fs::prelude::*;
}
