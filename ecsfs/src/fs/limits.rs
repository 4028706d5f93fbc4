// SPDX-License-Identifier: MIT

use crate::fs::constant::*;

/// Runtime bounds of a mounted volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct FsLimits {
    /// Directory slots `create` may use, at most the 128 slots of the directory block.
    pub max_files: usize,
    /// Handles that may be open at the same time, at most 1024.
    pub max_open_files: usize,
}

impl FsLimits {
    pub const fn new(max_files: usize, max_open_files: usize) -> Self {
        Self {
            max_files,
            max_open_files,
        }
    }

    /// `max_files` clamped to the directory block.
    #[inline]
    pub fn max_files(&self) -> usize {
        self.max_files.min(ECS_DIR_ENTRIES)
    }

    /// `max_open_files` clamped to the handle table bound.
    #[inline]
    pub fn max_open_files(&self) -> usize {
        self.max_open_files.min(MAX_OPEN_FILES)
    }
}

impl Default for FsLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILES, DEFAULT_MAX_OPEN_FILES)
    }
}
