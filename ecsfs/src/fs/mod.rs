// SPDX-License-Identifier: MIT

pub mod allocator;
pub mod checker;
pub mod constant;
pub mod directory;
pub mod filesystem;
pub mod formatter;
pub mod handles;
mod io;
pub mod limits;
pub mod meta;
pub mod types;
pub mod volume;

// === Public Interface ===
pub mod traits {
    pub use super::allocator::AllocationTable;
    pub use super::checker::EcsChecker;
    pub use super::directory::{DirEntry, DirIter, Directory};
    pub use super::formatter::{EcsFormatter, FormatOptions};
    pub use super::handles::{FileHandle, OpenFileTable};
    pub use super::meta::{EcsMeta, VolumeGeometry};
}

pub mod prelude {
    pub use super::filesystem::FileSystem;
    pub use super::limits::FsLimits;
    pub use super::traits::*;
    pub use super::volume::{Volume, VolumeInfo};
    pub use crate::core::checker::{Finding, Severity, VerifyPhases, VerifyReport};
    pub use crate::core::errors::*;
    pub use crate::core::traits::*;
    pub use ecsio::prelude::*;
}
