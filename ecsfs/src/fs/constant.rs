// SPDX-License-Identifier: MIT

use ecsio::BLOCK_SIZE;

// === Disk Layout Parameters ===

pub const ECS_SIGNATURE: &[u8; 8] = b"ECS150FS";
pub const ECS_SUPERBLOCK_INDEX: usize = 0;
pub const ECS_FAT_START_INDEX: usize = 1;

/// Superblock + one FAT block + directory + one data block.
pub const ECS_MIN_BLOCKS: usize = 4;

// === Allocation Table Parameters ===

/// Entry 0 never belongs to a file.
pub const ECS_RESERVED_ENTRY: u16 = 0;
pub const ECS_FIRST_DATA_UNIT: u16 = 1;

pub const ECS_MIN_DATA_BLOCKS: u16 = 2;
/// 0xFFFF is the end-of-chain marker and cannot index a block.
pub const ECS_MAX_DATA_BLOCKS: u16 = 0xFFFE;

// === Directory Parameters ===

pub const ECS_DIR_ENTRY_SIZE: usize = 32;
pub const ECS_DIR_ENTRIES: usize = BLOCK_SIZE / ECS_DIR_ENTRY_SIZE;
pub const ECS_NAME_LEN: usize = 16;

/// `first_block` value of a file without data.
pub const ECS_NO_DATA: u16 = 0xFFFF;

// === Runtime defaults ===

pub const DEFAULT_MAX_FILES: usize = ECS_DIR_ENTRIES;
pub const DEFAULT_MAX_OPEN_FILES: usize = 32;
/// Upper bound on `max_open_files`; the handle table is allocated up front.
pub const MAX_OPEN_FILES: usize = 1024;
/// 32 MiB of data.
pub const DEFAULT_DATA_BLOCKS: u16 = 8192;
