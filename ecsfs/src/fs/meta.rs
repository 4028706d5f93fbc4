// SPDX-License-Identifier: MIT

pub use crate::core::meta::*;

use core::fmt;

use crate::core::errors::*;
use crate::core::fat;
use crate::fs::{constant::*, types::EcsSuperblock};

/// Geometry of a volume: where the table, the directory and the data live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcsMeta {
    pub total_blocks: u16,
    pub fat_blocks: u8,
    pub root_dir_index: u16,
    pub data_start_index: u16,
    pub data_blocks: u16,
}

/// Layout computed ahead of formatting.
pub type VolumeGeometry = EcsMeta;

impl EcsMeta {
    /// Layout of a volume holding `data_blocks` data blocks.
    pub fn for_data_blocks(data_blocks: u16) -> FsFormatterResult<Self> {
        if !(ECS_MIN_DATA_BLOCKS..=ECS_MAX_DATA_BLOCKS).contains(&data_blocks) {
            return Err(FsFormatterError::Invalid("Data block count out of range"));
        }

        let fat_blocks = fat::table::blocks_for(data_blocks as usize);
        let root_dir_index = ECS_FAT_START_INDEX + fat_blocks;
        let data_start_index = root_dir_index + 1;
        let total_blocks = data_start_index + data_blocks as usize;

        let (Ok(total_blocks), Ok(fat_blocks)) = (u16::try_from(total_blocks), u8::try_from(fat_blocks)) else {
            return Err(FsFormatterError::Invalid("Volume too large for 16-bit block indices"));
        };

        Ok(Self {
            total_blocks,
            fat_blocks,
            root_dir_index: root_dir_index as u16,
            data_start_index: data_start_index as u16,
            data_blocks,
        })
    }

    /// Largest layout that fits a device of `device_blocks` blocks.
    pub fn for_device_blocks(device_blocks: usize) -> FsFormatterResult<Self> {
        if device_blocks < ECS_MIN_BLOCKS {
            return Err(FsFormatterError::Invalid("Device too small for a volume"));
        }
        let mut data = (device_blocks - 3).min(ECS_MAX_DATA_BLOCKS as usize);
        loop {
            let needed = 2 + fat::table::blocks_for(data) + data;
            if needed <= device_blocks && needed <= u16::MAX as usize {
                break;
            }
            data -= 1;
        }
        Self::for_data_blocks(data as u16)
    }

    /// Reads the layout back from a superblock and checks it against the device.
    pub fn from_superblock(sb: &EcsSuperblock, device_blocks: usize) -> FsResult<Self> {
        if !sb.has_signature() {
            return Err(FsError::CorruptVolume("Bad signature"));
        }

        let meta = Self {
            total_blocks: sb.total_blocks.get(),
            fat_blocks: sb.fat_block_count,
            root_dir_index: sb.root_dir_index.get(),
            data_start_index: sb.data_start_index.get(),
            data_blocks: sb.data_block_count.get(),
        };

        if meta.data_blocks == 0 {
            return Err(FsError::CorruptVolume("Volume has no data blocks"));
        }
        if meta.fat_blocks as usize != fat::table::blocks_for(meta.data_blocks as usize) {
            return Err(FsError::CorruptVolume("FAT block count does not match data block count"));
        }
        if meta.root_dir_index as usize != ECS_FAT_START_INDEX + meta.fat_blocks as usize {
            return Err(FsError::CorruptVolume("Root directory index mismatch"));
        }
        if meta.data_start_index as usize != meta.root_dir_index as usize + 1 {
            return Err(FsError::CorruptVolume("Data start index mismatch"));
        }
        if meta.total_blocks as usize != meta.data_start_index as usize + meta.data_blocks as usize {
            return Err(FsError::CorruptVolume("Total block count mismatch"));
        }
        if meta.total_blocks as usize != device_blocks {
            return Err(FsError::CorruptVolume("Block count does not match device"));
        }

        Ok(meta)
    }

    /// Device blocks needed to hold this volume.
    #[inline]
    pub fn required_blocks(&self) -> usize {
        self.total_blocks as usize
    }

    /// Device blocks of the allocation table.
    #[inline]
    pub fn fat_range(&self) -> core::ops::Range<usize> {
        ECS_FAT_START_INDEX..ECS_FAT_START_INDEX + self.fat_blocks as usize
    }

    #[inline]
    pub fn root_dir_block(&self) -> usize {
        self.root_dir_index as usize
    }
}

impl FsMeta<u16> for EcsMeta {
    fn unit_block(&self, unit: u16) -> usize {
        self.data_start_index as usize + unit as usize
    }

    fn first_data_unit(&self) -> u16 {
        ECS_FIRST_DATA_UNIT
    }

    fn last_data_unit(&self) -> u16 {
        self.data_blocks - 1
    }

    fn total_units(&self) -> usize {
        self.data_blocks as usize
    }
}

impl fmt::Display for EcsMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} blocks (fat={} rdir={} data={}+{})",
            self.total_blocks, self.fat_blocks, self.root_dir_index, self.data_start_index, self.data_blocks
        )
    }
}
