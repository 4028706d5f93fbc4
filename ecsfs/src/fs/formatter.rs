// SPDX-License-Identifier: MIT

use log::debug;

pub use crate::core::formatter::*;

use crate::core::fat::{self, FatEntry};
use crate::fs::{constant::*, meta::*, types::*};
use ecsio::{BLOCK_SIZE, BlockDevice, BlockIOStructExt};

/// Layout requested from the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct FormatOptions {
    pub data_blocks: u16,
}

impl FormatOptions {
    pub const fn new(data_blocks: u16) -> Self {
        Self { data_blocks }
    }

    /// Geometry these options produce.
    pub fn geometry(&self) -> FsFormatterResult<EcsMeta> {
        EcsMeta::for_data_blocks(self.data_blocks)
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_BLOCKS)
    }
}

/// EcsFormatter:
/// - Writes the superblock, an allocation table with only the reserved entry
///   in use, and an empty directory block.
/// - A full format also zeroes every data block.
/// - The device must be exactly as large as the requested layout.
pub struct EcsFormatter<D: BlockDevice> {
    dev: D,
    opts: FormatOptions,
}

impl<D: BlockDevice> EcsFormatter<D> {
    pub fn new(dev: D, opts: FormatOptions) -> Self {
        Self { dev, opts }
    }

    /// Formatter using the largest layout the device can hold.
    pub fn for_device(dev: D) -> FsFormatterResult<Self> {
        let meta = EcsMeta::for_device_blocks(dev.block_count())?;
        Ok(Self::new(dev, FormatOptions::new(meta.data_blocks)))
    }

    #[inline]
    pub fn options(&self) -> &FormatOptions {
        &self.opts
    }

    pub fn into_inner(self) -> D {
        self.dev
    }

    fn write_superblock(&mut self, meta: &EcsMeta) -> FsFormatterResult {
        let sb = EcsSuperblock::from_meta(meta);
        self.dev.write_struct(ECS_SUPERBLOCK_INDEX, &sb)?;
        Ok(())
    }

    fn write_fat_region(&mut self, meta: &EcsMeta) -> FsFormatterResult {
        // only entry 0 needs encoding; the rest of the region is zero
        let reserved = [FatEntry::EndOfChain];
        let mut raw = [0u8; BLOCK_SIZE];
        for (i, block) in meta.fat_range().enumerate() {
            fat::table::encode_block(i, &reserved, &mut raw);
            self.dev.write_block(block, &raw)?;
        }
        Ok(())
    }

    fn write_root_dir(&mut self, meta: &EcsMeta) -> FsFormatterResult {
        self.dev.write_struct(meta.root_dir_block(), &EcsDirBlock::empty())?;
        Ok(())
    }
}

impl<D: BlockDevice> FsFormatter for EcsFormatter<D> {
    fn format(&mut self, full_format: bool) -> FsFormatterResult {
        let meta = self.opts.geometry()?;
        if self.dev.block_count() != meta.required_blocks() {
            return Err(FsFormatterError::Invalid("Device size does not match the requested layout"));
        }

        self.write_superblock(&meta)?;
        self.write_fat_region(&meta)?;
        self.write_root_dir(&meta)?;
        if full_format {
            zero_data_region(&mut self.dev, &meta)?;
        }
        self.flush()?;
        debug!("ecsfs: formatted {meta} (full={full_format})");
        Ok(())
    }

    fn flush(&mut self) -> FsFormatterResult<()> {
        self.dev.flush()?;
        Ok(())
    }
}
