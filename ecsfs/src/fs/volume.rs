// SPDX-License-Identifier: MIT

use core::fmt;

use log::{debug, warn};

use crate::core::errors::*;
use crate::fs::{
    allocator::AllocationTable,
    constant::*,
    directory::Directory,
    handles::{FileHandle, OpenFileTable},
    limits::FsLimits,
    meta::*,
    types::EcsSuperblock,
};
use ecsio::{BlockDevice, BlockIOStructExt};

/// Summary of a mounted volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeInfo {
    pub total_blocks: u16,
    pub fat_blocks: u8,
    pub root_dir_block: u16,
    pub data_start_block: u16,
    pub data_blocks: u16,
    pub free_data_blocks: usize,
    pub free_dir_entries: usize,
    pub max_files: usize,
}

impl fmt::Display for VolumeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FS Info:")?;
        writeln!(f, "total_blk_count={}", self.total_blocks)?;
        writeln!(f, "fat_blk_count={}", self.fat_blocks)?;
        writeln!(f, "rdir_blk={}", self.root_dir_block)?;
        writeln!(f, "data_blk={}", self.data_start_block)?;
        writeln!(f, "data_blk_count={}", self.data_blocks)?;
        writeln!(f, "fat_free_ratio={}/{}", self.free_data_blocks, self.data_blocks)?;
        writeln!(f, "rdir_free_ratio={}/{}", self.free_dir_entries, self.max_files)
    }
}

/// Everything loaded from a device between mount and unmount.
#[derive(Debug)]
pub struct Volume<D: BlockDevice> {
    pub(crate) dev: D,
    pub(crate) meta: EcsMeta,
    pub(crate) table: AllocationTable,
    pub(crate) dir: Directory,
    pub(crate) files: OpenFileTable,
}

impl<D: BlockDevice> Volume<D> {
    /// Validates block 0 and loads the allocation table and the directory.
    pub fn mount(mut dev: D, limits: &FsLimits) -> FsResult<Self> {
        let blocks = dev.block_count();
        if blocks < ECS_MIN_BLOCKS {
            return Err(FsError::Volume("Device too small to hold a volume"));
        }

        let sb: EcsSuperblock = dev.read_struct(ECS_SUPERBLOCK_INDEX)?;
        let meta = EcsMeta::from_superblock(&sb, blocks)?;
        let table = AllocationTable::load(&mut dev, &meta)?;
        let dir = Directory::load(&mut dev, &meta, limits.max_files())?;

        if table.entries()[ECS_RESERVED_ENTRY as usize].is_free() {
            warn!("ecsfs: reserved allocation entry is marked free");
        }
        debug!("ecsfs: mounted volume, {meta}");

        Ok(Self {
            dev,
            meta,
            table,
            dir,
            files: OpenFileTable::new(limits.max_open_files()),
        })
    }

    /// Flushes the device and hands it back.
    pub fn into_device(mut self) -> FsResult<D> {
        self.dev.flush()?;
        Ok(self.dev)
    }

    pub fn info(&self) -> VolumeInfo {
        VolumeInfo {
            total_blocks: self.meta.total_blocks,
            fat_blocks: self.meta.fat_blocks,
            root_dir_block: self.meta.root_dir_index,
            data_start_block: self.meta.data_start_index,
            data_blocks: self.meta.data_blocks,
            free_data_blocks: self.table.free_block_count(),
            free_dir_entries: self.dir.free_slots(),
            max_files: self.dir.max_files(),
        }
    }

    #[inline]
    pub fn meta(&self) -> &EcsMeta {
        &self.meta
    }

    #[inline]
    pub fn table(&self) -> &AllocationTable {
        &self.table
    }

    #[inline]
    pub fn directory(&self) -> &Directory {
        &self.dir
    }

    #[inline]
    pub fn open_files(&self) -> &OpenFileTable {
        &self.files
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.dev
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.dev
    }

    pub fn create(&mut self, name: &str) -> FsResult {
        self.dir.create(&mut self.dev, name)?;
        Ok(())
    }

    /// Deletes `name`, closing every handle still bound to it.
    pub fn delete(&mut self, name: &str) -> FsResult {
        let removed = self.dir.remove(&mut self.dev, &mut self.table, name);
        // the slot can be gone even when freeing the chain failed
        if !self.dir.exists(name) {
            let closed = self.files.close_all_for(name);
            if closed > 0 {
                debug!("ecsfs: closed {closed} handle(s) of deleted {name:?}");
            }
        }
        removed.map(drop)
    }

    pub fn open(&mut self, name: &str) -> FsResult<FileHandle> {
        if !self.dir.exists(name) {
            return Err(FsError::NotFound);
        }
        let fh = self.files.open(name)?;
        debug!("ecsfs: opened {name:?} as {fh}");
        Ok(fh)
    }

    pub fn close(&mut self, fh: FileHandle) -> FsResult {
        self.files.close(fh)
    }

    /// Moves the cursor of `fh`; `offset` may equal the file size.
    pub fn seek(&mut self, fh: FileHandle, offset: u64) -> FsResult<u64> {
        let (slot, _) = self.resolve(fh)?;
        let size = u64::from(self.dir.entry(slot).size());
        if offset > size {
            return Err(FsError::OffsetOutOfRange);
        }
        self.files.get_mut(fh)?.offset = offset;
        Ok(offset)
    }

    pub fn stat(&self, fh: FileHandle) -> FsResult<u32> {
        let (slot, _) = self.resolve(fh)?;
        Ok(self.dir.entry(slot).size())
    }

    pub fn tell(&self, fh: FileHandle) -> FsResult<u64> {
        Ok(self.files.get(fh)?.offset)
    }

    /// Directory slot and cursor of an open handle.
    pub(crate) fn resolve(&self, fh: FileHandle) -> FsResult<(usize, u64)> {
        let file = self.files.get(fh)?;
        let slot = self.dir.find(&file.name).ok_or(FsError::BadHandle)?;
        Ok((slot, file.offset))
    }
}
