// SPDX-License-Identifier: MIT

use alloc::string::String;

use log::{debug, warn};

use crate::core::errors::*;
use crate::core::utils::{Bitmap, name_utils};
use crate::fs::{allocator::AllocationTable, constant::*, meta::EcsMeta, types::*};
use crate::{bail, ensure};
use ecsio::{BlockDevice, BlockIOStructExt};

/// Decoded view of a used directory slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub size: u32,
    pub first_block: Option<u16>,
}

impl DirEntry {
    fn from_raw(raw: &EcsDirEntry) -> Self {
        Self {
            name: name_utils::decode_name(&raw.name).into_owned(),
            size: raw.size(),
            first_block: raw.first_block(),
        }
    }
}

/// The root directory block plus a slot bitmap for first-empty-slot lookups.
#[derive(Debug, Clone)]
pub struct Directory {
    raw: EcsDirBlock,
    used: Bitmap,
    max_files: usize,
    block_index: usize,
}

impl Directory {
    /// Empty directory of a freshly formatted volume.
    pub fn formatted(meta: &EcsMeta) -> Self {
        Self::from_raw(EcsDirBlock::empty(), meta, ECS_DIR_ENTRIES)
    }

    pub fn load<D: BlockDevice + ?Sized>(dev: &mut D, meta: &EcsMeta, max_files: usize) -> FsResult<Self> {
        let raw: EcsDirBlock = dev.read_struct(meta.root_dir_block())?;
        let dir = Self::from_raw(raw, meta, max_files);
        debug!("ecsfs: loaded directory, {} file(s)", dir.file_count());
        Ok(dir)
    }

    fn from_raw(raw: EcsDirBlock, meta: &EcsMeta, max_files: usize) -> Self {
        let mut used = Bitmap::new(ECS_DIR_ENTRIES);
        for (i, e) in raw.entries.iter().enumerate() {
            used.set(i, e.is_used());
        }
        Self {
            raw,
            used,
            max_files: max_files.min(ECS_DIR_ENTRIES),
            block_index: meta.root_dir_block(),
        }
    }

    pub fn store<D: BlockDevice + ?Sized>(&self, dev: &mut D) -> FsResult {
        dev.write_struct(self.block_index, &self.raw)?;
        Ok(())
    }

    #[inline]
    pub fn max_files(&self) -> usize {
        self.max_files
    }

    #[inline]
    pub fn file_count(&self) -> usize {
        self.used.ones()
    }

    /// Slots `create` may still use.
    pub fn free_slots(&self) -> usize {
        (0..self.max_files).filter(|&i| !self.used.get(i)).count()
    }

    /// Slot holding `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.used
            .iter_ones()
            .find(|&slot| self.raw.entries[slot].name_matches(name))
    }

    #[inline]
    pub fn exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn stat_by_name(&self, name: &str) -> FsResult<u32> {
        let slot = self.find(name).ok_or(FsError::NotFound)?;
        Ok(self.raw.entries[slot].size())
    }

    #[inline]
    pub fn entry(&self, slot: usize) -> &EcsDirEntry {
        &self.raw.entries[slot]
    }

    #[inline]
    pub fn entry_mut(&mut self, slot: usize) -> &mut EcsDirEntry {
        &mut self.raw.entries[slot]
    }

    /// Installs an empty file and returns its slot. No data block is reserved.
    pub fn create<D: BlockDevice + ?Sized>(&mut self, dev: &mut D, name: &str) -> FsResult<usize> {
        ensure!(name_utils::is_valid_name(name, ECS_NAME_LEN), FsError::InvalidName);
        ensure!(!self.exists(name), FsError::AlreadyExists);

        let Some(slot) = self.used.first_zero_in(0, self.max_files) else {
            bail!(FsError::DirectoryFull);
        };
        self.commit_slot(dev, slot, EcsDirEntry::new_file(name))?;
        debug!("ecsfs: created {name:?} in slot {slot}");
        Ok(slot)
    }

    /// Clears the file's slot, then releases its chain. Returns the number of
    /// blocks given back to the allocation table.
    ///
    /// The slot goes first: if the table cannot be stored afterwards the
    /// blocks stay allocated but unreferenced, never reachable twice.
    pub fn remove<D: BlockDevice + ?Sized>(
        &mut self,
        dev: &mut D,
        table: &mut AllocationTable,
        name: &str,
    ) -> FsResult<usize> {
        let slot = self.find(name).ok_or(FsError::NotFound)?;
        let head = self.raw.entries[slot].first_block();
        // a broken chain is reported while the file is still there
        table.chain_len(head)?;

        let mut cleared = self.raw.entries[slot];
        cleared.clear();
        self.commit_slot(dev, slot, cleared)?;
        let released = table.release_chain(dev, head).inspect_err(|e| {
            warn!("ecsfs: deleted {name:?} but could not free chain {head:?}: {e:?}");
        })?;
        debug!("ecsfs: deleted {name:?} from slot {slot}, {released} block(s) freed");
        Ok(released)
    }

    /// Replaces slot `slot` and stores the block. On a failed store the
    /// previous slot is put back.
    pub fn commit_slot<D: BlockDevice + ?Sized>(
        &mut self,
        dev: &mut D,
        slot: usize,
        entry: EcsDirEntry,
    ) -> FsResult {
        let previous = core::mem::replace(&mut self.raw.entries[slot], entry);
        self.used.set(slot, entry.is_used());
        if let Err(e) = self.store(dev) {
            self.raw.entries[slot] = previous;
            self.used.set(slot, previous.is_used());
            return Err(e);
        }
        Ok(())
    }

    /// Used slots in slot order.
    pub fn list(&self) -> DirIter<'_> {
        DirIter { dir: self, slot: 0 }
    }

    /// Raw slots, used or not.
    pub fn raw_entries(&self) -> &[EcsDirEntry] {
        &self.raw.entries
    }
}

/// Lazy iterator over the used slots of a [`Directory`].
#[derive(Debug, Clone)]
pub struct DirIter<'a> {
    dir: &'a Directory,
    slot: usize,
}

impl Iterator for DirIter<'_> {
    type Item = DirEntry;

    fn next(&mut self) -> Option<Self::Item> {
        while self.slot < ECS_DIR_ENTRIES {
            let slot = self.slot;
            self.slot += 1;
            if self.dir.used.get(slot) {
                return Some(DirEntry::from_raw(&self.dir.raw.entries[slot]));
            }
        }
        None
    }
}
