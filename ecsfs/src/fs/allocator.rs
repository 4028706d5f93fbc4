// SPDX-License-Identifier: MIT

use alloc::vec;
use alloc::vec::Vec;

use log::{debug, trace, warn};

use crate::core::cursor::{ChainCursor, FatTable};
use crate::core::errors::*;
use crate::core::fat::{self, FatEntry};
use crate::core::utils::Bitmap;
use crate::fs::{constant::*, meta::*};
use ecsio::{BLOCK_SIZE, BlockDevice};

/// In-memory copy of the allocation table, written back on every change.
///
/// A used-bitmap mirrors the entries (bit set = entry not `Free`, or the
/// reserved entry) so that first-fit searches skip fully used bytes.
///
/// A change only stays in memory once the table blocks were stored; a failed
/// store puts the touched entries back.
#[derive(Debug, Clone)]
pub struct AllocationTable {
    entries: Vec<FatEntry>,
    used: Bitmap,
    fat_start: usize,
    fat_blocks: usize,
}

impl AllocationTable {
    /// Table of a freshly formatted volume: everything free but the reserved entry.
    pub fn formatted(meta: &EcsMeta) -> Self {
        let mut entries = vec![FatEntry::Free; meta.total_units()];
        entries[ECS_RESERVED_ENTRY as usize] = FatEntry::EndOfChain;
        Self::from_entries(entries, meta)
    }

    /// Reads every table block of the volume.
    pub fn load<D: BlockDevice + ?Sized>(dev: &mut D, meta: &EcsMeta) -> FsResult<Self> {
        let mut entries = vec![FatEntry::Free; meta.total_units()];
        let mut raw = [0u8; BLOCK_SIZE];
        for (i, block) in meta.fat_range().enumerate() {
            dev.read_block(block, &mut raw)?;
            fat::table::decode_block(i, &raw, &mut entries);
        }
        let table = Self::from_entries(entries, meta);
        debug!(
            "ecsfs: loaded allocation table, {} entries, {} free",
            table.entries.len(),
            table.free_block_count()
        );
        Ok(table)
    }

    fn from_entries(entries: Vec<FatEntry>, meta: &EcsMeta) -> Self {
        let mut used = Bitmap::new(entries.len());
        for (i, e) in entries.iter().enumerate() {
            used.set(i, Self::counts_as_used(i, *e));
        }
        Self {
            entries,
            used,
            fat_start: meta.fat_range().start,
            fat_blocks: meta.fat_blocks as usize,
        }
    }

    /// Writes every table block back to the device.
    pub fn store<D: BlockDevice + ?Sized>(&self, dev: &mut D) -> FsResult {
        let mut raw = [0u8; BLOCK_SIZE];
        for i in 0..self.fat_blocks {
            fat::table::encode_block(i, &self.entries, &mut raw);
            dev.write_block(self.fat_start + i, &raw)?;
        }
        trace!("ecsfs: stored {} FAT block(s)", self.fat_blocks);
        Ok(())
    }

    #[inline]
    pub fn entries(&self) -> &[FatEntry] {
        &self.entries
    }

    /// Number of `Free` entries, the reserved entry excluded.
    #[inline]
    pub fn free_block_count(&self) -> usize {
        self.used.zeros()
    }

    /// Lowest free index, entry 0 excluded.
    #[inline]
    pub fn find_free_block(&self) -> Option<u16> {
        self.used
            .first_zero_from(ECS_FIRST_DATA_UNIT as usize)
            .map(|i| i as u16)
    }

    /// Reserves a free block as a one-block chain.
    pub fn allocate_chain_head<D: BlockDevice + ?Sized>(&mut self, dev: &mut D) -> FsResult<u16> {
        let block = self.find_free_block().ok_or(FsAllocatorError::OutOfBlocks)?;
        self.commit(dev, &[(block, FatEntry::EndOfChain)])?;
        debug!("ecsfs: allocated chain head {block}");
        Ok(block)
    }

    /// Appends a free block after `tail` and returns it.
    pub fn extend_chain<D: BlockDevice + ?Sized>(&mut self, dev: &mut D, tail: u16) -> FsResult<u16> {
        match self.entry(tail) {
            Some(FatEntry::EndOfChain) if tail != ECS_RESERVED_ENTRY => {}
            Some(FatEntry::Free) => return Err(FsAllocatorError::FreeEntryInChain(tail).into()),
            _ => return Err(FsAllocatorError::InvalidBlock(tail).into()),
        }

        let block = self.find_free_block().ok_or(FsAllocatorError::OutOfBlocks)?;
        self.commit(dev, &[(tail, FatEntry::Next(block)), (block, FatEntry::EndOfChain)])?;
        debug!("ecsfs: extended chain {tail} -> {block}");
        Ok(block)
    }

    /// Frees every block of the chain starting at `head` and returns how many
    /// were released. A broken chain is reported before anything is freed.
    pub fn release_chain<D: BlockDevice + ?Sized>(
        &mut self,
        dev: &mut D,
        head: Option<u16>,
    ) -> FsResult<usize> {
        if head.is_none() {
            return Ok(0);
        }
        let blocks = self.chain(head).collect::<FsAllocatorResult<Vec<u16>>>()?;
        let changes: Vec<(u16, FatEntry)> = blocks.iter().map(|&b| (b, FatEntry::Free)).collect();
        self.commit(dev, &changes)?;
        debug!("ecsfs: released {} block(s) from chain {:?}", blocks.len(), head);
        Ok(blocks.len())
    }

    /// Block holding byte `offset` of the chain starting at `head`.
    pub fn block_for_offset(&self, head: Option<u16>, offset: u64) -> FsResult<Option<u16>> {
        if head.is_none() {
            return Ok(None);
        }
        let hops = usize::try_from(offset / BLOCK_SIZE as u64)
            .map_err(|_| FsAllocatorError::OffsetBeyondChain)?;
        Ok(self.chain(head).nth_block(hops)?)
    }

    /// Lazy walk over the chain starting at `head`.
    #[inline]
    pub fn chain(&self, head: Option<u16>) -> ChainCursor<'_, Self> {
        ChainCursor::new(self, head)
    }

    /// Number of blocks in the chain starting at `head`.
    pub fn chain_len(&self, head: Option<u16>) -> FsResult<usize> {
        Ok(self.chain(head).count_blocks()?)
    }

    /// Applies `changes` and stores the table. When the store fails the
    /// previous entries are put back, in memory and (best effort) on disk.
    fn commit<D: BlockDevice + ?Sized>(&mut self, dev: &mut D, changes: &[(u16, FatEntry)]) -> FsResult {
        let undo: Vec<(u16, FatEntry)> = changes
            .iter()
            .map(|&(index, _)| (index, self.entries[index as usize]))
            .collect();
        for &(index, entry) in changes {
            self.set(index, entry);
        }

        let Err(e) = self.store(dev) else {
            return Ok(());
        };
        for &(index, entry) in undo.iter().rev() {
            self.set(index, entry);
        }
        if self.store(dev).is_err() {
            warn!("ecsfs: allocation table on disk may differ from memory after a failed store");
        }
        Err(e)
    }

    #[inline]
    fn counts_as_used(index: usize, entry: FatEntry) -> bool {
        index == ECS_RESERVED_ENTRY as usize || !entry.is_free()
    }

    #[inline]
    fn set(&mut self, index: u16, entry: FatEntry) {
        self.entries[index as usize] = entry;
        self.used.set(index as usize, Self::counts_as_used(index as usize, entry));
    }

    /// Overwrites one entry without storing it.
    #[cfg(test)]
    pub(crate) fn force_entry(&mut self, index: u16, entry: FatEntry) {
        self.set(index, entry);
    }
}

impl FatTable for AllocationTable {
    #[inline]
    fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn entry(&self, index: u16) -> Option<FatEntry> {
        self.entries.get(index as usize).copied()
    }
}

#[cfg(all(test, feature = "mem"))]
mod tests {
    use super::*;
    use ecsio::prelude::*;

    fn setup(data_blocks: u16) -> (Disk<MemBlockIO>, EcsMeta, AllocationTable) {
        let meta = EcsMeta::for_data_blocks(data_blocks).unwrap();
        let disk = Disk::new(MemBlockIO::with_blocks(meta.required_blocks())).unwrap();
        let table = AllocationTable::formatted(&meta);
        (disk, meta, table)
    }

    #[test]
    fn test_formatted_table() {
        let (_, _, table) = setup(8);
        assert_eq!(table.entries()[0], FatEntry::EndOfChain);
        assert_eq!(table.free_block_count(), 7);
        assert_eq!(table.find_free_block(), Some(1));
    }

    #[test]
    fn test_first_fit_and_extend() {
        let (mut disk, _, mut table) = setup(8);

        let a = table.allocate_chain_head(&mut disk).unwrap();
        let b = table.allocate_chain_head(&mut disk).unwrap();
        assert_eq!((a, b), (1, 2));

        let a2 = table.extend_chain(&mut disk, a).unwrap();
        assert_eq!(a2, 3);
        assert_eq!(table.entries()[1], FatEntry::Next(3));
        assert_eq!(table.entries()[3], FatEntry::EndOfChain);
        assert_eq!(table.chain_len(Some(a)).unwrap(), 2);
        assert_eq!(table.free_block_count(), 4);

        // released blocks are reused lowest first
        assert_eq!(table.release_chain(&mut disk, Some(b)).unwrap(), 1);
        assert_eq!(table.find_free_block(), Some(2));
    }

    #[test]
    fn test_out_of_blocks() {
        let (mut disk, _, mut table) = setup(3);
        let head = table.allocate_chain_head(&mut disk).unwrap();
        let tail = table.extend_chain(&mut disk, head).unwrap();
        assert_eq!(table.free_block_count(), 0);

        let err = table.extend_chain(&mut disk, tail).unwrap_err();
        assert_eq!(err, FsError::Allocator(FsAllocatorError::OutOfBlocks));
        let err = table.allocate_chain_head(&mut disk).unwrap_err();
        assert!(err.is_out_of_blocks());
    }

    #[test]
    fn test_extend_requires_tail() {
        let (mut disk, _, mut table) = setup(8);
        let head = table.allocate_chain_head(&mut disk).unwrap();
        table.extend_chain(&mut disk, head).unwrap();

        assert_eq!(
            table.extend_chain(&mut disk, head),
            Err(FsError::Allocator(FsAllocatorError::InvalidBlock(head)))
        );
        assert_eq!(
            table.extend_chain(&mut disk, 6),
            Err(FsError::Allocator(FsAllocatorError::FreeEntryInChain(6)))
        );
    }

    #[test]
    fn test_block_for_offset() {
        let (mut disk, _, mut table) = setup(8);
        let head = table.allocate_chain_head(&mut disk).unwrap();
        let second = table.extend_chain(&mut disk, head).unwrap();

        assert_eq!(table.block_for_offset(None, 123_456), Ok(None));
        assert_eq!(table.block_for_offset(Some(head), 0), Ok(Some(head)));
        assert_eq!(table.block_for_offset(Some(head), 4095), Ok(Some(head)));
        assert_eq!(table.block_for_offset(Some(head), 4096), Ok(Some(second)));
        assert_eq!(
            table.block_for_offset(Some(head), 8192),
            Err(FsError::Allocator(FsAllocatorError::OffsetBeyondChain))
        );
    }

    #[test]
    fn test_release_none_is_noop() {
        let (mut disk, _, mut table) = setup(4);
        assert_eq!(table.release_chain(&mut disk, None), Ok(0));
        assert_eq!(table.free_block_count(), 3);
    }

    #[test]
    fn test_broken_chain_is_left_untouched() {
        let (mut disk, _, mut table) = setup(8);
        let head = table.allocate_chain_head(&mut disk).unwrap();
        // point the head at a free entry
        table.set(head, FatEntry::Next(5));

        let err = table.release_chain(&mut disk, Some(head)).unwrap_err();
        assert_eq!(err, FsError::Allocator(FsAllocatorError::FreeEntryInChain(5)));
        assert_eq!(table.entries()[head as usize], FatEntry::Next(5));
    }

    #[test]
    fn test_failed_store_rolls_back() {
        let (mut disk, _, mut table) = setup(8);
        let head = table.allocate_chain_head(&mut disk).unwrap();
        let before = table.clone();

        // a one-block device cannot hold the table block
        let mut tiny = Disk::new(MemBlockIO::with_blocks(1)).unwrap();
        assert_eq!(
            table.extend_chain(&mut tiny, head),
            Err(FsError::IO(BlockIOError::OutOfBounds))
        );
        assert!(table.allocate_chain_head(&mut tiny).is_err());
        assert!(table.release_chain(&mut tiny, Some(head)).is_err());

        assert_eq!(table.entries(), before.entries());
        assert_eq!(table.free_block_count(), before.free_block_count());
        assert_eq!(table.find_free_block(), Some(2));
    }

    #[test]
    fn test_free_reserved_entry_not_counted() {
        let (mut disk, meta, _) = setup(8);
        // table region left all zero: entry 0 reads back as free
        let table = AllocationTable::load(&mut disk, &meta).unwrap();
        assert!(table.entries()[0].is_free());
        assert_eq!(table.free_block_count(), 7);
        assert_eq!(table.find_free_block(), Some(1));
    }

    #[test]
    fn test_store_and_load() {
        let (mut disk, meta, mut table) = setup(3000);
        let head = table.allocate_chain_head(&mut disk).unwrap();
        let mut tail = head;
        for _ in 0..2100 {
            tail = table.extend_chain(&mut disk, tail).unwrap();
        }
        assert!(tail as usize >= fat::ENTRIES_PER_BLOCK);

        let loaded = AllocationTable::load(&mut disk, &meta).unwrap();
        assert_eq!(loaded.entries(), table.entries());
        assert_eq!(loaded.free_block_count(), table.free_block_count());
        assert_eq!(loaded.chain_len(Some(head)).unwrap(), 2101);
    }
}
