// SPDX-License-Identifier: MIT

use crate::core::errors::{FsAllocatorError, FsAllocatorResult};
use crate::core::fat::FatEntry;

/// Read access to an in-memory allocation table.
pub trait FatTable {
    /// Number of entries in the table (one per data block).
    fn entry_count(&self) -> usize;

    /// Entry at `index`, or `None` when out of range.
    fn entry(&self, index: u16) -> Option<FatEntry>;
}

impl FatTable for [FatEntry] {
    #[inline]
    fn entry_count(&self) -> usize {
        self.len()
    }

    #[inline]
    fn entry(&self, index: u16) -> Option<FatEntry> {
        self.get(usize::from(index)).copied()
    }
}

/// Lazy walk over the block indices of one chain.
///
/// Yields each block of the chain in order, starting with the head. The walk
/// stops with an error on a free entry, on an index outside the table, or
/// after more hops than the table has entries.
#[derive(Debug)]
pub struct ChainCursor<'a, T: FatTable + ?Sized> {
    table: &'a T,
    current: Option<u16>,
    seen: usize,
}

impl<'a, T: FatTable + ?Sized> ChainCursor<'a, T> {
    pub fn new(table: &'a T, head: Option<u16>) -> Self {
        Self {
            table,
            current: head,
            seen: 0,
        }
    }

    /// Advances `hops` blocks and returns the block reached.
    pub fn nth_block(mut self, hops: usize) -> FsAllocatorResult<Option<u16>> {
        for _ in 0..hops {
            match self.next() {
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => return Err(FsAllocatorError::OffsetBeyondChain),
            }
        }
        match self.next() {
            Some(Ok(block)) => Ok(Some(block)),
            Some(Err(e)) => Err(e),
            None if self.seen == 0 => Ok(None),
            None => Err(FsAllocatorError::OffsetBeyondChain),
        }
    }

    /// Last block of the chain, if any.
    pub fn tail(self) -> FsAllocatorResult<Option<u16>> {
        let mut last = None;
        for block in self {
            last = Some(block?);
        }
        Ok(last)
    }

    /// Number of blocks in the chain.
    pub fn count_blocks(self) -> FsAllocatorResult<usize> {
        let mut n = 0;
        for block in self {
            block?;
            n += 1;
        }
        Ok(n)
    }

    #[inline]
    fn fail(&mut self, err: FsAllocatorError) -> Option<FsAllocatorResult<u16>> {
        self.current = None;
        Some(Err(err))
    }
}

impl<T: FatTable + ?Sized> Iterator for ChainCursor<'_, T> {
    type Item = FsAllocatorResult<u16>;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.current?;
        self.seen += 1;
        if self.seen > self.table.entry_count() {
            return self.fail(FsAllocatorError::LoopDetected);
        }

        match self.table.entry(block) {
            None => self.fail(FsAllocatorError::InvalidBlock(block)),
            Some(FatEntry::Free) => self.fail(FsAllocatorError::FreeEntryInChain(block)),
            Some(FatEntry::EndOfChain) => {
                self.current = None;
                Some(Ok(block))
            }
            Some(FatEntry::Next(next)) => {
                if usize::from(next) >= self.table.entry_count() {
                    return self.fail(FsAllocatorError::InvalidBlock(next));
                }
                self.current = Some(next);
                Some(Ok(block))
            }
        }
    }
}
