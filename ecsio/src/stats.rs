// SPDX-License-Identifier: MIT

use crate::{Block, BlockDevice, BlockIOResult};

/// Simple counters, no_std friendly.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IoStats {
    pub block_reads: u64,
    pub block_writes: u64,
    pub flushes: u64,
}

impl IoStats {
    #[inline]
    pub fn reset(&mut self) {
        *self = IoStats::default();
    }

    /// Total block transfers in either direction.
    #[inline]
    pub fn transfers(&self) -> u64 {
        self.block_reads + self.block_writes
    }
}

/// Transparent instrumentation wrapper around a block device.
///
/// Mount a volume on an `IOCounter` to observe how many blocks an
/// operation touches.
#[derive(Debug)]
pub struct IOCounter<D: BlockDevice> {
    inner: D,
    pub stats: IoStats,
}

impl<D: BlockDevice> IOCounter<D> {
    #[inline]
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            stats: IoStats::default(),
        }
    }

    #[inline]
    pub fn snapshot(&self) -> IoStats {
        self.stats
    }

    #[inline]
    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: BlockDevice> BlockDevice for IOCounter<D> {
    #[inline]
    fn block_count(&self) -> usize {
        self.inner.block_count()
    }

    #[inline]
    fn read_block(&mut self, index: usize, buf: &mut Block) -> BlockIOResult {
        self.stats.block_reads += 1;
        self.inner.read_block(index, buf)
    }

    #[inline]
    fn write_block(&mut self, index: usize, buf: &Block) -> BlockIOResult {
        self.stats.block_writes += 1;
        self.inner.write_block(index, buf)
    }

    #[inline]
    fn flush(&mut self) -> BlockIOResult {
        self.stats.flushes += 1;
        self.inner.flush()
    }
}
