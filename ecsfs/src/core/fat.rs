// SPDX-License-Identifier: MIT

use ecsio::{BLOCK_SIZE, Block};

/// Number of 16-bit entries held by one table block.
pub const ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / 2;

/// Raw value of an end-of-chain entry.
pub const RAW_EOC: u16 = 0xFFFF;

/// Raw value of a free entry.
pub const RAW_FREE: u16 = 0;

/// One allocation table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FatEntry {
    #[default]
    Free,
    EndOfChain,
    Next(u16),
}

impl FatEntry {
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            RAW_FREE => FatEntry::Free,
            RAW_EOC => FatEntry::EndOfChain,
            next => FatEntry::Next(next),
        }
    }

    #[inline]
    pub const fn to_raw(self) -> u16 {
        match self {
            FatEntry::Free => RAW_FREE,
            FatEntry::EndOfChain => RAW_EOC,
            FatEntry::Next(next) => next,
        }
    }

    #[inline]
    pub const fn is_free(self) -> bool {
        matches!(self, FatEntry::Free)
    }
}

/// Whole-block encoding of the table.
pub mod table {
    use super::*;

    /// Number of table blocks needed for `entries` entries.
    #[inline]
    pub const fn blocks_for(entries: usize) -> usize {
        entries.div_ceil(ENTRIES_PER_BLOCK)
    }

    /// Decodes the entries stored in table block `block` into `out`.
    ///
    /// `out` holds the whole table; only the slice covered by this block is touched
    /// and trailing on-disk entries past `out.len()` are ignored.
    pub fn decode_block(block_index: usize, raw: &Block, out: &mut [FatEntry]) {
        let first = block_index * ENTRIES_PER_BLOCK;
        let Some(slice) = out.get_mut(first..) else {
            return;
        };
        for (entry, bytes) in slice.iter_mut().zip(raw.chunks_exact(2)) {
            *entry = FatEntry::from_raw(u16::from_le_bytes([bytes[0], bytes[1]]));
        }
    }

    /// Encodes the part of `entries` stored in table block `block_index`.
    /// Slots past the end of the table are written as zero.
    pub fn encode_block(block_index: usize, entries: &[FatEntry], raw: &mut Block) {
        raw.fill(0);
        let first = block_index * ENTRIES_PER_BLOCK;
        let Some(slice) = entries.get(first..) else {
            return;
        };
        for (entry, bytes) in slice.iter().zip(raw.chunks_exact_mut(2)) {
            bytes.copy_from_slice(&entry.to_raw().to_le_bytes());
        }
    }
}
