// SPDX-License-Identifier: MIT

//! Byte-granular file I/O on top of whole-block device transfers.
//!
//! Every transfer moves one full block. A span that covers a whole block goes
//! straight between the caller's buffer and the device; a partial span goes
//! through a bounce buffer (read-modify-write on the write side).

use log::{trace, warn};

use crate::core::errors::*;
use crate::core::fat::FatEntry;
use crate::core::cursor::FatTable;
use crate::fs::{handles::FileHandle, meta::*, types::EcsDirEntry, volume::Volume};
use ecsio::{BLOCK_SIZE, Block, BlockDevice};

const BS: u64 = BLOCK_SIZE as u64;

impl<D: BlockDevice> Volume<D> {
    /// Reads from the cursor of `fh` into `buf` and advances the cursor.
    ///
    /// Reads stop at the end of the file; 0 means end of file (or an empty `buf`).
    pub fn read(&mut self, fh: FileHandle, buf: &mut [u8]) -> FsResult<usize> {
        let (slot, cursor) = self.resolve(fh)?;
        let entry = *self.dir.entry(slot);
        let size = u64::from(entry.size());
        if buf.is_empty() || cursor >= size {
            return Ok(0);
        }

        let total = (buf.len() as u64).min(size - cursor) as usize;
        let mut block = self.table.block_for_offset(entry.first_block(), cursor)?;
        let mut bounce = [0u8; BLOCK_SIZE];
        let mut done = 0usize;
        let mut pos = cursor;

        while done < total {
            let Some(unit) = block else {
                return Err(FsAllocatorError::OffsetBeyondChain.into());
            };
            let in_block = (pos % BS) as usize;
            let n = (BLOCK_SIZE - in_block).min(total - done);
            let dev_block = self.meta.unit_block(unit);
            let dst = &mut buf[done..done + n];

            if n == BLOCK_SIZE {
                let dst: &mut Block = dst
                    .try_into()
                    .map_err(|_| FsError::Other("read span is not one block"))?;
                self.dev.read_block(dev_block, dst)?;
            } else {
                self.dev.read_block(dev_block, &mut bounce)?;
                dst.copy_from_slice(&bounce[in_block..in_block + n]);
            }
            trace!("ecsfs: read {n} byte(s) from block {unit} at {in_block}");

            done += n;
            pos += n as u64;
            if done < total {
                block = self.next_block(unit)?;
            }
        }

        self.files.get_mut(fh)?.offset = pos;
        Ok(done)
    }

    /// Writes `data` at the cursor of `fh`, growing the file as needed.
    ///
    /// When the allocation table fills up partway, the bytes that fit are kept
    /// and the short count is returned. A write that cannot place a single byte
    /// fails with `OutOfBlocks`.
    pub fn write(&mut self, fh: FileHandle, data: &[u8]) -> FsResult<usize> {
        let (slot, cursor) = self.resolve(fh)?;
        if data.is_empty() {
            return Ok(0);
        }

        let original = *self.dir.entry(slot);
        let mut entry = original;
        let mut written = 0usize;
        let outcome = self.write_span(&mut entry, cursor, data, &mut written);

        let end = cursor + written as u64;
        if end > u64::from(entry.size()) {
            let size = u32::try_from(end).map_err(|_| FsError::Other("File size exceeds 32 bits"))?;
            entry.set_size(size);
        }
        if entry != original {
            self.dir.commit_slot(&mut self.dev, slot, entry)?;
        }
        self.files.get_mut(fh)?.offset = end;

        match outcome {
            Ok(()) => Ok(written),
            Err(e) if e.is_out_of_blocks() && written > 0 => {
                warn!(
                    "ecsfs: short write, {written} of {} byte(s) placed before the volume filled up",
                    data.len()
                );
                Ok(written)
            }
            Err(e) => Err(e),
        }
    }

    /// Copies `data` into the chain of `entry` starting at byte `cursor`.
    /// `written` tracks progress so the caller can keep a partial result.
    fn write_span(
        &mut self,
        entry: &mut EcsDirEntry,
        cursor: u64,
        data: &[u8],
        written: &mut usize,
    ) -> FsResult {
        let (mut unit, mut fresh) = self.locate_for_write(entry, cursor)?;
        let mut bounce = [0u8; BLOCK_SIZE];
        let mut pos = cursor;

        loop {
            let in_block = (pos % BS) as usize;
            let n = (BLOCK_SIZE - in_block).min(data.len() - *written);
            let src = &data[*written..*written + n];
            let dev_block = self.meta.unit_block(unit);

            if n == BLOCK_SIZE {
                let src: &Block = src
                    .try_into()
                    .map_err(|_| FsError::Other("write span is not one block"))?;
                self.dev.write_block(dev_block, src)?;
            } else {
                if fresh {
                    bounce.fill(0);
                } else {
                    self.dev.read_block(dev_block, &mut bounce)?;
                }
                bounce[in_block..in_block + n].copy_from_slice(src);
                self.dev.write_block(dev_block, &bounce)?;
            }
            trace!("ecsfs: wrote {n} byte(s) to block {unit} at {in_block}");

            *written += n;
            pos += n as u64;
            if *written == data.len() {
                return Ok(());
            }
            (unit, fresh) = self.next_or_extend(unit)?;
        }
    }

    /// Block that receives the byte at `cursor`, reserving the chain head or
    /// extending the chain when the cursor sits just past its end.
    /// The flag is set for blocks that were just allocated.
    fn locate_for_write(&mut self, entry: &mut EcsDirEntry, cursor: u64) -> FsResult<(u16, bool)> {
        let Some(head) = entry.first_block() else {
            let head = self.table.allocate_chain_head(&mut self.dev)?;
            entry.set_first_block(Some(head));
            return Ok((head, true));
        };

        if cursor > 0 && cursor % BS == 0 {
            let prev = self
                .table
                .block_for_offset(Some(head), cursor - 1)?
                .ok_or(FsAllocatorError::OffsetBeyondChain)?;
            return self.next_or_extend(prev);
        }

        let block = self
            .table
            .block_for_offset(Some(head), cursor)?
            .ok_or(FsAllocatorError::OffsetBeyondChain)?;
        Ok((block, false))
    }

    fn next_block(&self, unit: u16) -> FsResult<Option<u16>> {
        match self.table.entry(unit) {
            Some(FatEntry::Next(next)) => Ok(Some(next)),
            Some(FatEntry::EndOfChain) => Ok(None),
            Some(FatEntry::Free) => Err(FsAllocatorError::FreeEntryInChain(unit).into()),
            None => Err(FsAllocatorError::InvalidBlock(unit).into()),
        }
    }

    fn next_or_extend(&mut self, unit: u16) -> FsResult<(u16, bool)> {
        match self.next_block(unit)? {
            Some(next) => Ok((next, false)),
            None => Ok((self.table.extend_chain(&mut self.dev, unit)?, true)),
        }
    }
}
