// SPDX-License-Identifier: MIT

use crate::{BLOCK_SIZE, Block, BlockDevice, BlockIO, BlockIOError, BlockIOResult};

/// Adapts a byte-addressed backend into a fixed-size [`BlockDevice`].
///
/// The block count is fixed at construction from the backend length, which
/// must be a whole number of blocks.
#[derive(Debug)]
pub struct Disk<IO: BlockIO> {
    io: IO,
    blocks: usize,
}

impl<IO: BlockIO> Disk<IO> {
    pub fn new(mut io: IO) -> BlockIOResult<Self> {
        let len = io.len()?;
        if len % BLOCK_SIZE as u64 != 0 {
            return Err(BlockIOError::Misaligned);
        }
        let blocks = usize::try_from(len / BLOCK_SIZE as u64)
            .map_err(|_| BlockIOError::Other("Device too large for this platform"))?;
        Ok(Self { io, blocks })
    }

    #[inline]
    pub fn io(&self) -> &IO {
        &self.io
    }

    #[inline]
    pub fn into_inner(self) -> IO {
        self.io
    }

    /// Flushes the backend and releases it.
    pub fn close(mut self) -> BlockIOResult<IO> {
        self.io.flush()?;
        Ok(self.io)
    }

    #[inline]
    fn offset_of(&self, index: usize) -> BlockIOResult<u64> {
        if index >= self.blocks {
            return Err(BlockIOError::OutOfBounds);
        }
        Ok(index as u64 * BLOCK_SIZE as u64)
    }
}

impl<IO: BlockIO> BlockDevice for Disk<IO> {
    #[inline]
    fn block_count(&self) -> usize {
        self.blocks
    }

    fn read_block(&mut self, index: usize, buf: &mut Block) -> BlockIOResult {
        let offset = self.offset_of(index)?;
        self.io.read_at(offset, buf)
    }

    fn write_block(&mut self, index: usize, buf: &Block) -> BlockIOResult {
        let offset = self.offset_of(index)?;
        self.io.write_at(offset, buf)
    }

    #[inline]
    fn flush(&mut self) -> BlockIOResult {
        self.io.flush()
    }
}

#[cfg(all(test, feature = "mem"))]
mod test {
    use crate::prelude::*;

    #[test]
    fn test_block_count() {
        let disk = Disk::new(MemBlockIO::with_blocks(7)).unwrap();
        assert_eq!(disk.block_count(), 7);
    }

    #[test]
    fn test_misaligned_backend() {
        let err = Disk::new(MemBlockIO::new(BLOCK_SIZE + 1)).unwrap_err();
        assert_eq!(err, BlockIOError::Misaligned);
    }

    #[test]
    fn test_block_rw() {
        let mut disk = Disk::new(MemBlockIO::with_blocks(4)).unwrap();
        let mut block = [0u8; BLOCK_SIZE];
        block[0] = 0xEC;
        block[BLOCK_SIZE - 1] = 0x15;
        disk.write_block(3, &block).unwrap();

        let mut out = [0u8; BLOCK_SIZE];
        disk.read_block(3, &mut out).unwrap();
        assert_eq!(out, block);

        // neighbours untouched
        disk.read_block(2, &mut out).unwrap();
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_out_of_range() {
        let mut disk = Disk::new(MemBlockIO::with_blocks(2)).unwrap();
        let mut buf = [0u8; BLOCK_SIZE];
        assert_eq!(disk.read_block(2, &mut buf), Err(BlockIOError::OutOfBounds));
        assert_eq!(disk.write_block(9, &buf), Err(BlockIOError::OutOfBounds));
    }

    #[test]
    fn test_struct_roundtrip() {
        #[derive(zerocopy::FromBytes, zerocopy::IntoBytes, zerocopy::KnownLayout, zerocopy::Immutable)]
        #[repr(C)]
        struct Raw {
            tag: [u8; 8],
            rest: [u8; BLOCK_SIZE - 8],
        }

        let mut disk = Disk::new(MemBlockIO::with_blocks(1)).unwrap();
        let raw = Raw {
            tag: *b"ECS150FS",
            rest: [0u8; BLOCK_SIZE - 8],
        };
        disk.write_struct(0, &raw).unwrap();
        let back: Raw = disk.read_struct(0).unwrap();
        assert_eq!(&back.tag, b"ECS150FS");
    }
}
