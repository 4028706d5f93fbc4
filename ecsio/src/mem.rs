// SPDX-License-Identifier: MIT

use alloc::vec;
use alloc::vec::Vec;

use crate::{BLOCK_SIZE, BlockIO, BlockIOError, BlockIOResult};

/// In-memory implementation of `BlockIO`.
///
/// Useful for tests, RAM-backed volumes, virtual disks.
#[derive(Debug, Clone)]
pub struct MemBlockIO {
    buffer: Vec<u8>,
}

impl MemBlockIO {
    #[inline]
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0u8; len],
        }
    }

    /// Zeroed storage of `blocks` device blocks.
    #[inline]
    pub fn with_blocks(blocks: usize) -> Self {
        Self::new(blocks * BLOCK_SIZE)
    }

    #[inline]
    pub fn from_vec(buffer: Vec<u8>) -> Self {
        Self { buffer }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    #[inline]
    fn check_bounds(&self, offset: u64, len: usize) -> BlockIOResult<usize> {
        let end = offset
            .checked_add(len as u64)
            .ok_or(BlockIOError::OutOfBounds)?;
        if end > self.buffer.len() as u64 {
            return Err(BlockIOError::OutOfBounds);
        }
        Ok(offset as usize)
    }
}

impl BlockIO for MemBlockIO {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult {
        let start = self.check_bounds(offset, data.len())?;
        self.buffer[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        let start = self.check_bounds(offset, buf.len())?;
        buf.copy_from_slice(&self.buffer[start..start + buf.len()]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> BlockIOResult {
        Ok(())
    }

    #[inline]
    fn len(&mut self) -> BlockIOResult<u64> {
        Ok(self.buffer.len() as u64)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_rw() {
        let mut io = MemBlockIO::new(256);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut io = MemBlockIO::new(16);
        assert_eq!(io.write_at(12, &[0u8; 8]), Err(BlockIOError::OutOfBounds));
        let mut buf = [0u8; 4];
        assert_eq!(io.read_at(u64::MAX, &mut buf), Err(BlockIOError::OutOfBounds));
    }
}
