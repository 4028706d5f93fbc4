// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod disk;
pub mod errors;
pub mod stats;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod std;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::disk::Disk;
    pub use super::errors::*;
    pub use super::stats::*;
    pub use super::{BLOCK_SIZE, Block, BlockDevice, BlockIO, BlockIOStructExt};

    #[cfg(feature = "mem")]
    pub use super::mem::MemBlockIO;

    #[cfg(feature = "std")]
    pub use super::std::{FileDisk, StdBlockIO};
}

// Internal use
use errors::*;

// Constants

/// Size of one device block in bytes.
pub const BLOCK_SIZE: usize = 4096;

/// One block worth of bytes. Every device transfer moves exactly one of these.
pub type Block = [u8; BLOCK_SIZE];

// Traits

/// Byte-addressed storage backend.
///
/// Implementations may target RAM, image files, raw devices, etc.
/// `Disk` turns any backend into a block-granular [`BlockDevice`].
pub trait BlockIO {
    /// Writes `data` at `offset` (absolute).
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset` (absolute).
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> BlockIOResult;

    /// Current length of the storage in bytes.
    fn len(&mut self) -> BlockIOResult<u64>;

    fn is_empty(&mut self) -> BlockIOResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Block-granular device, the only interface the filesystem engine talks to.
///
/// Blocks are addressed by index from 0; every call transfers one full block.
pub trait BlockDevice {
    /// Number of blocks exposed by the device.
    fn block_count(&self) -> usize;

    /// Reads block `index` into `buf`.
    fn read_block(&mut self, index: usize, buf: &mut Block) -> BlockIOResult;

    /// Writes `buf` to block `index`.
    fn write_block(&mut self, index: usize, buf: &Block) -> BlockIOResult;

    /// Flushes buffered blocks to the backing storage.
    fn flush(&mut self) -> BlockIOResult;
}

impl<T: BlockDevice + ?Sized> BlockDevice for &mut T {
    #[inline]
    fn block_count(&self) -> usize {
        (**self).block_count()
    }

    #[inline]
    fn read_block(&mut self, index: usize, buf: &mut Block) -> BlockIOResult {
        (**self).read_block(index, buf)
    }

    #[inline]
    fn write_block(&mut self, index: usize, buf: &Block) -> BlockIOResult {
        (**self).write_block(index, buf)
    }

    #[inline]
    fn flush(&mut self) -> BlockIOResult {
        (**self).flush()
    }
}

/// Extension trait for reading and writing whole-block structs using zerocopy.
///
/// The struct must be exactly one block long, which keeps every transfer
/// block-granular.
pub trait BlockIOStructExt: BlockDevice {
    /// Reads block `index` and decodes it as `T`.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        index: usize,
    ) -> BlockIOResult<T> {
        if core::mem::size_of::<T>() != BLOCK_SIZE {
            return Err(BlockIOError::Other("read_struct: type must span one block"));
        }
        let mut buf = [0u8; BLOCK_SIZE];
        self.read_block(index, &mut buf)?;
        T::read_from_bytes(&buf).map_err(|_| BlockIOError::Other("read_struct failed"))
    }

    /// Encodes `val` and writes it to block `index`.
    fn write_struct<T: zerocopy::IntoBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        index: usize,
        val: &T,
    ) -> BlockIOResult {
        let block: &Block = val
            .as_bytes()
            .try_into()
            .map_err(|_| BlockIOError::Other("write_struct: type must span one block"))?;
        self.write_block(index, block)
    }
}

impl<T: BlockDevice + ?Sized> BlockIOStructExt for T {}
