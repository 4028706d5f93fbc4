// SPDX-License-Identifier: MIT

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::disk::Disk;
use crate::{BlockIO, BlockIOResult};

/// `BlockIO` over any seekable std stream (image files, cursors, raw devices).
#[derive(Debug)]
pub struct StdBlockIO<T: Read + Write + Seek> {
    io: T,
}

impl<T: Read + Write + Seek> StdBlockIO<T> {
    #[inline]
    pub fn new(io: T) -> Self {
        Self { io }
    }

    #[inline]
    pub fn get_ref(&self) -> &T {
        &self.io
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<T: Read + Write + Seek> BlockIO for StdBlockIO<T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> BlockIOResult {
        self.io.flush()?;
        Ok(())
    }

    fn len(&mut self) -> BlockIOResult<u64> {
        Ok(self.io.seek(SeekFrom::End(0))?)
    }
}

/// Block device backed by a disk image file.
pub type FileDisk = Disk<StdBlockIO<File>>;

impl Disk<StdBlockIO<File>> {
    /// Opens an existing image file read/write.
    pub fn open<P: AsRef<Path>>(path: P) -> BlockIOResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Disk::new(StdBlockIO::new(file))
    }

    /// Creates (or truncates) an image file of `blocks` zeroed blocks.
    pub fn create<P: AsRef<Path>>(path: P, blocks: usize) -> BlockIOResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len((blocks * crate::BLOCK_SIZE) as u64)?;
        Disk::new(StdBlockIO::new(file))
    }
}
