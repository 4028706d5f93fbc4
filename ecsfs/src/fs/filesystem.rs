// SPDX-License-Identifier: MIT

use log::debug;

use crate::core::checker::{FsChecker, FsCheckerResult, VerifyPhases, VerifyReport};
use crate::core::errors::*;
use crate::fs::{
    checker::EcsChecker,
    directory::DirIter,
    handles::FileHandle,
    limits::FsLimits,
    volume::{Volume, VolumeInfo},
};
use ecsio::BlockDevice;

/// A volume engine instance: unmounted, or holding one mounted device.
///
/// Instances are independent; nothing is shared between them.
#[derive(Debug)]
pub struct FileSystem<D: BlockDevice> {
    limits: FsLimits,
    volume: Option<Volume<D>>,
}

impl<D: BlockDevice> Default for FileSystem<D> {
    fn default() -> Self {
        Self::new(FsLimits::default())
    }
}

impl<D: BlockDevice> FileSystem<D> {
    pub fn new(limits: FsLimits) -> Self {
        Self { limits, volume: None }
    }

    #[inline]
    pub fn limits(&self) -> &FsLimits {
        &self.limits
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.volume.is_some()
    }

    /// Mounts the volume stored on `dev`.
    ///
    /// On failure the device is dropped, which closes it.
    pub fn mount(&mut self, dev: D) -> FsResult {
        if self.volume.is_some() {
            return Err(FsError::AlreadyMounted);
        }
        self.volume = Some(Volume::mount(dev, &self.limits)?);
        Ok(())
    }

    /// Unmounts and returns the device. Refused while handles are open.
    pub fn unmount(&mut self) -> FsResult<D> {
        let open = self.volume()?.files.open_count();
        if open > 0 {
            return Err(FsError::FilesOpen(open));
        }
        let volume = self.volume.take().ok_or(FsError::NotMounted)?;
        let dev = volume.into_device()?;
        debug!("ecsfs: unmounted volume");
        Ok(dev)
    }

    /// The mounted volume.
    pub fn volume(&self) -> FsResult<&Volume<D>> {
        self.volume.as_ref().ok_or(FsError::NotMounted)
    }

    pub fn volume_mut(&mut self) -> FsResult<&mut Volume<D>> {
        self.volume.as_mut().ok_or(FsError::NotMounted)
    }

    pub fn info(&self) -> FsResult<VolumeInfo> {
        Ok(self.volume()?.info())
    }

    pub fn free_block_count(&self) -> FsResult<usize> {
        Ok(self.volume()?.table.free_block_count())
    }

    pub fn create(&mut self, name: &str) -> FsResult {
        self.volume_mut()?.create(name)
    }

    pub fn delete(&mut self, name: &str) -> FsResult {
        self.volume_mut()?.delete(name)
    }

    /// Files in directory-slot order.
    pub fn list(&self) -> FsResult<DirIter<'_>> {
        Ok(self.volume()?.dir.list())
    }

    pub fn exists(&self, name: &str) -> FsResult<bool> {
        Ok(self.volume()?.dir.exists(name))
    }

    pub fn stat_by_name(&self, name: &str) -> FsResult<u32> {
        self.volume()?.dir.stat_by_name(name)
    }

    pub fn open(&mut self, name: &str) -> FsResult<FileHandle> {
        self.volume_mut()?.open(name)
    }

    pub fn close(&mut self, fh: FileHandle) -> FsResult {
        self.volume_mut()?.close(fh)
    }

    pub fn seek(&mut self, fh: FileHandle, offset: u64) -> FsResult<u64> {
        self.volume_mut()?.seek(fh, offset)
    }

    pub fn stat(&self, fh: FileHandle) -> FsResult<u32> {
        self.volume()?.stat(fh)
    }

    pub fn tell(&self, fh: FileHandle) -> FsResult<u64> {
        self.volume()?.tell(fh)
    }

    pub fn read(&mut self, fh: FileHandle, buf: &mut [u8]) -> FsResult<usize> {
        self.volume_mut()?.read(fh, buf)
    }

    pub fn write(&mut self, fh: FileHandle, data: &[u8]) -> FsResult<usize> {
        self.volume_mut()?.write(fh, data)
    }

    /// Runs the consistency checker over the mounted volume.
    pub fn check(&mut self, phases: VerifyPhases) -> FsCheckerResult<VerifyReport> {
        let volume = self
            .volume_mut()
            .map_err(|_| FsCheckerError::Invalid("No volume mounted"))?;
        EcsChecker::new(volume).check(phases)
    }
}

#[cfg(feature = "std")]
impl FileSystem<ecsio::prelude::FileDisk> {
    /// Opens the image file at `path` and mounts it.
    pub fn mount_path<P: AsRef<std::path::Path>>(&mut self, path: P) -> FsResult {
        if self.volume.is_some() {
            return Err(FsError::AlreadyMounted);
        }
        let disk = ecsio::prelude::FileDisk::open(path).map_err(|e| match e {
            BlockIOError::Misaligned => FsError::Volume("Image size is not a multiple of the block size"),
            e => FsError::IO(e),
        })?;
        self.mount(disk)
    }
}
