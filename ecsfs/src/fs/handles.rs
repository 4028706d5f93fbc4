// SPDX-License-Identifier: MIT

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::core::errors::*;

/// Opaque handle returned by `open`, valid until closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileHandle(usize);

impl FileHandle {
    /// Handle for slot `raw`. Only meaningful for slots a table handed out.
    #[inline]
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State of one open handle. The name is re-resolved on every use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFile {
    pub name: String,
    pub offset: u64,
}

/// Bounded table of open handles; the lowest free slot wins.
#[derive(Debug, Clone)]
pub struct OpenFileTable {
    slots: Vec<Option<OpenFile>>,
}

impl OpenFileTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Binds a new handle to `name` with its cursor at 0.
    /// The caller checks that the file exists.
    pub fn open(&mut self, name: &str) -> FsResult<FileHandle> {
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(FsError::TooManyOpenFiles)?;
        self.slots[slot] = Some(OpenFile {
            name: name.to_string(),
            offset: 0,
        });
        Ok(FileHandle(slot))
    }

    pub fn close(&mut self, fh: FileHandle) -> FsResult {
        match self.slots.get_mut(fh.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                Ok(())
            }
            _ => Err(FsError::BadHandle),
        }
    }

    /// Closes every handle bound to `name` and returns how many were closed.
    pub fn close_all_for(&mut self, name: &str) -> usize {
        let mut closed = 0;
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|f| f.name == name) {
                *slot = None;
                closed += 1;
            }
        }
        closed
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    pub fn get(&self, fh: FileHandle) -> FsResult<&OpenFile> {
        self.slots
            .get(fh.0)
            .and_then(Option::as_ref)
            .ok_or(FsError::BadHandle)
    }

    pub fn get_mut(&mut self, fh: FileHandle) -> FsResult<&mut OpenFile> {
        self.slots
            .get_mut(fh.0)
            .and_then(Option::as_mut)
            .ok_or(FsError::BadHandle)
    }

    /// Open handles in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (FileHandle, &OpenFile)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|f| (FileHandle(i), f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_slot_wins() {
        let mut table = OpenFileTable::new(3);
        let a = table.open("a").unwrap();
        let b = table.open("b").unwrap();
        assert_eq!((a.as_raw(), b.as_raw()), (0, 1));

        table.close(a).unwrap();
        assert_eq!(table.open("c").unwrap().as_raw(), 0);
        assert_eq!(table.open_count(), 2);
    }

    #[test]
    fn test_capacity() {
        let mut table = OpenFileTable::new(2);
        table.open("a").unwrap();
        table.open("a").unwrap();
        assert_eq!(table.open("a"), Err(FsError::TooManyOpenFiles));
    }

    #[test]
    fn test_bad_handles() {
        let mut table = OpenFileTable::new(2);
        let fh = table.open("a").unwrap();
        table.close(fh).unwrap();
        assert_eq!(table.close(fh), Err(FsError::BadHandle));
        assert_eq!(table.close(FileHandle::from_raw(99)), Err(FsError::BadHandle));
        assert!(table.get(fh).is_err());
    }

    #[test]
    fn test_close_all_for() {
        let mut table = OpenFileTable::new(4);
        let a1 = table.open("a").unwrap();
        let b = table.open("b").unwrap();
        let a2 = table.open("a").unwrap();
        table.get_mut(a2).unwrap().offset = 7;

        assert_eq!(table.close_all_for("a"), 2);
        assert!(table.get(a1).is_err());
        assert_eq!(table.get(b).unwrap().name, "b");
        assert_eq!(table.iter().count(), 1);
    }
}
