// SPDX-License-Identifier: MIT

use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

use crate::core::utils::name_utils;
use crate::fs::constant::*;

/// One 32-byte directory slot.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct EcsDirEntry {
    pub name: [u8; ECS_NAME_LEN],
    pub size: U32<LittleEndian>,
    pub first_block: U16<LittleEndian>,
    pub padding: [u8; 10],
}

const _: () = assert!(core::mem::size_of::<EcsDirEntry>() == ECS_DIR_ENTRY_SIZE);

impl EcsDirEntry {
    /// Fresh entry for `name`: size 0, no data.
    pub fn new_file(name: &str) -> Self {
        let mut entry = Self::new_zeroed();
        name_utils::encode_name(name, &mut entry.name);
        entry.first_block = U16::new(ECS_NO_DATA);
        entry
    }

    #[inline]
    pub fn is_used(&self) -> bool {
        self.name[0] != 0
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size.get()
    }

    #[inline]
    pub fn set_size(&mut self, size: u32) {
        self.size = U32::new(size);
    }

    /// Head of the data chain, `None` while the file has no data block.
    #[inline]
    pub fn first_block(&self) -> Option<u16> {
        match self.first_block.get() {
            ECS_NO_DATA => None,
            block => Some(block),
        }
    }

    #[inline]
    pub fn set_first_block(&mut self, head: Option<u16>) {
        self.first_block = U16::new(head.unwrap_or(ECS_NO_DATA));
    }

    #[inline]
    pub fn name_matches(&self, name: &str) -> bool {
        self.is_used() && name_utils::name_matches(&self.name, name)
    }

    pub fn clear(&mut self) {
        *self = Self::new_zeroed();
    }
}

/// The directory block: every slot of the volume.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Clone, Debug)]
#[repr(C)]
pub struct EcsDirBlock {
    pub entries: [EcsDirEntry; ECS_DIR_ENTRIES],
}

const _: () = assert!(core::mem::size_of::<EcsDirBlock>() == ecsio::BLOCK_SIZE);

impl EcsDirBlock {
    pub fn empty() -> Self {
        Self::new_zeroed()
    }
}
