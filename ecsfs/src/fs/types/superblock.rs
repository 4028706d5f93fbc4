// SPDX-License-Identifier: MIT

use zerocopy::byteorder::{LittleEndian, U16};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::fs::{constant::*, meta::EcsMeta};

/// On-disk superblock, occupies block 0 entirely.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Clone, Debug)]
#[repr(C)]
pub struct EcsSuperblock {
    pub signature: [u8; 8],
    pub total_blocks: U16<LittleEndian>,
    pub root_dir_index: U16<LittleEndian>,
    pub data_start_index: U16<LittleEndian>,
    pub data_block_count: U16<LittleEndian>,
    pub fat_block_count: u8,
    pub padding: [u8; 4079],
}

const _: () = assert!(core::mem::size_of::<EcsSuperblock>() == ecsio::BLOCK_SIZE);

impl EcsSuperblock {
    pub fn from_meta(meta: &EcsMeta) -> Self {
        Self {
            signature: *ECS_SIGNATURE,
            total_blocks: U16::new(meta.total_blocks),
            root_dir_index: U16::new(meta.root_dir_index),
            data_start_index: U16::new(meta.data_start_index),
            data_block_count: U16::new(meta.data_blocks),
            fat_block_count: meta.fat_blocks,
            padding: [0u8; 4079],
        }
    }

    #[inline]
    pub fn has_signature(&self) -> bool {
        &self.signature == ECS_SIGNATURE
    }
}
