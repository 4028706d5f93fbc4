// SPDX-License-Identifier: MIT

pub use crate::core::errors::{FsFormatterError, FsFormatterResult};

use crate::core::meta::FsMeta;
use ecsio::{BLOCK_SIZE, BlockDevice};

/// A formatter for a volume layout.
///
/// Implementations own their device and the options they were built with.
/// A *full* format also clears the data region; a quick format only writes
/// the metadata blocks.
pub trait FsFormatter {
    /// Format the volume.
    #[must_use = "format result must be checked for errors"]
    fn format(&mut self, full_format: bool) -> FsFormatterResult;

    /// Flush any buffered writes to disk.
    #[must_use = "flush result must be checked for errors"]
    fn flush(&mut self) -> FsFormatterResult<()> {
        Ok(())
    }
}

/// Zeroes every block of the data region described by `meta`.
pub fn zero_data_region<M: FsMeta<u16>, D: BlockDevice + ?Sized>(
    dev: &mut D,
    meta: &M,
) -> FsFormatterResult {
    const ZERO: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

    let first = meta.unit_block(0);
    let count = meta.total_units();
    for block in first..first + count {
        dev.write_block(block, &ZERO)?;
    }
    Ok(())
}
