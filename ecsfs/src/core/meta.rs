// SPDX-License-Identifier: MIT

/// Static layout metadata of a formatted volume.
///
/// Implemented by the volume geometry; used by the formatter, the allocator and
/// the checker to translate allocation units into device blocks.
pub trait FsMeta<Unit: Ord + Copy> {
    /// Device block holding allocation unit `unit`.
    fn unit_block(&self, unit: Unit) -> usize;

    /// First valid unit for allocation.
    fn first_data_unit(&self) -> Unit;

    /// Last valid unit.
    fn last_data_unit(&self) -> Unit;

    /// Total number of units tracked by the allocation table, reserved ones included.
    fn total_units(&self) -> usize;

    /// Check if a given unit may belong to a file.
    fn is_valid_unit(&self, unit: Unit) -> bool {
        unit >= self.first_data_unit() && unit <= self.last_data_unit()
    }
}
