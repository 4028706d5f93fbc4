// SPDX-License-Identifier: MIT

//! Bit sets used for first-fit searches (used blocks, used directory slots)
//! and for reachability tracking in the checker.

use alloc::vec;
use alloc::vec::Vec;

/// Bit operations on byte slices.
///
/// Bit 0 is the LSB of byte 0, bit 8 the LSB of byte 1, and so on.
pub trait BitmapOps {
    /// Sets or clears `bit`. Out-of-range bits are ignored.
    fn set_bit(&mut self, bit: usize, value: bool);

    /// Value of `bit`, `false` when out of range.
    fn get_bit(&self, bit: usize) -> bool;

    /// First clear bit in `[start, end)`.
    fn find_first_zero(&self, start: usize, end: usize) -> Option<usize>;

    fn count_ones(&self) -> usize;
}

impl BitmapOps for [u8] {
    #[inline]
    fn set_bit(&mut self, bit: usize, value: bool) {
        if let Some(byte) = self.get_mut(bit / 8) {
            let mask = 1u8 << (bit % 8);
            if value {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
        }
    }

    #[inline]
    fn get_bit(&self, bit: usize) -> bool {
        self.get(bit / 8).is_some_and(|b| (b & (1 << (bit % 8))) != 0)
    }

    fn find_first_zero(&self, start: usize, end: usize) -> Option<usize> {
        let end = end.min(self.len() * 8);
        let mut bit = start;
        while bit < end {
            let byte = self[bit / 8];
            // whole byte used, jump to the next one
            if byte == 0xFF {
                bit = (bit / 8 + 1) * 8;
                continue;
            }
            if byte & (1 << (bit % 8)) == 0 {
                return Some(bit);
            }
            bit += 1;
        }
        None
    }

    fn count_ones(&self) -> usize {
        self.iter().map(|b| b.count_ones() as usize).sum()
    }
}

/// Fixed-length bit set that keeps its population count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bits: Vec<u8>,
    len: usize,
    ones: usize,
}

impl Bitmap {
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![0u8; len.div_ceil(8)],
            len,
            ones: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, bit: usize) -> bool {
        bit < self.len && self.bits.get_bit(bit)
    }

    pub fn set(&mut self, bit: usize, value: bool) {
        if bit >= self.len || self.bits.get_bit(bit) == value {
            return;
        }
        self.bits.set_bit(bit, value);
        if value {
            self.ones += 1;
        } else {
            self.ones -= 1;
        }
    }

    /// Number of set bits.
    #[inline]
    pub fn ones(&self) -> usize {
        self.ones
    }

    /// Number of clear bits.
    #[inline]
    pub fn zeros(&self) -> usize {
        self.len - self.ones
    }

    /// Lowest clear bit at or after `start`.
    #[inline]
    pub fn first_zero_from(&self, start: usize) -> Option<usize> {
        self.bits.find_first_zero(start, self.len)
    }

    /// Lowest clear bit in `[start, end)`.
    #[inline]
    pub fn first_zero_in(&self, start: usize, end: usize) -> Option<usize> {
        self.bits.find_first_zero(start, end.min(self.len))
    }

    /// Indices of set bits, ascending.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|&i| self.bits.get_bit(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_bit() {
        let mut bitmap = [0u8; 4];

        bitmap.set_bit(0, true);
        bitmap.set_bit(7, true);
        bitmap.set_bit(8, true);
        assert_eq!(bitmap[0], 0b1000_0001);
        assert_eq!(bitmap[1], 0b0000_0001);

        bitmap.set_bit(0, false);
        assert!(!bitmap.get_bit(0));
        assert_eq!(bitmap[0], 0b1000_0000);

        // out of range is ignored
        bitmap.set_bit(100, true);
        assert!(!bitmap.get_bit(100));
    }

    #[test]
    fn test_find_first_zero() {
        let bitmap = [0xFFu8, 0b1111_1101, 0x00];
        assert_eq!(bitmap.find_first_zero(0, 24), Some(9));
        assert_eq!(bitmap.find_first_zero(10, 24), Some(16));
        assert_eq!(bitmap.find_first_zero(0, 9), None);
        assert_eq!([0xFFu8; 4].find_first_zero(0, 32), None);
    }

    #[test]
    fn test_bitmap_counts() {
        let mut bm = Bitmap::new(10);
        assert_eq!(bm.zeros(), 10);

        bm.set(0, true);
        bm.set(3, true);
        bm.set(3, true);
        assert_eq!(bm.ones(), 2);
        assert_eq!(bm.first_zero_from(0), Some(1));

        bm.set(0, false);
        assert_eq!(bm.ones(), 1);
        assert_eq!(bm.iter_ones().collect::<Vec<_>>(), vec![3]);

        // bits past len never count
        bm.set(12, true);
        assert_eq!(bm.ones(), 1);
    }

    #[test]
    fn test_bitmap_tail_is_not_free() {
        let mut bm = Bitmap::new(3);
        for i in 0..3 {
            bm.set(i, true);
        }
        // storage has 5 unused bits after len
        assert_eq!(bm.first_zero_from(0), None);
        assert_eq!(bm.first_zero_in(1, 2), None);
    }
}
