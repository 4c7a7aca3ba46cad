// SPDX-License-Identifier: MIT

//! Bitmap operations trait for bit manipulation on byte slices.
//!
//! Used for the free-block bitmap of a volume and for reachability
//! tracking in the checker.

/// Extension trait for bitmap operations on byte slices.
///
/// All operations use little-endian bit ordering within bytes:
/// - Bit 0 is the LSB of byte 0
/// - Bit 7 is the MSB of byte 0
/// - Bit 8 is the LSB of byte 1, etc.
pub trait BitmapOps {
    /// Sets or clears a bit at the given position.
    ///
    /// Does nothing if `bit` is out of bounds.
    fn set_bit(&mut self, bit: usize, value: bool);

    /// Gets the value of a bit at the given position.
    ///
    /// Returns `false` if `bit` is out of bounds.
    fn get_bit(&self, bit: usize) -> bool;

    /// Sets or clears every bit in `[start, start + len)`.
    fn set_range(&mut self, start: usize, len: usize, value: bool);

    /// Returns `true` if every bit in `[start, start + len)` equals `value`.
    fn range_is(&self, start: usize, len: usize, value: bool) -> bool;

    /// Counts the number of set bits in the given range `[start, end)`.
    fn count_ones_in_range(&self, start: usize, end: usize) -> usize;

    /// First-fit search for `len` consecutive zero bits among the first
    /// `total_bits` bits. Returns the index of the first bit of the run.
    ///
    /// The scan goes left to right and restarts the run on every set bit,
    /// so the lowest qualifying run always wins.
    fn find_zero_run(&self, len: usize, total_bits: usize) -> Option<usize>;

    /// Counts the total number of set bits in the entire bitmap.
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
        self.get(bit / 8)
            .is_some_and(|b| (b & (1 << (bit % 8))) != 0)
    }

    fn set_range(&mut self, start: usize, len: usize, value: bool) {
        for bit in start..start.saturating_add(len) {
            self.set_bit(bit, value);
        }
    }

    fn range_is(&self, start: usize, len: usize, value: bool) -> bool {
        (start..start.saturating_add(len)).all(|i| self.get_bit(i) == value)
    }

    fn count_ones_in_range(&self, start: usize, end: usize) -> usize {
        (start..end).filter(|&i| self.get_bit(i)).count()
    }

    fn find_zero_run(&self, len: usize, total_bits: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let total_bits = total_bits.min(self.len() * 8);

        let mut run_start = 0;
        let mut run_len = 0;
        for bit in 0..total_bits {
            if self.get_bit(bit) {
                run_len = 0;
                continue;
            }
            if run_len == 0 {
                run_start = bit;
            }
            run_len += 1;
            if run_len == len {
                return Some(run_start);
            }
        }
        None
    }

    fn count_ones(&self) -> usize {
        self.iter().map(|b| b.count_ones() as usize).sum()
    }
}
