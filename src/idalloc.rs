/*
 * A simple bitmap allocator for small integer IDs, used to hand out unique
 * native command IDs to actions. The bitmap grows by doubling up to a
 * configured ceiling; running past the ceiling reports exhaustion instead
 * of growing further.
 *
 * The allocator is designed for exclusive single-owner use (the UI thread)
 * and performs no internal locking.
 */

use crate::error::{Error, Result};

/// The maximum possible ID value an `IdAllocator` could ever return.
pub const ID_MAX_LIMIT: u32 = u32::MAX;

const WORD_BITS: u32 = 64;

/// Number of IDs covered by the initial bitmap.
const INITIAL_SIZE: u32 = 64;

/// An allocator for ID values, implemented as a growable bitmap. A bit is
/// set iff the corresponding ID is currently allocated.
#[derive(Debug)]
pub struct IdAllocator {
    bits: Vec<u64>,
    max_blocks: u32,
}

impl IdAllocator {
    /// Creates a new allocator that may allocate up to `num_ids` values.
    ///
    /// # Panics
    ///
    /// Panics unless `num_ids` is a non-zero multiple of 64; the word size
    /// is fixed so behavior is identical across architectures.
    pub fn new(num_ids: u32) -> Self {
        assert!(
            num_ids != 0 && num_ids % INITIAL_SIZE == 0,
            "num_ids must be non-zero and divisible by {INITIAL_SIZE}"
        );

        Self {
            bits: vec![0; (INITIAL_SIZE / WORD_BITS) as usize],
            max_blocks: num_ids.div_ceil(WORD_BITS),
        }
    }

    /// Finds the lowest unused ID, marks it used, and returns it. When the
    /// bitmap is full it is doubled in size, up to the configured ceiling;
    /// past that, `Error::IdsExhausted` is reported.
    pub fn allocate(&mut self) -> Result<u32> {
        let mut i = 0usize;
        loop {
            let cur = self.bits[i];
            if cur != u64::MAX {
                let bit = (!cur).trailing_zeros();
                self.bits[i] = cur | (1u64 << bit);
                return Ok(i as u32 * WORD_BITS + bit);
            }

            i += 1;
            if i == self.bits.len() && !self.grow() {
                return Err(Error::IdsExhausted);
            }
        }
    }

    /// Marks `id` as unused. `id` must have been previously returned by a
    /// successful call to `allocate` and not freed since; freeing anything
    /// else is a caller contract violation and is not detected.
    pub fn free(&mut self, id: u32) {
        let (i, mask) = ((id / WORD_BITS) as usize, 1u64 << (id % WORD_BITS));
        self.bits[i] &= !mask;
    }

    fn grow(&mut self) -> bool {
        let (n, m) = (self.bits.len() as u32, self.max_blocks);
        if n >= m {
            return false;
        }

        // Try to double the size, but never allocate past the ceiling.
        let add = if 2 * n > m { m - n } else { n };
        self.bits.resize((n + add) as usize, 0);
        true
    }
}
