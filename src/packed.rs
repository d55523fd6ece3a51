//! Packed arrays of equal-width bit-fields.
//!
//! A [`PackedView`] slices a [`BitView`] into `N` contiguous fields of `w`
//! bits each (`1 ≤ w < 64`) and provides field-addressed operations on top:
//! single-field get/set, word-sized field ranges, broadcast, field-parallel
//! add, and a branch-free threshold count (`find`).
//!
//! The parallel operations work a word at a time (SWAR): `field_mask` has
//! bit 0 of every field set, so `field_mask · v` replicates `v` into every
//! field, and `flag_mask` (the top bit of every field) doubles as a borrow
//! indicator when comparing all fields of a word against a threshold at
//! once. Callers that rely on `add` or `find` keep the flag bit of each
//! stored field free.

use std::fmt;

use crate::bits::{lowbits, to_binary, WORD_BITS};
use crate::bitview::{BitBuf, BitStore, BitView};

/// An array of `w`-bit fields packed into a bit view.
#[derive(Clone)]
pub struct PackedView<S> {
    bits: BitView<S>,
    width: usize,
    field_mask: u64,
}

/// Heap-owned, growable packed view.
pub type PackedBuf = PackedView<Vec<u64>>;

/// A word with bit 0 of every `width`-bit field set.
fn compute_field_mask(width: usize) -> u64 {
    let mut mask = 0u64;
    for _ in 0..WORD_BITS / width {
        mask = (mask << width) | 1;
    }
    mask
}

impl PackedBuf {
    /// Allocate `len` zeroed fields of `width` bits each.
    pub fn new(width: usize, len: usize) -> Self {
        debug_assert!(width >= 1 && width < WORD_BITS);
        Self {
            bits: BitBuf::new(width * len),
            width,
            field_mask: compute_field_mask(width),
        }
    }
}

impl<S: BitStore> PackedView<S> {
    /// Number of fields.
    pub fn len(&self) -> usize {
        self.bits.len() / self.width
    }

    /// Return true if the view holds no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bits per field.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Bit 0 of every field.
    pub fn field_mask(&self) -> u64 {
        self.field_mask
    }

    /// The top bit of every field.
    pub fn flag_mask(&self) -> u64 {
        self.field_mask << (self.width - 1)
    }

    /// Change field width and count. The stored data is not preserved.
    pub fn reset(&mut self, width: usize, len: usize) {
        debug_assert!(width >= 1 && width < WORD_BITS);
        self.width = width;
        self.field_mask = compute_field_mask(width);
        self.resize(len);
    }

    /// Change the field count, resizing the backing view.
    pub fn resize(&mut self, len: usize) {
        self.bits.resize(self.width * len);
    }

    /// Read field `k`.
    pub fn get(&self, k: usize) -> u64 {
        self.bits.get(k * self.width, (k + 1) * self.width)
    }

    /// Write `lowbits(v, width)` into field `k`.
    pub fn set(&mut self, k: usize, v: u64) {
        self.bits.set(k * self.width, (k + 1) * self.width, v);
    }

    /// The concatenated bits of fields `[begin, end)` as one word.
    /// The range must span at most a word.
    pub fn get_range(&self, begin: usize, end: usize) -> u64 {
        self.bits.get(begin * self.width, end * self.width)
    }

    /// Overwrite fields `[begin, end)` with the low bits of `value`.
    pub fn set_range(&mut self, begin: usize, end: usize, value: u64) {
        self.bits.set(begin * self.width, end * self.width, value);
    }

    /// Broadcast `lowbits(v, width)` into every field of `[begin, end)`.
    pub fn repeat(&mut self, begin: usize, end: usize, v: u64) {
        let chunk = (WORD_BITS / self.width) * self.width;
        let value = self.field_mask.wrapping_mul(lowbits(v, self.width));
        let mut p = begin * self.width;
        let stop = end * self.width;
        while p < stop {
            let step = chunk.min(stop - p);
            self.bits.set(p, p + step, value);
            p += step;
        }
    }

    /// Add `v` to every field of `[begin, end)` in parallel.
    ///
    /// No per-field carry isolation: the caller guarantees that no field
    /// overflows into its neighbour (the flag bit stays free).
    pub fn add(&mut self, begin: usize, end: usize, v: u64) {
        let fields = WORD_BITS / self.width;
        let spread = self.field_mask.wrapping_mul(lowbits(v, self.width));
        let mut p = begin;
        while p < end {
            let step = fields.min(end - p);
            let word = self.get_range(p, p + step);
            self.set_range(p, p + step, word.wrapping_add(spread));
            p += step;
        }
    }

    /// Count the fields of `[begin, end)` whose value is strictly below
    /// `lowbits(v, width − 1)`.
    ///
    /// Per word: set the flag bit of every field, subtract the replicated
    /// threshold, and popcount the surviving flags — a flag survives exactly
    /// when its field did not borrow, i.e. was `≥ v`. Stored fields in the
    /// range must keep their flag bit clear for the borrow test to be exact.
    pub fn find(&self, begin: usize, end: usize, v: u64) -> usize {
        let fields = WORD_BITS / self.width;
        let spread = self.field_mask.wrapping_mul(lowbits(v, self.width - 1));
        let flags = self.flag_mask();
        let mut result = end - begin;
        let mut p = begin;
        while p < end {
            let step = fields.min(end - p);
            let word = self.get_range(p, p + step) | flags;
            let kept = flags & word.wrapping_sub(spread);
            result -= lowbits(kept, step * self.width).count_ones() as usize;
            p += step;
        }
        result
    }

    /// Copy fields `[src_begin, src_end)` of `src` over `dst_begin..`.
    /// Both views must share a field width; ranges must not alias.
    pub fn copy_from<T: BitStore>(
        &mut self,
        src: &PackedView<T>,
        src_begin: usize,
        src_end: usize,
        dst_begin: usize,
    ) {
        debug_assert_eq!(self.width, src.width);
        let w = self.width;
        self.bits
            .copy_from(&src.bits, src_begin * w, src_end * w, dst_begin * w);
    }

    /// Field-parallel add of fields `[src_begin, src_end)` of `src` into
    /// `dst_begin..`. Same flag-bit contract as [`PackedView::add`].
    pub fn add_from<T: BitStore>(
        &mut self,
        src: &PackedView<T>,
        src_begin: usize,
        src_end: usize,
        dst_begin: usize,
    ) {
        debug_assert_eq!(self.width, src.width);
        let w = self.width;
        self.bits
            .add_from(&src.bits, src_begin * w, src_end * w, dst_begin * w);
    }
}

impl<S: BitStore> fmt::Debug for PackedView<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackedView(w={})", self.width)?;
        for k in (0..self.len()).rev() {
            write!(f, " {}", to_binary(self.get(k), self.width, 0, ' '))?;
        }
        Ok(())
    }
}
