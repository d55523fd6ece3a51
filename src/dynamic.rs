//! Dynamic bit vector: a B-tree of word-sized bit leaves.
//!
//! Supports `insert` and `access` (plus running rank) in `O(log n)` while
//! staying close to the information-theoretic space bound, after Mäkinen &
//! Navarro. Each internal node is three machine words: packed cumulative
//! child sizes, packed cumulative child ranks, and packed child pointers.
//! Each leaf is a single word of payload bits.
//!
//! # Layout
//!
//! With counter width $c = \lceil\log_2(N+1)\rceil + 1$ a node holds
//! $d = \lfloor 64/c \rfloor$ counters, giving arity $d + 1$; the last
//! child's cumulative size is its parent's problem. The top bit of every
//! counter (the flag bit) stays clear so that one SWAR subtraction compares
//! all counters of a node against a target index at once.
//!
//! Insertion descends by that parallel comparison, bumping the cumulative
//! counters field-parallel on the way down. A full leaf (or node) is repaired
//! by sliding a window of `b` (resp. `b′`) neighbouring children, picking the
//! placement with the most free slots, and redistributing payload evenly
//! across it — inserting a fresh sibling first when the window cannot absorb
//! the overflow. Only a root split grows the height, and the root never moves
//! from node slot 0.
//!
//! Nodes and leaves live in arenas sized at construction; slot indices come
//! from bump counters and are never freed (the structure is insert-only).

use std::fmt;

use crate::bits::{ceil_log2, ceil_sqrt, insert_bit, WORD_BITS};
use crate::bitview::BitBuf;
use crate::error::{Error, Result};
use crate::packed::PackedBuf;

/// A bit vector with `O(log n)` insertion at arbitrary positions.
pub struct DynamicBitVector {
    capacity: usize,
    size: usize,
    rank: usize,
    /// Height of the tree; 1 means the root's children are leaves.
    height: usize,

    /// Cumulative child sizes, `degree` counters per node.
    sizes: PackedBuf,
    /// Cumulative child ranks, `degree` counters per node.
    ranks: PackedBuf,
    /// Child slot indices, `degree + 1` per node. Zero means absent.
    pointers: PackedBuf,
    /// Leaf payloads. Index 0 is the reserved null sentinel; bits above a
    /// leaf's stored length are zero.
    leaves: Vec<u64>,

    counter_width: usize,
    pointer_width: usize,
    degree: usize,
    /// Redistribution window width for leaves (`b`).
    leaves_buffer: usize,
    /// Redistribution window width for internal nodes (`b′`).
    nodes_buffer: usize,

    free_node: usize,
    free_leaf: usize,

    /// Reusable gather buffer for leaf redistribution.
    bit_scratch: BitBuf,
    /// Reusable gather buffer for key redistribution: (size, rank, pointer).
    key_scratch: Vec<(u64, u64, u64)>,
}

impl DynamicBitVector {
    /// Create an empty vector able to hold up to `capacity` bits.
    ///
    /// All arenas are sized here; inserts never allocate.
    pub fn new(capacity: usize) -> Self {
        // One extra value above the flag bit keeps every counter strictly
        // below it, including at exactly full capacity.
        let counter_width = ceil_log2(capacity + 1) + 1;
        let mut degree = WORD_BITS / counter_width;

        // The packed pointer word bounds the arity: p·(d+1) ≤ 64. Shrinking
        // the degree shrinks the arenas and thus p, so iterate to a fixpoint.
        loop {
            debug_assert!(degree >= 2, "capacity too large for the word width");
            let leaves_buffer = (ceil_sqrt(WORD_BITS) - 1).clamp(1, degree);
            let nodes_buffer = (ceil_sqrt(degree) - 1).max(1);

            // Freshly redistributed windows can sit near W/(b+1) bits per
            // leaf, well under the steady-state fill; size for that.
            let min_leaf_fill = (WORD_BITS / (leaves_buffer + 1)).max(1);
            let leaves_count = capacity.div_ceil(min_leaf_fill) + leaves_buffer + 2;

            let min_children = ((degree + 1) / (nodes_buffer + 1)).max(2);
            let mut nodes_count = 0;
            let mut level = leaves_count;
            while level > 1 {
                level = level.div_ceil(min_children);
                nodes_count += level;
            }
            // headroom for degenerate single-child chains
            nodes_count = nodes_count.max(1) + WORD_BITS;

            let pointer_width = ceil_log2((nodes_count + 1).max(leaves_count + 1)).max(1);
            if (degree + 1) * pointer_width > WORD_BITS {
                degree = WORD_BITS / pointer_width - 1;
                continue;
            }

            let mut dbv = Self {
                capacity,
                size: 0,
                rank: 0,
                height: 1,
                sizes: PackedBuf::new(counter_width, degree * nodes_count),
                ranks: PackedBuf::new(counter_width, degree * nodes_count),
                pointers: PackedBuf::new(pointer_width, (degree + 1) * nodes_count),
                leaves: vec![0u64; leaves_count + 1],
                counter_width,
                pointer_width,
                degree,
                leaves_buffer,
                nodes_buffer,
                free_node: 0,
                free_leaf: 1, // leaf 0 is the null sentinel
                bit_scratch: BitBuf::new((leaves_buffer + 1) * WORD_BITS),
                key_scratch: Vec::with_capacity((nodes_buffer + 1) * (degree + 1)),
            };
            let root = dbv.alloc_node();
            debug_assert_eq!(root, 0);
            let first = dbv.alloc_leaf() as u64;
            dbv.pointers.set(0, first);
            return dbv;
        }
    }

    /// Number of bits stored.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Return true if no bits are stored.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Return true if the vector has reached its capacity.
    pub fn is_full(&self) -> bool {
        self.size == self.capacity
    }

    /// Number of set bits stored.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Maximum number of bits this vector can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current tree height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Read the bit at `index`.
    pub fn access(&self, index: usize) -> Result<bool> {
        if index >= self.size {
            return Err(Error::IndexOutOfBounds(index));
        }
        let mut node = 0;
        let mut height = self.height;
        let mut index = index;
        let mut total = self.size;
        loop {
            let (mut child, mut rest) = self.find_insert_point(node, index);
            // the insert-side search ties to the left; step past a child
            // whose bits are exhausted
            if rest == self.child_size(node, child, total) {
                child += 1;
                rest = 0;
            }
            let ptr = self.child_ptr(node, child);
            debug_assert_ne!(ptr, 0);
            if height == 1 {
                return Ok(self.leaves[ptr] & (1u64 << rest) != 0);
            }
            total = self.child_size(node, child, total);
            index = rest;
            node = ptr;
            height -= 1;
        }
    }

    /// Insert `bit` before position `index` (`index == len()` appends).
    pub fn insert(&mut self, index: usize, bit: bool) -> Result<()> {
        if self.size == self.capacity {
            return Err(Error::CapacityExhausted(self.capacity));
        }
        if index > self.size {
            return Err(Error::IndexOutOfBounds(index));
        }
        if self.node_is_full(0) {
            self.split_root();
        }
        self.insert_rec(0, self.height, index, self.size, self.rank, bit);
        self.size += 1;
        self.rank += bit as usize;
        Ok(())
    }

    // ---- descent -------------------------------------------------------

    /// The child that an insert at `index` descends into, and the index
    /// relative to that child. Ties go to the leftmost candidate.
    fn find_insert_point(&self, node: usize, index: usize) -> (usize, usize) {
        let base = node * self.degree;
        let child = self.sizes.find(base, base + self.degree, index as u64);
        let before = if child == 0 {
            0
        } else {
            self.sizes.get(base + child - 1) as usize
        };
        (child, index - before)
    }

    /// Size in bits of `child`, given the subtree total (needed for the last
    /// slot, which has no counter of its own).
    fn child_size(&self, node: usize, child: usize, total: usize) -> usize {
        let base = node * self.degree;
        let hi = if child == self.degree {
            total
        } else {
            self.sizes.get(base + child) as usize
        };
        let lo = if child == 0 {
            0
        } else {
            self.sizes.get(base + child - 1) as usize
        };
        hi - lo
    }

    /// Rank counterpart of [`Self::child_size`].
    fn child_rank(&self, node: usize, child: usize, total_rank: usize) -> usize {
        let base = node * self.degree;
        let hi = if child == self.degree {
            total_rank
        } else {
            self.ranks.get(base + child) as usize
        };
        let lo = if child == 0 {
            0
        } else {
            self.ranks.get(base + child - 1) as usize
        };
        hi - lo
    }

    fn child_ptr(&self, node: usize, child: usize) -> usize {
        self.pointers.get(node * (self.degree + 1) + child) as usize
    }

    /// Children occupy pointer slots contiguously from 0, so a node is at
    /// full arity exactly when its last slot is taken.
    fn node_is_full(&self, node: usize) -> bool {
        self.child_ptr(node, self.degree) != 0
    }

    fn node_children(&self, node: usize) -> usize {
        let mut n = 0;
        while n <= self.degree && self.child_ptr(node, n) != 0 {
            n += 1;
        }
        n
    }

    fn alloc_node(&mut self) -> usize {
        debug_assert!((self.free_node + 1) * self.degree <= self.sizes.len());
        let slot = self.free_node;
        self.free_node += 1;
        slot
    }

    fn alloc_leaf(&mut self) -> usize {
        debug_assert!(self.free_leaf < self.leaves.len());
        let slot = self.free_leaf;
        self.free_leaf += 1;
        slot
    }

    // ---- insertion -----------------------------------------------------

    fn insert_rec(
        &mut self,
        node: usize,
        height: usize,
        index: usize,
        total: usize,
        total_rank: usize,
        bit: bool,
    ) {
        let (mut child, mut rest) = self.find_insert_point(node, index);
        let base = node * self.degree;

        if height == 1 {
            if self.child_size(node, child, total) == WORD_BITS {
                let (begin, mut end, win_total) = self.find_adjacent(node, child, total, true);
                if win_total >= self.leaves_buffer * (WORD_BITS - self.leaves_buffer) {
                    self.insert_child(node, height, end);
                    end += 1;
                }
                self.redistribute_bits(node, begin, end, win_total, total);
                (child, rest) = self.find_insert_point(node, index);
            }
            self.sizes.add(base + child, base + self.degree, 1);
            if bit {
                self.ranks.add(base + child, base + self.degree, 1);
            }
            let ptr = self.child_ptr(node, child);
            debug_assert_ne!(ptr, 0);
            self.leaves[ptr] = insert_bit(self.leaves[ptr], rest, bit);
        } else {
            let mut ptr = self.child_ptr(node, child);
            if self.node_is_full(ptr) {
                let (begin, mut end, _) = self.find_adjacent(node, child, total, false);
                // always split — unless the window already ends in an
                // unallocated slot, which redistribution will fill itself
                if self.child_ptr(node, end - 1) != 0 {
                    self.insert_child(node, height, end);
                    end += 1;
                }
                self.redistribute_keys(node, begin, end, total, total_rank);
                (child, rest) = self.find_insert_point(node, index);
                ptr = self.child_ptr(node, child);
            }
            let child_total = self.child_size(node, child, total);
            let child_rank = self.child_rank(node, child, total_rank);
            self.sizes.add(base + child, base + self.degree, 1);
            if bit {
                self.ranks.add(base + child, base + self.degree, 1);
            }
            self.insert_rec(ptr, height - 1, rest, child_total, child_rank, bit);
        }
    }

    /// Grow the tree by one level: copy the root into a fresh slot and
    /// repoint the root (always slot 0) at the copy alone.
    fn split_root(&mut self) {
        let d = self.degree;
        let copy = self.alloc_node();
        let w = self.sizes.get_range(0, d);
        self.sizes.set_range(copy * d, copy * d + d, w);
        let w = self.ranks.get_range(0, d);
        self.ranks.set_range(copy * d, copy * d + d, w);
        let w = self.pointers.get_range(0, d + 1);
        self.pointers
            .set_range(copy * (d + 1), (copy + 1) * (d + 1), w);

        self.sizes.repeat(0, d, self.size as u64);
        self.ranks.repeat(0, d, self.rank as u64);
        self.pointers.set_range(0, d + 1, 0);
        self.pointers.set(0, copy as u64);
        self.height += 1;
    }

    /// Open child slot `k` of `node`, shifting later counters and pointers
    /// one slot right and allocating the new child (leaf at height 1).
    ///
    /// The fresh counter is seeded with the preceding cumulative value, so
    /// the new child reads as empty and every counter stays exact.
    fn insert_child(&mut self, node: usize, height: usize, k: usize) {
        let d = self.degree;
        debug_assert!(k <= d);
        debug_assert!(!self.node_is_full(node));
        let sbase = node * d;
        let pbase = node * (d + 1);
        if k < d {
            let w = self.sizes.get_range(sbase + k, sbase + d);
            self.sizes
                .set_range(sbase + k, sbase + d, w << self.counter_width);
            let w = self.ranks.get_range(sbase + k, sbase + d);
            self.ranks
                .set_range(sbase + k, sbase + d, w << self.counter_width);
            let prefix_s = if k == 0 { 0 } else { self.sizes.get(sbase + k - 1) };
            let prefix_r = if k == 0 { 0 } else { self.ranks.get(sbase + k - 1) };
            self.sizes.set(sbase + k, prefix_s);
            self.ranks.set(sbase + k, prefix_r);
        }
        let w = self.pointers.get_range(pbase + k, pbase + d + 1);
        self.pointers
            .set_range(pbase + k, pbase + d + 1, w << self.pointer_width);
        let slot = if height == 1 {
            self.alloc_leaf()
        } else {
            self.alloc_node()
        } as u64;
        self.pointers.set(pbase + k, slot);
    }

    /// Choose the window of `b` (leaves) or `b′` (nodes) adjacent child
    /// slots containing `child` with the most free slots.
    ///
    /// Returns `(begin, end, used)` where `used` is the total bit count
    /// (leaves) or key count (nodes) inside the chosen window.
    fn find_adjacent(
        &self,
        node: usize,
        child: usize,
        total: usize,
        leaves: bool,
    ) -> (usize, usize, usize) {
        let d = self.degree;
        let (buffer, maxcount) = if leaves {
            (self.leaves_buffer, WORD_BITS)
        } else {
            (self.nodes_buffer, d)
        };
        let slots = |i: usize| -> usize {
            let ptr = self.child_ptr(node, i);
            if ptr == 0 {
                maxcount
            } else if leaves {
                maxcount - self.child_size(node, i, total)
            } else {
                maxcount - (self.node_children(ptr) - 1)
            }
        };

        let lo = (child + 1).saturating_sub(buffer);
        let hi = child.min(d + 1 - buffer);
        let mut free: usize = (lo..lo + buffer).map(|i| slots(i)).sum();
        let mut best_free = free;
        let mut best_begin = lo;
        for s in lo + 1..=hi {
            free = free - slots(s - 1) + slots(s + buffer - 1);
            if free > best_free {
                best_free = free;
                best_begin = s;
            }
        }
        (best_begin, best_begin + buffer, maxcount * buffer - best_free)
    }

    /// Spread the bits of window `[begin, end)` evenly over its leaves,
    /// allocating absent slots, and rebuild the window's counters.
    fn redistribute_bits(
        &mut self,
        node: usize,
        begin: usize,
        end: usize,
        win_total: usize,
        total: usize,
    ) {
        let d = self.degree;
        let mut off = 0;
        for i in begin..end {
            let ptr = self.child_ptr(node, i);
            if ptr == 0 {
                continue;
            }
            let n = self.child_size(node, i, total);
            self.bit_scratch.set(off, off + n, self.leaves[ptr]);
            off += n;
        }
        debug_assert_eq!(off, win_total);

        let window = end - begin;
        let per = win_total / window;
        let mut rem = win_total % window;
        let base = node * d;
        let mut cum = if begin == 0 { 0 } else { self.sizes.get(base + begin - 1) };
        let mut cumr = if begin == 0 { 0 } else { self.ranks.get(base + begin - 1) };
        let mut off = 0;
        for i in begin..end {
            let n = per + usize::from(rem > 0);
            rem = rem.saturating_sub(1);
            if self.child_ptr(node, i) == 0 {
                let slot = self.alloc_leaf() as u64;
                self.pointers.set(node * (d + 1) + i, slot);
            }
            let ptr = self.child_ptr(node, i);
            let word = self.bit_scratch.get(off, off + n);
            self.leaves[ptr] = word;
            off += n;
            cum += n as u64;
            cumr += u64::from(word.count_ones());
            if i < d {
                self.sizes.set(base + i, cum);
                self.ranks.set(base + i, cumr);
            }
        }
        // counters past the window keep their old values: the window's
        // total is unchanged
    }

    /// Spread the `(size, rank, pointer)` triples of all grandchildren in
    /// window `[begin, end)` evenly over its nodes, allocating absent slots,
    /// and rebuild both the window nodes and the window's counters.
    fn redistribute_keys(
        &mut self,
        node: usize,
        begin: usize,
        end: usize,
        total: usize,
        total_rank: usize,
    ) {
        let d = self.degree;
        let mut scratch = std::mem::take(&mut self.key_scratch);
        scratch.clear();
        for i in begin..end {
            let p = self.child_ptr(node, i);
            if p == 0 {
                continue;
            }
            let p_total = self.child_size(node, i, total);
            let p_rank = self.child_rank(node, i, total_rank);
            for j in 0..self.node_children(p) {
                scratch.push((
                    self.child_size(p, j, p_total) as u64,
                    self.child_rank(p, j, p_rank) as u64,
                    self.child_ptr(p, j) as u64,
                ));
            }
        }

        let window = end - begin;
        let per = scratch.len() / window;
        let mut rem = scratch.len() % window;
        let base = node * d;
        let mut cum = if begin == 0 { 0 } else { self.sizes.get(base + begin - 1) };
        let mut cumr = if begin == 0 { 0 } else { self.ranks.get(base + begin - 1) };
        let mut off = 0;
        for i in begin..end {
            let n = per + usize::from(rem > 0);
            rem = rem.saturating_sub(1);
            debug_assert!(n >= 1 && n <= d);
            if self.child_ptr(node, i) == 0 {
                let slot = self.alloc_node() as u64;
                self.pointers.set(node * (d + 1) + i, slot);
            }
            let p = self.child_ptr(node, i);
            let pbase = p * d;
            let ppbase = p * (d + 1);
            let mut c = 0u64;
            let mut cr = 0u64;
            for j in 0..n {
                let (s, r, q) = scratch[off + j];
                c += s;
                cr += r;
                if j < d {
                    self.sizes.set(pbase + j, c);
                    self.ranks.set(pbase + j, cr);
                }
                self.pointers.set(ppbase + j, q);
            }
            // unused counters track the subtree total; unused pointers clear
            self.sizes.repeat(pbase + (n - 1), pbase + d, c);
            self.ranks.repeat(pbase + (n - 1), pbase + d, cr);
            self.pointers.set_range(ppbase + n, ppbase + d + 1, 0);
            off += n;
            cum += c;
            cumr += cr;
            if i < d {
                self.sizes.set(base + i, cum);
                self.ranks.set(base + i, cumr);
            }
        }
        debug_assert_eq!(off, scratch.len());
        scratch.clear();
        self.key_scratch = scratch;
    }

    /// Walk the tree asserting structural invariants. Test support.
    #[cfg(test)]
    fn check_invariants(&self) {
        if self.size == 0 {
            return;
        }
        self.check_node(0, self.height, self.size, self.rank);
    }

    #[cfg(test)]
    fn check_node(&self, node: usize, height: usize, total: usize, total_rank: usize) {
        let d = self.degree;
        let n = self.node_children(node);
        assert!(n >= 1 && n <= d + 1, "node {node} arity {n}");
        for k in n..=d {
            assert_eq!(self.child_ptr(node, k), 0, "node {node} sparse slot {k}");
        }
        let base = node * d;
        let mut prev = 0;
        for k in 0..d {
            let c = self.sizes.get(base + k) as usize;
            assert!(c >= prev, "node {node} counters must be nondecreasing");
            prev = c;
            if k >= n.saturating_sub(1) {
                assert_eq!(c, total, "node {node} suffix counter {k}");
                assert_eq!(self.ranks.get(base + k) as usize, total_rank);
            }
        }
        for k in 0..n {
            let s = self.child_size(node, k, total);
            let r = self.child_rank(node, k, total_rank);
            assert!(s >= 1, "node {node} child {k} is empty");
            assert!(r <= s);
            if height == 1 {
                let leaf = self.leaves[self.child_ptr(node, k)];
                assert!(s <= WORD_BITS);
                assert_eq!(
                    leaf,
                    crate::bits::lowbits(leaf, s),
                    "leaf tail bits must be zero"
                );
                assert_eq!(leaf.count_ones() as usize, r, "leaf popcount vs rank");
            } else {
                self.check_node(self.child_ptr(node, k), height - 1, s, r);
            }
        }
    }
}

impl fmt::Debug for DynamicBitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicBitVector")
            .field("len", &self.size)
            .field("rank", &self.rank)
            .field("capacity", &self.capacity)
            .field("height", &self.height)
            .field("degree", &self.degree)
            .finish()
    }
}
