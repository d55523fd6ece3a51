//! # Dynamic Succinct Bit Vectors
//!
//! *Insertion, access, and rank in `O(log n)` — near the information-theoretic
//! space limit.*
//!
//! ## Intuition First
//!
//! Picture a bookshelf where every book is shrink-wrapped to its exact width.
//! Reading any page is easy, but inserting a new page into the middle of a
//! book means reshelving everything after it. Classic succinct bit vectors
//! have the same flaw: superb space and query time, but a single insertion
//! forces a rebuild.
//!
//! The fix is to keep the shelf slightly loose: cut the bits into word-sized
//! leaves, hang them off a stubby B-tree whose nodes are themselves squeezed
//! into single machine words, and let neighbouring leaves lend each other
//! space. Insertions stay local, and the slack is a vanishing fraction of
//! the data.
//!
//! ## The Problem
//!
//! A dynamic sequence of $n$ bits under `insert`, `access`, and `rank`:
//! - **Plain arrays**: `O(1)` access, `O(n)` insertion.
//! - **Balanced trees of bits**: `O(log n)` everything, but pointers blow
//!   the space up to $O(n \log n)$ bits.
//! - **This crate**: $n + o(n)$ bits, `O(log n)` operations, amortized
//!   constant rebalancing work per update.
//!
//! ## Historical Context
//!
//! ```text
//! 1989  Jacobson         Succinct rank/select on static bit vectors
//! 1996  Munro-Raman      Constant-time static rank and select
//! 2005  Raman-Rao        Dynamic structures at the succinct space bound
//! 2008  Mäkinen-Navarro  Dynamic rank/select via B-trees of packed leaves
//! 2014  Gigante          Engineering the word-packed node layout
//! ```
//!
//! Mäkinen and Navarro observed that if every internal node packs its child
//! sizes, ranks, and pointers into machine words, the whole search step at a
//! node collapses to one word-parallel comparison — the tree costs almost
//! nothing beyond the bits themselves.
//!
//! ## Mathematical Formulation
//!
//! For capacity $N$ and word width $W = 64$:
//! - counter width $c = \lceil\log_2(N+1)\rceil + 1$ (one flag bit reserved),
//! - node degree $d = \lfloor W/c \rfloor$, arity $d + 1$,
//! - redistribution buffers $b = \lceil\sqrt{W}\rceil - 1$ and
//!   $b' = \lceil\sqrt{d}\rceil - 1$.
//!
//! Redistribution across `b` buffered neighbours keeps every leaf above a
//! constant fill fraction, which bounds the leaf count by $O(N/W)$ and the
//! height by $O(\log_d N)$.
//!
//! ## Complexity Analysis
//!
//! - **Time**: `O(log n)` per `access` and `insert`; the per-node work is
//!   `O(1)` thanks to SWAR comparisons. Rebalancing is amortized constant.
//! - **Space**: $N + o(N)$ bits, all allocated up front; updates never
//!   allocate.
//!
//! ## What Could Go Wrong
//!
//! 1. **Flag-bit discipline**: the word-parallel comparison borrows through
//!    the top bit of each counter. Store a value that reaches the flag bit
//!    and every search in that node silently misroutes.
//! 2. **Amortized ≠ cheap**: a single insert can still trigger a window
//!    redistribution touching `b` leaves; latency-sensitive callers should
//!    know the worst case is `O(√W · W)` bit moves.
//!
//! ## Implementation Notes
//!
//! This crate provides:
//! - **[`BitView`]**: bit-addressable view over machine words (get/set of
//!   single bits and ≤ word ranges, bulk copy, carry-propagating add).
//! - **[`PackedView`]**: equal-width bit-fields with word-parallel
//!   broadcast, add, and threshold search.
//! - **[`DynamicBitVector`]**: the insertable bit vector built on both.
//! - **[`ImplicitBitVector`]**: the unindexed baseline used by benches and
//!   as a test oracle.
//!
//! ## References
//!
//! - Mäkinen, V., & Navarro, G. (2008). "Dynamic entropy-compressed
//!   sequences and full-text indexes."
//! - Raman, R., Raman, V., & Rao, S. S. (2001). "Succinct dynamic data
//!   structures."
//! - Fredman, M., & Saks, M. (1989). "The cell probe complexity of dynamic
//!   data structures."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bits;
pub mod bitview;
pub mod dynamic;
pub mod error;
pub mod implicit;
pub mod packed;

pub use bitview::{BitBuf, BitSliceMut, BitStore, BitView};
pub use dynamic::DynamicBitVector;
pub use error::Error;
pub use implicit::ImplicitBitVector;
pub use packed::{PackedBuf, PackedView};
