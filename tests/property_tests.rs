use proptest::prelude::*;

use dbits::bits::{lowbits, lowmask};
use dbits::bitview::{BitBuf, BitSliceMut};
use dbits::packed::PackedBuf;

proptest! {
    #[test]
    fn test_bitview_roundtrip_property(
        words in prop::collection::vec(any::<u64>(), 1..8),
        begin_seed in any::<usize>(),
        len_seed in any::<usize>(),
        value in any::<u64>(),
    ) {
        let bits = words.len() * 64;
        let len = len_seed % 65;
        let begin = begin_seed % (bits - len + 1);
        let end = begin + len;

        let mut view = BitBuf::from_words(words.clone(), bits);
        view.set(begin, end, value);

        prop_assert_eq!(view.get(begin, end), lowbits(value, len));

        // every bit outside [begin, end) is untouched
        for i in (0..bits).filter(|&i| i < begin || i >= end) {
            let orig = words[i / 64] & (1u64 << (i % 64)) != 0;
            prop_assert_eq!(view.bit(i), orig, "bit {}", i);
        }
    }

    #[test]
    fn test_cross_view_copy_property(
        src_words in prop::collection::vec(any::<u64>(), 1..6),
        dst_words in prop::collection::vec(any::<u64>(), 1..6),
        seeds in any::<(usize, usize, usize)>(),
    ) {
        let src_bits = src_words.len() * 64;
        let dst_bits = dst_words.len() * 64;
        let max_len = src_bits.min(dst_bits);
        let len = seeds.0 % (max_len + 1);
        let src_begin = seeds.1 % (src_bits - len + 1);
        let dst_begin = seeds.2 % (dst_bits - len + 1);

        let src = BitBuf::from_words(src_words, src_bits);
        let mut backing = dst_words.clone();
        let mut dst = BitSliceMut::over(&mut backing, dst_bits);
        dst.copy_from(&src, src_begin, src_begin + len, dst_begin);

        for i in 0..len {
            prop_assert_eq!(dst.bit(dst_begin + i), src.bit(src_begin + i));
        }
        for i in (0..dst_bits).filter(|&i| i < dst_begin || i >= dst_begin + len) {
            let orig = dst_words[i / 64] & (1u64 << (i % 64)) != 0;
            prop_assert_eq!(dst.bit(i), orig, "bit {}", i);
        }
    }

    #[test]
    fn test_sum_with_carry_property(
        stored in any::<u64>(),
        addend in any::<u64>(),
        carry in any::<bool>(),
        begin_seed in any::<usize>(),
        len_seed in any::<usize>(),
    ) {
        let len = 1 + len_seed % 64;
        let begin = begin_seed % (256 - len + 1);

        let mut view = BitBuf::new(256);
        view.set(begin, begin + len, stored);

        let field = lowbits(stored, len);
        let total = field as u128 + addend as u128 + carry as u128;
        let expect_sum = (total & ((1u128 << len) - 1)) as u64;
        let expect_carry = total >> len != 0;

        prop_assert_eq!(
            view.sum_with_carry(begin, begin + len, carry, addend),
            (expect_sum, expect_carry)
        );
    }

    #[test]
    fn test_packed_find_property(
        width in 2usize..16,
        raw in prop::collection::vec(any::<u64>(), 1..40),
        threshold in any::<u64>(),
    ) {
        // stored fields keep the flag bit free, as the tree does
        let values: Vec<u64> = raw.iter().map(|&v| lowbits(v, width - 1)).collect();
        let v = lowbits(threshold, width - 1);

        let mut pv = PackedBuf::new(width, values.len());
        for (k, &x) in values.iter().enumerate() {
            pv.set(k, x);
        }

        for begin in [0, values.len() / 3] {
            let end = values.len();
            let naive = values[begin..end].iter().filter(|&&x| x < v).count();
            prop_assert_eq!(pv.find(begin, end, v), naive);
        }
    }

    #[test]
    fn test_packed_repeat_property(
        width in 1usize..16,
        len in 1usize..60,
        value in any::<u64>(),
    ) {
        let mut pv = PackedBuf::new(width, len);
        pv.repeat(0, len, value);
        for k in 0..len {
            prop_assert_eq!(pv.get(k), lowbits(value, width));
        }
    }

    #[test]
    fn test_packed_set_get_property(
        width in 1usize..32,
        raw in prop::collection::vec(any::<u64>(), 1..40),
    ) {
        let mut pv = PackedBuf::new(width, raw.len());
        for (k, &v) in raw.iter().enumerate() {
            pv.set(k, v);
        }
        for (k, &v) in raw.iter().enumerate() {
            prop_assert_eq!(pv.get(k), lowbits(v, width));
        }
    }
}

use dbits::{DynamicBitVector, ImplicitBitVector};

proptest! {
    #[test]
    fn test_tree_matches_oracle(
        ops in prop::collection::vec(any::<(u16, bool)>(), 1..300),
    ) {
        let mut dbv = DynamicBitVector::new(ops.len());
        let mut oracle = ImplicitBitVector::new();

        for &(pos, bit) in &ops {
            let at = pos as usize % (oracle.len() + 1);
            dbv.insert(at, bit).unwrap();
            oracle.insert(at, bit);
        }

        prop_assert_eq!(dbv.len(), oracle.len());
        prop_assert_eq!(dbv.rank(), oracle.rank1(oracle.len()));
        for i in 0..oracle.len() {
            prop_assert_eq!(dbv.access(i).unwrap(), oracle.get(i), "bit {}", i);
        }
    }

    #[test]
    fn test_tree_append_then_read(
        bits in prop::collection::vec(any::<bool>(), 1..400),
    ) {
        let mut dbv = DynamicBitVector::new(bits.len());
        for (i, &b) in bits.iter().enumerate() {
            dbv.insert(i, b).unwrap();
        }
        prop_assert!(dbv.is_full());
        prop_assert_eq!(dbv.rank(), bits.iter().filter(|&&b| b).count());
        for (i, &b) in bits.iter().enumerate() {
            prop_assert_eq!(dbv.access(i).unwrap(), b, "bit {}", i);
        }
    }
}

#[test]
fn test_bitview_mask_helpers_agree() {
    // lowmask/lowbits are the base of every ranged operation; pin the edges
    assert_eq!(lowmask(0), 0);
    assert_eq!(lowmask(64), u64::MAX);
    assert_eq!(lowbits(u64::MAX, 63), u64::MAX >> 1);
}
