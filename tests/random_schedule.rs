//! A long random insert schedule checked against the implicit oracle.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use dbits::{DynamicBitVector, ImplicitBitVector};

#[test]
fn test_ten_thousand_random_inserts() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED_D815);
    let mut dbv = DynamicBitVector::new(10_000);
    let mut oracle = ImplicitBitVector::new();

    for _ in 0..10_000 {
        let at = rng.gen_range(0..=oracle.len());
        let bit = rng.gen_bool(0.5);
        dbv.insert(at, bit).unwrap();
        oracle.insert(at, bit);
    }

    assert!(dbv.is_full());
    assert_eq!(dbv.len(), 10_000);
    assert_eq!(dbv.rank(), oracle.rank1(10_000));
    for i in 0..10_000 {
        assert_eq!(dbv.access(i).unwrap(), oracle.get(i), "bit {i}");
    }
}

#[test]
fn test_skewed_schedules() {
    // heads, tails, and a zipper of both, at a capacity that forces several
    // root splits
    for (name, head_share) in [("heads", 1.0f64), ("tails", 0.0), ("zipper", 0.5)] {
        let mut rng = ChaCha8Rng::seed_from_u64(0xBADC_0FFE);
        let mut dbv = DynamicBitVector::new(5_000);
        let mut oracle = ImplicitBitVector::new();
        for _ in 0..5_000 {
            let at = if rng.gen_bool(head_share.clamp(0.0, 1.0)) {
                0
            } else {
                oracle.len()
            };
            let bit = rng.gen_bool(0.3);
            dbv.insert(at, bit).unwrap();
            oracle.insert(at, bit);
        }
        assert_eq!(dbv.rank(), oracle.rank1(5_000), "{name}");
        for i in 0..5_000 {
            assert_eq!(dbv.access(i).unwrap(), oracle.get(i), "{name} bit {i}");
        }
    }
}
