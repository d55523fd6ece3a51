#![no_main]
use dbits::{DynamicBitVector, ImplicitBitVector};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|ops: Vec<(u16, bool)>| {
    if ops.is_empty() {
        return;
    }

    let mut dbv = DynamicBitVector::new(ops.len());
    let mut oracle = ImplicitBitVector::new();

    for &(pos, bit) in &ops {
        let at = pos as usize % (oracle.len() + 1);
        dbv.insert(at, bit).unwrap();
        oracle.insert(at, bit);
    }

    assert_eq!(dbv.len(), oracle.len());
    assert_eq!(dbv.rank(), oracle.rank1(oracle.len()));
    for i in 0..oracle.len() {
        assert_eq!(dbv.access(i).unwrap(), oracle.get(i), "bit {i}");
    }
});
