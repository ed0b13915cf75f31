//! Round trips and size bounds for every registered transform.

use oxiblock_core::ErrorKind;
use oxiblock_transform::{
    DeltaCodec, Function, Transform, TransformSequence, TransformType, new_sequence, parse_chain,
};
use proptest::prelude::*;

fn roundtrip(t: TransformType, data: &[u8]) -> Vec<u8> {
    let mut function = t.new_function();
    let bound = function.max_encoded_len(data.len()).unwrap();
    let mut encoded = vec![0u8; bound];
    let result = function.forward(data, &mut encoded).unwrap();
    assert_eq!(result.consumed, data.len(), "{t}");
    assert!(result.produced <= bound, "{t}");

    let mut decoded = vec![0u8; bound];
    let result = t
        .new_function()
        .inverse(&encoded[..result.produced], &mut decoded)
        .unwrap();
    decoded.truncate(result.produced);
    decoded
}

fn chain_roundtrip(types: &[TransformType], data: &[u8], capacity: usize) -> (Vec<u8>, u8) {
    let mut forward = new_sequence(types).unwrap();
    let mut encoded = vec![0u8; capacity];
    let result = forward.forward(data, &mut encoded).unwrap();
    let skip_flags = forward.skip_flags();

    let mut inverse = new_sequence(types).unwrap();
    inverse.set_skip_flags(skip_flags);
    let mut decoded = vec![0u8; capacity];
    let result = inverse
        .inverse(&encoded[..result.produced], &mut decoded)
        .unwrap();
    decoded.truncate(result.produced);
    (decoded, skip_flags)
}

#[test]
fn test_every_transform_on_edge_inputs() {
    let cases: [&[u8]; 5] = [b"", b"x", b"xxxx", &[0u8; 4096], b"abcabcabcabd"];
    for t in TransformType::ALL {
        for data in cases {
            assert_eq!(roundtrip(t, data), data, "{t} on {} bytes", data.len());
        }
    }
}

#[test]
fn test_full_chain_compacts_text() {
    let data = b"she sells sea shells by the sea shore ".repeat(200);
    let types = parse_chain("BWT+MTFT+RLT").unwrap();
    let mut seq = new_sequence(&types).unwrap();
    let mut encoded = vec![0u8; seq.max_encoded_len(data.len()).unwrap()];
    let result = seq.forward(&data, &mut encoded).unwrap();
    assert_eq!(seq.skip_flags(), 0);
    // BWT groups the repeats into long runs that RLT collapses
    assert!(result.produced < data.len() / 4);
}

#[test]
fn test_chain_without_headroom_skips_expanding_step() {
    // Every run has length four, so RLT alone would grow the data
    let data: Vec<u8> = (0..1024).map(|i| (i / 4 % 251) as u8).collect();
    let types = parse_chain("RLT").unwrap();
    let (decoded, skip_flags) = chain_roundtrip(&types, &data, data.len());
    assert_eq!(skip_flags, 0b1);
    assert_eq!(decoded, data);
}

#[test]
fn test_forward_in_rejects_overlap() {
    let mut buf = vec![0u8; 64];
    buf[..16].copy_from_slice(b"overlap overlap!");

    for t in TransformType::ALL {
        let err = t.new_function().forward_in(&mut buf, 0..16, 8..40).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam, "{t}");
        let err = t.new_function().inverse_in(&mut buf, 8..40, 0..16).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam, "{t}");
    }

    let result = TransformType::Bwt
        .new_function()
        .forward_in(&mut buf, 0..16, 32..64)
        .unwrap();
    assert_eq!(result.produced, 20);
}

#[test]
fn test_integer_sequence_roundtrip() {
    let data: Vec<i32> = (0..1000).map(|i| (i * 37) % 101 - 50).collect();
    let steps: Vec<Box<dyn Function<i32>>> = vec![Box::new(DeltaCodec::new())];
    let mut seq = TransformSequence::new(steps).unwrap();
    let mut encoded = vec![0i32; data.len()];
    seq.forward(&data, &mut encoded).unwrap();

    let mut decoded = vec![0i32; data.len()];
    seq.inverse(&encoded, &mut decoded).unwrap();
    assert_eq!(decoded, data);
}

fn transform_type() -> impl Strategy<Value = TransformType> {
    (0u8..4).prop_map(|id| TransformType::from_id(id).unwrap())
}

proptest! {
    #[test]
    fn test_transform_roundtrip(
        t in transform_type(),
        data in prop::collection::vec(0u8..4, 0..2000),
    ) {
        prop_assert_eq!(roundtrip(t, &data), data);
    }

    #[test]
    fn test_forward_within_bound(
        t in transform_type(),
        data in prop::collection::vec(any::<u8>(), 0..2000),
    ) {
        let mut function = t.new_function();
        let bound = function.max_encoded_len(data.len()).unwrap();
        let mut encoded = vec![0u8; bound];
        let result = function.forward(&data, &mut encoded).unwrap();
        prop_assert!(result.produced <= bound);
    }

    #[test]
    fn test_chain_roundtrip(
        types in prop::collection::vec(transform_type(), 0..=8),
        data in prop::collection::vec(0u8..3, 0..1500),
        headroom in 0usize..64,
    ) {
        let (decoded, _) = chain_roundtrip(&types, &data, data.len() + headroom);
        prop_assert_eq!(decoded, data);
    }
}
