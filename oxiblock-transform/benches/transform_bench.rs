//! Performance benchmarks for oxiblock-transform
//!
//! This benchmark suite evaluates:
//! - BWT forward and inverse throughput on text, random and repeated data
//! - The full BWT+MTFT+RLT chain

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxiblock_transform::{Bwt, Function, Transform, new_sequence, parse_chain};
use std::hint::black_box;

/// Type alias for pattern generator functions
type PatternGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    pub fn text(size: usize) -> Vec<u8> {
        let text = b"The quick brown fox jumps over the lazy dog. \
                     Pack my box with five dozen liquor jugs. ";
        text.iter().copied().cycle().take(size).collect()
    }

    pub fn random(size: usize) -> Vec<u8> {
        let mut seed: u64 = 0x9E3779B97F4A7C15;
        (0..size)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                (seed >> 32) as u8
            })
            .collect()
    }

    pub fn repeated(size: usize) -> Vec<u8> {
        vec![b'z'; size]
    }
}

const PATTERNS: [(&str, PatternGenerator); 3] = [
    ("text", test_data::text),
    ("random", test_data::random),
    ("repeated", test_data::repeated),
];

fn bench_bwt(c: &mut Criterion) {
    let mut group = c.benchmark_group("bwt");

    for size in [4 * 1024, 64 * 1024, 256 * 1024] {
        for (name, generate) in PATTERNS {
            let data = generate(size);
            let mut encoded = vec![0u8; size + 4];
            Bwt::new().forward(&data, &mut encoded).unwrap();
            let mut decoded = vec![0u8; size];

            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("forward_{name}"), size),
                &data,
                |b, data| {
                    let mut dst = vec![0u8; size + 4];
                    b.iter(|| Bwt::new().forward(black_box(data), &mut dst).unwrap())
                },
            );
            group.bench_with_input(
                BenchmarkId::new(format!("inverse_{name}"), size),
                &encoded,
                |b, encoded| b.iter(|| Bwt::new().inverse(black_box(encoded), &mut decoded).unwrap()),
            );
        }
    }

    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("bwt_mtft_rlt");
    let types = parse_chain("BWT+MTFT+RLT").unwrap();

    for size in [64 * 1024, 1024 * 1024] {
        let data = test_data::text(size);
        let mut seq = new_sequence(&types).unwrap();
        let mut dst = vec![0u8; seq.max_encoded_len(size).unwrap()];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("forward", size), &data, |b, data| {
            b.iter(|| seq.forward(black_box(data), &mut dst).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bwt, bench_chain);
criterion_main!(benches);
