//! Performance benchmarks for bit stream I/O and CRC-32.
//!
//! This benchmark suite evaluates:
//! - Single-bit and multi-bit write throughput
//! - Read throughput for the same layouts
//! - CRC-32 throughput across data sizes

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxiblock_core::bitstream::{
    DefaultInputBitStream, DefaultOutputBitStream, InputBitStream, OutputBitStream,
};
use oxiblock_core::crc::Crc32;
use std::hint::black_box;
use std::io::Cursor;

/// Standard data sizes for benchmarking
mod data_sizes {
    pub const SMALL: usize = 4 * 1024; // 4 KB
    pub const MEDIUM: usize = 64 * 1024; // 64 KB
    pub const LARGE: usize = 1024 * 1024; // 1 MB
}

fn pseudo_random(size: usize) -> Vec<u8> {
    // Simple PRNG for reproducible random data
    let mut data = Vec::with_capacity(size);
    let mut seed: u64 = 0x123456789ABCDEF0;
    for _ in 0..size {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        data.push((seed >> 32) as u8);
    }
    data
}

/// Benchmark writing every bit individually versus 13-bit fields
fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitstream_write");
    let size = data_sizes::MEDIUM;
    let data = pseudo_random(size);
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_function("write_bit", |b| {
        b.iter(|| {
            let mut obs = DefaultOutputBitStream::new(Vec::with_capacity(size));
            for &byte in &data {
                for shift in (0..8).rev() {
                    obs.write_bit((byte >> shift) as u32);
                }
            }
            black_box(obs.into_inner().unwrap());
        });
    });

    group.bench_function("write_bits_13", |b| {
        b.iter(|| {
            let mut obs = DefaultOutputBitStream::new(Vec::with_capacity(size));
            for pair in data.chunks_exact(2) {
                obs.write_bits(u16::from_be_bytes([pair[0], pair[1]]) as u64, 13);
            }
            black_box(obs.into_inner().unwrap());
        });
    });

    group.bench_function("write_array", |b| {
        b.iter(|| {
            let mut obs = DefaultOutputBitStream::new(Vec::with_capacity(size));
            obs.write_bits(1, 3);
            obs.write_array(black_box(&data), size as u64 * 8);
            black_box(obs.into_inner().unwrap());
        });
    });

    group.finish();
}

/// Benchmark reading back single bits and 13-bit fields
fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitstream_read");
    let size = data_sizes::MEDIUM;
    let data = pseudo_random(size);
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_function("read_bit", |b| {
        b.iter(|| {
            let mut ibs = DefaultInputBitStream::new(Cursor::new(&data));
            let mut acc = 0u32;
            for _ in 0..size * 8 {
                acc = acc.wrapping_add(ibs.read_bit());
            }
            black_box(acc);
        });
    });

    group.bench_function("read_bits_13", |b| {
        b.iter(|| {
            let mut ibs = DefaultInputBitStream::new(Cursor::new(&data));
            let mut acc = 0u64;
            for _ in 0..(size * 8) / 13 {
                acc = acc.wrapping_add(ibs.read_bits(13));
            }
            black_box(acc);
        });
    });

    group.finish();
}

/// Benchmark CRC-32 across different data sizes
fn bench_crc32_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32_sizes");

    let sizes = [
        ("4KB", data_sizes::SMALL),
        ("64KB", data_sizes::MEDIUM),
        ("1MB", data_sizes::LARGE),
    ];

    for (size_name, size) in sizes {
        let data = pseudo_random(size);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size_name), &data, |b, data| {
            b.iter(|| {
                let checksum = Crc32::compute(black_box(data));
                black_box(checksum);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write, bench_read, bench_crc32_sizes);
criterion_main!(benches);
