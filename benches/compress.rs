//! Benchmarks for lzdict compression and decompression throughput.
//!
//! Covers the data shapes the compressor is tuned for: repetitive text,
//! long runs, and incompressible noise.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lzdict::{decompress, Compressor};
use std::io::Write;

/// Generate random (incompressible) data with a xorshift PRNG
fn generate_random_data(size: usize, seed: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state = seed | 1;
    for _ in 0..size {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        data.push((state & 0xFF) as u8);
    }
    data
}

/// Generate text-like data with repeated phrases
fn generate_text(size: usize) -> Vec<u8> {
    let phrases: [&str; 3] = [
        "the quick brown fox jumps over the lazy dog",
        "pack my box with five dozen liquor jugs",
        "how vexingly quick daft zebras jump",
    ];
    let mut data = Vec::with_capacity(size + 64);
    let mut i = 0usize;
    while data.len() < size {
        writeln!(data, "record {}: {}", i, phrases[i % phrases.len()]).unwrap();
        i += 1;
    }
    data.truncate(size);
    data
}

/// Generate run-heavy data (zero pages with sparse markers)
fn generate_runs(size: usize) -> Vec<u8> {
    let mut data = vec![0u8; size];
    let mut i = 0;
    while i < size {
        data[i] = (i / 997) as u8;
        i += 997;
    }
    data
}

fn bench_dictionary() -> Vec<u8> {
    let mut dict = Vec::new();
    write!(dict, "record : the quick brown fox jumps over the lazy dog ").unwrap();
    write!(dict, "pack my box with five dozen liquor jugs ").unwrap();
    dict.extend_from_slice(&[0u8; 64]);
    dict
}

fn bench_compress_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress_text");
    let dict = bench_dictionary();

    for size in [4 * 1024, 64 * 1024, 256 * 1024].iter() {
        let data = generate_text(*size);

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("text", size), &data, |b, data| {
            let mut compressor = Compressor::new(&dict).unwrap();
            b.iter(|| compressor.compress(data).unwrap());
        });
    }

    group.finish();
}

fn bench_data_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("data_patterns");
    let dict = bench_dictionary();
    let size = 64 * 1024;

    let patterns: [(&str, Vec<u8>); 3] = [
        ("random", generate_random_data(size, 0x5EED)),
        ("text", generate_text(size)),
        ("runs", generate_runs(size)),
    ];

    group.throughput(Throughput::Bytes(size as u64));
    for (name, data) in patterns.iter() {
        group.bench_with_input(BenchmarkId::new("compress", name), data, |b, data| {
            let mut compressor = Compressor::new(&dict).unwrap();
            b.iter(|| compressor.compress(data).unwrap());
        });
    }

    group.finish();
}

fn bench_incremental_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental");
    let dict = bench_dictionary();
    let data = generate_text(16 * 1024);

    group.throughput(Throughput::Bytes(data.len() as u64));
    for chunk_size in [256usize, 4096].iter() {
        group.bench_with_input(
            BenchmarkId::new("chunk", chunk_size),
            &data,
            |b, data| {
                let mut compressor = Compressor::new(&dict).unwrap();
                b.iter(|| {
                    compressor.reset();
                    for chunk in data.chunks(*chunk_size) {
                        compressor.write(chunk).unwrap();
                    }
                    compressor.len()
                });
            },
        );
    }

    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    let dict = bench_dictionary();
    let data = generate_text(256 * 1024);

    let mut compressor = Compressor::new(&dict).unwrap();
    let compressed = compressor.compress(&data).unwrap();

    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("text", |b| {
        b.iter(|| decompress(&compressed, &dict).unwrap());
    });

    group.finish();
}

fn bench_size_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("size_estimate");
    let dict = bench_dictionary();
    let data = generate_text(64 * 1024);
    let compressor = Compressor::new(&dict).unwrap();

    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("compressed_size_256k", |b| {
        b.iter(|| compressor.compressed_size_256k(&data).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_compress_sizes,
    bench_data_patterns,
    bench_incremental_writes,
    bench_decompress,
    bench_size_estimate,
);
criterion_main!(benches);
