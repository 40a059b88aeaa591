//! Decode throughput benchmarks.
//!
//! Measures one-shot decompression of the test fixtures: a small highly
//! compressible stream, an incompressible stream (stored chunks), and a
//! multi-chunk stream.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use unlzma2::decompress_into;

const TEXT: &[u8] = include_bytes!("../tests/data/text.lzma2");
const RANDOM: &[u8] = include_bytes!("../tests/data/random.lzma2");
const BIG: &[u8] = include_bytes!("../tests/data/big.lzma2");

fn decoded_size(stream: &[u8]) -> usize {
    let mut probe = vec![0u8; 4 << 20];
    let outcome = decompress_into(stream, &mut probe);
    assert!(outcome.status.is_ok());
    outcome.produced
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for (name, stream) in [("text", TEXT), ("random", RANDOM), ("big", BIG)] {
        let size = decoded_size(stream);
        let mut out = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), stream, |b, stream| {
            b.iter(|| {
                let outcome = decompress_into(black_box(stream), black_box(&mut out));
                assert!(outcome.status.is_ok());
                outcome.produced
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
