//! Performance benchmarks for HyperCopy
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hypercopy::config::{CopierConfig, ExecutionBackend, WriteSync};
use hypercopy::core::{Element, ParallelCopier};

/// Create a source buffer of the given length
fn create_source(len: usize) -> Vec<Element> {
    (0..len as Element).map(|i| i ^ 0x5555).collect()
}

fn bench_copy_backends(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_backends");
    group.sample_size(20);

    for len in [10_000usize, 1_000_000, 10_000_000] {
        let src = create_source(len);
        let mut dst = vec![0 as Element; len];

        group.throughput(Throughput::Bytes((len * std::mem::size_of::<Element>()) as u64));

        for backend in [ExecutionBackend::Threads, ExecutionBackend::Rayon] {
            let copier = ParallelCopier::new(CopierConfig {
                backend,
                ..Default::default()
            });

            group.bench_with_input(BenchmarkId::new(backend.name(), len), &len, |b, &len| {
                b.iter(|| black_box(copier.copy(&src, 0, &mut dst, 0, len).unwrap()));
            });
        }

        group.bench_with_input(BenchmarkId::new("sequential", len), &len, |b, &len| {
            b.iter(|| dst[..len].copy_from_slice(black_box(&src[..len])));
        });
    }

    group.finish();
}

fn bench_write_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_sync");
    group.sample_size(20);

    let len = 4_000_000;
    let src = create_source(len);
    let mut dst = vec![0 as Element; len];
    group.throughput(Throughput::Bytes((len * std::mem::size_of::<Element>()) as u64));

    for write_sync in [WriteSync::Disjoint, WriteSync::Serialized] {
        for snapshot in [true, false] {
            let copier = ParallelCopier::new(CopierConfig {
                write_sync,
                snapshot,
                ..Default::default()
            });
            let id = format!("{:?}/snapshot={}", write_sync, snapshot);

            group.bench_function(id, |b| {
                b.iter(|| black_box(copier.copy(&src, 0, &mut dst, 0, len).unwrap()));
            });
        }
    }

    group.finish();
}

fn bench_digest(c: &mut Criterion) {
    let len = 1_000_000;
    let data = create_source(len);

    let mut group = c.benchmark_group("digest");
    group.throughput(Throughput::Bytes((len * std::mem::size_of::<Element>()) as u64));
    group.bench_function("xxh3_1M_elements", |b| {
        b.iter(|| black_box(hypercopy::hash::digest_elements(&data)));
    });
    group.finish();
}

criterion_group!(benches, bench_copy_backends, bench_write_sync, bench_digest);

criterion_main!(benches);
