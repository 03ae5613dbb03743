//! Benchmarks for the write-ahead log's append/commit path, the one
//! synchronous filesystem round-trip every durable mutation pays.

use byteforge_storage::wal::{Wal, OP_INSERT};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;

fn bench_append_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("wal_append_commit");

    for size in [16usize, 256, 4096] {
        let record = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &record, |b, record| {
            let dir = TempDir::new().unwrap();
            let mut wal = Wal::open(dir.path(), "bench").unwrap();
            b.iter(|| {
                let handle = wal.append(OP_INSERT, "bench", black_box(record)).unwrap();
                wal.commit(&handle).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_append_commit);
criterion_main!(benches);
