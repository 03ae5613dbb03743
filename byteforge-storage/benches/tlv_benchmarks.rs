//! Benchmarks for the TLV codec's hot path: encoding and decoding the
//! scalar values that make up every record, index item, and WAL entry.

use byteforge_core::{ColumnType, Value};
use byteforge_storage::tlv::{decode_value, encode_value, read_tlv};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_scalar_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("tlv_encode_scalar");

    group.bench_function("int64", |b| {
        let v = Value::Int64(123456789);
        b.iter(|| black_box(encode_value(ColumnType::Int64, &v)));
    });

    group.bench_function("bool", |b| {
        let v = Value::Bool(true);
        b.iter(|| black_box(encode_value(ColumnType::Bool, &v)));
    });

    for len in [8usize, 64, 256] {
        group.bench_with_input(BenchmarkId::new("string", len), &len, |b, &len| {
            let v = Value::String("x".repeat(len));
            b.iter(|| black_box(encode_value(ColumnType::String, &v)));
        });
    }

    group.finish();
}

fn bench_scalar_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("tlv_decode_scalar");
    let encoded = encode_value(ColumnType::String, &Value::String("software engineer".into()));

    group.bench_function("string", |b| {
        b.iter(|| {
            let (tlv, _) = read_tlv(&encoded).unwrap();
            black_box(decode_value(ColumnType::String, tlv.tag, tlv.payload).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_scalar_encode, bench_scalar_decode);
criterion_main!(benches);
