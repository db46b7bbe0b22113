//! # Ingestion Pipeline Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | `ingest_chunk`, all unique | < 1µs per token |
//! | `ingest_chunk`, all duplicates | < 1µs per token |
//! | `WriteBatch::encode` | < 100ns per token |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;
use sz_ingest::{ConnectionId, IngestConfig, IngestionApi, IngestionService, Token, WriteBatch};

fn payload(start: u64, count: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity((count * 10) as usize);
    for value in start..start + count {
        out.extend_from_slice(format!("{:09}\n", value).as_bytes());
    }
    out
}

fn bench_ingest_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest-chunk");
    group.measurement_time(Duration::from_secs(5));

    for count in [100u64, 1_000, 10_000] {
        let chunk = payload(100_000_000, count);
        group.throughput(Throughput::Elements(count));

        group.bench_with_input(BenchmarkId::new("unique", count), &chunk, |b, chunk| {
            b.iter_batched(
                || IngestionService::new(IngestConfig::default()).unwrap(),
                |service| {
                    let mut conn = service.open_connection(ConnectionId(1));
                    black_box(service.ingest_chunk(&mut conn, chunk))
                },
                criterion::BatchSize::SmallInput,
            )
        });

        let warmed = IngestionService::new(IngestConfig::default()).unwrap();
        let mut conn = warmed.open_connection(ConnectionId(1));
        warmed.ingest_chunk(&mut conn, &chunk);
        group.bench_with_input(BenchmarkId::new("duplicates", count), &chunk, |b, chunk| {
            b.iter(|| black_box(warmed.ingest_chunk(&mut conn, chunk)))
        });
    }

    group.finish();
}

fn bench_split_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest-split-reads");
    let data = payload(200_000_000, 1_000);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for read_size in [7usize, 64, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(read_size), &data, |b, data| {
            b.iter_batched(
                || IngestionService::new(IngestConfig::default()).unwrap(),
                |service| {
                    let mut conn = service.open_connection(ConnectionId(1));
                    for piece in data.chunks(read_size) {
                        black_box(service.ingest_chunk(&mut conn, piece));
                    }
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_batch_encode(c: &mut Criterion) {
    let batch: WriteBatch = (0..1_000u64)
        .filter_map(|v| Token::parse(format!("{:09}", v).as_bytes(), 9))
        .collect();

    let mut group = c.benchmark_group("write-batch");
    group.throughput(Throughput::Elements(batch.len() as u64));
    group.bench_function("encode_1000", |b| b.iter(|| black_box(batch.encode(b'\n'))));
    group.finish();
}

criterion_group!(benches, bench_ingest_chunk, bench_split_reads, bench_batch_encode);
criterion_main!(benches);
