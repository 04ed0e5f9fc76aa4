//! Benchmarks for media streaming.
//!
//! Measures Range header parsing and the cost of chunked range bodies at
//! different read buffer sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures::StreamExt;
use http_body_util::BodyExt;
use ks_core::range::parse_range_header;
use ks_core::{MimeTable, StorageRoot};
use ks_server::routes::streaming_helpers::{serve_media, MediaSource, STREAM_CHUNK_SIZE};
use std::io::{Cursor, SeekFrom};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

const FILE_SIZE: u64 = 8 * 1024 * 1024;

fn bench_range_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_parse");

    for header in ["bytes=0-99", "bytes=999-", "bytes=1048576-2097151", "bytes=9999999999-"] {
        group.bench_with_input(BenchmarkId::from_parameter(header), header, |b, header| {
            b.iter(|| black_box(parse_range_header(black_box(header), FILE_SIZE)))
        });
    }

    group.finish();
}

/// Seek + take + ReaderStream over an in-memory "file", varying the chunk size.
fn bench_range_chunking(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let data = vec![0u8; FILE_SIZE as usize];
    let range_len: u64 = 2 * 1024 * 1024;

    let mut group = c.benchmark_group("range_chunking");
    group.throughput(Throughput::Bytes(range_len));

    for chunk_size in [8 * 1024, STREAM_CHUNK_SIZE, 256 * 1024] {
        group.bench_function(format!("chunk_{}", chunk_size), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let mut reader = Cursor::new(data.as_slice());
                    reader.seek(SeekFrom::Start(1024 * 1024)).await.unwrap();
                    let stream = ReaderStream::with_capacity(reader.take(range_len), chunk_size);
                    let total = stream
                        .fold(0usize, |acc, chunk| async move { acc + chunk.unwrap().len() })
                        .await;
                    black_box(total)
                })
            });
        });
    }

    group.finish();
}

/// Full pipeline against a real file on disk.
fn bench_serve_media(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("first-dance.mp4"), vec![7u8; FILE_SIZE as usize]).unwrap();
    let storage = StorageRoot::new(dir.path()).unwrap();
    let mime = MimeTable::new();
    let source = MediaSource {
        storage: &storage,
        mime: &mime,
        verify_signatures: false,
    };

    let mut group = c.benchmark_group("serve_media");
    group.sample_size(20);

    for (name, range) in [
        ("full", None),
        ("first_mb", Some("bytes=0-1048575")),
        ("tail", Some("bytes=8388000-")),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                rt.block_on(async {
                    let resp = serve_media(source, &["first-dance.mp4"], range).await.unwrap();
                    let body = resp.into_body().collect().await.unwrap().to_bytes();
                    black_box(body.len())
                })
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_range_parsing,
    bench_range_chunking,
    bench_serve_media
);
criterion_main!(benches);
