//! Signature benchmarks
//!
//! Run with: cargo bench
//!
//! Covers the forward pass, the backward pass and log-signatures over a few
//! (channels, depth, stream) sizes, plus interval queries on a [`Path`].

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sigr::prelude::*;

const BATCH: usize = 32;
const SIZES: [(usize, usize, usize); 4] = [(2, 4, 128), (3, 4, 128), (4, 3, 256), (6, 3, 64)];

fn random_path(batch: usize, stream: usize, channels: usize) -> Tensor<f64> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut data = Vec::with_capacity(batch * stream * channels);
    for _ in 0..batch {
        let mut point = vec![0.0; channels];
        for _ in 0..stream {
            data.extend_from_slice(&point);
            for p in point.iter_mut() {
                *p += rng.random_range(-0.1..0.1);
            }
        }
    }
    Tensor::from_slice(&data, &[batch, stream, channels])
}

fn label(channels: usize, depth: usize, stream: usize) -> String {
    format!("D{channels}_N{depth}_L{stream}")
}

fn bench_signature_forward(c: &mut Criterion) {
    let registry = BasisRegistry::new();
    let options = SignatureOptions::new();
    let mut group = c.benchmark_group("signature_forward");
    for (channels, depth, stream) in SIZES {
        let path = random_path(BATCH, stream, channels);
        group.throughput(Throughput::Elements((BATCH * stream) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(label(channels, depth, stream)),
            &path,
            |b, path| b.iter(|| signature(&registry, black_box(path), depth, &options)),
        );
    }
    group.finish();
}

fn bench_signature_stream(c: &mut Criterion) {
    let registry = BasisRegistry::new();
    let options = SignatureOptions::new().with_stream(true);
    let mut group = c.benchmark_group("signature_stream");
    for (channels, depth, stream) in SIZES {
        let path = random_path(BATCH, stream, channels);
        group.bench_with_input(
            BenchmarkId::from_parameter(label(channels, depth, stream)),
            &path,
            |b, path| b.iter(|| signature(&registry, black_box(path), depth, &options)),
        );
    }
    group.finish();
}

fn bench_signature_backward(c: &mut Criterion) {
    let registry = BasisRegistry::new();
    let options = SignatureOptions::new();
    let mut group = c.benchmark_group("signature_backward");
    for (channels, depth, stream) in SIZES {
        let path = random_path(BATCH, stream, channels);
        let Ok(out) = signature(&registry, &path, depth, &options) else {
            continue;
        };
        let grad = Tensor::from_vec(vec![1.0; out.numel()], out.shape()).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(label(channels, depth, stream)),
            &path,
            |b, path| {
                b.iter(|| {
                    signature_backward(&registry, black_box(&grad), path, &out, depth, &options)
                })
            },
        );
    }
    group.finish();
}

fn bench_logsignature(c: &mut Criterion) {
    let registry = BasisRegistry::new();
    let options = SignatureOptions::new();
    let mut group = c.benchmark_group("logsignature");
    for mode in [LogSignatureMode::Words, LogSignatureMode::Brackets] {
        for (channels, depth, stream) in SIZES {
            let path = random_path(BATCH, stream, channels);
            group.bench_with_input(
                BenchmarkId::new(format!("{mode:?}"), label(channels, depth, stream)),
                &path,
                |b, path| b.iter(|| logsignature(&registry, black_box(path), depth, &options, mode)),
            );
        }
    }
    group.finish();
}

fn bench_path_queries(c: &mut Criterion) {
    let registry = BasisRegistry::new();
    let raw = random_path(BATCH, 512, 3);
    let Ok(path) = Path::new(&registry, &raw, 4, Basepoint::Off) else {
        return;
    };
    c.bench_function("path_interval_query", |b| {
        b.iter(|| path.signature(black_box(100), black_box(400)))
    });
}

criterion_group!(
    benches,
    bench_signature_forward,
    bench_signature_stream,
    bench_signature_backward,
    bench_logsignature,
    bench_path_queries,
);
criterion_main!(benches);
