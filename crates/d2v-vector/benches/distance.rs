//! Benchmarks for distance kernels and normalization.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use d2v_vector::{distance, euclidean_distance, Normalized};

fn generate_vectors(dims: usize) -> (Vec<f32>, Vec<f32>) {
    let a: Vec<f32> = (0..dims).map(|i| (i as f32) * 0.1).collect();
    let b: Vec<f32> = (0..dims).map(|i| (i as f32) * 0.2 + 0.5).collect();
    (a, b)
}

fn bench_euclidean(c: &mut Criterion) {
    let mut group = c.benchmark_group("euclidean_distance");

    // doc2vec models are typically trained with 100-300 dimensions.
    for dims in [100, 200, 300].iter() {
        let (a, b) = generate_vectors(*dims);
        group.bench_with_input(BenchmarkId::from_parameter(dims), dims, |bencher, _| {
            bencher.iter(|| euclidean_distance(black_box(&a), black_box(&b)))
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for dims in [100, 200, 300].iter() {
        let (a, _) = generate_vectors(*dims);
        group.bench_with_input(BenchmarkId::from_parameter(dims), dims, |bencher, _| {
            bencher.iter(|| Normalized::new(black_box(&a)).unwrap())
        });
    }

    group.finish();
}

fn bench_normalized_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalized_distance");

    for dims in [100, 200, 300].iter() {
        let (a, b) = generate_vectors(*dims);
        let a = Normalized::new(&a).unwrap();
        let b = Normalized::new(&b).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(dims), dims, |bencher, _| {
            bencher.iter(|| distance(black_box(&a), black_box(&b)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_euclidean, bench_normalize, bench_normalized_distance);
criterion_main!(benches);
