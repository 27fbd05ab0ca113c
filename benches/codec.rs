//! Run with:
//! ```bash
//! cargo bench --bench codec
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use libsql_vector::vector::{cosine_distance, decode_blob, encode_blob, parse_text, ElementType, OwnedVector, Vector};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// OpenAI text-embedding-3-small output dimension — a realistic column width.
const DIM: usize = 1536;
const SEED: u64 = 0xDEAD_BEEF_CAFE_BABE;

fn random_vector(dim: usize, seed: u64) -> Vector<'static> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f32> = (0..dim).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect();
    Vector::Owned(OwnedVector::F32(data))
}

fn random_text(dim: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::with_capacity(dim * 8 + 2);
    out.push('[');
    for i in 0..dim {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!("{}", rng.gen::<f32>() * 2.0 - 1.0));
    }
    out.push(']');
    out
}

fn bench_blob_decode(c: &mut Criterion) {
    let v = random_vector(DIM, SEED);
    let blob = encode_blob(&v);

    let mut group = c.benchmark_group("blob_decode");
    group.throughput(Throughput::Elements(DIM as u64));
    group.bench_function(BenchmarkId::new("f32", DIM), |b| {
        b.iter(|| black_box(decode_blob(black_box(&blob), ElementType::F32)).unwrap())
    });
    group.finish();
}

fn bench_blob_encode(c: &mut Criterion) {
    let v = random_vector(DIM, SEED);

    let mut group = c.benchmark_group("blob_encode");
    group.throughput(Throughput::Elements(DIM as u64));
    group.bench_function(BenchmarkId::new("f32", DIM), |b| {
        b.iter(|| black_box(encode_blob(black_box(&v))))
    });
    group.finish();
}

fn bench_text_parse(c: &mut Criterion) {
    let text = random_text(DIM, SEED);

    let mut group = c.benchmark_group("text_parse");
    group.throughput(Throughput::Elements(DIM as u64));
    group.bench_function(BenchmarkId::new("f32", DIM), |b| {
        b.iter(|| black_box(parse_text(black_box(&text), ElementType::F32)).unwrap())
    });
    group.finish();
}

fn bench_cosine_distance(c: &mut Criterion) {
    let a = random_vector(DIM, SEED);
    let b = random_vector(DIM, SEED + 1);

    let mut group = c.benchmark_group("cosine_distance");
    group.throughput(Throughput::Elements(DIM as u64));
    group.bench_function(BenchmarkId::new("f32", DIM), |bencher| {
        bencher.iter(|| black_box(cosine_distance(black_box(&a), black_box(&b))).unwrap())
    });
    group.finish();
}

/// Measures how distance scales with dimension — expected linear.
fn bench_cosine_distance_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("cosine_distance_scaling");
    for dim in [32usize, 128, 512, 1536, 4096] {
        let a = random_vector(dim, SEED);
        let b = random_vector(dim, SEED + 1);
        group.throughput(Throughput::Elements(dim as u64));
        group.bench_with_input(BenchmarkId::from_parameter(dim), &dim, |bencher, _dim| {
            bencher.iter(|| black_box(cosine_distance(black_box(&a), black_box(&b))).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_blob_decode,
    bench_blob_encode,
    bench_text_parse,
    bench_cosine_distance,
    bench_cosine_distance_scaling,
);
criterion_main!(benches);
