use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use isle_core::ocean::fft::{fft_2d, ifft_2d};
use isle_core::{
    OceanConfig, OceanKind, OceanModel, SpectralOcean, TerrainGenerator, Tree, TreeParameters,
    render_preview,
};
use num_complex::Complex32;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::hint::black_box;

const SIZE: usize = 257;
const SEED: u64 = 2025;

fn bench_terrain(c: &mut Criterion) {
    c.bench_function("terrain 257x257 heightmap + mesh", |b| {
        b.iter(|| TerrainGenerator::new(black_box(SIZE), SIZE, 20.0).unwrap())
    });

    let terrain = TerrainGenerator::new(SIZE, SIZE, 20.0).unwrap();
    c.bench_function("terrain 257x257 preview image", |b| {
        b.iter(|| render_preview(black_box(terrain.height_map()), 0.2))
    });
}

fn bench_fft(c: &mut Criterion) {
    let n = 128;
    let mut rng = Pcg64Mcg::seed_from_u64(SEED);
    let grid: Vec<Complex32> = (0..n * n)
        .map(|_| Complex32::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)))
        .collect();

    c.bench_function("fft_2d + ifft_2d 128x128", |b| {
        b.iter_batched(
            || grid.clone(),
            |mut data| {
                fft_2d(&mut data, n);
                ifft_2d(&mut data, n);
                data
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_spectral_step(c: &mut Criterion) {
    let config = OceanConfig {
        model: OceanKind::Spectral,
        ..Default::default()
    };
    let mut ocean = SpectralOcean::new(&config, &mut Pcg64Mcg::seed_from_u64(SEED)).unwrap();
    c.bench_function("spectral ocean step 128x128", |b| {
        b.iter(|| ocean.update(black_box(1.0 / 60.0)))
    });
}

fn bench_tree(c: &mut Criterion) {
    c.bench_function("tree generation, 3 levels", |b| {
        b.iter_batched(
            || Tree::with_seed(TreeParameters::default(), SEED).unwrap(),
            |mut tree| {
                tree.ensure_generated();
                tree
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    scene_benchmarks,
    bench_terrain,
    bench_fft,
    bench_spectral_step,
    bench_tree
);
criterion_main!(scene_benchmarks);
