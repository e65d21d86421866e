use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hypomap::color::{DepthColorMapper, Palette};
use hypomap::constant::{DEFAULT_EXTENT, EXTENT_MARGIN_DEG, LOOKUP_TABLE_SIZE};
use hypomap::geo::{Extent, Point};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn bench_mapper(c: &mut Criterion) {
    let mapper = DepthColorMapper::new(17.0..23.0, 20.0, Palette::CoolWarm.ramp()).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let depths: Vec<f64> = (0..10_000).map(|_| rng.gen_range(10.0..30.0)).collect();

    c.bench_function("map 10k depths", |b| {
        b.iter(|| {
            depths
                .iter()
                .map(|d| mapper.color(black_box(*d)))
                .fold(0.0, |acc, rgb| acc + rgb[0])
        })
    });

    c.bench_function("bake lookup table", |b| {
        b.iter(|| mapper.lookup_table(black_box(LOOKUP_TABLE_SIZE)))
    });
}

fn bench_extent(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let sets: Vec<Vec<Point>> = (0..4)
        .map(|_| {
            (0..5_000)
                .map(|_| Point::new(rng.gen_range(38.0..40.5), rng.gen_range(141.5..144.0)))
                .collect()
        })
        .collect();

    c.bench_function("aggregate extent of 20k points", |b| {
        b.iter(|| {
            let points = black_box(&sets).iter().map(|set| set.iter().copied());
            Extent::aggregate(points, EXTENT_MARGIN_DEG, DEFAULT_EXTENT)
        })
    });
}

criterion_group!(benches, bench_mapper, bench_extent);
criterion_main!(benches);
