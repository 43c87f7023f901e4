//! KEEPSAKE - Performance Benchmarks
//! Measures throughput of the codec, region serialization and save cycle using Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use keepsake::config::Config;
use keepsake::engine::codec;
use keepsake::engine::region::Region;
use keepsake::engine::Keepsake;
use keepsake::types::Key;

fn sample_region(name: &str, records: usize) -> Region {
    let mut region = Region::new(name);
    for i in 0..records {
        region.add_item(
            Key::new(format!("key_{:06}", i)),
            vec![format!("value_{:06}", i), "shared".to_string()],
        );
    }
    region
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let ascii = "the quick brown fox jumps over the lazy dog\n".repeat(20);
    let wide = "日本語のテキスト 🦀 ".repeat(20);

    group.bench_function("encode_ascii", |b| {
        b.iter(|| black_box(codec::encode(black_box(&ascii))));
    });

    group.bench_function("encode_wide", |b| {
        b.iter(|| black_box(codec::encode(black_box(&wide))));
    });

    let encoded = codec::encode(&ascii);
    group.bench_function("decode_ascii", |b| {
        b.iter(|| black_box(codec::decode(black_box(&encoded)).unwrap()));
    });

    group.finish();
}

fn bench_region(c: &mut Criterion) {
    let mut group = c.benchmark_group("region");
    let region = sample_region("bench", 1000);
    let storable = region.to_storable_string();

    group.bench_function("to_storable_1000", |b| {
        b.iter(|| black_box(region.to_storable_string()));
    });

    group.bench_function("from_storable_1000", |b| {
        b.iter(|| black_box(Region::from_storable_string(black_box(&storable)).unwrap()));
    });

    group.finish();
}

fn bench_engine_e2e(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_e2e");

    for regions in [10, 50, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("stage_save_cycle", regions),
            regions,
            |b, &regions| {
                b.iter(|| {
                    let dir = tempfile::tempdir().unwrap();
                    let config = Config::new(dir.path(), "bench").with_sync_writes(false);
                    let mut engine = Keepsake::open(config).unwrap();

                    for i in 0..regions {
                        let name = format!("region_{}", i);
                        engine.add_region(&name);
                        engine.replace_region(sample_region(&name, 20));
                    }
                    engine.save().unwrap();
                    black_box(engine.list_regions());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_codec, bench_region, bench_engine_e2e);
criterion_main!(benches);
