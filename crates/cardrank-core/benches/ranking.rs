use bigdecimal::BigDecimal;
use cardrank_core::{MemoryRankStore, Rank, RankSpace, RankedCollection};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIZES: &[u32] = &[100, 1_000, 10_000];

/// Evenly spread items, the shape a collection has right after a
/// redistribution.
fn spread(n: u32) -> MemoryRankStore<u32> {
    MemoryRankStore::seeded((0..n).map(|i| (i, Rank::from(i64::from(i) * 1_000))))
}

/// Items packed `1e-8` apart, so any split between them forces a
/// redistribution.
fn packed(n: u32) -> MemoryRankStore<u32> {
    MemoryRankStore::seeded(
        (0..n).map(|i| (i, Rank::new(BigDecimal::new(i64::from(i).into(), 8)))),
    )
}

fn bench_midpoint_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking.insert_before");

    for &n in SIZES {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || spread(n),
                |store| {
                    let mut coll = RankedCollection::new(RankSpace::default(), store).unwrap();
                    black_box(coll.item(n).insert_before(&(n / 2)))
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_redistribution(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking.redistribute");

    for &n in SIZES {
        group.throughput(Throughput::Elements(u64::from(n)));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || packed(n),
                |store| {
                    let mut coll = RankedCollection::new(RankSpace::default(), store).unwrap();
                    let change = coll.item(n).insert_before(&(n - 1));
                    black_box((change, coll.redistributions()))
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_repeated_splits(c: &mut Criterion) {
    c.bench_function("ranking.repeated_splits.64", |b| {
        b.iter_batched(
            || spread(2),
            |store| {
                let mut coll = RankedCollection::new(RankSpace::default(), store).unwrap();
                for card in 10..74 {
                    let _ = black_box(coll.item(card).insert_before(&1));
                }
                coll.redistributions()
            },
            BatchSize::SmallInput,
        );
    });
}

/// Random before/after moves on a 200-card board, the shape of a busy
/// board being reprioritised.
fn bench_random_moves(c: &mut Criterion) {
    const CARDS: u32 = 200;
    const MOVES: u64 = 1_000;

    let mut group = c.benchmark_group("ranking.random_moves");
    group.throughput(Throughput::Elements(MOVES));
    group.bench_function("200x1000", |b| {
        b.iter_batched(
            || (spread(CARDS), StdRng::seed_from_u64(7)),
            |(store, mut rng)| {
                let mut coll = RankedCollection::new(RankSpace::default(), store).unwrap();
                for _ in 0..MOVES {
                    let card = rng.gen_range(0..CARDS);
                    let target = rng.gen_range(0..CARDS);
                    let mut item = coll.item(card);
                    let change = if rng.gen_bool(0.5) {
                        item.insert_before(&target)
                    } else {
                        item.insert_after(&target)
                    };
                    let _ = black_box(change);
                }
                coll.redistributions()
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_midpoint_insertion,
    bench_redistribution,
    bench_repeated_splits,
    bench_random_moves
);
criterion_main!(benches);
