use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rwstd::Vector;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn bench_push_back_100k(c: &mut Criterion) {
    c.bench_function("vector::push_back_100k", |b| {
        b.iter_batched(
            Vector::<u64>::new,
            |mut v| {
                for x in lcg(1).take(100_000) {
                    v.push_back(x);
                }
                black_box(v)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("vector::push_back_reserved_100k", |b| {
        b.iter_batched(
            || {
                let mut v = Vector::<u64>::new();
                v.reserve(100_000).unwrap();
                v
            },
            |mut v| {
                for x in lcg(1).take(100_000) {
                    v.push_back(x);
                }
                black_box(v)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_front_10k(c: &mut Criterion) {
    c.bench_function("vector::insert_front_10k", |b| {
        b.iter_batched(
            Vector::<u64>::new,
            |mut v| {
                for x in lcg(2).take(10_000) {
                    v.insert(v.begin(), x);
                }
                black_box(v)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_erase_random_1k(c: &mut Criterion) {
    c.bench_function("vector::erase_random_1k_of_100k", |b| {
        b.iter_batched(
            || {
                let v: Vector<u64> = lcg(3).take(100_000).collect();
                // Precompute positions that stay in range as the vector shrinks
                let mut s = 0x9e3779b97f4a7c15u64;
                let picks: Vec<usize> = (0..1_000)
                    .map(|i| {
                        s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                        (s as usize) % (100_000 - i)
                    })
                    .collect();
                (v, picks)
            },
            |(mut v, picks)| {
                for i in picks {
                    v.erase(v.begin() + i as isize);
                }
                black_box(v)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_clone_and_sort_100k(c: &mut Criterion) {
    let v: Vector<u64> = lcg(4).take(100_000).collect();
    c.bench_function("vector::clone_100k", |b| b.iter(|| black_box(v.clone())));
    c.bench_function("vector::clone_then_sort_100k", |b| {
        b.iter_batched(
            || v.clone(),
            |mut w| {
                w.sort_unstable();
                black_box(w)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_growth;
    config = bench_config();
    targets = bench_push_back_100k, bench_clone_and_sort_100k
}
criterion_group! {
    name = benches_edit;
    config = bench_config();
    targets = bench_insert_front_10k, bench_erase_random_1k
}
criterion_main!(benches_growth, benches_edit);
