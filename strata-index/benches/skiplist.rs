use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use strata_index::SkipList;

const N: usize = 100_000;

fn duplicate_values(seed: u64) -> Vec<u8> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..N).map(|_| (rng.next_u32() % 10) as u8).collect()
}

fn bench_insert(c: &mut Criterion) {
    let values = duplicate_values(7);

    let mut group = c.benchmark_group("skiplist_insert");
    group.throughput(Throughput::Elements(N as u64));
    group.bench_function("arrival_order", |b| {
        b.iter_batched(
            || {
                SkipList::new(N, 0.125, SmallRng::seed_from_u64(11), |a: u32, b: u32| {
                    values[a as usize].cmp(&values[b as usize])
                })
            },
            |mut list| {
                for idx in 0..N as u32 {
                    list.insert(idx);
                }
                black_box(list.len())
            },
            criterion::BatchSize::LargeInput,
        )
    });
    group.finish();
}

fn bench_iterate(c: &mut Criterion) {
    let values = duplicate_values(7);
    let mut list = SkipList::new(N, 0.125, SmallRng::seed_from_u64(11), |a: u32, b: u32| {
        values[a as usize].cmp(&values[b as usize])
    });
    for idx in 0..N as u32 {
        list.insert(idx);
    }

    let mut group = c.benchmark_group("skiplist_iterate");
    group.throughput(Throughput::Elements(N as u64));
    group.bench_function("full_scan", |b| {
        b.iter(|| {
            let mut count = 0usize;
            for idx in list.iter() {
                black_box(idx);
                count += 1;
            }
            count
        })
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_iterate);
criterion_main!(benches);
