use berth::{Buf, FlatPq, HandleMap, HeapOrder, WavlMap};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const N: u64 = 10_000;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

fn bench_pq(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_pq");
    group.throughput(Throughput::Elements(N));

    group.bench_function("push_then_drain", |b| {
        b.iter(|| {
            let mut pq =
                FlatPq::with_capacity(N as usize, HeapOrder::Min, |a: &u64, b: &u64| a.cmp(b));
            for i in 0..N {
                pq.push(black_box(splitmix64(i))).unwrap();
            }
            while let Some(v) = pq.pop() {
                black_box(v);
            }
        });
    });

    group.bench_function("heapify_then_heapsort", |b| {
        b.iter(|| {
            let values: Vec<u64> = (0..N).map(splitmix64).collect();
            let pq = FlatPq::from_buf(Buf::from_vec(values), HeapOrder::Min, |a: &u64, b: &u64| {
                a.cmp(b)
            });
            black_box(pq.heapsort().as_slice().len());
        });
    });

    group.finish();
}

fn bench_handle_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_map");
    group.throughput(Throughput::Elements(N));

    group.bench_function("insert_grow", |b| {
        b.iter(|| {
            let mut map =
                HandleMap::with_capacity(0, |e: &(u64, u64)| &e.0, |k: &u64| splitmix64(*k));
            for i in 0..N {
                map.try_insert(black_box((i, i * 3))).unwrap();
            }
            black_box(map.len());
        });
    });

    for preload in [N] {
        group.bench_with_input(
            BenchmarkId::new("lookup_hit", preload),
            &preload,
            |b, &preload| {
                let mut map = HandleMap::with_capacity(
                    preload as usize,
                    |e: &(u64, u64)| &e.0,
                    |k: &u64| splitmix64(*k),
                );
                for i in 0..preload {
                    map.try_insert((i, i * 3)).unwrap();
                }
                b.iter(|| {
                    for i in 0..preload {
                        black_box(map.get(&black_box(i)));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_wavl(c: &mut Criterion) {
    let mut group = c.benchmark_group("wavl_map");
    group.throughput(Throughput::Elements(N));

    group.bench_function("insert_shuffled", |b| {
        let keys: Vec<u64> = (0..N).map(splitmix64).collect();
        b.iter(|| {
            let mut map = WavlMap::new(|e: &u64| e);
            for &k in &keys {
                map.try_insert(black_box(k)).unwrap();
            }
            black_box(map.len());
        });
    });

    group.bench_function("iterate_in_order", |b| {
        let mut map = WavlMap::new(|e: &u64| e);
        for i in 0..N {
            map.try_insert(splitmix64(i)).unwrap();
        }
        b.iter(|| {
            let mut sum = 0u64;
            for v in map.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pq, bench_handle_map, bench_wavl);
criterion_main!(benches);
