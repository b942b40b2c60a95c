use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use subpub::{Channel, Subscription};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

fn bench_subscribe_cancel(c: &mut Criterion) {
    let rt = runtime();
    let channel: Channel<u64> = Channel::new("bench").with_runtime(rt.handle().clone());

    c.bench_function("subscribe_cancel_callback", |b| {
        b.iter(|| {
            let sub = channel.subscribe(|_m: u64| {}).unwrap();
            sub.cancel();
        })
    });

    c.bench_function("subscribe_drop_queue", |b| {
        b.iter(|| {
            // отмена через Drop
            let sub = channel.get_subscription().unwrap();
            black_box(sub.id());
        })
    });
}

fn bench_publish_queue_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_queue_fanout");
    for n in [1usize, 10, 100] {
        let channel: Channel<u64> = Channel::new("bench");
        let mut subs: Vec<_> = (0..n)
            .map(|_| channel.get_subscription().unwrap())
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                black_box(channel.publish(black_box(42)));
                // вычитываем, чтобы буферы не росли
                for sub in subs.iter_mut() {
                    black_box(sub.try_get().unwrap());
                }
            })
        });
    }
    group.finish();
}

fn bench_publish_callback_fanout(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("publish_callback_fanout");
    for n in [1usize, 10, 100] {
        let channel: Channel<u64> = Channel::new("bench").with_runtime(rt.handle().clone());
        let _subs: Vec<_> = (0..n)
            .map(|_| {
                channel
                    .subscribe(|m: u64| {
                        black_box(m);
                    })
                    .unwrap()
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(channel.publish(black_box(7))))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_subscribe_cancel,
    bench_publish_queue_fanout,
    bench_publish_callback_fanout
);
criterion_main!(benches);
