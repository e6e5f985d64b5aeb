//! Fuse arming, completion and trip cost on Tokio

use std::hint::black_box;
use std::time::Duration;

use cbx::{fuse, Error, SpawnTimer};
use criterion::Criterion;
use futures::future::BoxFuture;

pub fn bench_fuse(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let timer = SpawnTimer::new(
        |fut: BoxFuture<'static, ()>| {
            tokio::spawn(fut);
        },
        tokio::time::sleep,
    );

    // Arming spawns onto the runtime, so the handle must be entered.
    let guard = rt.enter();
    c.bench_function("fuse_complete_before_deadline", |b| {
        b.iter(|| {
            let fused = fuse(
                Duration::from_secs(60),
                &timer,
                |outcome: Result<u32, Error>| {
                    let _ = black_box(outcome);
                },
            );
            fused.call(Ok(black_box(7)));
        })
    });
    drop(guard);

    c.bench_function("fuse_trip_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
                for _ in 0..100 {
                    let tx = tx.clone();
                    let _fused = fuse(Duration::ZERO, &timer, move |outcome: Result<u32, Error>| {
                        let _ = tx.send(outcome);
                    });
                }
                drop(tx);
                while rx.recv().await.is_some() {}
            })
        })
    });
}
