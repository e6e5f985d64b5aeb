//! Per-call overhead of the synchronous helpers

use std::hint::black_box;

use cbx::{apply_ie, intercept, pluck, Callback};
use criterion::Criterion;
use serde_json::{json, Value};

fn add(args: Vec<u64>, callback: Callback<u64, String>) {
    callback(Ok(args.iter().sum()))
}

fn reject(_: Vec<u64>, callback: Callback<u64, String>) {
    callback(Err("rejected".to_string()))
}

pub fn bench_apply_ie(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_ie");

    let applied = apply_ie(add, [1, 2, 3]);
    group.bench_function("success", |b| {
        b.iter(|| applied.call([black_box(4)], |outcome: Result<Option<u64>, ()>| {
            let _ = black_box(outcome);
        }))
    });

    let rejecting = apply_ie(reject, [1, 2, 3]);
    group.bench_function("ignored_error", |b| {
        b.iter(|| rejecting.call([black_box(4)], |outcome: Result<Option<u64>, ()>| {
            let _ = black_box(outcome);
        }))
    });

    group.bench_function("intercepted", |b| {
        b.iter(|| {
            add(
                vec![black_box(1), 2],
                Box::new(intercept(
                    |err: String| {
                        black_box(err);
                    },
                    |sum: u64| {
                        black_box(sum);
                    },
                )),
            )
        })
    });

    group.finish();
}

pub fn bench_pluck(c: &mut Criterion) {
    let mut group = c.benchmark_group("pluck");
    let record = json!({
        "user": { "profile": { "emails": ["a@example.com", "b@example.com"] } },
    });

    for path in ["user", "user.profile.emails[1]", "user.missing.deeper"] {
        group.bench_function(path, |b| {
            b.iter(|| {
                pluck(path, |outcome: Result<Value, ()>| {
                    let _ = black_box(outcome);
                })(Ok(record.clone()))
            })
        });
    }

    group.finish();
}
