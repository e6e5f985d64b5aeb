//! Tests for AutoRunner graphs built with apply_auto

use std::collections::HashMap;
use std::time::Duration;

use cbx::{apply_auto, apply_ie, fuse, AutoRunner, Callback, Entry, Error};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::common::{fetch_user, tokio_timer, FetchError, Recorder, Stub};

type Outcome<V, E> = Result<HashMap<String, V>, E>;

fn flaky_double(args: Vec<Option<Option<u32>>>, callback: Callback<u32, String>) {
    match args.first() {
        Some(Some(Some(n))) if *n < 10 => callback(Ok(n * 2)),
        _ => callback(Err("input out of range".to_string())),
    }
}

#[test]
fn test_optional_tasks_do_not_abort_the_run() {
    let seed = |n: u32| {
        apply_auto(vec![Entry::Task(
            move |_: Vec<Option<Option<u32>>>, cb: Callback<Option<u32>, String>| cb(Ok(Some(n))),
        )])
        .unwrap()
    };

    let mut runner = AutoRunner::new();
    runner
        .add_task("small", seed(4))
        .unwrap()
        .add_task("large", seed(40))
        .unwrap()
        .add_task(
            "double_small",
            apply_auto(vec!["small".into(), Entry::Task(apply_ie(flaky_double, []).into_fn())])
                .unwrap(),
        )
        .unwrap()
        .add_task(
            "double_large",
            apply_auto(vec!["large".into(), Entry::Task(apply_ie(flaky_double, []).into_fn())])
                .unwrap(),
        )
        .unwrap();

    let outcomes: Recorder<Outcome<Option<u32>, String>> = Recorder::new();
    runner.run(outcomes.callback()).unwrap();

    let results = outcomes.single().unwrap();
    assert_eq!(results["double_small"], Some(8));
    assert_eq!(results["double_large"], None);
}

#[test]
fn test_lookup_pipeline_with_plucked_values() {
    let user_task = |id_dep: &str| {
        apply_auto(vec![
            id_dep.into(),
            Entry::Task(|deps: Vec<Option<Value>>, cb: Callback<Value, FetchError>| {
                let id = deps[0].as_ref().and_then(Value::as_u64).unwrap_or_default() as u32;
                fetch_user(vec![id], cb)
            }),
        ])
        .unwrap()
    };

    let mut runner = AutoRunner::new();
    runner
        .add_task(
            "session",
            apply_auto(vec![Entry::Task(
                |_: Vec<Option<Value>>, cb: Callback<Value, FetchError>| {
                    cb(Ok(json!({ "userId": 1 })))
                },
            )])
            .unwrap(),
        )
        .unwrap()
        .add_task(
            "user_id",
            apply_auto(vec![
                "session".into(),
                Entry::Task(|deps: Vec<Option<Value>>, cb: Callback<Value, FetchError>| {
                    let session = deps.into_iter().next().flatten().unwrap_or_default();
                    cbx::pluck("userId", cb)(Ok::<_, FetchError>(session))
                }),
            ])
            .unwrap(),
        )
        .unwrap()
        .add_task("user", user_task("user_id"))
        .unwrap()
        .add_task(
            "greeting",
            apply_auto(vec![
                "user".into(),
                "session".into(),
                Entry::Task(|deps: Vec<Option<Value>>, cb: Callback<Value, FetchError>| {
                    let user = deps[0].clone().unwrap_or_default();
                    cbx::pluck("profile.name", move |name: Result<Value, FetchError>| {
                        cb(name.map(|name| {
                            json!(format!("hello, {}", name.as_str().unwrap_or("stranger")))
                        }))
                    })(Ok::<_, FetchError>(user))
                }),
            ])
            .unwrap(),
        )
        .unwrap();

    assert_eq!(
        runner.layers().unwrap(),
        vec![
            vec!["session".to_string()],
            vec!["user_id".to_string()],
            vec!["user".to_string()],
            vec!["greeting".to_string()],
        ]
    );

    let outcomes: Recorder<Outcome<Value, FetchError>> = Recorder::new();
    runner.run(outcomes.callback()).unwrap();

    let results = outcomes.single().unwrap();
    assert_eq!(results["user_id"], json!(1));
    assert_eq!(results["greeting"], json!("hello, Ada"));
}

#[test]
fn test_service_error_aborts_the_run() {
    let mut runner = AutoRunner::new();
    runner
        .add_task(
            "user",
            apply_auto(vec![Entry::Task(
                |_: Vec<Option<Value>>, cb: Callback<Value, FetchError>| fetch_user(vec![99], cb),
            )])
            .unwrap(),
        )
        .unwrap();

    let outcomes: Recorder<Outcome<Value, FetchError>> = Recorder::new();
    runner.run(outcomes.callback()).unwrap();

    assert_eq!(outcomes.single(), Err(FetchError::NotFound(99)));
}

#[test]
fn test_invalid_definitions_are_reported() {
    let stub: Stub<Option<u8>, u8, String> = Stub::yields(Ok(1));

    let no_task: Vec<Entry<fn(Vec<Option<u8>>, Callback<u8, String>)>> =
        vec!["a".into(), Entry::dependency("b")];
    let err = apply_auto(no_task).map(|_| ()).unwrap_err();
    assert!(matches!(err, Error::InvalidAutoDefinition { .. }));
    assert_eq!(
        err.to_string(),
        "invalid auto definition: last entry must be a task, found dependency `b`"
    );

    let err = apply_auto(vec![Entry::Task(stub.as_fn()), Entry::Task(stub.as_fn())])
        .map(|_| ())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid auto definition: entry 0 is a task; only the last entry may be"
    );
    assert_eq!(stub.call_count(), 0);
}

#[test]
fn test_stub_task_receives_resolved_dependencies() {
    let stub: Stub<Option<u8>, u8, String> = Stub::yields(Ok(0));

    let mut runner = AutoRunner::new();
    runner
        .add_task(
            "a",
            apply_auto(vec![Entry::Task(Stub::yields(Ok(3)).as_fn())]).unwrap(),
        )
        .unwrap()
        .add_task(
            "b",
            apply_auto(vec!["a".into(), "a".into(), Entry::Task(stub.as_fn())]).unwrap(),
        )
        .unwrap();

    runner.run(|_| {}).unwrap();

    assert_eq!(stub.invocations(), vec![vec![Some(3), Some(3)]]);
}

#[tokio::test(start_paused = true)]
async fn test_runtime_tasks_with_deadlines() {
    let timer = tokio_timer();

    let delayed = |value: u32, delay_ms: u64, deadline_ms: u64| {
        let timer = timer.clone();
        apply_auto(vec![Entry::Task(
            move |_: Vec<Option<u32>>, cb: Callback<u32, FetchError>| {
                let fused = fuse(Duration::from_millis(deadline_ms), &timer, cb);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    fused.call(Ok(value));
                });
            },
        )])
        .unwrap()
    };

    // All tasks meet their deadlines
    let mut runner = AutoRunner::new();
    runner
        .add_task("a", delayed(1, 10, 100))
        .unwrap()
        .add_task("b", delayed(2, 30, 100))
        .unwrap();

    let (tx, rx) = oneshot::channel();
    runner
        .run(move |outcome| {
            let _ = tx.send(outcome);
        })
        .unwrap();
    let results = rx.await.unwrap().unwrap();
    assert_eq!(results, HashMap::from([("a".to_string(), 1), ("b".to_string(), 2)]));

    // One task overruns its deadline
    let mut runner = AutoRunner::new();
    runner
        .add_task("quick", delayed(1, 10, 100))
        .unwrap()
        .add_task("stuck", delayed(2, 1_000, 50))
        .unwrap();

    let (tx, rx) = oneshot::channel();
    runner
        .run(move |outcome| {
            let _ = tx.send(outcome);
        })
        .unwrap();
    assert_eq!(rx.await.unwrap(), Err(FetchError::Timeout));
}
