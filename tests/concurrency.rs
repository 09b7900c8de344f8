use filtrum::test_utils::Fixture;
use filtrum::{ClassBuilder, ClassId, Params, Runtime};
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 50;

#[test]
fn test_concurrent_attachments_are_not_lost() {
    let runtime = Runtime::new();
    let class = runtime.declare(ClassBuilder::new("Hot")).unwrap();

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                for _ in 0..PER_THREAD {
                    runtime.apply_filter(class, ["a", "b"], |ctx, params, chain| {
                        chain.next(ctx, params)
                    });
                }
            });
        }
    });

    assert_eq!(runtime.filters(class, "a").len(), THREADS * PER_THREAD);
    assert_eq!(runtime.filters(class, "b").len(), THREADS * PER_THREAD);
}

#[test]
fn test_concurrent_calls_use_independent_chains() {
    let fixture = Fixture::new();
    fixture
        .runtime
        .apply_filter(fixture.base, "describe", |ctx, mut params, chain| {
            let label = params.str("label").unwrap_or_default().to_uppercase();
            params.insert("label", label);
            chain.next(ctx, params)
        });

    thread::scope(|scope| {
        for t in 0..THREADS {
            let runtime = &fixture.runtime;
            scope.spawn(move || {
                let object = runtime.instantiate("GrandChild").unwrap();
                for i in 0..PER_THREAD {
                    let label = format!("t{}i{}", t, i);
                    let out = runtime
                        .invoke_method(&object, "describe", [json!(label.clone())])
                        .unwrap();
                    assert_eq!(out, json!(format!("{}:core", label.to_uppercase())));
                }
            });
        }
    });
}

#[test]
fn test_concurrent_first_ancestor_lookups_agree() {
    let fixture = Fixture::new();
    let shared = &fixture;
    let results: Vec<Arc<[ClassId]>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(move || {
                    shared
                        .runtime
                        .ancestors(shared.grand_child, false)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for lineage in &results {
        assert!(Arc::ptr_eq(lineage, &results[0]));
    }
}

#[test]
fn test_global_runtime_shared_across_threads() {
    let name = "concurrency::GlobalWorker";
    let class = Runtime::global()
        .declare(ClassBuilder::new(name).static_method("work", |_, _| Ok(Value::Null)))
        .unwrap();
    Runtime::global().apply_filter(class, "work", |_, _, _| Ok(json!("filtered")));

    let outputs: Vec<Value> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(move || {
                    Runtime::global()
                        .run_filter(class, "work", Params::new(), |_, _, _| Ok(Value::Null))
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(outputs.iter().all(|v| v == &json!("filtered")));
}
