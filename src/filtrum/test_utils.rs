use crate::class::{ClassBuilder, ClassId};
use crate::error::Result;
use crate::filter::Filter;
use crate::params::Params;
use crate::runtime::Runtime;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, PoisonError};

/// A runtime with a three-level hierarchy: `Base` <- `Child` <- `GrandChild`.
///
/// `Base` declares a filterable instance method `describe(label)` whose
/// terminal returns `"<label>:core"`, and a static `echo(...)` that returns
/// its positional arguments as an array. `Child` and `GrandChild` add nothing.
pub struct Fixture {
    pub runtime: Runtime,
    pub base: ClassId,
    pub child: ClassId,
    pub grand_child: ClassId,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_runtime(Runtime::new())
    }

    pub fn with_runtime(runtime: Runtime) -> Self {
        let base = runtime
            .declare(
                ClassBuilder::new("Base")
                    .method("describe", |ctx, args| {
                        let label = args.get(0).cloned().unwrap_or(Value::Null);
                        ctx.run_filter(
                            "describe",
                            Params::new().with("label", label),
                            |_, params, _| {
                                let label = params.str("label").unwrap_or("anonymous");
                                Ok(json!(format!("{}:core", label)))
                            },
                        )
                    })
                    .static_method("echo", |_, args| Ok(Value::Array(args.into_vec()))),
            )
            .expect("fixture: Base");
        let child = runtime
            .declare(ClassBuilder::new("Child").extends("Base"))
            .expect("fixture: Child");
        let grand_child = runtime
            .declare(ClassBuilder::new("GrandChild").extends("Child"))
            .expect("fixture: GrandChild");

        Self {
            runtime,
            base,
            child,
            grand_child,
        }
    }
}

/// Collects markers pushed by filters and terminals, in execution order.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A filter that records `<label>-pre`, delegates, then records `<label>-post`.
    pub fn marker(&self, label: &str) -> Filter {
        let recorder = self.clone();
        let label = label.to_string();
        Filter::new(move |ctx, params, chain| {
            recorder.record(format!("{}-pre", label));
            let result = chain.next(ctx, params)?;
            recorder.record(format!("{}-post", label));
            Ok(result)
        })
    }

    /// A filter that records `<label>` and returns `value` without delegating.
    pub fn blocker(&self, label: &str, value: Value) -> Filter {
        let recorder = self.clone();
        let label = label.to_string();
        Filter::new(move |_, _, _| -> Result<Value> {
            recorder.record(label.clone());
            Ok(value.clone())
        })
    }
}
