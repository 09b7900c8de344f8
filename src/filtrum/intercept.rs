//! # Interception Entry Point
//!
//! What a filterable operation calls from inside its own body: resolve the
//! filters for `(owner, method)`, build a fresh [`Chain`] ending in the
//! operation's terminal, and run it.
//!
//! ## Resolution
//!
//! 1. An instance owner uses its own filters. If it has none, lookup
//!    continues with its class.
//! 2. A class uses the filters registered on itself. If it has none, the
//!    ancestors are searched nearest first and the first non-empty list wins.
//! 3. The search stops at the first class (starting with the owner's own)
//!    that declares `method` itself: that class overrides the operation, so
//!    filters further up wrap a different implementation.
//!
//! Step 2's fallback is switched off by `RuntimeConfig::inherit_filters`.
//!
//! Running an operation the owner cannot call is an
//! [`InvalidCall`](crate::error::FiltrumError::InvalidCall), checked before any
//! filter runs. Attaching filters to such a name is still allowed.

use crate::chain::Chain;
use crate::class::ClassId;
use crate::error::Result;
use crate::filter::Filter;
use crate::invoke;
use crate::object::{Context, Owner};
use crate::params::Params;
use crate::runtime::Runtime;
use serde_json::Value;
use tracing::{debug, trace};

pub(crate) fn resolve(runtime: &Runtime, owner: Owner<'_>, method: &str) -> Result<Vec<Filter>> {
    if let Owner::Instance(object) = owner {
        let local = object.filters(method);
        if !local.is_empty() {
            return Ok(local);
        }
    }
    resolve_class(runtime, owner.class(), method)
}

fn resolve_class(runtime: &Runtime, class: ClassId, method: &str) -> Result<Vec<Filter>> {
    let local = runtime.class_filters().get(class, method);
    if !local.is_empty() || !runtime.config().inherit_filters {
        return Ok(local);
    }
    if runtime.class(class)?.declares(method) {
        return Ok(local);
    }

    for ancestor in runtime.ancestors(class, false)?.iter() {
        let inherited = runtime.class_filters().get(*ancestor, method);
        if !inherited.is_empty() {
            trace!(class = %class, ancestor = %ancestor, method, "inherited filters");
            return Ok(inherited);
        }
        if runtime.class(*ancestor)?.declares(method) {
            break;
        }
    }
    Ok(Vec::new())
}

pub(crate) fn run<'t, T>(
    runtime: &Runtime,
    owner: Owner<'_>,
    method: &str,
    params: Params,
    extra: &[Filter],
    terminal: T,
) -> Result<Value>
where
    T: FnOnce(&Context<'_>, Params, &mut Chain<'_>) -> Result<Value> + 't,
{
    invoke::resolve(runtime, owner, method)?;

    let mut filters = resolve(runtime, owner, method)?;
    filters.extend(extra.iter().cloned());

    let class_name = runtime.class_name(owner.class());
    debug!(
        class = %class_name,
        instance = ?owner.instance_id(),
        method,
        filters = filters.len(),
        "run_filter"
    );

    let mut chain = Chain::new(class_name, method, filters, terminal);
    let ctx = Context::new(runtime, owner);
    chain.next(&ctx, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::config::RuntimeConfig;
    use crate::error::{CallFault, FiltrumError};
    use crate::object::Object;
    use serde_json::json;

    fn tagging(tag: &'static str) -> Filter {
        Filter::new(move |ctx, params, chain| {
            let result = chain.next(ctx, params)?;
            Ok(json!([tag, result]))
        })
    }

    fn lineage(runtime: &Runtime) -> (ClassId, ClassId, ClassId) {
        let base = runtime
            .declare(
                ClassBuilder::new("Base")
                    .static_method("find", |_, _| Ok(Value::Null))
                    .method("render", |_, _| Ok(Value::Null)),
            )
            .unwrap();
        let mid = runtime
            .declare(ClassBuilder::new("Mid").extends("Base"))
            .unwrap();
        let leaf = runtime
            .declare(ClassBuilder::new("Leaf").extends("Mid"))
            .unwrap();
        (base, mid, leaf)
    }

    fn run_static(runtime: &Runtime, class: ClassId, method: &str) -> Value {
        run(runtime, Owner::Class(class), method, Params::new(), &[], |_, _, _| {
            Ok(json!("core"))
        })
        .unwrap()
    }

    #[test]
    fn test_no_filters_returns_terminal_result() {
        let runtime = Runtime::new();
        let (_, _, leaf) = lineage(&runtime);
        assert_eq!(run_static(&runtime, leaf, "find"), json!("core"));
    }

    #[test]
    fn test_own_filters_win_over_ancestors() {
        let runtime = Runtime::new();
        let (base, _, leaf) = lineage(&runtime);
        runtime.attach(base, "find", tagging("base"));
        runtime.attach(leaf, "find", tagging("leaf"));
        assert_eq!(run_static(&runtime, leaf, "find"), json!(["leaf", "core"]));
    }

    #[test]
    fn test_falls_back_to_nearest_registered_ancestor() {
        let runtime = Runtime::new();
        let (base, mid, leaf) = lineage(&runtime);
        runtime.attach(base, "find", tagging("base"));
        assert_eq!(run_static(&runtime, leaf, "find"), json!(["base", "core"]));

        runtime.attach(mid, "find", tagging("mid"));
        assert_eq!(run_static(&runtime, leaf, "find"), json!(["mid", "core"]));
    }

    #[test]
    fn test_fallback_can_be_disabled() {
        let runtime = Runtime::with_config(RuntimeConfig {
            inherit_filters: false,
            ..RuntimeConfig::default()
        });
        let (base, _, leaf) = lineage(&runtime);
        runtime.attach(base, "find", tagging("base"));
        assert_eq!(run_static(&runtime, leaf, "find"), json!("core"));
        assert_eq!(run_static(&runtime, base, "find"), json!(["base", "core"]));
    }

    #[test]
    fn test_override_stops_the_fallback() {
        let runtime = Runtime::new();
        let base = runtime
            .declare(ClassBuilder::new("Model").static_method("save", |_, _| Ok(Value::Null)))
            .unwrap();
        let child = runtime
            .declare(
                ClassBuilder::new("Post")
                    .extends("Model")
                    .static_method("save", |_, _| Ok(Value::Null)),
            )
            .unwrap();
        let inheritor = runtime
            .declare(ClassBuilder::new("Draft").extends("Model"))
            .unwrap();
        runtime.attach(base, "save", tagging("model"));

        assert_eq!(run_static(&runtime, child, "save"), json!("core"));
        assert_eq!(
            run_static(&runtime, inheritor, "save"),
            json!(["model", "core"])
        );
    }

    #[test]
    fn test_instance_filters_shadow_class_filters() {
        let runtime = Runtime::new();
        let (base, _, leaf) = lineage(&runtime);
        runtime.attach(base, "find", tagging("class"));

        let plain = Object::new(leaf);
        let custom = Object::new(leaf);
        custom.attach("find", tagging("instance"));

        let call = |object: &Object| {
            run(&runtime, object.as_owner(), "find", Params::new(), &[], |_, _, _| {
                Ok(json!("core"))
            })
            .unwrap()
        };
        assert_eq!(call(&plain), json!(["class", "core"]));
        assert_eq!(call(&custom), json!(["instance", "core"]));
    }

    #[test]
    fn test_extra_filters_run_inside_registered_ones() {
        let runtime = Runtime::new();
        let (base, ..) = lineage(&runtime);
        runtime.attach(base, "find", tagging("registered"));

        let out = run(
            &runtime,
            Owner::Class(base),
            "find",
            Params::new(),
            &[tagging("extra")],
            |_, _, _| Ok(json!("core")),
        )
        .unwrap();
        assert_eq!(out, json!(["registered", ["extra", "core"]]));
    }

    #[test]
    fn test_undefined_operation_is_invalid_call() {
        let runtime = Runtime::new();
        let (base, _, leaf) = lineage(&runtime);
        runtime.attach(base, "vanish", tagging("base"));

        let mut ran = false;
        let err = run(&runtime, Owner::Class(leaf), "vanish", Params::new(), &[], |_, _, _| {
            ran = true;
            Ok(json!("core"))
        })
        .unwrap_err();

        assert!(!ran);
        assert!(matches!(
            err,
            FiltrumError::InvalidCall { ref class, ref method, fault: CallFault::Undefined }
                if class == "Leaf" && method == "vanish"
        ));
    }

    #[test]
    fn test_instance_operation_on_class_owner_is_invalid_call() {
        let runtime = Runtime::new();
        let (_, mid, _) = lineage(&runtime);

        let err = run(&runtime, Owner::Class(mid), "render", Params::new(), &[], |_, _, _| {
            Ok(json!("core"))
        })
        .unwrap_err();
        assert!(matches!(
            err,
            FiltrumError::InvalidCall {
                fault: CallFault::InstanceOnly,
                ..
            }
        ));

        let object = Object::new(mid);
        let out = run(&runtime, object.as_owner(), "render", Params::new(), &[], |_, _, _| {
            Ok(json!("core"))
        })
        .unwrap();
        assert_eq!(out, json!("core"));
    }

    #[test]
    fn test_chain_knows_its_operation() {
        let runtime = Runtime::new();
        let (base, ..) = lineage(&runtime);
        let out = run(
            &runtime,
            Owner::Class(base),
            "find",
            Params::new(),
            &[],
            |_, _, chain| Ok(json!(chain.qualified_method())),
        )
        .unwrap();
        assert_eq!(out, json!("Base::find"));
    }
}
