//! # Dynamic Invoker
//!
//! Calls a method by name with an ordered, arbitrary-length list of
//! positional arguments. [`Args`] is the single variadic-call shape every
//! method body receives: the callee sees exactly the arguments that were
//! passed, in the same order, whatever their number.
//!
//! Method lookup walks the owner's lineage (own class first, then ancestors
//! nearest first) and takes the first class that declares the name.

use crate::class::{ClassDef, MethodDef, MethodKind};
use crate::error::{CallFault, FiltrumError, Result};
use crate::object::{Context, Owner};
use crate::runtime::Runtime;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Positional arguments for a dynamic call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Deserializes the argument at `index`, failing if it is missing.
    pub fn decode<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let value = self.values.get(index).cloned().ok_or_else(|| {
            FiltrumError::failed(format!("Missing positional argument {}", index))
        })?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl From<&[Value]> for Args {
    fn from(values: &[Value]) -> Self {
        Self {
            values: values.to_vec(),
        }
    }
}

impl<const N: usize> From<[Value; N]> for Args {
    fn from(values: [Value; N]) -> Self {
        Self {
            values: values.into(),
        }
    }
}

impl From<()> for Args {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl FromIterator<Value> for Args {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Args {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Finds the method `name` for `owner`, checking that it may be called there.
pub(crate) fn resolve(
    runtime: &Runtime,
    owner: Owner<'_>,
    name: &str,
) -> Result<(Arc<ClassDef>, MethodDef)> {
    let class = owner.class();
    let own = runtime.class(class)?;
    let invalid = |fault| FiltrumError::InvalidCall {
        class: own.name.clone(),
        method: name.to_string(),
        fault,
    };

    let mut lineage = vec![Arc::clone(&own)];
    for ancestor in runtime.ancestors(class, false)?.iter() {
        lineage.push(runtime.class(*ancestor)?);
    }

    let found = lineage
        .into_iter()
        .find_map(|def| def.method(name).cloned().map(|method| (def, method)));

    match found {
        None => Err(invalid(CallFault::Undefined)),
        Some((_, method)) if method.kind == MethodKind::Instance && owner.is_static() => {
            Err(invalid(CallFault::InstanceOnly))
        }
        Some(found) => Ok(found),
    }
}

pub(crate) fn invoke(runtime: &Runtime, owner: Owner<'_>, name: &str, args: Args) -> Result<Value> {
    let (declaring, method) = resolve(runtime, owner, name)?;

    if !method.arity.accepts(args.len()) {
        let class = runtime.class_name(owner.class());
        if runtime.config().enforce_arity {
            return Err(FiltrumError::Arity {
                class,
                method: name.to_string(),
                expected: method.arity,
                given: args.len(),
            });
        }
        warn!(
            class = %class,
            method = name,
            expected = %method.arity,
            given = args.len(),
            "arity mismatch tolerated"
        );
    }

    debug!(
        class = %declaring.name,
        instance = ?owner.instance_id(),
        method = name,
        args = args.len(),
        "invoke"
    );
    let ctx = Context::new(runtime, owner);
    method.call(&ctx, args)
}
