//! Filters and the method-name selectors used to attach them.

use crate::chain::Chain;
use crate::error::Result;
use crate::object::Context;
use crate::params::Params;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type FilterFn = dyn Fn(&Context<'_>, Params, &mut Chain<'_>) -> Result<Value> + Send + Sync;

/// A wrapper around one operation.
///
/// A filter receives the calling context, the parameter bag and the chain it
/// is running in. Calling [`Chain::next`] hands control to the next link;
/// not calling it short-circuits everything inside.
///
/// Cloning is cheap and keeps identity: two clones of the same filter are
/// [`ptr_eq`](Filter::ptr_eq).
#[derive(Clone)]
pub struct Filter {
    inner: Arc<FilterFn>,
}

impl Filter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context<'_>, Params, &mut Chain<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn call(&self, ctx: &Context<'_>, params: Params, chain: &mut Chain<'_>) -> Result<Value> {
        (self.inner)(ctx, params, chain)
    }

    /// True when both handles point at the same attached callable.
    pub fn ptr_eq(&self, other: &Filter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({:p})", Arc::as_ptr(&self.inner) as *const ())
    }
}

/// One or more operation names a filter is attached to.
///
/// Implemented for a single name (`&str`, `String`) and for ordered
/// collections of names (slices, arrays, vectors).
pub trait MethodNames {
    fn method_names(self) -> Vec<String>;
}

impl MethodNames for &str {
    fn method_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl MethodNames for String {
    fn method_names(self) -> Vec<String> {
        vec![self]
    }
}

impl MethodNames for &String {
    fn method_names(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl MethodNames for &[&str] {
    fn method_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> MethodNames for [&str; N] {
    fn method_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl MethodNames for Vec<&str> {
    fn method_names(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl MethodNames for Vec<String> {
    fn method_names(self) -> Vec<String> {
        self
    }
}

impl MethodNames for &[String] {
    fn method_names(self) -> Vec<String> {
        self.to_vec()
    }
}
