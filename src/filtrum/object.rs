//! Filterable owners: instances, classes, and the context handed to filters.

use crate::chain::Chain;
use crate::class::ClassId;
use crate::error::Result;
use crate::filter::{Filter, MethodNames};
use crate::invoke::Args;
use crate::params::Params;
use crate::registry::FilterTable;
use crate::runtime::Runtime;
use serde_json::Value;
use uuid::Uuid;

/// An instance of a declared class, carrying its own filter storage.
///
/// Filters attached here only intercept calls made with this instance as the
/// owner. Types that want to be filterable embed an `Object`.
#[derive(Debug)]
pub struct Object {
    id: Uuid,
    class: ClassId,
    filters: FilterTable,
}

impl Object {
    pub fn new(class: ClassId) -> Self {
        Self {
            id: Uuid::new_v4(),
            class,
            filters: FilterTable::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Attaches a filter to one or more of this instance's operations.
    pub fn apply_filter<N, F>(&self, names: N, filter: F) -> Filter
    where
        N: MethodNames,
        F: Fn(&Context<'_>, Params, &mut Chain<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        let filter = Filter::new(filter);
        self.attach(names, filter.clone());
        filter
    }

    /// Attaches an existing filter, keeping its identity.
    pub fn attach<N>(&self, names: N, filter: Filter)
    where
        N: MethodNames,
    {
        self.filters.attach(&names.method_names(), &filter);
    }

    /// The filters attached directly to this instance for `method`.
    pub fn filters(&self, method: &str) -> Vec<Filter> {
        self.filters.get(method)
    }

    pub fn has_filters(&self, method: &str) -> bool {
        self.filters.has(method)
    }

    pub fn reset_filters(&self) {
        self.filters.clear();
    }

    pub fn as_owner(&self) -> Owner<'_> {
        Owner::Instance(self)
    }
}

/// Whoever an operation is being run for.
#[derive(Debug, Clone, Copy)]
pub enum Owner<'a> {
    Instance(&'a Object),
    Class(ClassId),
}

impl Owner<'_> {
    pub fn class(&self) -> ClassId {
        match self {
            Owner::Instance(object) => object.class(),
            Owner::Class(id) => *id,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Owner::Class(_))
    }

    pub fn instance(&self) -> Option<&Object> {
        match self {
            Owner::Instance(object) => Some(*object),
            Owner::Class(_) => None,
        }
    }

    /// Id of the instance, `None` for a class owner. Used to tell instances
    /// of the same class apart in logs.
    pub fn instance_id(&self) -> Option<Uuid> {
        self.instance().map(Object::id)
    }
}

impl<'a> From<&'a Object> for Owner<'a> {
    fn from(object: &'a Object) -> Self {
        Owner::Instance(object)
    }
}

impl From<ClassId> for Owner<'_> {
    fn from(id: ClassId) -> Self {
        Owner::Class(id)
    }
}

/// What every filter, terminal and method body receives as its first argument.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    runtime: &'a Runtime,
    owner: Owner<'a>,
}

impl<'a> Context<'a> {
    pub fn new(runtime: &'a Runtime, owner: Owner<'a>) -> Self {
        Self { runtime, owner }
    }

    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    pub fn owner(&self) -> Owner<'a> {
        self.owner
    }

    pub fn class(&self) -> ClassId {
        self.owner.class()
    }

    pub fn class_name(&self) -> String {
        self.runtime.class_name(self.owner.class())
    }

    pub fn is_static(&self) -> bool {
        self.owner.is_static()
    }

    pub fn instance(&self) -> Option<&'a Object> {
        match self.owner {
            Owner::Instance(object) => Some(object),
            Owner::Class(_) => None,
        }
    }

    /// Runs `terminal` wrapped in the filters registered for this owner's `method`.
    pub fn run_filter<T>(&self, method: &str, params: Params, terminal: T) -> Result<Value>
    where
        T: FnOnce(&Context<'_>, Params, &mut Chain<'_>) -> Result<Value>,
    {
        self.runtime.run_filter(self.owner, method, params, terminal)
    }

    /// Calls another method on the same owner.
    pub fn invoke_method(&self, name: &str, args: impl Into<Args>) -> Result<Value> {
        self.runtime.invoke_method(self.owner, name, args)
    }
}
