//! # Class Arena
//!
//! Classes are plain descriptors stored in an append-only arena and referred
//! to by a dense [`ClassId`]. A class has a name, an optional parent and a
//! table of named methods. Declaring a class requires its parent to be
//! declared already, so every lineage is finite and acyclic.
//!
//! Descriptors are immutable once declared; the arena hands them out as
//! `Arc<ClassDef>` so callers never hold the arena lock while running code.

use crate::error::{FiltrumError, Result};
use crate::invoke::Args;
use crate::object::Context;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Stable identity of a declared class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How many positional arguments a method accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arity {
    #[default]
    Any,
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Any => true,
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Between(min, max) => (min..=max).contains(&count),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Any => write!(f, "any number of"),
            Arity::Exact(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Between(min, max) => write!(f, "between {} and {}", min, max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Callable on instances only.
    Instance,
    /// Callable on the class itself (and through its instances).
    Static,
}

type MethodFn = dyn Fn(&Context<'_>, Args) -> Result<Value> + Send + Sync;

/// A named operation in a class's method table.
#[derive(Clone)]
pub struct MethodDef {
    pub kind: MethodKind,
    pub arity: Arity,
    body: Arc<MethodFn>,
}

impl MethodDef {
    pub fn new<F>(kind: MethodKind, body: F) -> Self
    where
        F: Fn(&Context<'_>, Args) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            kind,
            arity: Arity::Any,
            body: Arc::new(body),
        }
    }

    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    pub fn call(&self, ctx: &Context<'_>, args: Args) -> Result<Value> {
        (self.body)(ctx, args)
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("kind", &self.kind)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ClassDef {
    pub id: ClassId,
    pub name: String,
    pub parent: Option<ClassId>,
    methods: HashMap<String, MethodDef>,
}

impl ClassDef {
    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.get(name)
    }

    /// True when this class itself (not an ancestor) declares `name`.
    pub fn declares(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Describes a class before it is declared.
///
/// ```ignore
/// let greeter = runtime.declare(
///     ClassBuilder::new("Greeter")
///         .extends("Base")
///         .method("greet", |ctx, args| { ... })
///         .static_method("create", |ctx, args| { ... }),
/// )?;
/// ```
#[derive(Debug)]
pub struct ClassBuilder {
    name: String,
    parent: Option<String>,
    methods: HashMap<String, MethodDef>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            methods: HashMap::new(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn method<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Context<'_>, Args) -> Result<Value> + Send + Sync + 'static,
    {
        self.define(name, MethodDef::new(MethodKind::Instance, body))
    }

    pub fn static_method<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Context<'_>, Args) -> Result<Value> + Send + Sync + 'static,
    {
        self.define(name, MethodDef::new(MethodKind::Static, body))
    }

    /// Adds a fully described method, replacing any earlier one with the same name.
    pub fn define(mut self, name: impl Into<String>, method: MethodDef) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Append-only storage of class descriptors.
#[derive(Debug, Default)]
pub struct ClassArena {
    classes: Vec<Arc<ClassDef>>,
    by_name: HashMap<String, ClassId>,
}

impl ClassArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, builder: ClassBuilder) -> Result<ClassId> {
        if self.by_name.contains_key(&builder.name) {
            return Err(FiltrumError::DuplicateClass(builder.name));
        }
        let parent = match builder.parent {
            Some(parent) => Some(
                self.lookup(&parent)
                    .ok_or(FiltrumError::UnknownClass(parent))?,
            ),
            None => None,
        };
        let raw = u32::try_from(self.classes.len())
            .map_err(|_| FiltrumError::failed("Class arena is full"))?;
        let id = ClassId(raw);

        self.by_name.insert(builder.name.clone(), id);
        self.classes.push(Arc::new(ClassDef {
            id,
            name: builder.name,
            parent,
            methods: builder.methods,
        }));
        Ok(id)
    }

    pub fn get(&self, id: ClassId) -> Option<&Arc<ClassDef>> {
        self.classes.get(id.index())
    }

    pub fn require(&self, id: ClassId) -> Result<&Arc<ClassDef>> {
        self.get(id)
            .ok_or_else(|| FiltrumError::UnknownClass(id.to_string()))
    }

    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn parent(&self, id: ClassId) -> Option<ClassId> {
        self.get(id).and_then(|def| def.parent)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
