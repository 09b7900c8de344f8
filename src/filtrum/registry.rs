//! # Filter Registry
//!
//! Storage for attached filters. There are three stores, all append-only
//! until an explicit reset:
//!
//! - [`FilterTable`]: per-instance storage, owned by each [`Object`](crate::Object).
//! - [`ClassFilters`]: class-scoped storage keyed by `(ClassId, method)`.
//! - [`PendingFilters`]: filters attached by class *name* before that class
//!   has been declared. They move into [`ClassFilters`] on declaration.
//!
//! Reads return snapshots (`Vec<Filter>` of cheap `Arc` clones), so no lock is
//! ever held while a filter runs. Writes take the write lock, which keeps
//! concurrent appends to the same key from being lost.
//!
//! Method names are never validated here: attaching to a name nobody calls
//! is allowed and simply has no effect.

use crate::class::ClassId;
use crate::filter::Filter;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Method name to ordered filter list.
#[derive(Debug, Default, Clone)]
pub struct FilterMap {
    lists: HashMap<String, Vec<Filter>>,
}

impl FilterMap {
    /// Appends `filter` to the list of every name, in order.
    pub fn attach(&mut self, names: &[String], filter: &Filter) {
        for name in names {
            self.lists
                .entry(name.clone())
                .or_default()
                .push(filter.clone());
        }
    }

    pub fn get(&self, method: &str) -> Vec<Filter> {
        self.lists.get(method).cloned().unwrap_or_default()
    }

    pub fn has(&self, method: &str) -> bool {
        self.lists.get(method).is_some_and(|list| !list.is_empty())
    }

    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.lists.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.lists.clear();
    }
}

/// Instance-scoped filter storage.
#[derive(Debug, Default)]
pub struct FilterTable {
    map: RwLock<FilterMap>,
}

impl FilterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, names: &[String], filter: &Filter) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .attach(names, filter);
    }

    pub fn get(&self, method: &str) -> Vec<Filter> {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(method)
    }

    pub fn has(&self, method: &str) -> bool {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .has(method)
    }

    pub fn clear(&self) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn snapshot(&self) -> FilterMap {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Class-scoped filter storage.
#[derive(Debug, Default)]
pub struct ClassFilters {
    classes: RwLock<HashMap<ClassId, FilterMap>>,
}

impl ClassFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, class: ClassId, names: &[String], filter: &Filter) {
        self.classes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(class)
            .or_default()
            .attach(names, filter);
    }

    /// Moves a batch of `(names, filter)` attachments in under one lock.
    pub fn attach_all(&self, class: ClassId, batch: Vec<(Vec<String>, Filter)>) {
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        let map = classes.entry(class).or_default();
        for (names, filter) in &batch {
            map.attach(names, filter);
        }
    }

    /// The list registered directly on `class`; ancestors are not consulted.
    pub fn get(&self, class: ClassId, method: &str) -> Vec<Filter> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&class)
            .map(|map| map.get(method))
            .unwrap_or_default()
    }

    pub fn has(&self, class: ClassId, method: &str) -> bool {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&class)
            .is_some_and(|map| map.has(method))
    }

    pub fn clear(&self, class: ClassId) {
        self.classes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&class);
    }

    pub fn clear_all(&self) {
        self.classes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Attachments waiting for their class to be declared, keyed by class name.
#[derive(Debug, Default)]
pub struct PendingFilters {
    by_class: RwLock<HashMap<String, Vec<(Vec<String>, Filter)>>>,
}

impl PendingFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, class: &str, names: Vec<String>, filter: Filter) {
        self.by_class
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(class.to_string())
            .or_default()
            .push((names, filter));
    }

    /// Removes and returns everything pending for `class`, in attachment order.
    pub fn take(&self, class: &str) -> Vec<(Vec<String>, Filter)> {
        self.by_class
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(class)
            .unwrap_or_default()
    }

    pub fn has(&self, class: &str, method: &str) -> bool {
        self.by_class
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(class)
            .is_some_and(|pending| {
                pending
                    .iter()
                    .any(|(names, _)| names.iter().any(|n| n == method))
            })
    }

    /// Drops every pending attachment, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let mut by_class = self.by_class.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = by_class.values().map(Vec::len).sum();
        by_class.clear();
        dropped
    }
}
