//! # Ancestor Cache
//!
//! Memoized lineage lookups. For each class the cache keeps the ordered list
//! of its ancestors, nearest first, excluding the class itself. Entries are
//! computed on first request and kept for the life of the cache; classes are
//! never redefined, so the only reason to recompute is `force_refresh`.

use crate::class::{ClassArena, ClassId};
use crate::error::{FiltrumError, Result};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct AncestorCache {
    entries: RwLock<HashMap<ClassId, Arc<[ClassId]>>>,
}

impl AncestorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ancestors of `class`, nearest first.
    ///
    /// Concurrent first requests for the same class compute the list once;
    /// every caller gets the same shared slice.
    pub fn ancestors(
        &self,
        arena: &ClassArena,
        class: ClassId,
        force_refresh: bool,
    ) -> Result<Arc<[ClassId]>> {
        if !force_refresh {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = entries.get(&class) {
                return Ok(Arc::clone(cached));
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !force_refresh {
            if let Some(cached) = entries.get(&class) {
                return Ok(Arc::clone(cached));
            }
        }

        let lineage: Arc<[ClassId]> = walk(arena, class)?.into();
        entries.insert(class, Arc::clone(&lineage));
        Ok(lineage)
    }

    pub fn is_cached(&self, class: ClassId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&class)
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

fn walk(arena: &ClassArena, class: ClassId) -> Result<Vec<ClassId>> {
    let mut lineage = Vec::new();
    let mut current = arena.require(class)?.parent;
    while let Some(id) = current {
        if id == class || lineage.contains(&id) {
            return Err(FiltrumError::failed(format!(
                "Cyclic lineage detected at class {}",
                id
            )));
        }
        lineage.push(id);
        current = arena.require(id)?.parent;
    }
    Ok(lineage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;

    fn hierarchy() -> (ClassArena, ClassId, ClassId, ClassId) {
        let mut arena = ClassArena::new();
        let base = arena.declare(ClassBuilder::new("Base")).unwrap();
        let mid = arena.declare(ClassBuilder::new("Mid").extends("Base")).unwrap();
        let leaf = arena.declare(ClassBuilder::new("Leaf").extends("Mid")).unwrap();
        (arena, base, mid, leaf)
    }

    #[test]
    fn test_nearest_first_excluding_self() {
        let (arena, base, mid, leaf) = hierarchy();
        let cache = AncestorCache::new();
        assert_eq!(&*cache.ancestors(&arena, leaf, false).unwrap(), &[mid, base]);
        assert_eq!(&*cache.ancestors(&arena, mid, false).unwrap(), &[base]);
        assert!(cache.ancestors(&arena, base, false).unwrap().is_empty());
    }

    #[test]
    fn test_second_call_returns_cached_list() {
        let (arena, _, _, leaf) = hierarchy();
        let cache = AncestorCache::new();
        assert!(!cache.is_cached(leaf));
        let first = cache.ancestors(&arena, leaf, false).unwrap();
        let second = cache.ancestors(&arena, leaf, false).unwrap();
        assert!(cache.is_cached(leaf));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_force_refresh_rebuilds_entry() {
        let (arena, _, _, leaf) = hierarchy();
        let cache = AncestorCache::new();
        let first = cache.ancestors(&arena, leaf, false).unwrap();
        let refreshed = cache.ancestors(&arena, leaf, true).unwrap();
        assert_eq!(first, refreshed);
        assert!(!Arc::ptr_eq(&first, &refreshed));
        let after = cache.ancestors(&arena, leaf, false).unwrap();
        assert!(Arc::ptr_eq(&refreshed, &after));
    }

    #[test]
    fn test_unknown_class_is_an_error() {
        let (arena, ..) = hierarchy();
        let mut other = ClassArena::new();
        for name in ["A", "B", "C", "D"] {
            other.declare(ClassBuilder::new(name)).unwrap();
        }
        let foreign = other.lookup("D").unwrap();
        let cache = AncestorCache::new();
        assert!(matches!(
            cache.ancestors(&arena, foreign, false),
            Err(FiltrumError::UnknownClass(_))
        ));
    }
}
