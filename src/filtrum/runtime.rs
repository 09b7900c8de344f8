//! # Runtime Facade
//!
//! [`Runtime`] is the single entry point for everything filtrum does. It owns
//! the class arena, the class-scoped filter registry, the pending (lazy)
//! attachments and the ancestor cache, and dispatches to the modules that
//! implement each operation:
//!
//! | Operation            | Method                         | Module        |
//! |----------------------|--------------------------------|---------------|
//! | attach               | [`Runtime::apply_filter`]      | `registry`    |
//! | run a filtered call  | [`Runtime::run_filter`]        | `intercept`   |
//! | lineage lookup       | [`Runtime::ancestors`]         | `ancestry`    |
//! | dynamic call         | [`Runtime::invoke_method`]     | `invoke`      |
//!
//! ## Shared state
//!
//! Every store sits behind its own `RwLock`. Readers never block each other;
//! writers (attachment, declaration, first ancestor computation) are
//! serialized. No lock is held while user code runs: the entry point works on
//! a snapshot of the resolved filter list, so filters and method bodies may
//! freely attach filters or make further filtered calls.
//!
//! ## Global instance
//!
//! [`Runtime::global`] returns a lazily created process-wide runtime. Build
//! separate runtimes with [`Runtime::new`] when isolation matters (tests).

use crate::ancestry::AncestorCache;
use crate::chain::Chain;
use crate::class::{ClassArena, ClassBuilder, ClassDef, ClassId};
use crate::config::RuntimeConfig;
use crate::error::{FiltrumError, Result};
use crate::filter::{Filter, MethodNames};
use crate::intercept;
use crate::invoke::{self, Args};
use crate::object::{Context, Object, Owner};
use crate::params::Params;
use crate::registry::{ClassFilters, PendingFilters};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

static GLOBAL: Lazy<Runtime> = Lazy::new(Runtime::new);

#[derive(Debug, Default)]
pub struct Runtime {
    config: RuntimeConfig,
    classes: RwLock<ClassArena>,
    filters: ClassFilters,
    pending: PendingFilters,
    ancestry: AncestorCache,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Builds a runtime configured from `filtrum.json` in `dir`, if present.
    pub fn from_config_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let config = RuntimeConfig::load(dir.as_ref())?;
        debug!(dir = %dir.as_ref().display(), ?config, "runtime config loaded");
        Ok(Self::with_config(config))
    }

    pub fn global() -> &'static Runtime {
        &GLOBAL
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    // --- Classes ---

    /// Declares a class. Filters attached to its name beforehand are moved
    /// into the class registry, in their original order.
    pub fn declare(&self, builder: ClassBuilder) -> Result<ClassId> {
        let name = builder.name().to_string();
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        let id = classes.declare(builder)?;

        let pending = self.pending.take(&name);
        if !pending.is_empty() {
            debug!(class = %name, attachments = pending.len(), "applying pending filters");
            self.filters.attach_all(id, pending);
        }
        Ok(id)
    }

    pub fn class_id(&self, name: &str) -> Result<ClassId> {
        self.read_classes()
            .lookup(name)
            .ok_or_else(|| FiltrumError::UnknownClass(name.to_string()))
    }

    pub fn class(&self, id: ClassId) -> Result<Arc<ClassDef>> {
        self.read_classes().require(id).map(Arc::clone)
    }

    /// Name of a declared class, or its numeric id if it is unknown here.
    pub fn class_name(&self, id: ClassId) -> String {
        self.read_classes()
            .get(id)
            .map(|def| def.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Creates an instance of the named class.
    pub fn instantiate(&self, class: &str) -> Result<Object> {
        Ok(Object::new(self.class_id(class)?))
    }

    // --- Attachment ---

    /// Attaches a class-scoped filter to one or more operations of `class`.
    ///
    /// The operation names are not checked; a filter on a name that is never
    /// run through [`run_filter`](Runtime::run_filter) simply never fires.
    pub fn apply_filter<N, F>(&self, class: ClassId, names: N, filter: F) -> Filter
    where
        N: MethodNames,
        F: Fn(&Context<'_>, Params, &mut Chain<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        let filter = Filter::new(filter);
        self.attach(class, names, filter.clone());
        filter
    }

    /// Attaches an existing filter to `class`, keeping its identity.
    pub fn attach<N: MethodNames>(&self, class: ClassId, names: N, filter: Filter) {
        self.filters.attach(class, &names.method_names(), &filter);
    }

    /// Attaches a filter by class name, deferring it if the class is not declared yet.
    pub fn apply_filter_to<N, F>(&self, class: &str, names: N, filter: F) -> Result<Filter>
    where
        N: MethodNames,
        F: Fn(&Context<'_>, Params, &mut Chain<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        let filter = Filter::new(filter);
        self.attach_to(class, names, filter.clone())?;
        Ok(filter)
    }

    pub fn attach_to<N: MethodNames>(&self, class: &str, names: N, filter: Filter) -> Result<()> {
        let names = names.method_names();
        // The arena lock is held across the pending push; `declare` drains
        // pending under the write lock.
        let classes = self.read_classes();
        match classes.lookup(class) {
            Some(id) => {
                self.filters.attach(id, &names, &filter);
                Ok(())
            }
            None if self.config.lazy_filters => {
                debug!(class, methods = ?names, "deferring filter until class is declared");
                self.pending.push(class, names, filter);
                Ok(())
            }
            None => Err(FiltrumError::UnknownClass(class.to_string())),
        }
    }

    /// True if anything is registered or pending for `class::method`.
    pub fn has_applied(&self, class: &str, method: &str) -> bool {
        match self.read_classes().lookup(class) {
            Some(id) => self.filters.has(id, method),
            None => self.pending.has(class, method),
        }
    }

    /// Filters stored directly on `owner` for `method`, without ancestor fallback.
    pub fn filters<'o>(&self, owner: impl Into<Owner<'o>>, method: &str) -> Vec<Filter> {
        match owner.into() {
            Owner::Instance(object) => object.filters(method),
            Owner::Class(id) => self.filters.get(id, method),
        }
    }

    /// The list the entry point would run for `owner::method` right now.
    pub fn resolved_filters<'o>(
        &self,
        owner: impl Into<Owner<'o>>,
        method: &str,
    ) -> Result<Vec<Filter>> {
        intercept::resolve(self, owner.into(), method)
    }

    pub fn reset_filters(&self, class: ClassId) {
        self.filters.clear(class);
    }

    /// Clears every class-scoped and pending filter. Instance filters live on
    /// their objects and are untouched.
    pub fn reset_all_filters(&self) {
        self.filters.clear_all();
        let dropped = self.pending.clear();
        if dropped > 0 {
            warn!(dropped, "pending filters discarded by reset");
        }
    }

    // --- Entry point ---

    /// Runs `terminal` wrapped in the filters resolved for `owner::method`.
    ///
    /// Called from inside a filterable operation's own body. The result of
    /// the outermost link is returned; failures from any link propagate
    /// unchanged. If `owner` cannot call `method` at all, nothing runs and
    /// the result is [`FiltrumError::InvalidCall`].
    pub fn run_filter<'o, 't, T>(
        &self,
        owner: impl Into<Owner<'o>>,
        method: &str,
        params: Params,
        terminal: T,
    ) -> Result<Value>
    where
        T: FnOnce(&Context<'_>, Params, &mut Chain<'_>) -> Result<Value> + 't,
    {
        intercept::run(self, owner.into(), method, params, &[], terminal)
    }

    /// Like [`run_filter`](Runtime::run_filter), with `extra` filters for this
    /// call only, placed inside the registered ones.
    pub fn run_filter_with<'o, 't, T>(
        &self,
        owner: impl Into<Owner<'o>>,
        method: &str,
        params: Params,
        extra: &[Filter],
        terminal: T,
    ) -> Result<Value>
    where
        T: FnOnce(&Context<'_>, Params, &mut Chain<'_>) -> Result<Value> + 't,
    {
        intercept::run(self, owner.into(), method, params, extra, terminal)
    }

    // --- Lineage ---

    /// Ancestors of `class`, nearest first, excluding `class` itself.
    pub fn ancestors(&self, class: ClassId, force_refresh: bool) -> Result<Arc<[ClassId]>> {
        let classes = self.read_classes();
        self.ancestry.ancestors(&classes, class, force_refresh)
    }

    pub fn ancestor_names(&self, class: ClassId) -> Result<Vec<String>> {
        let lineage = self.ancestors(class, false)?;
        let classes = self.read_classes();
        lineage
            .iter()
            .map(|id| classes.require(*id).map(|def| def.name.clone()))
            .collect()
    }

    // --- Dynamic calls ---

    /// Calls `name` on `target` with `args` as positional arguments.
    pub fn invoke_method<'o>(
        &self,
        target: impl Into<Owner<'o>>,
        name: &str,
        args: impl Into<Args>,
    ) -> Result<Value> {
        invoke::invoke(self, target.into(), name, args.into())
    }

    /// True if [`invoke_method`](Runtime::invoke_method) would find a callable `name`.
    pub fn responds_to<'o>(&self, target: impl Into<Owner<'o>>, name: &str) -> bool {
        invoke::resolve(self, target.into(), name).is_ok()
    }

    pub(crate) fn class_filters(&self) -> &ClassFilters {
        &self.filters
    }

    fn read_classes(&self) -> std::sync::RwLockReadGuard<'_, ClassArena> {
        self.classes.read().unwrap_or_else(PoisonError::into_inner)
    }
}
