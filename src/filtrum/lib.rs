//! # Filtrum Architecture
//!
//! Filtrum composes behavior around named operations at runtime. Any
//! operation of an instance or of a class can be wrapped in an ordered chain
//! of filters that ends in the operation's own implementation (the
//! *terminal*). Filters run outermost first, each deciding whether, and with
//! which parameters, to continue.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Runtime (runtime.rs)                                       │
//! │  - Facade: declare, apply_filter, run_filter,               │
//! │    invoke_method, ancestors                                 │
//! └─────────────────────────────────────────────────────────────┘
//!           │                   │                    │
//!           ▼                   ▼                    ▼
//! ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────┐
//! │ Entry point      │ │ Dynamic invoker  │ │ Ancestor cache   │
//! │ (intercept.rs)   │ │ (invoke.rs)      │ │ (ancestry.rs)    │
//! │ resolve + run    │ │ call by name     │ │ memoized lineage │
//! └──────────────────┘ └──────────────────┘ └──────────────────┘
//!           │                   │                    │
//!           ▼                   ▼                    ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage                                                    │
//! │  - registry.rs: instance / class / pending filter lists     │
//! │  - class.rs: class arena and method tables                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## A filtered operation
//!
//! An operation opts in by running its own logic through the entry point:
//!
//! ```ignore
//! let greeter = runtime.declare(ClassBuilder::new("Greeter").method("greet", |ctx, args| {
//!     let params = Params::new().with("data", args.get(0).cloned().unwrap_or_default());
//!     ctx.run_filter("greet", params, |_, mut params, _| {
//!         let mut data = params.remove("data").unwrap_or_default();
//!         data.as_array_mut().map(|d| d.push("core".into()));
//!         Ok(data)
//!     })
//! }))?;
//!
//! runtime.apply_filter(greeter, "greet", |ctx, mut params, chain| {
//!     params.array_mut("data").map(|d| d.push("before".into()));
//!     let mut result = chain.next(ctx, params)?;
//!     result.as_array_mut().map(|r| r.push("after".into()));
//!     Ok(result)
//! });
//!
//! let greeter = runtime.instantiate("Greeter")?;
//! runtime.invoke_method(&greeter, "greet", [json!(["start"])])?;
//! // => ["start", "before", "core", "after"]
//! ```
//!
//! ## Guarantees
//!
//! - Filters run in attachment order, outermost first; the terminal runs last.
//! - A filter that does not call [`Chain::next`] short-circuits everything inside it.
//! - Calling `next` after the terminal has run is [`FiltrumError::ChainExhausted`].
//! - Errors from filters and terminals come back exactly as they were returned.
//! - Every call builds its own [`Chain`]; nothing about a running chain is shared.
//!
//! ## Module Overview
//!
//! - [`runtime`]: The facade, and the process-wide [`Runtime::global`]
//! - [`chain`]: The forward-only chain cursor
//! - [`filter`]: Filter handles and method-name selectors
//! - [`registry`]: Instance, class and pending filter storage
//! - [`class`]: Class arena, method tables, arities
//! - [`ancestry`]: Memoized ancestor lists
//! - [`object`]: Instances, owners and the filter context
//! - [`invoke`]: Positional arguments and dynamic dispatch
//! - [`params`]: The parameter bag
//! - [`config`]: Runtime configuration
//! - [`error`]: Error types

pub mod ancestry;
pub mod chain;
pub mod class;
pub mod config;
pub mod error;
pub mod filter;
mod intercept;
pub mod invoke;
pub mod object;
pub mod params;
pub mod registry;
pub mod runtime;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use chain::Chain;
pub use class::{Arity, ClassBuilder, ClassDef, ClassId, MethodDef, MethodKind};
pub use config::RuntimeConfig;
pub use error::{CallFault, FiltrumError, Result};
pub use filter::{Filter, MethodNames};
pub use invoke::Args;
pub use object::{Context, Object, Owner};
pub use params::Params;
pub use runtime::Runtime;
