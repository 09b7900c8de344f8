//! # Filter Chain
//!
//! A [`Chain`] is a forward-only cursor over the filters resolved for one
//! call, followed by the operation's terminal implementation.
//!
//! ```text
//!   next() ──▶ filter[0] ──next()──▶ filter[1] ──next()──▶ terminal
//!                 ▲                      ▲                     │
//!                 └──── result ◀─────────┴──── result ◀────────┘
//! ```
//!
//! The cursor moves exactly once per [`Chain::next`] call, immediately before
//! the link runs. A filter that never calls `next` short-circuits the rest of
//! the chain and its return value becomes the result. Once the terminal has
//! run, any further `next` call fails with
//! [`FiltrumError::ChainExhausted`].
//!
//! Chains are built fresh for every call and are never shared.

use crate::error::{FiltrumError, Result};
use crate::filter::Filter;
use crate::object::Context;
use crate::params::Params;
use serde_json::Value;
use std::fmt;
use tracing::trace;

/// The innermost link of a chain: the operation's own implementation.
///
/// It may borrow from the caller's frame and runs at most once.
pub type Terminal<'t> =
    Box<dyn FnOnce(&Context<'_>, Params, &mut Chain<'_>) -> Result<Value> + 't>;

pub struct Chain<'t> {
    class: String,
    method: String,
    filters: Vec<Filter>,
    terminal: Option<Terminal<'t>>,
    cursor: usize,
}

impl<'t> Chain<'t> {
    pub fn new<T>(
        class: impl Into<String>,
        method: impl Into<String>,
        filters: Vec<Filter>,
        terminal: T,
    ) -> Self
    where
        T: FnOnce(&Context<'_>, Params, &mut Chain<'_>) -> Result<Value> + 't,
    {
        Self {
            class: class.into(),
            method: method.into(),
            filters,
            terminal: Some(Box::new(terminal)),
            cursor: 0,
        }
    }

    /// Runs the link at the cursor, advancing past it first.
    pub fn next(&mut self, ctx: &Context<'_>, params: Params) -> Result<Value> {
        let position = self.cursor;

        if let Some(filter) = self.filters.get(position).cloned() {
            self.cursor += 1;
            trace!(class = %self.class, method = %self.method, position, "filter");
            return filter.call(ctx, params, self);
        }

        if position == self.filters.len() {
            if let Some(terminal) = self.terminal.take() {
                self.cursor += 1;
                trace!(class = %self.class, method = %self.method, position, "terminal");
                return terminal(ctx, params, self);
            }
        }

        Err(FiltrumError::ChainExhausted {
            method: self.qualified_method(),
            position,
        })
    }

    /// Name of the filtered operation.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Name of the class the operation was resolved against.
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// `Class::method`, as used in error messages.
    pub fn qualified_method(&self) -> String {
        format!("{}::{}", self.class, self.method)
    }

    /// Number of filters, not counting the terminal.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Index of the next link to run. Equal to `len()` when only the terminal remains.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor > self.filters.len()
    }
}

impl fmt::Debug for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("class", &self.class)
            .field("method", &self.method)
            .field("filters", &self.filters.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}
