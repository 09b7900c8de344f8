use crate::class::Arity;
use std::fmt;
use thiserror::Error;

/// Why a dynamic call could not be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallFault {
    /// No class in the owner's lineage declares the method.
    Undefined,
    /// The method is instance-scoped but was called on a class owner.
    InstanceOnly,
}

impl fmt::Display for CallFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallFault::Undefined => write!(f, "not defined or handled in"),
            CallFault::InstanceOnly => write!(f, "only callable on an instance of"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FiltrumError {
    #[error("Method `{method}` is {fault} class `{class}`")]
    InvalidCall {
        class: String,
        method: String,
        fault: CallFault,
    },

    #[error("Filter chain for `{method}` is exhausted (continuation called at position {position})")]
    ChainExhausted { method: String, position: usize },

    #[error("Method `{class}::{method}` expects {expected} argument(s), {given} given")]
    Arity {
        class: String,
        method: String,
        expected: Arity,
        given: usize,
    },

    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("Class already declared: {0}")]
    DuplicateClass(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A failure raised by a filter, a terminal or a method body.
    #[error("{0}")]
    Failed(String),

    /// Any other error a filter, terminal or method body chooses to return.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl FiltrumError {
    pub fn failed(message: impl Into<String>) -> Self {
        FiltrumError::Failed(message.into())
    }

    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FiltrumError::Other(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, FiltrumError>;
