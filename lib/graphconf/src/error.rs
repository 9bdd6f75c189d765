//! Error types for graph configuration handling.

use std::error::Error;

/// Error raised while building, updating or persisting a [`GraphConfig`](crate::GraphConfig).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GraphConfigError {
    /// A policy value outside of its closed set of canonical names.
    #[error("{value} is not a valid option for param '{param}'")]
    InvalidParam { param: String, value: String },

    /// `set` was called before `init`.
    #[error("Graph config not found. Call 'init' method first.")]
    GraphConfigMissing,

    /// A write was attempted on a graph that already holds resources.
    #[error("The graph is non-empty. Config cannot be changed.")]
    GraphNotEmpty,

    /// The host store failed.
    #[error(transparent)]
    Host(Box<dyn Error + Send + Sync>),
}

impl GraphConfigError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(param: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidParam {
            param: param.into(),
            value: value.into(),
        }
    }

    /// Wraps an error of the host store.
    pub fn host(error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Host(error.into())
    }
}
