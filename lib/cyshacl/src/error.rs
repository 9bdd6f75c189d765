//! Error types for shapes parsing and plan compilation.

use oxiri::IriParseError;
use oxrdfio::{RdfParseError, RdfSyntaxError};
use std::io;

/// Main error type of the one-shot [`compile_document`](crate::compile_document).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ShaclError {
    /// Error reading the shapes document.
    #[error(transparent)]
    Parse(#[from] ShapesParseError),

    /// Error lowering the shapes into queries.
    #[error(transparent)]
    Compile(#[from] ShaclCompileError),
}

/// Error raised while reading a shapes document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ShapesParseError {
    /// The document is not valid in its declared format.
    #[error(transparent)]
    Syntax(#[from] RdfSyntaxError),

    /// The document could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The configured base IRI is invalid.
    #[error("Invalid base IRI: {0}")]
    InvalidBaseIri(#[from] IriParseError),
}

impl From<RdfParseError> for ShapesParseError {
    fn from(error: RdfParseError) -> Self {
        match error {
            RdfParseError::Syntax(e) => Self::Syntax(e),
            RdfParseError::Io(e) => Self::Io(e),
        }
    }
}

/// Error raised while translating shape IRIs into property graph names.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ShaclCompileError {
    /// No prefix is registered for the namespace of a IRI to shorten.
    #[error("No prefix has been defined for namespace <{namespace}> (used in <{uri}>)")]
    UriNamespaceUnknown { uri: String, namespace: String },

    /// The registered prefix definition for a namespace is malformed.
    #[error("The prefix definition '{prefix}' for namespace <{namespace}> is invalid")]
    InvalidPrefixDefinition { prefix: String, namespace: String },
}

impl ShaclCompileError {
    /// Creates an unknown namespace error.
    pub fn uri_namespace_unknown(uri: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::UriNamespaceUnknown {
            uri: uri.into(),
            namespace: namespace.into(),
        }
    }

    /// Creates an invalid prefix definition error.
    pub fn invalid_prefix_definition(
        prefix: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::InvalidPrefixDefinition {
            prefix: prefix.into(),
            namespace: namespace.into(),
        }
    }
}
