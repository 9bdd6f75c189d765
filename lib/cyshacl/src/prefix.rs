use crate::error::ShaclCompileError;
use graphconf::is_valid_prefix;
use oxiri::Iri;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Resolves the namespace prefixes and explicit name mappings registered in the host graph.
pub trait PrefixResolver {
    /// The prefix registered for `namespace`, if any.
    ///
    /// Fails with [`ShaclCompileError::InvalidPrefixDefinition`] if the registered definition is malformed.
    fn prefix_for_namespace(&self, namespace: &str) -> Result<Option<String>, ShaclCompileError>;

    /// The explicit property graph name mapped to `uri`, used by the `MAP` vocabulary policy.
    fn mapping_for(&self, _uri: &str) -> Option<String> {
        None
    }
}

/// An in-memory [`PrefixResolver`].
///
/// Definitions are stored as given and only checked when looked up.
///
/// ```
/// use cyshacl::{PrefixResolver, PrefixTable};
///
/// let mut prefixes = PrefixTable::new();
/// prefixes.insert("ex", "http://example.org/");
/// assert_eq!(
///     prefixes.prefix_for_namespace("http://example.org/")?.as_deref(),
///     Some("ex")
/// );
/// assert_eq!(prefixes.prefix_for_namespace("http://example.com/")?, None);
/// # Result::<_, cyshacl::ShaclCompileError>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrefixTable {
    by_namespace: BTreeMap<String, String>,
    mappings: FxHashMap<String, String>,
}

impl PrefixTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `prefix` for `namespace`, replacing any previous prefix of this namespace.
    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.by_namespace.insert(namespace.into(), prefix.into());
    }

    /// Maps `uri` to the property graph name `name`.
    pub fn insert_mapping(&mut self, uri: impl Into<String>, name: impl Into<String>) {
        self.mappings.insert(uri.into(), name.into());
    }

    /// `(prefix, namespace)` pairs, ordered by namespace.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_namespace
            .iter()
            .map(|(namespace, prefix)| (prefix.as_str(), namespace.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_namespace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_namespace.is_empty()
    }
}

impl<P: Into<String>, N: Into<String>> FromIterator<(P, N)> for PrefixTable {
    fn from_iter<I: IntoIterator<Item = (P, N)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (prefix, namespace) in iter {
            table.insert(prefix, namespace);
        }
        table
    }
}

impl PrefixResolver for PrefixTable {
    fn prefix_for_namespace(&self, namespace: &str) -> Result<Option<String>, ShaclCompileError> {
        let Some(prefix) = self.by_namespace.get(namespace) else {
            return Ok(None);
        };
        if !is_valid_prefix(prefix) || Iri::parse(namespace).is_err() {
            return Err(ShaclCompileError::invalid_prefix_definition(
                prefix.as_str(),
                namespace,
            ));
        }
        Ok(Some(prefix.clone()))
    }

    fn mapping_for(&self, uri: &str) -> Option<String> {
        self.mappings.get(uri).cloned()
    }
}
