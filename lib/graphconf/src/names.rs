//! Syntactic checks on namespaces, prefixes and local names.

use oxiri::Iri;
use regex::Regex;
use std::sync::LazyLock;

static PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][\w-]*$").unwrap());

/// Returns `true` if `prefix` is usable as a namespace prefix.
///
/// ```
/// use graphconf::is_valid_prefix;
///
/// assert!(is_valid_prefix("ns0"));
/// assert!(is_valid_prefix("my-vocab"));
/// assert!(!is_valid_prefix("0ns"));
/// assert!(!is_valid_prefix("ex:"));
/// ```
pub fn is_valid_prefix(prefix: &str) -> bool {
    PREFIX_PATTERN.is_match(prefix)
}

/// Returns the index at which the local name of `uri` starts.
///
/// The split point follows the first `#`, or else the last `/`, or else the last `:`.
/// A string without any of them is entirely a local name.
pub fn local_name_index(uri: &str) -> usize {
    uri.find('#')
        .or_else(|| uri.rfind('/'))
        .or_else(|| uri.rfind(':'))
        .map_or(0, |i| i + 1)
}

/// The local name of `uri`, e.g. `Person` for `http://example.org/Person`.
pub fn local_name(uri: &str) -> &str {
    &uri[local_name_index(uri)..]
}

/// The namespace of `uri`, e.g. `http://example.org/` for `http://example.org/Person`.
pub fn namespace(uri: &str) -> &str {
    &uri[..local_name_index(uri)]
}

/// Returns `true` if splitting `namespace + local_name` gives back `namespace`
/// and the concatenation is an absolute IRI.
pub fn is_correct_uri_split(namespace: &str, local_name: &str) -> bool {
    let Some(last) = namespace.chars().last() else {
        return false;
    };
    let split_ok = match last {
        '#' => !namespace[..namespace.len() - 1].contains('#'),
        '/' => !namespace.contains('#') && !local_name.contains(['/', '#']),
        ':' => !namespace.contains(['#', '/']) && !local_name.contains([':', '/', '#']),
        _ => false,
    };
    split_ok && Iri::parse(format!("{namespace}{local_name}")).is_ok()
}
