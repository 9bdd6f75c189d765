//! IRI to property graph name translation.

use crate::error::ShaclCompileError;
use crate::prefix::PrefixResolver;
use graphconf::{GraphConfig, VocabUrisMode, local_name, namespace};

/// Separator between the prefix and the local name of a shortened IRI.
pub const PREFIX_SEPARATOR: &str = "__";

/// Turns IRIs of the shapes graph into labels, property keys and relationship types.
///
/// Without configuration, and under the `IGNORE` policy, only the local name is kept.
#[derive(Clone, Copy)]
pub struct UriTranslator<'a> {
    config: Option<&'a GraphConfig>,
    resolver: &'a dyn PrefixResolver,
}

impl<'a> UriTranslator<'a> {
    pub fn new(config: Option<&'a GraphConfig>, resolver: &'a dyn PrefixResolver) -> Self {
        Self { config, resolver }
    }

    /// The property graph name of `uri`.
    ///
    /// ```
    /// use cyshacl::{PrefixTable, UriTranslator};
    /// use graphconf::GraphConfig;
    ///
    /// let config = GraphConfig::default();
    /// let prefixes: PrefixTable = [("sch", "http://schema.org/")].into_iter().collect();
    /// let translator = UriTranslator::new(Some(&config), &prefixes);
    /// assert_eq!(translator.translate("http://schema.org/Person")?, "sch__Person");
    /// assert!(translator.translate("http://example.org/Person").is_err());
    ///
    /// let translator = UriTranslator::new(None, &prefixes);
    /// assert_eq!(translator.translate("http://example.org/Person")?, "Person");
    /// # Result::<_, cyshacl::ShaclCompileError>::Ok(())
    /// ```
    pub fn translate(&self, uri: &str) -> Result<String, ShaclCompileError> {
        let Some(config) = self.config else {
            return Ok(local_name(uri).into());
        };
        match config.handle_vocab_uris() {
            VocabUrisMode::Ignore => Ok(local_name(uri).into()),
            VocabUrisMode::Keep => Ok(uri.into()),
            VocabUrisMode::Map => Ok(self
                .resolver
                .mapping_for(uri)
                .unwrap_or_else(|| local_name(uri).into())),
            VocabUrisMode::Shorten | VocabUrisMode::ShortenStrict => {
                let namespace = namespace(uri);
                let prefix = self
                    .resolver
                    .prefix_for_namespace(namespace)?
                    .ok_or_else(|| ShaclCompileError::uri_namespace_unknown(uri, namespace))?;
                Ok(format!("{prefix}{PREFIX_SEPARATOR}{}", local_name(uri)))
            }
        }
    }

    /// Translates every IRI of `uris`, keeping their order.
    pub fn translate_all(&self, uris: &[String]) -> Result<Vec<String>, ShaclCompileError> {
        uris.iter().map(|uri| self.translate(uri)).collect()
    }

    pub fn config(&self) -> Option<&'a GraphConfig> {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix::PrefixTable;
    use serde_json::json;

    fn config(mode: &str) -> GraphConfig {
        let props = json!({ "handleVocabUris": mode });
        GraphConfig::from_properties(props.as_object().unwrap()).unwrap()
    }

    fn prefixes() -> PrefixTable {
        let mut table: PrefixTable = [
            ("ex", "http://example.org/"),
            ("xsd", "http://www.w3.org/2001/XMLSchema#"),
        ]
        .into_iter()
        .collect();
        table.insert_mapping("http://example.org/name", "fullName");
        table
    }

    #[test]
    fn shorten() {
        let prefixes = prefixes();
        for mode in ["SHORTEN", "SHORTEN_STRICT"] {
            let config = config(mode);
            let translator = UriTranslator::new(Some(&config), &prefixes);
            assert_eq!(translator.translate("http://example.org/age").unwrap(), "ex__age");
            assert_eq!(
                translator
                    .translate("http://www.w3.org/2001/XMLSchema#integer")
                    .unwrap(),
                "xsd__integer"
            );
            assert!(matches!(
                translator.translate("http://other.org/age"),
                Err(ShaclCompileError::UriNamespaceUnknown { ref namespace, .. })
                    if namespace == "http://other.org/"
            ));
        }
    }

    #[test]
    fn other_policies() {
        let prefixes = prefixes();
        let keep = config("KEEP");
        let ignore = config("IGNORE");
        let map = config("MAP");
        let uri = "http://example.org/name";
        assert_eq!(
            UriTranslator::new(Some(&keep), &prefixes).translate(uri).unwrap(),
            uri
        );
        assert_eq!(
            UriTranslator::new(Some(&ignore), &prefixes).translate(uri).unwrap(),
            "name"
        );
        let translator = UriTranslator::new(Some(&map), &prefixes);
        assert_eq!(translator.translate(uri).unwrap(), "fullName");
        assert_eq!(translator.translate("http://example.org/age").unwrap(), "age");
        assert_eq!(
            UriTranslator::new(None, &prefixes)
                .translate_all(&["http://a.org/x#y".into(), "urn:b:c".into()])
                .unwrap(),
            ["y", "c"]
        );
    }
}
