//! The [`GraphConfig`] record and its flat-mapping (de)serialisation.

use crate::error::GraphConfigError;
use crate::mode::{GraphMode, MultivalMode, Policy, RdfTypesMode, VocabUrisMode};
use crate::names::{is_correct_uri_split, is_valid_prefix};
use serde_json::Value;
use std::collections::BTreeSet;

/// A flat string-keyed property bag, as received from the external API or read from the host graph.
pub type Properties = serde_json::Map<String, Value>;

/// Namespace used for schema elements when none is configured.
pub const DEFAULT_BASE_SCHEMA_NAMESPACE: &str = "neo4j://graph.schema#";
/// Prefix used for schema elements when none is configured.
pub const DEFAULT_BASE_SCHEMA_PREFIX: &str = "n4sch";

const DEFAULT_CLASS_LABEL: &str = "Class";
const DEFAULT_SUB_CLASS_OF_REL: &str = "SCO";
const DEFAULT_DATA_TYPE_PROPERTY_LABEL: &str = "Property";
const DEFAULT_OBJECT_PROPERTY_LABEL: &str = "Relationship";
const DEFAULT_SUB_PROPERTY_OF_REL: &str = "SPO";
const DEFAULT_DOMAIN_REL: &str = "DOMAIN";
const DEFAULT_RANGE_REL: &str = "RANGE";

/// Local name used to validate `baseSchemaNamespace` split points.
const SPLIT_PROBE: &str = "someLocalName";

/// Names of the external properties.
pub mod keys {
    pub const HANDLE_VOCAB_URIS: &str = "handleVocabUris";
    pub const HANDLE_MULTIVAL: &str = "handleMultival";
    pub const HANDLE_RDF_TYPES: &str = "handleRDFTypes";
    pub const KEEP_LANG_TAG: &str = "keepLangTag";
    pub const APPLY_NEO4J_NAMING: &str = "applyNeo4jNaming";
    pub const KEEP_CUSTOM_DATA_TYPES: &str = "keepCustomDataTypes";
    pub const MULTIVAL_PROP_LIST: &str = "multivalPropList";
    pub const CUSTOM_DATA_TYPE_PROP_LIST: &str = "customDataTypePropList";
    pub const BASE_SCHEMA_NAMESPACE: &str = "baseSchemaNamespace";
    pub const BASE_SCHEMA_PREFIX: &str = "baseSchemaPrefix";
    pub const CLASS_LABEL: &str = "classLabel";
    pub const SUB_CLASS_OF_REL: &str = "subClassOfRel";
    pub const DATA_TYPE_PROPERTY_LABEL: &str = "dataTypePropertyLabel";
    pub const OBJECT_PROPERTY_LABEL: &str = "objectPropertyLabel";
    pub const SUB_PROPERTY_OF_REL: &str = "subPropertyOfRel";
    pub const DOMAIN_REL: &str = "domainRel";
    pub const RANGE_REL: &str = "rangeRel";
    pub const FORCIBLY_ASSIGNED_NODE_PROPERTIES: &str = "forciblyAssignedOnImportNodeProperties";
}

/// Names under which the fields are persisted in the host graph.
pub mod storage_keys {
    pub const HANDLE_VOCAB_URIS: &str = "_handleVocabUris";
    pub const HANDLE_MULTIVAL: &str = "_handleMultival";
    pub const HANDLE_RDF_TYPES: &str = "_handleRDFTypes";
    pub const KEEP_LANG_TAG: &str = "_keepLangTag";
    pub const APPLY_NEO4J_NAMING: &str = "_applyNeo4jNaming";
    pub const KEEP_CUSTOM_DATA_TYPES: &str = "_keepCustomDataTypes";
    pub const MULTIVAL_PROP_LIST: &str = "_multivalPropList";
    pub const CUSTOM_DATA_TYPE_PROP_LIST: &str = "_customDataTypePropList";
    pub const BASE_SCHEMA_NAMESPACE: &str = "_baseSchemaNamespace";
    pub const BASE_SCHEMA_PREFIX: &str = "_baseSchemaPrefix";
    pub const CLASS_LABEL: &str = "_classLabel";
    pub const SUB_CLASS_OF_REL: &str = "_subClassOfRel";
    pub const DATA_TYPE_PROPERTY_LABEL: &str = "_dataTypePropertyLabel";
    pub const OBJECT_PROPERTY_LABEL: &str = "_objectPropertyLabel";
    pub const SUB_PROPERTY_OF_REL: &str = "_subPropertyOfRel";
    pub const DOMAIN_REL: &str = "_domainRel";
    pub const RANGE_REL: &str = "_rangeRel";
    /// Split off by the host and persisted as a sibling entity.
    pub const FORCIBLY_ASSIGNED_NODE_PROPERTIES: &str = "_forciblyAssignedOnImportNodeProperties";
}

/// One `(key, value)` line of the external configuration view.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigItem {
    pub key: &'static str,
    pub value: Value,
}

impl ConfigItem {
    fn new(key: &'static str, value: impl Into<Value>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// How RDF vocabulary is projected onto the property graph.
///
/// A configuration is built with [`from_properties`](Self::from_properties) or
/// [`from_stored`](Self::from_stored) and then only changed as a whole through [`add`](Self::add).
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    handle_vocab_uris: VocabUrisMode,
    handle_multival: MultivalMode,
    handle_rdf_types: RdfTypesMode,
    keep_lang_tag: bool,
    apply_neo4j_naming: bool,
    keep_custom_data_types: bool,
    multival_prop_list: Option<BTreeSet<String>>,
    custom_data_type_prop_list: Option<BTreeSet<String>>,
    base_schema_namespace: Option<String>,
    base_schema_prefix: Option<String>,
    class_label: String,
    sub_class_of_rel: String,
    data_type_property_label: String,
    object_property_label: String,
    sub_property_of_rel: String,
    domain_rel: String,
    range_rel: String,
    forcibly_assigned_node_properties: Properties,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            handle_vocab_uris: VocabUrisMode::default(),
            handle_multival: MultivalMode::default(),
            handle_rdf_types: RdfTypesMode::default(),
            keep_lang_tag: false,
            apply_neo4j_naming: false,
            keep_custom_data_types: false,
            multival_prop_list: None,
            custom_data_type_prop_list: None,
            base_schema_namespace: None,
            base_schema_prefix: None,
            class_label: DEFAULT_CLASS_LABEL.into(),
            sub_class_of_rel: DEFAULT_SUB_CLASS_OF_REL.into(),
            data_type_property_label: DEFAULT_DATA_TYPE_PROPERTY_LABEL.into(),
            object_property_label: DEFAULT_OBJECT_PROPERTY_LABEL.into(),
            sub_property_of_rel: DEFAULT_SUB_PROPERTY_OF_REL.into(),
            domain_rel: DEFAULT_DOMAIN_REL.into(),
            range_rel: DEFAULT_RANGE_REL.into(),
            forcibly_assigned_node_properties: Properties::new(),
        }
    }
}

impl GraphConfig {
    /// Builds a configuration from the external property bag.
    ///
    /// Unknown keys are ignored. An invalid `baseSchemaNamespace` or `baseSchemaPrefix` is dropped.
    ///
    /// ```
    /// use graphconf::{GraphConfig, GraphConfigError};
    /// use serde_json::json;
    ///
    /// let props = json!({"handleVocabUris": "FAST"});
    /// assert!(matches!(
    ///     GraphConfig::from_properties(props.as_object().unwrap()),
    ///     Err(GraphConfigError::InvalidParam { .. })
    /// ));
    /// ```
    pub fn from_properties(props: &Properties) -> Result<Self, GraphConfigError> {
        let mut config = Self::default();
        config.add(props)?;
        Ok(config)
    }

    /// Merges `props` into this configuration.
    ///
    /// Each recognised key overwrites its field, except the `keepLangTag`, `applyNeo4jNaming` and
    /// `keepCustomDataTypes` flags that are only ever switched on: a `false` value is ignored.
    /// On error the configuration is left untouched.
    pub fn add(&mut self, props: &Properties) -> Result<(), GraphConfigError> {
        let mut next = self.clone();
        if let Some(value) = props.get(keys::HANDLE_VOCAB_URIS) {
            next.handle_vocab_uris = parse_mode(value)?;
        }
        if let Some(value) = props.get(keys::HANDLE_MULTIVAL) {
            next.handle_multival = parse_mode(value)?;
        }
        if let Some(value) = props.get(keys::HANDLE_RDF_TYPES) {
            next.handle_rdf_types = parse_mode(value)?;
        }
        if is_true(props, keys::KEEP_LANG_TAG) {
            next.keep_lang_tag = true;
        }
        if is_true(props, keys::APPLY_NEO4J_NAMING) {
            next.apply_neo4j_naming = true;
        }
        if is_true(props, keys::KEEP_CUSTOM_DATA_TYPES) {
            next.keep_custom_data_types = true;
        }
        if let Some(value) = props.get(keys::MULTIVAL_PROP_LIST) {
            next.multival_prop_list = string_set(value);
        }
        if let Some(value) = props.get(keys::CUSTOM_DATA_TYPE_PROP_LIST) {
            next.custom_data_type_prop_list = string_set(value);
        }
        if let Some(value) = props.get(keys::BASE_SCHEMA_NAMESPACE) {
            match value.as_str() {
                Some(namespace) if is_correct_uri_split(namespace, SPLIT_PROBE) => {
                    next.base_schema_namespace = Some(namespace.into());
                }
                _ => tracing::debug!(
                    value = %value,
                    "ignoring invalid baseSchemaNamespace"
                ),
            }
        }
        if let Some(value) = props.get(keys::BASE_SCHEMA_PREFIX) {
            match value.as_str() {
                Some(prefix) if is_valid_prefix(prefix) => {
                    next.base_schema_prefix = Some(prefix.into());
                }
                _ => tracing::debug!(value = %value, "ignoring invalid baseSchemaPrefix"),
            }
        }
        for (key, field) in [
            (keys::CLASS_LABEL, &mut next.class_label),
            (keys::SUB_CLASS_OF_REL, &mut next.sub_class_of_rel),
            (keys::DATA_TYPE_PROPERTY_LABEL, &mut next.data_type_property_label),
            (keys::OBJECT_PROPERTY_LABEL, &mut next.object_property_label),
            (keys::SUB_PROPERTY_OF_REL, &mut next.sub_property_of_rel),
            (keys::DOMAIN_REL, &mut next.domain_rel),
            (keys::RANGE_REL, &mut next.range_rel),
        ] {
            if let Some(Value::String(name)) = props.get(key) {
                field.clone_from(name);
            }
        }
        if let Some(value) = props.get(keys::FORCIBLY_ASSIGNED_NODE_PROPERTIES) {
            next.forcibly_assigned_node_properties = match value {
                Value::Object(map) => map.clone(),
                _ => Properties::new(),
            };
        }
        *self = next;
        Ok(())
    }

    /// Reads back a configuration written by [`to_stored`](Self::to_stored).
    ///
    /// Missing entries fall back to their defaults. A policy code outside of its closed set fails.
    pub fn from_stored(stored: &Properties) -> Result<Self, GraphConfigError> {
        let defaults = Self::default();
        let string_or = |key: &str, default: String| {
            stored
                .get(key)
                .and_then(Value::as_str)
                .map_or(default, Into::into)
        };
        Ok(Self {
            handle_vocab_uris: decode_mode(stored, storage_keys::HANDLE_VOCAB_URIS)?,
            handle_multival: decode_mode(stored, storage_keys::HANDLE_MULTIVAL)?,
            handle_rdf_types: decode_mode(stored, storage_keys::HANDLE_RDF_TYPES)?,
            keep_lang_tag: is_true(stored, storage_keys::KEEP_LANG_TAG),
            apply_neo4j_naming: is_true(stored, storage_keys::APPLY_NEO4J_NAMING),
            keep_custom_data_types: is_true(stored, storage_keys::KEEP_CUSTOM_DATA_TYPES),
            multival_prop_list: stored
                .get(storage_keys::MULTIVAL_PROP_LIST)
                .and_then(string_set),
            custom_data_type_prop_list: stored
                .get(storage_keys::CUSTOM_DATA_TYPE_PROP_LIST)
                .and_then(string_set),
            base_schema_namespace: stored
                .get(storage_keys::BASE_SCHEMA_NAMESPACE)
                .and_then(Value::as_str)
                .map(Into::into),
            base_schema_prefix: stored
                .get(storage_keys::BASE_SCHEMA_PREFIX)
                .and_then(Value::as_str)
                .map(Into::into),
            class_label: string_or(storage_keys::CLASS_LABEL, defaults.class_label),
            sub_class_of_rel: string_or(storage_keys::SUB_CLASS_OF_REL, defaults.sub_class_of_rel),
            data_type_property_label: string_or(
                storage_keys::DATA_TYPE_PROPERTY_LABEL,
                defaults.data_type_property_label,
            ),
            object_property_label: string_or(
                storage_keys::OBJECT_PROPERTY_LABEL,
                defaults.object_property_label,
            ),
            sub_property_of_rel: string_or(
                storage_keys::SUB_PROPERTY_OF_REL,
                defaults.sub_property_of_rel,
            ),
            domain_rel: string_or(storage_keys::DOMAIN_REL, defaults.domain_rel),
            range_rel: string_or(storage_keys::RANGE_REL, defaults.range_rel),
            forcibly_assigned_node_properties: match stored
                .get(storage_keys::FORCIBLY_ASSIGNED_NODE_PROPERTIES)
            {
                Some(Value::Object(map)) => {
                    let mut map = map.clone();
                    map.remove("identity");
                    map
                }
                _ => Properties::new(),
            },
        })
    }

    /// Serialises every field under its storage key.
    ///
    /// Policies are written as integer codes and absent optional fields as `null`.
    /// The forcibly assigned node properties are nested under
    /// [`storage_keys::FORCIBLY_ASSIGNED_NODE_PROPERTIES`].
    pub fn to_stored(&self) -> Properties {
        let mut stored = Properties::new();
        stored.insert(
            storage_keys::HANDLE_VOCAB_URIS.into(),
            self.handle_vocab_uris.code().into(),
        );
        stored.insert(
            storage_keys::HANDLE_MULTIVAL.into(),
            self.handle_multival.code().into(),
        );
        stored.insert(
            storage_keys::HANDLE_RDF_TYPES.into(),
            self.handle_rdf_types.code().into(),
        );
        stored.insert(storage_keys::KEEP_LANG_TAG.into(), self.keep_lang_tag.into());
        stored.insert(
            storage_keys::KEEP_CUSTOM_DATA_TYPES.into(),
            self.keep_custom_data_types.into(),
        );
        stored.insert(
            storage_keys::APPLY_NEO4J_NAMING.into(),
            self.apply_neo4j_naming.into(),
        );
        stored.insert(
            storage_keys::MULTIVAL_PROP_LIST.into(),
            optional_set(self.multival_prop_list.as_ref()),
        );
        stored.insert(
            storage_keys::CUSTOM_DATA_TYPE_PROP_LIST.into(),
            optional_set(self.custom_data_type_prop_list.as_ref()),
        );
        stored.insert(
            storage_keys::BASE_SCHEMA_NAMESPACE.into(),
            self.base_schema_namespace.clone().into(),
        );
        stored.insert(
            storage_keys::BASE_SCHEMA_PREFIX.into(),
            self.base_schema_prefix.clone().into(),
        );
        stored.insert(storage_keys::CLASS_LABEL.into(), self.class_label.clone().into());
        stored.insert(
            storage_keys::SUB_CLASS_OF_REL.into(),
            self.sub_class_of_rel.clone().into(),
        );
        stored.insert(
            storage_keys::DATA_TYPE_PROPERTY_LABEL.into(),
            self.data_type_property_label.clone().into(),
        );
        stored.insert(
            storage_keys::OBJECT_PROPERTY_LABEL.into(),
            self.object_property_label.clone().into(),
        );
        stored.insert(
            storage_keys::SUB_PROPERTY_OF_REL.into(),
            self.sub_property_of_rel.clone().into(),
        );
        stored.insert(storage_keys::DOMAIN_REL.into(), self.domain_rel.clone().into());
        stored.insert(storage_keys::RANGE_REL.into(), self.range_rel.clone().into());
        stored.insert(
            storage_keys::FORCIBLY_ASSIGNED_NODE_PROPERTIES.into(),
            Value::Object(self.forcibly_assigned_node_properties.clone()),
        );
        stored
    }

    /// The external view: unprefixed keys, policies spelled with their canonical names,
    /// absent optional fields omitted.
    pub fn to_items(&self) -> Vec<ConfigItem> {
        let mut items = vec![
            ConfigItem::new(keys::HANDLE_VOCAB_URIS, self.handle_vocab_uris.as_str()),
            ConfigItem::new(keys::HANDLE_MULTIVAL, self.handle_multival.as_str()),
            ConfigItem::new(keys::HANDLE_RDF_TYPES, self.handle_rdf_types.as_str()),
            ConfigItem::new(keys::KEEP_LANG_TAG, self.keep_lang_tag),
        ];
        if let Some(list) = &self.multival_prop_list {
            items.push(ConfigItem::new(keys::MULTIVAL_PROP_LIST, optional_set(Some(list))));
        }
        items.push(ConfigItem::new(
            keys::KEEP_CUSTOM_DATA_TYPES,
            self.keep_custom_data_types,
        ));
        if let Some(list) = &self.custom_data_type_prop_list {
            items.push(ConfigItem::new(
                keys::CUSTOM_DATA_TYPE_PROP_LIST,
                optional_set(Some(list)),
            ));
        }
        items.push(ConfigItem::new(keys::APPLY_NEO4J_NAMING, self.apply_neo4j_naming));
        if let Some(namespace) = &self.base_schema_namespace {
            items.push(ConfigItem::new(keys::BASE_SCHEMA_NAMESPACE, namespace.as_str()));
        }
        if let Some(prefix) = &self.base_schema_prefix {
            items.push(ConfigItem::new(keys::BASE_SCHEMA_PREFIX, prefix.as_str()));
        }
        items.extend([
            ConfigItem::new(keys::CLASS_LABEL, self.class_label.as_str()),
            ConfigItem::new(keys::SUB_CLASS_OF_REL, self.sub_class_of_rel.as_str()),
            ConfigItem::new(
                keys::DATA_TYPE_PROPERTY_LABEL,
                self.data_type_property_label.as_str(),
            ),
            ConfigItem::new(keys::OBJECT_PROPERTY_LABEL, self.object_property_label.as_str()),
            ConfigItem::new(keys::SUB_PROPERTY_OF_REL, self.sub_property_of_rel.as_str()),
            ConfigItem::new(keys::DOMAIN_REL, self.domain_rel.as_str()),
            ConfigItem::new(keys::RANGE_REL, self.range_rel.as_str()),
            ConfigItem::new(
                keys::FORCIBLY_ASSIGNED_NODE_PROPERTIES,
                Value::Object(self.forcibly_assigned_node_properties.clone()),
            ),
        ]);
        items
    }

    /// RDF if nodes are URI-identified resources, LPG otherwise.
    pub fn graph_mode(&self) -> GraphMode {
        self.handle_vocab_uris.graph_mode()
    }

    pub fn handle_vocab_uris(&self) -> VocabUrisMode {
        self.handle_vocab_uris
    }

    pub fn handle_multival(&self) -> MultivalMode {
        self.handle_multival
    }

    pub fn handle_rdf_types(&self) -> RdfTypesMode {
        self.handle_rdf_types
    }

    pub fn keep_lang_tag(&self) -> bool {
        self.keep_lang_tag
    }

    pub fn apply_neo4j_naming(&self) -> bool {
        self.apply_neo4j_naming
    }

    pub fn keep_custom_data_types(&self) -> bool {
        self.keep_custom_data_types
    }

    /// Properties that keep every value when `handleMultival` is `ARRAY`.
    pub fn multival_prop_list(&self) -> Option<&BTreeSet<String>> {
        self.multival_prop_list.as_ref()
    }

    pub fn custom_data_type_prop_list(&self) -> Option<&BTreeSet<String>> {
        self.custom_data_type_prop_list.as_ref()
    }

    /// The configured schema namespace or [`DEFAULT_BASE_SCHEMA_NAMESPACE`].
    pub fn base_schema_namespace(&self) -> &str {
        self.base_schema_namespace
            .as_deref()
            .unwrap_or(DEFAULT_BASE_SCHEMA_NAMESPACE)
    }

    /// The configured schema prefix or [`DEFAULT_BASE_SCHEMA_PREFIX`].
    pub fn base_schema_prefix(&self) -> &str {
        self.base_schema_prefix
            .as_deref()
            .unwrap_or(DEFAULT_BASE_SCHEMA_PREFIX)
    }

    pub fn class_label(&self) -> &str {
        &self.class_label
    }

    pub fn sub_class_of_rel(&self) -> &str {
        &self.sub_class_of_rel
    }

    pub fn data_type_property_label(&self) -> &str {
        &self.data_type_property_label
    }

    pub fn object_property_label(&self) -> &str {
        &self.object_property_label
    }

    pub fn sub_property_of_rel(&self) -> &str {
        &self.sub_property_of_rel
    }

    pub fn domain_rel(&self) -> &str {
        &self.domain_rel
    }

    pub fn range_rel(&self) -> &str {
        &self.range_rel
    }

    /// Properties set on every node created by an import.
    pub fn forcibly_assigned_node_properties(&self) -> &Properties {
        &self.forcibly_assigned_node_properties
    }
}

fn parse_mode<M: Policy>(value: &Value) -> Result<M, GraphConfigError> {
    match value {
        Value::String(name) => name.parse(),
        other => Err(GraphConfigError::invalid_param(M::PARAM, other.to_string())),
    }
}

fn decode_mode<M: Policy>(stored: &Properties, key: &str) -> Result<M, GraphConfigError> {
    match stored.get(key) {
        None | Some(Value::Null) => Ok(M::default()),
        Some(value) => value
            .as_i64()
            .and_then(M::decode)
            .ok_or_else(|| GraphConfigError::invalid_param(M::PARAM, value.to_string())),
    }
}

fn is_true(props: &Properties, key: &str) -> bool {
    matches!(props.get(key), Some(Value::Bool(true)))
}

fn string_set(value: &Value) -> Option<BTreeSet<String>> {
    match value {
        Value::Array(values) => Some(
            values
                .iter()
                .filter_map(|v| v.as_str().map(Into::into))
                .collect(),
        ),
        _ => None,
    }
}

fn optional_set(set: Option<&BTreeSet<String>>) -> Value {
    set.map_or(Value::Null, |set| {
        Value::Array(set.iter().map(|s| Value::String(s.clone())).collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn defaults() {
        let config = GraphConfig::from_properties(&Properties::new()).unwrap();
        assert_eq!(config, GraphConfig::default());
        assert_eq!(config.handle_vocab_uris(), VocabUrisMode::Shorten);
        assert_eq!(config.handle_multival(), MultivalMode::Overwrite);
        assert_eq!(config.handle_rdf_types(), RdfTypesMode::Labels);
        assert_eq!(config.graph_mode(), GraphMode::Rdf);
        assert_eq!(config.base_schema_namespace(), DEFAULT_BASE_SCHEMA_NAMESPACE);
        assert_eq!(config.base_schema_prefix(), DEFAULT_BASE_SCHEMA_PREFIX);
        assert_eq!(config.class_label(), "Class");
        assert_eq!(config.sub_class_of_rel(), "SCO");
        assert_eq!(config.data_type_property_label(), "Property");
        assert_eq!(config.object_property_label(), "Relationship");
        assert_eq!(config.sub_property_of_rel(), "SPO");
        assert_eq!(config.domain_rel(), "DOMAIN");
        assert_eq!(config.range_rel(), "RANGE");
        assert!(config.multival_prop_list().is_none());
        assert!(config.forcibly_assigned_node_properties().is_empty());
    }

    #[test]
    fn parses_all_fields() {
        let config = GraphConfig::from_properties(&props(json!({
            "handleVocabUris": "KEEP",
            "handleMultival": "ARRAY",
            "handleRDFTypes": "LABELS_AND_NODES",
            "keepLangTag": true,
            "applyNeo4jNaming": true,
            "keepCustomDataTypes": true,
            "multivalPropList": ["http://ex.org/a", "http://ex.org/b"],
            "customDataTypePropList": ["http://ex.org/c"],
            "baseSchemaNamespace": "http://ex.org/schema#",
            "baseSchemaPrefix": "exs",
            "classLabel": "Cls",
            "subClassOfRel": "SUB",
            "forciblyAssignedOnImportNodeProperties": {"source": "import"},
            "somethingElse": 42
        })))
        .unwrap();
        assert_eq!(config.handle_vocab_uris(), VocabUrisMode::Keep);
        assert_eq!(config.handle_multival(), MultivalMode::Array);
        assert_eq!(config.handle_rdf_types(), RdfTypesMode::LabelsAndNodes);
        assert!(config.keep_lang_tag() && config.apply_neo4j_naming());
        assert!(config.keep_custom_data_types());
        assert_eq!(config.multival_prop_list().map(BTreeSet::len), Some(2));
        assert_eq!(config.base_schema_namespace(), "http://ex.org/schema#");
        assert_eq!(config.base_schema_prefix(), "exs");
        assert_eq!(config.class_label(), "Cls");
        assert_eq!(config.sub_class_of_rel(), "SUB");
        assert_eq!(
            config.forcibly_assigned_node_properties().get("source"),
            Some(&json!("import"))
        );
    }

    #[test]
    fn invalid_base_schema_entries_are_dropped() {
        let config = GraphConfig::from_properties(&props(json!({
            "baseSchemaNamespace": "not a namespace",
            "baseSchemaPrefix": "9lives"
        })))
        .unwrap();
        assert_eq!(config, GraphConfig::default());
        assert_eq!(config.base_schema_namespace(), DEFAULT_BASE_SCHEMA_NAMESPACE);
        assert_eq!(config.base_schema_prefix(), DEFAULT_BASE_SCHEMA_PREFIX);
    }

    #[test]
    fn invalid_mode_names_the_field() {
        for (key, value) in [
            ("handleVocabUris", json!("FAST")),
            ("handleMultival", json!("REIFY")),
            ("handleRDFTypes", json!(1)),
        ] {
            let mut bag = Properties::new();
            bag.insert(key.into(), value);
            match GraphConfig::from_properties(&bag) {
                Err(GraphConfigError::InvalidParam { param, .. }) => assert_eq!(param, key),
                other => panic!("unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn add_is_atomic() {
        let mut config =
            GraphConfig::from_properties(&props(json!({"handleRDFTypes": "NODES"}))).unwrap();
        let before = config.clone();
        let result = config.add(&props(json!({
            "classLabel": "Changed",
            "handleVocabUris": "nope"
        })));
        assert!(result.is_err());
        assert_eq!(config, before);
    }

    #[test]
    fn add_only_switches_flags_on() {
        let mut config =
            GraphConfig::from_properties(&props(json!({"keepLangTag": true}))).unwrap();
        config
            .add(&props(json!({"keepLangTag": false, "applyNeo4jNaming": true})))
            .unwrap();
        assert!(config.keep_lang_tag());
        assert!(config.apply_neo4j_naming());
        assert!(!config.keep_custom_data_types());
    }

    #[test]
    fn add_overwrites_recognised_keys() {
        let mut config = GraphConfig::from_properties(&props(json!({
            "multivalPropList": ["http://ex.org/a"],
            "forciblyAssignedOnImportNodeProperties": {"a": 1}
        })))
        .unwrap();
        config
            .add(&props(json!({
                "handleVocabUris": "IGNORE",
                "multivalPropList": null,
                "rangeRel": "RNG",
                "forciblyAssignedOnImportNodeProperties": null
            })))
            .unwrap();
        assert_eq!(config.graph_mode(), GraphMode::Lpg);
        assert!(config.multival_prop_list().is_none());
        assert_eq!(config.range_rel(), "RNG");
        assert!(config.forcibly_assigned_node_properties().is_empty());
    }

    #[test]
    fn stored_round_trip() {
        let configs = [
            GraphConfig::default(),
            GraphConfig::from_properties(&props(json!({
                "handleVocabUris": "MAP",
                "handleMultival": "ARRAY",
                "handleRDFTypes": "NODES",
                "keepCustomDataTypes": true,
                "multivalPropList": [],
                "customDataTypePropList": ["http://ex.org/x"],
                "baseSchemaNamespace": "urn:schema:",
                "baseSchemaPrefix": "sch",
                "domainRel": "DOM",
                "forciblyAssignedOnImportNodeProperties": {"batch": 3, "tags": ["a", "b"]}
            })))
            .unwrap(),
        ];
        for config in configs {
            let stored = config.to_stored();
            assert_eq!(GraphConfig::from_stored(&stored).unwrap(), config);
        }
    }

    #[test]
    fn stored_policies_are_codes() {
        let config = GraphConfig::from_properties(&props(json!({
            "handleVocabUris": "KEEP",
            "handleRDFTypes": "LABELS_AND_NODES"
        })))
        .unwrap();
        let stored = config.to_stored();
        assert_eq!(stored.get("_handleVocabUris"), Some(&json!(4)));
        assert_eq!(stored.get("_handleMultival"), Some(&json!(0)));
        assert_eq!(stored.get("_handleRDFTypes"), Some(&json!(2)));
        assert_eq!(stored.get("_baseSchemaNamespace"), Some(&Value::Null));
        assert!(stored.keys().all(|k| k.starts_with('_')));
    }

    #[test]
    fn stored_unknown_code_is_invalid() {
        let mut stored = GraphConfig::default().to_stored();
        stored.insert("_handleRDFTypes".into(), json!(9));
        assert!(matches!(
            GraphConfig::from_stored(&stored),
            Err(GraphConfigError::InvalidParam { ref param, .. }) if param == "handleRDFTypes"
        ));
    }

    #[test]
    fn items_view() {
        let config = GraphConfig::from_properties(&props(json!({
            "handleVocabUris": "IGNORE",
            "handleRDFTypes": "NODES",
            "baseSchemaPrefix": "sch"
        })))
        .unwrap();
        let items = config.to_items();
        let keys: Vec<_> = items.iter().map(|i| i.key).collect();
        assert_eq!(
            keys,
            [
                "handleVocabUris",
                "handleMultival",
                "handleRDFTypes",
                "keepLangTag",
                "keepCustomDataTypes",
                "applyNeo4jNaming",
                "baseSchemaPrefix",
                "classLabel",
                "subClassOfRel",
                "dataTypePropertyLabel",
                "objectPropertyLabel",
                "subPropertyOfRel",
                "domainRel",
                "rangeRel",
                "forciblyAssignedOnImportNodeProperties",
            ]
        );
        assert_eq!(items[0].value, json!("IGNORE"));
        assert_eq!(items[2].value, json!("NODES"));
    }
}
