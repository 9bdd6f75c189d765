//! The flat constraint records extracted from a shapes graph.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

/// Separator of accumulated multi-valued facets.
pub const VALUE_SEPARATOR: &str = "---";

/// Value of [`ConstraintRecord::constraint_type`] for closed node shapes.
pub const CLOSED_DEFINITION_PROP_LIST: &str = "closedDefinitionPropList";

/// Prefix of the synthetic IRIs given to blank node shapes.
pub const BNODE_PREFIX: &str = "bnode://id/";

/// A raw constraint record: every facet of one `(shape, target class)` pair.
///
/// Three flavours of records are produced by the [`ShapesParser`](crate::ShapesParser):
/// property shape records (with an [`item`](Self::item) path),
/// closed node shape records (with [`constraint_type`](Self::constraint_type) set to
/// [`CLOSED_DEFINITION_PROP_LIST`]) and node-level class records
/// ([`req_class`](Self::req_class) and [`disjoint_class`](Self::disjoint_class)).
///
/// Records (de)serialise with the key names of the host API.
/// Multi-valued facets may be given either as lists or as a single string joined with [`VALUE_SEPARATOR`].
///
/// ```
/// use cyshacl::ConstraintRecord;
///
/// let record: ConstraintRecord = serde_json::from_str(
///     r#"{"appliesToCat": "http://example.org/Person", "item": "http://example.org/status",
///         "inUris": "http://example.org/Active---http://example.org/Retired"}"#,
/// )?;
/// assert_eq!(record.in_uris.as_ref().map(Vec::len), Some(2));
/// # Result::<_, serde_json::Error>::Ok(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintRecord {
    pub item: Option<String>,
    pub inverse: bool,
    pub applies_to_cat: Option<String>,
    pub range_type: Option<String>,
    pub range_kind: Option<String>,
    pub data_type: Option<String>,
    pub pattern: Option<String>,
    pub min_count: Option<i64>,
    pub max_count: Option<i64>,
    pub min_inc: Option<Number>,
    pub min_exc: Option<Number>,
    pub max_inc: Option<Number>,
    pub max_exc: Option<Number>,
    #[serde(deserialize_with = "joined_values")]
    pub has_value_literal: Option<Vec<String>>,
    #[serde(deserialize_with = "joined_values")]
    pub has_value_uri: Option<Vec<String>>,
    #[serde(deserialize_with = "joined_values")]
    pub in_literals: Option<Vec<String>>,
    #[serde(deserialize_with = "joined_values")]
    pub in_uris: Option<Vec<String>>,
    pub min_str_len: Option<i64>,
    pub max_str_len: Option<i64>,
    pub prop_shape_uid: Option<String>,
    pub severity: Option<String>,
    pub constraint_type: Option<String>,
    pub node_shape_uid: Option<String>,
    #[serde(deserialize_with = "joined_values")]
    pub defined_props: Option<Vec<String>>,
    #[serde(deserialize_with = "joined_values")]
    pub ignored_props: Option<Vec<String>>,
    #[serde(deserialize_with = "joined_values")]
    pub req_class: Option<Vec<String>>,
    #[serde(deserialize_with = "joined_values")]
    pub disjoint_class: Option<Vec<String>>,
}

impl ConstraintRecord {
    /// Whether this record describes the allow-list of a closed node shape.
    pub fn is_closed_definition(&self) -> bool {
        self.constraint_type.as_deref() == Some(CLOSED_DEFINITION_PROP_LIST)
    }

    /// The id of the shape the record comes from.
    pub fn shape_uid(&self) -> Option<&str> {
        self.prop_shape_uid
            .as_deref()
            .or(self.node_shape_uid.as_deref())
    }
}

/// Splits accumulated values.
pub fn split_values(joined: &str) -> Vec<String> {
    joined
        .split(VALUE_SEPARATOR)
        .filter(|v| !v.is_empty())
        .map(Into::into)
        .collect()
}

fn joined_values<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Values {
        Joined(String),
        List(Vec<String>),
    }

    Ok(
        Option::<Values>::deserialize(deserializer)?.map(|values| match values {
            Values::Joined(joined) => split_values(&joined),
            Values::List(list) => list,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split() {
        assert_eq!(split_values("a---b"), ["a", "b"]);
        assert!(split_values("").is_empty());
    }

    #[test]
    fn deserialize_host_keys() {
        let record: ConstraintRecord = serde_json::from_value(json!({
            "item": "http://example.org/knows",
            "inverse": true,
            "appliesToCat": "http://example.org/Person",
            "minCount": 1,
            "minInc": 2.5,
            "hasValueLiteral": ["x", "y"],
            "ignoredProps": "",
            "propShapeUid": "bnode://id/b1",
            "unknownKey": 3
        }))
        .unwrap();
        assert!(record.inverse);
        assert_eq!(record.min_count, Some(1));
        assert_eq!(record.min_inc.as_ref().and_then(Number::as_f64), Some(2.5));
        assert_eq!(
            record.has_value_literal.as_deref(),
            Some(&["x".to_owned(), "y".to_owned()][..])
        );
        assert_eq!(record.ignored_props.as_deref(), Some(&[][..]));
        assert_eq!(record.shape_uid(), Some("bnode://id/b1"));
        assert!(!record.is_closed_definition());
    }

    #[test]
    fn closed_definition() {
        let record = ConstraintRecord {
            constraint_type: Some(CLOSED_DEFINITION_PROP_LIST.into()),
            node_shape_uid: Some("http://example.org/S".into()),
            ..ConstraintRecord::default()
        };
        assert!(record.is_closed_definition());
        assert_eq!(record.shape_uid(), Some("http://example.org/S"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["constraintType"], json!("closedDefinitionPropList"));
        assert_eq!(json["nodeShapeUid"], json!("http://example.org/S"));
    }
}
