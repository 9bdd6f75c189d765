//! Typed constraint model.
//!
//! A [`ConstraintRecord`] is lowered into a [`ConstraintSet`]: a small [`ConstraintHeader`]
//! shared by all the facets of the record and one [`Constraint`] per facet.

use crate::record::ConstraintRecord;
use crate::vocab::sh;
use graphconf::GraphMode;
use oxrdf::NamedNodeRef;
use oxrdf::vocab::rdf;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;

/// Severity of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Violation,
    Warning,
    Info,
}

impl Severity {
    pub fn iri(self) -> NamedNodeRef<'static> {
        match self {
            Self::Violation => sh::VIOLATION,
            Self::Warning => sh::WARNING,
            Self::Info => sh::INFO,
        }
    }

    pub fn from_iri(iri: &str) -> Option<Self> {
        [Self::Violation, Self::Warning, Self::Info]
            .into_iter()
            .find(|s| s.iri().as_str() == iri)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.iri().as_str())
    }
}

/// Value of `sh:nodeKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    BlankNode,
    Iri,
    Literal,
    BlankNodeOrIri,
    BlankNodeOrLiteral,
    IriOrLiteral,
}

impl NodeKind {
    const ALL: [Self; 6] = [
        Self::BlankNode,
        Self::Iri,
        Self::Literal,
        Self::BlankNodeOrIri,
        Self::BlankNodeOrLiteral,
        Self::IriOrLiteral,
    ];

    pub fn iri(self) -> NamedNodeRef<'static> {
        match self {
            Self::BlankNode => sh::BLANK_NODE,
            Self::Iri => sh::IRI,
            Self::Literal => sh::LITERAL,
            Self::BlankNodeOrIri => sh::BLANK_NODE_OR_IRI,
            Self::BlankNodeOrLiteral => sh::BLANK_NODE_OR_LITERAL,
            Self::IriOrLiteral => sh::IRI_OR_LITERAL,
        }
    }

    pub fn from_iri(iri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.iri().as_str() == iri)
    }
}

/// The kinds of compiled constraints, named after their SHACL parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintKind {
    Datatype,
    HasValue,
    NodeKind,
    Class,
    In,
    Pattern,
    MinCount,
    MaxCount,
    MinLength,
    MaxLength,
    MinInclusive,
    MaxInclusive,
    MinExclusive,
    MaxExclusive,
    IgnoredProperties,
    Not,
}

impl ConstraintKind {
    /// The SHACL parameter, e.g. `sh:minCount`.
    pub fn parameter(self) -> NamedNodeRef<'static> {
        match self {
            Self::Datatype => sh::DATATYPE,
            Self::HasValue => sh::HAS_VALUE,
            Self::NodeKind => sh::NODE_KIND,
            Self::Class => sh::CLASS,
            Self::In => sh::IN,
            Self::Pattern => sh::PATTERN,
            Self::MinCount => sh::MIN_COUNT,
            Self::MaxCount => sh::MAX_COUNT,
            Self::MinLength => sh::MIN_LENGTH,
            Self::MaxLength => sh::MAX_LENGTH,
            Self::MinInclusive => sh::MIN_INCLUSIVE,
            Self::MaxInclusive => sh::MAX_INCLUSIVE,
            Self::MinExclusive => sh::MIN_EXCLUSIVE,
            Self::MaxExclusive => sh::MAX_EXCLUSIVE,
            Self::IgnoredProperties => sh::IGNORED_PROPERTIES,
            Self::Not => sh::NOT,
        }
    }

    /// The local name of the SHACL parameter, e.g. `minCount`.
    pub fn local_name(self) -> &'static str {
        let iri = self.parameter().as_str();
        &iri[sh::NAMESPACE.len()..]
    }

    /// The name under which the kind is listed in the constraint inventory:
    /// `sh:minCount` for RDF graphs, `minCount` otherwise.
    ///
    /// ```
    /// use cyshacl::ConstraintKind;
    /// use graphconf::GraphMode;
    ///
    /// assert_eq!(ConstraintKind::HasValue.kind_name(GraphMode::Rdf), "sh:hasValue");
    /// assert_eq!(ConstraintKind::HasValue.kind_name(GraphMode::Lpg), "hasValue");
    /// ```
    pub fn kind_name(self, mode: GraphMode) -> String {
        match mode {
            GraphMode::Rdf => format!("sh:{}", self.local_name()),
            GraphMode::Lpg => self.local_name().into(),
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.local_name())
    }
}

/// A single step path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub iri: String,
    /// `sh:inversePath`
    pub inverse: bool,
}

impl PathStep {
    /// Whether the path is `rdf:type`.
    pub fn is_rdf_type(&self) -> bool {
        self.iri == rdf::TYPE.as_str()
    }
}

/// What is shared by all the constraints of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintHeader {
    /// IRI of the targeted class.
    pub focus_class: String,
    /// `None` for node-level constraints.
    pub path: Option<PathStep>,
    pub severity: Severity,
    pub shape_uid: String,
}

impl ConstraintHeader {
    pub fn is_on_type(&self) -> bool {
        self.path.as_ref().is_some_and(PathStep::is_rdf_type)
    }

    pub fn is_inverse(&self) -> bool {
        self.path.as_ref().is_some_and(|p| p.inverse)
    }
}

/// Numeric bounds of a value range, each kept with its literal's numeric kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRange {
    pub min_inclusive: Option<Number>,
    pub min_exclusive: Option<Number>,
    pub max_inclusive: Option<Number>,
    pub max_exclusive: Option<Number>,
}

impl ValueRange {
    pub fn is_empty(&self) -> bool {
        self.min_inclusive.is_none()
            && self.min_exclusive.is_none()
            && self.max_inclusive.is_none()
            && self.max_exclusive.is_none()
    }

    /// The lower bound, the inclusive one winning.
    pub fn lower(&self) -> Option<(&Number, bool)> {
        self.min_inclusive
            .as_ref()
            .map(|n| (n, true))
            .or_else(|| self.min_exclusive.as_ref().map(|n| (n, false)))
    }

    /// The upper bound, the inclusive one winning.
    pub fn upper(&self) -> Option<(&Number, bool)> {
        self.max_inclusive
            .as_ref()
            .map(|n| (n, true))
            .or_else(|| self.max_exclusive.as_ref().map(|n| (n, false)))
    }

    /// Every bound that is set, with its kind.
    pub fn bounds(&self) -> impl Iterator<Item = (ConstraintKind, &Number)> {
        [
            (ConstraintKind::MinInclusive, &self.min_inclusive),
            (ConstraintKind::MaxInclusive, &self.max_inclusive),
            (ConstraintKind::MinExclusive, &self.min_exclusive),
            (ConstraintKind::MaxExclusive, &self.max_exclusive),
        ]
        .into_iter()
        .filter_map(|(kind, bound)| Some((kind, bound.as_ref()?)))
    }
}

/// One constraint of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// `sh:datatype` IRI.
    Datatype(String),
    /// IRIs of `sh:hasValue`.
    HasValueUris(Vec<String>),
    /// Lexical forms of `sh:hasValue`.
    HasValueLiterals(Vec<String>),
    NodeKind(NodeKind),
    /// `sh:class` IRI.
    Class(String),
    InLiterals(Vec<String>),
    InUris(Vec<String>),
    Pattern(String),
    MinCount(i64),
    MaxCount(i64),
    Length { min: Option<i64>, max: Option<i64> },
    Range(ValueRange),
    /// Allow-list of a closed node shape.
    Closed {
        defined: Vec<String>,
        ignored: Vec<String>,
    },
    /// Classes of `sh:not [ sh:class ... ]`.
    Disjoint(Vec<String>),
    /// Node-level `sh:class`.
    RequiredClasses(Vec<String>),
}

impl Constraint {
    /// The kind of the queries compiled from this constraint.
    ///
    /// Length and range constraints are tagged with their first bound.
    pub fn kind(&self) -> Option<ConstraintKind> {
        Some(match self {
            Self::Datatype(_) => ConstraintKind::Datatype,
            Self::HasValueUris(_) | Self::HasValueLiterals(_) => ConstraintKind::HasValue,
            Self::NodeKind(_) => ConstraintKind::NodeKind,
            Self::Class(_) => ConstraintKind::Class,
            Self::InLiterals(_) | Self::InUris(_) => ConstraintKind::In,
            Self::Pattern(_) => ConstraintKind::Pattern,
            Self::MinCount(_) => ConstraintKind::MinCount,
            Self::MaxCount(_) => ConstraintKind::MaxCount,
            Self::Length { min, .. } => {
                if min.is_some() {
                    ConstraintKind::MinLength
                } else {
                    ConstraintKind::MaxLength
                }
            }
            Self::Range(range) => range.bounds().next()?.0,
            Self::Closed { .. } => ConstraintKind::IgnoredProperties,
            Self::Disjoint(_) => ConstraintKind::Not,
            Self::RequiredClasses(_) => return None,
        })
    }
}

/// The typed form of a [`ConstraintRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSet {
    pub header: ConstraintHeader,
    /// In compilation order.
    pub constraints: Vec<Constraint>,
}

impl ConstraintSet {
    /// Lowers a record.
    ///
    /// Returns `None` if the record has no target class.
    /// Facets with unknown or empty values are left out.
    pub fn from_record(record: &ConstraintRecord) -> Option<Self> {
        let focus_class = record.applies_to_cat.clone()?;
        let header = ConstraintHeader {
            focus_class,
            path: record.item.as_ref().map(|iri| PathStep {
                iri: iri.clone(),
                inverse: record.inverse,
            }),
            severity: record
                .severity
                .as_deref()
                .and_then(|iri| {
                    let severity = Severity::from_iri(iri);
                    if severity.is_none() {
                        tracing::debug!(
                            severity = iri,
                            "unknown sh:severity, using sh:Violation"
                        );
                    }
                    severity
                })
                .unwrap_or_default(),
            shape_uid: record.shape_uid().unwrap_or_default().into(),
        };

        let mut constraints = Vec::new();
        if let Some(datatype) = &record.data_type {
            constraints.push(Constraint::Datatype(datatype.clone()));
        }
        if let Some(uris) = non_empty(&record.has_value_uri) {
            constraints.push(Constraint::HasValueUris(uris));
        }
        if let Some(literals) = non_empty(&record.has_value_literal) {
            constraints.push(Constraint::HasValueLiterals(literals));
        }
        if let Some(kind) = &record.range_kind {
            match NodeKind::from_iri(kind) {
                Some(kind) => constraints.push(Constraint::NodeKind(kind)),
                None => tracing::debug!(node_kind = %kind, "ignoring unknown sh:nodeKind"),
            }
        }
        if let Some(class) = record.range_type.as_ref().filter(|c| !c.is_empty()) {
            constraints.push(Constraint::Class(class.clone()));
        }
        if let Some(literals) = non_empty(&record.in_literals) {
            constraints.push(Constraint::InLiterals(literals));
        }
        if let Some(uris) = non_empty(&record.in_uris) {
            constraints.push(Constraint::InUris(uris));
        }
        if let Some(pattern) = &record.pattern {
            constraints.push(Constraint::Pattern(pattern.clone()));
        }
        if let Some(min) = record.min_count {
            constraints.push(Constraint::MinCount(min));
        }
        if let Some(max) = record.max_count {
            constraints.push(Constraint::MaxCount(max));
        }
        if record.min_str_len.is_some() || record.max_str_len.is_some() {
            constraints.push(Constraint::Length {
                min: record.min_str_len,
                max: record.max_str_len,
            });
        }
        let range = ValueRange {
            min_inclusive: record.min_inc.clone(),
            min_exclusive: record.min_exc.clone(),
            max_inclusive: record.max_inc.clone(),
            max_exclusive: record.max_exc.clone(),
        };
        if !range.is_empty() {
            constraints.push(Constraint::Range(range));
        }
        if record.is_closed_definition() {
            constraints.push(Constraint::Closed {
                defined: record.defined_props.clone().unwrap_or_default(),
                ignored: record.ignored_props.clone().unwrap_or_default(),
            });
        }
        if let Some(classes) = non_empty(&record.disjoint_class) {
            constraints.push(Constraint::Disjoint(classes));
        }
        if let Some(classes) = non_empty(&record.req_class) {
            constraints.push(Constraint::RequiredClasses(classes));
        }
        Some(Self {
            header,
            constraints,
        })
    }
}

fn non_empty(values: &Option<Vec<String>>) -> Option<Vec<String>> {
    values.as_ref().filter(|v| !v.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CLOSED_DEFINITION_PROP_LIST;

    #[test]
    fn kind_names() {
        assert_eq!(ConstraintKind::Datatype.local_name(), "datatype");
        assert_eq!(
            ConstraintKind::IgnoredProperties.kind_name(GraphMode::Rdf),
            "sh:ignoredProperties"
        );
        assert_eq!(ConstraintKind::MinExclusive.kind_name(GraphMode::Lpg), "minExclusive");
        assert_eq!(
            serde_json::to_value(ConstraintKind::MaxCount).unwrap(),
            serde_json::json!("maxCount")
        );
    }

    #[test]
    fn severity_and_node_kind() {
        assert_eq!(
            Severity::from_iri("http://www.w3.org/ns/shacl#Warning"),
            Some(Severity::Warning)
        );
        assert_eq!(Severity::from_iri("http://example.org/Fatal"), None);
        assert_eq!(
            NodeKind::from_iri("http://www.w3.org/ns/shacl#BlankNodeOrIRI"),
            Some(NodeKind::BlankNodeOrIri)
        );
    }

    #[test]
    fn lowers_property_record() {
        let record = ConstraintRecord {
            item: Some("http://example.org/age".into()),
            applies_to_cat: Some("http://example.org/Person".into()),
            data_type: Some("http://www.w3.org/2001/XMLSchema#integer".into()),
            range_kind: Some("http://example.org/NotAKind".into()),
            range_type: Some(String::new()),
            min_count: Some(1),
            max_str_len: Some(3),
            max_exc: Some(Number::from(150)),
            has_value_uri: Some(Vec::new()),
            severity: Some("http://example.org/Fatal".into()),
            prop_shape_uid: Some("http://example.org/AgeShape".into()),
            ..ConstraintRecord::default()
        };
        let set = ConstraintSet::from_record(&record).unwrap();
        assert_eq!(set.header.severity, Severity::Violation);
        assert_eq!(set.header.shape_uid, "http://example.org/AgeShape");
        assert!(!set.header.is_on_type());
        let kinds: Vec<_> = set.constraints.iter().filter_map(Constraint::kind).collect();
        assert_eq!(
            kinds,
            [
                ConstraintKind::Datatype,
                ConstraintKind::MinCount,
                ConstraintKind::MaxLength,
                ConstraintKind::MaxExclusive
            ]
        );
    }

    #[test]
    fn lowers_node_records() {
        let closed = ConstraintRecord {
            applies_to_cat: Some("http://example.org/T".into()),
            constraint_type: Some(CLOSED_DEFINITION_PROP_LIST.into()),
            node_shape_uid: Some("http://example.org/TShape".into()),
            defined_props: Some(vec!["http://example.org/a".into()]),
            ..ConstraintRecord::default()
        };
        let set = ConstraintSet::from_record(&closed).unwrap();
        assert!(set.header.path.is_none());
        assert_eq!(
            set.constraints,
            [Constraint::Closed {
                defined: vec!["http://example.org/a".into()],
                ignored: Vec::new()
            }]
        );

        let untargeted = ConstraintRecord {
            disjoint_class: Some(vec!["http://example.org/U".into()]),
            ..ConstraintRecord::default()
        };
        assert!(ConstraintSet::from_record(&untargeted).is_none());
    }
}
