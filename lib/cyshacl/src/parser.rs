//! Extraction of [`ConstraintRecord`]s from a SHACL shapes graph.

use crate::error::ShapesParseError;
use crate::record::{BNODE_PREFIX, CLOSED_DEFINITION_PROP_LIST, ConstraintRecord};
use crate::vocab::sh;
use graphconf::Properties;
use oxrdf::vocab::{rdf, rdfs, xsd};
use oxrdf::{BlankNode, Graph, NamedNodeRef, NamedOrBlankNode, Term, TermRef, Triple};
use oxrdfio::{RdfFormat, RdfParser};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Number, Value};
use std::io::Read;
use tracing::debug;

const DEFAULT_BASE_IRI: &str = "http://neo4j.com/base/";

/// Options of the [`ShapesParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapesParserOptions {
    /// If `false`, IRIs are not validated while reading the document.
    pub verify_uri_syntax: bool,
    /// Base IRI used to resolve relative IRIs of the document.
    pub base_iri: String,
}

impl Default for ShapesParserOptions {
    fn default() -> Self {
        Self {
            verify_uri_syntax: true,
            base_iri: DEFAULT_BASE_IRI.into(),
        }
    }
}

impl ShapesParserOptions {
    /// Reads the `verifyUriSyntax` and `baseIri` keys, other keys are ignored.
    ///
    /// ```
    /// use cyshacl::ShapesParserOptions;
    /// use serde_json::json;
    ///
    /// let properties = json!({"verifyUriSyntax": false});
    /// let options = ShapesParserOptions::from_properties(properties.as_object().unwrap());
    /// assert!(!options.verify_uri_syntax);
    /// assert_eq!(options.base_iri, "http://neo4j.com/base/");
    /// ```
    pub fn from_properties(properties: &Properties) -> Self {
        let mut options = Self::default();
        if let Some(verify) = properties.get("verifyUriSyntax").and_then(Value::as_bool) {
            options.verify_uri_syntax = verify;
        }
        if let Some(base_iri) = properties.get("baseIri").and_then(Value::as_str) {
            options.base_iri = base_iri.into();
        }
        options
    }
}

/// Reads a SHACL shapes document into [`ConstraintRecord`]s.
///
/// Three kinds of records are extracted:
/// * one per property shape and target class, with all the facets of the property shape,
/// * one per closed node shape and target class, with the allowed properties,
/// * one per node shape with `sh:class` or `sh:not [ sh:class ]` and target class.
///
/// Blank nodes are relabelled by order of appearance and the records are sorted,
/// so the same document always yields the same records.
///
/// ```
/// use cyshacl::{ShapesParser, ShapesParserOptions};
/// use oxrdfio::RdfFormat;
///
/// let shapes = r#"
/// @prefix sh: <http://www.w3.org/ns/shacl#> .
/// @prefix ex: <http://example.org/> .
/// ex:PersonShape a sh:NodeShape ;
///     sh:targetClass ex:Person ;
///     sh:property [ sh:path ex:name ; sh:minCount 1 ] .
/// "#;
/// let records = ShapesParser::new(ShapesParserOptions::default())
///     .parse(shapes.as_bytes(), RdfFormat::Turtle)?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].item.as_deref(), Some("http://example.org/name"));
/// assert_eq!(records[0].min_count, Some(1));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct ShapesParser {
    options: ShapesParserOptions,
}

impl ShapesParser {
    pub fn new(options: ShapesParserOptions) -> Self {
        Self { options }
    }

    /// Parses the document and extracts its records.
    pub fn parse(
        &self,
        reader: impl Read,
        format: RdfFormat,
    ) -> Result<Vec<ConstraintRecord>, ShapesParseError> {
        let graph = self.read_graph(reader, format)?;
        Ok(Self::records_from_graph(&graph))
    }

    /// Loads the document into a single graph, merging the named graphs and relabelling blank nodes.
    pub fn read_graph(
        &self,
        reader: impl Read,
        format: RdfFormat,
    ) -> Result<Graph, ShapesParseError> {
        let mut parser = RdfParser::from_format(format).with_base_iri(&self.options.base_iri)?;
        if !self.options.verify_uri_syntax {
            parser = parser.lenient();
        }
        let mut labels = BlankNodeLabels::default();
        let mut graph = Graph::new();
        for quad in parser.for_reader(reader) {
            let quad = quad?;
            let triple = Triple::new(
                labels.subject(quad.subject),
                quad.predicate,
                labels.term(quad.object),
            );
            graph.insert(&triple);
        }
        debug!(triples = graph.len(), "shapes document loaded");
        Ok(graph)
    }

    /// Extracts the records of an already loaded shapes graph.
    pub fn records_from_graph(graph: &Graph) -> Vec<ConstraintRecord> {
        let mut records = property_shape_records(graph);
        records.extend(closed_shape_records(graph));
        records.extend(class_records(graph));
        debug!(records = records.len(), "constraint records extracted");
        records
    }
}

/// Deterministic blank node relabelling: `b0`, `b1`… by order of first appearance.
#[derive(Default)]
struct BlankNodeLabels {
    labels: FxHashMap<String, BlankNode>,
}

impl BlankNodeLabels {
    fn blank_node(&mut self, node: &BlankNode) -> BlankNode {
        let next = self.labels.len();
        self.labels
            .entry(node.as_str().into())
            .or_insert_with(|| BlankNode::new_unchecked(format!("b{next}")))
            .clone()
    }

    fn subject(&mut self, subject: NamedOrBlankNode) -> NamedOrBlankNode {
        match subject {
            NamedOrBlankNode::BlankNode(node) => self.blank_node(&node).into(),
            subject @ NamedOrBlankNode::NamedNode(_) => subject,
        }
    }

    fn term(&mut self, term: Term) -> Term {
        match term {
            Term::BlankNode(node) => self.blank_node(&node).into(),
            term => term,
        }
    }
}

fn property_shape_records(graph: &Graph) -> Vec<ConstraintRecord> {
    let mut keyed = Vec::new();
    for node_shape in typed_subjects(graph, &[sh::NODE_SHAPE, sh::SHAPE]) {
        let mut property_shapes = objects(graph, node_shape, sh::PROPERTY);
        for node in objects(graph, node_shape, sh::NODE) {
            property_shapes.extend(objects(graph, node, sh::PROPERTY));
        }
        sort_dedup(&mut property_shapes);

        for property_shape in property_shapes {
            let Some((item, inverse)) = path(graph, property_shape) else {
                debug!(
                    shape = %property_shape,
                    "property shape without a plain or inverse predicate path skipped"
                );
                continue;
            };
            let mut targets = iris(graph, node_shape, sh::TARGET_CLASS);
            targets.extend(
                subjects(graph, sh::PROPERTY, property_shape)
                    .into_iter()
                    .filter(|s| is_class(graph, *s))
                    .filter_map(iri),
            );
            targets.sort_unstable();
            targets.dedup();
            if targets.is_empty() {
                debug!(shape = %property_shape, "property shape without target class skipped");
                continue;
            }
            let facets = property_facets(graph, property_shape);
            for target in targets {
                keyed.push((
                    (node_shape.to_string(), property_shape.to_string(), target.clone()),
                    ConstraintRecord {
                        item: Some(item.clone()),
                        inverse,
                        applies_to_cat: Some(target),
                        ..facets.clone()
                    },
                ));
            }
        }
    }
    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    // A property shape reached from several node shapes yields the same record for a shared target.
    let mut seen = FxHashSet::default();
    keyed
        .into_iter()
        .filter(|((_, property_shape, target), _)| {
            seen.insert((property_shape.clone(), target.clone()))
        })
        .map(|(_, record)| record)
        .collect()
}

/// The facets of a property shape, without path nor target.
fn property_facets(graph: &Graph, shape: TermRef<'_>) -> ConstraintRecord {
    let mut record = ConstraintRecord {
        range_type: first_value(graph, shape, sh::CLASS),
        range_kind: first_value(graph, shape, sh::NODE_KIND),
        data_type: first_value(graph, shape, sh::DATATYPE),
        pattern: first_value(graph, shape, sh::PATTERN),
        min_count: first_integer(graph, shape, sh::MIN_COUNT),
        max_count: first_integer(graph, shape, sh::MAX_COUNT),
        min_inc: first_number(graph, shape, sh::MIN_INCLUSIVE),
        min_exc: first_number(graph, shape, sh::MIN_EXCLUSIVE),
        max_inc: first_number(graph, shape, sh::MAX_INCLUSIVE),
        max_exc: first_number(graph, shape, sh::MAX_EXCLUSIVE),
        min_str_len: first_integer(graph, shape, sh::MIN_LENGTH),
        max_str_len: first_integer(graph, shape, sh::MAX_LENGTH),
        prop_shape_uid: Some(shape_uid(shape)),
        severity: Some(
            first_value(graph, shape, sh::SEVERITY)
                .unwrap_or_else(|| sh::VIOLATION.as_str().into()),
        ),
        ..ConstraintRecord::default()
    };

    let mut has_value_uris = Vec::new();
    let mut has_value_literals = Vec::new();
    for value in objects(graph, shape, sh::HAS_VALUE) {
        match value {
            TermRef::NamedNode(n) => has_value_uris.push(n.as_str().to_owned()),
            TermRef::Literal(l) => has_value_literals.push(l.value().to_owned()),
            _ => (),
        }
    }
    record.has_value_uri = non_empty_sorted(has_value_uris);
    record.has_value_literal = non_empty_sorted(has_value_literals);

    for list in objects(graph, shape, sh::IN) {
        let members = list_members(graph, list);
        let Some(first) = members.first() else {
            continue;
        };
        let literals = matches!(first, TermRef::Literal(_));
        let mut values = Vec::new();
        for member in &members {
            if let Some(value) = term_value(*member) {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
        if literals {
            record.in_literals = Some(values);
        } else {
            record.in_uris = Some(values);
        }
        break;
    }
    record
}

fn closed_shape_records(graph: &Graph) -> Vec<ConstraintRecord> {
    let mut keyed = Vec::new();
    for node_shape in typed_subjects(graph, &[sh::NODE_SHAPE]) {
        let closed = objects(graph, node_shape, sh::CLOSED).into_iter().any(|c| {
            matches!(c, TermRef::Literal(l) if l.datatype() == xsd::BOOLEAN && l.value() == "true")
        });
        if !closed {
            continue;
        }
        let targets = node_shape_targets(graph, node_shape);
        if targets.is_empty() {
            debug!(shape = %node_shape, "closed shape without target class skipped");
            continue;
        }

        let mut defined = Vec::new();
        for property_shape in objects(graph, node_shape, sh::PROPERTY) {
            defined.extend(iris(graph, property_shape, sh::PATH));
        }
        defined.sort_unstable();
        defined.dedup();

        let mut ignored = Vec::new();
        for list in objects(graph, node_shape, sh::IGNORED_PROPERTIES) {
            for member in list_members(graph, list) {
                if let Some(property) = iri(member) {
                    if !ignored.contains(&property) {
                        ignored.push(property);
                    }
                }
            }
        }

        for target in targets {
            keyed.push((
                (node_shape.to_string(), String::new(), target.clone()),
                ConstraintRecord {
                    applies_to_cat: Some(target),
                    constraint_type: Some(CLOSED_DEFINITION_PROP_LIST.into()),
                    node_shape_uid: Some(shape_uid(node_shape)),
                    defined_props: Some(defined.clone()),
                    ignored_props: Some(ignored.clone()),
                    ..ConstraintRecord::default()
                },
            ));
        }
    }
    sorted(keyed)
}

fn class_records(graph: &Graph) -> Vec<ConstraintRecord> {
    let mut keyed = Vec::new();
    for node_shape in typed_subjects(graph, &[sh::NODE_SHAPE]) {
        let required = iris(graph, node_shape, sh::CLASS);
        let mut disjoint = Vec::new();
        for not in objects(graph, node_shape, sh::NOT) {
            disjoint.extend(iris(graph, not, sh::CLASS));
        }
        disjoint.sort_unstable();
        disjoint.dedup();
        if required.is_empty() && disjoint.is_empty() {
            continue;
        }
        let targets = node_shape_targets(graph, node_shape);
        if targets.is_empty() {
            debug!(shape = %node_shape, "class constraints without target class skipped");
            continue;
        }
        for target in targets {
            keyed.push((
                (node_shape.to_string(), String::new(), target.clone()),
                ConstraintRecord {
                    applies_to_cat: Some(target),
                    node_shape_uid: Some(shape_uid(node_shape)),
                    req_class: (!required.is_empty()).then(|| required.clone()),
                    disjoint_class: (!disjoint.is_empty()).then(|| disjoint.clone()),
                    ..ConstraintRecord::default()
                },
            ));
        }
    }
    sorted(keyed)
}

/// `sh:targetClass` values, and the shape itself when it is a class.
fn node_shape_targets(graph: &Graph, node_shape: TermRef<'_>) -> Vec<String> {
    let mut targets = iris(graph, node_shape, sh::TARGET_CLASS);
    if is_class(graph, node_shape) {
        targets.extend(iri(node_shape));
    }
    targets.sort_unstable();
    targets.dedup();
    targets
}

/// The predicate of a `sh:path`, with `true` for `sh:inversePath`.
fn path(graph: &Graph, shape: TermRef<'_>) -> Option<(String, bool)> {
    let mut paths = objects(graph, shape, sh::PATH);
    sort_dedup(&mut paths);
    match *paths.first()? {
        TermRef::NamedNode(n) => Some((n.as_str().into(), false)),
        path @ TermRef::BlankNode(_) => {
            let inverse = iris(graph, path, sh::INVERSE_PATH);
            inverse.into_iter().next().map(|p| (p, true))
        }
        _ => None,
    }
}

fn shape_uid(shape: TermRef<'_>) -> String {
    match shape {
        TermRef::BlankNode(b) => format!("{BNODE_PREFIX}{}", b.as_str()),
        TermRef::NamedNode(n) => n.as_str().into(),
        shape => shape.to_string(),
    }
}

fn typed_subjects<'a>(graph: &'a Graph, types: &[NamedNodeRef<'_>]) -> Vec<TermRef<'a>> {
    let mut shapes = Vec::new();
    for t in types {
        shapes.extend(subjects(graph, rdf::TYPE, (*t).into()));
    }
    sort_dedup(&mut shapes);
    shapes
}

fn is_class(graph: &Graph, term: TermRef<'_>) -> bool {
    objects(graph, term, rdf::TYPE).contains(&rdfs::CLASS.into())
}

fn objects<'a>(
    graph: &'a Graph,
    subject: TermRef<'_>,
    predicate: NamedNodeRef<'_>,
) -> Vec<TermRef<'a>> {
    match subject {
        TermRef::NamedNode(n) => graph.objects_for_subject_predicate(n, predicate).collect(),
        TermRef::BlankNode(b) => graph.objects_for_subject_predicate(b, predicate).collect(),
        _ => Vec::new(),
    }
}

fn subjects<'a>(
    graph: &'a Graph,
    predicate: NamedNodeRef<'_>,
    object: TermRef<'_>,
) -> Vec<TermRef<'a>> {
    graph
        .subjects_for_predicate_object(predicate, object)
        .map(TermRef::from)
        .collect()
}

fn iri(term: TermRef<'_>) -> Option<String> {
    match term {
        TermRef::NamedNode(n) => Some(n.as_str().into()),
        _ => None,
    }
}

/// IRI objects, sorted and deduplicated.
fn iris(graph: &Graph, subject: TermRef<'_>, predicate: NamedNodeRef<'_>) -> Vec<String> {
    let mut iris = objects(graph, subject, predicate)
        .into_iter()
        .filter_map(iri)
        .collect::<Vec<_>>();
    iris.sort_unstable();
    iris.dedup();
    iris
}

/// The IRI or lexical form of a term.
fn term_value(term: TermRef<'_>) -> Option<String> {
    match term {
        TermRef::NamedNode(n) => Some(n.as_str().into()),
        TermRef::Literal(l) => Some(l.value().into()),
        _ => None,
    }
}

/// The smallest value of a facet.
fn first_value(graph: &Graph, subject: TermRef<'_>, predicate: NamedNodeRef<'_>) -> Option<String> {
    objects(graph, subject, predicate)
        .into_iter()
        .filter_map(term_value)
        .min()
}

fn first_literal<T>(
    graph: &Graph,
    subject: TermRef<'_>,
    predicate: NamedNodeRef<'_>,
    convert: impl Fn(&str, NamedNodeRef<'_>) -> Option<T>,
) -> Option<T> {
    let mut values = objects(graph, subject, predicate)
        .into_iter()
        .filter_map(|t| match t {
            TermRef::Literal(l) => Some(l),
            _ => None,
        })
        .collect::<Vec<_>>();
    values.sort_unstable_by_key(|l| l.value());
    for literal in values {
        if let Some(value) = convert(literal.value(), literal.datatype()) {
            return Some(value);
        }
        debug!(
            value = literal.value(),
            facet = predicate.as_str(),
            "non numeric facet value ignored"
        );
    }
    None
}

fn first_integer(graph: &Graph, subject: TermRef<'_>, predicate: NamedNodeRef<'_>) -> Option<i64> {
    first_literal(graph, subject, predicate, |value, _| parse_integer(value))
}

fn first_number(
    graph: &Graph,
    subject: TermRef<'_>,
    predicate: NamedNodeRef<'_>,
) -> Option<Number> {
    first_literal(graph, subject, predicate, |value, datatype| {
        if is_integer_datatype(datatype) {
            parse_integer(value).map(Number::from)
        } else {
            Number::from_f64(value.trim().parse().ok()?)
        }
    })
}

fn parse_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    value
        .strip_prefix('+')
        .unwrap_or(value)
        .parse()
        .ok()
}

fn is_integer_datatype(datatype: NamedNodeRef<'_>) -> bool {
    [
        xsd::INTEGER,
        xsd::LONG,
        xsd::INT,
        xsd::SHORT,
        xsd::BYTE,
        xsd::NON_NEGATIVE_INTEGER,
        xsd::NON_POSITIVE_INTEGER,
        xsd::POSITIVE_INTEGER,
        xsd::NEGATIVE_INTEGER,
        xsd::UNSIGNED_LONG,
        xsd::UNSIGNED_INT,
        xsd::UNSIGNED_SHORT,
        xsd::UNSIGNED_BYTE,
    ]
    .contains(&datatype)
}

/// The members of an RDF list, stopping on malformed or cyclic lists.
fn list_members<'a>(graph: &'a Graph, list: TermRef<'a>) -> Vec<TermRef<'a>> {
    let mut members = Vec::new();
    let mut visited = Vec::new();
    let mut current = list;
    while current != TermRef::from(rdf::NIL) && !visited.contains(&current) {
        visited.push(current);
        let (Some(first), Some(rest)) = (
            objects(graph, current, rdf::FIRST).into_iter().next(),
            objects(graph, current, rdf::REST).into_iter().next(),
        ) else {
            debug!(list = %list, "malformed RDF list truncated");
            break;
        };
        members.push(first);
        current = rest;
    }
    members
}

fn sort_dedup(terms: &mut Vec<TermRef<'_>>) {
    terms.sort_unstable_by_key(ToString::to_string);
    terms.dedup();
}

fn non_empty_sorted(mut values: Vec<String>) -> Option<Vec<String>> {
    values.sort_unstable();
    values.dedup();
    (!values.is_empty()).then_some(values)
}

fn sorted(mut keyed: Vec<((String, String, String), ConstraintRecord)>) -> Vec<ConstraintRecord> {
    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    keyed.into_iter().map(|(_, record)| record).collect()
}
