//! Cypher templates of the violation queries.
//!
//! A query is a head (`MATCH`, possibly preceded by a `WITH` binding the parameter set) and a body.
//! The scoped flavour of a query inserts [`TOUCHED_NODES_FILTER`] between the two.
//! Substitution sites are written `%s` and are filled positionally by [`render`].

use crate::vocab::{geo, sh};
use graphconf::{GraphConfig, GraphMode, VocabUrisMode};
use oxrdf::vocab::{rdf, xsd};
use serde::{Deserialize, Serialize};

/// Substitution site of a template.
pub const PLACEHOLDER: &str = "%s";

/// Predicate restricting the focus nodes of a scoped query.
pub const TOUCHED_NODES_FILTER: &str = " focus IN $touchedNodes AND ";

const MATCH_WHERE: &str = "MATCH (focus:`%s`) WHERE ";
const MATCH_REL_WHERE: &str = "MATCH (focus:`%s`)-[r:`%s`]->(x) WHERE ";
const WITH_PARAMS_MATCH_WHERE: &str = "WITH $`%s` as params MATCH (focus:`%s`) WHERE ";

/// Which focus nodes a query looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    /// Every node carrying the focus label.
    #[default]
    Global,
    /// Only the nodes bound to `$touchedNodes`.
    Touched,
}

/// The three switches along which the query texts vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TemplateContext {
    /// Nodes carry a `uri` property.
    pub uri_identified: bool,
    /// Names are shortened and must be expanded back in the reports.
    pub shorten: bool,
    /// `rdf:type` is reported with its full IRI.
    pub rdf_mode: bool,
}

impl TemplateContext {
    pub fn new(config: Option<&GraphConfig>) -> Self {
        let Some(config) = config else {
            return Self::default();
        };
        Self {
            uri_identified: true,
            shorten: matches!(
                config.handle_vocab_uris(),
                VocabUrisMode::Shorten | VocabUrisMode::ShortenStrict | VocabUrisMode::Map
            ),
            rdf_mode: config.graph_mode() == GraphMode::Rdf,
        }
    }

    fn node_id(self) -> &'static str {
        if self.uri_identified {
            " focus.uri "
        } else {
            " id(focus) "
        }
    }

    fn name(self) -> &'static str {
        if self.shorten {
            "n10s.rdf.fullUriFromShortForm('%s')"
        } else {
            " '%s' "
        }
    }

    fn message_name(self) -> &'static str {
        if self.shorten {
            "n10s.rdf.fullUriFromShortForm('%s') "
        } else {
            " '%s' "
        }
    }

    fn type_name(self) -> String {
        if self.rdf_mode {
            format!(" '{}' ", rdf::TYPE.as_str())
        } else {
            " 'type' ".into()
        }
    }

    fn labels(self) -> &'static str {
        if self.uri_identified {
            " [x in labels(focus) where x <> 'Resource' ] "
        } else {
            " labels(focus) "
        }
    }
}

/// A violation query template.
///
/// The documented argument order of each template is the order of its `%s` sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryTemplate {
    /// Values of the property that do not cast to the datatype.
    ///
    /// focus, path, cast prefix, cast suffix, focus, shape, path, path, severity, datatype
    Datatype,
    /// Relationships using a name declared as a typed property.
    ///
    /// focus, path, focus, shape, path, severity, path
    DatatypeOnRelationship,
    /// Relationships using a name declared as literal valued.
    ///
    /// focus, path, focus, shape, path, severity, path
    LiteralNodeKind,
    /// Properties using a name declared as IRI valued.
    ///
    /// focus, path, focus, shape, path, severity, path
    IriNodeKind,
    /// Relationship targets missing the range label.
    ///
    /// focus, path, range, focus, shape, path, severity, range
    Class,
    /// Properties using a name declared as class valued.
    ///
    /// focus, path, focus, shape, path, severity, path
    ClassOnProperty,
    /// parameter set, focus, path, path, focus, shape, path, severity
    Pattern,
    /// parameter set, focus, focus, shape, severity
    HasValueTypeLabel,
    /// parameter set, focus, path, focus, shape, path, severity, path
    HasValueTypeEdge,
    /// parameter set, focus, path, focus, shape, path, severity, path
    HasValueUri,
    /// parameter set, focus, path, focus, shape, path, severity, path
    HasValueLiteral,
    /// parameter set, focus, path, focus, shape, path, severity, path
    InLiterals,
    /// parameter set, focus, path, focus, shape, path, severity, path
    InUris,
    /// parameter set, focus, focus, shape, severity
    InTypeLabel,
    /// parameter set, focus, path, focus, shape, path, severity, path
    InTypeEdge,
    /// parameter set, focus, bound, path, path, focus, shape, path, path, path, severity
    MinCount,
    /// parameter set, focus, bound, focus, shape, path, severity
    MinCountTypeLabel,
    /// parameter set, focus, bound, path, focus, shape, path, path, severity
    MinCountTypeEdge,
    /// parameter set, focus, bound, path, focus, shape, path, path, severity
    MinCountInverse,
    /// parameter set, focus, path, path, bound, focus, shape, path, path, path, severity
    MaxCount,
    /// parameter set, focus, bound, focus, shape, path, severity
    MaxCountTypeLabel,
    /// parameter set, focus, path, bound, focus, shape, path, path, severity
    MaxCountTypeEdge,
    /// parameter set, focus, path, bound, focus, shape, path, path, severity
    MaxCountInverse,
    /// parameter set, focus, path, lower bound, upper bound, focus, shape, path, path, severity
    Length,
    /// parameter set, focus, path, lower bound, upper bound, focus, shape, path, path, severity
    ValueRange,
    /// Properties and relationships outside of the allow-list of a closed shape.
    ///
    /// parameter set, focus, focus, shape, severity
    Closed,
    /// focus, class, focus, shape, class, severity, class
    Disjoint,
}

impl QueryTemplate {
    fn head(self) -> &'static str {
        match self {
            Self::Datatype
            | Self::LiteralNodeKind
            | Self::IriNodeKind
            | Self::ClassOnProperty
            | Self::Disjoint => MATCH_WHERE,
            Self::DatatypeOnRelationship | Self::Class => MATCH_REL_WHERE,
            Self::Pattern
            | Self::HasValueTypeLabel
            | Self::HasValueTypeEdge
            | Self::HasValueUri
            | Self::HasValueLiteral
            | Self::InLiterals
            | Self::InUris
            | Self::InTypeLabel
            | Self::InTypeEdge
            | Self::MinCount
            | Self::MinCountTypeLabel
            | Self::MinCountTypeEdge
            | Self::MinCountInverse
            | Self::MaxCount
            | Self::MaxCountTypeLabel
            | Self::MaxCountTypeEdge
            | Self::MaxCountInverse
            | Self::Length
            | Self::ValueRange
            | Self::Closed => WITH_PARAMS_MATCH_WHERE,
        }
    }

    fn body(self, ctx: TemplateContext) -> String {
        let id = ctx.node_id();
        let name = ctx.name();
        let msg_name = ctx.message_name();
        match self {
            Self::Datatype => format!(
                " NOT all(x in [] +  focus.`%s` where %s x %s ) RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, focus.`%s` as offendingValue, {name} as propertyName, '%s' as severity, 'property value should be of type ' + {dt} as message ",
                c = sh::DATATYPE_CONSTRAINT_COMPONENT.as_str(),
                dt = if ctx.uri_identified {
                    " '%s' "
                } else {
                    "n10s.rdf.getIRILocalName('%s')"
                },
            ),
            Self::DatatypeOnRelationship => format!(
                " true RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, {off}as offendingValue, {name} as propertyName, '%s' as severity, {name} + ' should be a property, instead it  is a relationship' as message ",
                c = sh::DATATYPE_CONSTRAINT_COMPONENT.as_str(),
                off = if ctx.uri_identified {
                    " x.uri "
                } else {
                    " 'node id: ' + id(x) "
                },
            ),
            Self::LiteralNodeKind => format!(
                " (focus)-[:`%s`]->() RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, null as offendingValue, {name} as propertyName, '%s' as severity,{name} + ' should be a property ' as message  ",
                c = sh::NODE_KIND_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::IriNodeKind => format!(
                " exists(focus.`%s`) RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, null as offendingValue, {name} as propertyName, '%s' as severity,{name} + ' should be a relationship ' as message  ",
                c = sh::NODE_KIND_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::Class => format!(
                "NOT x:`%s` RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, {off} as offendingValue, {name} as propertyName, '%s' as severity, 'value should be of type ' + {name} as message  ",
                c = sh::CLASS_CONSTRAINT_COMPONENT.as_str(),
                off = if ctx.uri_identified {
                    " x.uri "
                } else {
                    " id(x) "
                },
            ),
            Self::ClassOnProperty => format!(
                "exists(focus.`%s`) RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, null as offendingValue, {name} as propertyName, '%s' as severity, '%s should be a relationship but it is a property' as message  ",
                c = sh::CLASS_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::Pattern => format!(
                "NOT all(x in [] +  coalesce(focus.`%s`,[]) where toString(x) =~ params.theRegex )   UNWIND [x in [] +  coalesce(focus.`%s`,[]) where not toString(x) =~ params.theRegex ]  as offval RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, offval as offendingValue, {name} as propertyName, '%s' as severity, 'the value of the property does not match the specified regular expression' as message  ",
                c = sh::PATTERN_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::HasValueTypeLabel => format!(
                " true with params, focus unwind params.theHasTypeTranslatedUris as reqVal  with focus, reqVal where not reqVal in labels(focus) RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, null as offendingValue, {ty} as propertyName, '%s' as severity, 'The required type ' + reqVal + ' could not be found as a label of the focus node ' as message  ",
                c = sh::HAS_VALUE_CONSTRAINT_COMPONENT.as_str(),
                ty = ctx.type_name(),
            ),
            Self::HasValueTypeEdge => format!(
                " true with params, focus unwind params.theHasTypeUris as reqVal with focus, reqVal where not (focus)-[:`%s`]->({{uri: reqVal}}) RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, null as offendingValue, {name} as propertyName, '%s' as severity, 'The required type ' + reqVal  + ' could not be found as value of relationship ' + {msg_name} as message  ",
                c = sh::HAS_VALUE_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::HasValueUri => format!(
                " true with params, focus unwind params.theHasValueUri as reqVal with focus, reqVal where not (focus)-[:`%s`]->({{uri: reqVal}}) RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, null as offendingValue, {name} as propertyName, '%s' as severity, 'The required value ' + reqVal  + ' could not be found as value of relationship ' + {msg_name} as message  ",
                c = sh::HAS_VALUE_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::HasValueLiteral => format!(
                " true with params, focus unwind params.theHasValueLiteral as  reqVal with focus, reqVal where not reqVal in [] + focus.`%s` RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, null as offendingValue, {name} as propertyName, '%s' as severity, 'The required value \"'+ reqVal + '\" was not found in property ' + {msg_name} as message  ",
                c = sh::HAS_VALUE_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::InLiterals => format!(
                " true with params, focus unwind [] + focus.`%s` as val with focus, val where not val in params.theInLiterals RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, val as offendingValue, {name} as propertyName, '%s' as severity, 'The value \"'+ val + '\" in property ' + {msg_name}+ ' is not in the accepted list' as message  ",
                c = sh::IN_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::InUris => format!(
                " true with params, focus unwind [(focus)-[:`%s`]->(x) | x ] as val with focus, val where not val.uri in params.theInUris RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, {off} as offendingValue, {name} as propertyName, '%s' as severity, 'The value \"'+ {off_msg} + '\" in property ' + {msg_name}+ ' is not in the accepted list' as message  ",
                c = sh::IN_CONSTRAINT_COMPONENT.as_str(),
                off = if ctx.uri_identified {
                    "val.uri"
                } else {
                    "id(val)"
                },
                off_msg = if ctx.uri_identified {
                    " val.uri "
                } else {
                    " 'node id: '  + id(val) "
                },
            ),
            Self::InTypeLabel => format!(
                " true with params, focus unwind labels(focus) as val with focus, val  where val <> 'Resource' and not val in params.theInTypeTranslatedUris RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, val as offendingValue, {ty} as propertyName, '%s' as severity, 'The label \"'+ val + '\" is not in the accepted list' as message  ",
                c = sh::IN_CONSTRAINT_COMPONENT.as_str(),
                ty = ctx.type_name(),
            ),
            Self::InTypeEdge => format!(
                " true with params, focus unwind [(focus)-[:`%s`]->(x) | x ] as val with focus, val where not val.uri in params.theInTypeUris RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, {off} as offendingValue, {name} as propertyName, '%s' as severity, 'The type \"'+ val.uri + '\" (node connected through property ' + {msg_name}+ ') is not in the accepted list' as message  ",
                c = sh::IN_CONSTRAINT_COMPONENT.as_str(),
                off = if ctx.uri_identified {
                    "val.uri"
                } else {
                    "id(val)"
                },
            ),
            Self::MinCount => format!(
                "NOT %s ( size((focus)-[:`%s`]->()) +  size([] + coalesce(focus.`%s`, [])) )  RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape,  'cardinality (' + (coalesce(size((focus)-[:`%s`]->()),0) + coalesce(size([] + focus.`%s`),0)) + ') too low'  as message, {name} as propertyName, '%s' as severity, null as offendingValue  ",
                c = sh::MIN_COUNT_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::MinCountTypeLabel => format!(
                "NOT %s size({labels})  RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape,  'number of labels (' + size({labels}) +') too low'  as message, {name} as propertyName, '%s' as severity,  null as offendingValue  ",
                c = sh::MIN_COUNT_CONSTRAINT_COMPONENT.as_str(),
                labels = ctx.labels(),
            ),
            Self::MinCountTypeEdge => format!(
                "NOT %s ( size((focus)-[:`%s`]->()))  RETURN  focus.uri as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape,  'type cardinality (' + coalesce(size((focus)-[:`%s`]->()),0) + ') is too low'  as message, {name} as propertyName, '%s' as severity, null as offendingValue  ",
                c = sh::MIN_COUNT_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::MinCountInverse => format!(
                "NOT %s size((focus)<-[:`%s`]-()) RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape,  'incoming cardinality (' + coalesce(size((focus)<-[:`%s`]-()),0) +') is too low' as message, {name} as propertyName, '%s' as severity, null as offendingValue  ",
                c = sh::MIN_COUNT_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::MaxCount => format!(
                "NOT (size((focus)-[:`%s`]->()) + size([] + coalesce(focus.`%s`,[]))) %s  RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape,  'cardinality (' + (coalesce(size((focus)-[:`%s`]->()),0) + coalesce(size([] + focus.`%s`),0)) + ') is too high' as message, {name} as propertyName, '%s' as severity, null as offendingValue  ",
                c = sh::MAX_COUNT_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::MaxCountTypeLabel => format!(
                "NOT size({labels})  %s   RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape,  'number of labels (' + size({labels}) + ') is too high' as message, {name} as propertyName, '%s' as severity,  null as offendingValue  ",
                c = sh::MAX_COUNT_CONSTRAINT_COMPONENT.as_str(),
                labels = ctx.labels(),
            ),
            Self::MaxCountTypeEdge => format!(
                "NOT ( size((focus)-[:`%s`]->())) %s  RETURN  focus.uri as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape,  'type cardinality (' + coalesce(size((focus)-[:`%s`]->()),0) + ') is too high'  as message, {name} as propertyName, '%s' as severity, null as offendingValue  ",
                c = sh::MAX_COUNT_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::MaxCountInverse => format!(
                "NOT size((focus)<-[:`%s`]-()) %s RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape,  'incoming cardinality (' + coalesce(size((focus)<-[:`%s`]-()),0) + ') is too high' as message, {name} as propertyName, '%s' as severity, null as offendingValue  ",
                c = sh::MAX_COUNT_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::Length => format!(
                "NOT all(x in [] +  focus.`%s` where %s size(toString(x)) %s ) RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, focus.`%s` as offendingValue, {name} as propertyName, '%s' as severity, '' as message  ",
                c = sh::MAX_LENGTH_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::ValueRange => format!(
                "NOT all(x in [] +  focus.`%s` where %s x %s ) RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, focus.`%s` as offendingValue, {name} as propertyName, '%s' as severity, '' as message  ",
                c = sh::MIN_EXCLUSIVE_CONSTRAINT_COMPONENT.as_str(),
            ),
            Self::Closed => format!(
                " true \nUNWIND [ x in [(focus)-[r]->()| type(r)] where not x in params.allAllowedProps] + [ x in keys(focus) where {uri_filter} not x in params.allAllowedProps] as noProp\nRETURN  {id} as nodeId , {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, substring(reduce(result='', x in [] + coalesce(focus[noProp],[(focus)-[r]-(x) where type(r)=noProp | {target}]) | result + ', ' + x ),2) as offendingValue, {prop} as propertyName, '%s' as severity, 'Closed type definition does not include this property/relationship' as message  ",
                c = sh::CLOSED_CONSTRAINT_COMPONENT.as_str(),
                uri_filter = if ctx.uri_identified {
                    " x <> 'uri' and "
                } else {
                    ""
                },
                target = if ctx.uri_identified {
                    " x.uri "
                } else {
                    " id(x) "
                },
                prop = if ctx.shorten {
                    "n10s.rdf.fullUriFromShortForm(noProp)"
                } else {
                    " noProp "
                },
            ),
            Self::Disjoint => format!(
                " focus:`%s` RETURN {id} as nodeId, {name} as nodeType, '%s' as shapeId, '{c}' as propertyShape, '%s' as offendingValue,  '-' as propertyName, '%s' as severity,  'type not allowed: ' + '%s' as message  ",
                c = sh::NOT_CONSTRAINT_COMPONENT.as_str(),
            ),
        }
    }

    /// The query text with its `%s` substitution sites.
    pub fn text(self, ctx: TemplateContext, scope: Scope) -> String {
        let body = self.body(ctx);
        let head = self.head();
        match scope {
            Scope::Global => format!("{head}{body}"),
            Scope::Touched => format!("{head}{TOUCHED_NODES_FILTER}{body}"),
        }
    }

    /// Number of arguments expected by [`render`].
    pub fn arity(self, ctx: TemplateContext) -> usize {
        self.text(ctx, Scope::Global).matches(PLACEHOLDER).count()
    }
}

/// Fills the `%s` sites of `template` with `args`, in order.
///
/// A site opened by `'` is a string literal: `\` and `'` are backslash-escaped.
/// A site opened by a backtick is a quoted name: backticks are doubled.
/// Any other site is a Cypher expression and is inserted verbatim.
///
/// ```
/// use cyshacl::render;
///
/// assert_eq!(render("MATCH (focus:`%s`) WHERE ", &["ex__Person"]), "MATCH (focus:`ex__Person`) WHERE ");
/// assert_eq!(render("'%s' as shapeId", &["http://example.org/it's"]), r"'http://example.org/it\'s' as shapeId");
/// ```
pub fn render(template: &str, args: &[&str]) -> String {
    let mut pieces = template.split(PLACEHOLDER);
    let mut args = args.iter();
    let mut result = String::with_capacity(template.len() + 16 * args.len());
    if let Some(first) = pieces.next() {
        result.push_str(first);
    }
    for piece in pieces {
        let arg = args.next();
        debug_assert!(arg.is_some(), "missing template argument");
        let arg = arg.copied().unwrap_or_default();
        match result.chars().next_back() {
            Some('\'') => push_escaped_string(&mut result, arg),
            Some('`') => push_escaped_name(&mut result, arg),
            _ => result.push_str(arg),
        }
        result.push_str(piece);
    }
    debug_assert!(args.next().is_none(), "unused template argument");
    result
}

fn push_escaped_string(target: &mut String, value: &str) {
    for c in value.chars() {
        if matches!(c, '\\' | '\'') {
            target.push('\\');
        }
        target.push(c);
    }
}

fn push_escaped_name(target: &mut String, value: &str) {
    for c in value.chars() {
        if c == '`' {
            target.push('`');
        }
        target.push(c);
    }
}

/// The Cypher expression wrapped around each value `x` to check its datatype.
///
/// Returns `None` if the datatype is not checked.
pub fn datatype_cast(datatype: &str) -> Option<(String, &'static str)> {
    let cast = |prefix: &str, suffix| Some((prefix.to_owned(), suffix));
    if datatype == xsd::BOOLEAN.as_str() {
        cast("coalesce(toBoolean(toString(", ")) = x , false)")
    } else if datatype == xsd::STRING.as_str() {
        cast("coalesce(toString(", ") = x , false)")
    } else if datatype == xsd::INTEGER.as_str() {
        cast("coalesce(toInteger(", ") = x , false)")
    } else if datatype == xsd::FLOAT.as_str() {
        cast("coalesce(toFloat(", ") = x , false)")
    } else if [
        xsd::DATE.as_str(),
        xsd::DATE_TIME.as_str(),
        geo::WKT_LITERAL.as_str(),
        xsd::ANY_URI.as_str(),
    ]
    .contains(&datatype)
    {
        Some((format!("n10s.aux.dt.check('{datatype}',"), ")"))
    } else {
        None
    }
}
