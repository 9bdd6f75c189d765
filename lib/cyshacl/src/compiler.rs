use crate::constraint::{
    Constraint, ConstraintHeader, ConstraintKind, ConstraintSet, NodeKind, ValueRange,
};
use crate::error::ShaclCompileError;
use crate::plan::{ConstraintComponent, ValidatorPlan};
use crate::prefix::PrefixResolver;
use crate::record::ConstraintRecord;
use crate::template::{QueryTemplate, Scope, TemplateContext, datatype_cast, render};
use crate::translate::UriTranslator;
use crate::vocab::sh;
use graphconf::{GraphConfig, GraphMode, local_name};
use oxrdf::NamedNodeRef;
use oxrdf::vocab::rdf;
use serde_json::Value;
use std::borrow::Borrow;

const MIN_COUNT_BOUND: &str = " toInteger(params.minCount) <= ";
const MAX_COUNT_BOUND: &str = " <= toInteger(params.maxCount) ";

/// Compiles constraint records into a [`ValidatorPlan`].
///
/// The compilation is a pure function of the records, the graph configuration and the registered prefixes.
/// Without configuration the graph is assumed to be a plain property graph:
/// nodes are identified by their internal id, types are labels and names are local names.
///
/// ```
/// use cyshacl::{ConstraintRecord, PrefixTable, Scope, ShaclCompiler};
///
/// let record: ConstraintRecord = serde_json::from_str(
///     r#"{"appliesToCat": "http://example.org/Person", "item": "http://example.org/knows",
///         "inverse": true, "minCount": 1, "propShapeUid": "http://example.org/KnownShape"}"#,
/// )?;
/// let prefixes = PrefixTable::new();
/// let plan = ShaclCompiler::new(None, &prefixes).compile([record])?;
/// assert_eq!(plan.entries().len(), 1);
/// assert!(plan.entries()[0].query(Scope::Global).contains("size((focus)<-[:`knows`]-())"));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone, Copy)]
pub struct ShaclCompiler<'a> {
    translator: UriTranslator<'a>,
    context: TemplateContext,
}

impl<'a> ShaclCompiler<'a> {
    pub fn new(config: Option<&'a GraphConfig>, resolver: &'a dyn PrefixResolver) -> Self {
        Self {
            translator: UriTranslator::new(config, resolver),
            context: TemplateContext::new(config),
        }
    }

    /// Compiles `records` in order.
    ///
    /// Records without target class are skipped.
    /// Fails on the first IRI that cannot be translated, discarding the partial plan.
    pub fn compile<R: Borrow<ConstraintRecord>>(
        &self,
        records: impl IntoIterator<Item = R>,
    ) -> Result<ValidatorPlan, ShaclCompileError> {
        let mut plan = ValidatorPlan::default();
        for record in records {
            let record = record.borrow();
            let Some(set) = ConstraintSet::from_record(record) else {
                tracing::debug!(
                    shape = record.shape_uid().unwrap_or_default(),
                    "only class-based targets (sh:targetClass) and implicit class targets are validated"
                );
                continue;
            };
            self.compile_set(&set, &mut plan)?;
        }
        tracing::debug!(
            queries = plan.entries().len(),
            parameter_sets = plan.params().len(),
            constraints = plan.inventory().len(),
            "compiled validation plan"
        );
        Ok(plan)
    }

    fn compile_set(
        &self,
        set: &ConstraintSet,
        plan: &mut ValidatorPlan,
    ) -> Result<(), ShaclCompileError> {
        let header = &set.header;
        let shape = RecordCompiler {
            compiler: self,
            header,
            focus: self.translator.translate(&header.focus_class)?,
            path: header
                .path
                .as_ref()
                .map(|p| self.translator.translate(&p.iri))
                .transpose()?,
        };
        for constraint in &set.constraints {
            shape.compile(constraint, plan)?;
        }
        Ok(())
    }

    fn graph_mode(&self) -> GraphMode {
        self.translator
            .config()
            .map_or(GraphMode::Lpg, GraphConfig::graph_mode)
    }

    fn types_as_labels(&self) -> bool {
        self.translator
            .config()
            .is_none_or(|c| c.handle_rdf_types().as_labels())
    }

    fn types_as_nodes(&self) -> bool {
        self.translator
            .config()
            .is_some_and(|c| c.handle_rdf_types().as_nodes())
    }
}

/// Compilation of the constraints sharing one header.
struct RecordCompiler<'c, 'a> {
    compiler: &'c ShaclCompiler<'a>,
    header: &'c ConstraintHeader,
    focus: String,
    path: Option<String>,
}

impl RecordCompiler<'_, '_> {
    fn compile(
        &self,
        constraint: &Constraint,
        plan: &mut ValidatorPlan,
    ) -> Result<(), ShaclCompileError> {
        match constraint {
            Constraint::Closed { defined, ignored } => return self.closed(defined, ignored, plan),
            Constraint::Disjoint(classes) => return self.disjoint(classes, plan),
            Constraint::RequiredClasses(classes) => {
                tracing::debug!(
                    shape = self.header.shape_uid.as_str(),
                    classes = ?classes,
                    "node-level sh:class constraints are not validated"
                );
                return Ok(());
            }
            _ => (),
        }
        let Some(prop) = self.path.as_deref() else {
            tracing::debug!(
                shape = self.header.shape_uid.as_str(),
                "property constraint without path, ignoring it"
            );
            return Ok(());
        };
        let on_type = self.header.is_on_type();
        if on_type && !allowed_on_type(constraint) {
            tracing::debug!(
                shape = self.header.shape_uid.as_str(),
                "constraint is not validated on rdf:type"
            );
            return Ok(());
        }
        let compiler = self.compiler;
        let focus = self.focus.as_str();
        let uid = self.header.shape_uid.as_str();
        let severity = self.header.severity.iri().as_str();

        match constraint {
            Constraint::Datatype(datatype) => {
                let (prefix, suffix) = datatype_cast(datatype).unwrap_or_else(|| {
                    tracing::debug!(
                        datatype = %datatype,
                        "no cast expression for datatype, values are not checked"
                    );
                    (String::new(), "")
                });
                self.emit(
                    plan,
                    QueryTemplate::Datatype,
                    ConstraintKind::Datatype,
                    vec![focus.into()],
                    &[
                        focus, prop, &prefix, suffix, focus, uid, prop, prop, severity, datatype,
                    ],
                );
                self.emit(
                    plan,
                    QueryTemplate::DatatypeOnRelationship,
                    ConstraintKind::Datatype,
                    vec![focus.into()],
                    &[focus, prop, focus, uid, prop, severity, prop],
                );
                self.component(plan, ConstraintKind::Datatype, self.term_name(datatype));
            }
            Constraint::HasValueUris(uris) => {
                if !on_type && !compiler.context.uri_identified {
                    tracing::debug!(
                        shape = uid,
                        "sh:hasValue on IRIs is only validated on URI-identified nodes"
                    );
                    return Ok(());
                }
                let set_id = param_set_id(uid, sh::HAS_VALUE);
                let mut reported = Value::from(uris.clone());
                if on_type {
                    if compiler.types_as_labels() {
                        let translated = Value::from(compiler.translator.translate_all(uris)?);
                        plan.set_param(&set_id, "theHasTypeTranslatedUris", translated.clone());
                        self.emit(
                            plan,
                            QueryTemplate::HasValueTypeLabel,
                            ConstraintKind::HasValue,
                            vec![focus.into()],
                            &[&set_id, focus, focus, uid, severity],
                        );
                        reported = translated;
                    }
                    if compiler.types_as_nodes() {
                        plan.set_param(&set_id, "theHasTypeUris", uris.clone().into());
                        self.emit(
                            plan,
                            QueryTemplate::HasValueTypeEdge,
                            ConstraintKind::HasValue,
                            vec![focus.into()],
                            &[&set_id, focus, prop, focus, uid, prop, severity, prop],
                        );
                    }
                } else {
                    plan.set_param(&set_id, "theHasValueUri", uris.clone().into());
                    self.emit(
                        plan,
                        QueryTemplate::HasValueUri,
                        ConstraintKind::HasValue,
                        vec![focus.into()],
                        &[&set_id, focus, prop, focus, uid, prop, severity, prop],
                    );
                }
                self.component(plan, ConstraintKind::HasValue, reported);
            }
            Constraint::HasValueLiterals(literals) => {
                let set_id = param_set_id(uid, sh::HAS_VALUE);
                plan.set_param(&set_id, "theHasValueLiteral", literals.clone().into());
                self.emit(
                    plan,
                    QueryTemplate::HasValueLiteral,
                    ConstraintKind::HasValue,
                    vec![focus.into()],
                    &[&set_id, focus, prop, focus, uid, prop, severity, prop],
                );
                self.component(plan, ConstraintKind::HasValue, literals.clone().into());
            }
            Constraint::NodeKind(kind) => {
                let template = match kind {
                    NodeKind::Literal => Some(QueryTemplate::LiteralNodeKind),
                    NodeKind::BlankNodeOrIri => Some(QueryTemplate::IriNodeKind),
                    _ => None,
                };
                if let Some(template) = template {
                    self.emit(
                        plan,
                        template,
                        ConstraintKind::NodeKind,
                        vec![focus.into()],
                        &[focus, prop, focus, uid, prop, severity, prop],
                    );
                } else {
                    tracing::debug!(node_kind = %kind.iri(), "node kind is not validated");
                }
                self.component(
                    plan,
                    ConstraintKind::NodeKind,
                    self.term_name(kind.iri().as_str()),
                );
            }
            Constraint::Class(class) => {
                let range = compiler.translator.translate(class)?;
                let triggers = vec![focus.to_owned(), range.clone()];
                self.emit(
                    plan,
                    QueryTemplate::Class,
                    ConstraintKind::Class,
                    triggers.clone(),
                    &[focus, prop, &range, focus, uid, prop, severity, &range],
                );
                self.emit(
                    plan,
                    QueryTemplate::ClassOnProperty,
                    ConstraintKind::Class,
                    triggers,
                    &[focus, prop, focus, uid, prop, severity, prop],
                );
                self.component(plan, ConstraintKind::Class, range.into());
            }
            Constraint::InLiterals(literals) => {
                let set_id = param_set_id(uid, sh::IN);
                plan.set_param(&set_id, "theInLiterals", literals.clone().into());
                self.emit(
                    plan,
                    QueryTemplate::InLiterals,
                    ConstraintKind::In,
                    vec![focus.into()],
                    &[&set_id, focus, prop, focus, uid, prop, severity, prop],
                );
                self.component(plan, ConstraintKind::In, literals.clone().into());
            }
            Constraint::InUris(uris) => {
                let set_id = param_set_id(uid, sh::IN);
                let mut reported = Value::from(uris.clone());
                if on_type {
                    if compiler.types_as_labels() {
                        let translated = Value::from(compiler.translator.translate_all(uris)?);
                        plan.set_param(&set_id, "theInTypeTranslatedUris", translated.clone());
                        self.emit(
                            plan,
                            QueryTemplate::InTypeLabel,
                            ConstraintKind::In,
                            vec![focus.into()],
                            &[&set_id, focus, focus, uid, severity],
                        );
                        reported = translated;
                    }
                    if compiler.types_as_nodes() {
                        plan.set_param(&set_id, "theInTypeUris", uris.clone().into());
                        self.emit(
                            plan,
                            QueryTemplate::InTypeEdge,
                            ConstraintKind::In,
                            vec![focus.into()],
                            &[&set_id, focus, prop, focus, uid, prop, severity, prop],
                        );
                    }
                } else {
                    plan.set_param(&set_id, "theInUris", uris.clone().into());
                    self.emit(
                        plan,
                        QueryTemplate::InUris,
                        ConstraintKind::In,
                        vec![focus.into()],
                        &[&set_id, focus, prop, focus, uid, prop, severity, prop],
                    );
                }
                self.component(plan, ConstraintKind::In, reported);
            }
            Constraint::Pattern(pattern) => {
                let set_id = param_set_id(uid, sh::PATTERN);
                plan.set_param(&set_id, "theRegex", pattern.as_str().into());
                self.emit(
                    plan,
                    QueryTemplate::Pattern,
                    ConstraintKind::Pattern,
                    vec![focus.into()],
                    &[&set_id, focus, prop, prop, focus, uid, prop, severity],
                );
                self.component(plan, ConstraintKind::Pattern, pattern.as_str().into());
            }
            Constraint::MinCount(min) => {
                let set_id = param_set_id(uid, sh::MIN_COUNT);
                plan.set_param(&set_id, "minCount", (*min).into());
                let kind = ConstraintKind::MinCount;
                let bound = MIN_COUNT_BOUND;
                if self.header.is_inverse() {
                    self.emit(
                        plan,
                        QueryTemplate::MinCountInverse,
                        kind,
                        vec![focus.into()],
                        &[&set_id, focus, bound, prop, focus, uid, prop, prop, severity],
                    );
                } else if on_type {
                    if compiler.types_as_labels() {
                        self.emit(
                            plan,
                            QueryTemplate::MinCountTypeLabel,
                            kind,
                            vec![focus.into()],
                            &[&set_id, focus, bound, focus, uid, prop, severity],
                        );
                    }
                    if compiler.types_as_nodes() {
                        self.emit(
                            plan,
                            QueryTemplate::MinCountTypeEdge,
                            kind,
                            vec![focus.into()],
                            &[&set_id, focus, bound, prop, focus, uid, prop, prop, severity],
                        );
                    }
                } else {
                    self.emit(
                        plan,
                        QueryTemplate::MinCount,
                        kind,
                        vec![focus.into()],
                        &[
                            &set_id, focus, bound, prop, prop, focus, uid, prop, prop, prop,
                            severity,
                        ],
                    );
                }
                self.component(plan, kind, (*min).into());
            }
            Constraint::MaxCount(max) => {
                let set_id = param_set_id(uid, sh::MAX_COUNT);
                plan.set_param(&set_id, "maxCount", (*max).into());
                let kind = ConstraintKind::MaxCount;
                let bound = MAX_COUNT_BOUND;
                if self.header.is_inverse() {
                    self.emit(
                        plan,
                        QueryTemplate::MaxCountInverse,
                        kind,
                        vec![focus.into()],
                        &[&set_id, focus, prop, bound, focus, uid, prop, prop, severity],
                    );
                } else if on_type {
                    if compiler.types_as_labels() {
                        self.emit(
                            plan,
                            QueryTemplate::MaxCountTypeLabel,
                            kind,
                            vec![focus.into()],
                            &[&set_id, focus, bound, focus, uid, prop, severity],
                        );
                    }
                    if compiler.types_as_nodes() {
                        self.emit(
                            plan,
                            QueryTemplate::MaxCountTypeEdge,
                            kind,
                            vec![focus.into()],
                            &[&set_id, focus, prop, bound, focus, uid, prop, prop, severity],
                        );
                    }
                } else {
                    self.emit(
                        plan,
                        QueryTemplate::MaxCount,
                        kind,
                        vec![focus.into()],
                        &[
                            &set_id, focus, prop, prop, bound, focus, uid, prop, prop, prop,
                            severity,
                        ],
                    );
                }
                self.component(plan, kind, (*max).into());
            }
            Constraint::Length { min, max } => {
                let set_id = param_set_id(uid, sh::MIN_LENGTH);
                plan.set_param(&set_id, "minStrLen", (*min).into());
                plan.set_param(&set_id, "maxStrLen", (*max).into());
                let lower = if min.is_some() {
                    " params.minStrLen <= "
                } else {
                    ""
                };
                let upper = if max.is_some() {
                    " <= params.maxStrLen "
                } else {
                    ""
                };
                self.emit(
                    plan,
                    QueryTemplate::Length,
                    constraint.kind().unwrap_or(ConstraintKind::MaxLength),
                    vec![focus.into()],
                    &[
                        &set_id, focus, prop, lower, upper, focus, uid, prop, prop, severity,
                    ],
                );
                if let Some(min) = min {
                    self.component(plan, ConstraintKind::MinLength, (*min).into());
                }
                if let Some(max) = max {
                    self.component(plan, ConstraintKind::MaxLength, (*max).into());
                }
            }
            Constraint::Range(range) => self.value_range(range, prop, plan),
            Constraint::Closed { .. }
            | Constraint::Disjoint(_)
            | Constraint::RequiredClasses(_) => (),
        }
        Ok(())
    }

    fn value_range(&self, range: &ValueRange, prop: &str, plan: &mut ValidatorPlan) {
        let Some((kind, _)) = range.bounds().next() else {
            return;
        };
        let focus = self.focus.as_str();
        let uid = self.header.shape_uid.as_str();
        let set_id = param_set_id(uid, sh::MIN_EXCLUSIVE);
        let lower = range.lower();
        let upper = range.upper();
        plan.set_param(
            &set_id,
            "min",
            lower.map_or(Value::Null, |(n, _)| n.clone().into()),
        );
        plan.set_param(
            &set_id,
            "max",
            upper.map_or(Value::Null, |(n, _)| n.clone().into()),
        );
        let lower = match lower {
            Some((_, true)) => " params.min <=",
            Some((_, false)) => " params.min < ",
            None => "",
        };
        let upper = match upper {
            Some((_, true)) => " <= params.max ",
            Some((_, false)) => " < params.max ",
            None => "",
        };
        self.emit(
            plan,
            QueryTemplate::ValueRange,
            kind,
            vec![focus.into()],
            &[
                &set_id,
                focus,
                prop,
                lower,
                upper,
                focus,
                uid,
                prop,
                prop,
                self.header.severity.iri().as_str(),
            ],
        );
        for (kind, bound) in range.bounds() {
            self.component(plan, kind, bound.clone().into());
        }
    }

    fn closed(
        &self,
        defined: &[String],
        ignored: &[String],
        plan: &mut ValidatorPlan,
    ) -> Result<(), ShaclCompileError> {
        let translator = &self.compiler.translator;
        let focus = self.focus.as_str();
        let uid = self.header.shape_uid.as_str();
        let set_id = param_set_id(uid, sh::CLOSED);

        let mut allowed = Vec::with_capacity(defined.len() + ignored.len() + 1);
        if self.compiler.types_as_nodes() {
            allowed.push(translator.translate(rdf::TYPE.as_str())?);
        }
        let ignored = translator.translate_all(ignored)?;
        allowed.extend(ignored.iter().cloned());
        allowed.extend(translator.translate_all(defined)?);
        plan.set_param(&set_id, "allAllowedProps", allowed.into());

        self.emit(
            plan,
            QueryTemplate::Closed,
            ConstraintKind::IgnoredProperties,
            vec![focus.into()],
            &[&set_id, focus, focus, uid, sh::VIOLATION.as_str()],
        );
        self.component(plan, ConstraintKind::IgnoredProperties, ignored.into());
        Ok(())
    }

    fn disjoint(
        &self,
        classes: &[String],
        plan: &mut ValidatorPlan,
    ) -> Result<(), ShaclCompileError> {
        let focus = self.focus.as_str();
        let uid = self.header.shape_uid.as_str();
        let translated = self.compiler.translator.translate_all(classes)?;
        for class in &translated {
            self.emit(
                plan,
                QueryTemplate::Disjoint,
                ConstraintKind::Not,
                vec![focus.to_owned(), class.clone()],
                &[
                    focus,
                    class,
                    focus,
                    uid,
                    class,
                    sh::VIOLATION.as_str(),
                    class,
                ],
            );
        }
        for class in translated {
            self.component(plan, ConstraintKind::Not, class.into());
        }
        Ok(())
    }

    fn emit(
        &self,
        plan: &mut ValidatorPlan,
        template: QueryTemplate,
        kind: ConstraintKind,
        triggers: Vec<String>,
        args: &[&str],
    ) {
        let ctx = self.compiler.context;
        debug_assert_eq!(template.arity(ctx), args.len(), "{template:?}");
        let global = render(&template.text(ctx, Scope::Global), args);
        let scoped = render(&template.text(ctx, Scope::Touched), args);
        let entry = plan.push_query(
            triggers,
            kind,
            &self.focus,
            self.path.as_deref(),
            global,
            scoped,
        );
        tracing::trace!(
            id = entry.id(),
            shape = self.header.shape_uid.as_str(),
            kind = %kind,
            query = entry.query(Scope::Global),
            "compiled query"
        );
    }

    fn component(&self, plan: &mut ValidatorPlan, kind: ConstraintKind, value: Value) {
        plan.push_component(ConstraintComponent {
            focus_label: self.focus.clone(),
            path: self.path.clone(),
            kind: kind.kind_name(self.compiler.graph_mode()),
            value,
        });
    }

    /// IRIs of the SHACL and XSD vocabularies are reported in full in RDF graphs and by local name otherwise.
    fn term_name(&self, iri: &str) -> Value {
        match self.compiler.graph_mode() {
            GraphMode::Rdf => iri.into(),
            GraphMode::Lpg => local_name(iri).into(),
        }
    }
}

fn allowed_on_type(constraint: &Constraint) -> bool {
    matches!(
        constraint,
        Constraint::HasValueUris(_)
            | Constraint::InUris(_)
            | Constraint::MinCount(_)
            | Constraint::MaxCount(_)
    )
}

fn param_set_id(shape_uid: &str, parameter: NamedNodeRef<'_>) -> String {
    format!("{shape_uid}_{}", parameter.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix::PrefixTable;
    use serde_json::json;

    fn record(json: Value) -> ConstraintRecord {
        serde_json::from_value(json).unwrap()
    }

    fn config(props: Value) -> GraphConfig {
        GraphConfig::from_properties(props.as_object().unwrap()).unwrap()
    }

    fn prefixes() -> PrefixTable {
        [
            ("ex", "http://example.org/"),
            ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn untargeted_records_are_skipped() {
        let prefixes = prefixes();
        let plan = ShaclCompiler::new(None, &prefixes)
            .compile([record(json!({"item": "http://example.org/a", "minCount": 1}))])
            .unwrap();
        assert!(plan.is_empty());
        assert!(plan.inventory().is_empty());
    }

    #[test]
    fn datatype_without_configuration() {
        let prefixes = prefixes();
        let plan = ShaclCompiler::new(None, &prefixes)
            .compile([record(json!({
                "appliesToCat": "http://example.org/Person",
                "item": "http://example.org/age",
                "dataType": "http://www.w3.org/2001/XMLSchema#integer",
                "propShapeUid": "http://example.org/AgeShape"
            }))])
            .unwrap();
        assert_eq!(plan.entries().len(), 2);
        let query = plan.entries()[0].query(Scope::Global);
        assert!(query.starts_with(
            "MATCH (focus:`Person`) WHERE  NOT all(x in [] +  focus.`age` where coalesce(toInteger( x ) = x , false) )"
        ));
        assert!(query.contains(" id(focus)  as nodeId"));
        assert!(
            query.contains("n10s.rdf.getIRILocalName('http://www.w3.org/2001/XMLSchema#integer')")
        );
        assert_eq!(
            plan.inventory()[0],
            ConstraintComponent {
                focus_label: "Person".into(),
                path: Some("age".into()),
                kind: "datatype".into(),
                value: json!("integer"),
            }
        );
    }

    #[test]
    fn unknown_datatype_gives_empty_cast() {
        let prefixes = prefixes();
        let config = GraphConfig::default();
        let plan = ShaclCompiler::new(Some(&config), &prefixes)
            .compile([record(json!({
                "appliesToCat": "http://example.org/Person",
                "item": "http://example.org/age",
                "dataType": "http://example.org/Custom",
                "propShapeUid": "http://example.org/AgeShape"
            }))])
            .unwrap();
        assert!(plan.entries()[0].query(Scope::Global).contains("where  x  )"));
        assert_eq!(plan.inventory()[0].kind, "sh:datatype");
        assert_eq!(plan.inventory()[0].value, json!("http://example.org/Custom"));
    }

    #[test]
    fn has_value_uris_require_uri_identified_nodes() {
        let prefixes = prefixes();
        let record = record(json!({
            "appliesToCat": "http://example.org/Person",
            "item": "http://example.org/status",
            "hasValueUri": ["http://example.org/Active"],
            "propShapeUid": "http://example.org/S"
        }));
        let plan = ShaclCompiler::new(None, &prefixes).compile([&record]).unwrap();
        assert!(plan.is_empty());

        let config = GraphConfig::default();
        let plan = ShaclCompiler::new(Some(&config), &prefixes).compile([&record]).unwrap();
        assert_eq!(plan.entries().len(), 1);
        assert_eq!(
            plan.params()["http://example.org/S_http://www.w3.org/ns/shacl#hasValue"]["theHasValueUri"],
            json!(["http://example.org/Active"])
        );
    }

    #[test]
    fn has_value_uris_and_literals_share_their_parameter_set() {
        let prefixes = prefixes();
        let config = GraphConfig::default();
        let plan = ShaclCompiler::new(Some(&config), &prefixes)
            .compile([record(json!({
                "appliesToCat": "http://example.org/Person",
                "item": "http://example.org/status",
                "hasValueUri": ["http://example.org/Active"],
                "hasValueLiteral": ["active"],
                "propShapeUid": "http://example.org/S"
            }))])
            .unwrap();
        assert_eq!(plan.entries().len(), 2);
        let params = &plan.params()["http://example.org/S_http://www.w3.org/ns/shacl#hasValue"];
        assert_eq!(params["theHasValueUri"], json!(["http://example.org/Active"]));
        assert_eq!(params["theHasValueLiteral"], json!(["active"]));
    }

    #[test]
    fn node_kinds() {
        let prefixes = prefixes();
        let config = config(json!({"handleVocabUris": "IGNORE"}));
        let plan = ShaclCompiler::new(Some(&config), &prefixes)
            .compile([
                record(json!({
                    "appliesToCat": "http://example.org/Person",
                    "item": "http://example.org/name",
                    "rangeKind": "http://www.w3.org/ns/shacl#Literal",
                    "propShapeUid": "http://example.org/A"
                })),
                record(json!({
                    "appliesToCat": "http://example.org/Person",
                    "item": "http://example.org/knows",
                    "rangeKind": "http://www.w3.org/ns/shacl#BlankNodeOrIRI",
                    "propShapeUid": "http://example.org/B"
                })),
                record(json!({
                    "appliesToCat": "http://example.org/Person",
                    "item": "http://example.org/id",
                    "rangeKind": "http://www.w3.org/ns/shacl#IRI",
                    "propShapeUid": "http://example.org/C"
                })),
            ])
            .unwrap();
        assert_eq!(plan.entries().len(), 2);
        assert!(plan.entries()[0].query(Scope::Global).contains(" (focus)-[:`name`]->() RETURN"));
        assert!(plan.entries()[1].query(Scope::Global).contains(" exists(focus.`knows`) RETURN"));
        let values: Vec<_> = plan.inventory().iter().map(|c| c.value.clone()).collect();
        assert_eq!(values, [json!("Literal"), json!("BlankNodeOrIRI"), json!("IRI")]);
        assert!(plan.inventory().iter().all(|c| c.kind == "nodeKind"));
    }

    #[test]
    fn class_triggers_on_both_labels() {
        let prefixes = prefixes();
        let config = GraphConfig::default();
        let plan = ShaclCompiler::new(Some(&config), &prefixes)
            .compile([record(json!({
                "appliesToCat": "http://example.org/Person",
                "item": "http://example.org/worksFor",
                "rangeType": "http://example.org/Company",
                "propShapeUid": "http://example.org/S"
            }))])
            .unwrap();
        assert_eq!(plan.entries().len(), 2);
        for entry in plan.entries() {
            assert_eq!(entry.triggers(), ["ex__Person", "ex__Company"]);
        }
        assert!(plan.entries()[0].query(Scope::Global).starts_with(
            "MATCH (focus:`ex__Person`)-[r:`ex__worksFor`]->(x) WHERE NOT x:`ex__Company` RETURN"
        ));
        assert_eq!(plan.inventory()[0].value, json!("ex__Company"));
    }

    #[test]
    fn constraints_on_type_under_labels() {
        let prefixes = prefixes();
        let config = GraphConfig::default();
        let plan = ShaclCompiler::new(Some(&config), &prefixes)
            .compile([record(json!({
                "appliesToCat": "http://example.org/Person",
                "item": rdf::TYPE.as_str(),
                "dataType": "http://www.w3.org/2001/XMLSchema#string",
                "pattern": "^x",
                "inUris": ["http://example.org/Person", "http://example.org/Agent"],
                "maxCount": 2,
                "propShapeUid": "http://example.org/S"
            }))])
            .unwrap();
        let kinds: Vec<_> = plan.entries().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, [ConstraintKind::In, ConstraintKind::MaxCount]);
        assert!(plan.entries()[0].query(Scope::Global).contains("params.theInTypeTranslatedUris"));
        assert!(plan.entries()[1].query(Scope::Global).contains(
            "NOT size( [x in labels(focus) where x <> 'Resource' ] )   <= toInteger(params.maxCount)"
        ));
        assert_eq!(plan.inventory()[0].value, json!(["ex__Person", "ex__Agent"]));
    }

    #[test]
    fn length_and_range() {
        let prefixes = prefixes();
        let plan = ShaclCompiler::new(None, &prefixes)
            .compile([record(json!({
                "appliesToCat": "http://example.org/Person",
                "item": "http://example.org/age",
                "maxStrLen": 3,
                "minExc": 0,
                "maxInc": 150.5,
                "propShapeUid": "http://example.org/S"
            }))])
            .unwrap();
        assert_eq!(plan.entries().len(), 2);
        assert_eq!(plan.entries()[0].kind(), ConstraintKind::MaxLength);
        assert!(
            plan.entries()[0]
                .query(Scope::Global)
                .contains("where  size(toString(x))  <= params.maxStrLen  )")
        );
        assert_eq!(plan.entries()[1].kind(), ConstraintKind::MaxInclusive);
        assert!(
            plan.entries()[1]
                .query(Scope::Global)
                .contains("where  params.min <  x  <= params.max  )")
        );

        let length = &plan.params()["http://example.org/S_http://www.w3.org/ns/shacl#minLength"];
        assert_eq!(length["minStrLen"], Value::Null);
        assert_eq!(length["maxStrLen"], json!(3));
        let range = &plan.params()["http://example.org/S_http://www.w3.org/ns/shacl#minExclusive"];
        assert_eq!(range["min"], json!(0));
        assert_eq!(range["max"], json!(150.5));

        let kinds: Vec<_> = plan.inventory().iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(kinds, ["maxLength", "maxInclusive", "minExclusive"]);
    }

    #[test]
    fn disjoint_classes() {
        let prefixes = prefixes();
        let config = GraphConfig::default();
        let plan = ShaclCompiler::new(Some(&config), &prefixes)
            .compile([record(json!({
                "appliesToCat": "http://example.org/Person",
                "nodeShapeUid": "http://example.org/PersonShape",
                "disjointClass": ["http://example.org/Robot", "http://example.org/Animal"],
                "reqClass": ["http://example.org/Agent"]
            }))])
            .unwrap();
        assert_eq!(plan.entries().len(), 2);
        assert_eq!(plan.entries()[1].triggers(), ["ex__Person", "ex__Animal"]);
        assert!(plan.entries()[1].query(Scope::Global).contains(" focus:`ex__Animal` RETURN"));
        assert!(plan.entries()[1].path().is_none());
        assert_eq!(plan.inventory().len(), 2);
        assert_eq!(plan.inventory()[0].kind, "sh:not");
        assert_eq!(plan.inventory()[0].path, None);
    }

    #[test]
    fn unknown_namespace_aborts() {
        let prefixes = prefixes();
        let config = GraphConfig::default();
        let result = ShaclCompiler::new(Some(&config), &prefixes).compile([record(json!({
            "appliesToCat": "http://example.org/Person",
            "item": "http://other.org/age",
            "minCount": 1
        }))]);
        assert!(matches!(
            result,
            Err(ShaclCompileError::UriNamespaceUnknown { ref namespace, .. }) if namespace == "http://other.org/"
        ));
    }
}
