#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod compiler;
mod constraint;
mod error;
mod parser;
mod plan;
mod prefix;
mod record;
mod template;
mod translate;
pub mod vocab;

pub use crate::compiler::ShaclCompiler;
pub use crate::constraint::{
    Constraint, ConstraintHeader, ConstraintKind, ConstraintSet, NodeKind, PathStep, Severity,
    ValueRange,
};
pub use crate::error::{ShaclCompileError, ShaclError, ShapesParseError};
pub use crate::parser::{ShapesParser, ShapesParserOptions};
pub use crate::plan::{ConstraintComponent, PlanEntry, ValidatorPlan};
pub use crate::prefix::{PrefixResolver, PrefixTable};
pub use crate::record::{
    BNODE_PREFIX, CLOSED_DEFINITION_PROP_LIST, ConstraintRecord, VALUE_SEPARATOR, split_values,
};
pub use crate::template::{
    PLACEHOLDER, QueryTemplate, Scope, TOUCHED_NODES_FILTER, TemplateContext, datatype_cast,
    render,
};
pub use crate::translate::{PREFIX_SEPARATOR, UriTranslator};
use graphconf::GraphConfig;
use oxrdfio::RdfFormat;
use std::io::Read;

/// Reads a shapes document and compiles it into a [`ValidatorPlan`].
///
/// This is [`ShapesParser::parse`] followed by [`ShaclCompiler::compile`].
///
/// Any [`RdfFormat`] is accepted. TriX is not supported, as `oxrdfio` has no TriX parser.
pub fn compile_document(
    reader: impl Read,
    format: RdfFormat,
    options: &ShapesParserOptions,
    config: Option<&GraphConfig>,
    resolver: &dyn PrefixResolver,
) -> Result<ValidatorPlan, ShaclError> {
    let records = ShapesParser::new(options.clone()).parse(reader, format)?;
    Ok(ShaclCompiler::new(config, resolver).compile(&records)?)
}
