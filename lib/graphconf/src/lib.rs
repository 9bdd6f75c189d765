#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
mod mode;
mod names;
pub mod procedures;
mod store;

pub use crate::config::{
    ConfigItem, DEFAULT_BASE_SCHEMA_NAMESPACE, DEFAULT_BASE_SCHEMA_PREFIX, GraphConfig,
    Properties, keys, storage_keys,
};
pub use crate::error::GraphConfigError;
pub use crate::mode::{GraphMode, MultivalMode, RdfTypesMode, VocabUrisMode};
pub use crate::names::{
    is_correct_uri_split, is_valid_prefix, local_name, local_name_index, namespace,
};
pub use crate::store::{
    GRAPH_CONFIG_LABEL, GraphConfigStore, HAS_REL, MemoryGraphStore, NODE_PROPERTIES_LABEL,
};
