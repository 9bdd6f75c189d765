//! The `init`/`set`/`show`/`drop` control surface.
//!
//! Every procedure returns the resulting external view of the configuration
//! (empty when there is none).

use crate::config::{ConfigItem, GraphConfig, Properties, storage_keys};
use crate::error::GraphConfigError;
use crate::store::GraphConfigStore;
use serde_json::Value;

/// Key of the `set` property that allows changing the configuration of a non-empty graph.
pub const FORCE: &str = "force";

/// Creates the configuration of an empty graph, replacing any previous one.
pub fn init(
    store: &mut impl GraphConfigStore,
    props: &Properties,
) -> Result<Vec<ConfigItem>, GraphConfigError> {
    if store.has_resources()? {
        return Err(GraphConfigError::GraphNotEmpty);
    }
    let config = GraphConfig::from_properties(props)?;
    save(store, &config)?;
    tracing::debug!(mode = %config.handle_vocab_uris(), "graph config initialised");
    Ok(config.to_items())
}

/// Merges `props` into the stored configuration.
///
/// The graph must be empty unless `props` carries `force: true`.
pub fn set(
    store: &mut impl GraphConfigStore,
    props: &Properties,
) -> Result<Vec<ConfigItem>, GraphConfigError> {
    let force = matches!(props.get(FORCE), Some(Value::Bool(true)));
    if !force && store.has_resources()? {
        return Err(GraphConfigError::GraphNotEmpty);
    }
    let stored = store
        .load_config()?
        .ok_or(GraphConfigError::GraphConfigMissing)?;
    let mut config = GraphConfig::from_stored(&stored)?;
    config.add(props)?;
    save(store, &config)?;
    tracing::debug!(force, "graph config updated");
    Ok(config.to_items())
}

/// The external view of the stored configuration.
pub fn show(store: &impl GraphConfigStore) -> Result<Vec<ConfigItem>, GraphConfigError> {
    match store.load_config()? {
        Some(stored) => Ok(GraphConfig::from_stored(&stored)?.to_items()),
        None => Ok(Vec::new()),
    }
}

/// Removes the configuration of an empty graph.
pub fn drop(store: &mut impl GraphConfigStore) -> Result<Vec<ConfigItem>, GraphConfigError> {
    if store.has_resources()? {
        return Err(GraphConfigError::GraphNotEmpty);
    }
    store.delete_config()?;
    tracing::debug!("graph config dropped");
    Ok(Vec::new())
}

/// Loads the stored configuration, if any.
pub fn load(store: &impl GraphConfigStore) -> Result<Option<GraphConfig>, GraphConfigError> {
    store
        .load_config()?
        .map(|stored| GraphConfig::from_stored(&stored))
        .transpose()
}

fn save(store: &mut impl GraphConfigStore, config: &GraphConfig) -> Result<(), GraphConfigError> {
    let mut stored = config.to_stored();
    let node_properties = match stored.remove(storage_keys::FORCIBLY_ASSIGNED_NODE_PROPERTIES) {
        Some(Value::Object(map)) => map,
        _ => Properties::new(),
    };
    store.save_config(stored, node_properties)
}
