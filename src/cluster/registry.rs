use super::source::ConnectionSource;
use crate::core::{MetaError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Physical backend of one data node.
#[derive(Clone)]
pub struct ShardBackend {
    pub database: String,
    pub source: Arc<dyn ConnectionSource>,
}

/// Resolves a logical data node ID to its physical backend.
pub trait ShardRegistry: Send + Sync {
    fn lookup(&self, data_node: &str) -> Result<ShardBackend>;
}

/// Registry backed by a map, filled at startup or by tests.
#[derive(Clone, Default)]
pub struct InMemoryShardRegistry {
    nodes: Arc<RwLock<HashMap<String, Option<ShardBackend>>>>,
}

impl InMemoryShardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a data node.
    pub fn register_data_node(
        &self,
        data_node: impl Into<String>,
        database: impl Into<String>,
        source: Arc<dyn ConnectionSource>,
    ) -> Result<()> {
        let data_node = data_node.into();
        let database = database.into();
        if data_node.trim().is_empty() {
            return Err(MetaError::InvalidConfig(
                "data node name must not be empty".to_string(),
            ));
        }
        if database.trim().is_empty() {
            return Err(MetaError::InvalidConfig(format!(
                "data node '{}' must name a database",
                data_node
            )));
        }

        let mut nodes = self.nodes.write()?;
        nodes.insert(data_node, Some(ShardBackend { database, source }));
        Ok(())
    }

    /// Registers a data node that is known but has no connection pool yet.
    pub fn register_detached(&self, data_node: impl Into<String>) -> Result<()> {
        let mut nodes = self.nodes.write()?;
        nodes.insert(data_node.into(), None);
        Ok(())
    }

    pub fn remove_data_node(&self, data_node: &str) -> Result<bool> {
        let mut nodes = self.nodes.write()?;
        Ok(nodes.remove(data_node).is_some())
    }

    pub fn len(&self) -> usize {
        self.nodes.read().map(|nodes| nodes.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ShardRegistry for InMemoryShardRegistry {
    fn lookup(&self, data_node: &str) -> Result<ShardBackend> {
        let nodes = self.nodes.read()?;
        match nodes.get(data_node) {
            Some(Some(backend)) => Ok(backend.clone()),
            Some(None) => Err(MetaError::NoConnectionSource(data_node.to_string())),
            None => Err(MetaError::UnknownDataNode(data_node.to_string())),
        }
    }
}
