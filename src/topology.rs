//! Shard topology file used by the command line tool.
//!
//! ```json
//! {
//!   "schema": "shop",
//!   "tables": [{ "name": "orders", "data_nodes": ["dn1", "dn2"] }],
//!   "data_nodes": {
//!     "dn1": { "database": "shop_0", "tables": { "orders": "CREATE TABLE ..." } },
//!     "dn2": { "database": "shop_1", "unreachable": true }
//!   }
//! }
//! ```

use crate::cluster::{InMemoryShardRegistry, StaticConnectionSource};
use crate::core::{MetaError, Result};
use crate::reconciler::TableConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topology {
    pub schema: String,
    pub tables: Vec<TableTopology>,
    #[serde(default)]
    pub data_nodes: BTreeMap<String, DataNodeTopology>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableTopology {
    pub name: String,
    pub data_nodes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataNodeTopology {
    pub database: String,
    /// Table name -> DDL the node reports for it.
    #[serde(default)]
    pub tables: BTreeMap<String, String>,
    #[serde(default)]
    pub unreachable: bool,
}

impl Topology {
    pub fn from_json(json: &str) -> Result<Self> {
        let topology: Topology = serde_json::from_str(json)?;
        topology.validate()?;
        Ok(topology)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema.trim().is_empty() {
            return Err(MetaError::InvalidConfig("schema must not be empty".into()));
        }
        for table in &self.tables {
            if table.data_nodes.is_empty() {
                return Err(MetaError::InvalidConfig(format!(
                    "table '{}' has no data nodes",
                    table.name
                )));
            }
        }
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&TableTopology> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Registers every data node with an in-memory backend.
    ///
    /// Data nodes referenced by a table but missing here stay unregistered and
    /// fail at dispatch time.
    pub fn build_registry(&self) -> Result<InMemoryShardRegistry> {
        let registry = InMemoryShardRegistry::new();
        for (name, node) in &self.data_nodes {
            let source = if node.unreachable {
                StaticConnectionSource::unreachable(name.as_str())
            } else {
                node.tables
                    .iter()
                    .fold(StaticConnectionSource::new(name.as_str()), |source, (table, ddl)| {
                        source.with_table(table.as_str(), ddl.as_str())
                    })
            };
            registry.register_data_node(name.as_str(), node.database.as_str(), Arc::new(source))?;
        }
        Ok(registry)
    }

    pub fn table_configs(&self) -> Result<Vec<Arc<TableConfig>>> {
        self.tables
            .iter()
            .map(|t| TableConfig::new(t.name.as_str(), t.data_nodes.clone()).map(Arc::new))
            .collect()
    }
}
