use crate::core::{MetaError, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

/// DDL text -> data nodes that reported exactly that text, in arrival order.
pub type DataNodeTableStructureSqlMap = BTreeMap<String, Vec<String>>;

/// Lock handle guarding a table's structure state.
///
/// Owned by the surrounding schema-management code and shared with every pass
/// over the table; holding the write side serializes all probe callbacks.
pub type StructureLock = Arc<RwLock<TableStructureState>>;

/// Mutable per-table state written by reconciliation passes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TableStructureState {
    data_node_table_structure_sql_map: DataNodeTableStructureSqlMap,
}

impl TableStructureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.data_node_table_structure_sql_map = BTreeMap::new();
    }

    /// Adds `data_node` to the group keyed by the raw `ddl` text.
    pub fn record(&mut self, ddl: &str, data_node: &str) {
        if let Some(data_nodes) = self.data_node_table_structure_sql_map.get_mut(ddl) {
            data_nodes.push(data_node.to_string());
        } else {
            self.data_node_table_structure_sql_map
                .insert(ddl.to_string(), vec![data_node.to_string()]);
        }
    }

    pub fn structure_sql_map(&self) -> &DataNodeTableStructureSqlMap {
        &self.data_node_table_structure_sql_map
    }

    pub fn group_count(&self) -> usize {
        self.data_node_table_structure_sql_map.len()
    }

    pub fn data_nodes_for(&self, ddl: &str) -> Option<&[String]> {
        self.data_node_table_structure_sql_map
            .get(ddl)
            .map(Vec::as_slice)
    }
}

/// Logical table distributed across data nodes.
#[derive(Debug, Clone)]
pub struct TableConfig {
    name: String,
    data_nodes: Vec<String>,
    structure: StructureLock,
}

impl TableConfig {
    /// Creates a table config with its own structure lock.
    pub fn new(name: impl Into<String>, data_nodes: Vec<String>) -> Result<Self> {
        Self::with_lock(name, data_nodes, Arc::new(RwLock::new(TableStructureState::new())))
    }

    /// Creates a table config sharing an existing structure lock.
    pub fn with_lock(
        name: impl Into<String>,
        data_nodes: Vec<String>,
        structure: StructureLock,
    ) -> Result<Self> {
        let config = Self {
            name: name.into(),
            data_nodes,
            structure,
        };
        config.validate().map_err(MetaError::InvalidConfig)?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("table name must not be empty".to_string());
        }
        if self.data_nodes.is_empty() {
            return Err(format!("table '{}' has no data nodes", self.name));
        }
        if let Some(blank) = self.data_nodes.iter().position(|dn| dn.trim().is_empty()) {
            return Err(format!(
                "table '{}' has a blank data node at position {}",
                self.name, blank
            ));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_nodes(&self) -> &[String] {
        &self.data_nodes
    }

    pub fn structure_lock(&self) -> &StructureLock {
        &self.structure
    }

    /// Takes the write side of the structure lock.
    ///
    /// A poisoned lock only means an earlier holder panicked; the map it
    /// guards is still a valid grouping, so the guard is recovered.
    pub fn write_structure(&self) -> RwLockWriteGuard<'_, TableStructureState> {
        self.structure
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current DDL grouping.
    pub fn structure_snapshot(&self) -> Result<DataNodeTableStructureSqlMap> {
        let state = self.structure.read()?;
        Ok(state.structure_sql_map().clone())
    }
}
