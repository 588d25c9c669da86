// ============================================================================
// Table metadata reconciliation: one pass probes every data node of a table,
// groups the reported DDL, and hands a single TableMeta downstream.
// ============================================================================

pub mod config;
pub mod handler;
pub mod state;
mod collector;
mod finisher;

pub use config::{DataNodeTableStructureSqlMap, StructureLock, TableConfig, TableStructureState};
pub use handler::{ChannelMetaHandler, DriftGroup, DriftReport, PassOutcome, TableMetaHandler};
pub use state::PassState;

use crate::cluster::{ProbeResult, ShardRegistry, SqlJob, SqlJobRunner};
use crate::core::{MetaError, Result};
use crate::parser::{DdlParser, MySqlDdlParser};
use collector::probe_callback;
use std::sync::Arc;
use tracing::{debug, warn};

/// Query prefix sent to every data node.
pub const SHOW_CREATE_TABLE_PREFIX: &str = "show create table ";
/// Result column holding the table name.
pub const TABLE_COLUMN: &str = "Table";
/// Result column holding the DDL text.
pub const CREATE_TABLE_COLUMN: &str = "Create Table";
/// Label attached to every probe job.
pub const TABLE_STRUCTURE_MARK: &str = "Table Structure";

/// Dispatches reconciliation passes.
pub struct TableMetaReconciler {
    registry: Arc<dyn ShardRegistry>,
    runner: Arc<dyn SqlJobRunner>,
    parser: Arc<dyn DdlParser>,
}

impl TableMetaReconciler {
    /// Creates a reconciler parsing MySQL DDL.
    pub fn new(registry: Arc<dyn ShardRegistry>, runner: Arc<dyn SqlJobRunner>) -> Self {
        Self::with_parser(registry, runner, Arc::new(MySqlDdlParser::new()))
    }

    pub fn with_parser(
        registry: Arc<dyn ShardRegistry>,
        runner: Arc<dyn SqlJobRunner>,
        parser: Arc<dyn DdlParser>,
    ) -> Self {
        Self {
            registry,
            runner,
            parser,
        }
    }

    /// Starts a pass over `table` and returns without waiting for it.
    ///
    /// `handler` is invoked exactly once per hook when the last data node
    /// reports. Returns the pass state so callers can observe its progress.
    pub fn execute(
        &self,
        schema: &str,
        table: Arc<TableConfig>,
        handler: Arc<dyn TableMetaHandler>,
    ) -> Result<Arc<PassState>> {
        if table.data_nodes().is_empty() {
            return Err(MetaError::InvalidConfig(format!(
                "table '{}' has no data nodes",
                table.name()
            )));
        }

        table.write_structure().reset();

        let state = Arc::new(PassState::new(
            schema,
            Arc::clone(&table),
            Arc::clone(&self.parser),
            handler,
        ));

        for data_node in table.data_nodes() {
            self.dispatch(&state, data_node);
        }

        Ok(state)
    }

    /// Runs a full pass and waits for its outcome.
    pub async fn reconcile(&self, schema: &str, table: Arc<TableConfig>) -> Result<PassOutcome> {
        let (handler, receiver) = ChannelMetaHandler::new();
        let name = table.name().to_string();
        self.execute(schema, table, Arc::new(handler))?;
        receiver.await.map_err(|_| {
            MetaError::QueryFailed(name, "pass dropped before completion".to_string())
        })
    }

    fn dispatch(&self, state: &Arc<PassState>, data_node: &str) {
        let callback = probe_callback(Arc::clone(state), data_node.to_string());
        let table = state.table.name();

        match self.registry.lookup(data_node) {
            Ok(backend) => {
                let job = SqlJob {
                    sql: format!("{}{}", SHOW_CREATE_TABLE_PREFIX, table),
                    database: backend.database,
                    data_node: data_node.to_string(),
                    expected_columns: vec![TABLE_COLUMN.to_string(), CREATE_TABLE_COLUMN.to_string()],
                    mark: TABLE_STRUCTURE_MARK.to_string(),
                    source: backend.source,
                };
                debug!(parent: &state.span, %data_node, database = %job.database, "submitting probe");
                self.runner.submit(job, callback);
            }
            Err(err) => {
                warn!(parent: &state.span, %table, %data_node, error = %err, "cannot dispatch probe");
                callback(ProbeResult::failure(err.to_string()));
            }
        }
    }
}
