use super::config::DataNodeTableStructureSqlMap;
use crate::meta::TableMeta;
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Consumer of a finished pass.
///
/// All hooks run while the table's structure lock is held, so they must not
/// take that lock again or start another pass over the same table.
pub trait TableMetaHandler: Send + Sync {
    /// Receives the reconciled meta, or `None` when no shard produced one.
    fn handle_table(&self, table_meta: Option<TableMeta>);

    /// Releases whatever latch the caller waits on. Always called last.
    fn countdown(&self);

    /// Called before `handle_table` when shards disagree structurally.
    fn drift_detected(&self, _report: &DriftReport) {}
}

/// One distinct DDL text and the data nodes reporting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftGroup {
    pub data_nodes: Vec<String>,
    pub ddl: String,
}

/// Inventory of a table whose shards report structurally different schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub table: String,
    pub groups: Vec<DriftGroup>,
}

impl DriftReport {
    pub fn from_structure(table: impl Into<String>, map: &DataNodeTableStructureSqlMap) -> Self {
        Self {
            table: table.into(),
            groups: map
                .iter()
                .map(|(ddl, data_nodes)| DriftGroup {
                    data_nodes: data_nodes.clone(),
                    ddl: ddl.clone(),
                })
                .collect(),
        }
    }

    pub fn data_nodes_for(&self, ddl: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|group| group.ddl == ddl)
            .map(|group| group.data_nodes.as_slice())
    }
}

impl fmt::Display for DriftGroup {
    /// `DataNode:[dn1]DataNode:[dn2]:<ddl>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for data_node in &self.data_nodes {
            write!(f, "DataNode:[{}]", data_node)?;
        }
        write!(f, ":{}", self.ddl)
    }
}

/// What a pass produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassOutcome {
    pub table_meta: Option<TableMeta>,
    pub drift: Option<DriftReport>,
}

impl PassOutcome {
    pub fn has_drift(&self) -> bool {
        self.drift.is_some()
    }
}

/// Handler that delivers the [`PassOutcome`] over a oneshot channel.
pub struct ChannelMetaHandler {
    outcome: Mutex<PassOutcome>,
    sender: Mutex<Option<oneshot::Sender<PassOutcome>>>,
}

impl ChannelMetaHandler {
    pub fn new() -> (Self, oneshot::Receiver<PassOutcome>) {
        let (sender, receiver) = oneshot::channel();
        let handler = Self {
            outcome: Mutex::new(PassOutcome::default()),
            sender: Mutex::new(Some(sender)),
        };
        (handler, receiver)
    }
}

impl TableMetaHandler for ChannelMetaHandler {
    fn handle_table(&self, table_meta: Option<TableMeta>) {
        if let Ok(mut outcome) = self.outcome.lock() {
            outcome.table_meta = table_meta;
        }
    }

    fn countdown(&self) {
        let outcome = self
            .outcome
            .lock()
            .map(|mut outcome| std::mem::take(&mut *outcome))
            .unwrap_or_default();
        let sender = self.sender.lock().ok().and_then(|mut sender| sender.take());
        if let Some(sender) = sender {
            // The receiver may have given up waiting; nothing left to notify.
            let _ = sender.send(outcome);
        }
    }

    fn drift_detected(&self, report: &DriftReport) {
        if let Ok(mut outcome) = self.outcome.lock() {
            outcome.drift = Some(report.clone());
        }
    }
}
