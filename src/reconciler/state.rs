use super::config::TableConfig;
use super::handler::TableMetaHandler;
use crate::parser::DdlParser;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{Span, info_span};
use uuid::Uuid;

/// State of one reconciliation pass, shared by every per-shard callback.
pub struct PassState {
    pub(crate) pass_id: Uuid,
    pub(crate) schema: String,
    pub(crate) table: Arc<TableConfig>,
    /// Wall-clock timestamp (ms) captured once at pass start.
    pub(crate) version: i64,
    pub(crate) parser: Arc<dyn DdlParser>,
    pub(crate) handler: Arc<dyn TableMetaHandler>,
    pub(crate) span: Span,
    outstanding: AtomicUsize,
}

impl PassState {
    pub(crate) fn new(
        schema: impl Into<String>,
        table: Arc<TableConfig>,
        parser: Arc<dyn DdlParser>,
        handler: Arc<dyn TableMetaHandler>,
    ) -> Self {
        let schema = schema.into();
        let pass_id = Uuid::new_v4();
        let version = chrono::Utc::now().timestamp_millis();
        let span = info_span!(
            "table_meta_pass",
            %pass_id,
            schema = %schema,
            table = %table.name(),
            version
        );
        Self {
            pass_id,
            schema,
            outstanding: AtomicUsize::new(table.data_nodes().len()),
            table,
            version,
            parser,
            handler,
            span,
        }
    }

    pub fn pass_id(&self) -> Uuid {
        self.pass_id
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Decrements the outstanding-shard counter and returns what is left.
    ///
    /// Returns `None` when the counter is already zero; it never wraps.
    pub(crate) fn decrement(&self) -> Option<usize> {
        self.outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|previous| previous - 1)
    }
}
