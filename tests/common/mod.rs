#![allow(dead_code)]

use shardmeta::{
    DriftReport, InMemoryShardRegistry, ProbeCallback, RunnerConfig, SqlJob, SqlJobRunner,
    StaticConnectionSource, TableConfig, TableMeta, TableMetaHandler, TableMetaReconciler,
    TokioSqlJobRunner,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const SIMPLE_DDL: &str =
    "CREATE TABLE t (id INT NOT NULL AUTO_INCREMENT, name VARCHAR(32), PRIMARY KEY (id))";

/// Handler that records every hook invocation.
#[derive(Default)]
pub struct RecordingHandler {
    pub handle_calls: AtomicUsize,
    pub countdown_calls: AtomicUsize,
    pub metas: Mutex<Vec<Option<TableMeta>>>,
    pub drift: Mutex<Vec<DriftReport>>,
    pub done: Notify,
}

impl RecordingHandler {
    pub fn handle_calls(&self) -> usize {
        self.handle_calls.load(Ordering::SeqCst)
    }

    pub fn countdown_calls(&self) -> usize {
        self.countdown_calls.load(Ordering::SeqCst)
    }

    pub fn last_meta(&self) -> Option<TableMeta> {
        self.metas.lock().unwrap().last().cloned().flatten()
    }

    pub fn drift_reports(&self) -> Vec<DriftReport> {
        self.drift.lock().unwrap().clone()
    }

    /// Waits for `countdown`, failing the test after five seconds.
    pub async fn wait_done(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.done.notified())
            .await
            .expect("pass did not finish");
    }
}

impl TableMetaHandler for RecordingHandler {
    fn handle_table(&self, table_meta: Option<TableMeta>) {
        assert_eq!(
            self.countdown_calls(),
            0,
            "countdown must run after handle_table"
        );
        self.handle_calls.fetch_add(1, Ordering::SeqCst);
        self.metas.lock().unwrap().push(table_meta);
    }

    fn countdown(&self) {
        self.countdown_calls.fetch_add(1, Ordering::SeqCst);
        self.done.notify_one();
    }

    fn drift_detected(&self, report: &DriftReport) {
        self.drift.lock().unwrap().push(report.clone());
    }
}

/// Runner that parks callbacks until the test fires them.
#[derive(Default)]
pub struct ManualJobRunner {
    pub jobs: Mutex<Vec<(SqlJob, ProbeCallback)>>,
}

impl ManualJobRunner {
    pub fn take(&self) -> Vec<(SqlJob, ProbeCallback)> {
        std::mem::take(&mut *self.jobs.lock().unwrap())
    }
}

impl SqlJobRunner for ManualJobRunner {
    fn submit(&self, job: SqlJob, callback: ProbeCallback) {
        self.jobs.lock().unwrap().push((job, callback));
    }
}

pub fn table(nodes: &[&str]) -> Arc<TableConfig> {
    Arc::new(TableConfig::new("t", nodes.iter().map(|n| n.to_string()).collect()).unwrap())
}

/// Registry where each data node reports the given DDL, or is down when `None`.
pub fn registry(nodes: &[(&str, Option<&str>)]) -> Arc<InMemoryShardRegistry> {
    let registry = InMemoryShardRegistry::new();
    for (node, ddl) in nodes {
        let source = match ddl {
            Some(ddl) => StaticConnectionSource::new(*node).with_table("t", *ddl),
            None => StaticConnectionSource::unreachable(*node),
        };
        registry
            .register_data_node(*node, format!("db_{}", node), Arc::new(source))
            .unwrap();
    }
    Arc::new(registry)
}

pub fn tokio_reconciler(registry: Arc<InMemoryShardRegistry>) -> TableMetaReconciler {
    let runner = TokioSqlJobRunner::new(RunnerConfig::default()).unwrap();
    TableMetaReconciler::new(registry, Arc::new(runner))
}
