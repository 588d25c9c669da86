// ============================================================================
// shardmeta library
// ============================================================================

pub mod core;
pub mod meta;
pub mod parser;
pub mod cluster;
pub mod reconciler;
pub mod topology;

// Re-export main types for convenience
pub use core::{MetaError, Result};
pub use meta::{ColumnMeta, IndexKind, IndexMeta, TableMeta, init_table_meta};
pub use parser::{DdlParser, MySqlDdlParser};

pub use cluster::{
    ConnectionSource, InMemoryShardRegistry, ProbeCallback, ProbeResult, RunnerConfig,
    ShardBackend, ShardRegistry, SqlJob, SqlJobRunner, StaticConnectionSource, TokioSqlJobRunner,
};
pub use reconciler::{
    ChannelMetaHandler, DriftGroup, DriftReport, PassOutcome, PassState, StructureLock,
    TableConfig, TableMetaHandler, TableMetaReconciler, TableStructureState,
};
pub use topology::Topology;
