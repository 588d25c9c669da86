// Shard access is split by responsibility: where a data node lives, how it is
// queried, and who runs the queries.
pub mod registry;
pub mod runner;
pub mod source;

pub use registry::{InMemoryShardRegistry, ShardBackend, ShardRegistry};
pub use runner::{ProbeCallback, ProbeResult, RunnerConfig, SqlJob, SqlJobRunner, TokioSqlJobRunner};
pub use source::{ConnectionSource, StaticConnectionSource};
