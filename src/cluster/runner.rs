use super::source::ConnectionSource;
use crate::core::{MetaError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Outcome of one probe, handed to the job's callback exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub success: bool,
    pub row: Option<HashMap<String, String>>,
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn success(row: HashMap<String, String>) -> Self {
        Self {
            success: true,
            row: Some(row),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            row: None,
            error: Some(error.into()),
        }
    }

    pub fn column(&self, name: &str) -> Option<&str> {
        self.row.as_ref()?.get(name).map(String::as_str)
    }
}

pub type ProbeCallback = Box<dyn FnOnce(ProbeResult) + Send + 'static>;

/// A single-row query bound for one data node.
#[derive(Clone)]
pub struct SqlJob {
    pub sql: String,
    pub database: String,
    pub data_node: String,
    pub expected_columns: Vec<String>,
    /// Free-form label carried into log lines.
    pub mark: String,
    pub source: Arc<dyn ConnectionSource>,
}

impl fmt::Debug for SqlJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlJob")
            .field("sql", &self.sql)
            .field("database", &self.database)
            .field("data_node", &self.data_node)
            .field("expected_columns", &self.expected_columns)
            .field("mark", &self.mark)
            .finish()
    }
}

/// Fires SQL jobs and reports each result through its callback.
///
/// Implementations must call the callback exactly once per submitted job,
/// from any thread, and must not block the submitter.
pub trait SqlJobRunner: Send + Sync {
    fn submit(&self, job: SqlJob, callback: ProbeCallback);
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Per-attempt query timeout
    pub query_timeout: Duration,
    /// Attempts per job, including the first
    pub max_attempts: usize,
    /// Pause between attempts
    pub retry_backoff: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(30),
            max_attempts: 1,
            retry_backoff: Duration::from_millis(50),
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set query timeout
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Set maximum attempts
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set backoff between attempts
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.query_timeout.is_zero() {
            return Err("query_timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Runs every job on its own tokio task.
pub struct TokioSqlJobRunner {
    handle: Handle,
    config: RunnerConfig,
}

impl TokioSqlJobRunner {
    /// Creates a runner on the current tokio runtime.
    pub fn new(config: RunnerConfig) -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| MetaError::InvalidConfig(format!("no tokio runtime: {}", e)))?;
        Self::with_handle(handle, config)
    }

    pub fn with_handle(handle: Handle, config: RunnerConfig) -> Result<Self> {
        config.validate().map_err(MetaError::InvalidConfig)?;
        Ok(Self { handle, config })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }
}

impl SqlJobRunner for TokioSqlJobRunner {
    fn submit(&self, job: SqlJob, callback: ProbeCallback) {
        let config = self.config.clone();
        self.handle.spawn(async move {
            let result = match run_job(&job, &config).await {
                Ok(row) => ProbeResult::success(row),
                Err(err) => ProbeResult::failure(err.to_string()),
            };
            callback(result);
        });
    }
}

async fn run_job(job: &SqlJob, config: &RunnerConfig) -> Result<HashMap<String, String>> {
    let mut attempt = 1;
    loop {
        debug!(
            data_node = %job.data_node,
            database = %job.database,
            mark = %job.mark,
            attempt,
            "running sql job: {}",
            job.sql
        );

        let outcome = match tokio::time::timeout(
            config.query_timeout,
            job.source.query_one_row(&job.database, &job.sql),
        )
        .await
        {
            Ok(result) => result.and_then(|row| project_row(job, row)),
            Err(_) => Err(MetaError::Timeout(job.data_node.clone(), config.query_timeout)),
        };

        match outcome {
            Ok(row) => return Ok(row),
            Err(err) if attempt < config.max_attempts => {
                warn!(
                    data_node = %job.data_node,
                    mark = %job.mark,
                    attempt,
                    error = %err,
                    "sql job failed, retrying"
                );
                attempt += 1;
                tokio::time::sleep(config.retry_backoff).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Keeps only the expected columns; a missing one fails the job.
fn project_row(job: &SqlJob, mut row: HashMap<String, String>) -> Result<HashMap<String, String>> {
    let mut projected = HashMap::with_capacity(job.expected_columns.len());
    for column in &job.expected_columns {
        let value = row
            .remove(column)
            .ok_or_else(|| MetaError::MissingColumn(column.clone(), job.data_node.clone()))?;
        projected.insert(column.clone(), value);
    }
    Ok(projected)
}
