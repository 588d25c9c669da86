use crate::core::{MetaError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A physical backend that can answer single-row queries.
#[async_trait]
pub trait ConnectionSource: Send + Sync {
    /// Runs `sql` against `database` and returns the first row keyed by column name.
    async fn query_one_row(&self, database: &str, sql: &str) -> Result<HashMap<String, String>>;
}

const SHOW_CREATE_TABLE: &str = "show create table ";

/// In-memory shard that only understands `show create table <name>`.
///
/// DDL text is returned verbatim, so tests control exactly which bytes each
/// shard reports.
pub struct StaticConnectionSource {
    data_node: String,
    tables: RwLock<HashMap<String, String>>,
    unreachable: bool,
}

impl StaticConnectionSource {
    pub fn new(data_node: impl Into<String>) -> Self {
        Self {
            data_node: data_node.into(),
            tables: RwLock::new(HashMap::new()),
            unreachable: false,
        }
    }

    /// A source whose every query fails, as if the backend were down.
    pub fn unreachable(data_node: impl Into<String>) -> Self {
        Self {
            unreachable: true,
            ..Self::new(data_node)
        }
    }

    pub fn with_table(mut self, table: impl Into<String>, ddl: impl Into<String>) -> Self {
        self.tables.get_mut().insert(table.into(), ddl.into());
        self
    }

    pub async fn set_table(&self, table: impl Into<String>, ddl: impl Into<String>) {
        self.tables.write().await.insert(table.into(), ddl.into());
    }

    pub async fn drop_table(&self, table: &str) {
        self.tables.write().await.remove(table);
    }

    pub fn data_node(&self) -> &str {
        &self.data_node
    }
}

#[async_trait]
impl ConnectionSource for StaticConnectionSource {
    async fn query_one_row(&self, database: &str, sql: &str) -> Result<HashMap<String, String>> {
        if self.unreachable {
            return Err(MetaError::QueryFailed(
                self.data_node.clone(),
                "connection refused".to_string(),
            ));
        }

        let trimmed = sql.trim();
        let table = trimmed
            .get(..SHOW_CREATE_TABLE.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(SHOW_CREATE_TABLE))
            .and_then(|_| trimmed.get(SHOW_CREATE_TABLE.len()..))
            .ok_or_else(|| {
                MetaError::QueryFailed(self.data_node.clone(), format!("unsupported query: {}", sql))
            })?
            .trim()
            .trim_matches('`')
            .to_string();
        let tables = self.tables.read().await;
        let ddl = tables.get(&table).ok_or_else(|| {
            MetaError::QueryFailed(
                self.data_node.clone(),
                format!("Table '{}.{}' doesn't exist", database, table),
            )
        })?;

        let mut row = HashMap::new();
        row.insert("Table".to_string(), table.clone());
        row.insert("Create Table".to_string(), ddl.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_show_create_table() {
        let source = StaticConnectionSource::new("dn1").with_table("t", "CREATE TABLE t (a INT)");
        let row = source
            .query_one_row("db1", "show create table t")
            .await
            .unwrap();
        assert_eq!(row.get("Table").map(String::as_str), Some("t"));
        assert_eq!(
            row.get("Create Table").map(String::as_str),
            Some("CREATE TABLE t (a INT)")
        );
    }

    #[tokio::test]
    async fn missing_table_is_a_query_failure() {
        let source = StaticConnectionSource::new("dn1");
        let err = source
            .query_one_row("db1", "show create table t")
            .await
            .unwrap_err();
        assert!(matches!(err, MetaError::QueryFailed(node, _) if node == "dn1"));
    }

    #[tokio::test]
    async fn unreachable_source_always_fails() {
        let source = StaticConnectionSource::unreachable("dn9").with_table("t", "CREATE TABLE t (a INT)");
        assert!(source.query_one_row("db", "show create table t").await.is_err());
    }

    #[tokio::test]
    async fn tables_can_change_between_queries() {
        let source = StaticConnectionSource::new("dn1");
        assert_eq!(source.data_node(), "dn1");

        source.set_table("t", "CREATE TABLE t (a INT)").await;
        assert!(source.query_one_row("db1", "show create table `t`").await.is_ok());

        source.drop_table("t").await;
        assert!(source.query_one_row("db1", "show create table t").await.is_err());
    }

    #[tokio::test]
    async fn rejects_other_statements() {
        let source = StaticConnectionSource::new("dn1");
        assert!(source.query_one_row("db", "select 1").await.is_err());
    }
}
