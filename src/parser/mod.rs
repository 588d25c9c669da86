pub mod adapter;
pub mod ast;

pub use adapter::MySqlDdlParser;
pub use ast::{ColumnConstraint, ColumnDef, CreateTableStmt, TableElement};

use crate::core::Result;

/// Turns `SHOW CREATE TABLE` output into a [`CreateTableStmt`].
///
/// The reconciler only depends on this capability, so tests can swap in a
/// stub that never touches a real SQL grammar.
pub trait DdlParser: Send + Sync {
    fn parse_create_table(&self, ddl: &str) -> Result<CreateTableStmt>;
}
