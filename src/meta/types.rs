use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Name given to the primary key index regardless of how the DDL spells it.
pub const PRIMARY_INDEX_NAME: &str = "PRIMARY";

/// Index classification, rendered the way MySQL reports it in `COLUMN_KEY`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKind {
    #[serde(rename = "PRI")]
    Primary,
    #[serde(rename = "UNI")]
    Unique,
    #[serde(rename = "MUL")]
    Multiple,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Primary => "PRI",
            IndexKind::Unique => "UNI",
            IndexKind::Multiple => "MUL",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named index over an ordered list of columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexMeta {
    pub name: String,
    pub kind: IndexKind,
    pub columns: Vec<String>,
}

impl IndexMeta {
    pub fn new(name: impl Into<String>, kind: IndexKind, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            columns,
        }
    }

    pub fn primary(columns: Vec<String>) -> Self {
        Self::new(PRIMARY_INDEX_NAME, IndexKind::Primary, columns)
    }
}

/// One column of a table as reported by a shard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ColumnMeta {
    pub name: String,
    /// Bare type identifier, e.g. `VARCHAR` for `varchar(32)`.
    pub data_type: String,
    /// Full type with length, precision and modifiers, e.g. `VARCHAR(32)`.
    pub column_type: String,
    pub nullable: bool,
    /// Default expression rendered back to MySQL text.
    pub default: Option<String>,
    pub auto_increment: bool,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        let data_type = data_type.into();
        Self {
            name: name.into(),
            column_type: data_type.clone(),
            data_type,
            nullable: true,
            default: None,
            auto_increment: false,
        }
    }

    pub fn with_column_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = column_type.into();
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

/// Normalized metadata of one logical table, built from a `CREATE TABLE` statement.
///
/// Equality is structural: unique and secondary indexes are compared as sets,
/// columns in declaration order. `version` is ignored so metas from different
/// passes compare equal when the DDL agrees; `table_name` still takes part, so
/// two tables with the same shape stay distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMeta {
    pub table_name: String,
    /// Wall-clock timestamp (ms) of the pass that produced this meta.
    pub version: i64,
    pub columns: Vec<ColumnMeta>,
    pub primary: Option<IndexMeta>,
    pub unique_indexes: Vec<IndexMeta>,
    pub indexes: Vec<IndexMeta>,
    pub ai_col_pos: Option<usize>,
}

impl TableMeta {
    pub fn new(table_name: impl Into<String>, version: i64) -> Self {
        Self {
            table_name: table_name.into(),
            version,
            columns: Vec::new(),
            primary: None,
            unique_indexes: Vec::new(),
            indexes: Vec::new(),
            ai_col_pos: None,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn auto_increment_column(&self) -> Option<&ColumnMeta> {
        self.ai_col_pos.and_then(|pos| self.columns.get(pos))
    }

    fn index_set(indexes: &[IndexMeta]) -> BTreeSet<&IndexMeta> {
        indexes.iter().collect()
    }
}

impl PartialEq for TableMeta {
    fn eq(&self, other: &Self) -> bool {
        self.table_name == other.table_name
            && self.columns == other.columns
            && self.primary == other.primary
            && self.ai_col_pos == other.ai_col_pos
            && Self::index_set(&self.unique_indexes) == Self::index_set(&other.unique_indexes)
            && Self::index_set(&self.indexes) == Self::index_set(&other.indexes)
    }
}

impl Eq for TableMeta {}
