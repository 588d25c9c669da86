/// Parsed `CREATE TABLE` statement, reduced to what the meta builder consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub table_name: String,
    pub elements: Vec<TableElement>,
}

/// One entry of the parenthesized element list, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum TableElement {
    Column(ColumnDef),
    PrimaryKey { columns: Vec<String> },
    Unique { name: String, columns: Vec<String> },
    Index { name: String, columns: Vec<String> },
    /// Foreign keys, checks, fulltext/spatial indexes.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    /// Bare type identifier without length or precision.
    pub data_type: String,
    /// Type as written back by the parser, e.g. `VARCHAR(32)`.
    pub column_type: String,
    pub constraints: Vec<ColumnConstraint>,
    /// Default expression already rendered to MySQL text.
    pub default: Option<String>,
    pub auto_increment: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        let data_type = data_type.into();
        Self {
            name: name.into(),
            column_type: data_type.clone(),
            data_type,
            constraints: Vec::new(),
            default: None,
            auto_increment: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnConstraint {
    NotNull,
    Null,
}
