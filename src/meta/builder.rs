use super::types::{ColumnMeta, IndexKind, IndexMeta, TableMeta};
use crate::core::Result;
use crate::parser::{ColumnConstraint, ColumnDef, DdlParser, TableElement};

/// Parses `ddl` and builds the normalized [`TableMeta`] for `table_name`.
///
/// The table name comes from the caller, not from the DDL, so shards that
/// store the table under a physical alias still report the logical name.
pub fn init_table_meta(
    parser: &dyn DdlParser,
    table_name: &str,
    ddl: &str,
    version: i64,
) -> Result<TableMeta> {
    let stmt = parser.parse_create_table(ddl)?;
    let mut meta = TableMeta::new(table_name, version);

    for element in stmt.elements {
        match element {
            TableElement::Column(column) => add_column_meta(&mut meta, column),
            TableElement::PrimaryKey { columns } => {
                meta.primary = Some(IndexMeta::primary(columns));
            }
            TableElement::Unique { name, columns } => {
                meta.unique_indexes
                    .push(IndexMeta::new(name, IndexKind::Unique, columns));
            }
            TableElement::Index { name, columns } => {
                meta.indexes
                    .push(IndexMeta::new(name, IndexKind::Multiple, columns));
            }
            TableElement::Other => {}
        }
    }

    Ok(meta)
}

fn add_column_meta(meta: &mut TableMeta, column: ColumnDef) {
    let mut column_meta =
        ColumnMeta::new(column.name, column.data_type).with_column_type(column.column_type);

    // Last explicit NULL / NOT NULL wins, like MySQL.
    for constraint in &column.constraints {
        match constraint {
            ColumnConstraint::NotNull => column_meta.nullable = false,
            ColumnConstraint::Null => column_meta.nullable = true,
        }
    }

    column_meta.default = column.default;

    if column.auto_increment {
        column_meta.auto_increment = true;
        meta.ai_col_pos = Some(meta.columns.len());
    }

    meta.columns.push(column_meta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MetaError;
    use crate::parser::{CreateTableStmt, MySqlDdlParser};

    /// Returns a fixed statement no matter what text it is given.
    struct StubParser(CreateTableStmt);

    impl DdlParser for StubParser {
        fn parse_create_table(&self, _ddl: &str) -> Result<CreateTableStmt> {
            Ok(self.0.clone())
        }
    }

    struct FailingParser;

    impl DdlParser for FailingParser {
        fn parse_create_table(&self, ddl: &str) -> Result<CreateTableStmt> {
            Err(MetaError::ParseError(format!("cannot parse {}", ddl)))
        }
    }

    #[test]
    fn builds_meta_from_stub_ast() {
        let mut id = ColumnDef::new("id", "BIGINT");
        id.constraints.push(ColumnConstraint::NotNull);
        let mut code = ColumnDef::new("code", "CHAR");
        code.auto_increment = true;
        let mut note = ColumnDef::new("note", "TEXT");
        note.constraints.push(ColumnConstraint::NotNull);
        note.constraints.push(ColumnConstraint::Null);
        note.default = Some("'x'".to_string());

        let parser = StubParser(CreateTableStmt {
            table_name: "physical_t".to_string(),
            elements: vec![
                TableElement::Column(id),
                TableElement::Column(code),
                TableElement::Column(note),
                TableElement::PrimaryKey {
                    columns: vec!["id".into()],
                },
                TableElement::Unique {
                    name: "uk".into(),
                    columns: vec!["code".into()],
                },
                TableElement::Index {
                    name: "idx".into(),
                    columns: vec!["note".into(), "id".into()],
                },
                TableElement::Other,
            ],
        });

        let meta = init_table_meta(&parser, "t", "ignored", 42).unwrap();

        assert_eq!(meta.table_name, "t");
        assert_eq!(meta.version, 42);
        assert_eq!(meta.columns.len(), 3);
        assert!(!meta.columns[0].nullable);
        assert!(meta.columns[1].nullable);
        assert!(meta.columns[2].nullable);
        assert_eq!(meta.columns[2].default.as_deref(), Some("'x'"));
        assert_eq!(meta.ai_col_pos, Some(1));
        assert_eq!(meta.primary, Some(IndexMeta::primary(vec!["id".into()])));
        assert_eq!(meta.unique_indexes[0].kind, IndexKind::Unique);
        assert_eq!(meta.indexes[0].kind, IndexKind::Multiple);
        assert_eq!(meta.indexes[0].columns, vec!["note", "id"]);
    }

    #[test]
    fn parse_failure_surfaces_to_caller() {
        let err = init_table_meta(&FailingParser, "t", "junk", 1).unwrap_err();
        assert!(matches!(err, MetaError::ParseError(_)));
    }

    #[test]
    fn simple_table_with_mysql_parser() {
        let meta = init_table_meta(
            &MySqlDdlParser::new(),
            "t",
            "CREATE TABLE t (id INT NOT NULL AUTO_INCREMENT, name VARCHAR(32), PRIMARY KEY (id))",
            1000,
        )
        .unwrap();

        assert_eq!(
            meta.columns,
            vec![
                ColumnMeta::new("id", "INT").not_null().auto_increment(),
                ColumnMeta::new("name", "VARCHAR").with_column_type("VARCHAR(32)"),
            ]
        );
        assert_eq!(meta.primary, Some(IndexMeta::primary(vec!["id".into()])));
        assert_eq!(meta.ai_col_pos, Some(0));
        assert!(meta.unique_indexes.is_empty());
        assert!(meta.indexes.is_empty());
    }

    #[test]
    fn no_auto_increment_leaves_position_unset() {
        let meta = init_table_meta(
            &MySqlDdlParser::new(),
            "t",
            "CREATE TABLE t (a INT, b INT DEFAULT 0)",
            1,
        )
        .unwrap();
        assert_eq!(meta.ai_col_pos, None);
        assert_eq!(
            meta.column("b"),
            Some(&ColumnMeta::new("b", "INT").with_default("0"))
        );
        assert!(meta.column("c").is_none());
    }

    #[test]
    fn auto_increment_counter_is_normalized_away() {
        let parser = MySqlDdlParser::new();
        let base = "CREATE TABLE t (id INT NOT NULL AUTO_INCREMENT, PRIMARY KEY (id)) ENGINE=InnoDB";
        let a = init_table_meta(&parser, "t", &format!("{} AUTO_INCREMENT=100", base), 5).unwrap();
        let b = init_table_meta(&parser, "t", &format!("{} AUTO_INCREMENT=250", base), 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn same_ddl_in_different_passes_is_equal() {
        let parser = MySqlDdlParser::new();
        let ddl = "CREATE TABLE t (id INT NOT NULL AUTO_INCREMENT, name VARCHAR(32), PRIMARY KEY (id))";
        let first = init_table_meta(&parser, "t", ddl, 1).unwrap();
        let second = init_table_meta(&parser, "t", ddl, 2).unwrap();
        assert_ne!(first.version, second.version);
        assert_eq!(first, second);
    }

    #[test]
    fn varchar_length_changes_column_type_only() {
        let parser = MySqlDdlParser::new();
        let a = init_table_meta(&parser, "t", "CREATE TABLE t (name VARCHAR(32))", 5).unwrap();
        let b = init_table_meta(&parser, "t", "CREATE TABLE t (name VARCHAR(64))", 5).unwrap();
        assert_eq!(a.columns[0].data_type, b.columns[0].data_type);
        assert_ne!(a.columns[0].column_type, b.columns[0].column_type);
        assert_ne!(a, b);
    }
}
