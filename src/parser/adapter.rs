// ============================================================================
// src/parser/adapter.rs - MySQL `CREATE TABLE` adapter over sqlparser
// ============================================================================

use super::DdlParser;
use crate::core::{MetaError, Result};
use crate::parser::ast::*;
use sqlparser::ast as sql_ast;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

const AUTO_INCREMENT: &str = "AUTO_INCREMENT";

pub struct MySqlDdlParser {
    dialect: MySqlDialect,
}

impl MySqlDdlParser {
    pub fn new() -> Self {
        Self {
            dialect: MySqlDialect {},
        }
    }

    fn convert_create_table(&self, create: sql_ast::CreateTable) -> Result<CreateTableStmt> {
        let table_name = extract_table_name(&create.name)?;

        let mut elements = create
            .columns
            .into_iter()
            .map(|col| self.convert_column_def(col).map(TableElement::Column))
            .collect::<Result<Vec<_>>>()?;

        for constraint in create.constraints {
            elements.push(self.convert_table_constraint(constraint)?);
        }

        Ok(CreateTableStmt {
            table_name,
            elements,
        })
    }

    fn convert_column_def(&self, col: sql_ast::ColumnDef) -> Result<ColumnDef> {
        let column_type = col.data_type.to_string();
        let mut column = ColumnDef::new(col.name.value, bare_type_name(&column_type));
        column.column_type = column_type;

        for opt in col.options {
            match opt.option {
                sql_ast::ColumnOption::NotNull => column.constraints.push(ColumnConstraint::NotNull),
                sql_ast::ColumnOption::Null => column.constraints.push(ColumnConstraint::Null),
                sql_ast::ColumnOption::Default(expr) => {
                    column.default = Some(render_expr(&expr));
                }
                sql_ast::ColumnOption::DialectSpecific(tokens)
                    if tokens
                        .iter()
                        .any(|t| t.to_string().eq_ignore_ascii_case(AUTO_INCREMENT)) =>
                {
                    column.auto_increment = true;
                }
                // Inline keys, comments, charsets and collations carry nothing we keep.
                _ => {}
            }
        }

        Ok(column)
    }

    fn convert_table_constraint(&self, constraint: sql_ast::TableConstraint) -> Result<TableElement> {
        match constraint {
            sql_ast::TableConstraint::PrimaryKey { columns, .. } => Ok(TableElement::PrimaryKey {
                columns: index_column_names(&columns)?,
            }),
            sql_ast::TableConstraint::Unique {
                name,
                index_name,
                columns,
                ..
            } => {
                let columns = index_column_names(&columns)?;
                let name = index_name
                    .or(name)
                    .map(|ident| ident.value)
                    .or_else(|| columns.first().cloned())
                    .ok_or_else(|| MetaError::ParseError("UNIQUE KEY without columns".into()))?;
                Ok(TableElement::Unique { name, columns })
            }
            sql_ast::TableConstraint::Index { name, columns, .. } => {
                let columns = index_column_names(&columns)?;
                let name = name
                    .map(|ident| ident.value)
                    .or_else(|| columns.first().cloned())
                    .ok_or_else(|| MetaError::ParseError("KEY without columns".into()))?;
                Ok(TableElement::Index { name, columns })
            }
            _ => Ok(TableElement::Other),
        }
    }
}

impl Default for MySqlDdlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DdlParser for MySqlDdlParser {
    fn parse_create_table(&self, ddl: &str) -> Result<CreateTableStmt> {
        let mut stmts = Parser::parse_sql(&self.dialect, ddl)
            .map_err(|e| MetaError::ParseError(e.to_string()))?;

        if stmts.len() != 1 {
            return Err(MetaError::ParseError(format!(
                "expected exactly one CREATE TABLE statement, got {}",
                stmts.len()
            )));
        }

        match stmts.remove(0) {
            sql_ast::Statement::CreateTable(create) => self.convert_create_table(create),
            other => Err(MetaError::UnsupportedStatement(format!(
                "expected CREATE TABLE, got: {}",
                other
            ))),
        }
    }
}

/// Renders an expression subtree back to canonical MySQL text.
pub fn render_expr(expr: &sql_ast::Expr) -> String {
    expr.to_string()
}

/// `VARCHAR(32)` -> `VARCHAR`, `INT(11) UNSIGNED` -> `INT`.
fn bare_type_name(rendered: &str) -> String {
    rendered
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}

fn index_column_names(columns: &[sql_ast::IndexColumn]) -> Result<Vec<String>> {
    columns
        .iter()
        .map(|col| match &col.column.expr {
            sql_ast::Expr::Identifier(ident) => Ok(ident.value.clone()),
            sql_ast::Expr::CompoundIdentifier(parts) => parts
                .last()
                .map(|ident| ident.value.clone())
                .ok_or_else(|| MetaError::ParseError("empty index column".into())),
            // Prefix key part: `name`(10) parses as a call named after the column.
            sql_ast::Expr::Function(function) => match function.name.0.last() {
                Some(sql_ast::ObjectNamePart::Identifier(ident)) => Ok(ident.value.clone()),
                _ => Err(MetaError::ParseError(format!(
                    "index column must name a column, got: {}",
                    function
                ))),
            },
            other => Err(MetaError::ParseError(format!(
                "index column must be a plain identifier, got: {}",
                other
            ))),
        })
        .collect()
}

fn extract_table_name(name: &sql_ast::ObjectName) -> Result<String> {
    match name.0.last() {
        Some(sql_ast::ObjectNamePart::Identifier(ident)) => Ok(ident.value.clone()),
        _ => Err(MetaError::ParseError("Invalid table name".into())),
    }
}

// ============================================================================
// TESTS
// ============================================================================
