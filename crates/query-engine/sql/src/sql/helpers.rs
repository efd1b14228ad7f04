//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;
use super::symbols::{FieldSymbol, Symbol, TableSymbol};

// Empty clauses //

/// A SELECT with the given select list and every other clause empty.
pub fn simple_select(select: Vec<Expr>) -> SelectQuery {
    SelectQuery {
        select,
        distinct: false,
        select_from: None,
        joins: vec![],
        prewhere: None,
        where_: None,
        group_by: vec![],
        having: None,
        order_by: vec![],
        limit: None,
        offset: None,
        symbol: None,
    }
}

// Expressions //

/// An unresolved field, from a chain of names.
pub fn field(chain: &[&str]) -> Expr {
    Expr::Field(Field {
        chain: chain.iter().map(ToString::to_string).collect(),
        symbol: None,
    })
}

/// A field already bound to a column of `table`.
pub fn column_of(table: &TableSymbol, column: &str) -> Expr {
    Expr::Field(Field {
        chain: vec![table.alias.clone(), column.to_string()],
        symbol: Some(Symbol::Field(FieldSymbol {
            name: column.to_string(),
            table: table.clone(),
            column: column.to_string(),
            path: vec![],
            value_type: None,
        })),
    })
}

/// `left = right`
pub fn equals(left: Expr, right: Expr) -> Expr {
    Expr::CompareOperation {
        left: Box::new(left),
        operator: CompareOperator::Eq,
        right: Box::new(right),
    }
}

/// AND together a list of expressions. A single expression is returned as is, and an empty
/// list gives `None`.
pub fn and_all(mut exprs: Vec<Expr>) -> Option<Expr> {
    match exprs.len() {
        0 => None,
        1 => exprs.pop(),
        _ => Some(Expr::And(exprs)),
    }
}

/// The filter restricting `table` to the rows of one tenant. `None` for tables that are not
/// scoped, or are not catalog tables.
pub fn scoping_filter(table: &TableSymbol, value: i64) -> Option<Expr> {
    let column = table.catalog_table()?.scoping_column.as_ref()?;
    Some(equals(
        column_of(table, column),
        Expr::Constant(Constant::Integer(value)),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::symbols::{CatalogTable, TableSource};
    use super::*;

    fn events() -> TableSymbol {
        TableSymbol {
            alias: "events".to_string(),
            source: TableSource::Table(CatalogTable {
                name: "events".to_string(),
                storage_table: "events".to_string(),
                scoping_column: Some("team_id".to_string()),
            }),
            join_chain: vec![],
        }
    }

    #[test]
    fn and_all_unwraps_single_expressions() {
        assert_eq!(and_all(vec![]), None);
        assert_eq!(and_all(vec![field(&["a"])]), Some(field(&["a"])));
        assert_eq!(
            and_all(vec![field(&["a"]), field(&["b"])]),
            Some(Expr::And(vec![field(&["a"]), field(&["b"])]))
        );
    }

    #[test]
    fn scoping_filter_binds_the_scoping_column() {
        let filter = scoping_filter(&events(), 7).unwrap();
        let Expr::CompareOperation { left, right, .. } = filter else {
            panic!("expected a comparison");
        };
        assert_eq!(*right, Expr::Constant(Constant::Integer(7)));
        let Expr::Field(Field {
            symbol: Some(Symbol::Field(symbol)),
            ..
        }) = *left
        else {
            panic!("expected a resolved field");
        };
        assert_eq!(symbol.column, "team_id");
        assert_eq!(symbol.table.alias, "events");
    }

    #[test]
    fn unscoped_tables_get_no_filter() {
        let mut table = events();
        table.source = TableSource::SelectQuery(indexmap::IndexMap::new());
        assert_eq!(scoping_filter(&table, 7), None);
    }
}
