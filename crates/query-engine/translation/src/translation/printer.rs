//! Print a resolved AST as HogQL or as ClickHouse SQL.

use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};

use query_engine_sql::sql::ast::{
    Call, Constant, Expr, Field, JoinExpr, JoinTable, JoinType, OrderDirection, SelectQuery,
};
use query_engine_sql::sql::helpers::{and_all, scoping_filter};
use query_engine_sql::sql::string::{escape_identifier, escape_string, quote_identifier, Param};
use query_engine_sql::sql::symbols::{SelectQuerySymbol, Symbol, TableSource, TableSymbol};

use super::context::TranslationContext;
use super::error::Error;
use super::functions::lookup_function;
use super::parser::token::Keyword;

/// The language to print in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Sequence, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Canonical HogQL: names as written, constants inline.
    Hogql,
    /// Executable ClickHouse SQL.
    Clickhouse,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Dialect::Hogql => write!(f, "hogql"),
            Dialect::Clickhouse => write!(f, "clickhouse"),
        }
    }
}

/// Print a resolved expression or SELECT query. Values extracted from the query are pushed
/// onto `context` as parameters.
pub fn print_ast(
    expr: &Expr,
    context: &mut TranslationContext,
    dialect: Dialect,
) -> Result<String, Error> {
    let needs_joins = context
        .current_scope_stack()
        .iter()
        .any(|scope| !scope.lazy_joins.is_empty());
    let mut printer = Printer {
        context,
        dialect,
        aggregate_depth: 0,
    };
    let mut sql = String::new();
    match expr {
        Expr::SelectQuery(select) => printer.print_select(select, &mut sql)?,
        expr => {
            if dialect == Dialect::Clickhouse && needs_joins {
                return Err(Error::Unsupported(
                    "Reaching another table from a bare expression".to_string(),
                ));
            }
            printer.print_expr(expr, &mut sql)?;
        }
    }
    Ok(sql)
}

struct Printer<'a> {
    context: &'a mut TranslationContext,
    dialect: Dialect,
    /// How many aggregations enclose the call being printed.
    aggregate_depth: usize,
}

impl<'a> Printer<'a> {
    // ── SELECT ──────────────────────────────────────────────────────────

    fn print_select(&mut self, select: &SelectQuery, out: &mut String) -> Result<(), Error> {
        let symbol = select
            .symbol
            .as_ref()
            .ok_or_else(|| Error::NotResolved("SELECT query".to_string()))?;
        // aggregations of a nested query are independent of the enclosing ones
        let outer_depth = std::mem::take(&mut self.aggregate_depth);

        out.push_str("SELECT ");
        if select.distinct {
            out.push_str("DISTINCT ");
        }
        self.print_list(&select.select, out)?;

        let guards = match (self.dialect, self.context.scoping_value()) {
            (Dialect::Clickhouse, Some(value)) => place_guards(select, symbol, value)?,
            _ => Guards::default(),
        };

        if let Some(from) = &select.select_from {
            out.push_str(" FROM ");
            self.print_join_table(from, out)?;
        }
        for (index, join) in select.joins.iter().enumerate() {
            out.push(' ');
            out.push_str(join.join_type.unwrap_or(JoinType::Inner).keyword());
            out.push(' ');
            self.print_join_table(join, out)?;
            let mut constraint = guards.on.get(index).cloned().unwrap_or_default();
            constraint.extend(join.constraint.clone());
            if let Some(constraint) = and_all(constraint) {
                out.push_str(" ON ");
                self.print_expr(&constraint, out)?;
            }
        }

        if self.dialect == Dialect::Clickhouse {
            for lazy_join in symbol.lazy_joins.values() {
                out.push_str(" INNER JOIN ");
                out.push_str(&self.identifier(&lazy_join.table.storage_table)?);
                out.push_str(" AS ");
                out.push_str(&self.identifier(&lazy_join.alias)?);
                out.push_str(" ON equals(");
                out.push_str(&self.identifier(&lazy_join.from_alias)?);
                out.push('.');
                out.push_str(&self.identifier(&lazy_join.from_column)?);
                out.push_str(", ");
                out.push_str(&self.identifier(&lazy_join.alias)?);
                out.push('.');
                out.push_str(&self.identifier(&lazy_join.to_column)?);
                out.push(')');
                self.context.add_notice(format!(
                    "Joined table '{}' implicitly as '{}'.",
                    lazy_join.table.name, lazy_join.alias
                ));
            }
        }

        let mut filters = guards.where_;
        filters.extend(select.where_.clone());
        let where_ = and_all(filters);

        if let Some(prewhere) = &select.prewhere {
            out.push_str(" PREWHERE ");
            self.print_expr(prewhere, out)?;
        }
        if let Some(where_) = &where_ {
            out.push_str(" WHERE ");
            self.print_expr(where_, out)?;
        }
        if !select.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            self.print_list(&select.group_by, out)?;
        }
        if let Some(having) = &select.having {
            out.push_str(" HAVING ");
            self.print_expr(having, out)?;
        }
        if !select.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            for (index, order) in select.order_by.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                self.print_expr(&order.expr, out)?;
                out.push_str(match order.direction {
                    OrderDirection::Asc => " ASC",
                    OrderDirection::Desc => " DESC",
                });
            }
        }
        if let Some(limit) = select.limit {
            out.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = select.offset {
            out.push_str(&format!(" OFFSET {offset}"));
        }

        self.aggregate_depth = outer_depth;
        Ok(())
    }

    fn print_join_table(&mut self, join: &JoinExpr, out: &mut String) -> Result<(), Error> {
        let symbol = join
            .symbol
            .as_ref()
            .ok_or_else(|| Error::NotResolved("table".to_string()))?;
        match &join.table {
            JoinTable::Table(name) => {
                let printed = match (self.dialect, symbol.catalog_table()) {
                    (Dialect::Clickhouse, Some(table)) => table.storage_table.as_str(),
                    _ => name.as_str(),
                };
                out.push_str(&self.identifier(printed)?);
                if symbol.alias != printed {
                    out.push_str(" AS ");
                    out.push_str(&self.identifier(&symbol.alias)?);
                }
            }
            JoinTable::SelectQuery(select) => {
                out.push('(');
                self.print_select(select, out)?;
                out.push(')');
                if !symbol.alias.is_empty() {
                    out.push_str(" AS ");
                    out.push_str(&self.identifier(&symbol.alias)?);
                }
            }
        }
        Ok(())
    }

    // ── Expressions ─────────────────────────────────────────────────────

    fn print_expr(&mut self, expr: &Expr, out: &mut String) -> Result<(), Error> {
        match expr {
            Expr::And(exprs) => self.print_function("and", exprs, out),
            Expr::Or(exprs) => self.print_function("or", exprs, out),
            Expr::BinaryOperation {
                left,
                operator,
                right,
            } => self.print_operation(operator.function_name(), left, right, out),
            Expr::CompareOperation {
                left,
                operator,
                right,
            } => self.print_operation(operator.function_name(), left, right, out),
            Expr::UnaryOperation { operator, expr } => {
                out.push_str(operator.function_name());
                out.push('(');
                self.print_expr(expr, out)?;
                out.push(')');
                Ok(())
            }
            Expr::Field(field) => self.print_field(field, out),
            Expr::Call(call) => self.print_call(call, out),
            Expr::Constant(constant) => {
                self.print_constant(constant, out);
                Ok(())
            }
            Expr::Placeholder(placeholder) => Err(Error::Unsupported(format!(
                "Printing the placeholder {{{}}}",
                placeholder.name
            ))),
            Expr::Alias(alias) => {
                self.print_expr(&alias.expr, out)?;
                out.push_str(" AS ");
                out.push_str(&self.identifier(&alias.alias)?);
                Ok(())
            }
            Expr::Tuple(exprs) => self.print_function("tuple", exprs, out),
            Expr::Array(exprs) => {
                out.push('[');
                self.print_list(exprs, out)?;
                out.push(']');
                Ok(())
            }
            Expr::Asterisk => Err(Error::Unsupported("Selecting '*'".to_string())),
            Expr::SelectQuery(select) => {
                out.push('(');
                self.print_select(select, out)?;
                out.push(')');
                Ok(())
            }
        }
    }

    fn print_list(&mut self, exprs: &[Expr], out: &mut String) -> Result<(), Error> {
        for (index, expr) in exprs.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            self.print_expr(expr, out)?;
        }
        Ok(())
    }

    fn print_function(&mut self, name: &str, args: &[Expr], out: &mut String) -> Result<(), Error> {
        out.push_str(name);
        out.push('(');
        self.print_list(args, out)?;
        out.push(')');
        Ok(())
    }

    fn print_operation(
        &mut self,
        name: &str,
        left: &Expr,
        right: &Expr,
        out: &mut String,
    ) -> Result<(), Error> {
        out.push_str(name);
        out.push('(');
        self.print_expr(left, out)?;
        out.push_str(", ");
        self.print_expr(right, out)?;
        out.push(')');
        Ok(())
    }

    fn print_field(&mut self, field: &Field, out: &mut String) -> Result<(), Error> {
        let symbol = field
            .symbol
            .as_ref()
            .ok_or_else(|| Error::NotResolved(format!("field '{}'", field.chain.join("."))))?;

        if self.dialect == Dialect::Hogql {
            let chain = field
                .chain
                .iter()
                .map(|name| self.identifier(name))
                .collect::<Result<Vec<_>, _>>()?;
            out.push_str(&chain.join("."));
            return Ok(());
        }

        match symbol {
            Symbol::Field(symbol) => {
                let mut column = String::new();
                if !symbol.table.alias.is_empty() {
                    column.push_str(&self.identifier(&symbol.table.alias)?);
                    column.push('.');
                }
                column.push_str(&self.identifier(&symbol.column)?);
                if symbol.path.is_empty() {
                    out.push_str(&column);
                } else {
                    out.push_str("replaceRegexpAll(JSONExtractRaw(");
                    out.push_str(&column);
                    for key in &symbol.path {
                        out.push_str(", ");
                        out.push_str(&self.context.push_parameter(Param::String(key.clone())));
                    }
                    out.push_str("), '^\"|\"$', '')");
                }
                Ok(())
            }
            Symbol::FieldAlias(alias) => {
                out.push_str(&self.identifier(&alias.name)?);
                Ok(())
            }
            Symbol::Table(table) => Err(Error::Unsupported(format!(
                "Using the table '{}' as a value",
                table.alias
            ))),
        }
    }

    fn print_call(&mut self, call: &Call, out: &mut String) -> Result<(), Error> {
        let info =
            lookup_function(&call.name).ok_or_else(|| Error::UnknownFunction(call.name.clone()))?;
        if !info.accepts(call.args.len()) {
            return Err(Error::Unsupported(format!(
                "Calling '{}' with {} argument(s) while it takes {}",
                call.name,
                call.args.len(),
                info.arity()
            )));
        }
        if info.aggregate && self.aggregate_depth > 0 {
            return Err(Error::Unsupported(format!(
                "Calling the aggregation '{}' inside another aggregation",
                call.name
            )));
        }
        if call.distinct && !info.aggregate {
            return Err(Error::Unsupported(format!(
                "DISTINCT in a call to '{}'",
                call.name
            )));
        }

        out.push_str(match self.dialect {
            Dialect::Clickhouse => info.clickhouse_name,
            Dialect::Hogql => call.name.as_str(),
        });
        let (parameters, args) = call.args.split_at(info.parameters);
        if !parameters.is_empty() {
            self.print_function("", parameters, out)?;
        }

        if info.aggregate {
            self.aggregate_depth += 1;
        }
        out.push('(');
        if call.distinct {
            out.push_str("DISTINCT ");
        }
        let result = if args == [Expr::Asterisk] && call.name.eq_ignore_ascii_case("count") {
            out.push('*');
            Ok(())
        } else {
            self.print_list(args, out)
        };
        out.push(')');
        if info.aggregate {
            self.aggregate_depth -= 1;
        }
        result
    }

    fn print_constant(&mut self, constant: &Constant, out: &mut String) {
        match (constant, self.dialect) {
            (Constant::Null, _) => out.push_str("NULL"),
            (Constant::Boolean(true), _) => out.push_str("true"),
            (Constant::Boolean(false), _) => out.push_str("false"),
            (Constant::Integer(i), Dialect::Clickhouse) => {
                out.push_str(&self.context.push_parameter(Param::Integer(*i)));
            }
            (Constant::Float(f), Dialect::Clickhouse) => {
                out.push_str(&self.context.push_parameter(Param::Float(*f)));
            }
            (Constant::String(s), Dialect::Clickhouse) => {
                out.push_str(&self.context.push_parameter(Param::String(s.clone())));
            }
            (Constant::Integer(i), Dialect::Hogql) => out.push_str(&i.to_string()),
            // debug formatting keeps the decimal point, so the value reads back as a float
            (Constant::Float(f), Dialect::Hogql) => out.push_str(&format!("{f:?}")),
            (Constant::String(s), Dialect::Hogql) => out.push_str(&escape_string(s)),
        }
    }

    fn identifier(&self, name: &str) -> Result<String, Error> {
        if self.dialect == Dialect::Clickhouse && name.contains('%') {
            return Err(Error::Unsupported(format!(
                "The identifier '{name}' containing '%'"
            )));
        }
        if Keyword::from_identifier(name).is_some() {
            return Ok(quote_identifier(name));
        }
        Ok(escape_identifier(name))
    }
}

/// Team guards of one SELECT, split by the clause they are printed in.
#[derive(Default)]
struct Guards {
    /// Conditions ANDed into each join's ON, by join position.
    on: Vec<Vec<Expr>>,
    /// Conditions ANDed into WHERE, ahead of the user's own.
    where_: Vec<Expr>,
}

/// Place the guard of every scoped table of `select`. A table whose rows always reach the
/// result is guarded in WHERE. A table an outer join may pad with defaults is guarded in the ON
/// of that join, so unmatched rows survive.
fn place_guards(
    select: &SelectQuery,
    symbol: &SelectQuerySymbol,
    value: i64,
) -> Result<Guards, Error> {
    let guard = |join: &JoinExpr| {
        join.symbol
            .as_ref()
            .and_then(|table| scoping_filter(table, value))
    };
    let mut on = vec![vec![]; select.joins.len()];
    let mut preserved = select.select_from.iter().filter_map(guard).collect::<Vec<_>>();
    for (index, join) in select.joins.iter().enumerate() {
        match join.join_type.unwrap_or(JoinType::Inner) {
            JoinType::Inner | JoinType::Cross => preserved.extend(guard(join)),
            JoinType::Left => on[index].extend(guard(join)),
            // everything joined so far becomes the padded side
            JoinType::Right => {
                on[index] = std::mem::take(&mut preserved);
                preserved.extend(guard(join));
            }
            JoinType::Full => {
                if !preserved.is_empty() || guard(join).is_some() {
                    return Err(Error::Unsupported(
                        "Using a FULL JOIN on tables restricted to a team".to_string(),
                    ));
                }
            }
        }
    }

    preserved.extend(symbol.lazy_joins.values().filter_map(|lazy_join| {
        let table = TableSymbol {
            alias: lazy_join.alias.clone(),
            source: TableSource::Table(lazy_join.table.clone()),
            join_chain: vec![],
        };
        scoping_filter(&table, value)
    }));
    Ok(Guards {
        on,
        where_: preserved,
    })
}
