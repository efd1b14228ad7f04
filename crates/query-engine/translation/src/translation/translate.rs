//! Translate HogQL text into SQL: parse, resolve, print.

use query_engine_metadata::metadata::{hogql_database, Database};
use query_engine_sql::sql::ast::Expr;
use query_engine_sql::sql::string::SQL;
use query_engine_sql::sql::symbols::{SelectQuerySymbol, TableSource, TableSymbol};

use super::context::TranslationContext;
use super::error::{Error, QueryError};
use super::parser::{parse_expr, parse_select};
use super::printer::{print_ast, Dialect};
use super::resolver::{catalog_table, resolve_symbols};

/// The table a bare expression is resolved against.
pub const DEFAULT_TABLE: &str = "events";

/// Translate `query` against the built-in HogQL catalog.
///
/// A full SELECT is expected when the context has a scoping value (see
/// [`TranslationContext::expects_full_query`]), otherwise `query` is a single expression over
/// `events`. Values found in the query are left in the context's parameters.
pub fn translate(
    query: &str,
    context: &mut TranslationContext,
    dialect: Dialect,
) -> Result<String, QueryError> {
    translate_with_catalog(query, hogql_database(), context, dialect)
}

/// Translate `query` against `database`.
#[tracing::instrument(skip(database, context))]
pub fn translate_with_catalog(
    query: &str,
    database: &Database,
    context: &mut TranslationContext,
    dialect: Dialect,
) -> Result<String, QueryError> {
    translate_query(query, database, context, dialect).map_err(|err| {
        match err {
            Error::NotResolved(_) => tracing::error!("{err}"),
            _ => tracing::debug!("{err}"),
        }
        QueryError::new(&err, query)
    })
}

/// Translate `query` and take the bound parameters out of the context.
pub fn translate_to_sql(
    query: &str,
    context: &mut TranslationContext,
    dialect: Dialect,
) -> Result<SQL, QueryError> {
    let sql = translate(query, context, dialect)?;
    Ok(SQL {
        sql,
        params: context.take_parameters(),
    })
}

fn translate_query(
    query: &str,
    database: &Database,
    context: &mut TranslationContext,
    dialect: Dialect,
) -> Result<String, Error> {
    if query.trim().is_empty() {
        return Err(Error::EmptyQuery);
    }

    if context.expects_full_query() {
        let mut expr = Expr::SelectQuery(Box::new(parse_select(query, false)?));
        tracing::debug!(ast = ?expr, "parsed");
        resolve_symbols(&mut expr, database, &mut Vec::new())?;
        let sql = print_ast(&expr, context, dialect)?;
        tracing::debug!(%sql, "printed");
        return Ok(sql);
    }

    let mut expr = parse_expr(query, false)?;
    tracing::debug!(ast = ?expr, "parsed");

    // a copy, so implicit joins found here stay out of the caller's scopes
    let mut scopes = context.current_scope_stack().to_vec();
    if scopes.is_empty() {
        let table = database
            .get_table(DEFAULT_TABLE)
            .ok_or_else(|| Error::UnknownTable(DEFAULT_TABLE.to_string()))?;
        scopes.push(SelectQuerySymbol::with_table(TableSymbol {
            alias: DEFAULT_TABLE.to_string(),
            source: TableSource::Table(catalog_table(DEFAULT_TABLE, table)),
            join_chain: vec![],
        }));
    }
    resolve_symbols(&mut expr, database, &mut scopes)?;
    let caller_scopes = std::mem::replace(context.scope_stack_mut(), scopes);
    let result = print_ast(&expr, context, dialect);
    *context.scope_stack_mut() = caller_scopes;

    let sql = result?;
    tracing::debug!(%sql, "printed");
    if let (Some(value), Dialect::Clickhouse) = (context.scoping_value(), dialect) {
        context.add_notice(format!(
            "The expression is not restricted to team {value}. The query it is placed in must be."
        ));
    }
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::error::ErrorKind;
    use query_engine_sql::sql::string::Param;

    #[test]
    fn empty_queries_fail_in_both_modes() {
        for scoping_value in [None, Some(1)] {
            for query in ["", "   ", "-- nothing here"] {
                let mut context = TranslationContext::new(scoping_value);
                let error = translate(query, &mut context, Dialect::Clickhouse).unwrap_err();
                assert_eq!(error.kind, ErrorKind::EmptyQuery);
                assert_eq!(error.query, query);
            }
        }
    }

    #[test]
    fn expressions_use_the_default_scope() {
        let mut context = TranslationContext::new(None);
        let sql = translate_to_sql("event = '$pageview'", &mut context, Dialect::Clickhouse)
            .unwrap();
        assert_eq!(sql.sql, "equals(events.event, %(hogql_val_0)s)");
        assert_eq!(sql.params, vec![Param::String("$pageview".to_string())]);
        assert!(context.current_scope_stack().is_empty());
    }

    #[test]
    fn expressions_use_scopes_already_in_the_context() {
        let mut context = TranslationContext::new(None);
        context
            .scope_stack_mut()
            .push(SelectQuerySymbol::with_table(TableSymbol {
                alias: "p".to_string(),
                source: TableSource::Table(catalog_table(
                    "persons",
                    hogql_database().get_table("persons").unwrap(),
                )),
                join_chain: vec![],
            }));
        assert_eq!(
            translate("is_identified", &mut context, Dialect::Clickhouse),
            Ok("p.is_identified".to_string())
        );
        assert_eq!(context.current_scope_stack().len(), 1);
    }

    #[test]
    fn lazy_joins_need_a_select() {
        let mut context = TranslationContext::new(None);
        let error = translate("person.id", &mut context, Dialect::Clickhouse).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Unsupported);
        assert_eq!(
            translate("person.id", &mut context, Dialect::Hogql),
            Ok("person.id".to_string())
        );
    }

    #[test]
    fn implicit_joins_do_not_stay_in_the_context() {
        let mut context = TranslationContext::new(None);
        context
            .scope_stack_mut()
            .push(SelectQuerySymbol::with_table(TableSymbol {
                alias: "e".to_string(),
                source: TableSource::Table(catalog_table(
                    "events",
                    hogql_database().get_table("events").unwrap(),
                )),
                join_chain: vec![],
            }));
        let error = translate("person.id", &mut context, Dialect::Clickhouse).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Unsupported);
        assert!(context.current_scope_stack()[0].lazy_joins.is_empty());
        assert_eq!(
            translate("event", &mut context, Dialect::Clickhouse),
            Ok("e.event".to_string())
        );
    }

    #[test]
    fn scoped_expressions_carry_a_notice() {
        let mut context = TranslationContext::new(Some(3)).with_full_query(false);
        assert_eq!(
            translate("event = 'x'", &mut context, Dialect::Clickhouse),
            Ok("equals(events.event, %(hogql_val_0)s)".to_string())
        );
        assert_eq!(
            context.notices(),
            &["The expression is not restricted to team 3. The query it is placed in must be."
                .to_string()]
        );

        let mut context = TranslationContext::new(None);
        translate("event = 'x'", &mut context, Dialect::Clickhouse).unwrap();
        assert!(context.notices().is_empty());
    }

    #[test]
    fn catalogs_without_events_have_no_default_scope() {
        let mut context = TranslationContext::new(None);
        let error =
            translate_with_catalog("1", &Database::empty(), &mut context, Dialect::Hogql)
                .unwrap_err();
        assert_eq!(error.kind, ErrorKind::UnknownTable);
    }

    #[test]
    fn full_queries_reject_trailing_garbage() {
        let mut context = TranslationContext::new(Some(1));
        let error = translate("SELECT 1 FROM events garbage more", &mut context, Dialect::Hogql)
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::SyntaxError);
    }
}
