//! Bind every name in a HogQL AST to a symbol.
//!
//! Scopes live in a vector used as a stack. Each `SelectQuerySymbol` points at its enclosing
//! scope by index, and lookups walk those links outward. A SELECT registers its tables and
//! select-list aliases before any of its clauses are resolved, so later clauses can refer to
//! aliases defined anywhere in the select list.

use query_engine_metadata::metadata::{Database, FieldInfo, FieldType, TableInfo};
use query_engine_sql::sql::ast::{Constant, Expr, JoinExpr, JoinTable, SelectQuery};
use query_engine_sql::sql::symbols::{
    CatalogTable, FieldAliasSymbol, FieldSymbol, LazyJoinSymbol, SelectQuerySymbol, Symbol,
    TableSource, TableSymbol,
};

use super::error::Error;

/// How many traversers may be followed while resolving a single name.
const MAX_TRAVERSAL_DEPTH: usize = 16;

/// Resolve `expr` in place. An expression that is not a SELECT is resolved inside the
/// innermost scope of `scopes`, and implicit joins it needs are recorded on those scopes.
pub fn resolve_symbols(
    expr: &mut Expr,
    database: &Database,
    scopes: &mut Vec<SelectQuerySymbol>,
) -> Result<(), Error> {
    let current = scopes.len().checked_sub(1);
    let mut resolver = Resolver {
        database,
        scopes,
        current,
        resolving_alias: None,
        traversal_depth: 0,
    };
    resolver.resolve_expr(expr)
}

struct Resolver<'a> {
    database: &'a Database,
    scopes: &'a mut Vec<SelectQuerySymbol>,
    /// The scope names are looked up in.
    current: Option<usize>,
    /// The select-list alias whose expression is being resolved. It cannot refer to itself.
    resolving_alias: Option<String>,
    traversal_depth: usize,
}

impl<'a> Resolver<'a> {
    fn resolve_expr(&mut self, expr: &mut Expr) -> Result<(), Error> {
        match expr {
            Expr::And(exprs) | Expr::Or(exprs) | Expr::Tuple(exprs) | Expr::Array(exprs) => {
                for expr in exprs {
                    self.resolve_expr(expr)?;
                }
                Ok(())
            }
            Expr::BinaryOperation { left, right, .. } | Expr::CompareOperation { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)
            }
            Expr::UnaryOperation { expr, .. } => self.resolve_expr(expr),
            Expr::Alias(alias) => {
                let outer = self.resolving_alias.replace(alias.alias.clone());
                let result = self.resolve_expr(&mut alias.expr);
                self.resolving_alias = outer;
                result
            }
            Expr::Call(call) => {
                // count(*) is the one place a star is allowed
                if call.name.eq_ignore_ascii_case("count") && call.args == [Expr::Asterisk] {
                    return Ok(());
                }
                for arg in &mut call.args {
                    self.resolve_expr(arg)?;
                }
                Ok(())
            }
            Expr::Constant(_) => Ok(()),
            Expr::Asterisk => Err(Error::Unsupported("Selecting '*'".to_string())),
            Expr::Placeholder(placeholder) => Err(Error::Unsupported(format!(
                "Unreplaced placeholder {{{}}}",
                placeholder.name
            ))),
            Expr::SelectQuery(select) => self.resolve_select(select, self.current),
            Expr::Field(field) => {
                field.symbol = Some(self.resolve_chain(&field.chain)?);
                Ok(())
            }
        }
    }

    // ── SELECT scopes ───────────────────────────────────────────────────

    fn resolve_select(
        &mut self,
        select: &mut SelectQuery,
        parent: Option<usize>,
    ) -> Result<(), Error> {
        self.scopes.push(SelectQuerySymbol {
            parent,
            ..SelectQuerySymbol::default()
        });
        let index = self.scopes.len() - 1;
        let outer = self.current;
        let outer_alias = self.resolving_alias.take();

        let result = self.resolve_select_in(select, index, parent);

        self.current = outer;
        self.resolving_alias = outer_alias;
        self.scopes.truncate(index + 1);
        let symbol = self.scopes.pop();
        result?;
        select.symbol = symbol;
        Ok(())
    }

    fn resolve_select_in(
        &mut self,
        select: &mut SelectQuery,
        index: usize,
        parent: Option<usize>,
    ) -> Result<(), Error> {
        // tables first: nested selects in FROM see the enclosing scopes, not their siblings
        if let Some(from) = &mut select.select_from {
            self.register_table(from, index, parent)?;
        }
        for join in &mut select.joins {
            self.register_table(join, index, parent)?;
        }
        self.current = Some(index);

        for column in &select.select {
            if let Expr::Alias(alias) = column {
                let previous = self.scopes[index].aliases.insert(
                    alias.alias.clone(),
                    FieldAliasSymbol {
                        name: alias.alias.clone(),
                        value_type: None,
                    },
                );
                if previous.is_some() {
                    return Err(Error::Unsupported(format!(
                        "Defining the alias '{}' twice",
                        alias.alias
                    )));
                }
            }
        }
        for column in &mut select.select {
            self.resolve_expr(column)?;
        }
        for column in &select.select {
            if let Some((name, value_type)) = output_column(column) {
                if let Some(alias) = self.scopes[index].aliases.get_mut(&name) {
                    alias.value_type = value_type;
                }
                self.scopes[index].columns.insert(name, value_type);
            }
        }

        for join in &mut select.joins {
            if let Some(constraint) = &mut join.constraint {
                self.resolve_expr(constraint)?;
            }
        }
        if let Some(prewhere) = &mut select.prewhere {
            self.resolve_expr(prewhere)?;
        }
        if let Some(where_) = &mut select.where_ {
            self.resolve_expr(where_)?;
        }
        for expr in &mut select.group_by {
            self.resolve_expr(expr)?;
        }
        if let Some(having) = &mut select.having {
            self.resolve_expr(having)?;
        }
        for order in &mut select.order_by {
            self.resolve_expr(&mut order.expr)?;
        }
        Ok(())
    }

    /// Bind a FROM or JOIN table and make it visible in the scope at `index`.
    fn register_table(
        &mut self,
        join: &mut JoinExpr,
        index: usize,
        parent: Option<usize>,
    ) -> Result<(), Error> {
        let symbol = match &mut join.table {
            JoinTable::Table(name) => {
                let info = self
                    .database
                    .get_table(name)
                    .ok_or_else(|| Error::UnknownTable(name.clone()))?;
                TableSymbol {
                    alias: join.alias.clone().unwrap_or_else(|| name.clone()),
                    source: TableSource::Table(catalog_table(name, info)),
                    join_chain: vec![],
                }
            }
            JoinTable::SelectQuery(select) => {
                self.resolve_select(select, parent)?;
                let columns = select
                    .symbol
                    .as_ref()
                    .map(|symbol| symbol.columns.clone())
                    .unwrap_or_default();
                TableSymbol {
                    alias: join.alias.clone().unwrap_or_default(),
                    source: TableSource::SelectQuery(columns),
                    join_chain: vec![],
                }
            }
        };
        let tables = &mut self.scopes[index].tables;
        if tables.contains_key(&symbol.alias) {
            return Err(Error::Unsupported(format!(
                "Using the table alias '{}' twice",
                symbol.alias
            )));
        }
        tables.insert(symbol.alias.clone(), symbol.clone());
        join.symbol = Some(symbol);
        Ok(())
    }

    // ── Field chains ────────────────────────────────────────────────────

    fn resolve_chain(&mut self, chain: &[String]) -> Result<Symbol, Error> {
        let Some((first, rest)) = chain.split_first() else {
            return Err(Error::UnknownField(String::new()));
        };
        self.traversal_depth = 0;
        let (mut symbol, owner) = self.lookup(first, !rest.is_empty())?;
        for name in rest {
            symbol = self.resolve_member(symbol, name, owner)?;
        }
        match symbol {
            Symbol::Table(_) => Err(Error::Unsupported(format!(
                "Using the table '{}' as a value",
                chain.join(".")
            ))),
            symbol => Ok(symbol),
        }
    }

    /// Find the first name of a chain, walking from the current scope outward. Returns the
    /// symbol and the index of the scope it was found in. When the chain continues past
    /// `name`, a table alias of a scope wins over its fields and select-list aliases.
    fn lookup(&mut self, name: &str, qualifies: bool) -> Result<(Symbol, usize), Error> {
        let database = self.database;
        let mut scope = self.current;
        while let Some(index) = scope {
            let symbol = &self.scopes[index];

            if qualifies {
                if let Some(table) = symbol.tables.get(name) {
                    return Ok((Symbol::Table(table.clone()), index));
                }
            }

            let excluded = Some(index) == self.current
                && self.resolving_alias.as_deref() == Some(name);
            if !excluded {
                if let Some(alias) = symbol.aliases.get(name) {
                    return Ok((Symbol::FieldAlias(alias.clone()), index));
                }
            }

            let mut matching = symbol
                .tables
                .values()
                .filter(|table| table_has_field(database, table, name));
            if let Some(table) = matching.next() {
                let others = matching.map(|t| t.alias.clone()).collect::<Vec<_>>();
                if !others.is_empty() {
                    let mut tables = vec![table.alias.clone()];
                    tables.extend(others);
                    return Err(Error::AmbiguousReference {
                        name: name.to_string(),
                        tables,
                    });
                }
                let table = table.clone();
                return Ok((self.resolve_field_of_table(&table, name, index)?, index));
            }

            if let Some(table) = symbol.tables.get(name) {
                return Ok((Symbol::Table(table.clone()), index));
            }

            scope = symbol.parent;
        }
        Err(Error::UnknownField(name.to_string()))
    }

    /// Resolve `name` below an already resolved symbol.
    fn resolve_member(&mut self, symbol: Symbol, name: &str, owner: usize) -> Result<Symbol, Error> {
        match symbol {
            Symbol::Table(table) => self.resolve_field_of_table(&table, name, owner),
            Symbol::Field(mut field) if field.value_type.is_some_and(FieldType::has_properties) => {
                field.path.push(name.to_string());
                Ok(Symbol::Field(field))
            }
            Symbol::Field(field) => Err(Error::UnknownField(format!("{}.{name}", field.name))),
            Symbol::FieldAlias(alias) => {
                Err(Error::UnknownField(format!("{}.{name}", alias.name)))
            }
        }
    }

    fn resolve_field_of_table(
        &mut self,
        table: &TableSymbol,
        name: &str,
        owner: usize,
    ) -> Result<Symbol, Error> {
        let database = self.database;
        let unknown = || Error::UnknownField(qualified(&table.alias, name));
        let catalog = match &table.source {
            TableSource::SelectQuery(columns) => {
                let value_type = columns.get(name).ok_or_else(unknown)?;
                return Ok(Symbol::Field(FieldSymbol {
                    name: name.to_string(),
                    table: table.clone(),
                    column: name.to_string(),
                    path: vec![],
                    value_type: *value_type,
                }));
            }
            TableSource::Table(catalog) => catalog,
        };
        let info = database
            .get_table(&catalog.name)
            .ok_or_else(|| Error::UnknownTable(catalog.name.clone()))?;

        match info.get_field(name).ok_or_else(unknown)? {
            FieldInfo::Column {
                column,
                r#type,
                path,
            } => Ok(Symbol::Field(FieldSymbol {
                name: name.to_string(),
                table: table.clone(),
                column: column.clone(),
                path: path.clone(),
                value_type: Some(*r#type),
            })),
            FieldInfo::LazyJoin(join) => {
                let joined = database
                    .get_table(&join.join_table)
                    .ok_or_else(|| Error::UnknownTable(join.join_table.clone()))?;
                let from_column = info
                    .column_for(&join.from_field)
                    .ok_or_else(|| Error::UnknownField(qualified(&catalog.name, &join.from_field)))?;
                let to_column = joined
                    .column_for(&join.to_field)
                    .ok_or_else(|| Error::UnknownField(qualified(&join.join_table, &join.to_field)))?;
                let lazy_join = LazyJoinSymbol {
                    from_alias: table.alias.clone(),
                    from_column: from_column.to_string(),
                    table: catalog_table(&join.join_table, joined),
                    alias: format!("{}__{name}", table.alias),
                    to_column: to_column.to_string(),
                };
                self.scopes[owner]
                    .lazy_joins
                    .entry(lazy_join.alias.clone())
                    .or_insert_with(|| lazy_join.clone());

                let mut join_chain = table.join_chain.clone();
                join_chain.push(lazy_join.clone());
                Ok(Symbol::Table(TableSymbol {
                    alias: lazy_join.alias,
                    source: TableSource::Table(lazy_join.table),
                    join_chain,
                }))
            }
            FieldInfo::Traverser { chain } => {
                self.traversal_depth += 1;
                if self.traversal_depth > MAX_TRAVERSAL_DEPTH {
                    return Err(Error::Unsupported(format!(
                        "Following the traverser '{}' this deep",
                        qualified(&catalog.name, name)
                    )));
                }
                let mut symbol = Symbol::Table(table.clone());
                for step in chain {
                    symbol = self.resolve_member(symbol, step, owner)?;
                }
                Ok(symbol)
            }
        }
    }
}

pub(crate) fn catalog_table(name: &str, info: &TableInfo) -> CatalogTable {
    CatalogTable {
        name: name.to_string(),
        storage_table: info.storage_table.clone(),
        scoping_column: info.scoping_column.clone(),
    }
}

fn table_has_field(database: &Database, table: &TableSymbol, name: &str) -> bool {
    match &table.source {
        TableSource::Table(catalog) => database
            .get_table(&catalog.name)
            .is_some_and(|info| info.has_field(name)),
        TableSource::SelectQuery(columns) => columns.contains_key(name),
    }
}

fn qualified(table: &str, name: &str) -> String {
    if table.is_empty() {
        name.to_string()
    } else {
        format!("{table}.{name}")
    }
}

/// The name and type of the column a select-list item produces, if it has a name.
fn output_column(expr: &Expr) -> Option<(String, Option<FieldType>)> {
    match expr {
        Expr::Alias(alias) => Some((alias.alias.clone(), value_type(&alias.expr))),
        Expr::Field(field) => field
            .chain
            .last()
            .map(|name| (name.clone(), value_type(expr))),
        _ => None,
    }
}

/// The declared type of an expression, where it is known without evaluating anything.
fn value_type(expr: &Expr) -> Option<FieldType> {
    match expr {
        Expr::Field(field) => match &field.symbol {
            // extracted keys are no longer JSON documents
            Some(Symbol::Field(symbol)) if symbol.path.is_empty() => symbol.value_type,
            Some(Symbol::FieldAlias(alias)) => alias.value_type,
            _ => None,
        },
        Expr::Constant(Constant::Integer(_)) => Some(FieldType::Integer),
        Expr::Constant(Constant::Float(_)) => Some(FieldType::Float),
        Expr::Constant(Constant::String(_)) => Some(FieldType::String),
        Expr::Constant(Constant::Boolean(_)) => Some(FieldType::Boolean),
        Expr::Alias(alias) => value_type(&alias.expr),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::parser::{parse_expr, parse_select};
    use query_engine_metadata::metadata::hogql_database;

    fn events_scope() -> Vec<SelectQuerySymbol> {
        let info = hogql_database().get_table("events").unwrap();
        vec![SelectQuerySymbol::with_table(TableSymbol {
            alias: "events".to_string(),
            source: TableSource::Table(catalog_table("events", info)),
            join_chain: vec![],
        })]
    }

    fn resolve(text: &str) -> Result<SelectQuery, Error> {
        let mut expr = Expr::SelectQuery(Box::new(parse_select(text, false)?));
        resolve_symbols(&mut expr, hogql_database(), &mut vec![])?;
        match expr {
            Expr::SelectQuery(select) => Ok(*select),
            _ => unreachable!(),
        }
    }

    fn field_symbol(expr: &Expr) -> &FieldSymbol {
        let expr = match expr {
            Expr::Alias(alias) => &alias.expr,
            expr => expr,
        };
        match expr {
            Expr::Field(field) => match &field.symbol {
                Some(Symbol::Field(symbol)) => symbol,
                other => panic!("expected a field symbol, got {other:?}"),
            },
            other => panic!("expected a field, got {other:?}"),
        }
    }

    #[test]
    fn bare_property_access_resolves_on_the_default_table() {
        let mut scopes = events_scope();
        let mut expr = parse_expr("properties.$browser", false).unwrap();
        resolve_symbols(&mut expr, hogql_database(), &mut scopes).unwrap();
        let symbol = field_symbol(&expr);
        assert_eq!(symbol.table.alias, "events");
        assert_eq!(symbol.column, "properties");
        assert_eq!(symbol.path, vec!["$browser".to_string()]);
        assert_eq!(symbol.value_type, Some(FieldType::Json));
    }

    #[test]
    fn declared_properties_carry_their_path() {
        let mut scopes = events_scope();
        let mut expr = parse_expr("$session_id", false).unwrap();
        resolve_symbols(&mut expr, hogql_database(), &mut scopes).unwrap();
        let symbol = field_symbol(&expr);
        assert_eq!(symbol.column, "properties");
        assert_eq!(symbol.path, vec!["$session_id".to_string()]);
    }

    #[test]
    fn qualified_and_aliased_tables() {
        let select = resolve("SELECT e.event, events2.event FROM events e JOIN events events2 ON e.uuid = events2.uuid").unwrap();
        assert_eq!(field_symbol(&select.select[0]).table.alias, "e");
        assert_eq!(field_symbol(&select.select[1]).table.alias, "events2");
    }

    #[test]
    fn unqualified_field_in_two_tables_is_ambiguous() {
        assert_eq!(
            resolve("SELECT event FROM events e1 JOIN events e2 ON e1.uuid = e2.uuid"),
            Err(Error::AmbiguousReference {
                name: "event".to_string(),
                tables: vec!["e1".to_string(), "e2".to_string()],
            })
        );
    }

    #[test]
    fn unknown_names() {
        assert_eq!(
            resolve("SELECT 1 FROM nowhere"),
            Err(Error::UnknownTable("nowhere".to_string()))
        );
        assert_eq!(
            resolve("SELECT nope FROM events"),
            Err(Error::UnknownField("nope".to_string()))
        );
        assert_eq!(
            resolve("SELECT events.nope FROM events"),
            Err(Error::UnknownField("events.nope".to_string()))
        );
        assert_eq!(
            resolve("SELECT event.nope FROM events"),
            Err(Error::UnknownField("event.nope".to_string()))
        );
    }

    #[test]
    fn aliases_can_be_referenced_before_and_after_definition() {
        let select = resolve("SELECT e AS f, event AS e FROM events WHERE f = 'x'").unwrap();
        let Expr::Alias(first) = &select.select[0] else {
            panic!("expected an alias");
        };
        assert!(matches!(
            &*first.expr,
            Expr::Field(field) if matches!(&field.symbol, Some(Symbol::FieldAlias(alias)) if alias.name == "e")
        ));
        let symbol = select.symbol.unwrap();
        assert_eq!(symbol.columns.keys().collect::<Vec<_>>(), vec!["f", "e"]);
        assert_eq!(symbol.aliases["e"].value_type, Some(FieldType::String));
    }

    #[test]
    fn an_alias_does_not_refer_to_itself() {
        let select = resolve("SELECT event AS event FROM events").unwrap();
        assert_eq!(field_symbol(&select.select[0]).column, "event");
    }

    #[test]
    fn lazy_joins_are_recorded_once_on_the_owning_scope() {
        let select =
            resolve("SELECT pdi.person_id, pdi.distinct_id, person.id FROM events").unwrap();
        let symbol = select.symbol.as_ref().unwrap();
        assert_eq!(
            symbol.lazy_joins.keys().collect::<Vec<_>>(),
            vec!["events__pdi", "events__pdi__person"]
        );
        let pdi = &symbol.lazy_joins["events__pdi"];
        assert_eq!(pdi.from_alias, "events");
        assert_eq!(pdi.from_column, "distinct_id");
        assert_eq!(pdi.table.storage_table, "person_distinct_id2");
        assert_eq!(pdi.to_column, "distinct_id");
        let person = &symbol.lazy_joins["events__pdi__person"];
        assert_eq!(person.from_alias, "events__pdi");
        assert_eq!(person.to_column, "id");

        let id = field_symbol(&select.select[2]);
        assert_eq!(id.table.alias, "events__pdi__person");
        assert_eq!(id.table.join_chain.len(), 2);
    }

    #[test]
    fn table_aliases_win_over_lazy_join_fields() {
        let select = resolve(
            "SELECT person.id FROM events JOIN persons AS person ON events.person_id = person.id",
        )
        .unwrap();
        let id = field_symbol(&select.select[0]);
        assert_eq!(id.table.alias, "person");
        assert!(id.table.join_chain.is_empty());
        assert!(select.symbol.unwrap().lazy_joins.is_empty());
    }

    #[test]
    fn table_aliases_win_over_select_aliases() {
        let select = resolve("SELECT e.event AS e, e.uuid FROM events e").unwrap();
        assert_eq!(field_symbol(&select.select[0]).column, "event");
        let uuid = field_symbol(&select.select[1]);
        assert_eq!(uuid.table.alias, "e");
        assert_eq!(uuid.column, "uuid");

        // a bare name still means the select alias
        let select = resolve("SELECT event AS e, e FROM events e").unwrap();
        let Expr::Field(field) = &select.select[1] else {
            panic!("expected a field");
        };
        assert!(matches!(&field.symbol, Some(Symbol::FieldAlias(alias)) if alias.name == "e"));
    }

    #[test]
    fn nested_selects_see_enclosing_scopes() {
        let select = resolve(
            "SELECT event FROM events WHERE distinct_id IN \
             (SELECT distinct_id FROM person_distinct_ids WHERE person_id = events.person_id)",
        )
        .unwrap();
        let Some(Expr::CompareOperation { right, .. }) = &select.where_ else {
            panic!("expected a comparison");
        };
        let Expr::SelectQuery(inner) = &**right else {
            panic!("expected a nested select");
        };
        let inner_symbol = inner.symbol.as_ref().unwrap();
        assert!(inner_symbol.tables.contains_key("person_distinct_ids"));
        assert!(inner_symbol.parent.is_some());
    }

    #[test]
    fn from_subqueries_expose_their_columns() {
        let select = resolve(
            "SELECT sub.e, c FROM (SELECT event AS e, count() AS c FROM events GROUP BY e) AS sub",
        )
        .unwrap();
        let symbol = field_symbol(&select.select[0]);
        assert_eq!(symbol.table.alias, "sub");
        assert_eq!(symbol.value_type, Some(FieldType::String));
        assert_eq!(field_symbol(&select.select[1]).value_type, None);
    }

    #[test]
    fn unsupported_constructs() {
        assert!(matches!(
            resolve("SELECT * FROM events"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            resolve("SELECT events FROM events"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            resolve("SELECT pdi FROM events"),
            Err(Error::Unsupported(_))
        ));
        assert!(resolve("SELECT count(*) FROM events").is_ok());
    }

    #[test]
    fn placeholders_do_not_resolve() {
        let mut expr = parse_expr("{filter}", true).unwrap();
        assert!(matches!(
            resolve_symbols(&mut expr, hogql_database(), &mut events_scope()),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn failures_leave_the_scope_stack_unchanged() {
        let mut scopes = events_scope();
        let mut expr = parse_expr("event IN (SELECT nope FROM events)", false).unwrap();
        assert!(resolve_symbols(&mut expr, hogql_database(), &mut scopes).is_err());
        assert_eq!(scopes.len(), 1);
    }
}
