//! Symbols: what the names in a HogQL query are bound to.
//!
//! Symbols are self-contained. Once a node carries one, printing it needs neither the catalog
//! nor the scope it was resolved in.

use indexmap::IndexMap;

use query_engine_metadata::metadata::FieldType;

/// A table of the catalog, with what the printer needs to know about its storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTable {
    /// The HogQL name, e.g. `persons`.
    pub name: String,
    /// The table in the execution store, e.g. `person`.
    pub storage_table: String,
    pub scoping_column: Option<String>,
}

/// What a table in a scope is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Table(CatalogTable),
    /// A nested SELECT, known by its output columns.
    SelectQuery(IndexMap<String, Option<FieldType>>),
}

/// A join the user did not write, reached through a lazy join field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyJoinSymbol {
    pub from_alias: String,
    pub from_column: String,
    pub table: CatalogTable,
    pub alias: String,
    pub to_column: String,
}

/// A table visible in a scope, or reached from one.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSymbol {
    /// The name this table is referred to by in printed SQL.
    pub alias: String,
    pub source: TableSource,
    /// The implicit joins needed to reach this table, outermost first. Empty for tables
    /// named in a FROM clause.
    pub join_chain: Vec<LazyJoinSymbol>,
}

impl TableSymbol {
    pub fn catalog_table(&self) -> Option<&CatalogTable> {
        match &self.source {
            TableSource::Table(table) => Some(table),
            TableSource::SelectQuery(_) => None,
        }
    }
}

/// A field bound to a column of a table, possibly narrowed to a path inside a JSON column.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSymbol {
    /// The field name as declared.
    pub name: String,
    pub table: TableSymbol,
    pub column: String,
    /// Keys to extract from `column`. Non-empty only for JSON columns.
    pub path: Vec<String>,
    /// `None` for computed columns of a nested SELECT.
    pub value_type: Option<FieldType>,
}

/// A reference to an alias from the select list of the current scope.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAliasSymbol {
    pub name: String,
    pub value_type: Option<FieldType>,
}

/// What a field chain resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Table(TableSymbol),
    Field(FieldSymbol),
    FieldAlias(FieldAliasSymbol),
}

/// Everything visible inside one SELECT.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectQuerySymbol {
    /// Tables of the FROM clause and its joins, by alias.
    pub tables: IndexMap<String, TableSymbol>,
    /// Aliases defined in the select list.
    pub aliases: IndexMap<String, FieldAliasSymbol>,
    /// The named output columns of this query.
    pub columns: IndexMap<String, Option<FieldType>>,
    /// Implicit joins to materialize, by alias.
    pub lazy_joins: IndexMap<String, LazyJoinSymbol>,
    /// Index of the enclosing scope in the scope stack this symbol was resolved in.
    pub parent: Option<usize>,
}

impl SelectQuerySymbol {
    /// A scope with a single table, for resolving bare expressions.
    pub fn with_table(table: TableSymbol) -> SelectQuerySymbol {
        let mut tables = IndexMap::new();
        tables.insert(table.alias.clone(), table);
        SelectQuerySymbol {
            tables,
            ..SelectQuerySymbol::default()
        }
    }
}
