//! Metadata information regarding the tables and fields that can be queried.

use std::collections::BTreeMap;

use enum_iterator::Sequence;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The value types a field can declare.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Sequence,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    #[serde(rename = "datetime")]
    DateTime,
    /// A JSON document. Any key below it can be accessed, and is extracted at print time.
    Json,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::DateTime => "datetime",
            FieldType::Json => "json",
        }
    }

    /// Whether further keys can be accessed below a field of this type.
    pub fn has_properties(self) -> bool {
        self == FieldType::Json
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Describes how a table can be joined onto the table that declares the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinInfo {
    /// The HogQL name of the joined table.
    pub join_table: String,
    /// The field on the declaring table.
    pub from_field: String,
    /// The field on the joined table.
    pub to_field: String,
}

/// Information about a single field of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldInfo {
    /// A stored column, or a fixed path inside a stored JSON column.
    Column {
        column: String,
        r#type: FieldType,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        path: Vec<String>,
    },
    /// A field that is only reachable by joining another table.
    LazyJoin(JoinInfo),
    /// A shortcut for a chain of fields starting on the same table, e.g. `pdi.person`.
    Traverser { chain: Vec<String> },
}

impl FieldInfo {
    /// A plain stored column.
    pub fn column(column: &str, r#type: FieldType) -> FieldInfo {
        FieldInfo::Column {
            column: column.to_string(),
            r#type,
            path: vec![],
        }
    }

    /// A key inside a stored JSON column.
    pub fn property(column: &str, path: &[&str], r#type: FieldType) -> FieldInfo {
        FieldInfo::Column {
            column: column.to_string(),
            r#type,
            path: path.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn lazy_join(join_table: &str, from_field: &str, to_field: &str) -> FieldInfo {
        FieldInfo::LazyJoin(JoinInfo {
            join_table: join_table.to_string(),
            from_field: from_field.to_string(),
            to_field: to_field.to_string(),
        })
    }

    pub fn traverser(chain: &[&str]) -> FieldInfo {
        FieldInfo::Traverser {
            chain: chain.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Information about a queryable table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    /// The name of the table in the execution store.
    pub storage_table: String,
    /// The fields of this table, in declaration order.
    pub fields: IndexMap<String, FieldInfo>,
    /// The column holding the tenant identifier, if the table is tenant scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoping_column: Option<String>,
}

impl TableInfo {
    pub fn get_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Look up a field that must resolve to a stored column, e.g. a join key.
    pub fn column_for(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldInfo::Column { column, path, .. }) if path.is_empty() => Some(column),
            _ => None,
        }
    }
}

/// Mapping from a HogQL table name to its information.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TablesInfo(pub BTreeMap<String, TableInfo>);

impl TablesInfo {
    pub fn empty() -> Self {
        TablesInfo(BTreeMap::new())
    }
}

/// The whole catalog. Built once and then shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Database {
    pub tables: TablesInfo,
}

/// Problems found while checking a catalog supplied from outside.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Table '{table}' joins unknown table '{join_table}' through field '{field}'.")]
    UnknownJoinTable {
        table: String,
        field: String,
        join_table: String,
    },
    #[error("Join key '{key}' used by '{table}.{field}' is not a stored column.")]
    InvalidJoinKey {
        table: String,
        field: String,
        key: String,
    },
    #[error("Traverser '{table}.{field}' has an empty chain.")]
    EmptyTraverser { table: String, field: String },
    #[error("Scoping column '{column}' of table '{table}' is not a stored column.")]
    InvalidScopingColumn { table: String, column: String },
}

impl Database {
    pub fn empty() -> Self {
        Database {
            tables: TablesInfo::empty(),
        }
    }

    pub fn get_table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.0.get(name)
    }

    /// Check that joins point at existing tables and columns, so that resolution never has to
    /// deal with a dangling reference.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (table_name, table) in &self.tables.0 {
            if let Some(column) = &table.scoping_column {
                if !table.fields.values().any(
                    |field| matches!(field, FieldInfo::Column { column: c, path, .. } if c == column && path.is_empty()),
                ) {
                    return Err(CatalogError::InvalidScopingColumn {
                        table: table_name.clone(),
                        column: column.clone(),
                    });
                }
            }
            for (field_name, field) in &table.fields {
                match field {
                    FieldInfo::Column { .. } => {}
                    FieldInfo::LazyJoin(join) => {
                        let joined = self.get_table(&join.join_table).ok_or_else(|| {
                            CatalogError::UnknownJoinTable {
                                table: table_name.clone(),
                                field: field_name.clone(),
                                join_table: join.join_table.clone(),
                            }
                        })?;
                        for (owner, key) in [(table, &join.from_field), (joined, &join.to_field)] {
                            if owner.column_for(key).is_none() {
                                return Err(CatalogError::InvalidJoinKey {
                                    table: table_name.clone(),
                                    field: field_name.clone(),
                                    key: key.clone(),
                                });
                            }
                        }
                    }
                    FieldInfo::Traverser { chain } => {
                        if chain.is_empty() {
                            return Err(CatalogError::EmptyTraverser {
                                table: table_name.clone(),
                                field: field_name.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_field_type_names_match_serialization() {
        for field_type in enum_iterator::all::<FieldType>() {
            let serialized = serde_json::to_value(field_type).unwrap();
            assert_eq!(
                serialized,
                serde_json::Value::String(field_type.name().to_string()),
                "The field type {field_type:?} serializes differently from its name."
            );
        }
    }

    #[test]
    fn test_only_json_has_properties() {
        let with_properties = enum_iterator::all::<FieldType>()
            .filter(|field_type| field_type.has_properties())
            .collect::<BTreeSet<FieldType>>();
        assert_eq!(with_properties, BTreeSet::from([FieldType::Json]));
    }

    #[test]
    fn test_join_to_unknown_table_is_rejected() {
        let mut database = Database::empty();
        database.tables.0.insert(
            "events".to_string(),
            TableInfo {
                storage_table: "events".to_string(),
                fields: IndexMap::from([
                    (
                        "distinct_id".to_string(),
                        FieldInfo::column("distinct_id", FieldType::String),
                    ),
                    (
                        "pdi".to_string(),
                        FieldInfo::lazy_join("nowhere", "distinct_id", "distinct_id"),
                    ),
                ]),
                scoping_column: None,
            },
        );
        assert_eq!(
            database.validate(),
            Err(CatalogError::UnknownJoinTable {
                table: "events".to_string(),
                field: "pdi".to_string(),
                join_table: "nowhere".to_string(),
            })
        );
    }

    #[test]
    fn test_scoping_column_must_be_stored() {
        let mut database = Database::empty();
        database.tables.0.insert(
            "events".to_string(),
            TableInfo {
                storage_table: "events".to_string(),
                fields: IndexMap::from([(
                    "event".to_string(),
                    FieldInfo::column("event", FieldType::String),
                )]),
                scoping_column: Some("team_id".to_string()),
            },
        );
        assert!(matches!(
            database.validate(),
            Err(CatalogError::InvalidScopingColumn { .. })
        ));
    }
}
