//! Configuration for the query compiler.

use query_engine_metadata::metadata::Database;
use schemars::{gen::SchemaSettings, schema::RootSchema};

use crate::version1::ParsedConfiguration;

/// The 'Configuration' type collects all the information necessary to translate queries.
///
/// 'ParsedConfiguration' is the serialized, versioned format. It may refer to values held in
/// the environment, which are read when a 'Configuration' is produced with
/// 'make_runtime_configuration'.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// The team every query is restricted to. Without one, queries are expressions.
    pub scoping_value: Option<i64>,
    pub database: Database,
}

/// The JSON schema of the configuration file.
pub fn generate_latest_schema() -> RootSchema {
    SchemaSettings::draft07()
        .into_generator()
        .into_root_schema_for::<ParsedConfiguration>()
}
