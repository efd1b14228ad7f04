//! The first version of the configuration file format.

use std::fs;
use std::path::Path;

use query_engine_metadata::metadata::{hogql_database, Database};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ParseConfigurationError, WriteParsedConfigurationError};
use crate::values::ScopingValue;

pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";
pub const DEFAULT_SCOPING_VALUE_VARIABLE: &str = "HOGQL_TEAM_ID";

/// The configuration as written in `configuration.json`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfiguration {
    // Which version of the configuration format are we using
    pub version: Version,
    /// The team every query is restricted to. When absent, queries are translated as
    /// expressions over `events`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoping_value: Option<ScopingValue>,
    /// The tables queries may read. Defaults to the built-in HogQL catalog.
    #[serde(default = "default_database")]
    pub database: Database,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize, JsonSchema)]
pub enum Version {
    #[serde(rename = "1")]
    This,
}

fn default_database() -> Database {
    hogql_database().clone()
}

impl ParsedConfiguration {
    /// The configuration a new project starts with: the built-in catalog, scoped by the team
    /// in `HOGQL_TEAM_ID`.
    pub fn initial() -> Self {
        ParsedConfiguration {
            version: Version::This,
            scoping_value: Some(ScopingValue::FromEnvironment {
                variable: DEFAULT_SCOPING_VALUE_VARIABLE.into(),
            }),
            database: default_database(),
        }
    }
}

/// Parse the configuration format from a directory.
pub fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents = fs::read_to_string(&configuration_file).map_err(|error| {
        ParseConfigurationError::IoError {
            file_path: configuration_file.clone(),
            error,
        }
    })?;

    let parsed_config: ParsedConfiguration = serde_json::from_str(&configuration_file_contents)
        .map_err(|error| ParseConfigurationError::ParseError {
            file_path: configuration_file.clone(),
            line: error.line(),
            column: error.column(),
            message: error.to_string(),
        })?;

    tracing::debug!(
        file = %configuration_file.display(),
        tables = parsed_config.database.tables.0.len(),
        "parsed configuration"
    );
    Ok(parsed_config)
}

/// Write the parsed configuration, and its JSON schema, into a directory on disk.
pub fn write_parsed_configuration(
    parsed_config: &ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    fs::create_dir_all(out_dir.as_ref())?;

    let configuration_file = out_dir.as_ref().join(CONFIGURATION_FILENAME);
    fs::write(
        configuration_file,
        serde_json::to_string_pretty(parsed_config)? + "\n",
    )?;

    let configuration_jsonschema_file = out_dir.as_ref().join(CONFIGURATION_JSONSCHEMA_FILENAME);
    fs::write(
        configuration_jsonschema_file,
        serde_json::to_string_pretty(&crate::generate_latest_schema())? + "\n",
    )?;

    Ok(())
}
