//! Errors that can occur when reading or interpreting the configuration.

use std::path::PathBuf;

use query_engine_metadata::metadata::CatalogError;

use crate::environment;
use crate::values::Variable;

/// The errors that can be thrown when parsing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {file_path}:{line}:{column}: {message}")]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("I/O error on {file_path}: {error}")]
    IoError {
        file_path: PathBuf,
        error: std::io::Error,
    },
}

/// The errors that can be thrown when writing a configuration to disk.
#[derive(Debug, thiserror::Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// The errors that can be thrown when turning a parsed configuration into a runtime one.
#[derive(Debug, thiserror::Error)]
pub enum MakeRuntimeConfigurationError {
    #[error("missing environment variable: {0}")]
    MissingEnvironmentVariable(#[from] environment::Error),
    #[error("the scoping value in {variable} is not an integer: {value:?}")]
    InvalidScopingValue { variable: Variable, value: String },
    #[error("invalid catalog: {0}")]
    InvalidCatalog(#[from] CatalogError),
}
