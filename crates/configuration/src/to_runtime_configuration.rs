//! Convert a parsed configuration into the one used to translate queries.

use crate::configuration::Configuration;
use crate::environment::Environment;
use crate::error::MakeRuntimeConfigurationError;
use crate::values::ScopingValue;
use crate::version1::ParsedConfiguration;

/// Read the values held in the environment and check the catalog.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
    environment: impl Environment,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    let scoping_value = match parsed_config.scoping_value {
        None => None,
        Some(ScopingValue::Plain(value)) => Some(value),
        Some(ScopingValue::FromEnvironment { variable }) => {
            let value = environment.read(&variable)?;
            match value.trim().parse::<i64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    return Err(MakeRuntimeConfigurationError::InvalidScopingValue {
                        variable,
                        value,
                    })
                }
            }
        }
    };

    parsed_config.database.validate()?;

    Ok(Configuration {
        scoping_value,
        database: parsed_config.database,
    })
}
