#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use hogql_configuration::environment::FixedEnvironment;
use query_engine_sql::sql::string::Param;
use query_engine_translation::translation::{
    translate_with_catalog, Dialect, QueryError, TranslationContext,
};

/// Translate `tests/goldenfiles/<testname>/query.hogql` with the configuration next to it, and
/// render the result with its parameters.
pub fn test_translation(testname: &str, dialect: Dialect) -> anyhow::Result<String> {
    let directory = PathBuf::from("tests/goldenfiles").join(testname);

    let parsed_configuration = hogql_configuration::parse_configuration(&directory)?;
    let configuration = hogql_configuration::make_runtime_configuration(
        parsed_configuration,
        FixedEnvironment::default(),
    )?;

    let query = fs::read_to_string(directory.join("query.hogql"))?;
    let mut context = TranslationContext::new(configuration.scoping_value);
    let sql = translate_with_catalog(query.trim(), &configuration.database, &mut context, dialect)?;
    Ok(render(&sql, context.parameters()))
}

/// Translate against the built-in catalog.
pub fn translate(
    query: &str,
    scoping_value: Option<i64>,
    dialect: Dialect,
) -> Result<(String, Vec<Param>), QueryError> {
    let mut context = TranslationContext::new(scoping_value);
    let sql = query_engine_translation::translation::translate(query, &mut context, dialect)?;
    Ok((sql, context.take_parameters()))
}

fn render(sql: &str, params: &[Param]) -> String {
    let params = params
        .iter()
        .enumerate()
        .map(|(index, param)| format!("{index}: {param}"))
        .collect::<Vec<_>>();
    format!("{sql}\n\n[{}]", params.join(", "))
}
