//! The `hogql` command line: translate queries and inspect the catalog and configuration.

use std::io::Write;
use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use serde::Serialize;

use hogql_configuration::environment::Environment;
use hogql_configuration::{
    generate_latest_schema, make_runtime_configuration, parse_configuration,
    write_parsed_configuration, Configuration, ParsedConfiguration,
};
use query_engine_metadata::metadata::hogql_database;
use query_engine_sql::sql::string::Param;
use query_engine_translation::translation::{translate_with_catalog, Dialect, TranslationContext};

/// The various contextual bits and bobs we need to run.
pub struct Context<Env: Environment, Out: Write> {
    pub environment: Env,
    pub output: Out,
}

/// The command invoked by the user.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Translate a HogQL query into SQL.
    Translate(TranslateArgs),
    /// Print the tables queries can read, as JSON.
    Catalog {
        /// A directory holding a configuration.json.
        #[arg(long, env = "HOGQL_CONFIGURATION")]
        configuration: Option<PathBuf>,
    },
    /// Print the JSON schema of the configuration file.
    Schema,
    /// Write an initial configuration, and its schema, into a directory.
    Initialize {
        #[arg(long)]
        dir: PathBuf,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct TranslateArgs {
    /// The HogQL query, or expression with `--expression`.
    pub query: String,
    /// Restrict the query to this team. Implies a full SELECT query.
    #[arg(long)]
    pub team_id: Option<i64>,
    #[arg(long, value_enum, default_value_t = DialectArg::Clickhouse)]
    pub dialect: DialectArg,
    /// Translate a single expression over `events`, even with a team. The team is then not
    /// applied, and a notice says so.
    #[arg(long)]
    pub expression: bool,
    /// A directory holding a configuration.json.
    #[arg(long, env = "HOGQL_CONFIGURATION")]
    pub configuration: Option<PathBuf>,
    /// Format the printed SQL.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
    Hogql,
    Clickhouse,
}

impl From<DialectArg> for Dialect {
    fn from(value: DialectArg) -> Self {
        match value {
            DialectArg::Hogql => Dialect::Hogql,
            DialectArg::Clickhouse => Dialect::Clickhouse,
        }
    }
}

/// What `translate` prints.
#[derive(Debug, Serialize)]
pub struct TranslateOutput {
    pub sql: String,
    pub params: Vec<Param>,
    pub notices: Vec<String>,
}

/// Run a command in a given context.
pub fn run(command: Command, context: Context<impl Environment, impl Write>) -> anyhow::Result<()> {
    match command {
        Command::Translate(args) => translate(args, context),
        Command::Catalog { configuration } => catalog(configuration, context),
        Command::Schema => schema(context),
        Command::Initialize { dir } => {
            write_parsed_configuration(&ParsedConfiguration::initial(), &dir)?;
            tracing::info!(dir = %dir.display(), "wrote the initial configuration");
            Ok(())
        }
    }
}

fn load_configuration(
    configuration: Option<PathBuf>,
    environment: impl Environment,
) -> anyhow::Result<Configuration> {
    match configuration {
        Some(dir) => Ok(make_runtime_configuration(
            parse_configuration(dir)?,
            environment,
        )?),
        None => Ok(Configuration {
            scoping_value: None,
            database: hogql_database().clone(),
        }),
    }
}

fn translate(
    args: TranslateArgs,
    mut context: Context<impl Environment, impl Write>,
) -> anyhow::Result<()> {
    let configuration = load_configuration(args.configuration, &context.environment)?;
    let scoping_value = args.team_id.or(configuration.scoping_value);

    let mut translation_context = TranslationContext::new(scoping_value);
    if args.expression {
        translation_context = translation_context.with_full_query(false);
    }
    let sql = translate_with_catalog(
        &args.query,
        &configuration.database,
        &mut translation_context,
        args.dialect.into(),
    )?;
    let sql = if args.pretty {
        sqlformat::format(
            &sql,
            &sqlformat::QueryParams::None,
            sqlformat::FormatOptions::default(),
        )
    } else {
        sql
    };

    let output = TranslateOutput {
        sql,
        params: translation_context.take_parameters(),
        notices: translation_context.notices().to_vec(),
    };
    serde_json::to_writer_pretty(&mut context.output, &output)?;
    writeln!(context.output)?;
    Ok(())
}

fn catalog(
    configuration: Option<PathBuf>,
    mut context: Context<impl Environment, impl Write>,
) -> anyhow::Result<()> {
    let configuration = load_configuration(configuration, &context.environment)?;
    serde_json::to_writer_pretty(&mut context.output, &configuration.database)?;
    writeln!(context.output)?;
    Ok(())
}

fn schema(mut context: Context<impl Environment, impl Write>) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut context.output, &generate_latest_schema())?;
    writeln!(context.output)?;
    Ok(())
}
