//! Compile HogQL into ClickHouse SQL.
//!
//! Text is parsed into an AST, names are bound to the catalog by the resolver, and the
//! printer renders the annotated tree in the requested dialect.

pub mod context;
pub mod error;
pub mod functions;
pub mod parser;
pub mod printer;
pub mod resolver;
pub mod translate;

pub use context::TranslationContext;
pub use error::{Error, ErrorKind, QueryError};
pub use printer::{print_ast, Dialect};
pub use translate::{translate, translate_to_sql, translate_with_catalog};
