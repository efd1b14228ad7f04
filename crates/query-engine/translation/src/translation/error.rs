//! Errors for query translation.

use enum_iterator::Sequence;
use serde::Serialize;

/// A failure inside one of the translation stages.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Empty query")]
    EmptyQuery,
    #[error("Syntax error at line {line}, column {column}: {message}")]
    SyntaxError {
        message: String,
        line: u32,
        column: u32,
        /// Byte offset into the query text.
        offset: usize,
    },
    #[error("Unknown table '{0}'.")]
    UnknownTable(String),
    #[error("Unable to resolve field '{0}'.")]
    UnknownField(String),
    #[error("Ambiguous reference to '{name}', found in tables {}.", .tables.join(", "))]
    AmbiguousReference { name: String, tables: Vec<String> },
    #[error("{0} is not supported.")]
    Unsupported(String),
    #[error("Unknown function '{0}'.")]
    UnknownFunction(String),
    #[error("Printing unresolved {0}.")]
    NotResolved(String),
}

/// The kind of a `QueryError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Sequence, Serialize)]
pub enum ErrorKind {
    EmptyQuery,
    SyntaxError,
    UnknownTable,
    UnknownField,
    AmbiguousReference,
    Unsupported,
    UnknownFunction,
    NotResolved,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyQuery => ErrorKind::EmptyQuery,
            Error::SyntaxError { .. } => ErrorKind::SyntaxError,
            Error::UnknownTable(_) => ErrorKind::UnknownTable,
            Error::UnknownField(_) => ErrorKind::UnknownField,
            Error::AmbiguousReference { .. } => ErrorKind::AmbiguousReference,
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::UnknownFunction(_) => ErrorKind::UnknownFunction,
            Error::NotResolved(_) => ErrorKind::NotResolved,
        }
    }
}

/// The only error that leaves `translate`: what went wrong, and on which query.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    pub kind: ErrorKind,
    pub message: String,
    pub query: String,
}

impl QueryError {
    pub fn new(error: &Error, query: &str) -> QueryError {
        QueryError {
            kind: error.kind(),
            message: error.to_string(),
            query: query.to_string(),
        }
    }

    /// Whether the query itself is at fault, as opposed to a bug in the compiler.
    pub fn is_user_error(&self) -> bool {
        self.kind != ErrorKind::NotResolved
    }
}
