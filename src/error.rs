//! Typed errors for the translation engine.

use thiserror::Error;

/// Failures while parsing or validating a description document.
/// A reload that fails keeps the previously installed snapshot.
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("description document could not be parsed: {0}")]
    Parse(String),
    #[error("description document could not be read: {0}")]
    Read(String),
    #[error("route '{path}' method '{method}' has no table tag")]
    MissingTable { path: String, method: String },
    #[error("route '{path}' method '{method}' refers to table '{table}' which has no schema")]
    UnknownRouteTable {
        path: String,
        method: String,
        table: String,
    },
    #[error("link '{link}' points at result table '{table}' which has no schema")]
    UnknownResultTable { link: String, table: String },
}

/// Failures while compiling a filter expression. Compilation stops at the
/// first error; no fragment is returned alongside one of these.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("semicolons are not allowed in the filter parameter")]
    SemicolonRejected,
    #[error("invalid filter query, the following characters are not allowed: {0}")]
    UnexpectedInput(String),
    #[error("must specify two values separated by comma in '{0}' filter")]
    BetweenArity(String),
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),
    #[error("unknown filter field '{0}'")]
    UnknownField(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error("that resource doesn't exist")]
    RouteNotFound,
    #[error("method {0} is not supported")]
    MethodNotAllowed(String),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("no ID specified in path for {0}")]
    MissingIdentifier(String),
    #[error("{0} is not a valid method")]
    UnsupportedMethod(String),
    #[error("invalid {name} argument '{value}'. Must be an integer bigger than 0")]
    InvalidPageArgument { name: &'static str, value: String },
    #[error("unknown orderBy column '{0}'")]
    UnknownOrderColumn(String),
    #[error("{0}")]
    InvalidBody(String),
    #[error("{message}")]
    Backend {
        message: String,
        statement: Option<String>,
    },
}

impl ApiError {
    /// Failing statement text, present only for backend execution errors.
    pub fn statement(&self) -> Option<&str> {
        match self {
            ApiError::Backend { statement, .. } => statement.as_deref(),
            _ => None,
        }
    }
}
