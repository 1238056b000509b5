//! Located schema errors
//!
//! Every error raised while reading a query document carries the query it
//! belongs to and the position of the offending node. Reading stops at the
//! first error; there is no recovery within a document.

use crate::position::Position;
use serde::{Deserialize, Serialize};

/// Boxed underlying cause of a schema error
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Wrong node kind (mapping or scalar expected), or unreadable document
    Structural,

    /// Duplicate query or field name
    Redefined,

    /// Empty name, type or SQL text
    Missing,

    /// Unrecognized query type token
    UnknownType,

    /// `out` required but absent, present but forbidden, or typed as a pointer
    ShapeMismatch,

    /// Unknown key in a query object
    UnknownProperty,

    /// Type package prefix not found in the import table
    UnresolvedPrefix,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Redefined => "redefined",
            Self::Missing => "missing",
            Self::UnknownType => "unknown_type",
            Self::ShapeMismatch => "shape_mismatch",
            Self::UnknownProperty => "unknown_property",
            Self::UnresolvedPrefix => "unresolved_prefix",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised while building or resolving the query model
///
/// Renders as `[line:column] "query" message`, followed by `: cause` when the
/// error wraps another one.
#[derive(Debug, thiserror::Error)]
#[error("[{position}] {query:?} {message}{}", cause_suffix(.cause))]
pub struct SchemaError {
    pub kind: ErrorKind,
    pub message: String,
    /// Name of the query being read (empty before any query is known)
    pub query: String,
    pub position: Position,
    #[source]
    pub cause: Option<Cause>,
}

impl SchemaError {
    pub fn new(kind: ErrorKind, position: Position, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            query: String::new(),
            position,
            cause: None,
        }
    }

    /// Attach the name of the query the error belongs to
    pub fn in_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Wrap an underlying error
    pub fn with_cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

fn cause_suffix(cause: &Option<Cause>) -> String {
    match cause {
        Some(cause) => format!(": {}", cause),
        None => String::new(),
    }
}
