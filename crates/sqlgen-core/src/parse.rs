//! Document entry points

use crate::document::parse_document;
use crate::error::{ErrorKind, SchemaError};
use crate::position::Position;
use crate::queries::Queries;
use std::path::Path;

/// Parse query document text
///
/// A document without content holds no queries.
pub fn parse_str(source: &str) -> Result<Queries, SchemaError> {
    match parse_document(source)? {
        Some(root) => Queries::from_node(&root),
        None => Ok(Queries::default()),
    }
}

/// Read and parse a query document file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Queries, SchemaError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "reading query document");

    let source = std::fs::read_to_string(path).map_err(|e| {
        SchemaError::new(
            ErrorKind::Structural,
            Position::default(),
            format!("read {}", path.display()),
        )
        .with_cause(e)
    })?;

    parse_str(&source)
}
