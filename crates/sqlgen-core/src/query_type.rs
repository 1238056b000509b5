//! Query execution types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Execution shape of a query
///
/// The type decides the signature and the body of the generated accessor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Every matching row, handed to a per-row callback
    #[default]
    Many,

    /// A single row
    One,

    /// Executed without reading rows
    Exec,

    /// Number of rows changed
    Affected,

    /// Whether at least one row changed
    Exist,

    /// Server-generated identifier of the inserted row
    #[serde(rename = "id")]
    RowId,
}

impl QueryType {
    pub const ALL: [QueryType; 6] = [
        Self::Many,
        Self::One,
        Self::Exec,
        Self::Affected,
        Self::Exist,
        Self::RowId,
    ];

    /// Canonical lowercase token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Many => "many",
            Self::One => "one",
            Self::Exec => "exec",
            Self::Affected => "affected",
            Self::Exist => "exist",
            Self::RowId => "id",
        }
    }

    /// Whether queries of this type read result rows into `out`
    pub fn returns_rows(&self) -> bool {
        matches!(self, Self::Many | Self::One)
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized query type token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported query type: {0:?}")]
pub struct ParseTypeError(pub String);

impl FromStr for QueryType {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "many" => Ok(Self::Many),
            "one" => Ok(Self::One),
            "exec" => Ok(Self::Exec),
            "affected" => Ok(Self::Affected),
            "exist" => Ok(Self::Exist),
            "id" | "row_id" | "rowid" => Ok(Self::RowId),
            _ => Err(ParseTypeError(s.to_string())),
        }
    }
}
