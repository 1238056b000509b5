//! sqlgen Core
//!
//! Query document model with strict validation.
//!
//! This crate handles:
//! - Adapting the YAML event stream into a positioned, commented node tree
//! - Building the query model (queries, fields, SQL, query types)
//! - Enforcing the model invariants with located diagnostics
//! - Writing a model back as a canonical query document
//! - Loading the `sqlgen.toml` configuration

pub mod comment;
pub mod config;
pub mod document;
pub mod error;
pub mod fields;
pub mod parse;
pub mod position;
pub mod queries;
pub mod query;
pub mod query_type;
pub mod sql;
pub mod writer;

pub use comment::Comment;
pub use config::{Config, ConfigError, FormatConfig, CONFIG_FILE};
pub use document::{Node, NodeKind, ScalarStyle};
pub use error::{ErrorKind, SchemaError};
pub use fields::{Field, Fields};
pub use parse::{parse_file, parse_str};
pub use position::Position;
pub use queries::Queries;
pub use query::Query;
pub use query_type::{ParseTypeError, QueryType};
pub use sql::{Sql, SqlStyle};
