//! Query collections

use crate::document::Node;
use crate::error::{ErrorKind, SchemaError};
use crate::query::Query;
use serde::Serialize;
use std::collections::HashMap;

/// Ordered set of uniquely named queries read from one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Queries {
    queries: Vec<Query>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Queries {
    /// Read every query of a document root
    ///
    /// The root must map query names to query objects. Reading stops at the
    /// first invalid query.
    pub fn from_node(node: &Node) -> Result<Self, SchemaError> {
        let node = node.resolve();
        let pairs = node.as_mapping().ok_or_else(|| {
            SchemaError::new(
                ErrorKind::Structural,
                node.position,
                format!("queries must be a mapping: have {}", node.kind_name()),
            )
        })?;

        let mut queries = Queries::default();
        queries.queries.reserve(pairs.len());

        for (name_node, value) in pairs {
            let name = name_node.text();
            if name.is_empty() {
                return Err(SchemaError::new(
                    ErrorKind::Missing,
                    name_node.position,
                    "query name not defined",
                ));
            }

            if queries.index.contains_key(name) {
                return Err(SchemaError::new(
                    ErrorKind::Redefined,
                    name_node.position,
                    format!("query {:?} redefined", name),
                )
                .in_query(name));
            }

            let query = Query::from_node(name_node, value)?;
            tracing::debug!(query = %query.name, kind = %query.kind, "read query");

            queries.index.insert(query.name.clone(), queries.queries.len());
            queries.queries.push(query);
        }

        Ok(queries)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Query names in document order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.iter().map(|q| q.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Query> {
        self.index.get(name).map(|&i| &self.queries[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Query> {
        self.queries.iter()
    }

    pub fn as_slice(&self) -> &[Query] {
        &self.queries
    }
}

impl<'a> IntoIterator for &'a Queries {
    type Item = &'a Query;
    type IntoIter = std::slice::Iter<'a, Query>;

    fn into_iter(self) -> Self::IntoIter {
        self.queries.iter()
    }
}
