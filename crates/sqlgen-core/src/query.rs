//! Query definitions

use crate::comment::Comment;
use crate::document::Node;
use crate::error::{ErrorKind, SchemaError};
use crate::fields::Fields;
use crate::position::Position;
use crate::query_type::QueryType;
use crate::sql::Sql;
use serde::Serialize;

/// A named database query
///
/// The comment written above the query name documents the generated
/// accessor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Query {
    pub name: String,
    pub comment: Comment,
    #[serde(rename = "type")]
    pub kind: QueryType,
    pub sql: Sql,
    pub params: Fields,
    pub out: Fields,
    /// Position of the query name
    #[serde(skip)]
    pub position: Position,
}

impl Query {
    /// Read a query object from its name and definition nodes
    ///
    /// Recognized keys are `type`, `sql`, `params` and `out`. A query without
    /// `type` reads every row (`many`).
    pub fn from_node(name_node: &Node, node: &Node) -> Result<Self, SchemaError> {
        let name = name_node.text();
        let mut query = Query {
            name: name.to_string(),
            comment: Comment::from_nodes(&[name_node]),
            position: name_node.position,
            ..Default::default()
        };

        let node = node.resolve();
        let pairs = node.as_mapping().ok_or_else(|| {
            SchemaError::new(
                ErrorKind::Structural,
                node.position,
                format!("query must be a mapping: have {}", node.kind_name()),
            )
            .in_query(name)
        })?;

        let mut sql = None;
        for (key, value) in pairs {
            match key.text() {
                "type" => {
                    query.kind = value.resolve().text().parse().map_err(|e| {
                        SchemaError::new(ErrorKind::UnknownType, value.position, "parse type")
                            .in_query(name)
                            .with_cause(e)
                    })?;
                }

                "sql" => {
                    sql = Some(Sql::from_node(value).map_err(|e| e.in_query(name))?);
                }

                "params" => {
                    query.params = Fields::from_node(value, name)?;
                    // the comment on the key documents the whole block
                    query.params.comment = Comment::from_nodes(&[key]);
                }

                "out" => {
                    query.out = Fields::from_node(value, name)?;
                    query.out.comment = Comment::from_nodes(&[key]);
                }

                other => {
                    return Err(SchemaError::new(
                        ErrorKind::UnknownProperty,
                        key.position,
                        format!("unknown property {:?}", other),
                    )
                    .in_query(name));
                }
            }
        }

        query.sql = sql.ok_or_else(|| {
            SchemaError::new(ErrorKind::Missing, query.position, "sql not defined").in_query(name)
        })?;

        query.validate_shape()?;
        Ok(query)
    }

    /// Check `out` against the query type
    ///
    /// Row-reading types need result fields, other types must not declare
    /// any, and result fields are scanned into values so they cannot be
    /// pointers.
    fn validate_shape(&self) -> Result<(), SchemaError> {
        let shape_error = |position, message: String| {
            Err(SchemaError::new(ErrorKind::ShapeMismatch, position, message).in_query(&self.name))
        };

        if self.kind.returns_rows() && self.out.is_empty() {
            return shape_error(
                self.position,
                format!("{} query must describe its out fields", self.kind),
            );
        }

        if !self.kind.returns_rows() && !self.out.is_empty() {
            return shape_error(
                self.out.position,
                format!("{} query returns no rows: out fields are not used", self.kind),
            );
        }

        if let Some(field) = self.out.iter().find(|f| f.is_pointer()) {
            return shape_error(
                field.position,
                format!("unsupported out field {:?} pointer type {:?}", field.name, field.type_name),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use pretty_assertions::assert_eq;

    fn query(source: &str) -> Result<Query, SchemaError> {
        let root = parse_document(source).unwrap().unwrap();
        let (name, value) = &root.as_mapping().unwrap()[0];
        Query::from_node(name, value)
    }

    #[test]
    fn reads_all_properties() {
        let source = "\
# select user
# by its id
select_user:
  type: one
  sql: select * from users where id = ?
  # lookup key
  params:
    id: string
  out:
    id: string
    name: string
";
        let q = query(source).unwrap();

        assert_eq!(q.name, "select_user");
        assert_eq!(q.comment.lines(), ["select user", "by its id"]);
        assert_eq!(q.kind, QueryType::One);
        assert_eq!(q.sql.as_str(), "select * from users where id = ?");
        assert_eq!(q.sql.position, Position::new(5, 8));
        assert_eq!(q.params.len(), 1);
        assert_eq!(q.params.comment.lines(), ["lookup key"]);
        assert_eq!(q.out.len(), 2);
        assert!(q.out.comment.is_empty());
        assert_eq!(q.position, Position::new(3, 1));
    }

    #[test]
    fn missing_type_reads_many() {
        let q = query("all:\n  sql: select 1\n  out:\n    n: int\n").unwrap();
        assert_eq!(q.kind, QueryType::Many);
    }

    #[test]
    fn unknown_type() {
        let err = query("q:\n  type: lots\n  sql: select 1\n").unwrap_err();

        assert_eq!(err.kind, ErrorKind::UnknownType);
        assert_eq!(err.query, "q");
        assert_eq!(err.position, Position::new(2, 9));
        assert_eq!(err.to_string(), "[2:9] \"q\" parse type: unsupported query type: \"lots\"");
    }

    #[test]
    fn unknown_property() {
        let err = query("q:\n  type: exec\n  sql: delete from t\n  result: x\n").unwrap_err();

        assert_eq!(err.kind, ErrorKind::UnknownProperty);
        assert!(err.message.contains("\"result\""));
        assert_eq!(err.position, Position::new(4, 3));
    }

    #[test]
    fn missing_sql() {
        let err = query("q:\n  type: exec\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Missing);

        let err = query("q:\n  type: exec\n  sql: \"\"\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Missing);
    }

    #[test]
    fn row_types_require_out() {
        for kind in ["many", "one"] {
            let err = query(&format!("q:\n  type: {}\n  sql: select 1\n", kind)).unwrap_err();
            assert_eq!(err.kind, ErrorKind::ShapeMismatch, "{}", kind);
        }
    }

    #[test]
    fn other_types_forbid_out() {
        for kind in ["exec", "affected", "exist", "id"] {
            let source = format!("q:\n  type: {}\n  sql: delete from t\n  out:\n    n: int\n", kind);
            let err = query(&source).unwrap_err();
            assert_eq!(err.kind, ErrorKind::ShapeMismatch, "{}", kind);
        }
    }

    #[test]
    fn pointer_out_field_rejected() {
        let source = "q:\n  type: one\n  sql: select 1\n  out:\n    name: \"*string\"\n";
        let err = query(source).unwrap_err();

        assert_eq!(err.kind, ErrorKind::ShapeMismatch);
        assert!(err.message.contains("\"name\""));
        assert_eq!(err.position, Position::new(5, 5));
    }

    #[test]
    fn pointer_params_allowed() {
        let source = "q:\n  type: exec\n  sql: update t set a = ?\n  params:\n    a: \"*string\"\n";
        assert!(query(source).is_ok());
    }

    #[test]
    fn query_must_be_mapping() {
        let err = query("q: select 1\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
        assert_eq!(err.query, "q");
    }
}
