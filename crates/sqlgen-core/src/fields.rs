//! Parameter and result field blocks

use crate::comment::Comment;
use crate::document::Node;
use crate::error::{ErrorKind, SchemaError};
use crate::position::Position;
use serde::Serialize;
use std::collections::HashMap;

/// A named, typed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    /// Type identifier, copied verbatim into generated code
    #[serde(rename = "type")]
    pub type_name: String,
    pub comment: Comment,
    #[serde(skip)]
    pub position: Position,
}

impl Field {
    /// Whether the type starts with a pointer or reference marker
    pub fn is_pointer(&self) -> bool {
        self.type_name.starts_with(['*', '&'])
    }
}

/// Ordered block of uniquely named fields
///
/// A block written once under an anchor (`&Name`) and reused through an
/// alias (`*Name`) is copied into every query using it; `anchor` and `alias`
/// record that relationship so generated code can share one type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Fields {
    pub comment: Comment,
    fields: Vec<Field>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    /// Name under which this block is defined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    /// Name of the block this one was copied from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip)]
    pub position: Position,
}

impl Fields {
    /// Read a mapping of field name to type identifier
    ///
    /// `query` names the owning query in diagnostics.
    pub fn from_node(node: &Node, query: &str) -> Result<Self, SchemaError> {
        let mut fields = Fields {
            anchor: node.anchor.clone(),
            alias: node.alias_of().map(str::to_string),
            ..Default::default()
        };

        let node = node.resolve();
        let pairs = node.as_mapping().ok_or_else(|| {
            SchemaError::new(
                ErrorKind::Structural,
                node.position,
                format!("fields must be a mapping: have {}", node.kind_name()),
            )
            .in_query(query)
        })?;

        fields.position = node.position;
        fields.fields.reserve(pairs.len());

        for (name_node, written_type) in pairs {
            let name = name_node.text();
            if name.is_empty() {
                return Err(SchemaError::new(ErrorKind::Missing, name_node.position, "field name not defined")
                    .in_query(query));
            }

            let type_node = written_type.resolve();
            if !type_node.is_scalar() {
                return Err(SchemaError::new(
                    ErrorKind::Structural,
                    type_node.position,
                    format!("field {:?} type must be a scalar: have {}", name, type_node.kind_name()),
                )
                .in_query(query));
            }

            let type_name = type_node.text().trim();
            if type_name.is_empty() {
                return Err(SchemaError::new(
                    ErrorKind::Missing,
                    type_node.position,
                    format!("field {:?} type not defined", name),
                )
                .in_query(query));
            }

            fields
                .push(Field {
                    name: name.to_string(),
                    type_name: type_name.to_string(),
                    comment: Comment::from_nodes(&[name_node, written_type]),
                    position: name_node.position,
                })
                .map_err(|e| e.in_query(query))?;
        }

        Ok(fields)
    }

    /// Append a field, rejecting a name already present
    pub fn push(&mut self, field: Field) -> Result<(), SchemaError> {
        if self.index.contains_key(&field.name) {
            return Err(SchemaError::new(
                ErrorKind::Redefined,
                field.position,
                format!("field {:?} redefined", field.name),
            ));
        }

        self.index.insert(field.name.clone(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn as_slice(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Name this block shares with other blocks, if any
    pub fn shared_name(&self) -> Option<&str> {
        self.alias.as_deref().or(self.anchor.as_deref())
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use pretty_assertions::assert_eq;

    fn block(source: &str, key: &str) -> Result<Fields, SchemaError> {
        let root = parse_document(source).unwrap().unwrap();
        let (_, node) = root
            .as_mapping()
            .unwrap()
            .iter()
            .find(|(k, _)| k.text() == key)
            .unwrap();
        Fields::from_node(node, "q")
    }

    #[test]
    fn keeps_document_order() {
        let fields = block("p:\n  name: string\n  age: uint\n  id: string\n", "p").unwrap();

        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "id"]);
        assert_eq!(fields.get("age").unwrap().type_name, "uint");
        assert_eq!(fields.get("age").unwrap().position, Position::new(3, 3));
    }

    #[test]
    fn field_comments() {
        let source = "p:\n  # user name\n  name: string\n  age: uint # in years\n";
        let fields = block(source, "p").unwrap();

        assert_eq!(fields.get("name").unwrap().comment.lines(), ["user name"]);
        assert_eq!(fields.get("age").unwrap().comment.lines(), ["in years"]);
    }

    #[test]
    fn duplicate_field_rejected() {
        let err = block("p:\n  id: string\n  id: int\n", "p").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Redefined);
        assert_eq!(err.query, "q");
        assert_eq!(err.position, Position::new(3, 3));
        assert!(err.message.contains("\"id\""));
    }

    #[test]
    fn empty_type_rejected() {
        let err = block("p:\n  id:\n", "p").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Missing);
        assert!(err.message.contains("type not defined"));
    }

    #[test]
    fn non_mapping_rejected() {
        let err = block("p: string\n", "p").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
        assert!(err.message.contains("have scalar"));
    }

    #[test]
    fn nested_type_rejected() {
        let err = block("p:\n  id:\n    inner: x\n", "p").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
    }

    #[test]
    fn anchor_and_alias_are_recorded() {
        let source = "a: &User\n  id: string\n  name: string\nb: *User\n";

        let defined = block(source, "a").unwrap();
        assert_eq!(defined.anchor.as_deref(), Some("User"));
        assert_eq!(defined.alias, None);

        let copied = block(source, "b").unwrap();
        assert_eq!(copied.alias.as_deref(), Some("User"));
        assert_eq!(copied.anchor, None);
        assert_eq!(copied.as_slice(), defined.as_slice());
        assert_eq!(copied.shared_name(), Some("User"));
    }

    #[test]
    fn pointer_marker() {
        let fields = block("p:\n  a: \"*string\"\n  b: string\n", "p").unwrap();
        assert!(fields.get("a").unwrap().is_pointer());
        assert!(!fields.get("b").unwrap().is_pointer());
    }
}
