//! Query text

use crate::document::Node;
use crate::error::{ErrorKind, SchemaError};
use crate::position::Position;
use serde::{Deserialize, Serialize};

/// SQL text of a query, kept exactly as written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sql {
    pub text: String,
    #[serde(skip)]
    pub position: Position,
}

/// YAML scalar style used when writing SQL back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlStyle {
    /// `|` block, used for text with line breaks or tabs
    Literal,
    /// Single-line scalar, quoted when plain text would not read back as is
    Plain,
}

impl Sql {
    pub fn new(text: impl Into<String>, position: Position) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }

    /// Read the SQL scalar, keeping the scalar's own position
    pub fn from_node(node: &Node) -> Result<Self, SchemaError> {
        let node = node.resolve();
        if !node.is_scalar() {
            return Err(SchemaError::new(
                ErrorKind::Structural,
                node.position,
                format!("sql must be a scalar: have {}", node.kind_name()),
            ));
        }

        let sql = Self::new(node.text(), node.position);
        if sql.text.trim().is_empty() {
            return Err(SchemaError::new(ErrorKind::Missing, node.position, "sql not defined"));
        }

        Ok(sql)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> SqlStyle {
        if self.text.contains(['\n', '\r', '\t']) {
            SqlStyle::Literal
        } else {
            SqlStyle::Plain
        }
    }

    /// YAML representation of the text
    ///
    /// Literal blocks start with the `|` header and put every line on its own
    /// line, indented by `indent` spaces (the key's indentation plus two).
    pub fn to_yaml(&self, indent: usize) -> String {
        match self.style() {
            SqlStyle::Plain => crate::writer::scalar(&self.text),
            SqlStyle::Literal => literal_block(&self.text, indent),
        }
    }
}

impl std::fmt::Display for Sql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

fn literal_block(text: &str, indent: usize) -> String {
    let body = text.trim_end_matches('\n');
    let trailing = text.len() - body.len();

    // Content sits two columns deeper than its key; say so explicitly when
    // the first line would otherwise be taken for indentation.
    let mut header = String::from("|");
    if body.starts_with(' ') || body.starts_with('\n') {
        header.push('2');
    }
    header.push(match trailing {
        0 => '-',
        1 => ' ',
        _ => '+',
    });

    let pad = " ".repeat(indent);
    let mut out = header.trim_end().to_string();
    for line in body.split('\n') {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(&pad);
            out.push_str(line);
        }
    }
    for _ in 1..trailing {
        out.push('\n');
    }

    out
}
