//! Documentation comments
//!
//! Comments written in a query document become documentation of the
//! generated code. The YAML parser drops comments, so they are recovered from
//! the source lines around each node.

use crate::document::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Comment lines with the `#` marker removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Comment(Vec<String>);

impl Comment {
    pub fn new(lines: Vec<String>) -> Self {
        Self(lines)
    }

    /// Normalize raw comment text: one entry per line, leading `#` and the
    /// whitespace after it stripped
    pub fn parse(raw: &str) -> Self {
        let lines = raw
            .lines()
            .map(|line| match line.strip_prefix('#') {
                Some(rest) => rest.trim().to_string(),
                None => line.to_string(),
            })
            .collect();

        Self(lines)
    }

    /// First non-empty comment among `nodes`, checked in order
    ///
    /// A comment above a node is preferred over one trailing it.
    pub fn from_nodes(nodes: &[&Node]) -> Self {
        for node in nodes {
            let raw = if node.head_comment.is_empty() {
                &node.line_comment
            } else {
                &node.head_comment
            };

            if !raw.is_empty() {
                return Self::parse(raw);
            }
        }

        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn first_line(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_multiline(&self) -> bool {
        self.0.len() > 1
    }

    /// Every line prefixed with `prefix`, joined by newlines
    ///
    /// Returns an empty string for an empty comment.
    pub fn format(&self, prefix: &str) -> String {
        if self.0.is_empty() {
            return String::new();
        }

        format!("{}{}", prefix, self.0.join(&format!("\n{}", prefix)))
    }
}

/// Source lines a document was parsed from, used to find comments
pub(crate) struct CommentSource<'a> {
    lines: Vec<&'a str>,
    /// 1-indexed lines inside multi-line scalars
    opaque: HashSet<usize>,
}

impl<'a> CommentSource<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
            opaque: HashSet::new(),
        }
    }

    /// Mark lines as scalar content so `#` lines inside them are not comments
    pub(crate) fn mark_opaque(&mut self, lines: impl IntoIterator<Item = usize>) {
        self.opaque.extend(lines);
    }

    fn line(&self, line: usize) -> Option<&'a str> {
        if line == 0 || self.opaque.contains(&line) {
            return None;
        }
        self.lines.get(line - 1).copied()
    }

    /// Contiguous `#` lines directly above a node that starts its line
    pub(crate) fn head(&self, line: usize, column: usize) -> String {
        let Some(text) = self.line(line) else {
            return String::new();
        };

        let starts_line = text.chars().take(column.saturating_sub(1)).all(char::is_whitespace);
        if !starts_line {
            return String::new();
        }

        let mut block = Vec::new();
        let mut current = line;
        while current > 1 {
            current -= 1;
            match self.line(current).map(str::trim) {
                Some(above) if above.starts_with('#') => block.push(above),
                _ => break,
            }
        }

        block.reverse();
        block.join("\n")
    }

    /// `#` comment trailing a node on its own line
    pub(crate) fn trailing(&self, line: usize, column: usize) -> String {
        let Some(text) = self.line(line) else {
            return String::new();
        };

        let mut quote = None;
        let mut previous = ' ';
        for (offset, ch) in text.char_indices().skip(column.saturating_sub(1)) {
            match quote {
                Some(open) if ch == open => quote = None,
                Some(_) => {}
                None if (ch == '"' || ch == '\'') && opens_quote(previous) => quote = Some(ch),
                None if ch == '#' && previous.is_whitespace() => {
                    return text[offset..].trim_end().to_string();
                }
                None => {}
            }
            previous = ch;
        }

        String::new()
    }
}

/// Quotes only start a scalar at a token boundary (`it's` stays plain)
fn opens_quote(previous: char) -> bool {
    previous.is_whitespace() || matches!(previous, '[' | '{' | ',' | ':')
}
