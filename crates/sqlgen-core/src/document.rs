//! Positioned YAML node tree
//!
//! Adapts the `yaml-rust2` event stream into an explicit tree of scalar,
//! mapping, sequence and alias nodes. Each node knows its position, the
//! anchor it defines and the comments written around it. An alias node owns
//! a copy of the node it refers to.

use crate::comment::CommentSource;
use crate::error::{ErrorKind, SchemaError};
use crate::position::Position;
use std::collections::HashMap;
use std::iter::Peekable;
use std::ops::RangeInclusive;
use std::vec::IntoIter;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, Scanner, TScalarStyle, Token, TokenType};

/// How a scalar was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    Quoted,
    /// Literal (`|`) or folded (`>`) block
    Block,
}

/// Node variants
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar { value: String, style: ScalarStyle },
    Mapping(Vec<(Node, Node)>),
    Sequence(Vec<Node>),
    /// Reference to an anchored node, holding a copy of it
    Alias(Box<Node>),
}

/// A node of the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Position,
    /// Anchor defined on this node (`&name`)
    pub anchor: Option<String>,
    /// Raw `#` lines directly above the node
    pub head_comment: String,
    /// Raw `#` comment trailing the node on its line
    pub line_comment: String,
}

impl Node {
    /// Human-readable kind, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Scalar { .. } => "scalar",
            NodeKind::Mapping(_) => "mapping",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Alias(_) => "alias",
        }
    }

    /// Scalar text; empty for null scalars and non-scalar nodes
    pub fn text(&self) -> &str {
        match &self.kind {
            NodeKind::Scalar { value, style: ScalarStyle::Plain }
                if matches!(value.as_str(), "~" | "null" | "Null" | "NULL") =>
            {
                ""
            }
            NodeKind::Scalar { value, .. } => value,
            _ => "",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, NodeKind::Scalar { .. })
    }

    /// The node itself, or the node an alias refers to
    pub fn resolve(&self) -> &Node {
        match &self.kind {
            NodeKind::Alias(target) => target.resolve(),
            _ => self,
        }
    }

    /// Anchor name of the node an alias refers to
    pub fn alias_of(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Alias(target) => target.anchor.as_deref(),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(Node, Node)]> {
        match &self.kind {
            NodeKind::Mapping(pairs) => Some(pairs),
            _ => None,
        }
    }
}

/// Parse the first document of `source` into a node tree
///
/// Returns `None` for a document without content.
pub fn parse_document(source: &str) -> Result<Option<Node>, SchemaError> {
    let mut sink = EventSink::default();
    let mut parser = Parser::new(source.chars());
    parser.load(&mut sink, false).map_err(|e| {
        let at = position(e.marker());
        SchemaError::new(ErrorKind::Structural, at, "invalid document").with_cause(e)
    })?;

    let mut comments = CommentSource::new(source);
    comments.mark_opaque(scalar_content_lines(source, &sink.events));

    let mut builder = TreeBuilder {
        events: sink.events.into_iter().peekable(),
        anchors: anchor_names(source),
        defined: HashMap::new(),
        comments,
    };

    builder.document()
}

#[derive(Default)]
struct EventSink {
    events: Vec<(Event, Marker)>,
}

impl MarkedEventReceiver for EventSink {
    fn on_event(&mut self, event: Event, mark: Marker) {
        self.events.push((event, mark));
    }
}

fn position(mark: &Marker) -> Position {
    Position::new(mark.line(), mark.col() + 1)
}

/// Anchor names in definition order
///
/// The parser numbers anchors from 1 in the order it meets them; events only
/// carry that number, so the names come from the token stream.
fn anchor_names(source: &str) -> Vec<String> {
    Scanner::new(source.chars())
        .filter_map(|Token(_, token)| match token {
            TokenType::Anchor(name) => Some(name),
            _ => None,
        })
        .collect()
}

/// Lines inside multi-line scalars, where `#` does not start a comment
fn scalar_content_lines(source: &str, events: &[(Event, Marker)]) -> Vec<usize> {
    let lines: Vec<&str> = source.lines().collect();

    events
        .iter()
        .filter_map(|(event, mark)| match event {
            Event::Scalar(value, TScalarStyle::Literal | TScalarStyle::Folded, _, _) => {
                Some(block_extent(&lines, mark, value))
            }
            Event::Scalar(_, TScalarStyle::SingleQuoted, _, _) => Some(quoted_extent(&lines, mark, true)),
            Event::Scalar(_, TScalarStyle::DoubleQuoted, _, _) => Some(quoted_extent(&lines, mark, false)),
            _ => None,
        })
        .flatten()
        .collect()
}

/// Content lines of a block scalar
///
/// The marker sits on the first content line, at the content indentation;
/// the block runs until the first non-blank line indented less.
fn block_extent(lines: &[&str], mark: &Marker, value: &str) -> RangeInclusive<usize> {
    let first = mark.line();
    if value.trim().is_empty() {
        return RangeInclusive::new(first + 1, first);
    }

    let indent = mark.col();
    let last = lines
        .iter()
        .enumerate()
        .skip(first)
        .take_while(|(_, text)| text.trim().is_empty() || indentation(text) >= indent)
        .last()
        .map_or(first, |(index, _)| index + 1);

    first..=last
}

/// Continuation lines of a quoted scalar
///
/// The marker sits on the opening quote; the line holding it stays visible.
fn quoted_extent(lines: &[&str], mark: &Marker, single: bool) -> RangeInclusive<usize> {
    let first = mark.line();
    let quote = if single { '\'' } else { '"' };

    for (index, text) in lines.iter().enumerate().skip(first.saturating_sub(1)) {
        let skip = if index + 1 == first { mark.col() + 1 } else { 0 };
        let mut chars = text.chars().skip(skip).peekable();
        let mut escaped = false;

        while let Some(ch) = chars.next() {
            if escaped {
                escaped = false;
            } else if ch == '\\' && !single {
                escaped = true;
            } else if ch == quote {
                if single && chars.peek() == Some(&'\'') {
                    chars.next();
                } else {
                    return (first + 1)..=(index + 1);
                }
            }
        }
    }

    (first + 1)..=lines.len()
}

fn indentation(text: &str) -> usize {
    text.len() - text.trim_start_matches(' ').len()
}

struct TreeBuilder<'a> {
    events: Peekable<IntoIter<(Event, Marker)>>,
    anchors: Vec<String>,
    defined: HashMap<usize, Node>,
    comments: CommentSource<'a>,
}

impl TreeBuilder<'_> {
    fn document(&mut self) -> Result<Option<Node>, SchemaError> {
        while let Some((event, mark)) = self.events.next() {
            match event {
                Event::StreamEnd | Event::DocumentEnd => return Ok(None),
                Event::Alias(_)
                | Event::Scalar(..)
                | Event::SequenceStart(..)
                | Event::MappingStart(..) => return self.node(event, &mark).map(Some),
                _ => {}
            }
        }

        Ok(None)
    }

    fn next_node(&mut self, at: Position) -> Result<Node, SchemaError> {
        match self.events.next() {
            Some((event, mark)) => self.node(event, &mark),
            None => Err(SchemaError::new(ErrorKind::Structural, at, "unexpected end of document")),
        }
    }

    fn node(&mut self, event: Event, mark: &Marker) -> Result<Node, SchemaError> {
        let position = position(mark);

        let (kind, anchor_id) = match event {
            Event::Scalar(value, style, anchor_id, _) => {
                let style = match style {
                    TScalarStyle::Plain => ScalarStyle::Plain,
                    TScalarStyle::SingleQuoted | TScalarStyle::DoubleQuoted => ScalarStyle::Quoted,
                    _ => ScalarStyle::Block,
                };
                (NodeKind::Scalar { value, style }, anchor_id)
            }

            Event::SequenceStart(anchor_id, _) => {
                let mut items = Vec::new();
                while !matches!(self.events.peek(), Some((Event::SequenceEnd, _)) | None) {
                    items.push(self.next_node(position)?);
                }
                self.events.next();
                (NodeKind::Sequence(items), anchor_id)
            }

            Event::MappingStart(anchor_id, _) => {
                let mut pairs = Vec::new();
                while !matches!(self.events.peek(), Some((Event::MappingEnd, _)) | None) {
                    let key = self.next_node(position)?;
                    let value = self.next_node(key.position)?;
                    pairs.push((key, value));
                }
                self.events.next();
                (NodeKind::Mapping(pairs), anchor_id)
            }

            Event::Alias(anchor_id) => {
                let target = self.defined.get(&anchor_id).cloned().ok_or_else(|| {
                    SchemaError::new(ErrorKind::Structural, position, "alias to an unknown anchor")
                })?;
                (NodeKind::Alias(Box::new(target)), 0)
            }

            other => {
                return Err(SchemaError::new(
                    ErrorKind::Structural,
                    position,
                    format!("unexpected {:?} event", other),
                ))
            }
        };

        // Comments belong to scalars and aliases; a block collection starts
        // at its first key, whose comments are not the collection's.
        let (head_comment, line_comment) = match kind {
            NodeKind::Scalar { .. } | NodeKind::Alias(_) => (
                self.comments.head(position.line, position.column),
                self.comments.trailing(position.line, position.column),
            ),
            _ => (String::new(), String::new()),
        };

        let node = Node {
            kind,
            position,
            anchor: self.anchor_name(anchor_id),
            head_comment,
            line_comment,
        };

        if anchor_id > 0 {
            self.defined.insert(anchor_id, node.clone());
        }

        Ok(node)
    }

    fn anchor_name(&self, anchor_id: usize) -> Option<String> {
        anchor_id
            .checked_sub(1)
            .and_then(|index| self.anchors.get(index))
            .cloned()
    }
}
