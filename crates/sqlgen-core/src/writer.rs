//! Canonical query documents
//!
//! Writes a query model back as YAML that parses to the same model: names,
//! types, SQL text, comments and shared blocks survive the round trip.

use crate::comment::Comment;
use crate::fields::Fields;
use crate::queries::Queries;
use crate::query::Query;
use std::fmt::Write;

const INDENT: &str = "  ";

impl Queries {
    /// Canonical YAML document for the queries, one block per query
    pub fn to_yaml(&self) -> String {
        let mut out = String::new();
        for (i, query) in self.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            write_query(&mut out, query);
        }
        out
    }
}

fn write_query(out: &mut String, query: &Query) {
    write_comment(out, "", &query.comment);
    let _ = writeln!(out, "{}:", scalar(&query.name));
    let _ = writeln!(out, "{}type: {}", INDENT, query.kind);
    let _ = writeln!(out, "{}sql: {}", INDENT, query.sql.to_yaml(INDENT.len() * 2));

    write_fields(out, "params", &query.params);
    write_fields(out, "out", &query.out);
}

fn write_fields(out: &mut String, key: &str, fields: &Fields) {
    if fields.is_empty() {
        return;
    }

    write_comment(out, INDENT, &fields.comment);
    if let Some(alias) = &fields.alias {
        let _ = writeln!(out, "{}{}: *{}", INDENT, key, alias);
        return;
    }

    match &fields.anchor {
        Some(anchor) => {
            let _ = writeln!(out, "{}{}: &{}", INDENT, key, anchor);
        }
        None => {
            let _ = writeln!(out, "{}{}:", INDENT, key);
        }
    }

    let indent = INDENT.repeat(2);
    for field in fields {
        write_comment(out, &indent, &field.comment);
        let _ = writeln!(out, "{}{}: {}", indent, scalar(&field.name), scalar(&field.type_name));
    }
}

fn write_comment(out: &mut String, indent: &str, comment: &Comment) {
    for line in comment.lines() {
        if line.is_empty() {
            let _ = writeln!(out, "{}#", indent);
        } else {
            let _ = writeln!(out, "{}# {}", indent, line);
        }
    }
}

/// Single-line YAML scalar for `text`
///
/// Text is written plain when it reads back unchanged, otherwise it is
/// double-quoted.
pub fn scalar(text: &str) -> String {
    if is_plain_safe(text) {
        text.to_string()
    } else {
        double_quoted(text)
    }
}

fn is_plain_safe(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };

    if matches!(text, "~" | "null" | "Null" | "NULL") {
        return false;
    }

    if "-?:,[]{}#&*!|>'\"%@`".contains(first) || first.is_whitespace() {
        return false;
    }

    if text.ends_with(char::is_whitespace) || text.ends_with(':') {
        return false;
    }

    if text.contains(": ") || text.contains(" #") {
        return false;
    }

    !text.chars().any(char::is_control)
}

fn double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_str;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_when_safe() {
        assert_eq!(scalar("select * from users where id = ?"), "select * from users where id = ?");
        assert_eq!(scalar("uuid.UUID"), "uuid.UUID");
        assert_eq!(scalar("42"), "42");
    }

    #[test]
    fn quoted_when_ambiguous() {
        assert_eq!(scalar(""), "\"\"");
        assert_eq!(scalar("*string"), "\"*string\"");
        assert_eq!(scalar("null"), "\"null\"");
        assert_eq!(scalar("a: b"), "\"a: b\"");
        assert_eq!(scalar("x #y"), "\"x #y\"");
        assert_eq!(scalar(" padded"), "\" padded\"");
        assert_eq!(scalar("say \"hi\""), "say \"hi\"");
        assert_eq!(scalar("-- note"), "\"-- note\"");
    }

    #[test]
    fn canonical_layout() {
        let source = "\
# find a user
get_user:
  type: one
  sql: select id, name from users where id = ?
  params:
    id: string
  # user row
  out: &User
    id: string
    # display name
    name: string
list_users:
  sql: |
    select id, name
    from users
  out: *User
";
        let expected = "\
# find a user
get_user:
  type: one
  sql: select id, name from users where id = ?
  params:
    id: string
  # user row
  out: &User
    id: string
    # display name
    name: string

list_users:
  type: many
  sql: |
    select id, name
    from users
  out: *User
";
        assert_eq!(parse_str(source).unwrap().to_yaml(), expected);
    }

    #[test]
    fn written_document_reads_back() {
        let source = "\
# purge old sessions
#
# returns the count
purge:
  type: affected
  sql: \"delete from sessions where note = 'a: b'\"
  params: &Window
    # lower bound
    since: time.Time
    until: \"*time.Time\"
again:
  type: exec
  sql: \"tab\\there\"
  params: *Window
";
        let queries = parse_str(source).unwrap();
        let written = queries.to_yaml();
        let reread = parse_str(&written).unwrap();

        assert_eq!(reread.len(), queries.len());
        for (a, b) in queries.iter().zip(reread.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.comment, b.comment);
            assert_eq!(a.sql.text, b.sql.text);
            assert_eq!(a.params.as_slice().len(), b.params.as_slice().len());
            assert_eq!(a.params.anchor, b.params.anchor);
            assert_eq!(a.params.alias, b.params.alias);
            for (x, y) in a.params.iter().zip(b.params.iter()) {
                assert_eq!(x.name, y.name);
                assert_eq!(x.type_name, y.type_name);
                assert_eq!(x.comment, y.comment);
            }
        }
    }

    #[test]
    fn comments_after_multiline_sql_survive() {
        let source = "\
get_user:
  type: one
  sql: \"select id\\nfrom users\\nwhere id = ?\"
  # lookup key
  params:
    id: string
  # user row
  out:
    id: string
";
        let queries = parse_str(source).unwrap();
        let before = queries.get("get_user").unwrap();
        assert_eq!(before.params.comment, Comment::new(vec!["lookup key".into()]));

        let written = queries.to_yaml();
        assert!(written.contains("    where id = ?\n  # lookup key\n  params:\n"));

        let reread = parse_str(&written).unwrap();
        let after = reread.get("get_user").unwrap();
        assert_eq!(after.sql.text, before.sql.text);
        assert_eq!(after.params.comment, before.params.comment);
        assert_eq!(after.out.comment, Comment::new(vec!["user row".into()]));
    }

    #[test]
    fn empty_queries_write_nothing() {
        assert_eq!(Queries::default().to_yaml(), "");
    }
}
