//! Identifier naming
//!
//! Maps free-form names from query documents to valid Go identifiers.
//! Mapping is total and idempotent: any input yields an identifier, and
//! mapping an output again returns it unchanged.

/// Go keywords, never usable as identifiers
const KEYWORDS: [&str; 25] = [
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough", "for", "func",
    "go", "goto", "if", "import", "interface", "map", "package", "range", "return", "select", "struct",
    "switch", "type", "var",
];

/// Local names used inside generated accessors
const RESERVED_LOCALS: [&str; 10] = ["ctx", "f", "q", "row", "rows", "err", "result", "out", "args", "Queries"];

/// Package-level names declared by the library scaffold
const RESERVED_EXPORTS: [&str; 5] = ["Queries", "New", "DBTX", "ErrNoRows", "WithTx"];

/// Target-language naming rules used by an emitter
pub trait Naming: Send + Sync {
    /// Exported (public) type, field or function name
    fn exported(&self, name: &str) -> String;

    /// Function parameter name
    fn param(&self, name: &str) -> String;
}

/// Go naming rules
#[derive(Debug, Clone, Copy, Default)]
pub struct GoNaming;

impl Naming for GoNaming {
    fn exported(&self, name: &str) -> String {
        let mut ident = identifier(name, true);
        if RESERVED_EXPORTS.contains(&ident.as_str()) {
            ident.push('_');
        }
        ident
    }

    fn param(&self, name: &str) -> String {
        let mut ident = identifier(name, false);
        if RESERVED_LOCALS.contains(&ident.as_str()) {
            ident.push('_');
        }
        ident
    }
}

/// Convert a name to a Go identifier
///
/// Characters other than letters and digits are dropped and the character
/// after them is upper-cased, so `user_id` becomes `userID` (`UserID` when
/// `exported`). A name not starting with a letter or underscore gets a `_`
/// prefix; a trailing `Id` is written `ID`.
pub fn identifier(name: &str, exported: bool) -> String {
    let mut ident = String::with_capacity(name.len() + 1);
    let mut capitalize_next = exported;

    for (i, ch) in name.chars().enumerate() {
        if i == 0 {
            if ch == '_' {
                ident.push(ch);
                continue;
            }

            if ch.is_alphabetic() {
                push_char(&mut ident, ch, capitalize_next);
                capitalize_next = false;
                continue;
            }

            ident.push('_');
            if !ch.is_alphanumeric() {
                continue;
            }
        }

        if !ch.is_alphanumeric() {
            capitalize_next = true;
            continue;
        }

        push_char(&mut ident, ch, capitalize_next);
        capitalize_next = false;
    }

    if ident.is_empty() {
        ident.push('_');
    }

    if let Some(stem) = ident.strip_suffix("Id") {
        ident = format!("{}ID", stem);
    }

    if !exported && KEYWORDS.contains(&ident.as_str()) {
        ident.insert(0, '_');
    }

    ident
}

fn push_char(ident: &mut String, ch: char, upper: bool) {
    if upper {
        ident.extend(ch.to_uppercase());
    } else {
        ident.push(ch);
    }
}
