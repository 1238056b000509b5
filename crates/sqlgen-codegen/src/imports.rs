//! Package imports
//!
//! Field types may be qualified with a package prefix (`uuid.UUID`,
//! `sql.NullString`). The import table maps prefixes to import paths; resolving
//! a file's queries against it yields the imports the generated file needs.

use regex::Regex;
use serde::Serialize;
use sqlgen_core::{ErrorKind, Field, Query, SchemaError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Prefixes known without configuration
const DEFAULT_IMPORTS: [(&str, &str); 3] = [("sql", "database/sql"), ("time", "time"), ("json", "encoding/json")];

fn qualifier() -> &'static Regex {
    static QUALIFIER: OnceLock<Regex> = OnceLock::new();
    QUALIFIER.get_or_init(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\.").expect("valid qualifier pattern"))
}

/// Package prefixes available to field types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTable {
    prefixes: BTreeMap<String, String>,
}

impl Default for ImportTable {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_IMPORTS
                .iter()
                .map(|(prefix, path)| (prefix.to_string(), path.to_string()))
                .collect(),
        }
    }
}

impl ImportTable {
    /// Default table extended with `entries`
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for entry in entries {
            table.register(entry.as_ref());
        }
        table
    }

    /// Add an import, written `prefix:path` or as a bare `path`
    ///
    /// A bare path is known by its last segment, skipping a major version
    /// segment (`github.com/jackc/pgx/v5` is `pgx`). Empty entries are
    /// ignored; a later entry for the same prefix replaces the earlier one.
    pub fn register(&mut self, entry: &str) {
        let entry = entry.trim();
        if entry.is_empty() {
            return;
        }

        let (prefix, path) = match entry.split_once(':') {
            Some((prefix, path)) if !prefix.is_empty() => (prefix.to_string(), path.to_string()),
            _ => (default_prefix(entry), entry.to_string()),
        };

        tracing::debug!(%prefix, %path, "registered import");
        self.prefixes.insert(prefix, path);
    }

    /// Import path registered for `prefix`
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// Imports used by the param and out types of `queries`
    ///
    /// Fails on the first prefix that is not registered.
    pub fn resolve(&self, queries: &[Query]) -> Result<ImportSet, SchemaError> {
        let mut set = ImportSet::default();

        for query in queries {
            for field in query.params.iter().chain(query.out.iter()) {
                self.resolve_field(query, field, &mut set)?;
            }
        }

        Ok(set)
    }

    fn resolve_field(&self, query: &Query, field: &Field, set: &mut ImportSet) -> Result<(), SchemaError> {
        for captures in qualifier().captures_iter(&field.type_name) {
            let prefix = &captures[1];
            let path = self.get(prefix).ok_or_else(|| {
                SchemaError::new(
                    ErrorKind::UnresolvedPrefix,
                    field.position,
                    format!("unknown package prefix {:?} in field {:?}", prefix, field.name),
                )
                .in_query(&query.name)
            })?;

            set.insert(prefix, path);
        }

        Ok(())
    }
}

/// Package name of a bare import path
fn default_prefix(path: &str) -> String {
    let mut segments = path.trim_end_matches('/').rsplit('/');
    let mut last = segments.next().unwrap_or_default();
    if is_major_version(last) {
        last = segments.next().unwrap_or(last);
    }

    // gopkg.in/yaml.v3 is package yaml
    last.split('.').next().unwrap_or(last).to_string()
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// An import of a generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub path: String,
    /// Name to import under; empty when the path's last segment already names
    /// the package
    pub prefix: String,
}

/// Imports needed by one generated file, ordered by path
///
/// A path used under two prefixes is imported once per prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    imports: BTreeSet<(String, String)>,
}

impl ImportSet {
    fn insert(&mut self, prefix: &str, path: &str) {
        let implied = path.rsplit('/').next() == Some(prefix);
        let prefix = if implied { String::new() } else { prefix.to_string() };
        self.imports.insert((path.to_string(), prefix));
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.imports.iter().any(|(imported, _)| imported == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = Import> + '_ {
        self.imports.iter().map(|(path, prefix)| Import {
            path: path.clone(),
            prefix: prefix.clone(),
        })
    }

    pub fn to_vec(&self) -> Vec<Import> {
        self.iter().collect()
    }
}
