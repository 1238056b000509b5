//! Generator front end
//!
//! Ties import resolution, emission and formatting together for one target
//! package.

use crate::emitter::{EmitError, Emitter, GoEmitter, Metadata};
use crate::format::{Gofmt, SourceFormatter};
use crate::imports::ImportTable;
use crate::naming::{identifier, GoNaming};
use sqlgen_core::Queries;
use std::sync::Arc;

/// Package name used when none can be derived
pub const DEFAULT_PACKAGE: &str = "database";

/// Generates the files of one Go package
pub struct Generator {
    imports: ImportTable,
    emitter: GoEmitter,
    formatter: Box<dyn SourceFormatter>,
}

impl Generator {
    /// Generator for the package `name` (a name, directory or import path)
    ///
    /// `imports` extends the default import table, each entry written
    /// `prefix:path` or as a bare `path`.
    pub fn new<I, S>(name: &str, imports: I) -> Result<Self, EmitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let metadata = Metadata::new(package_name(name));
        tracing::debug!(package = %metadata.package, "creating generator");

        Ok(Self {
            imports: ImportTable::new(imports),
            emitter: GoEmitter::new(metadata, Arc::new(GoNaming))?,
            formatter: Box::new(Gofmt::default()),
        })
    }

    /// Replace the source formatter
    pub fn with_formatter(mut self, formatter: impl SourceFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn package(&self) -> &str {
        &self.emitter.metadata().package
    }

    pub fn imports(&self) -> &ImportTable {
        &self.imports
    }

    /// Formatted accessors for the queries of the document `source`
    pub fn queries(&self, source: &str, queries: &Queries) -> Result<String, EmitError> {
        let imports = self.imports.resolve(queries.as_slice())?;
        let raw = self.emitter.render_queries(source, &imports, queries.as_slice())?;
        self.format(raw)
    }

    /// Formatted library scaffold
    pub fn library(&self) -> Result<String, EmitError> {
        let raw = self.emitter.render_library()?;
        self.format(raw)
    }

    fn format(&self, raw: String) -> Result<String, EmitError> {
        match self.formatter.format(&raw) {
            Ok(formatted) => Ok(formatted),
            Err(source) => Err(EmitError::Format { raw, source }),
        }
    }
}

/// Go package name for a requested name
///
/// Uses the last path segment, mapped to a lower-case identifier.
pub fn package_name(requested: &str) -> String {
    let normalized = requested.replace('\\', "/");
    let last = normalized
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    if matches!(last, "" | "." | "..") {
        return DEFAULT_PACKAGE.to_string();
    }

    let name = identifier(last, false).to_lowercase();
    if name.trim_start_matches('_').is_empty() {
        return DEFAULT_PACKAGE.to_string();
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FormatError, Verbatim};
    use pretty_assertions::assert_eq;
    use sqlgen_core::parse_str;

    struct Refuse;

    impl SourceFormatter for Refuse {
        fn format(&self, _source: &str) -> Result<String, FormatError> {
            Err(FormatError::Rejected("1:1: expected 'package'".to_string()))
        }
    }

    #[test]
    fn package_names() {
        assert_eq!(package_name("store"), "store");
        assert_eq!(package_name("github.com/acme/store/db/"), "db");
        assert_eq!(package_name("gen\\Store-DB"), "storedb");
        assert_eq!(package_name(""), "database");
        assert_eq!(package_name("."), "database");
        assert_eq!(package_name("/"), "database");
        assert_eq!(package_name("--"), "database");
        assert_eq!(package_name("type"), "_type");
    }

    #[test]
    fn format_failure_keeps_raw_text() {
        let generator = Generator::new("db", Vec::<String>::new()).unwrap().with_formatter(Refuse);
        let err = generator.library().unwrap_err();

        match err {
            EmitError::Format { raw, source } => {
                assert!(raw.contains("package db"));
                assert!(matches!(source, FormatError::Rejected(_)));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn unresolved_prefix_is_reported() {
        let queries = parse_str("get:\n  type: one\n  sql: select 1\n  out:\n    id: uuid.UUID\n").unwrap();
        let generator = Generator::new("db", Vec::<String>::new()).unwrap().with_formatter(Verbatim);

        match generator.queries("get.yaml", &queries).unwrap_err() {
            EmitError::Resolve(err) => assert_eq!(err.query, "get"),
            other => panic!("unexpected error: {}", other),
        }
    }
}
