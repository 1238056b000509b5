//! Template code emission
//!
//! Renders query accessors and the shared library scaffold from embedded
//! minijinja templates.

use crate::format::FormatError;
use crate::imports::ImportSet;
use crate::naming::Naming;
use crate::view::ViewBuilder;
use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;
use sqlgen_core::{Query, SchemaError};
use std::sync::Arc;

const QUERIES_TEMPLATE: &str = "queries.go";
const LIBRARY_TEMPLATE: &str = "library.go";

/// Error during code emission
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// Queries refer to something the generator cannot provide
    #[error(transparent)]
    Resolve(#[from] SchemaError),

    /// Template failed to render (a generator defect, not a document error)
    #[error("render template: {0}")]
    Template(#[from] minijinja::Error),

    /// Generated code could not be formatted; `raw` holds it unformatted
    #[error("format generated code: {source}")]
    Format { raw: String, source: FormatError },
}

/// Identification of the generator, written into every generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub name: String,
    pub version: String,
    /// Package the generated files belong to
    pub package: String,
}

impl Metadata {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            name: "sqlgen".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            package: package.into(),
        }
    }
}

/// Renders target-language source from the query model
///
/// Output is unformatted.
pub trait Emitter {
    /// Accessors for the queries of one document
    ///
    /// `source` names the document in the generated header.
    fn render_queries(&self, source: &str, imports: &ImportSet, queries: &[Query]) -> Result<String, EmitError>;

    /// Declarations shared by every generated file of a package
    fn render_library(&self) -> Result<String, EmitError>;
}

/// Go `database/sql` emitter
pub struct GoEmitter {
    env: Environment<'static>,
    naming: Arc<dyn Naming>,
    metadata: Metadata,
}

impl GoEmitter {
    pub fn new(metadata: Metadata, naming: Arc<dyn Naming>) -> Result<Self, EmitError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        env.add_filter("rawstr", raw_string);
        env.add_filter("comment", comment_lines);

        env.add_template(QUERIES_TEMPLATE, include_str!("../templates/queries.go.j2"))?;
        env.add_template(LIBRARY_TEMPLATE, include_str!("../templates/library.go.j2"))?;

        Ok(Self { env, naming, metadata })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl Emitter for GoEmitter {
    fn render_queries(&self, source: &str, imports: &ImportSet, queries: &[Query]) -> Result<String, EmitError> {
        let mut builder = ViewBuilder::new(self.naming.as_ref());
        let views: Vec<_> = queries.iter().map(|q| builder.query(q)).collect();

        let template = self.env.get_template(QUERIES_TEMPLATE)?;
        let rendered = template.render(context! {
            generator => &self.metadata,
            source => source,
            imports => imports.to_vec(),
            queries => views,
        })?;

        tracing::debug!(source, queries = queries.len(), "rendered queries");
        Ok(rendered)
    }

    fn render_library(&self) -> Result<String, EmitError> {
        let template = self.env.get_template(LIBRARY_TEMPLATE)?;
        Ok(template.render(context! { generator => &self.metadata })?)
    }
}

/// Body of a Go raw string literal, with backticks spliced in as quoted strings
fn raw_string(value: String) -> String {
    value.replace('`', "`+\"`\"+`")
}

/// Every line with `prefix`, each ending in a newline
fn comment_lines(lines: Vec<String>, prefix: String) -> String {
    let mut out = String::new();
    for line in &lines {
        if line.is_empty() {
            out.push_str(prefix.trim_end());
        } else {
            out.push_str(&prefix);
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}
