//! Template views of the query model
//!
//! Views carry target-language names, so templates only arrange text.

use crate::naming::Naming;
use serde::Serialize;
use sqlgen_core::{Fields, Query, QueryType};
use std::collections::HashSet;

/// Params blocks with more fields than this are passed as one struct
pub const MAX_INLINE_PARAMS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    /// Exported struct field name
    pub name: String,
    /// Parameter name
    pub param: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub comment: Vec<String>,
}

/// A struct type: query result row or parameter bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeView {
    pub type_name: String,
    /// Whether this query declares the type (shared types are declared once)
    pub declare: bool,
    pub comment: Vec<String>,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryView {
    pub name: String,
    /// Accessor method name
    pub func: String,
    pub kind: QueryType,
    pub comment: Vec<String>,
    /// Short label identifying the query in SQL logs
    pub label: String,
    /// SQL text prefixed with the label comment
    pub sql: String,
    /// Inline parameters
    pub params: Vec<FieldView>,
    /// Parameter bundle, replacing inline parameters
    pub bundle: Option<ShapeView>,
    /// Arguments passed with the SQL, in placeholder order
    pub args: Vec<String>,
    pub out: Option<ShapeView>,
}

/// Builds the views of one generated file
pub struct ViewBuilder<'a> {
    naming: &'a dyn Naming,
    declared: HashSet<String>,
}

impl<'a> ViewBuilder<'a> {
    pub fn new(naming: &'a dyn Naming) -> Self {
        Self {
            naming,
            declared: HashSet::new(),
        }
    }

    pub fn query(&mut self, query: &Query) -> QueryView {
        let label = query
            .comment
            .first_line()
            .filter(|line| !line.trim().is_empty())
            .unwrap_or(query.name.as_str())
            .to_string();

        let out = (!query.out.is_empty()).then(|| self.shape(&query.out, &query.name, "row"));

        let bundled = query.params.shared_name().is_some() || query.params.len() > MAX_INLINE_PARAMS;
        let (params, bundle, args) = if bundled {
            let shape = self.shape(&query.params, &query.name, "params");
            let args = shape.fields.iter().map(|f| format!("args.{}", f.name)).collect();
            (Vec::new(), Some(shape), args)
        } else {
            let params = self.fields(&query.params);
            let args = params.iter().map(|f| f.param.clone()).collect();
            (params, None, args)
        };

        QueryView {
            name: query.name.clone(),
            func: self.naming.exported(&query.name),
            kind: query.kind,
            comment: query.comment.lines().to_vec(),
            sql: format!("-- {}\n{}", label, query.sql.as_str().trim_end()),
            label,
            params,
            bundle,
            args,
            out,
        }
    }

    /// Struct named after the block's anchor or alias, else `<query>_<suffix>`
    fn shape(&mut self, fields: &Fields, query: &str, suffix: &str) -> ShapeView {
        let type_name = match fields.shared_name() {
            Some(shared) => self.naming.exported(shared),
            None => self.naming.exported(&format!("{}_{}", query, suffix)),
        };

        ShapeView {
            declare: self.declared.insert(type_name.clone()),
            type_name,
            comment: fields.comment.lines().to_vec(),
            fields: self.fields(fields),
        }
    }

    /// Field views; names mapping to an identifier already taken get a
    /// numeric suffix
    fn fields(&self, fields: &Fields) -> Vec<FieldView> {
        let mut names = HashSet::new();
        let mut params = HashSet::new();

        fields
            .iter()
            .map(|field| FieldView {
                name: unique(self.naming.exported(&field.name), &mut names),
                param: unique(self.naming.param(&field.name), &mut params),
                type_name: field.type_name.clone(),
                comment: field.comment.lines().to_vec(),
            })
            .collect()
    }
}

fn unique(name: String, taken: &mut HashSet<String>) -> String {
    let mut candidate = name.clone();
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{}{}", name, n);
        n += 1;
    }

    taken.insert(candidate.clone());
    candidate
}
