//! String-rewriting compiler for indexes that take the user's text almost
//! as-is. It corrects the case of known field names and turns plain text into
//! a name wildcard. Groups, booleans and dates are passed through
//! uninterpreted.

use crate::{CompileError, Compiler};
use kql_syntax::Ast;
use regex::{Captures, Regex};
use std::{fmt, sync::LazyLock};
use tracing::debug;

static FIELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(rootid|path|id|name|size|mtime|mimetype|type|tags?):")
        .expect("field pattern is valid")
});

static LOWERCASE_VALUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(Name|Tags):("[^"]*"|[^\s()]+)"#).expect("value pattern is valid")
});

fn canonical_field(name: &str) -> &'static str {
    match name.to_ascii_lowercase().as_str() {
        "rootid" => "RootID",
        "path" => "Path",
        "id" => "ID",
        "name" => "Name",
        "size" => "Size",
        "mtime" => "Mtime",
        "mimetype" => "MimeType",
        "type" => "Type",
        // tag, tags
        _ => "Tags",
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyCompiler;

impl LegacyCompiler {
    pub fn rewrite(&self, query: &str) -> String {
        let query = query.trim();
        let fields = FIELD_PATTERN.replace_all(query, |caps: &Captures<'_>| {
            format!("{}:", canonical_field(&caps[1]))
        });
        if !fields.contains(':') {
            return format!("Name:*{}*", query.to_lowercase().replace(' ', r"\ "));
        }
        LOWERCASE_VALUE_PATTERN
            .replace_all(&fields, |caps: &Captures<'_>| {
                format!("{}:{}", &caps[1], caps[2].to_lowercase())
            })
            .into_owned()
    }
}

impl Compiler for LegacyCompiler {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn compile_to(&self, ast: &Ast, out: &mut dyn fmt::Write) -> Result<(), CompileError> {
        if ast.is_empty() {
            return Err(CompileError::EmptyQuery);
        }
        let source = ast.source().ok_or(CompileError::MissingSource)?;
        if source.trim().is_empty() {
            return Err(CompileError::EmptyQuery);
        }
        let rewritten = self.rewrite(source);
        debug!(query = %rewritten, "rewrote query");
        out.write_str(&rewritten)?;
        Ok(())
    }
}
