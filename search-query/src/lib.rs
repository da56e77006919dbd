//! Compiles a normalized KQL [`Ast`] into a search back-end's query string.
//!
//! Two strategies are available, picked through [`CompilerConfig`]:
//! - [`BleveCompiler`] lowers the tree structurally (AND/OR precedence,
//!   negation, keyed groups, date ranges).
//! - [`LegacyCompiler`] rewrites the original query text.

mod bleve;
mod fields;
mod legacy;

pub use bleve::{BleveCompiler, BleveQuery, DateRange};
pub use fields::{FieldMapping, escape, media_types};
pub use legacy::LegacyCompiler;

use kql_syntax::Ast;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("query has no searchable terms")]
    EmptyQuery,
    #[error("query text is not available")]
    MissingSource,
    #[error("failed to write the compiled query")]
    Format(#[from] fmt::Error),
}

pub trait Compiler {
    fn name(&self) -> &'static str;

    /// Streams the compiled query into `out`.
    fn compile_to(&self, ast: &Ast, out: &mut dyn fmt::Write) -> Result<(), CompileError>;

    fn compile(&self, ast: &Ast) -> Result<String, CompileError> {
        let mut compiled = String::new();
        self.compile_to(ast, &mut compiled)?;
        Ok(compiled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Bleve,
    Legacy,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Bleve => "bleve",
            Backend::Legacy => "legacy",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bleve" => Ok(Backend::Bleve),
            "legacy" => Ok(Backend::Legacy),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub backend: Backend,
    /// Only used by the bleve back-end.
    pub fields: FieldMapping,
}

impl CompilerConfig {
    pub fn build(&self) -> QueryCompiler {
        match self.backend {
            Backend::Bleve => QueryCompiler::Bleve(BleveCompiler::new(self.fields)),
            Backend::Legacy => QueryCompiler::Legacy(LegacyCompiler),
        }
    }
}

/// The compiler selected by configuration.
#[derive(Debug, Clone, Copy)]
pub enum QueryCompiler {
    Bleve(BleveCompiler),
    Legacy(LegacyCompiler),
}

impl Default for QueryCompiler {
    fn default() -> Self {
        CompilerConfig::default().build()
    }
}

impl Compiler for QueryCompiler {
    fn name(&self) -> &'static str {
        match self {
            QueryCompiler::Bleve(compiler) => compiler.name(),
            QueryCompiler::Legacy(compiler) => compiler.name(),
        }
    }

    fn compile_to(&self, ast: &Ast, out: &mut dyn fmt::Write) -> Result<(), CompileError> {
        match self {
            QueryCompiler::Bleve(compiler) => compiler.compile_to(ast, out),
            QueryCompiler::Legacy(compiler) => compiler.compile_to(ast, out),
        }
    }
}
