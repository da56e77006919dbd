//! KQL query pipeline: parse → normalize → validate → compile.
//!
//! [`QueryEngine`] wires the syntax layer to the configured back-end so
//! callers turn user input into a back-end query string in one call.

pub use kql_syntax::{
    Ast, BoolOp, Clock, CompareOp, ErrorKind, FixedClock, Node, SystemClock, TimeZoneClock,
    build_query, parse_query,
};
pub use search_query::{Backend, CompileError, Compiler, CompilerConfig, FieldMapping, QueryCompiler};

use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use std::{fmt, time::Instant};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] kql_syntax::Error),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("unknown time zone '{name}'")]
    TimeZone {
        name: String,
        #[source]
        source: jiff::Error,
    },
}

impl Error {
    /// Syntax error kind, when the query itself was rejected.
    pub fn syntax_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Syntax(err) => Some(err.kind()),
            Error::Compile(_) | Error::TimeZone { .. } => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub compiler: CompilerConfig,
    /// IANA zone for relative dates and offset-less literals; the system
    /// zone when unset.
    pub timezone: Option<String>,
}

pub struct QueryEngine {
    clock: Box<dyn Clock + Send + Sync>,
    compiler: QueryCompiler,
}

impl fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngine")
            .field("compiler", &self.compiler)
            .finish_non_exhaustive()
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self {
            clock: Box::new(SystemClock),
            compiler: QueryCompiler::default(),
        }
    }
}

impl QueryEngine {
    pub fn from_config(config: &Config) -> Result<Self> {
        let clock: Box<dyn Clock + Send + Sync> = match &config.timezone {
            Some(name) => {
                let tz = TimeZone::get(name).map_err(|source| Error::TimeZone {
                    name: name.clone(),
                    source,
                })?;
                Box::new(TimeZoneClock(tz))
            }
            None => Box::new(SystemClock),
        };
        Ok(Self {
            clock,
            compiler: config.compiler.build(),
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    /// Parsed, normalized and validated tree for `query`.
    pub fn build(&self, query: &str) -> Result<Ast> {
        Ok(build_query(query, self.clock.as_ref())?)
    }

    pub fn compile(&self, query: &str) -> Result<String> {
        let mut compiled = String::new();
        self.compile_to(query, &mut compiled)?;
        Ok(compiled)
    }

    pub fn compile_to(&self, query: &str, out: &mut dyn fmt::Write) -> Result<()> {
        let started = Instant::now();
        let ast = self.build(query)?;
        self.compiler.compile_to(&ast, out)?;
        debug!(
            backend = self.compiler.name(),
            nodes = ast.nodes.len(),
            elapsed = ?started.elapsed(),
            "compiled query"
        );
        Ok(())
    }
}
