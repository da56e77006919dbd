use crate::ast::{Location, Node, OperatorNode};
use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Syntax problem found while reading the query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub location: Location,
}

impl ParseError {
    pub fn position(&self) -> usize {
        self.location.start
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.location.start)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("the expression can't begin from a binary operator: '{}'", node.value)]
    StartsWithBinaryOperator { node: OperatorNode },
    #[error("'{}' - '{}' - '{}' is not valid", node.kind_name(), node.key(), node.value_text())]
    NamedGroupInvalidNodes { node: Node },
    #[error("unable to convert '{value}' to a time range")]
    UnsupportedTimeRange { value: String },
    /// Reserved for callers that coerce raw values into node payloads; the
    /// parser itself reports bad literals as [`Error::Parse`].
    #[error("unable to convert '{value}' into a {target}")]
    Conversion { value: String, target: &'static str },
}

/// Stable classification of [`Error`] for callers that branch on the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Parse,
    StartsWithBinaryOperator,
    NamedGroupInvalidNodes,
    UnsupportedTimeRange,
    Conversion,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::StartsWithBinaryOperator => "starts_with_binary_operator",
            ErrorKind::NamedGroupInvalidNodes => "named_group_invalid_nodes",
            ErrorKind::UnsupportedTimeRange => "unsupported_time_range",
            ErrorKind::Conversion => "conversion",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(_) => ErrorKind::Parse,
            Error::StartsWithBinaryOperator { .. } => ErrorKind::StartsWithBinaryOperator,
            Error::NamedGroupInvalidNodes { .. } => ErrorKind::NamedGroupInvalidNodes,
            Error::UnsupportedTimeRange { .. } => ErrorKind::UnsupportedTimeRange,
            Error::Conversion { .. } => ErrorKind::Conversion,
        }
    }

    /// Where in the query text the error was detected, when known.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Error::Parse(err) => Some(&err.location),
            Error::StartsWithBinaryOperator { node } => Some(&node.loc),
            Error::NamedGroupInvalidNodes { node } => Some(node.loc()),
            Error::UnsupportedTimeRange { .. } | Error::Conversion { .. } => None,
        }
    }
}
