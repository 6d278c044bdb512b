use thiserror::Error;

pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// A vCard syntax error, with the 1-based logical line it was found on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected content")]
    UnexpectedToken,
    #[error("invalid property name")]
    InvalidPropertyName,
    #[error("invalid parameter")]
    InvalidParameter,
}
