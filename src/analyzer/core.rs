use thiserror::Error;

/// Parsers consume a slice of tokens from `pos` and return the new position
/// together with the parsed value.
pub trait Parser<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O>;
}

impl<I, O> Parser<I, O> for Box<dyn Parser<I, O>> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        (**self).parse(input, pos)
    }
}

pub type ParseResult<O> = Result<(usize, O), ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected end of input")]
    Eof,
    #[error("no alternative matched")]
    NoAlternative,
    #[error("expected {expected}, found {found} at token {position}")]
    Mismatch {
        expected: String,
        found: String,
        position: usize,
    },
    #[error("in {message}: {inner}")]
    WithContext {
        message: String,
        inner: Box<ParseError>,
    },
}

impl ParseError {
    /// Token index of the innermost positioned failure, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::Mismatch { position, .. } => Some(*position),
            ParseError::WithContext { inner, .. } => inner.position(),
            _ => None,
        }
    }
}
