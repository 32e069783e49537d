pub mod literal;
pub mod symbol;
pub mod token;

use token::{Token, TokenSpan};

/// Strips trivia before parsing. Newlines are kept only for line-oriented
/// grammars (the arithmetic language uses them as statement terminators).
#[derive(Debug, Default)]
pub struct TokenPreprocessor {
    keep_newlines: bool,
}

impl TokenPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_newlines() -> Self {
        Self {
            keep_newlines: true,
        }
    }

    pub fn process(&self, spans: Vec<TokenSpan>) -> Vec<TokenSpan> {
        spans
            .into_iter()
            .filter(|span| match span.token {
                Token::Whitespace(_) | Token::Comment(_) => false,
                Token::Newline => self.keep_newlines,
                _ => true,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::token::Tokenizer;
    use super::*;

    #[test]
    fn test_trivia_dropped() {
        let spans = Tokenizer::new().tokenize("set color red # note\n").unwrap();
        let tokens: Vec<Token> = TokenPreprocessor::new()
            .process(spans)
            .into_iter()
            .map(|span| span.token)
            .collect();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("set".into()),
                Token::Identifier("color".into()),
                Token::Identifier("red".into()),
            ]
        );
    }

    #[test]
    fn test_newlines_kept_for_line_oriented_grammars() {
        let spans = Tokenizer::new().tokenize("x = 1\nx + 2").unwrap();
        let tokens: Vec<Token> = TokenPreprocessor::with_newlines()
            .process(spans)
            .into_iter()
            .map(|span| span.token)
            .collect();
        assert!(tokens.contains(&Token::Newline));
    }
}
