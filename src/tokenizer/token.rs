use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    combinator::recognize,
    sequence::{pair, preceded},
    IResult,
};
use thiserror::Error;

use super::literal::{number, string};
use super::symbol::{delimiter, operator, Delimiter, Operator};

/// One lexical unit shared by every language front-end. Keywords are not
/// distinguished here; each grammar matches them as identifiers.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Identifier(String),
    Operator(Operator),
    Delimiter(Delimiter),
    Whitespace(String),
    Newline,
    Comment(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "\"{}\"", s),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Delimiter(delim) => write!(f, "{}", delim),
            Token::Whitespace(_) => write!(f, " "),
            Token::Newline => write!(f, "\\n"),
            Token::Comment(text) => write!(f, "#{}", text),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenSpan {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizeError {
    #[error("unexpected character {found:?} at line {line}, column {column}")]
    UnexpectedChar {
        found: char,
        line: usize,
        column: usize,
    },
}

fn identifier(input: &str) -> IResult<&str, Token> {
    let (input, id) = recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)?;
    Ok((input, Token::Identifier(id.to_string())))
}

fn whitespace(input: &str) -> IResult<&str, Token> {
    let (input, ws) = take_while1(|c| c == ' ' || c == '\t')(input)?;
    Ok((input, Token::Whitespace(ws.to_string())))
}

fn newline(input: &str) -> IResult<&str, Token> {
    let (input, _) = alt((tag("\r\n"), tag("\n")))(input)?;
    Ok((input, Token::Newline))
}

fn comment(input: &str) -> IResult<&str, Token> {
    let (input, text) = preceded(tag("#"), take_while(|c| c != '\n'))(input)?;
    Ok((input, Token::Comment(text.trim().to_string())))
}

#[derive(Debug, Default)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn new() -> Self {
        Self
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    pub fn tokenize(&self, input: &str) -> Result<Vec<TokenSpan>, TokenizeError> {
        let mut tokens = Vec::new();
        let mut current_line = 1;
        let mut current_column = 1;
        let mut remaining = input;

        while !remaining.is_empty() {
            let result = alt((
                newline, whitespace, comment, string, number, identifier, operator, delimiter,
            ))(remaining);

            match result {
                Ok((rest, token)) => {
                    let token_length = remaining.len() - rest.len();
                    tokens.push(TokenSpan {
                        token: token.clone(),
                        start: input.len() - remaining.len(),
                        end: input.len() - rest.len(),
                        line: current_line,
                        column: current_column,
                    });

                    if token == Token::Newline {
                        current_line += 1;
                        current_column = 1;
                    } else {
                        current_column += token_length;
                    }
                    remaining = rest;
                }
                Err(_) => {
                    return Err(TokenizeError::UnexpectedChar {
                        found: remaining.chars().next().unwrap_or('\0'),
                        line: current_line,
                        column: current_column,
                    });
                }
            }
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        Tokenizer::new()
            .tokenize(input)
            .unwrap()
            .into_iter()
            .map(|span| span.token)
            .collect()
    }

    #[test]
    fn test_statement_tokens() {
        let tokens = kinds("draw circle x=10 y=0");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("draw".into()),
                Token::Whitespace(" ".into()),
                Token::Identifier("circle".into()),
                Token::Whitespace(" ".into()),
                Token::Identifier("x".into()),
                Token::Operator(Operator::Assign),
                Token::Number(10.0),
                Token::Whitespace(" ".into()),
                Token::Identifier("y".into()),
                Token::Operator(Operator::Assign),
                Token::Number(0.0),
            ]
        );
    }

    #[test]
    fn test_loop_index_reference() {
        let tokens = kinds("$i*20");
        assert_eq!(
            tokens,
            vec![
                Token::Delimiter(Delimiter::Dollar),
                Token::Identifier("i".into()),
                Token::Operator(Operator::Star),
                Token::Number(20.0),
            ]
        );
    }

    #[test]
    fn test_comment_runs_to_end_of_line() {
        let tokens = kinds("# a comment\nsay \"hi\"");
        assert_eq!(tokens[0], Token::Comment("a comment".into()));
        assert_eq!(tokens[1], Token::Newline);
    }

    #[test]
    fn test_line_column_tracking() {
        let spans = Tokenizer::new().tokenize("x = 1\ny = 2").unwrap();
        let last = spans.last().unwrap();
        assert_eq!(last.line, 2);
        assert_eq!(last.column, 5);
    }

    #[test]
    fn test_unexpected_character() {
        let err = Tokenizer::new().tokenize("say @oops").unwrap_err();
        assert_eq!(
            err,
            TokenizeError::UnexpectedChar {
                found: '@',
                line: 1,
                column: 5
            }
        );
    }
}
