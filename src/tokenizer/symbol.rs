use nom::{branch::alt, bytes::complete::tag, combinator::value, IResult};

use super::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, strum::Display, strum::EnumIter)]
pub enum Operator {
    #[strum(serialize = "==")]
    EqEq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "<=")]
    LessEq,
    #[strum(serialize = ">=")]
    GreaterEq,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = "=")]
    Assign,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "*")]
    Star,
    #[strum(serialize = "/")]
    Slash,
    #[strum(serialize = "%")]
    Percent,
    #[strum(serialize = "^")]
    Caret,
}

#[derive(Debug, Clone, Copy, PartialEq, strum::EnumIter)]
pub enum Delimiter {
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Comma,
    Dollar,
}

// Hand-written because a derived format string cannot hold a lone brace.
impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Delimiter::OpenParen => "(",
            Delimiter::CloseParen => ")",
            Delimiter::OpenBrace => "{",
            Delimiter::CloseBrace => "}",
            Delimiter::OpenBracket => "[",
            Delimiter::CloseBracket => "]",
            Delimiter::Comma => ",",
            Delimiter::Dollar => "$",
        })
    }
}

// Multi-character operators must be tried before their prefixes.
pub fn operator(input: &str) -> IResult<&str, Token> {
    let (input, op) = alt((
        value(Operator::EqEq, tag("==")),
        value(Operator::NotEq, tag("!=")),
        value(Operator::LessEq, tag("<=")),
        value(Operator::GreaterEq, tag(">=")),
        value(Operator::Less, tag("<")),
        value(Operator::Greater, tag(">")),
        value(Operator::Assign, tag("=")),
        value(Operator::Plus, tag("+")),
        value(Operator::Minus, tag("-")),
        value(Operator::Star, tag("*")),
        value(Operator::Slash, tag("/")),
        value(Operator::Percent, tag("%")),
        value(Operator::Caret, tag("^")),
    ))(input)?;
    Ok((input, Token::Operator(op)))
}

pub fn delimiter(input: &str) -> IResult<&str, Token> {
    let (input, delim) = alt((
        value(Delimiter::OpenParen, tag("(")),
        value(Delimiter::CloseParen, tag(")")),
        value(Delimiter::OpenBrace, tag("{")),
        value(Delimiter::CloseBrace, tag("}")),
        value(Delimiter::OpenBracket, tag("[")),
        value(Delimiter::CloseBracket, tag("]")),
        value(Delimiter::Comma, tag(",")),
        value(Delimiter::Dollar, tag("$")),
    ))(input)?;
    Ok((input, Token::Delimiter(delim)))
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_all_operators() {
        for op in Operator::iter() {
            let text = op.to_string();
            let (rest, token) = operator(&text).unwrap();
            assert_eq!(token, Token::Operator(op));
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_all_delimiters() {
        for delim in Delimiter::iter() {
            let text = delim.to_string();
            let (rest, token) = delimiter(&text).unwrap();
            assert_eq!(token, Token::Delimiter(delim));
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_brace_display_is_a_single_char() {
        assert_eq!(Delimiter::OpenBrace.to_string(), "{");
        assert_eq!(Delimiter::CloseBrace.to_string(), "}");
    }

    #[test]
    fn test_compound_before_single() {
        let (rest, token) = operator("== 3").unwrap();
        assert_eq!(token, Token::Operator(Operator::EqEq));
        assert_eq!(rest, " 3");
    }
}
