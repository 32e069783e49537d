use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit1},
    combinator::{map, map_res, opt, recognize},
    sequence::{delimited, pair},
    IResult,
};

use super::token::Token;

fn number_text(input: &str) -> IResult<&str, &str> {
    recognize(pair(digit1, opt(pair(char('.'), digit1))))(input)
}

pub fn number(input: &str) -> IResult<&str, Token> {
    map_res(number_text, |text: &str| {
        text.parse::<f64>().map(Token::Number)
    })(input)
}

// Both quote styles are accepted; the quotes are not kept.
pub fn string(input: &str) -> IResult<&str, Token> {
    map(
        alt((
            delimited(char('"'), take_while(|c| c != '"' && c != '\n'), char('"')),
            delimited(char('\''), take_while(|c| c != '\'' && c != '\n'), char('\'')),
        )),
        |content: &str| Token::Str(content.to_string()),
    )(input)
}
