//! Line-oriented arithmetic language. Each line is an assignment, a `show`,
//! or a bare expression whose value is echoed.

use super::expr::{expression, ident, keyword, op, TokenParser};
use super::{run_parser, Frontend, Language};
use crate::analyzer::prelude::*;
use crate::analyzer::ParseError;
use crate::ast::{Op, Program};
use crate::tokenizer::symbol::Operator;
use crate::tokenizer::token::Token;

pub struct MathFrontend;

impl Frontend for MathFrontend {
    fn language(&self) -> Language {
        Language::Math
    }

    fn keeps_newlines(&self) -> bool {
        true
    }

    fn parse(&self, tokens: &[Token]) -> Result<Program, ParseError> {
        run_parser(program().as_ref(), tokens)
    }
}

fn program() -> TokenParser<Vec<Op>> {
    Box::new(map(many(line()), |lines| {
        lines.into_iter().flatten().collect()
    }))
}

/// Blank lines parse to nothing; expressions never span a newline.
fn line() -> TokenParser<Option<Op>> {
    Box::new(choice(vec![
        Box::new(map(newline(), |_| None)),
        Box::new(map(statement(), Some)),
    ]))
}

fn newline() -> TokenParser<()> {
    Box::new(satisfy(|token: &Token| match token {
        Token::Newline => Some(()),
        _ => None,
    }))
}

fn statement() -> TokenParser<Op> {
    Box::new(choice(vec![assignment(), show_stmt(), expr_line()]))
}

/// `x = 5` — echoed back as `x = 5`.
fn assignment() -> TokenParser<Op> {
    Box::new(map(
        tuple2(ident(), preceded(op(Operator::Assign), expression())),
        |(name, value)| Op::Assign {
            name,
            value,
            fallback: None,
            echo: true,
        },
    ))
}

/// `show x`
fn show_stmt() -> TokenParser<Op> {
    Box::new(map(preceded(keyword("show"), ident()), Op::ShowVar))
}

fn expr_line() -> TokenParser<Op> {
    Box::new(map(expression(), Op::Eval))
}
