//! Text-templating language: `say`, `set`, `remember`/`recall`, `if`,
//! `repeat`, named `task` blocks, and list handling with `foreach`.

use super::expr::{
    expression, ident, keyword, loose_compare_op, number, op, string_lit, TokenParser,
};
use super::{fallback_of, run_parser, Frontend, Language};
use crate::analyzer::prelude::*;
use crate::analyzer::ParseError;
use crate::ast::{CompareOp, Condition, Expr, MissingCall, Op, Program};
use crate::tokenizer::symbol::{Delimiter, Operator};
use crate::tokenizer::token::Token;

pub struct ProseFrontend;

impl Frontend for ProseFrontend {
    fn language(&self) -> Language {
        Language::Prose
    }

    fn parse(&self, tokens: &[Token]) -> Result<Program, ParseError> {
        run_parser(program().as_ref(), tokens)
    }
}

fn program() -> TokenParser<Vec<Op>> {
    Box::new(many(lazy(statement)))
}

fn statement() -> TokenParser<Op> {
    Box::new(choice(vec![
        say_stmt(),
        set_stmt(),
        remember_stmt(),
        recall_stmt(),
        list_stmt(),
        append_stmt(),
        get_stmt(),
        length_stmt(),
        foreach_block(),
        if_block(),
        repeat_block(),
        task_def(),
        call_stmt(),
    ]))
}

fn block() -> TokenParser<Vec<Op>> {
    Box::new(delimited(
        super::expr::delim(Delimiter::OpenBrace),
        many(lazy(statement)),
        super::expr::delim(Delimiter::CloseBrace),
    ))
}

/// `say "Hello!"`, or `say item` to speak a variable; a bare word that
/// never resolves speaks itself.
fn say_stmt() -> TokenParser<Op> {
    let text = choice(vec![
        Box::new(map(string_lit(), Expr::Text)) as TokenParser<Expr>,
        Box::new(map(ident(), Expr::Variable)),
    ]);
    Box::new(map(preceded(keyword("say"), text), Op::Say))
}

/// `set mood happy` — the value may be a bare word, a literal, or an
/// arithmetic expression; bare words degrade to text at run time.
fn set_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(keyword("set"), tuple2(ident(), expression())),
        |(name, value)| Op::Assign {
            name,
            fallback: fallback_of(&value),
            value,
            echo: false,
        },
    ))
}

/// `remember favorite_color = "green"`
fn remember_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("remember"),
            tuple2(ident(), preceded(op(Operator::Assign), expression())),
        ),
        |(key, value)| Op::Remember {
            key,
            fallback: fallback_of(&value),
            value,
        },
    ))
}

/// `recall favorite_color`
fn recall_stmt() -> TokenParser<Op> {
    Box::new(map(preceded(keyword("recall"), ident()), |key| Op::Recall {
        key,
    }))
}

/// `list items = ["a", "b", "c"]`
fn list_stmt() -> TokenParser<Op> {
    let items = delimited(
        super::expr::delim(Delimiter::OpenBracket),
        separated_list(expression(), super::expr::delim(Delimiter::Comma)),
        super::expr::delim(Delimiter::CloseBracket),
    );
    Box::new(map(
        preceded(
            keyword("list"),
            tuple2(ident(), preceded(op(Operator::Assign), items)),
        ),
        |(name, items)| Op::ListCreate { name, items },
    ))
}

/// `append items "d"` — appending to a scalar wraps it into a list first.
fn append_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(keyword("append"), tuple2(ident(), expression())),
        |(name, value)| Op::ListAppend { name, value },
    ))
}

/// `get items 0 as first`
fn get_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("get"),
            tuple3(ident(), expression(), preceded(keyword("as"), ident())),
        ),
        |(name, index, target)| Op::ListGet {
            name,
            index,
            target,
        },
    ))
}

/// `length items as n` — lists count elements, anything else counts chars.
fn length_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("length"),
            tuple2(ident(), preceded(keyword("as"), ident())),
        ),
        |(name, target)| Op::Length { name, target },
    ))
}

/// `foreach item in items { ... }`
fn foreach_block() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("foreach"),
            tuple3(ident(), preceded(keyword("in"), ident()), block()),
        ),
        |(var, list, body)| Op::Foreach { var, list, body },
    ))
}

/// `if mood is happy { ... } else { ... }`
fn if_block() -> TokenParser<Op> {
    let condition = map(
        tuple3(ident(), condition_op(), expression()),
        |(name, op, value)| Condition { name, op, value },
    );
    Box::new(map(
        preceded(
            keyword("if"),
            tuple3(
                condition,
                block(),
                optional(preceded(keyword("else"), block())),
            ),
        ),
        |(condition, then_body, else_body)| Op::If {
            condition,
            then_body,
            else_body: else_body.unwrap_or_default(),
        },
    ))
}

fn condition_op() -> TokenParser<CompareOp> {
    Box::new(choice(vec![
        Box::new(map(keyword("is"), |_| CompareOp::Eq)),
        loose_compare_op(),
    ]))
}

/// `repeat 2 { ... }`
fn repeat_block() -> TokenParser<Op> {
    Box::new(map(
        preceded(keyword("repeat"), tuple2(number(), block())),
        |(count, body)| Op::Repeat {
            count: count as usize,
            body,
        },
    ))
}

/// `task greet { ... }` — tasks take no parameters in this language.
fn task_def() -> TokenParser<Op> {
    Box::new(map(
        preceded(keyword("task"), tuple2(ident(), block())),
        |(name, body)| Op::DefineRoutine {
            name,
            params: Vec::new(),
            body,
        },
    ))
}

/// `call greet` — an unknown task prints a visible placeholder.
fn call_stmt() -> TokenParser<Op> {
    Box::new(map(preceded(keyword("call"), ident()), |name| {
        Op::CallRoutine {
            name,
            arguments: Vec::new(),
            missing: MissingCall::Report,
        }
    }))
}
