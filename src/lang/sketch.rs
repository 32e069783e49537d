//! Vector-graphics language: pen attributes, `draw`, loops, conditionals,
//! user-defined routines, and the transform stack.

use std::str::FromStr;

use super::expr::{
    delim, expression, ident, keyword, loose_compare_op, number, op, TokenParser,
};
use super::{fallback_of, run_parser, Frontend, Language};
use crate::analyzer::prelude::*;
use crate::analyzer::ParseError;
use crate::ast::{CompareOp, Condition, Expr, MissingCall, Op, Program, ShapeKind, UnaryOp};
use crate::tokenizer::symbol::{Delimiter, Operator};
use crate::tokenizer::token::Token;

pub struct SketchFrontend;

impl Frontend for SketchFrontend {
    fn language(&self) -> Language {
        Language::Sketch
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
        set_stmt(),
        var_stmt(),
        draw_stmt(),
        repeat_block(),
        if_block(),
        define_stmt(),
        call_stmt(),
        rotate_stmt(),
        scale_stmt(),
        translate_stmt(),
        Box::new(map(keyword("push"), |_| Op::Push)),
        Box::new(map(keyword("pop"), |_| Op::Pop)),
    ]))
}

fn block() -> TokenParser<Vec<Op>> {
    Box::new(delimited(
        delim(Delimiter::OpenBrace),
        many(lazy(statement)),
        delim(Delimiter::CloseBrace),
    ))
}

/// `set color red`, `set size 5`
fn set_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(keyword("set"), tuple2(ident(), expression())),
        |(name, value)| Op::SetAttr {
            name,
            fallback: fallback_of(&value),
            value,
        },
    ))
}

/// `var x = 10`
fn var_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("var"),
            tuple2(ident(), preceded(op(Operator::Assign), expression())),
        ),
        |(name, value)| Op::Assign {
            name,
            fallback: fallback_of(&value),
            value,
            echo: false,
        },
    ))
}

/// `draw circle x=10 y=$i*20`
fn draw_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(keyword("draw"), tuple2(shape_kind(), many(draw_arg()))),
        |(shape, args)| Op::Draw { shape, args },
    ))
}

fn shape_kind() -> TokenParser<ShapeKind> {
    Box::new(satisfy(|token: &Token| match token {
        Token::Identifier(name) => ShapeKind::from_str(name).ok(),
        _ => None,
    }))
}

fn draw_arg() -> TokenParser<(String, Expr)> {
    Box::new(tuple2(
        ident(),
        preceded(op(Operator::Assign), expression()),
    ))
}

/// `repeat 3 { ... }` — the loop counter is visible as `i` (or `$i`).
fn repeat_block() -> TokenParser<Op> {
    Box::new(map(
        preceded(keyword("repeat"), tuple2(number(), block())),
        |(count, body)| Op::Repeat {
            count: count as usize,
            body,
        },
    ))
}

/// `if x > 5 { ... } else { ... }`
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

/// `define spiral(turns, step) { ... }`
fn define_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("define"),
            tuple3(
                ident(),
                delimited(
                    delim(Delimiter::OpenParen),
                    separated_list(ident(), delim(Delimiter::Comma)),
                    delim(Delimiter::CloseParen),
                ),
                block(),
            ),
        ),
        |(name, params, body)| Op::DefineRoutine { name, params, body },
    ))
}

/// `call spiral(3, 10)` — calling an unknown routine is a silent no-op.
fn call_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("call"),
            tuple2(
                ident(),
                optional(delimited(
                    delim(Delimiter::OpenParen),
                    separated_list(expression(), delim(Delimiter::Comma)),
                    delim(Delimiter::CloseParen),
                )),
            ),
        ),
        |(name, arguments)| Op::CallRoutine {
            name,
            arguments: arguments.unwrap_or_default(),
            missing: MissingCall::Ignore,
        },
    ))
}

fn rotate_stmt() -> TokenParser<Op> {
    Box::new(map(preceded(keyword("rotate"), expression()), Op::Rotate))
}

/// `scale 2` or `scale 2 0.5`.
fn scale_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(keyword("scale"), tuple2(factor(), optional(factor()))),
        |(x, y)| Op::Scale { x, y },
    ))
}

/// `translate 10 -5`
fn translate_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(keyword("translate"), tuple2(factor(), factor())),
        |(x, y)| Op::Translate { x, y },
    ))
}

/// A single transform operand. Full expressions would fold `10 -5` into one
/// subtraction, and a bare name would swallow the next statement's keyword,
/// so only literals, `-literal`, `$name`, and parenthesized expressions are
/// accepted here.
fn factor() -> TokenParser<Expr> {
    Box::new(choice(vec![
        Box::new(map(number(), Expr::Number)),
        Box::new(map(preceded(op(Operator::Minus), number()), |value| {
            Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(Expr::Number(value)),
            }
        })),
        Box::new(map(
            preceded(delim(Delimiter::Dollar), ident()),
            Expr::Variable,
        )),
        Box::new(delimited(
            delim(Delimiter::OpenParen),
            expression(),
            delim(Delimiter::CloseParen),
        )),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::compile;
    use pretty_assertions::assert_eq;

    fn ops(source: &str) -> Vec<Op> {
        compile(Language::Sketch, source).unwrap().ops
    }

    #[test]
    fn test_set_and_draw() {
        assert_eq!(
            ops("set color red\ndraw circle x=10 y=10"),
            vec![
                Op::SetAttr {
                    name: "color".into(),
                    value: Expr::Variable("red".into()),
                    fallback: Some("red".into()),
                },
                Op::Draw {
                    shape: ShapeKind::Circle,
                    args: vec![
                        ("x".into(), Expr::Number(10.0)),
                        ("y".into(), Expr::Number(10.0)),
                    ],
                },
            ]
        );
    }

    #[test]
    fn test_loop_wraps_body() {
        let program = compile(Language::Sketch, "repeat 3 { draw circle x=$i y=0 }").unwrap();
        assert_eq!(program.len(), 1);
        match &program.ops[0] {
            Op::Repeat { count, body } => {
                assert_eq!(*count, 3);
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected repeat, got {:?}", other),
        }
    }

    #[test]
    fn test_define_with_params() {
        let ops = ops("define ring(n) { draw circle x=$n y=0 }");
        match &ops[0] {
            Op::DefineRoutine { name, params, body } => {
                assert_eq!(name, "ring");
                assert_eq!(params, &vec!["n".to_string()]);
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected definition, got {:?}", other),
        }
    }

    #[test]
    fn test_scale_single_factor_does_not_eat_next_statement() {
        let ops = ops("scale 2\ndraw circle x=1 y=1");
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[0],
            Op::Scale {
                x: Expr::Number(2.0),
                y: None,
            }
        );
    }

    #[test]
    fn test_scale_two_factors() {
        assert_eq!(
            ops("scale 2 0.5"),
            vec![Op::Scale {
                x: Expr::Number(2.0),
                y: Some(Expr::Number(0.5)),
            }]
        );
    }

    #[test]
    fn test_transform_statements() {
        assert_eq!(
            ops("push\nrotate 90\ntranslate 5 5\npop"),
            vec![
                Op::Push,
                Op::Rotate(Expr::Number(90.0)),
                Op::Translate {
                    x: Expr::Number(5.0),
                    y: Expr::Number(5.0),
                },
                Op::Pop,
            ]
        );
    }

    #[test]
    fn test_translate_negative_offset_does_not_fold() {
        let ops = ops("translate 10 -5\ndraw circle x=0 y=0");
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[0],
            Op::Translate {
                x: Expr::Number(10.0),
                y: Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(Expr::Number(5.0)),
                },
            }
        );
    }

    #[test]
    fn test_call_without_arguments() {
        assert_eq!(
            ops("call spiral"),
            vec![Op::CallRoutine {
                name: "spiral".into(),
                arguments: vec![],
                missing: MissingCall::Ignore,
            }]
        );
    }
}
