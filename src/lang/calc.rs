//! Unit-conversion language: `define`, `base`, `convert`, `compute`, and
//! `show units`.

use super::expr::{keyword, number, op, TokenParser};
use super::{run_parser, Frontend, Language};
use crate::analyzer::prelude::*;
use crate::analyzer::ParseError;
use crate::ast::{BinaryOp, Op, Program, QuantityExpr};
use crate::tokenizer::symbol::Operator;
use crate::tokenizer::token::Token;

pub struct CalcFrontend;

impl Frontend for CalcFrontend {
    fn language(&self) -> Language {
        Language::Calc
    }

    fn parse(&self, tokens: &[Token]) -> Result<Program, ParseError> {
        run_parser(program().as_ref(), tokens)
    }
}

fn program() -> TokenParser<Vec<Op>> {
    Box::new(many(statement()))
}

fn statement() -> TokenParser<Op> {
    Box::new(choice(vec![
        define_stmt(),
        base_stmt(),
        convert_stmt(),
        compute_stmt(),
        show_stmt(),
    ]))
}

/// `define 1 flurb = 3.7 grobbles`
fn define_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("define"),
            with_context(
                tuple4(
                    number(),
                    unit_name(),
                    preceded(op(Operator::Assign), number()),
                    unit_name(),
                ),
                "unit definition",
            ),
        ),
        |(lhs_amount, lhs_unit, rhs_amount, rhs_unit)| Op::DefineUnit {
            lhs_amount,
            lhs_unit,
            rhs_amount,
            rhs_unit,
        },
    ))
}

/// `base grobble`, with an optional `unit` noise word.
fn base_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("base"),
            tuple2(optional(keyword("unit")), unit_name()),
        ),
        |(_, unit)| Op::BaseUnit(unit),
    ))
}

/// `convert 10 flurbs to zepts`
fn convert_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("convert"),
            tuple3(number(), unit_name(), preceded(keyword("to"), unit_name())),
        ),
        |(amount, from, to)| Op::Convert { amount, from, to },
    ))
}

/// `compute 5 flurbs + 2 grobbles in zepts`
fn compute_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("compute"),
            tuple2(quantity_expr(), preceded(keyword("in"), unit_name())),
        ),
        |(expr, target)| Op::Compute { expr, target },
    ))
}

/// `show units`
fn show_stmt() -> TokenParser<Op> {
    Box::new(map(tuple2(keyword("show"), keyword("units")), |_| {
        Op::ShowUnits
    }))
}

/// Unit names are bare identifiers, except the structural words of the
/// grammar itself.
fn unit_name() -> TokenParser<String> {
    Box::new(satisfy(|token: &Token| match token {
        Token::Identifier(name) if name != "in" && name != "to" => Some(name.clone()),
        _ => None,
    }))
}

fn quantity_expr() -> TokenParser<QuantityExpr> {
    let operand = || {
        Box::new(satisfy(|token: &Token| match token {
            Token::Operator(Operator::Plus) => Some(BinaryOp::Add),
            Token::Operator(Operator::Minus) => Some(BinaryOp::Sub),
            _ => None,
        })) as TokenParser<BinaryOp>
    };
    Box::new(map(
        tuple2(quantity_term(), many(tuple2(operand(), quantity_term()))),
        |(first, rest)| {
            rest.into_iter()
                .fold(first, |left, (op, right)| QuantityExpr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
        },
    ))
}

fn quantity_term() -> TokenParser<QuantityExpr> {
    let operand = || {
        Box::new(satisfy(|token: &Token| match token {
            Token::Operator(Operator::Star) => Some(BinaryOp::Mul),
            Token::Operator(Operator::Slash) => Some(BinaryOp::Div),
            _ => None,
        })) as TokenParser<BinaryOp>
    };
    Box::new(map(
        tuple2(quantity_atom(), many(tuple2(operand(), quantity_atom()))),
        |(first, rest)| {
            rest.into_iter()
                .fold(first, |left, (op, right)| QuantityExpr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
        },
    ))
}

/// `5 flurbs` or a bare `5`.
fn quantity_atom() -> TokenParser<QuantityExpr> {
    Box::new(map(
        tuple2(number(), optional(unit_name())),
        |(amount, unit)| match unit {
            Some(unit) => QuantityExpr::Quantity(amount, unit),
            None => QuantityExpr::Amount(amount),
        },
    ))
}
