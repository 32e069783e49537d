//! Token-level helper parsers and the expression grammar shared by every
//! language front-end.

use crate::analyzer::prelude::*;
use crate::analyzer::Parser;
use crate::ast::{BinaryOp, CompareOp, Expr, UnaryOp};
use crate::tokenizer::symbol::{Delimiter, Operator};
use crate::tokenizer::token::Token;

pub type TokenParser<O> = Box<dyn Parser<Token, O>>;

pub fn number() -> TokenParser<f64> {
    Box::new(satisfy(|token: &Token| match token {
        Token::Number(value) => Some(*value),
        _ => None,
    }))
}

pub fn string_lit() -> TokenParser<String> {
    Box::new(satisfy(|token: &Token| match token {
        Token::Str(text) => Some(text.clone()),
        _ => None,
    }))
}

pub fn ident() -> TokenParser<String> {
    Box::new(satisfy(|token: &Token| match token {
        Token::Identifier(name) => Some(name.clone()),
        _ => None,
    }))
}

/// Keywords are plain identifiers; each grammar matches them textually.
pub fn keyword(word: &'static str) -> TokenParser<()> {
    Box::new(satisfy(move |token: &Token| match token {
        Token::Identifier(name) if name == word => Some(()),
        _ => None,
    }))
}

pub fn op(expected: Operator) -> TokenParser<()> {
    Box::new(as_unit(equal(Token::Operator(expected))))
}

pub fn delim(expected: Delimiter) -> TokenParser<()> {
    Box::new(as_unit(equal(Token::Delimiter(expected))))
}

/// Strict comparison operators, used inside expressions. A single `=` is
/// assignment, never comparison, at this level.
pub fn compare_op() -> TokenParser<CompareOp> {
    Box::new(satisfy(|token: &Token| match token {
        Token::Operator(Operator::EqEq) => Some(CompareOp::Eq),
        Token::Operator(Operator::NotEq) => Some(CompareOp::Ne),
        Token::Operator(Operator::Less) => Some(CompareOp::Lt),
        Token::Operator(Operator::LessEq) => Some(CompareOp::Le),
        Token::Operator(Operator::Greater) => Some(CompareOp::Gt),
        Token::Operator(Operator::GreaterEq) => Some(CompareOp::Ge),
        _ => None,
    }))
}

/// Condition operators for `where` and `if` clauses, which also accept the
/// lone `=` as equality.
pub fn loose_compare_op() -> TokenParser<CompareOp> {
    Box::new(satisfy(|token: &Token| match token {
        Token::Operator(Operator::Assign) => Some(CompareOp::Eq),
        Token::Operator(Operator::EqEq) => Some(CompareOp::Eq),
        Token::Operator(Operator::NotEq) => Some(CompareOp::Ne),
        Token::Operator(Operator::Less) => Some(CompareOp::Lt),
        Token::Operator(Operator::LessEq) => Some(CompareOp::Le),
        Token::Operator(Operator::Greater) => Some(CompareOp::Gt),
        Token::Operator(Operator::GreaterEq) => Some(CompareOp::Ge),
        _ => None,
    }))
}

fn fold_binary(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    rest.into_iter().fold(first, |left, (op, right)| Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

/// Full expression grammar: comparison over additive over multiplicative
/// over power (right-associative) over unary over atoms.
pub fn expression() -> TokenParser<Expr> {
    Box::new(map(
        tuple2(additive(), optional(tuple2(compare_op(), additive()))),
        |(left, rest)| match rest {
            Some((op, right)) => Expr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            None => left,
        },
    ))
}

fn additive() -> TokenParser<Expr> {
    let operand = || {
        Box::new(satisfy(|token: &Token| match token {
            Token::Operator(Operator::Plus) => Some(BinaryOp::Add),
            Token::Operator(Operator::Minus) => Some(BinaryOp::Sub),
            _ => None,
        })) as TokenParser<BinaryOp>
    };
    Box::new(map(
        tuple2(multiplicative(), many(tuple2(operand(), multiplicative()))),
        |(first, rest)| fold_binary(first, rest),
    ))
}

fn multiplicative() -> TokenParser<Expr> {
    let operand = || {
        Box::new(satisfy(|token: &Token| match token {
            Token::Operator(Operator::Star) => Some(BinaryOp::Mul),
            Token::Operator(Operator::Slash) => Some(BinaryOp::Div),
            Token::Operator(Operator::Percent) => Some(BinaryOp::Mod),
            _ => None,
        })) as TokenParser<BinaryOp>
    };
    Box::new(map(
        tuple2(power(), many(tuple2(operand(), power()))),
        |(first, rest)| fold_binary(first, rest),
    ))
}

fn power() -> TokenParser<Expr> {
    Box::new(map(
        tuple2(unary(), optional(preceded(op(Operator::Caret), lazy(power)))),
        |(base, exponent)| match exponent {
            Some(exponent) => Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            },
            None => base,
        },
    ))
}

fn unary() -> TokenParser<Expr> {
    Box::new(choice(vec![
        Box::new(map(preceded(op(Operator::Minus), lazy(unary)), |operand| {
            Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            }
        })),
        Box::new(lazy(atom)),
    ]))
}

fn atom() -> TokenParser<Expr> {
    Box::new(choice(vec![
        Box::new(map(number(), Expr::Number)),
        Box::new(map(string_lit(), Expr::Text)),
        Box::new(call()),
        Box::new(map(ident(), Expr::Variable)),
        // `$name` is the loop-counter style reference; it resolves through
        // the same variable mapping as a bare name.
        Box::new(map(
            preceded(delim(Delimiter::Dollar), ident()),
            Expr::Variable,
        )),
        Box::new(delimited(
            delim(Delimiter::OpenParen),
            lazy(expression),
            delim(Delimiter::CloseParen),
        )),
    ]))
}

fn call() -> TokenParser<Expr> {
    Box::new(map(
        tuple2(
            ident(),
            delimited(
                delim(Delimiter::OpenParen),
                separated_list(lazy(expression), delim(Delimiter::Comma)),
                delim(Delimiter::CloseParen),
            ),
        ),
        |(function, mut arguments)| {
            // `calc(...)` is an explicit arithmetic escape in value position;
            // it is the inner expression, not a function call.
            if function == "calc" && arguments.len() == 1 {
                arguments.remove(0)
            } else {
                Expr::Call {
                    function,
                    arguments,
                }
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::token::Tokenizer;
    use crate::tokenizer::TokenPreprocessor;
    use pretty_assertions::assert_eq;

    fn tokens(source: &str) -> Vec<Token> {
        TokenPreprocessor::new()
            .process(Tokenizer::new().tokenize(source).unwrap())
            .into_iter()
            .map(|span| span.token)
            .collect()
    }

    fn parse(source: &str) -> Expr {
        let tokens = tokens(source);
        let (pos, expr) = expression().parse(&tokens, 0).unwrap();
        assert_eq!(pos, tokens.len(), "unconsumed input in {:?}", source);
        expr
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("1 + 2 * 3"),
            Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::Number(1.0)),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: Box::new(Expr::Number(2.0)),
                    right: Box::new(Expr::Number(3.0)),
                }),
            }
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(
            parse("2 ^ 3 ^ 2"),
            Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(Expr::Number(2.0)),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Pow,
                    left: Box::new(Expr::Number(3.0)),
                    right: Box::new(Expr::Number(2.0)),
                }),
            }
        );
    }

    #[test]
    fn test_dollar_reference() {
        assert_eq!(
            parse("$i * 20"),
            Expr::Binary {
                op: BinaryOp::Mul,
                left: Box::new(Expr::Variable("i".into())),
                right: Box::new(Expr::Number(20.0)),
            }
        );
    }

    #[test]
    fn test_calc_escape_unwraps() {
        assert_eq!(
            parse("calc(1 + 2)"),
            Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::Number(1.0)),
                right: Box::new(Expr::Number(2.0)),
            }
        );
    }

    #[test]
    fn test_function_call_with_arguments() {
        assert_eq!(
            parse("max(1, x)"),
            Expr::Call {
                function: "max".into(),
                arguments: vec![Expr::Number(1.0), Expr::Variable("x".into())],
            }
        );
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(
            parse("-x + 1"),
            Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(Expr::Variable("x".into())),
                }),
                right: Box::new(Expr::Number(1.0)),
            }
        );
    }
}
