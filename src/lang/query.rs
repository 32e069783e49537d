//! Query language over JSON tables: `load`, `filter`, `select`, `sort`,
//! `limit`, `join`, and `show tables`.

use super::expr::{expression, ident, keyword, loose_compare_op, number, string_lit, TokenParser};
use super::{run_parser, Frontend, Language};
use crate::analyzer::prelude::*;
use crate::analyzer::ParseError;
use crate::ast::{Op, Program};
use crate::tokenizer::symbol::Delimiter;
use crate::tokenizer::token::Token;

pub struct QueryFrontend;

impl Frontend for QueryFrontend {
    fn language(&self) -> Language {
        Language::Query
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
        load_stmt(),
        filter_stmt(),
        select_stmt(),
        sort_stmt(),
        limit_stmt(),
        join_stmt(),
        show_stmt(),
    ]))
}

/// `load table users from "users.json"`
fn load_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("load"),
            with_context(
                preceded(
                    keyword("table"),
                    tuple2(ident(), preceded(keyword("from"), string_lit())),
                ),
                "load statement",
            ),
        ),
        |(table, path)| Op::Load { table, path },
    ))
}

/// `filter users where age > 25` — a lone `=` is accepted as equality, and
/// the right-hand side may reference variables via `$name` or `calc(...)`.
fn filter_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("filter"),
            tuple4(
                ident(),
                preceded(keyword("where"), ident()),
                loose_compare_op(),
                expression(),
            ),
        ),
        |(table, field, op, value)| Op::Filter {
            table,
            field,
            op,
            value,
        },
    ))
}

/// `select name, email`
fn select_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("select"),
            separated_list(field_name(), super::expr::delim(Delimiter::Comma)),
        ),
        |fields| Op::Select { fields },
    ))
}

/// `sort by age desc` — ascending when no order is given.
fn sort_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("sort"),
            preceded(keyword("by"), tuple2(ident(), optional(sort_order()))),
        ),
        |(field, descending)| Op::Sort {
            field,
            descending: descending.unwrap_or(false),
        },
    ))
}

fn sort_order() -> TokenParser<bool> {
    Box::new(choice(vec![
        Box::new(map(keyword("asc"), |_| false)),
        Box::new(map(keyword("desc"), |_| true)),
    ]))
}

/// `limit 5`
fn limit_stmt() -> TokenParser<Op> {
    Box::new(map(preceded(keyword("limit"), number()), |count| {
        Op::Limit(count as usize)
    }))
}

/// `join orders on id = user_id`
fn join_stmt() -> TokenParser<Op> {
    Box::new(map(
        preceded(
            keyword("join"),
            tuple3(
                ident(),
                preceded(keyword("on"), ident()),
                preceded(as_unit(loose_compare_op()), ident()),
            ),
        ),
        |(table, left_key, right_key)| Op::Join {
            table,
            left_key,
            right_key,
        },
    ))
}

/// `show tables`
fn show_stmt() -> TokenParser<Op> {
    Box::new(map(tuple2(keyword("show"), keyword("tables")), |_| {
        Op::ShowTables
    }))
}

/// Statement keywords cannot be selected as fields; that keeps `select a, b`
/// from swallowing the next statement when a trailing comma is present.
fn field_name() -> TokenParser<String> {
    Box::new(satisfy(|token: &Token| match token {
        Token::Identifier(name)
            if !matches!(
                name.as_str(),
                "load" | "filter" | "select" | "sort" | "limit" | "join" | "show"
            ) =>
        {
            Some(name.clone())
        }
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CompareOp, Expr};
    use crate::lang::compile;
    use pretty_assertions::assert_eq;

    fn ops(source: &str) -> Vec<Op> {
        compile(Language::Query, source).unwrap().ops
    }

    #[test]
    fn test_full_pipeline() {
        let source = "load table users from \"users.json\"\n\
                      filter users where age > 25\n\
                      select name, email\n\
                      sort by age desc\n\
                      limit 5";
        assert_eq!(
            ops(source),
            vec![
                Op::Load {
                    table: "users".into(),
                    path: "users.json".into(),
                },
                Op::Filter {
                    table: "users".into(),
                    field: "age".into(),
                    op: CompareOp::Gt,
                    value: Expr::Number(25.0),
                },
                Op::Select {
                    fields: vec!["name".into(), "email".into()],
                },
                Op::Sort {
                    field: "age".into(),
                    descending: true,
                },
                Op::Limit(5),
            ]
        );
    }

    #[test]
    fn test_filter_accepts_lone_equals() {
        assert_eq!(
            ops("filter users where city = \"Oslo\""),
            vec![Op::Filter {
                table: "users".into(),
                field: "city".into(),
                op: CompareOp::Eq,
                value: Expr::Text("Oslo".into()),
            }]
        );
    }

    #[test]
    fn test_join_on_keys() {
        assert_eq!(
            ops("join orders on id = user_id"),
            vec![Op::Join {
                table: "orders".into(),
                left_key: "id".into(),
                right_key: "user_id".into(),
            }]
        );
    }

    #[test]
    fn test_sort_defaults_ascending() {
        assert_eq!(
            ops("sort by age"),
            vec![Op::Sort {
                field: "age".into(),
                descending: false,
            }]
        );
    }

    #[test]
    fn test_select_stops_at_next_statement() {
        let ops = ops("select name\nshow tables");
        assert_eq!(
            ops,
            vec![
                Op::Select {
                    fields: vec!["name".into()],
                },
                Op::ShowTables,
            ]
        );
    }
}
