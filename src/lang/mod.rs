pub mod calc;
pub mod expr;
pub mod math;
pub mod prose;
pub mod query;
pub mod sketch;

use thiserror::Error;

use crate::analyzer::{ParseError, Parser};
use crate::ast::{Expr, Op, Program};
use crate::error::{Error, Result};
use crate::eval::{Evaluator, ExecutionContext, Shape};
use crate::memory::{InMemoryStore, JsonFileTables, MemoryStore, TableSource};
use crate::tokenizer::token::{Token, TokenSpan, Tokenizer};
use crate::tokenizer::TokenPreprocessor;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("syntax error at line {line}, column {column}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Unit definitions and conversions.
    Calc,
    /// Text templating with durable memory.
    Prose,
    /// Vector graphics with a transform stack.
    Sketch,
    /// Line-oriented arithmetic.
    Math,
    /// Queries over in-memory JSON tables.
    Query,
}

impl Language {
    pub fn parse(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| Error::UnknownLanguage(name.to_string()))
    }
}

/// One compiler per language: a grammar over the shared token stream that
/// yields the retained operation tree.
pub trait Frontend {
    fn language(&self) -> Language;

    /// Whether newline tokens act as statement terminators.
    fn keeps_newlines(&self) -> bool {
        false
    }

    fn parse(&self, tokens: &[Token]) -> std::result::Result<Program, ParseError>;
}

pub fn frontend_for(language: Language) -> Box<dyn Frontend> {
    match language {
        Language::Calc => Box::new(calc::CalcFrontend),
        Language::Prose => Box::new(prose::ProseFrontend),
        Language::Sketch => Box::new(sketch::SketchFrontend),
        Language::Math => Box::new(math::MathFrontend),
        Language::Query => Box::new(query::QueryFrontend),
    }
}

/// Compiles source to a program: tokenize, strip trivia, run the language
/// grammar, and require every token to be consumed.
#[tracing::instrument(level = "debug", skip(source), fields(language = %language))]
pub fn compile(language: Language, source: &str) -> Result<Program> {
    let frontend = frontend_for(language);
    let spans = Tokenizer::new().tokenize(source)?;
    let preprocessor = if frontend.keeps_newlines() {
        TokenPreprocessor::with_newlines()
    } else {
        TokenPreprocessor::new()
    };
    let spans = preprocessor.process(spans);
    let tokens: Vec<Token> = spans.iter().map(|span| span.token.clone()).collect();
    frontend
        .parse(&tokens)
        .map_err(|err| Error::Parse(locate(&spans, err)))
}

/// Drives a parser over the full token slice; trailing unconsumed tokens are
/// a syntax error, not a silent truncation.
pub(crate) fn run_parser(
    parser: &dyn Parser<Token, Vec<Op>>,
    tokens: &[Token],
) -> std::result::Result<Program, ParseError> {
    let (pos, ops) = parser.parse(tokens, 0)?;
    if pos < tokens.len() {
        return Err(ParseError::Mismatch {
            expected: "statement".to_string(),
            found: tokens[pos].to_string(),
            position: pos,
        });
    }
    Ok(Program::new(ops))
}

fn locate(spans: &[TokenSpan], err: ParseError) -> SyntaxError {
    let position = err.position().unwrap_or(spans.len());
    let (line, column) = spans
        .get(position)
        .or_else(|| spans.last())
        .map(|span| (span.line, span.column))
        .unwrap_or((1, 1));
    SyntaxError {
        line,
        column,
        message: err.to_string(),
    }
}

/// Raw source text to fall back to when a value expression fails to resolve
/// at run time (color names, unset memory keys). Anything structured stays
/// strict.
pub(crate) fn fallback_of(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Variable(name) => Some(name.clone()),
        Expr::Text(text) => Some(text.clone()),
        _ => None,
    }
}

/// What a run produced: a newline-joined text buffer, or shape records for
/// the graphics language.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Output {
    Text(String),
    Shapes(Vec<Shape>),
}

impl Output {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Output::Text(text) => Some(text),
            Output::Shapes(_) => None,
        }
    }
}

/// Compile-and-execute facade. Owns the durable-memory and table-source
/// collaborators so the execution context can stay free of file I/O.
pub struct Engine {
    memory: Box<dyn MemoryStore>,
    tables: Box<dyn TableSource>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            memory: Box::new(InMemoryStore::new()),
            tables: Box::new(JsonFileTables::new(None)),
        }
    }

    pub fn with_collaborators(memory: Box<dyn MemoryStore>, tables: Box<dyn TableSource>) -> Self {
        Self { memory, tables }
    }

    /// Runs a program start to finish. On failure the accumulated output is
    /// discarded; the caller sees either a complete output or the error.
    #[tracing::instrument(level = "info", skip(self, source), fields(language = %language))]
    pub fn run(&mut self, language: Language, source: &str) -> Result<Output> {
        let program = compile(language, source)?;
        let mut ctx = ExecutionContext::new();
        ctx.memory = Some(self.memory.as_mut());
        ctx.table_source = Some(self.tables.as_ref());
        Evaluator::new().run(&program, &mut ctx)?;
        Ok(match language {
            Language::Sketch => Output::Shapes(ctx.shapes),
            _ => Output::Text(ctx.rendered_output()),
        })
    }
}
