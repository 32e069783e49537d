use thiserror::Error;

use super::context::ExecutionContext;
use super::statement::OpEvaluator;
use crate::ast::Program;
use crate::memory::MemoryError;
use crate::units::UnitError;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("invalid arguments for {function}: {message}")]
    InvalidArguments { function: String, message: String },
    #[error("value is not numeric: {value}")]
    NotNumeric { value: String },
    #[error("memory store failure: {0}")]
    Memory(#[from] MemoryError),
    #[error("no memory store configured")]
    NoMemoryStore,
    #[error("no table source configured")]
    NoTableSource,
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Runs the retained top-level operation list strictly in order, once. The
/// first failure aborts the run; the caller sees either the full output or
/// the error, never both.
#[derive(Debug, Default)]
pub struct Evaluator {
    ops: OpEvaluator,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    #[tracing::instrument(level = "debug", skip_all, fields(ops = program.len()))]
    pub fn run(&self, program: &Program, ctx: &mut ExecutionContext) -> EvalResult<()> {
        for op in &program.ops {
            self.ops.eval_op(op, ctx)?;
        }
        Ok(())
    }
}
