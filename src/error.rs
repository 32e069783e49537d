use thiserror::Error;

use crate::eval::evaluator::EvalError;
use crate::lang::SyntaxError;
use crate::memory::MemoryError;
use crate::task::TaskError;
use crate::tokenizer::token::TokenizeError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Tokenize error: {0}")]
    Tokenize(#[from] TokenizeError),
    #[error("Parse error: {0}")]
    Parse(#[from] SyntaxError),
    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
    #[error("Task error: {0}")]
    Task(#[from] TaskError),
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }
}
