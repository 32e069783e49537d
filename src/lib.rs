//! A family of five small languages sharing one compile-and-execute engine:
//! a unit-conversion calculator, a text-templating language, a vector
//! graphics language, a line-oriented arithmetic language, and a toy query
//! language. Source is tokenized once by a shared lexer, compiled by a
//! per-language grammar into a tree of deferred operations, and executed
//! against a mutable context.

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod error;
pub mod eval;
pub mod lang;
pub mod memory;
pub mod task;
pub mod tokenizer;
pub mod units;

// Re-exports
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use lang::{compile, Engine, Language, Output};
