pub mod combinators;
pub mod core;
pub mod prelude;

pub use core::{ParseError, ParseResult, Parser};
