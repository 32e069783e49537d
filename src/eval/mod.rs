pub mod context;
pub mod evaluator;
pub mod expression;
pub mod statement;

pub use context::{ExecutionContext, Shape, Transform};
pub use evaluator::{EvalError, EvalResult, Evaluator};
pub use expression::{format_number, Value};
