use core::fmt;

use serde::{Deserialize, Serialize};

use super::context::ExecutionContext;
use super::evaluator::{EvalError, EvalResult};
use crate::ast::{BinaryOp, CompareOp, Expr, UnaryOp};

/// Closed value type flowing through the variable map: a scalar, a piece of
/// text, a list, or the sentinel for a name that was never set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    List(Vec<Value>),
    #[default]
    Undefined,
}

impl Value {
    /// Numeric view. Text that parses as a number counts, so a value stored
    /// as a literal can still feed arithmetic.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Undefined => write!(f, "undefined"),
        }
    }
}

/// Whole numbers print without a fractional part: `15`, not `15.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Ordering comparisons require numbers; equality falls back to the
/// rendered text form, which is how the surface languages compare words.
pub fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    if let (Some(lhs), Some(rhs)) = (left.as_number(), right.as_number()) {
        return match op {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
        };
    }
    match op {
        CompareOp::Eq => left.to_string() == right.to_string(),
        CompareOp::Ne => left.to_string() != right.to_string(),
        _ => false,
    }
}

#[derive(Debug, Default)]
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn eval(&self, expr: &Expr, ctx: &ExecutionContext) -> EvalResult<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::Variable(name) => self.eval_variable(name, ctx),
            Expr::Unary { op, operand } => {
                let value = self.eval_numeric(operand, ctx)?;
                match op {
                    UnaryOp::Neg => Ok(Value::Number(-value)),
                }
            }
            Expr::Binary { op, left, right } => {
                let lhs = self.eval_numeric(left, ctx)?;
                let rhs = self.eval_numeric(right, ctx)?;
                self.eval_binary(*op, lhs, rhs)
            }
            Expr::Compare { op, left, right } => {
                let lhs = self.eval(left, ctx)?;
                let rhs = self.eval(right, ctx)?;
                Ok(Value::Number(if compare(*op, &lhs, &rhs) {
                    1.0
                } else {
                    0.0
                }))
            }
            Expr::Call {
                function,
                arguments,
            } => {
                let args = arguments
                    .iter()
                    .map(|arg| self.eval_numeric(arg, ctx))
                    .collect::<EvalResult<Vec<f64>>>()?;
                self.eval_builtin(function, &args)
            }
        }
    }

    /// Evaluates and requires a numeric result; the arithmetic contexts
    /// (draw coordinates, transforms, binary operands) go through here.
    pub fn eval_numeric(&self, expr: &Expr, ctx: &ExecutionContext) -> EvalResult<f64> {
        let value = self.eval(expr, ctx)?;
        value.as_number().ok_or_else(|| EvalError::NotNumeric {
            value: value.to_string(),
        })
    }

    fn eval_variable(&self, name: &str, ctx: &ExecutionContext) -> EvalResult<Value> {
        if let Some(value) = ctx.variables.get(name) {
            return Ok(value.clone());
        }
        match name {
            "pi" => Ok(Value::Number(std::f64::consts::PI)),
            "e" => Ok(Value::Number(std::f64::consts::E)),
            _ => Err(EvalError::UndefinedVariable(name.to_string())),
        }
    }

    fn eval_binary(&self, op: BinaryOp, lhs: f64, rhs: f64) -> EvalResult<Value> {
        let result = match op {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div | BinaryOp::Mod if rhs == 0.0 => return Err(EvalError::DivisionByZero),
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Mod => lhs % rhs,
            BinaryOp::Pow => lhs.powf(rhs),
        };
        Ok(Value::Number(result))
    }

    fn eval_builtin(&self, function: &str, args: &[f64]) -> EvalResult<Value> {
        let unary = |f: fn(f64) -> f64| -> EvalResult<Value> {
            match args {
                [x] => Ok(Value::Number(f(*x))),
                _ => Err(EvalError::InvalidArguments {
                    function: function.to_string(),
                    message: format!("expected 1 argument, got {}", args.len()),
                }),
            }
        };

        match function {
            "sin" => unary(f64::sin),
            "cos" => unary(f64::cos),
            "tan" => unary(f64::tan),
            "asin" => unary(f64::asin),
            "acos" => unary(f64::acos),
            "atan" => unary(f64::atan),
            "sqrt" => unary(f64::sqrt),
            "abs" => unary(f64::abs),
            "log" => unary(f64::ln),
            "log10" => unary(f64::log10),
            "exp" => unary(f64::exp),
            "floor" => unary(f64::floor),
            "ceil" => unary(f64::ceil),
            "round" => unary(f64::round),
            "min" | "max" => {
                if args.is_empty() {
                    return Err(EvalError::InvalidArguments {
                        function: function.to_string(),
                        message: "expected at least 1 argument".to_string(),
                    });
                }
                let folded = args.iter().copied().fold(
                    if function == "min" {
                        f64::INFINITY
                    } else {
                        f64::NEG_INFINITY
                    },
                    if function == "min" { f64::min } else { f64::max },
                );
                Ok(Value::Number(folded))
            }
            "pow" => match args {
                [x, y] => Ok(Value::Number(x.powf(*y))),
                _ => Err(EvalError::InvalidArguments {
                    function: function.to_string(),
                    message: format!("expected 2 arguments, got {}", args.len()),
                }),
            },
            _ => Err(EvalError::UnknownFunction(function.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &Expr) -> EvalResult<Value> {
        ExpressionEvaluator::new().eval(expr, &ExecutionContext::new())
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_arithmetic() {
        let expr = binary(
            BinaryOp::Add,
            Expr::Number(5.0),
            binary(BinaryOp::Mul, Expr::Number(2.0), Expr::Number(3.0)),
        );
        assert_eq!(eval(&expr).unwrap(), Value::Number(11.0));
    }

    #[test]
    fn test_division_by_zero() {
        let expr = binary(BinaryOp::Div, Expr::Number(1.0), Expr::Number(0.0));
        assert!(matches!(eval(&expr), Err(EvalError::DivisionByZero)));
    }

    #[test]
    fn test_undefined_variable_is_fatal() {
        assert!(matches!(
            eval(&Expr::Variable("ghost".into())),
            Err(EvalError::UndefinedVariable(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_constants() {
        match eval(&Expr::Variable("pi".into())).unwrap() {
            Value::Number(n) => assert!((n - std::f64::consts::PI).abs() < 1e-12),
            other => panic!("expected number, got {:?}", other),
        }
    }

    #[test]
    fn test_variadic_max() {
        let expr = Expr::Call {
            function: "max".into(),
            arguments: vec![Expr::Number(1.0), Expr::Number(5.0), Expr::Number(3.0)],
        };
        assert_eq!(eval(&expr).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn test_unknown_function() {
        let expr = Expr::Call {
            function: "frobnicate".into(),
            arguments: vec![],
        };
        assert!(matches!(
            eval(&expr),
            Err(EvalError::UnknownFunction(name)) if name == "frobnicate"
        ));
    }

    #[test]
    fn test_comparison_yields_scalar() {
        let expr = Expr::Compare {
            op: CompareOp::Lt,
            left: Box::new(Expr::Number(1.0)),
            right: Box::new(Expr::Number(2.0)),
        };
        assert_eq!(eval(&expr).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_text_equality() {
        assert!(compare(
            CompareOp::Eq,
            &Value::Text("happy".into()),
            &Value::Text("happy".into())
        ));
        assert!(!compare(
            CompareOp::Lt,
            &Value::Text("happy".into()),
            &Value::Text("sad".into())
        ));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(15.0), "15");
        assert_eq!(format_number(77.7), "77.7");
        assert_eq!(format_number(-2.0), "-2");
    }
}
