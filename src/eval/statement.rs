use std::cmp::Ordering;

use serde_json::Value as JsonValue;
use tracing::debug;

use super::context::{ExecutionContext, Routine, Shape};
use super::evaluator::{EvalError, EvalResult};
use super::expression::{compare, format_number, ExpressionEvaluator, Value};
use crate::ast::{Condition, Expr, MissingCall, Op, ShapeKind};
use crate::memory::{value_from_json, Row};

/// Evaluates a single retained operation against the execution context.
/// Control-flow operations recurse into their bodies through `eval_op`, so
/// the whole tree shares one entry point.
#[derive(Debug, Default)]
pub struct OpEvaluator {
    exprs: ExpressionEvaluator,
}

impl OpEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eval_op(&self, op: &Op, ctx: &mut ExecutionContext) -> EvalResult<()> {
        match op {
            Op::Repeat { count, body } => self.eval_repeat(*count, body, ctx),
            Op::If {
                condition,
                then_body,
                else_body,
            } => self.eval_if(condition, then_body, else_body, ctx),
            Op::Assign {
                name,
                value,
                fallback,
                echo,
            } => self.eval_assign(name, value, fallback.as_deref(), *echo, ctx),
            Op::DefineRoutine { name, params, body } => {
                ctx.routines.insert(
                    name.clone(),
                    Routine {
                        params: params.clone(),
                        body: body.clone(),
                    },
                );
                Ok(())
            }
            Op::CallRoutine {
                name,
                arguments,
                missing,
            } => self.eval_call(name, arguments, *missing, ctx),
            Op::Say(text) => {
                let value = self.eval_lenient(text, ctx);
                ctx.push_output(value.to_string());
                Ok(())
            }
            Op::Remember {
                key,
                value,
                fallback,
            } => self.eval_remember(key, value, fallback.as_deref(), ctx),
            Op::Recall { key } => self.eval_recall(key, ctx),
            Op::ListCreate { name, items } => {
                let values: Vec<Value> =
                    items.iter().map(|item| self.eval_lenient(item, ctx)).collect();
                ctx.set_var(name, Value::List(values));
                Ok(())
            }
            Op::ListAppend { name, value } => self.eval_list_append(name, value, ctx),
            Op::ListGet {
                name,
                index,
                target,
            } => self.eval_list_get(name, index, target, ctx),
            Op::Length { name, target } => {
                let len = match ctx.get_var(name) {
                    Value::List(items) => items.len(),
                    Value::Undefined => 0,
                    other => other.to_string().chars().count(),
                };
                ctx.set_var(target, Value::Number(len as f64));
                Ok(())
            }
            Op::Foreach { var, list, body } => self.eval_foreach(var, list, body, ctx),
            Op::SetAttr {
                name,
                value,
                fallback,
            } => self.eval_set_attr(name, value, fallback.as_deref(), ctx),
            Op::Draw { shape, args } => self.eval_draw(*shape, args, ctx),
            Op::Rotate(expr) => {
                let degrees = self.exprs.eval_numeric(expr, ctx)?;
                ctx.transform.rotation += degrees;
                Ok(())
            }
            Op::Scale { x, y } => {
                let sx = self.exprs.eval_numeric(x, ctx)?;
                let sy = match y {
                    Some(expr) => self.exprs.eval_numeric(expr, ctx)?,
                    None => sx,
                };
                ctx.transform.scale_x *= sx;
                ctx.transform.scale_y *= sy;
                Ok(())
            }
            Op::Translate { x, y } => {
                let dx = self.exprs.eval_numeric(x, ctx)?;
                let dy = self.exprs.eval_numeric(y, ctx)?;
                ctx.transform.translate_x += dx;
                ctx.transform.translate_y += dy;
                Ok(())
            }
            Op::Push => {
                ctx.transform_stack.push(ctx.transform);
                Ok(())
            }
            Op::Pop => {
                if let Some(restored) = ctx.transform_stack.pop() {
                    ctx.transform = restored;
                }
                Ok(())
            }
            Op::DefineUnit {
                lhs_amount,
                lhs_unit,
                rhs_amount,
                rhs_unit,
            } => {
                ctx.units.define(*lhs_amount, lhs_unit, *rhs_amount, rhs_unit);
                Ok(())
            }
            Op::BaseUnit(unit) => {
                ctx.units.set_base(unit);
                Ok(())
            }
            Op::Convert { amount, from, to } => {
                let converted = ctx.units.convert(*amount, from, to)?;
                ctx.push_output(format!("{} {}", format_number(converted), to));
                Ok(())
            }
            Op::Compute { expr, target } => {
                let (amount, unit) = ctx.units.eval_quantity(expr)?;
                let converted = match unit {
                    Some(unit) => ctx.units.convert(amount, &unit, target)?,
                    None => amount,
                };
                ctx.push_output(format!("{} {}", format_number(converted), target));
                Ok(())
            }
            Op::ShowUnits => {
                ctx.push_output(format!("Units: {}", ctx.units.units().join(", ")));
                Ok(())
            }
            Op::Eval(expr) => {
                let value = self.exprs.eval(expr, ctx)?;
                ctx.push_output(value.to_string());
                Ok(())
            }
            Op::ShowVar(name) => {
                let value = ctx
                    .variables
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::UndefinedVariable(name.clone()))?;
                ctx.push_output(format!("{} = {}", name, value));
                Ok(())
            }
            Op::Load { table, path } => self.eval_load(table, path, ctx),
            Op::Filter {
                table,
                field,
                op,
                value,
            } => self.eval_filter(table, field, *op, value, ctx),
            Op::Select { fields } => self.eval_select(fields, ctx),
            Op::Sort { field, descending } => self.eval_sort(field, *descending, ctx),
            Op::Limit(count) => {
                ctx.selection.truncate(*count);
                ctx.push_output(format!("Limited to {} rows", count));
                Ok(())
            }
            Op::Join {
                table,
                left_key,
                right_key,
            } => self.eval_join(table, left_key, right_key, ctx),
            Op::ShowTables => {
                let mut names: Vec<&str> = ctx.tables.keys().map(String::as_str).collect();
                names.sort_unstable();
                ctx.push_output(format!("Tables: {}", names.join(", ")));
                Ok(())
            }
        }
    }

    fn eval_body(&self, body: &[Op], ctx: &mut ExecutionContext) -> EvalResult<()> {
        for op in body {
            self.eval_op(op, ctx)?;
        }
        Ok(())
    }

    fn eval_repeat(&self, count: usize, body: &[Op], ctx: &mut ExecutionContext) -> EvalResult<()> {
        for index in 0..count {
            ctx.set_var("i", Value::Number(index as f64));
            self.eval_body(body, ctx)?;
        }
        Ok(())
    }

    fn eval_if(
        &self,
        condition: &Condition,
        then_body: &[Op],
        else_body: &[Op],
        ctx: &mut ExecutionContext,
    ) -> EvalResult<()> {
        let left = if let Some(value) = ctx.variables.get(&condition.name) {
            value.clone()
        } else {
            match condition.name.as_str() {
                "color" => Value::Text(ctx.attrs.color.clone()),
                "size" => Value::Number(ctx.attrs.size),
                _ => Value::Undefined,
            }
        };
        let right = self.eval_lenient(&condition.value, ctx);
        if compare(condition.op, &left, &right) {
            self.eval_body(then_body, ctx)
        } else {
            self.eval_body(else_body, ctx)
        }
    }

    /// Values in soft positions (condition operands, routine arguments) fall
    /// back to the bare word itself when they do not resolve.
    fn eval_lenient(&self, expr: &Expr, ctx: &ExecutionContext) -> Value {
        match self.exprs.eval(expr, ctx) {
            Ok(value) => value,
            Err(_) => match expr {
                Expr::Variable(name) => Value::Text(name.clone()),
                _ => Value::Undefined,
            },
        }
    }

    /// Evaluates a value expression, degrading to the raw source text when a
    /// fallback literal was retained at compile time.
    fn eval_with_fallback(
        &self,
        expr: &Expr,
        fallback: Option<&str>,
        ctx: &ExecutionContext,
    ) -> EvalResult<Value> {
        match self.exprs.eval(expr, ctx) {
            Ok(value) => Ok(value),
            Err(err) => match fallback {
                Some(raw) => Ok(Value::Text(raw.to_string())),
                None => Err(err),
            },
        }
    }

    fn eval_assign(
        &self,
        name: &str,
        value: &Expr,
        fallback: Option<&str>,
        echo: bool,
        ctx: &mut ExecutionContext,
    ) -> EvalResult<()> {
        let value = self.eval_with_fallback(value, fallback, ctx)?;
        ctx.set_var(name, value.clone());
        if echo {
            ctx.push_output(format!("{} = {}", name, value));
        }
        Ok(())
    }

    fn eval_call(
        &self,
        name: &str,
        arguments: &[Expr],
        missing: MissingCall,
        ctx: &mut ExecutionContext,
    ) -> EvalResult<()> {
        let Some(routine) = ctx.routines.get(name).cloned() else {
            match missing {
                MissingCall::Report => ctx.push_output(format!("[Unknown task: {}]", name)),
                MissingCall::Ignore => debug!(name, "call to unknown routine ignored"),
            }
            return Ok(());
        };
        let args: Vec<Value> = arguments
            .iter()
            .map(|arg| self.eval_lenient(arg, ctx))
            .collect();
        let saved = ctx.save_variables();
        for (param, arg) in routine.params.iter().zip(args) {
            ctx.set_var(param, arg);
        }
        let result = self.eval_body(&routine.body, ctx);
        ctx.restore_variables(saved);
        result
    }

    fn eval_remember(
        &self,
        key: &str,
        value: &Expr,
        fallback: Option<&str>,
        ctx: &mut ExecutionContext,
    ) -> EvalResult<()> {
        let value = self.eval_with_fallback(value, fallback, ctx)?;
        match ctx.memory.as_mut() {
            Some(store) => store.set(key, value)?,
            None => return Err(EvalError::NoMemoryStore),
        }
        Ok(())
    }

    fn eval_recall(&self, key: &str, ctx: &mut ExecutionContext) -> EvalResult<()> {
        let store = ctx.memory.as_ref().ok_or(EvalError::NoMemoryStore)?;
        let line = match store.get(key) {
            Some(value) => value.to_string(),
            None => format!("[undefined:{}]", key),
        };
        ctx.push_output(line);
        Ok(())
    }

    fn eval_list_append(
        &self,
        name: &str,
        value: &Expr,
        ctx: &mut ExecutionContext,
    ) -> EvalResult<()> {
        let value = self.eval_lenient(value, ctx);
        // A scalar under the name becomes the first element; unset starts empty.
        let mut items = match ctx.get_var(name) {
            Value::List(items) => items,
            Value::Undefined => Vec::new(),
            other => vec![other],
        };
        items.push(value);
        ctx.set_var(name, Value::List(items));
        Ok(())
    }

    fn eval_list_get(
        &self,
        name: &str,
        index: &Expr,
        target: &str,
        ctx: &mut ExecutionContext,
    ) -> EvalResult<()> {
        let index = self.exprs.eval_numeric(index, ctx)?;
        let value = match ctx.get_var(name) {
            Value::List(items) if index >= 0.0 => {
                items.get(index as usize).cloned().unwrap_or_default()
            }
            _ => Value::Undefined,
        };
        ctx.set_var(target, value);
        Ok(())
    }

    fn eval_foreach(
        &self,
        var: &str,
        list: &str,
        body: &[Op],
        ctx: &mut ExecutionContext,
    ) -> EvalResult<()> {
        let Value::List(items) = ctx.get_var(list) else {
            return Ok(());
        };
        for item in items {
            ctx.set_var(var, item);
            self.eval_body(body, ctx)?;
        }
        Ok(())
    }

    fn eval_set_attr(
        &self,
        name: &str,
        value: &Expr,
        fallback: Option<&str>,
        ctx: &mut ExecutionContext,
    ) -> EvalResult<()> {
        let value = self.eval_with_fallback(value, fallback, ctx)?;
        match name {
            "size" => {
                // Non-numeric sizes are dropped rather than poisoning the pen.
                if let Some(size) = value.as_number() {
                    ctx.attrs.size = size;
                }
            }
            "color" => ctx.attrs.color = value.to_string(),
            _ => ctx.set_var(name, value),
        }
        Ok(())
    }

    fn eval_draw(
        &self,
        shape: ShapeKind,
        args: &[(String, Expr)],
        ctx: &mut ExecutionContext,
    ) -> EvalResult<()> {
        let mut x = 0.0;
        let mut y = 0.0;
        for (key, expr) in args {
            let value = self.exprs.eval_numeric(expr, ctx)?;
            match key.as_str() {
                "x" => x = value,
                "y" => y = value,
                other => debug!(shape = %shape, arg = other, "ignoring unknown draw argument"),
            }
        }
        let transform = ctx.transform;
        ctx.shapes.push(Shape {
            kind: shape,
            x: x * transform.scale_x + transform.translate_x,
            y: y * transform.scale_y + transform.translate_y,
            size: ctx.attrs.size,
            color: ctx.attrs.color.clone(),
            rotation: transform.rotation,
            transform,
        });
        Ok(())
    }

    fn eval_load(&self, table: &str, path: &str, ctx: &mut ExecutionContext) -> EvalResult<()> {
        let source = ctx.table_source.ok_or(EvalError::NoTableSource)?;
        // An unreadable file degrades to an output line, like a missing table.
        let rows = match source.load(path) {
            Ok(rows) => rows,
            Err(err) => {
                ctx.push_output(format!("Error loading {}: {}", path, err));
                return Ok(());
            }
        };
        ctx.push_output(format!("Loaded {} rows into {}", rows.len(), table));
        ctx.selection = rows.clone();
        ctx.tables.insert(table.to_string(), rows);
        Ok(())
    }

    fn eval_filter(
        &self,
        table: &str,
        field: &str,
        op: crate::ast::CompareOp,
        value: &Expr,
        ctx: &mut ExecutionContext,
    ) -> EvalResult<()> {
        let Some(rows) = ctx.tables.get(table) else {
            ctx.push_output(format!("Error: Table {} not found", table));
            return Ok(());
        };
        let needle = self.eval_lenient(value, ctx);
        let filtered: Vec<Row> = rows
            .iter()
            .filter(|row| {
                row.get(field)
                    .map(|cell| compare(op, &value_from_json(cell), &needle))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        ctx.push_output(format!("Filtered to {} rows", filtered.len()));
        ctx.selection = filtered;
        Ok(())
    }

    fn eval_select(&self, fields: &[String], ctx: &mut ExecutionContext) -> EvalResult<()> {
        let selected: Vec<Row> = ctx
            .selection
            .iter()
            .map(|row| {
                fields
                    .iter()
                    .filter_map(|field| row.get(field).map(|cell| (field.clone(), cell.clone())))
                    .collect()
            })
            .collect();
        // Pretty output is infallible for plain maps; surface the line anyway.
        let rendered = serde_json::to_string_pretty(&selected).unwrap_or_else(|_| "[]".to_string());
        ctx.push_output(rendered);
        ctx.selection = selected;
        Ok(())
    }

    fn eval_sort(&self, field: &str, descending: bool, ctx: &mut ExecutionContext) -> EvalResult<()> {
        ctx.selection
            .sort_by(|a, b| compare_cells(a.get(field), b.get(field)));
        if descending {
            ctx.selection.reverse();
        }
        ctx.push_output(format!(
            "Sorted by {} {}",
            field,
            if descending { "desc" } else { "asc" }
        ));
        Ok(())
    }

    fn eval_join(
        &self,
        table: &str,
        left_key: &str,
        right_key: &str,
        ctx: &mut ExecutionContext,
    ) -> EvalResult<()> {
        let Some(right_rows) = ctx.tables.get(table) else {
            ctx.push_output(format!("Error: Table {} not found", table));
            return Ok(());
        };
        let mut joined = Vec::new();
        for left in &ctx.selection {
            let Some(key) = left.get(left_key) else {
                continue;
            };
            for right in right_rows {
                if right.get(right_key) == Some(key) {
                    let mut merged = left.clone();
                    for (field, cell) in right {
                        merged.entry(field.clone()).or_insert_with(|| cell.clone());
                    }
                    joined.push(merged);
                }
            }
        }
        ctx.push_output(format!(
            "Joined with {} on {} = {}, {} rows",
            table,
            left_key,
            right_key,
            joined.len()
        ));
        ctx.selection = joined;
        Ok(())
    }
}

/// Stable ordering for table cells: numbers before their textual compare,
/// mismatched kinds stay where they are.
fn compare_cells(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(a)), Some(JsonValue::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::String(a)), Some(JsonValue::String(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, CompareOp};
    use crate::memory::InMemoryStore;
    use pretty_assertions::assert_eq;

    fn run(ops: &[Op], ctx: &mut ExecutionContext) {
        let evaluator = OpEvaluator::new();
        for op in ops {
            evaluator.eval_op(op, ctx).unwrap();
        }
    }

    fn assign(name: &str, value: f64) -> Op {
        Op::Assign {
            name: name.into(),
            value: Expr::Number(value),
            fallback: None,
            echo: false,
        }
    }

    #[test]
    fn test_repeat_binds_loop_counter() {
        let mut ctx = ExecutionContext::new();
        let ops = [Op::Repeat {
            count: 3,
            body: vec![Op::Assign {
                name: "last".into(),
                value: Expr::Variable("i".into()),
                fallback: None,
                echo: false,
            }],
        }];
        run(&ops, &mut ctx);
        assert_eq!(ctx.get_var("last"), Value::Number(2.0));
        // The counter survives the loop with its final value.
        assert_eq!(ctx.get_var("i"), Value::Number(2.0));
    }

    #[test]
    fn test_loop_body_failure_aborts_midway() {
        let mut ctx = ExecutionContext::new();
        let op = Op::Repeat {
            count: 5,
            body: vec![Op::Eval(Expr::Binary {
                op: BinaryOp::Div,
                left: Box::new(Expr::Number(1.0)),
                right: Box::new(Expr::Variable("i".into())),
            })],
        };
        let err = OpEvaluator::new().eval_op(&op, &mut ctx).unwrap_err();
        assert!(matches!(err, EvalError::DivisionByZero));
    }

    #[test]
    fn test_if_reads_variables_then_attrs() {
        let mut ctx = ExecutionContext::new();
        ctx.attrs.color = "red".into();
        let ops = [Op::If {
            condition: Condition {
                name: "color".into(),
                op: CompareOp::Eq,
                value: Expr::Variable("red".into()),
            },
            then_body: vec![assign("hit", 1.0)],
            else_body: vec![assign("hit", 0.0)],
        }];
        run(&ops, &mut ctx);
        assert_eq!(ctx.get_var("hit"), Value::Number(1.0));
    }

    #[test]
    fn test_routine_call_restores_caller_scope() {
        let mut ctx = ExecutionContext::new();
        let ops = [
            assign("x", 1.0),
            Op::DefineRoutine {
                name: "bump".into(),
                params: vec!["x".into()],
                body: vec![assign("x", 99.0), assign("y", 7.0)],
            },
            Op::CallRoutine {
                name: "bump".into(),
                arguments: vec![Expr::Number(5.0)],
                missing: MissingCall::Report,
            },
        ];
        run(&ops, &mut ctx);
        assert_eq!(ctx.get_var("x"), Value::Number(1.0));
        assert_eq!(ctx.get_var("y"), Value::Undefined);
    }

    #[test]
    fn test_unknown_routine_reports_or_ignores() {
        let mut ctx = ExecutionContext::new();
        let ops = [
            Op::CallRoutine {
                name: "ghost".into(),
                arguments: vec![],
                missing: MissingCall::Report,
            },
            Op::CallRoutine {
                name: "ghost".into(),
                arguments: vec![],
                missing: MissingCall::Ignore,
            },
        ];
        run(&ops, &mut ctx);
        assert_eq!(ctx.output, vec!["[Unknown task: ghost]".to_string()]);
    }

    #[test]
    fn test_recall_unset_key_prints_sentinel() {
        let mut store = InMemoryStore::new();
        let mut ctx = ExecutionContext::with_memory(&mut store);
        let ops = [
            Op::Remember {
                key: "mood".into(),
                value: Expr::Variable("happy".into()),
                fallback: Some("happy".into()),
            },
            Op::Recall { key: "mood".into() },
            Op::Recall {
                key: "missing".into(),
            },
        ];
        run(&ops, &mut ctx);
        assert_eq!(
            ctx.output,
            vec!["happy".to_string(), "[undefined:missing]".to_string()]
        );
    }

    #[test]
    fn test_foreach_speaks_each_item() {
        let mut ctx = ExecutionContext::new();
        let ops = [
            Op::ListCreate {
                name: "colors".into(),
                items: vec![Expr::Text("red".into()), Expr::Text("green".into())],
            },
            Op::Foreach {
                var: "c".into(),
                list: "colors".into(),
                body: vec![Op::Say(Expr::Variable("c".into()))],
            },
        ];
        run(&ops, &mut ctx);
        assert_eq!(ctx.output, vec!["red".to_string(), "green".to_string()]);
    }

    #[test]
    fn test_foreach_over_non_list_is_noop() {
        let mut ctx = ExecutionContext::new();
        ctx.set_var("n", Value::Number(3.0));
        let op = Op::Foreach {
            var: "x".into(),
            list: "n".into(),
            body: vec![Op::Say(Expr::Variable("x".into()))],
        };
        run(&[op], &mut ctx);
        assert!(ctx.output.is_empty());
    }

    #[test]
    fn test_append_wraps_scalar_then_grows() {
        let mut ctx = ExecutionContext::new();
        ctx.set_var("items", Value::Text("a".into()));
        let ops = [
            Op::ListAppend {
                name: "items".into(),
                value: Expr::Text("b".into()),
            },
            Op::ListAppend {
                name: "items".into(),
                value: Expr::Number(3.0),
            },
        ];
        run(&ops, &mut ctx);
        assert_eq!(
            ctx.get_var("items"),
            Value::List(vec![
                Value::Text("a".into()),
                Value::Text("b".into()),
                Value::Number(3.0),
            ])
        );
    }

    #[test]
    fn test_list_get_out_of_range_leaves_target_unset() {
        let mut ctx = ExecutionContext::new();
        let ops = [
            Op::ListCreate {
                name: "items".into(),
                items: vec![Expr::Text("a".into())],
            },
            Op::ListGet {
                name: "items".into(),
                index: Expr::Number(0.0),
                target: "first".into(),
            },
            Op::ListGet {
                name: "items".into(),
                index: Expr::Number(5.0),
                target: "missing".into(),
            },
        ];
        run(&ops, &mut ctx);
        assert_eq!(ctx.get_var("first"), Value::Text("a".into()));
        assert_eq!(ctx.get_var("missing"), Value::Undefined);
    }

    #[test]
    fn test_length_counts_elements_or_chars() {
        let mut ctx = ExecutionContext::new();
        ctx.set_var("word", Value::Text("hello".into()));
        ctx.set_var("pair", Value::List(vec![Value::Number(1.0), Value::Number(2.0)]));
        let ops = [
            Op::Length {
                name: "word".into(),
                target: "wl".into(),
            },
            Op::Length {
                name: "pair".into(),
                target: "pl".into(),
            },
            Op::Length {
                name: "ghost".into(),
                target: "gl".into(),
            },
        ];
        run(&ops, &mut ctx);
        assert_eq!(ctx.get_var("wl"), Value::Number(5.0));
        assert_eq!(ctx.get_var("pl"), Value::Number(2.0));
        assert_eq!(ctx.get_var("gl"), Value::Number(0.0));
    }

    #[test]
    fn test_draw_applies_scale_then_translate() {
        let mut ctx = ExecutionContext::new();
        let ops = [
            Op::Scale {
                x: Expr::Number(2.0),
                y: None,
            },
            Op::Translate {
                x: Expr::Number(5.0),
                y: Expr::Number(5.0),
            },
            Op::Draw {
                shape: ShapeKind::Circle,
                args: vec![
                    ("x".into(), Expr::Number(10.0)),
                    ("y".into(), Expr::Number(10.0)),
                ],
            },
        ];
        run(&ops, &mut ctx);
        let shape = &ctx.shapes[0];
        assert_eq!(shape.x, 25.0);
        assert_eq!(shape.y, 25.0);
    }

    #[test]
    fn test_push_pop_restores_transform() {
        let mut ctx = ExecutionContext::new();
        let ops = [
            Op::Rotate(Expr::Number(45.0)),
            Op::Push,
            Op::Rotate(Expr::Number(45.0)),
            Op::Pop,
        ];
        run(&ops, &mut ctx);
        assert_eq!(ctx.transform.rotation, 45.0);
    }

    #[test]
    fn test_pop_on_empty_stack_is_noop() {
        let mut ctx = ExecutionContext::new();
        run(&[Op::Pop], &mut ctx);
        assert_eq!(ctx.transform.rotation, 0.0);
    }

    #[test]
    fn test_convert_renders_amount_and_unit() {
        let mut ctx = ExecutionContext::new();
        let ops = [
            Op::DefineUnit {
                lhs_amount: 1.0,
                lhs_unit: "km".into(),
                rhs_amount: 1000.0,
                rhs_unit: "m".into(),
            },
            Op::Convert {
                amount: 2.5,
                from: "km".into(),
                to: "m".into(),
            },
        ];
        run(&ops, &mut ctx);
        assert_eq!(ctx.output, vec!["2500 m".to_string()]);
    }

    fn row(pairs: &[(&str, JsonValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_filter_and_sort_selection() {
        let mut ctx = ExecutionContext::new();
        ctx.tables.insert(
            "users".into(),
            vec![
                row(&[("name", "bo".into()), ("age", 30.into())]),
                row(&[("name", "al".into()), ("age", 25.into())]),
                row(&[("name", "cy".into()), ("age", 17.into())]),
            ],
        );
        ctx.selection = ctx.tables["users"].clone();
        let ops = [
            Op::Filter {
                table: "users".into(),
                field: "age".into(),
                op: CompareOp::Ge,
                value: Expr::Number(18.0),
            },
            Op::Sort {
                field: "age".into(),
                descending: false,
            },
            Op::Limit(1),
        ];
        run(&ops, &mut ctx);
        assert_eq!(ctx.selection.len(), 1);
        assert_eq!(ctx.selection[0]["name"], JsonValue::from("al"));
        assert_eq!(
            ctx.output,
            vec![
                "Filtered to 2 rows".to_string(),
                "Sorted by age asc".to_string(),
                "Limited to 1 rows".to_string(),
            ]
        );
    }

    #[test]
    fn test_filter_missing_table_degrades() {
        let mut ctx = ExecutionContext::new();
        let ops = [Op::Filter {
            table: "nope".into(),
            field: "x".into(),
            op: CompareOp::Eq,
            value: Expr::Number(1.0),
        }];
        run(&ops, &mut ctx);
        assert_eq!(ctx.output, vec!["Error: Table nope not found".to_string()]);
    }

    #[test]
    fn test_join_is_inner() {
        let mut ctx = ExecutionContext::new();
        ctx.selection = vec![
            row(&[("id", 1.into()), ("name", "al".into())]),
            row(&[("id", 2.into()), ("name", "bo".into())]),
        ];
        ctx.tables.insert(
            "orders".into(),
            vec![
                row(&[("user_id", 1.into()), ("item", "pen".into())]),
                row(&[("user_id", 3.into()), ("item", "ink".into())]),
            ],
        );
        let ops = [Op::Join {
            table: "orders".into(),
            left_key: "id".into(),
            right_key: "user_id".into(),
        }];
        run(&ops, &mut ctx);
        assert_eq!(ctx.selection.len(), 1);
        assert_eq!(ctx.selection[0]["item"], JsonValue::from("pen"));
        assert_eq!(ctx.selection[0]["name"], JsonValue::from("al"));
    }
}
