use std::collections::HashMap;

use serde::Serialize;

use super::expression::{format_number, Value};
use crate::ast::{Op, ShapeKind};
use crate::memory::{MemoryStore, Row, TableSource};
use crate::units::UnitGraph;

/// A registered routine body. Immutable once defined; invocation binds the
/// formals to call-time arguments under save/restore scoping.
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    pub params: Vec<String>,
    pub body: Vec<Op>,
}

/// The composable 2-D transform state. Rotation and translation accumulate
/// additively, scale multiplicatively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

/// One drawn shape, recorded with the transform in effect at draw time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: String,
    pub rotation: f64,
    pub transform: Transform,
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}(x={}, y={}, size={}, color={}, rotation={})",
            self.kind,
            format_number(self.x),
            format_number(self.y),
            format_number(self.size),
            self.color,
            format_number(self.rotation),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawAttrs {
    pub color: String,
    pub size: f64,
}

impl Default for DrawAttrs {
    fn default() -> Self {
        Self {
            color: "black".to_string(),
            size: 10.0,
        }
    }
}

/// The mutable state threaded through one program run. Exactly one context
/// exists per run; it is created fresh and never shared.
#[derive(Default)]
pub struct ExecutionContext<'a> {
    pub variables: HashMap<String, Value>,
    pub routines: HashMap<String, Routine>,
    pub output: Vec<String>,
    pub shapes: Vec<Shape>,
    pub attrs: DrawAttrs,
    pub transform: Transform,
    pub transform_stack: Vec<Transform>,
    pub units: UnitGraph,
    pub tables: HashMap<String, Vec<Row>>,
    pub selection: Vec<Row>,
    pub memory: Option<&'a mut dyn MemoryStore>,
    pub table_source: Option<&'a dyn TableSource>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory(memory: &'a mut dyn MemoryStore) -> Self {
        Self {
            memory: Some(memory),
            ..Self::default()
        }
    }

    pub fn get_var(&self, name: &str) -> Value {
        self.variables.get(name).cloned().unwrap_or_default()
    }

    pub fn set_var(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    /// Value-copy of the variable map, taken around routine invocation so
    /// callee writes are fully discarded on restore.
    pub fn save_variables(&self) -> HashMap<String, Value> {
        self.variables.clone()
    }

    pub fn restore_variables(&mut self, saved: HashMap<String, Value>) {
        self.variables = saved;
    }

    pub fn push_output(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    pub fn rendered_output(&self) -> String {
        self.output.join("\n")
    }
}
