//! Bidirectional unit-conversion graph with a breadth-first multi-hop solver.

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use crate::ast::{BinaryOp, QuantityExpr};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("unknown unit: {unit}")]
    UnknownUnit { unit: String },
    #[error("unknown unit: {unit} (did you mean '{singular}'? unit names must match exactly)")]
    UnknownUnitPlural { unit: String, singular: String },
    #[error("no conversion path from {from} to {to}")]
    NoConversionPath { from: String, to: String },
    #[error("division by zero in quantity expression")]
    DivisionByZero,
}

/// Adjacency map from unit name to declared conversion factors. Every
/// `define 1 A = k B` inserts A->B with factor k and B->A with factor 1/k,
/// so the graph is symmetric by construction. Neighbor lists keep insertion
/// order, which makes the BFS result deterministic for a fixed declaration
/// order.
#[derive(Debug, Clone, Default)]
pub struct UnitGraph {
    edges: HashMap<String, Vec<(String, f64)>>,
    order: Vec<String>,
    base: Option<String>,
}

impl UnitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, lhs_amount: f64, lhs_unit: &str, rhs_amount: f64, rhs_unit: &str) {
        let forward = rhs_amount / lhs_amount;
        let reverse = lhs_amount / rhs_amount;
        self.insert_edge(lhs_unit, rhs_unit, forward);
        self.insert_edge(rhs_unit, lhs_unit, reverse);
    }

    fn insert_edge(&mut self, from: &str, to: &str, factor: f64) {
        if !self.edges.contains_key(from) {
            self.order.push(from.to_string());
        }
        let neighbors = self.edges.entry(from.to_string()).or_default();
        match neighbors.iter_mut().find(|(name, _)| name == to) {
            Some((_, existing)) => *existing = factor,
            None => neighbors.push((to.to_string(), factor)),
        }
    }

    pub fn set_base(&mut self, unit: &str) {
        self.base = Some(unit.to_string());
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.edges.contains_key(unit)
    }

    /// Declared units in first-seen order.
    pub fn units(&self) -> &[String] {
        &self.order
    }

    /// Converts `amount` from one unit to another through the shortest
    /// declared chain BFS reaches first. A same-unit conversion succeeds
    /// even when the unit was never declared.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, UnitError> {
        if from == to {
            return Ok(amount);
        }
        self.check_known(from)?;
        self.check_known(to)?;

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, f64)> = VecDeque::new();
        queue.push_back((from, amount));

        while let Some((unit, accumulated)) = queue.pop_front() {
            if unit == to {
                return Ok(accumulated);
            }
            if !visited.insert(unit) {
                continue;
            }
            if let Some(neighbors) = self.edges.get(unit) {
                for (neighbor, factor) in neighbors {
                    if !visited.contains(neighbor.as_str()) {
                        queue.push_back((neighbor, accumulated * factor));
                    }
                }
            }
        }

        Err(UnitError::NoConversionPath {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    fn check_known(&self, unit: &str) -> Result<(), UnitError> {
        if self.contains(unit) {
            return Ok(());
        }
        // A trailing "s" on a known unit is almost always a plural typo.
        if let Some(singular) = unit.strip_suffix('s') {
            if self.contains(singular) {
                return Err(UnitError::UnknownUnitPlural {
                    unit: unit.to_string(),
                    singular: singular.to_string(),
                });
            }
        }
        Err(UnitError::UnknownUnit {
            unit: unit.to_string(),
        })
    }

    /// Evaluates quantity arithmetic for `compute`. Binary operations on two
    /// unit-tagged amounts convert the right operand into the left operand's
    /// unit first; the result keeps the left unit.
    pub fn eval_quantity(&self, expr: &QuantityExpr) -> Result<(f64, Option<String>), UnitError> {
        match expr {
            QuantityExpr::Amount(amount) => Ok((*amount, None)),
            QuantityExpr::Quantity(amount, unit) => Ok((*amount, Some(unit.clone()))),
            QuantityExpr::Binary { op, left, right } => {
                let (lhs, lhs_unit) = self.eval_quantity(left)?;
                let (rhs, rhs_unit) = self.eval_quantity(right)?;
                let (rhs, unit) = match (lhs_unit, rhs_unit) {
                    (Some(lu), Some(ru)) => (self.convert(rhs, &ru, &lu)?, Some(lu)),
                    (Some(lu), None) => (rhs, Some(lu)),
                    (None, unit) => (rhs, unit),
                };
                Ok((apply_binary(*op, lhs, rhs)?, unit))
            }
        }
    }
}

fn apply_binary(op: BinaryOp, lhs: f64, rhs: f64) -> Result<f64, UnitError> {
    match op {
        BinaryOp::Add => Ok(lhs + rhs),
        BinaryOp::Sub => Ok(lhs - rhs),
        BinaryOp::Mul => Ok(lhs * rhs),
        BinaryOp::Div | BinaryOp::Mod if rhs == 0.0 => Err(UnitError::DivisionByZero),
        BinaryOp::Div => Ok(lhs / rhs),
        BinaryOp::Mod => Ok(lhs % rhs),
        BinaryOp::Pow => Ok(lhs.powf(rhs)),
    }
}
