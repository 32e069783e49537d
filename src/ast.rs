//! Operation descriptors produced by the language front-ends.
//!
//! Parsers build these bottom-up by return value: a loop, conditional, or
//! routine definition owns its body ops from construction, so the top-level
//! program holds exactly one op per top-level statement and nested ops are
//! reachable only through their owner.

/// A compiled program: the retained top-level operation list, executed
/// strictly in order, once.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // Control flow, shared by the prose and sketch languages.
    Repeat {
        count: usize,
        body: Vec<Op>,
    },
    If {
        condition: Condition,
        then_body: Vec<Op>,
        else_body: Vec<Op>,
    },
    /// Variable write. `fallback` keeps the raw source text for values that
    /// should degrade to a literal when they do not evaluate (color names,
    /// unresolved words). `echo` appends `name = value` to the output, which
    /// is how the arithmetic language reports assignments.
    Assign {
        name: String,
        value: Expr,
        fallback: Option<String>,
        echo: bool,
    },
    /// Registers the body under `name` at execution time; otherwise a no-op
    /// placeholder that preserves sibling statement order.
    DefineRoutine {
        name: String,
        params: Vec<String>,
        body: Vec<Op>,
    },
    CallRoutine {
        name: String,
        arguments: Vec<Expr>,
        missing: MissingCall,
    },

    // Text language.
    Say(Expr),
    Remember {
        key: String,
        value: Expr,
        fallback: Option<String>,
    },
    Recall {
        key: String,
    },
    ListCreate {
        name: String,
        items: Vec<Expr>,
    },
    ListAppend {
        name: String,
        value: Expr,
    },
    /// Reads one element into `target`; out-of-range indexes leave it unset.
    ListGet {
        name: String,
        index: Expr,
        target: String,
    },
    /// Element count for lists, character count for everything else.
    Length {
        name: String,
        target: String,
    },
    Foreach {
        var: String,
        list: String,
        body: Vec<Op>,
    },

    // Graphics language.
    SetAttr {
        name: String,
        value: Expr,
        fallback: Option<String>,
    },
    Draw {
        shape: ShapeKind,
        args: Vec<(String, Expr)>,
    },
    Rotate(Expr),
    Scale {
        x: Expr,
        y: Option<Expr>,
    },
    Translate {
        x: Expr,
        y: Expr,
    },
    Push,
    Pop,

    // Unit-conversion language.
    DefineUnit {
        lhs_amount: f64,
        lhs_unit: String,
        rhs_amount: f64,
        rhs_unit: String,
    },
    BaseUnit(String),
    Convert {
        amount: f64,
        from: String,
        to: String,
    },
    Compute {
        expr: QuantityExpr,
        target: String,
    },
    ShowUnits,

    // Arithmetic language.
    Eval(Expr),
    ShowVar(String),

    // Query language.
    Load {
        table: String,
        path: String,
    },
    Filter {
        table: String,
        field: String,
        op: CompareOp,
        value: Expr,
    },
    Select {
        fields: Vec<String>,
    },
    Sort {
        field: String,
        descending: bool,
    },
    Limit(usize),
    Join {
        table: String,
        left_key: String,
        right_key: String,
    },
    ShowTables,
}

/// What a routine call does when the name was never defined. The text
/// language prints a visible placeholder; the graphics language skips the
/// call silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingCall {
    Report,
    Ignore,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: String,
        arguments: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum UnaryOp {
    #[strum(serialize = "-")]
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "^")]
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CompareOp {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
}

/// Conditions compare one named variable against a value, which is all the
/// surface grammars allow.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub name: String,
    pub op: CompareOp,
    pub value: Expr,
}

/// Arithmetic over unit-tagged amounts for the conversion language's
/// `compute` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityExpr {
    Amount(f64),
    Quantity(f64, String),
    Binary {
        op: BinaryOp,
        left: Box<QuantityExpr>,
        right: Box<QuantityExpr>,
    },
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Square,
    Triangle,
    Star,
    Line,
}
