//! Type definitions of the HogQL AST.
//!
//! Every node owns its children. Nodes that refer to something by name (fields, selects and
//! the tables in a FROM clause) carry an optional symbol that is filled in by the resolver.

use super::symbols::{SelectQuerySymbol, Symbol, TableSymbol};

/// A SELECT query
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub select: Vec<Expr>,
    pub distinct: bool,
    pub select_from: Option<JoinExpr>,
    pub joins: Vec<JoinExpr>,
    pub prewhere: Option<Expr>,
    pub where_: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderExpr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub symbol: Option<SelectQuerySymbol>,
}

/// A table in a FROM clause or one of its JOINs.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinExpr {
    /// `None` for the first table of a FROM clause.
    pub join_type: Option<JoinType>,
    pub table: JoinTable,
    pub alias: Option<String>,
    /// The `ON` expression.
    pub constraint: Option<Expr>,
    pub symbol: Option<TableSymbol>,
}

/// What a FROM clause or JOIN reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinTable {
    /// A table of the catalog, by name.
    Table(String),
    /// A nested SELECT.
    SelectQuery(Box<SelectQuery>),
}

/// The kind of an explicit JOIN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// A single element in an ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExpr {
    pub expr: Expr,
    pub direction: OrderDirection,
}

/// A direction for a single ORDER BY element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// A HogQL expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// AND of any number of expressions
    And(Vec<Expr>),
    /// OR of any number of expressions
    Or(Vec<Expr>),
    /// An arithmetic operation on two expressions
    BinaryOperation {
        left: Box<Expr>,
        operator: BinaryOperator,
        right: Box<Expr>,
    },
    /// A comparison of two expressions
    CompareOperation {
        left: Box<Expr>,
        operator: CompareOperator,
        right: Box<Expr>,
    },
    /// An unary operation on an expression
    UnaryOperation {
        operator: UnaryOperator,
        expr: Box<Expr>,
    },
    /// A dotted field access, e.g. `events.properties.$browser`
    Field(Field),
    /// A function call
    Call(Call),
    /// A literal
    Constant(Constant),
    /// A named hole, to be substituted before resolution
    Placeholder(Placeholder),
    /// An expression with a name, in a select list
    Alias(Alias),
    /// `(a, b, c)`
    Tuple(Vec<Expr>),
    /// `[a, b, c]`
    Array(Vec<Expr>),
    /// `*`
    Asterisk,
    /// A nested SELECT used as a value, e.g. on the right of `IN`
    SelectQuery(Box<SelectQuery>),
}

/// A field reference. `chain` is exactly what was written, split on dots.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub chain: Vec<String>,
    pub symbol: Option<Symbol>,
}

/// A function call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
}

/// A literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// A named hole, written `{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
}

/// `expr AS alias`
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub alias: String,
    pub expr: Box<Expr>,
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mult,
    Div,
    Mod,
}

impl BinaryOperator {
    /// The function this operator is printed as.
    pub fn function_name(self) -> &'static str {
        match self {
            BinaryOperator::Add => "plus",
            BinaryOperator::Sub => "minus",
            BinaryOperator::Mult => "multiply",
            BinaryOperator::Div => "divide",
            BinaryOperator::Mod => "modulo",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Like,
    ILike,
    NotLike,
    NotILike,
    In,
    NotIn,
}

impl CompareOperator {
    /// The function this operator is printed as.
    pub fn function_name(self) -> &'static str {
        match self {
            CompareOperator::Eq => "equals",
            CompareOperator::NotEq => "notEquals",
            CompareOperator::Lt => "less",
            CompareOperator::LtE => "lessOrEquals",
            CompareOperator::Gt => "greater",
            CompareOperator::GtE => "greaterOrEquals",
            CompareOperator::Like => "like",
            CompareOperator::ILike => "ilike",
            CompareOperator::NotLike => "notLike",
            CompareOperator::NotILike => "notILike",
            CompareOperator::In => "in",
            CompareOperator::NotIn => "notIn",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Negate,
}

impl UnaryOperator {
    pub fn function_name(self) -> &'static str {
        match self {
            UnaryOperator::Not => "not",
            UnaryOperator::Negate => "negate",
        }
    }
}
