//! Naming formulas
//!
//! Deep rename computes a new definition name for each part instance by
//! evaluating a user formula against an [`InstanceFormulaContext`]. The
//! evaluator is a trait so hosts can plug in their own expression engine;
//! [`ExpressionEvaluator`] is the built-in sandboxed one.

mod context;
mod eval;
mod parser;

pub use context::{EdgeContext, InstanceFormulaContext, MaterialContext, Value, VeneerContext};
pub use eval::ExpressionEvaluator;
pub use parser::{BinaryOp, Expr, parse_formula};

/// Evaluates a naming formula for one instance
pub trait FormulaEvaluator: Send {
    fn evaluate(
        &self,
        formula: &str,
        context: &InstanceFormulaContext,
    ) -> Result<String, FormulaError>;
}

/// Formula evaluation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("Syntax error in '{formula}' at offset {offset}")]
    Parse { formula: String, offset: usize },
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Cannot apply '{op}' to {lhs} and {rhs}")]
    TypeMismatch {
        op: char,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("Division by zero")]
    DivisionByZero,
    /// Failure reported by an external engine
    #[error("{0}")]
    Engine(String),
}
