//! Built-in formula evaluator

use super::context::{InstanceFormulaContext, Value};
use super::parser::{BinaryOp, Expr, parse_formula};
use super::{FormulaError, FormulaEvaluator};

/// Sandboxed evaluator: formulas can only read the instance context
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEvaluator;

impl FormulaEvaluator for ExpressionEvaluator {
    fn evaluate(
        &self,
        formula: &str,
        context: &InstanceFormulaContext,
    ) -> Result<String, FormulaError> {
        let parsed = parse_formula(formula)?;
        Ok(eval(&parsed, context)?.to_string())
    }
}

fn eval(expr: &Expr, context: &InstanceFormulaContext) -> Result<Value, FormulaError> {
    match expr {
        Expr::Text(text) => Ok(Value::Text(text.clone())),
        Expr::Number(number) => Ok(Value::Number(*number)),
        Expr::Field(field) => context.lookup(field),
        Expr::Neg(inner) => match eval(inner, context)? {
            Value::Number(number) => Ok(Value::Number(-number)),
            other => Err(FormulaError::TypeMismatch {
                op: '-',
                lhs: "nothing",
                rhs: other.type_name(),
            }),
        },
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, context)?;
            let rhs = eval(rhs, context)?;
            apply(*op, lhs, rhs)
        }
    }
}

fn apply(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, FormulaError> {
    match (op, lhs, rhs) {
        (BinaryOp::Add, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (BinaryOp::Add, a, b) => Ok(Value::Text(format!("{}{}", a, b))),
        (BinaryOp::Sub, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
        (BinaryOp::Mul, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
        (BinaryOp::Div, Value::Number(_), Value::Number(b)) if b == 0.0 => {
            Err(FormulaError::DivisionByZero)
        }
        (BinaryOp::Div, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
        (op, a, b) => Err(FormulaError::TypeMismatch {
            op: op.symbol(),
            lhs: a.type_name(),
            rhs: b.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> InstanceFormulaContext {
        InstanceFormulaContext {
            path: vec!["Cabinet".into(), "Drawer".into()],
            instance_name: "A".into(),
            name: "A".into(),
            definition_name: "Leg".into(),
            bbox_length: 720.0,
            bbox_width: 40.0,
            tags: vec!["oak".into(), "leg".into()],
            layer: "Layer0".into(),
            ..Default::default()
        }
    }

    fn evaluate(formula: &str) -> Result<String, FormulaError> {
        ExpressionEvaluator.evaluate(formula, &context())
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(evaluate("'Panel-' + name").unwrap(), "Panel-A");
        assert_eq!(evaluate("definition_name + '_' + layer").unwrap(), "Leg_Layer0");
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(evaluate("bbox_length + bbox_width").unwrap(), "760");
        assert_eq!(evaluate("bbox_length / 3").unwrap(), "240");
        assert_eq!(evaluate("(bbox_length - 20) * 2").unwrap(), "1400");
        assert_eq!(evaluate("-bbox_width").unwrap(), "-40");
    }

    #[test]
    fn test_mixed_concatenation_formats_numbers() {
        assert_eq!(
            evaluate("name + ' ' + bbox_length + 'x' + bbox_width").unwrap(),
            "A 720x40"
        );
        assert_eq!(evaluate("'#' + tags").unwrap(), "#oak, leg");
        assert_eq!(evaluate("path").unwrap(), "Cabinet, Drawer");
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            evaluate("name + colour"),
            Err(FormulaError::UnknownField("colour".into()))
        );
        assert_eq!(evaluate("bbox_length / 0"), Err(FormulaError::DivisionByZero));
        assert_eq!(
            evaluate("name * 2"),
            Err(FormulaError::TypeMismatch {
                op: '*',
                lhs: "text",
                rhs: "number",
            })
        );
        assert!(matches!(evaluate("'a' +"), Err(FormulaError::Parse { .. })));
    }
}
