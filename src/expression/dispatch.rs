//! Operator dispatch matrix.
//!
//! A table indexed by `(operator, left dtype, right dtype)` holding the
//! function that applies the operator to two values. It is the only place
//! where coercions and operator semantics live; both the optimizer and the
//! evaluator go through [`compute`]. Unary operators are looked up with the
//! operand's dtype on both sides.
//!
//! Numeric operators accept any mix of `Int` and `Double` and produce
//! `Double`. A combination without an entry yields [`Var::Invalid`], as does
//! a numeric result that is not finite (division by zero among them).

use crate::expression::value::{DType, Var};
use crate::parse::TokenCode;
use std::sync::OnceLock;

/// Function applying an operator to a left and right value
pub type OperatorFn = fn(&Var, &Var) -> Var;

type OperatorTable = [[[Option<OperatorFn>; DType::COUNT]; DType::COUNT]; TokenCode::OPERATOR_COUNT];

const NUMERIC: [DType; 2] = [DType::Int, DType::Double];

pub struct DispatchMatrix {
    table: OperatorTable,
}

impl DispatchMatrix {
    fn new() -> Self {
        let mut matrix = Self {
            table: [[[None; DType::COUNT]; DType::COUNT]; TokenCode::OPERATOR_COUNT],
        };

        let arithmetic: [(TokenCode, OperatorFn); 7] = [
            (TokenCode::Plus, |l, r| numeric_op(l, r, |a, b| a + b)),
            (TokenCode::Minus, |l, r| numeric_op(l, r, |a, b| a - b)),
            (TokenCode::Mul, |l, r| numeric_op(l, r, |a, b| a * b)),
            (TokenCode::Div, divide),
            (TokenCode::Max, |l, r| numeric_op(l, r, f64::max)),
            (TokenCode::Min, |l, r| numeric_op(l, r, f64::min)),
            (TokenCode::Pow, |l, r| numeric_op(l, r, f64::powf)),
        ];
        let comparisons: [(TokenCode, OperatorFn); 5] = [
            (TokenCode::Less, |l, r| numeric_cmp(l, r, |a, b| a < b)),
            (TokenCode::LessEqual, |l, r| numeric_cmp(l, r, |a, b| a <= b)),
            (TokenCode::Greater, |l, r| numeric_cmp(l, r, |a, b| a > b)),
            (TokenCode::Equal, |l, r| numeric_cmp(l, r, |a, b| a == b)),
            (TokenCode::NotEqual, |l, r| numeric_cmp(l, r, |a, b| a != b)),
        ];
        for (op, func) in arithmetic.into_iter().chain(comparisons) {
            for left in NUMERIC {
                for right in NUMERIC {
                    matrix.register(op, left, right, func);
                }
            }
        }

        let unary: [(TokenCode, OperatorFn); 4] = [
            (TokenCode::Sin, |v, _| numeric_op(v, v, |a, _| a.sin())),
            (TokenCode::Cos, |v, _| numeric_op(v, v, |a, _| a.cos())),
            (TokenCode::Sqr, |v, _| numeric_op(v, v, |a, _| a * a)),
            (TokenCode::Sqrt, |v, _| numeric_op(v, v, |a, _| a.sqrt())),
        ];
        for (op, func) in unary {
            for dtype in NUMERIC {
                matrix.register(op, dtype, dtype, func);
            }
        }

        matrix.register(TokenCode::Plus, DType::String, DType::String, concat);
        matrix.register(TokenCode::Equal, DType::String, DType::String, |l, r| {
            text_cmp(l, r, |a, b| a == b)
        });
        matrix.register(TokenCode::NotEqual, DType::String, DType::String, |l, r| {
            text_cmp(l, r, |a, b| a != b)
        });
        matrix.register(TokenCode::And, DType::Bool, DType::Bool, |l, r| {
            logical_op(l, r, |a, b| a && b)
        });
        matrix.register(TokenCode::Or, DType::Bool, DType::Bool, |l, r| {
            logical_op(l, r, |a, b| a || b)
        });

        matrix
    }

    /// The process-wide matrix, built on first use
    pub fn global() -> &'static DispatchMatrix {
        static MATRIX: OnceLock<DispatchMatrix> = OnceLock::new();
        MATRIX.get_or_init(DispatchMatrix::new)
    }

    fn register(&mut self, op: TokenCode, left: DType, right: DType, func: OperatorFn) {
        if let Some(index) = op.operator_index() {
            self.table[index][left.index()][right.index()] = Some(func);
        }
    }

    pub fn lookup(&self, op: TokenCode, left: DType, right: DType) -> Option<OperatorFn> {
        let index = op.operator_index()?;
        self.table[index][left.index()][right.index()]
    }

    /// Apply `op`; combinations without an entry yield `Invalid`
    pub fn compute(&self, op: TokenCode, left: &Var, right: &Var) -> Var {
        match self.lookup(op, left.dtype(), right.dtype()) {
            Some(func) => func(left, right),
            None => Var::Invalid,
        }
    }
}

/// Apply `op` through the global matrix
pub fn compute(op: TokenCode, left: &Var, right: &Var) -> Var {
    DispatchMatrix::global().compute(op, left, right)
}

fn finite(value: f64) -> Var {
    if value.is_finite() {
        Var::Double(value)
    } else {
        Var::Invalid
    }
}

fn numeric_op(left: &Var, right: &Var, op: impl Fn(f64, f64) -> f64) -> Var {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => finite(op(a, b)),
        _ => Var::Invalid,
    }
}

fn divide(left: &Var, right: &Var) -> Var {
    match (left.as_f64(), right.as_f64()) {
        (Some(_), Some(b)) if b == 0.0 => Var::Invalid,
        (Some(a), Some(b)) => finite(a / b),
        _ => Var::Invalid,
    }
}

fn numeric_cmp(left: &Var, right: &Var, op: impl Fn(f64, f64) -> bool) -> Var {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Var::Bool(op(a, b)),
        _ => Var::Invalid,
    }
}

fn text_cmp(left: &Var, right: &Var, op: impl Fn(&str, &str) -> bool) -> Var {
    match (left.as_str(), right.as_str()) {
        (Some(a), Some(b)) => Var::Bool(op(a, b)),
        _ => Var::Invalid,
    }
}

fn concat(left: &Var, right: &Var) -> Var {
    match (left.as_str(), right.as_str()) {
        (Some(a), Some(b)) => Var::String(format!("{}{}", a, b)),
        _ => Var::Invalid,
    }
}

fn logical_op(left: &Var, right: &Var, op: impl Fn(bool, bool) -> bool) -> Var {
    match (left.as_bool(), right.as_bool()) {
        (Some(a), Some(b)) => Var::Bool(op(a, b)),
        _ => Var::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_promotes_to_double() {
        assert_eq!(compute(TokenCode::Plus, &Var::Int(2), &Var::Int(3)), Var::Double(5.0));
        assert_eq!(
            compute(TokenCode::Mul, &Var::Int(2), &Var::Double(1.5)),
            Var::Double(3.0)
        );
        assert_eq!(compute(TokenCode::Pow, &Var::Int(2), &Var::Int(10)), Var::Double(1024.0));
        assert_eq!(compute(TokenCode::Max, &Var::Int(2), &Var::Int(7)), Var::Double(7.0));
        assert_eq!(compute(TokenCode::Min, &Var::Double(2.5), &Var::Int(7)), Var::Double(2.5));
    }

    #[test]
    fn test_division_by_zero_is_invalid() {
        assert_eq!(compute(TokenCode::Div, &Var::Int(5), &Var::Int(0)), Var::Invalid);
        assert_eq!(compute(TokenCode::Div, &Var::Int(5), &Var::Double(0.0)), Var::Invalid);
        assert_eq!(compute(TokenCode::Div, &Var::Int(5), &Var::Int(2)), Var::Double(2.5));
    }

    #[test]
    fn test_unary() {
        let nine = Var::Int(9);
        assert_eq!(compute(TokenCode::Sqrt, &nine, &nine), Var::Double(3.0));
        assert_eq!(compute(TokenCode::Sqr, &nine, &nine), Var::Double(81.0));
        let zero = Var::Double(0.0);
        assert_eq!(compute(TokenCode::Cos, &zero, &zero), Var::Double(1.0));
        let negative = Var::Int(-1);
        assert_eq!(compute(TokenCode::Sqrt, &negative, &negative), Var::Invalid);
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            compute(TokenCode::Plus, &Var::from("ab"), &Var::from("cd")),
            Var::from("abcd")
        );
        assert_eq!(
            compute(TokenCode::Equal, &Var::from("ab"), &Var::from("ab")),
            Var::Bool(true)
        );
        assert_eq!(
            compute(TokenCode::NotEqual, &Var::from("ab"), &Var::from("AB")),
            Var::Bool(true)
        );
        assert_eq!(compute(TokenCode::Minus, &Var::from("a"), &Var::from("b")), Var::Invalid);
        assert_eq!(compute(TokenCode::Less, &Var::from("a"), &Var::from("b")), Var::Invalid);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(compute(TokenCode::Equal, &Var::Int(2), &Var::Double(2.0)), Var::Bool(true));
        assert_eq!(compute(TokenCode::LessEqual, &Var::Int(2), &Var::Int(2)), Var::Bool(true));
        assert_eq!(compute(TokenCode::Greater, &Var::Int(2), &Var::Int(3)), Var::Bool(false));
        assert_eq!(compute(TokenCode::Equal, &Var::Int(1), &Var::from("1")), Var::Invalid);
    }

    #[test]
    fn test_logical() {
        assert_eq!(
            compute(TokenCode::And, &Var::Bool(true), &Var::Bool(false)),
            Var::Bool(false)
        );
        assert_eq!(compute(TokenCode::Or, &Var::Bool(true), &Var::Bool(false)), Var::Bool(true));
        assert_eq!(compute(TokenCode::Or, &Var::Bool(true), &Var::Invalid), Var::Invalid);
    }

    #[test]
    fn test_lookup() {
        let matrix = DispatchMatrix::global();
        assert!(matrix.lookup(TokenCode::Plus, DType::Int, DType::Double).is_some());
        assert!(matrix.lookup(TokenCode::Plus, DType::Bool, DType::Bool).is_none());
        assert!(matrix.lookup(TokenCode::Identifier, DType::Int, DType::Int).is_none());
    }
}
