//! Expression evaluation implementation.

use crate::expression::dispatch::compute;
use crate::expression::node::{NodeId, NodeKind};
use crate::expression::resolver::Resolver;
use crate::expression::tree::ExpressionTree;
use crate::expression::value::Var;
use crate::expression::{ExpressionError, ExpressionResult};
use crate::parse::TokenCode;

/// Evaluator for expression trees
pub struct ExpressionEvaluator<'a, R: Resolver + ?Sized> {
    /// Supplies the values of bound identifiers
    resolver: &'a R,
}

impl<'a, R: Resolver + ?Sized> ExpressionEvaluator<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver }
    }

    /// Evaluate a tree. Failures (unbound identifiers, division by zero,
    /// unsupported operand types) come back as [`Var::Invalid`].
    pub fn evaluate(&self, tree: &ExpressionTree) -> Var {
        match tree.root() {
            Some(root) => self.evaluate_node(tree, root),
            None => Var::Invalid,
        }
    }

    /// Evaluate a tree, reporting an invalid result as an error
    pub fn evaluate_checked(&self, tree: &ExpressionTree) -> ExpressionResult<Var> {
        match self.evaluate(tree) {
            Var::Invalid => Err(ExpressionError::EvaluationFailed {
                reason: "expression evaluated to an invalid value".to_string(),
            }),
            value => Ok(value),
        }
    }

    fn evaluate_node(&self, tree: &ExpressionTree, id: NodeId) -> Var {
        let node = tree.get(id);

        match node.kind() {
            NodeKind::Numeric(value) => literal_value(node.code(), *value),
            NodeKind::Text(text) => Var::String(text.clone()),
            NodeKind::Folded(result) => Var::Bool(*result),
            NodeKind::Variable(var) => match &var.binding {
                Some(binding) => self.resolver.resolve(&var.name, binding.source.as_ref()),
                None => {
                    log::warn!("identifier '{}' evaluated before being bound", var.name);
                    Var::Invalid
                }
            },
            NodeKind::Operator { left, right } => {
                let lval = self.evaluate_node(tree, *left);
                if lval.is_invalid() {
                    return Var::Invalid;
                }

                match right {
                    // Unary operators see their operand on both sides
                    None => compute(node.code(), &lval, &lval),
                    Some(right) => {
                        let rval = self.evaluate_node(tree, *right);
                        if rval.is_invalid() {
                            return Var::Invalid;
                        }
                        compute(node.code(), &lval, &rval)
                    }
                }
            }
        }
    }
}

/// Integer literals evaluate as `Int` only when the value fits one exactly,
/// so evaluation agrees with folding, which always reads literals as doubles
fn literal_value(code: TokenCode, value: f64) -> Var {
    let exact = value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64;
    if code == TokenCode::Integer && exact {
        Var::Int(value as i64)
    } else {
        Var::Double(value)
    }
}

/// Helper function to evaluate a tree with the given resolver
pub fn evaluate_expression<R: Resolver + ?Sized>(tree: &ExpressionTree, resolver: &R) -> Var {
    ExpressionEvaluator::new(resolver).evaluate(tree)
}

/// Type alias for predicate functions
pub type Predicate = Box<dyn Fn(&dyn Resolver) -> bool + Send + Sync + 'static>;

/// Helper function to create a predicate function from a tree
pub fn expression_to_predicate(tree: ExpressionTree) -> Predicate {
    Box::new(move |resolver| {
        match evaluate_expression(&tree, resolver) {
            Var::Bool(b) => b,
            _ => false, // Invalid or non-boolean result
        }
    })
}
