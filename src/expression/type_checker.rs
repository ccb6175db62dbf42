//! Type checking for expression trees.
//!
//! Every subtree is assigned one [`TypeResult`]. `Unresolved` marks a
//! well-typed subtree that still depends on an identifier without installed
//! properties; it is carried upward conservatively and only accepted next to
//! concrete types where the rules below say so.

use crate::expression::node::{NodeId, NodeKind};
use crate::expression::tree::ExpressionTree;
use crate::expression::{ExpressionError, ExpressionResult};
use crate::parse::TokenCode;
use serde::{Deserialize, Serialize};

/// Inferred type of a subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeResult {
    Numeric,
    Alphanumeric,
    Boolean,
    /// Well typed but depends on an unbound identifier
    Unresolved,
    Failure,
}

impl TypeResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeResult::Numeric => "numeric",
            TypeResult::Alphanumeric => "alphanumeric",
            TypeResult::Boolean => "boolean",
            TypeResult::Unresolved => "unresolved",
            TypeResult::Failure => "failure",
        }
    }
}

/// Type checker over one tree
pub struct TypeChecker<'a> {
    tree: &'a ExpressionTree,
}

impl<'a> TypeChecker<'a> {
    pub fn new(tree: &'a ExpressionTree) -> Self {
        Self { tree }
    }

    /// Type of the whole tree; an empty tree is a failure
    pub fn check_tree(&self) -> TypeResult {
        match self.tree.root() {
            Some(root) => self.check(root),
            None => TypeResult::Failure,
        }
    }

    /// Infer the type of the subtree rooted at `id`
    pub fn check(&self, id: NodeId) -> TypeResult {
        use TypeResult::*;

        let node = self.tree.get(id);
        let (left, right) = match node.kind() {
            NodeKind::Operator { left, right } => (*left, *right),
            NodeKind::Numeric(_) => return Numeric,
            NodeKind::Text(_) => return Alphanumeric,
            NodeKind::Variable(var) => {
                return match &var.binding {
                    None => Unresolved,
                    Some(binding) if binding.is_numeric => Numeric,
                    Some(_) => Alphanumeric,
                }
            }
            NodeKind::Folded(_) => {
                assert!(
                    node.code().is_inequality() || node.code().is_logical(),
                    "folded boolean on non-boolean operator {}",
                    id
                );
                return Boolean;
            }
        };

        let lt = self.check(left);
        let rt = match right {
            Some(right) => self.check(right),
            None => Failure,
        };

        match node.code() {
            TokenCode::Plus
            | TokenCode::Minus
            | TokenCode::Mul
            | TokenCode::Div
            | TokenCode::Max
            | TokenCode::Min
            | TokenCode::Pow => match (lt, rt) {
                (Numeric, Numeric) | (Numeric, Unresolved) | (Unresolved, Numeric) => Numeric,
                (Unresolved, Unresolved) => Unresolved,
                _ => Failure,
            },

            TokenCode::Sin | TokenCode::Cos | TokenCode::Sqr | TokenCode::Sqrt => match lt {
                Numeric | Unresolved => lt,
                _ => Failure,
            },

            TokenCode::Less | TokenCode::LessEqual | TokenCode::Greater => match (lt, rt) {
                (Numeric, Numeric) | (Numeric, Unresolved) | (Unresolved, Numeric) => Boolean,
                (Unresolved, Unresolved) => Unresolved,
                _ => Failure,
            },

            TokenCode::Equal | TokenCode::NotEqual => match (lt, rt) {
                (Numeric, Numeric) | (Alphanumeric, Alphanumeric) => Boolean,
                (Unresolved, Unresolved) => Unresolved,
                (Numeric | Alphanumeric, Unresolved) | (Unresolved, Numeric | Alphanumeric) => {
                    Boolean
                }
                _ => Failure,
            },

            TokenCode::And | TokenCode::Or => match (lt, rt) {
                (Boolean, Boolean) => Boolean,
                (Unresolved, Unresolved) => Unresolved,
                _ => Failure,
            },

            _ => Failure,
        }
    }

    /// Check that the tree can serve as a predicate
    pub fn check_filter_predicate(&self) -> ExpressionResult<()> {
        match self.check_tree() {
            TypeResult::Boolean | TypeResult::Unresolved => Ok(()),
            other => Err(ExpressionError::TypeCheckFailed {
                reason: format!("predicate has {} type, expected boolean", other.as_str()),
            }),
        }
    }
}

/// Helper function to type check a whole tree
pub fn type_check_expression(tree: &ExpressionTree) -> TypeResult {
    TypeChecker::new(tree).check_tree()
}

/// Helper function to validate a tree, reporting a failure as an error
pub fn validate_expression(tree: &ExpressionTree) -> ExpressionResult<TypeResult> {
    match type_check_expression(tree) {
        TypeResult::Failure => Err(ExpressionError::TypeCheckFailed {
            reason: "expression is not well typed".to_string(),
        }),
        result => Ok(result),
    }
}

impl ExpressionTree {
    /// Whether the tree is well typed
    pub fn validate(&self) -> bool {
        let result = type_check_expression(self);
        log::debug!("validated tree: {}", result.as_str());
        result != TypeResult::Failure
    }
}
