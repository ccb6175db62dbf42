//! Expression trees: construction, type checking, constant folding and
//! evaluation.
//!
//! This module provides:
//! - The arena-backed tree with its operand list
//! - Type checking over a three-valued resolution lattice
//! - Constant folding with `and`/`or` short-circuits
//! - Evaluation through the operator dispatch matrix against late-bound values

pub mod builder;
pub mod dispatch;
pub mod error;
pub mod eval;
pub mod node;
pub mod optimizer;
pub mod resolver;
pub mod tree;
pub mod type_checker;
pub mod value;

pub use builder::{build_expression_tree, TreeBuilder};
pub use dispatch::{compute, DispatchMatrix, OperatorFn};
pub use error::{ExpressionError, ExpressionResult};
pub use eval::{evaluate_expression, expression_to_predicate, ExpressionEvaluator, Predicate};
pub use node::{Binding, ExpressionNode, NodeId, NodeKind, Variable};
pub use optimizer::{optimize_expression, Optimizer};
pub use resolver::{DataSource, NoResolver, Record, RecordResolver, Resolver};
pub use tree::{ExpressionTree, Operands, PrunedOperands};
pub use type_checker::{type_check_expression, validate_expression, TypeChecker, TypeResult};
pub use value::{DType, Var};
