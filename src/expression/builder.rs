//! Postfix token sequence to expression tree.
//!
//! `max_stack_depth` bounds both the node stack and the depth of the built
//! tree. Every later pass (type checking, folding, evaluation, clone and
//! destroy) recurses once per tree level, so a tree within the bound can be
//! walked without exhausting the thread stack, however long the expression.

use crate::expression::node::{ExpressionNode, NodeId};
use crate::expression::tree::ExpressionTree;
use crate::expression::{ExpressionError, ExpressionResult};
use crate::parse::postfix::DEFAULT_MAX_STACK_DEPTH;
use crate::parse::Token;

/// Builds trees from postfix token sequences, bounding node stack size and
/// tree depth
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder {
    max_stack_depth: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STACK_DEPTH)
    }
}

impl TreeBuilder {
    pub fn new(max_stack_depth: usize) -> Self {
        Self { max_stack_depth }
    }

    pub fn build(&self, postfix: &[&Token]) -> ExpressionResult<ExpressionTree> {
        let mut tree = ExpressionTree::new();
        // Each entry carries the depth of the subtree it roots
        let mut stack: Vec<(NodeId, usize)> = Vec::new();

        for &token in postfix {
            let code = token.code;

            let (id, depth) = if code.is_operand() {
                let id = tree.alloc(ExpressionNode::operand(token)?);
                if code.is_identifier() {
                    tree.link_operand(id);
                }
                (id, 1)
            } else if code.is_binary() {
                let (right, right_depth) = Self::pop(&mut stack, token)?;
                let (left, left_depth) = Self::pop(&mut stack, token)?;
                let depth = self.check_depth(left_depth.max(right_depth) + 1)?;
                let id = tree.alloc(ExpressionNode::operator(code, left, Some(right)));
                tree.get_mut(left).parent = Some(id);
                tree.get_mut(right).parent = Some(id);
                (id, depth)
            } else if code.is_unary() {
                let (left, left_depth) = Self::pop(&mut stack, token)?;
                let depth = self.check_depth(left_depth + 1)?;
                let id = tree.alloc(ExpressionNode::operator(code, left, None));
                tree.get_mut(left).parent = Some(id);
                (id, depth)
            } else {
                return Err(ExpressionError::MalformedExpression {
                    reason: format!("unexpected '{}' in postfix sequence", token.text),
                });
            };

            if stack.len() >= self.max_stack_depth {
                return Err(ExpressionError::StackOverflow {
                    capacity: self.max_stack_depth,
                });
            }
            stack.push((id, depth));
        }

        match stack.as_slice() {
            [(root, _)] => tree.set_root(*root),
            [] => {
                return Err(ExpressionError::MalformedExpression {
                    reason: "empty expression".to_string(),
                })
            }
            remaining => {
                return Err(ExpressionError::MalformedExpression {
                    reason: format!("{} trees left on the stack", remaining.len()),
                })
            }
        }

        log::debug!(
            "built tree with {} nodes from {} postfix tokens",
            tree.node_count(),
            postfix.len()
        );
        Ok(tree)
    }

    fn check_depth(&self, depth: usize) -> ExpressionResult<usize> {
        if depth > self.max_stack_depth {
            return Err(ExpressionError::StackOverflow {
                capacity: self.max_stack_depth,
            });
        }
        Ok(depth)
    }

    fn pop(
        stack: &mut Vec<(NodeId, usize)>,
        operator: &Token,
    ) -> ExpressionResult<(NodeId, usize)> {
        stack
            .pop()
            .ok_or_else(|| ExpressionError::MalformedExpression {
                reason: format!("missing operand for '{}'", operator.text),
            })
    }
}

/// Helper function to build with the default stack capacity and depth bound
pub fn build_expression_tree(postfix: &[&Token]) -> ExpressionResult<ExpressionTree> {
    TreeBuilder::default().build(postfix)
}

#[cfg(test)]
pub(crate) fn parse_tree(input: &str) -> ExpressionTree {
    let tokens = crate::parse::tokenize(input).unwrap();
    let postfix = crate::parse::convert_infix_to_postfix(&tokens).unwrap();
    build_expression_tree(&postfix).unwrap()
}
