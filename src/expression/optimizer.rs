//! Constant folding.
//!
//! A post-order walk that rewrites constant subtrees into leaves in place.
//! Arithmetic folds to a numeric or string literal, comparisons and logical
//! operators fold to a boolean leaf. `and`/`or` may fold with only one side
//! known when that side decides the result on its own (`false` for `and`,
//! `true` for `or`); a single known non-deciding side leaves the node alone.
//!
//! The walk expects a tree that passed type checking.

use crate::expression::dispatch::compute;
use crate::expression::node::{NodeId, NodeKind};
use crate::expression::tree::ExpressionTree;
use crate::expression::value::Var;
use crate::parse::TokenCode;

/// Constant folder over one tree
pub struct Optimizer<'a> {
    tree: &'a mut ExpressionTree,
    folds: usize,
}

impl<'a> Optimizer<'a> {
    pub fn new(tree: &'a mut ExpressionTree) -> Self {
        Self { tree, folds: 0 }
    }

    /// Fold the whole tree; returns whether it collapsed into a constant
    pub fn optimize(&mut self) -> bool {
        let Some(root) = self.tree.root() else {
            return false;
        };
        let folded = self.optimize_node(root);
        log::debug!(
            "optimizer performed {} folds, tree {} constant",
            self.folds,
            if folded { "is" } else { "is not" }
        );
        folded
    }

    /// Number of nodes rewritten so far
    pub fn folds(&self) -> usize {
        self.folds
    }

    fn optimize_node(&mut self, id: NodeId) -> bool {
        let (left, right) = match self.tree.get(id).kind {
            NodeKind::Operator { left, right } => (left, right),
            // Bound or not, a variable is only known at evaluation time
            NodeKind::Variable(_) => return false,
            NodeKind::Numeric(_) | NodeKind::Text(_) | NodeKind::Folded(_) => return true,
        };

        let lrc = self.optimize_node(left);
        let rrc = match right {
            Some(right) => self.optimize_node(right),
            None => false,
        };

        let code = self.tree.get(id).code;
        let Some(right) = right else {
            return lrc && self.fold_unary(id, code, left);
        };

        match code {
            TokenCode::Less
            | TokenCode::LessEqual
            | TokenCode::Greater
            | TokenCode::Equal
            | TokenCode::NotEqual => lrc && rrc && self.fold_comparison(id, code, left, right),

            TokenCode::Plus | TokenCode::Minus => {
                lrc && rrc && self.fold_arithmetic(id, code, left, right, false)
            }

            TokenCode::Mul | TokenCode::Div | TokenCode::Max | TokenCode::Min | TokenCode::Pow => {
                lrc && rrc && self.fold_arithmetic(id, code, left, right, true)
            }

            TokenCode::And | TokenCode::Or => self.fold_logical(id, code, left, right, lrc, rrc),

            other => panic!("unexpected binary operator '{}' at {}", other.as_str(), id),
        }
    }

    fn constant(&self, id: NodeId) -> Var {
        match &self.tree.get(id).kind {
            NodeKind::Numeric(value) => Var::Double(*value),
            NodeKind::Text(text) => Var::String(text.clone()),
            NodeKind::Folded(result) => Var::Bool(*result),
            NodeKind::Operator { .. } | NodeKind::Variable(_) => Var::Invalid,
        }
    }

    fn fold_unary(&mut self, id: NodeId, code: TokenCode, child: NodeId) -> bool {
        let value = self.constant(child);
        assert!(value.is_numeric(), "'{}' applied to non-numeric constant", code.as_str());

        match compute(code, &value, &value) {
            Var::Double(result) => {
                log::trace!("folded {} {} into {}", code.as_str(), value, result);
                self.rewrite(id, TokenCode::Double, NodeKind::Numeric(result));
                true
            }
            _ => false,
        }
    }

    fn fold_comparison(&mut self, id: NodeId, code: TokenCode, left: NodeId, right: NodeId) -> bool {
        let lval = self.constant(left);
        let rval = self.constant(right);

        match compute(code, &lval, &rval) {
            Var::Bool(result) => {
                log::trace!("folded {} {} {} into {}", lval, code.as_str(), rval, result);
                self.rewrite(id, code, NodeKind::Folded(result));
                true
            }
            _ => false,
        }
    }

    fn fold_arithmetic(
        &mut self,
        id: NodeId,
        code: TokenCode,
        left: NodeId,
        right: NodeId,
        numeric_only: bool,
    ) -> bool {
        let lval = self.constant(left);
        let rval = self.constant(right);
        if numeric_only {
            assert!(
                lval.is_numeric() && rval.is_numeric(),
                "'{}' folded over non-numeric constants",
                code.as_str()
            );
        }

        let (leaf_code, kind) = match compute(code, &lval, &rval) {
            Var::Double(result) => (TokenCode::Double, NodeKind::Numeric(result)),
            Var::String(result) => (TokenCode::String, NodeKind::Text(result)),
            // 5 / 0 and friends stay in the tree and fail at evaluation
            _ => return false,
        };
        log::trace!("folded {} {} {} at {}", lval, code.as_str(), rval, id);
        self.rewrite(id, leaf_code, kind);
        true
    }

    fn fold_logical(
        &mut self,
        id: NodeId,
        code: TokenCode,
        left: NodeId,
        right: NodeId,
        lrc: bool,
        rrc: bool,
    ) -> bool {
        if !lrc && !rrc {
            return false;
        }

        for child in [left, right] {
            let child_code = self.tree.get(child).code;
            assert!(
                child_code.is_inequality() || child_code.is_logical(),
                "'{}' operand {} is not a comparison or logical operator",
                code.as_str(),
                child
            );
        }

        // The value that decides the result by itself
        let deciding = code == TokenCode::Or;
        let lres = self.folded_result(left);
        let rres = self.folded_result(right);

        let result = if lres == Some(deciding) || rres == Some(deciding) {
            deciding
        } else if lres.is_some() && rres.is_some() {
            !deciding
        } else {
            return false;
        };

        log::trace!(
            "short-circuited {} at {} ({:?}, {:?}) into {}",
            code.as_str(),
            id,
            lres,
            rres,
            result
        );
        self.rewrite(id, code, NodeKind::Folded(result));
        true
    }

    fn folded_result(&self, id: NodeId) -> Option<bool> {
        match self.tree.get(id).kind {
            NodeKind::Folded(result) => Some(result),
            _ => None,
        }
    }

    fn rewrite(&mut self, id: NodeId, code: TokenCode, kind: NodeKind) {
        // Discarded subtrees own their data sources
        self.tree.replace_with_leaf(id, code, kind, true);
        self.folds += 1;
    }
}

/// Helper function to fold a tree
pub fn optimize_expression(tree: &mut ExpressionTree) -> bool {
    Optimizer::new(tree).optimize()
}

impl ExpressionTree {
    /// Fold constant subtrees in place; returns whether the whole tree is now
    /// a constant
    pub fn optimize(&mut self) -> bool {
        optimize_expression(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::builder::parse_tree;

    fn root_kind(tree: &ExpressionTree) -> &NodeKind {
        tree.node(tree.root().unwrap()).unwrap().kind()
    }

    fn folded(input: &str) -> (bool, ExpressionTree) {
        let mut tree = parse_tree(input);
        assert!(tree.validate(), "{} should validate", input);
        let result = tree.optimize();
        (result, tree)
    }

    #[test]
    fn test_fold_arithmetic() {
        let (result, tree) = folded("2 + 3 * 4");
        assert!(result);
        assert!(matches!(root_kind(&tree), NodeKind::Numeric(v) if *v == 14.0));
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.node(tree.root().unwrap()).unwrap().code(), TokenCode::Double);
    }

    #[test]
    fn test_fold_count() {
        let mut tree = parse_tree("2 + 3 * 4");
        let mut optimizer = Optimizer::new(&mut tree);
        assert!(optimizer.optimize());
        assert_eq!(optimizer.folds(), 2);

        let mut tree = parse_tree("(1 < 2 and 2 < 3) or x < 1");
        let mut optimizer = Optimizer::new(&mut tree);
        assert!(optimizer.optimize());
        assert_eq!(optimizer.folds(), 4);

        // Nothing left to fold the second time round
        let mut optimizer = Optimizer::new(&mut tree);
        assert!(optimizer.optimize());
        assert_eq!(optimizer.folds(), 0);
    }

    #[test]
    fn test_fold_unary() {
        let (result, tree) = folded("sqrt(4 + 5)");
        assert!(result);
        assert!(matches!(root_kind(&tree), NodeKind::Numeric(v) if *v == 3.0));
    }

    #[test]
    fn test_fold_strings() {
        let (result, tree) = folded("'ab' == 'ab'");
        assert!(result);
        assert!(matches!(root_kind(&tree), NodeKind::Folded(true)));

        let mut tree = parse_tree("'ab' + 'cd'");
        assert!(tree.optimize());
        assert!(matches!(root_kind(&tree), NodeKind::Text(s) if s == "abcd"));
    }

    #[test]
    fn test_partial_fold() {
        let (result, tree) = folded("x < 2 * 3");
        assert!(!result);
        let root = tree.node(tree.root().unwrap()).unwrap();
        let right = tree.node(root.right().unwrap()).unwrap();
        assert!(matches!(right.kind(), NodeKind::Numeric(v) if *v == 6.0));
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_bound_variables_do_not_fold() {
        let mut tree = parse_tree("x + 1");
        tree.bind_variable("x", true, None);
        assert!(!tree.optimize());
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_division_by_zero_not_folded() {
        let (result, tree) = folded("5 / 0");
        assert!(!result);
        assert_eq!(tree.node_count(), 3);
    }

    fn logical_outcome(input: &str) -> Option<bool> {
        let (result, tree) = folded(input);
        match root_kind(&tree) {
            NodeKind::Folded(value) => {
                assert!(result);
                Some(*value)
            }
            _ => {
                assert!(!result);
                None
            }
        }
    }

    #[test]
    fn test_short_circuit_or() {
        const T: &str = "1 < 2";
        const F: &str = "2 < 1";
        const U: &str = "x < 1";
        let cases = [
            (T, T, Some(true)),
            (T, F, Some(true)),
            (T, U, Some(true)),
            (F, T, Some(true)),
            (F, F, Some(false)),
            (F, U, None),
            (U, T, Some(true)),
            (U, F, None),
            (U, U, None),
        ];
        for (left, right, expected) in cases {
            let input = format!("{} or {}", left, right);
            assert_eq!(logical_outcome(&input), expected, "{}", input);
        }
    }

    #[test]
    fn test_short_circuit_and() {
        const T: &str = "1 < 2";
        const F: &str = "2 < 1";
        const U: &str = "x < 1";
        let cases = [
            (T, T, Some(true)),
            (T, F, Some(false)),
            (T, U, None),
            (F, T, Some(false)),
            (F, F, Some(false)),
            (F, U, Some(false)),
            (U, T, None),
            (U, F, Some(false)),
            (U, U, None),
        ];
        for (left, right, expected) in cases {
            let input = format!("{} and {}", left, right);
            assert_eq!(logical_outcome(&input), expected, "{}", input);
        }
    }

    #[test]
    fn test_short_circuit_discards_variables() {
        let (result, tree) = folded("1 < 2 or x < 1");
        assert!(result);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.variable_names().is_empty());
    }

    #[test]
    fn test_nested_logical() {
        assert_eq!(logical_outcome("(x < 1 or 2 < 1) and 3 < 1"), Some(false));
        assert_eq!(logical_outcome("(1 < 2 and 2 < 3) or x < 1"), Some(true));
    }

    #[test]
    fn test_idempotent() {
        let mut tree = parse_tree("2 * 3 < 7 and 'a' != 'b'");
        assert!(tree.optimize());
        let count = tree.node_count();
        assert!(tree.optimize());
        assert_eq!(tree.node_count(), count);

        let mut tree = parse_tree("x < 1 + 1");
        assert!(!tree.optimize());
        let count = tree.node_count();
        assert!(!tree.optimize());
        assert_eq!(tree.node_count(), count);
    }
}
