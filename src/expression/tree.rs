//! Arena-backed expression tree and its operand list.
//!
//! Nodes live in a slot vector addressed by [`NodeId`]; parent links and the
//! doubly-linked operand list are stored as ids, so discarding a subtree is a
//! matter of clearing slots and relinking neighbours. Slots of discarded nodes
//! are never reused, so a stale id can only ever miss.

use crate::expression::node::{Binding, ExpressionNode, NodeId, NodeKind};
use crate::expression::resolver::DataSource;
use crate::expression::{ExpressionError, ExpressionResult};
use crate::parse::TokenCode;

/// Result of pruning unresolved operands
#[derive(Debug, Default)]
pub struct PrunedOperands {
    /// Number of comparisons replaced by `true`
    pub count: usize,
    /// Data sources detached from discarded nodes when they were not freed
    pub released: Vec<DataSource>,
}

/// Expression tree owning all of its nodes
#[derive(Debug)]
pub struct ExpressionTree {
    nodes: Vec<Option<ExpressionNode>>,
    root: Option<NodeId>,
    /// First node of the operand list (the list head's right link)
    operand_head: Option<NodeId>,
}

impl ExpressionTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            operand_head: None,
        }
    }

    pub(crate) fn alloc(&mut self, node: ExpressionNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        id
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.get_mut(root).parent = None;
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&ExpressionNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// Number of nodes currently reachable from the root
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub(crate) fn get(&self, id: NodeId) -> &ExpressionNode {
        match self.node(id) {
            Some(node) => node,
            None => panic!("dangling node id {}", id),
        }
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut ExpressionNode {
        match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("dangling node id {}", id),
        }
    }

    /// Prepend an identifier node to the operand list
    pub(crate) fn link_operand(&mut self, id: NodeId) {
        let first = self.operand_head;
        {
            let node = self.get_mut(id);
            node.list_left = None;
            node.list_right = first;
        }
        if let Some(first) = first {
            self.get_mut(first).list_left = Some(id);
        }
        self.operand_head = Some(id);
    }

    fn unlink_operand(&mut self, id: NodeId) {
        let (left, right) = {
            let node = self.get(id);
            (node.list_left, node.list_right)
        };

        match left {
            Some(left) => self.get_mut(left).list_right = right,
            None => {
                if self.operand_head == Some(id) {
                    self.operand_head = right;
                }
            }
        }
        if let Some(right) = right {
            self.get_mut(right).list_left = left;
        }

        let node = self.get_mut(id);
        node.list_left = None;
        node.list_right = None;
    }

    /// Identifier operands, most recently inserted first
    pub fn operands(&self) -> Operands<'_> {
        Operands {
            tree: self,
            next: self.operand_head,
        }
    }

    /// Names of the identifier operands, in operand-list order
    pub fn variable_names(&self) -> Vec<&str> {
        self.operands()
            .filter_map(|id| self.get(id).variable_name())
            .collect()
    }

    /// Whether every identifier operand has its properties installed
    pub fn is_fully_resolved(&self) -> bool {
        self.operands().all(|id| self.get(id).is_resolved())
    }

    /// Identifier nodes reachable from the root, found by walking the tree
    pub fn reachable_operands(&self) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut pending: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = pending.pop() {
            let node = self.get(id);
            if node.code.is_identifier() {
                found.push(id);
            }
            if let NodeKind::Operator { left, right } = node.kind {
                pending.push(left);
                pending.extend(right);
            }
        }
        found
    }

    /// Mark an identifier operand as resolved.
    ///
    /// Its value is obtained from the resolver at evaluation time, with
    /// `source` handed along.
    pub fn install_operand_properties(
        &mut self,
        id: NodeId,
        is_numeric: bool,
        source: Option<DataSource>,
    ) -> ExpressionResult<()> {
        let node = self
            .nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(ExpressionError::InvalidNode { node: id })?;

        match &mut node.kind {
            NodeKind::Variable(var) => {
                var.binding = Some(Binding { is_numeric, source });
                Ok(())
            }
            _ => Err(ExpressionError::NotAnIdentifier { node: id }),
        }
    }

    /// Install operand properties on every identifier called `name`.
    /// Returns the number of nodes bound.
    pub fn bind_variable(
        &mut self,
        name: &str,
        is_numeric: bool,
        source: Option<DataSource>,
    ) -> usize {
        let matching: Vec<NodeId> = self
            .operands()
            .filter(|&id| self.get(id).variable_name() == Some(name))
            .collect();

        for &id in &matching {
            if let NodeKind::Variable(var) = &mut self.get_mut(id).kind {
                var.binding = Some(Binding {
                    is_numeric,
                    source: source.clone(),
                });
            }
        }
        matching.len()
    }

    /// Free a subtree post-order, unlinking identifier nodes from the operand
    /// list. Data sources are dropped when `free_data_source` is set and
    /// collected into `released` otherwise.
    fn destroy_subtree(
        &mut self,
        id: NodeId,
        free_data_source: bool,
        released: &mut Vec<DataSource>,
    ) {
        if let NodeKind::Operator { left, right } = self.get(id).kind {
            self.destroy_subtree(left, free_data_source, released);
            if let Some(right) = right {
                self.destroy_subtree(right, free_data_source, released);
            }
        }

        if self.get(id).code.is_identifier() {
            self.unlink_operand(id);
        }

        if let Some(node) = self.nodes[id.0].take() {
            if let NodeKind::Variable(var) = node.kind {
                if let Some(source) = var.binding.and_then(|binding| binding.source) {
                    if !free_data_source {
                        released.push(source);
                    }
                }
            }
        }
    }

    /// Destroy the whole tree. Without `free_data_source` the installed data
    /// sources are handed back to the caller.
    pub fn destroy(mut self, free_data_source: bool) -> Vec<DataSource> {
        let mut released = Vec::new();
        if let Some(root) = self.root.take() {
            self.destroy_subtree(root, free_data_source, &mut released);
        }
        released
    }

    /// Turn a node into a leaf in place, discarding its children.
    pub(crate) fn replace_with_leaf(
        &mut self,
        id: NodeId,
        code: TokenCode,
        kind: NodeKind,
        free_data_source: bool,
    ) -> Vec<DataSource> {
        assert!(
            !matches!(kind, NodeKind::Operator { .. } | NodeKind::Variable(_)),
            "replacement for {} must be a constant leaf",
            id
        );

        let node = self.get_mut(id);
        let children = match node.kind {
            NodeKind::Operator { left, right } => [Some(left), right],
            _ => [None, None],
        };
        node.code = code;
        node.kind = kind;

        let mut released = Vec::new();
        for child in children.into_iter().flatten() {
            self.destroy_subtree(child, free_data_source, &mut released);
        }
        released
    }

    /// Replace every comparison depending on an unbound identifier with `true`.
    ///
    /// Repeatedly picks an unresolved identifier, climbs to its nearest
    /// comparison ancestor and folds that ancestor to `true`. Stops when no
    /// unresolved identifier remains or one has no comparison above it.
    pub fn remove_unresolved_operands(&mut self, free_data_source: bool) -> PrunedOperands {
        let mut pruned = PrunedOperands::default();

        while let Some(unresolved) = self.operands().find(|&id| !self.get(id).is_resolved()) {
            let mut cursor = Some(unresolved);
            while let Some(id) = cursor {
                if self.get(id).code.is_inequality() {
                    break;
                }
                cursor = self.get(id).parent;
            }

            let Some(comparison) = cursor else {
                log::debug!(
                    "unresolved operand {} has no comparison ancestor, stopping",
                    unresolved
                );
                break;
            };

            log::warn!(
                "dropping comparison {} that depends on unresolved '{}'",
                comparison,
                self.get(unresolved).variable_name().unwrap_or_default()
            );
            let code = self.get(comparison).code;
            let released =
                self.replace_with_leaf(comparison, code, NodeKind::Folded(true), free_data_source);
            pruned.released.extend(released);
            pruned.count += 1;
        }

        pruned
    }

    fn clone_subtree(&self, id: NodeId, parent: Option<NodeId>, into: &mut ExpressionTree) -> NodeId {
        let source = self.get(id);
        let new_id = into.alloc(ExpressionNode {
            code: source.code,
            kind: source.kind.clone(),
            parent,
            list_left: None,
            list_right: None,
        });

        if let NodeKind::Operator { left, right } = source.kind {
            let left = self.clone_subtree(left, Some(new_id), into);
            let right = right.map(|right| self.clone_subtree(right, Some(new_id), into));
            into.get_mut(new_id).kind = NodeKind::Operator { left, right };
        }
        new_id
    }

    /// Thread every identifier node into a fresh operand list (pre-order)
    fn rebuild_operand_list(&mut self) {
        self.operand_head = None;
        let mut pending: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = pending.pop() {
            let node = self.get(id);
            let is_identifier = node.code.is_identifier();
            if let NodeKind::Operator { left, right } = node.kind {
                pending.extend(right);
                pending.push(left);
            }
            if is_identifier {
                self.link_operand(id);
            }
        }
    }
}

impl Clone for ExpressionTree {
    /// Deep copy; the copy gets its own operand list built from its own nodes.
    fn clone(&self) -> Self {
        let mut copy = ExpressionTree::new();
        if let Some(root) = self.root {
            let new_root = self.clone_subtree(root, None, &mut copy);
            copy.root = Some(new_root);
            copy.rebuild_operand_list();
        }
        copy
    }
}

/// Iterator over the operand list
pub struct Operands<'a> {
    tree: &'a ExpressionTree,
    next: Option<NodeId>,
}

impl Iterator for Operands<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.get(id).list_right;
        Some(id)
    }
}
