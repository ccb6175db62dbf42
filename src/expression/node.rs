//! Expression tree nodes.

use crate::expression::resolver::DataSource;
use crate::expression::{ExpressionError, ExpressionResult};
use crate::parse::{Token, TokenCode};
use std::fmt;

/// Stable handle of a node inside its [`ExpressionTree`](crate::expression::ExpressionTree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Properties installed on an identifier once its data source is known
#[derive(Debug, Clone)]
pub struct Binding {
    pub is_numeric: bool,
    pub source: Option<DataSource>,
}

/// Identifier operand
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    /// `None` until operand properties are installed
    pub binding: Option<Binding>,
}

/// Node payload. Folding replaces the payload in place.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Operator application; unary operators have no right child
    Operator { left: NodeId, right: Option<NodeId> },
    /// Integer or double literal
    Numeric(f64),
    /// String literal
    Text(String),
    Variable(Variable),
    /// Comparison or logical operator whose boolean result is already known
    Folded(bool),
}

/// A node of the expression tree.
///
/// `list_left`/`list_right` thread identifier nodes into the tree's operand
/// list; `list_left == None` means the node sits right after the list head.
#[derive(Debug, Clone)]
pub struct ExpressionNode {
    pub(crate) code: TokenCode,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) list_left: Option<NodeId>,
    pub(crate) list_right: Option<NodeId>,
}

impl ExpressionNode {
    fn with_kind(code: TokenCode, kind: NodeKind) -> Self {
        Self {
            code,
            kind,
            parent: None,
            list_left: None,
            list_right: None,
        }
    }

    /// Create an operand leaf from an operand token
    pub(crate) fn operand(token: &Token) -> ExpressionResult<Self> {
        let kind = match token.code {
            TokenCode::Identifier | TokenCode::QualifiedIdentifier => {
                NodeKind::Variable(Variable {
                    name: token.text.clone(),
                    binding: None,
                })
            }
            TokenCode::Integer | TokenCode::Double => {
                // Rejects "inf", "NaN" and out-of-range exponents too
                let value = token
                    .text
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| ExpressionError::InvalidLiteral {
                        text: token.text.clone(),
                    })?;
                NodeKind::Numeric(value)
            }
            TokenCode::String => NodeKind::Text(token.text.clone()),
            other => {
                return Err(ExpressionError::MalformedExpression {
                    reason: format!("'{}' is not an operand", other.as_str()),
                })
            }
        };
        Ok(Self::with_kind(token.code, kind))
    }

    pub(crate) fn operator(code: TokenCode, left: NodeId, right: Option<NodeId>) -> Self {
        Self::with_kind(code, NodeKind::Operator { left, right })
    }

    pub fn code(&self) -> TokenCode {
        self.code
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn left(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Operator { left, .. } => Some(left),
            _ => None,
        }
    }

    pub fn right(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Operator { right, .. } => right,
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self.kind, NodeKind::Operator { .. })
    }

    /// Whether the operand value is known (literals always are)
    pub fn is_resolved(&self) -> bool {
        match &self.kind {
            NodeKind::Numeric(_) | NodeKind::Text(_) => true,
            NodeKind::Variable(var) => var.binding.is_some(),
            NodeKind::Operator { .. } | NodeKind::Folded(_) => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        match &self.kind {
            NodeKind::Numeric(_) => true,
            NodeKind::Variable(var) => var.binding.as_ref().is_some_and(|b| b.is_numeric),
            _ => false,
        }
    }

    /// Whether a comparison or logical node has been folded to a boolean
    pub fn is_optimized(&self) -> bool {
        matches!(self.kind, NodeKind::Folded(_))
    }

    /// Folded boolean result.
    ///
    /// # Panics
    ///
    /// Panics if the node has not been folded.
    pub fn result(&self) -> bool {
        match self.kind {
            NodeKind::Folded(result) => result,
            _ => panic!(
                "boolean result read from '{}' node that is not optimized",
                self.code.as_str()
            ),
        }
    }

    pub fn variable(&self) -> Option<&Variable> {
        match &self.kind {
            NodeKind::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn variable_name(&self) -> Option<&str> {
        self.variable().map(|var| var.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_nodes() {
        let node = ExpressionNode::operand(&Token::integer(42)).unwrap();
        assert!(matches!(node.kind(), NodeKind::Numeric(v) if *v == 42.0));
        assert!(node.is_resolved() && node.is_numeric());

        let node = ExpressionNode::operand(&Token::double("2.5")).unwrap();
        assert!(matches!(node.kind(), NodeKind::Numeric(v) if *v == 2.5));

        let node = ExpressionNode::operand(&Token::string("abc")).unwrap();
        assert!(node.is_resolved() && !node.is_numeric());

        let node = ExpressionNode::operand(&Token::identifier("age")).unwrap();
        assert!(!node.is_resolved());
        assert_eq!(node.variable_name(), Some("age"));
        assert!(node.is_leaf());
    }

    #[test]
    fn test_invalid_operands() {
        assert!(matches!(
            ExpressionNode::operand(&Token::double("1.2.3")),
            Err(ExpressionError::InvalidLiteral { .. })
        ));
        for text in ["inf", "NaN", "1e400", "-infinity"] {
            assert!(
                matches!(
                    ExpressionNode::operand(&Token::double(text)),
                    Err(ExpressionError::InvalidLiteral { .. })
                ),
                "{}",
                text
            );
        }
        assert!(matches!(
            ExpressionNode::operand(&Token::new(TokenCode::Integer, "1e400")),
            Err(ExpressionError::InvalidLiteral { .. })
        ));
        assert!(matches!(
            ExpressionNode::operand(&Token::symbol(TokenCode::Plus)),
            Err(ExpressionError::MalformedExpression { .. })
        ));
    }

    #[test]
    fn test_operator_node() {
        let node = ExpressionNode::operator(TokenCode::Sqrt, NodeId(0), None);
        assert_eq!(node.left(), Some(NodeId(0)));
        assert_eq!(node.right(), None);
        assert!(!node.is_leaf());
        assert!(!node.is_optimized());
    }

    #[test]
    fn test_node_id() {
        let id = NodeId(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.to_string(), "#7");
    }

    #[test]
    #[should_panic(expected = "not optimized")]
    fn test_result_requires_optimized() {
        let node = ExpressionNode::operator(TokenCode::Less, NodeId(0), Some(NodeId(1)));
        node.result();
    }
}
