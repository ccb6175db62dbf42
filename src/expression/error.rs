//! Error types for expression parsing, checking and evaluation.

use crate::expression::node::NodeId;
use thiserror::Error;

/// Errors that can occur while turning tokens into an evaluable tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// The postfix expression would exceed the configured length
    #[error("Expression too long: more than {limit} tokens")]
    ExpressionTooLong { limit: usize },

    /// Operator or node stack capacity exceeded (expression nested too deeply)
    #[error("Expression nested too deeply: stack capacity {capacity} exceeded")]
    StackOverflow { capacity: usize },

    #[error("Mismatched bracket in expression")]
    MismatchedBracket,

    /// The postfix sequence does not describe exactly one tree
    #[error("Malformed expression: {reason}")]
    MalformedExpression { reason: String },

    /// Token text could not be turned into an operand value
    #[error("Invalid literal '{text}'")]
    InvalidLiteral { text: String },

    #[error("Type check failed: {reason}")]
    TypeCheckFailed { reason: String },

    /// Operand properties can only be installed on identifier nodes
    #[error("Node {node} is not an identifier operand")]
    NotAnIdentifier { node: NodeId },

    #[error("Node {node} does not exist in this tree")]
    InvalidNode { node: NodeId },

    #[error("Expression evaluation failed: {reason}")]
    EvaluationFailed { reason: String },

    #[error("Lex error at position {position}: {message}")]
    Lex { position: usize, message: String },
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
