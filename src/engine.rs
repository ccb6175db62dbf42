//! Compilation pipeline: infix tokens to a checked, optionally folded tree.

use crate::expression::{
    type_check_expression, ExpressionError, ExpressionResult, ExpressionTree, TreeBuilder,
    TypeResult,
};
use crate::parse::{
    tokenize, PostfixConverter, Token, DEFAULT_MAX_EXPRESSION_LEN, DEFAULT_MAX_STACK_DEPTH,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of tokens in the postfix form of an expression.
    pub max_expression_len: usize,
    /// Capacity of the operator and node stacks, and the maximum depth of a
    /// compiled tree. Tree walks recurse once per level, so this also bounds
    /// their recursion depth.
    pub max_stack_depth: usize,
    /// Whether compiled trees get constant folded.
    pub optimize: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_expression_len: DEFAULT_MAX_EXPRESSION_LEN,
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            optimize: true,
        }
    }
}

impl EngineConfig {
    pub fn with_max_expression_len(mut self, max_expression_len: usize) -> Self {
        self.max_expression_len = max_expression_len;
        self
    }

    pub fn with_max_stack_depth(mut self, max_stack_depth: usize) -> Self {
        self.max_stack_depth = max_stack_depth;
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }
}

/// Turns token streams into expression trees
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Convert, build and type check a token stream, folding constants when
    /// configured to. Ill-typed expressions are rejected before any folding.
    pub fn compile(&self, tokens: &[Token]) -> ExpressionResult<ExpressionTree> {
        let converter =
            PostfixConverter::new(self.config.max_expression_len, self.config.max_stack_depth);
        let postfix = converter.convert(tokens)?;

        let mut tree = TreeBuilder::new(self.config.max_stack_depth).build(&postfix)?;

        let result = type_check_expression(&tree);
        log::debug!("expression type: {}", result.as_str());
        if result == TypeResult::Failure {
            return Err(ExpressionError::TypeCheckFailed {
                reason: "operand types do not match their operators".to_string(),
            });
        }

        if self.config.optimize {
            tree.optimize();
        }
        Ok(tree)
    }

    /// Tokenize with the reference lexer, then [`compile`](Self::compile)
    pub fn compile_str(&self, input: &str) -> Result<ExpressionTree> {
        let tokens = tokenize(input).with_context(|| format!("Failed to tokenize '{}'", input))?;
        log::debug!("tokenized {} tokens", tokens.len());

        self.compile(&tokens)
            .with_context(|| format!("Failed to compile '{}'", input))
    }
}
