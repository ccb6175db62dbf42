pub mod engine;
pub mod expression;
pub mod parse;

pub use engine::{Engine, EngineConfig};
pub use expression::{
    ExpressionError, ExpressionEvaluator, ExpressionResult, ExpressionTree, Resolver, Var,
};
pub use parse::{Token, TokenCode};
