// Parse module - tokens, reference lexer and infix to postfix conversion

pub mod lexer;
pub mod postfix;
pub mod token;

pub use lexer::{tokenize, Lexer};
pub use postfix::{
    convert_infix_to_postfix, PostfixConverter, DEFAULT_MAX_EXPRESSION_LEN,
    DEFAULT_MAX_STACK_DEPTH,
};
pub use token::{Token, TokenCode};
