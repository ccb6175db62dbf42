//! Infix to postfix conversion (operator-precedence / shunting-yard).
//!
//! The converter borrows the caller's tokens and returns them reordered; no
//! token is copied. Whitespace and end-of-line tokens are dropped.
//!
//! Two bounds apply, both configurable:
//! - the postfix output may hold at most `max_expression_len` tokens;
//! - the operator stack may hold at most `max_stack_depth` entries, which
//!   bounds how many brackets and pending operators can be open at once.
//!
//! The operator stack does not bound the depth of the resulting tree: a
//! left-associative chain like `1 + 1 + 1 ...` never holds more than one
//! pending operator. Tree depth is checked by the tree builder against the
//! same `max_stack_depth`.

use super::token::{Token, TokenCode};
use crate::expression::{ExpressionError, ExpressionResult};

/// Default maximum number of tokens in a postfix expression.
pub const DEFAULT_MAX_EXPRESSION_LEN: usize = 512;

/// Default operator/node stack capacity and tree depth bound.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 256;

/// Converter from infix token order to postfix token order
#[derive(Debug, Clone, Copy)]
pub struct PostfixConverter {
    max_expression_len: usize,
    max_stack_depth: usize,
}

impl Default for PostfixConverter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EXPRESSION_LEN, DEFAULT_MAX_STACK_DEPTH)
    }
}

impl PostfixConverter {
    pub fn new(max_expression_len: usize, max_stack_depth: usize) -> Self {
        Self {
            max_expression_len,
            max_stack_depth,
        }
    }

    /// Convert an infix token sequence into postfix order
    pub fn convert<'a>(&self, tokens: &'a [Token]) -> ExpressionResult<Vec<&'a Token>> {
        let mut output = PostfixOutput::new(self.max_expression_len);
        let mut stack: Vec<&'a Token> = Vec::new();

        for token in tokens {
            if token.code.is_whitespace() {
                continue;
            }

            match token.code {
                TokenCode::LeftParen => self.push(&mut stack, token)?,

                TokenCode::RightParen => {
                    loop {
                        match stack.pop() {
                            Some(top) if top.code == TokenCode::LeftParen => break,
                            Some(top) => output.emit(top)?,
                            None => return Err(ExpressionError::MismatchedBracket),
                        }
                    }

                    // A unary operator directly wrapping the group applies to all of it.
                    while let Some(top) = stack.last() {
                        if !top.code.is_unary() {
                            break;
                        }
                        output.emit(top)?;
                        stack.pop();
                    }
                }

                TokenCode::Comma => {
                    while let Some(top) = stack.last() {
                        if top.code == TokenCode::LeftParen {
                            break;
                        }
                        output.emit(top)?;
                        stack.pop();
                    }
                }

                code if !code.is_operator() => output.emit(token)?,

                code => {
                    if !code.is_unary() {
                        while let Some(top) = stack.last() {
                            if code.precedence() > top.code.precedence() {
                                break;
                            }
                            output.emit(top)?;
                            stack.pop();
                        }
                    }
                    self.push(&mut stack, token)?;
                }
            }
        }

        while let Some(top) = stack.pop() {
            if top.code == TokenCode::LeftParen {
                return Err(ExpressionError::MismatchedBracket);
            }
            output.emit(top)?;
        }

        log::debug!(
            "converted {} infix tokens into {} postfix tokens",
            tokens.len(),
            output.tokens.len()
        );
        Ok(output.tokens)
    }

    fn push<'a>(&self, stack: &mut Vec<&'a Token>, token: &'a Token) -> ExpressionResult<()> {
        if stack.len() >= self.max_stack_depth {
            return Err(ExpressionError::StackOverflow {
                capacity: self.max_stack_depth,
            });
        }
        stack.push(token);
        Ok(())
    }
}

struct PostfixOutput<'a> {
    tokens: Vec<&'a Token>,
    limit: usize,
}

impl<'a> PostfixOutput<'a> {
    fn new(limit: usize) -> Self {
        Self {
            tokens: Vec::new(),
            limit,
        }
    }

    fn emit(&mut self, token: &'a Token) -> ExpressionResult<()> {
        if self.tokens.len() >= self.limit {
            return Err(ExpressionError::ExpressionTooLong { limit: self.limit });
        }
        self.tokens.push(token);
        Ok(())
    }
}

/// Helper function to convert with the default limits
pub fn convert_infix_to_postfix(tokens: &[Token]) -> ExpressionResult<Vec<&Token>> {
    PostfixConverter::default().convert(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::lexer::tokenize;

    fn postfix(input: &str) -> String {
        let tokens = tokenize(input).unwrap();
        convert_infix_to_postfix(&tokens)
            .unwrap()
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_precedence() {
        assert_eq!(postfix("2 + 3 * 4"), "2 3 4 * +");
        assert_eq!(postfix("(2 + 3) * 4"), "2 3 + 4 *");
        assert_eq!(postfix("a < 1 or b > 2 and c == 3"), "a 1 < b 2 > c 3 == and or");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(postfix("10 - 3 - 2"), "10 3 - 2 -");
        assert_eq!(postfix("2 pow 3 pow 2"), "2 3 pow 2 pow");
    }

    #[test]
    fn test_unary_wraps_bracketed_group() {
        assert_eq!(postfix("sqrt(4+5)"), "4 5 + sqrt");
        assert_eq!(postfix("sin(cos(x))"), "x cos sin");
        assert_eq!(postfix("2 * sqr(x - 1)"), "2 x 1 - sqr *");
    }

    #[test]
    fn test_unary_never_popped_by_precedence() {
        // Without brackets the unary applies to everything up to the end.
        assert_eq!(postfix("sqrt 4 + 5"), "4 5 + sqrt");
    }

    #[test]
    fn test_call_style_arguments() {
        assert_eq!(postfix("max(a, b + 1)"), "a b 1 + max");
        assert_eq!(postfix("min(1, 2) * 3"), "1 2 min 3 *");
    }

    #[test]
    fn test_whitespace_is_skipped() {
        let tokens = tokenize(" a \n+\tb ").unwrap();
        let out = convert_infix_to_postfix(&tokens).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|t| !t.code.is_whitespace()));
    }

    #[test]
    fn test_mismatched_brackets() {
        let tokens = tokenize("(1 + 2").unwrap();
        assert!(matches!(
            convert_infix_to_postfix(&tokens),
            Err(ExpressionError::MismatchedBracket)
        ));

        let tokens = tokenize("1 + 2)").unwrap();
        assert!(matches!(
            convert_infix_to_postfix(&tokens),
            Err(ExpressionError::MismatchedBracket)
        ));
    }

    #[test]
    fn test_output_capacity() {
        let tokens = tokenize("1 + 2 + 3").unwrap();
        let converter = PostfixConverter::new(4, DEFAULT_MAX_STACK_DEPTH);
        assert!(matches!(
            converter.convert(&tokens),
            Err(ExpressionError::ExpressionTooLong { limit: 4 })
        ));
        let converter = PostfixConverter::new(5, DEFAULT_MAX_STACK_DEPTH);
        assert_eq!(converter.convert(&tokens).unwrap().len(), 5);
    }

    #[test]
    fn test_stack_capacity() {
        let input = format!("{}1{}", "(".repeat(8), ")".repeat(8));
        let tokens = tokenize(&input).unwrap();

        let converter = PostfixConverter::new(DEFAULT_MAX_EXPRESSION_LEN, 7);
        assert!(matches!(
            converter.convert(&tokens),
            Err(ExpressionError::StackOverflow { capacity: 7 })
        ));
        let converter = PostfixConverter::new(DEFAULT_MAX_EXPRESSION_LEN, 8);
        assert_eq!(converter.convert(&tokens).unwrap().len(), 1);
    }
}
