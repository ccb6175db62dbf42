// Expression tokens and the classifier predicates over them

use serde::{Deserialize, Serialize};

/// Token codes produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenCode {
    // Brackets
    LeftParen,
    RightParen,

    // Separator
    Comma,

    // Binary operators
    Plus,
    Minus,
    Mul,
    Div,
    Max,
    Min,
    Pow,
    And,
    Or,
    Less,
    LessEqual,
    Greater,
    Equal,
    NotEqual,

    // Unary operators
    Sin,
    Cos,
    Sqr,
    Sqrt,

    // Operands
    Identifier,
    QualifiedIdentifier,
    Integer,
    Double,
    String,

    // Skipped by the converter
    Whitespace,
    Eol,
}

impl TokenCode {
    /// Number of operator codes, used to size the dispatch matrix.
    pub const OPERATOR_COUNT: usize = 18;

    /// Check if the token takes part in operator-precedence parsing.
    /// Brackets count as operators; the comma does not.
    pub fn is_operator(&self) -> bool {
        self.is_binary() || self.is_unary() || self.is_bracket()
    }

    pub fn is_bracket(&self) -> bool {
        matches!(self, TokenCode::LeftParen | TokenCode::RightParen)
    }

    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            TokenCode::Sin | TokenCode::Cos | TokenCode::Sqr | TokenCode::Sqrt
        )
    }

    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            TokenCode::Plus
                | TokenCode::Minus
                | TokenCode::Mul
                | TokenCode::Div
                | TokenCode::Max
                | TokenCode::Min
                | TokenCode::Pow
                | TokenCode::And
                | TokenCode::Or
                | TokenCode::Less
                | TokenCode::LessEqual
                | TokenCode::Greater
                | TokenCode::Equal
                | TokenCode::NotEqual
        )
    }

    pub fn is_operand(&self) -> bool {
        matches!(
            self,
            TokenCode::Identifier
                | TokenCode::QualifiedIdentifier
                | TokenCode::Integer
                | TokenCode::Double
                | TokenCode::String
        )
    }

    /// Identifier-class operands, the ones threaded through the operand list.
    pub fn is_identifier(&self) -> bool {
        matches!(self, TokenCode::Identifier | TokenCode::QualifiedIdentifier)
    }

    pub fn is_inequality(&self) -> bool {
        matches!(
            self,
            TokenCode::Less
                | TokenCode::LessEqual
                | TokenCode::Greater
                | TokenCode::Equal
                | TokenCode::NotEqual
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, TokenCode::And | TokenCode::Or)
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, TokenCode::Whitespace | TokenCode::Eol)
    }

    /// Operator precedence; higher binds tighter.
    ///
    /// Brackets are lowest (0), `or` is the lowest real operator.
    ///
    /// # Panics
    ///
    /// Panics if called on a token that is not an operator.
    pub fn precedence(&self) -> u8 {
        match self {
            TokenCode::Max | TokenCode::Min | TokenCode::Pow => 7,
            TokenCode::Mul | TokenCode::Div => 6,
            TokenCode::Plus | TokenCode::Minus => 5,
            TokenCode::Sin | TokenCode::Cos | TokenCode::Sqr | TokenCode::Sqrt => 4,
            TokenCode::Less
            | TokenCode::LessEqual
            | TokenCode::Greater
            | TokenCode::Equal
            | TokenCode::NotEqual => 3,
            TokenCode::And => 2,
            TokenCode::Or => 1,
            TokenCode::LeftParen | TokenCode::RightParen => 0,
            other => panic!("precedence requested for non-operator token {:?}", other),
        }
    }

    /// Dense index of an operator code into the dispatch matrix.
    pub fn operator_index(&self) -> Option<usize> {
        let index = match self {
            TokenCode::Plus => 0,
            TokenCode::Minus => 1,
            TokenCode::Mul => 2,
            TokenCode::Div => 3,
            TokenCode::Max => 4,
            TokenCode::Min => 5,
            TokenCode::Pow => 6,
            TokenCode::And => 7,
            TokenCode::Or => 8,
            TokenCode::Less => 9,
            TokenCode::LessEqual => 10,
            TokenCode::Greater => 11,
            TokenCode::Equal => 12,
            TokenCode::NotEqual => 13,
            TokenCode::Sin => 14,
            TokenCode::Cos => 15,
            TokenCode::Sqr => 16,
            TokenCode::Sqrt => 17,
            _ => return None,
        };
        Some(index)
    }

    /// Get the display string for this token code
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenCode::LeftParen => "(",
            TokenCode::RightParen => ")",
            TokenCode::Comma => ",",
            TokenCode::Plus => "+",
            TokenCode::Minus => "-",
            TokenCode::Mul => "*",
            TokenCode::Div => "/",
            TokenCode::Max => "max",
            TokenCode::Min => "min",
            TokenCode::Pow => "pow",
            TokenCode::And => "and",
            TokenCode::Or => "or",
            TokenCode::Less => "<",
            TokenCode::LessEqual => "<=",
            TokenCode::Greater => ">",
            TokenCode::Equal => "==",
            TokenCode::NotEqual => "!=",
            TokenCode::Sin => "sin",
            TokenCode::Cos => "cos",
            TokenCode::Sqr => "sqr",
            TokenCode::Sqrt => "sqrt",
            TokenCode::Identifier => "identifier",
            TokenCode::QualifiedIdentifier => "qualified identifier",
            TokenCode::Integer => "integer",
            TokenCode::Double => "double",
            TokenCode::String => "string",
            TokenCode::Whitespace => "whitespace",
            TokenCode::Eol => "end of line",
        }
    }

    /// Convert a word to a keyword operator if it matches
    pub fn keyword_from_str(s: &str) -> Option<TokenCode> {
        match s.to_lowercase().as_str() {
            "max" => Some(TokenCode::Max),
            "min" => Some(TokenCode::Min),
            "pow" => Some(TokenCode::Pow),
            "and" => Some(TokenCode::And),
            "or" => Some(TokenCode::Or),
            "sin" => Some(TokenCode::Sin),
            "cos" => Some(TokenCode::Cos),
            "sqr" => Some(TokenCode::Sqr),
            "sqrt" => Some(TokenCode::Sqrt),
            _ => None,
        }
    }
}

/// A lexical token: its code plus the raw text it was scanned from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub code: TokenCode,
    pub text: String,
}

impl Token {
    pub fn new(code: TokenCode, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    /// Build an operator or bracket token using its canonical spelling.
    pub fn symbol(code: TokenCode) -> Self {
        Self::new(code, code.as_str())
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::new(TokenCode::Identifier, name)
    }

    pub fn integer(value: i64) -> Self {
        Self::new(TokenCode::Integer, value.to_string())
    }

    pub fn double(text: impl Into<String>) -> Self {
        Self::new(TokenCode::Double, text)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(TokenCode::String, value)
    }

    /// Length of the raw token text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
