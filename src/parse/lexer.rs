// Reference tokenizer - turns expression text into the token stream

use super::token::{Token, TokenCode};
use crate::expression::{ExpressionError, ExpressionResult};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn lex_error(&self, message: impl Into<String>) -> ExpressionError {
        ExpressionError::Lex {
            position: self.position,
            message: message.into(),
        }
    }

    /// Get the next token from the input, `None` at end of input
    pub fn next_token(&mut self) -> ExpressionResult<Option<Token>> {
        let Some(ch) = self.current_char() else {
            return Ok(None);
        };

        let token = match ch {
            '\n' => {
                self.advance();
                Token::new(TokenCode::Eol, "\n")
            }
            '\r' if self.peek() == Some('\n') => {
                self.advance();
                self.advance();
                Token::new(TokenCode::Eol, "\r\n")
            }
            c if c.is_whitespace() => self.read_whitespace(),
            '+' => self.single(TokenCode::Plus),
            '-' => self.single(TokenCode::Minus),
            '*' => self.single(TokenCode::Mul),
            '/' => self.single(TokenCode::Div),
            '(' => self.single(TokenCode::LeftParen),
            ')' => self.single(TokenCode::RightParen),
            ',' => self.single(TokenCode::Comma),
            '<' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::symbol(TokenCode::LessEqual)
                } else {
                    Token::symbol(TokenCode::Less)
                }
            }
            '>' => self.single(TokenCode::Greater),
            '=' => {
                self.advance();
                if self.current_char() != Some('=') {
                    return Err(self.lex_error("expected '==' for equality"));
                }
                self.advance();
                Token::symbol(TokenCode::Equal)
            }
            '!' => {
                self.advance();
                if self.current_char() != Some('=') {
                    return Err(self.lex_error("expected '!=' for inequality"));
                }
                self.advance();
                Token::symbol(TokenCode::NotEqual)
            }
            '\'' | '"' => self.read_string(ch)?,
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c if c.is_ascii_digit() => self.read_number(),
            c => return Err(self.lex_error(format!("unexpected character '{}'", c))),
        };

        Ok(Some(token))
    }

    fn single(&mut self, code: TokenCode) -> Token {
        self.advance();
        Token::symbol(code)
    }

    fn read_whitespace(&mut self) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() && ch != '\n' && ch != '\r' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        // A lone '\r' is plain whitespace.
        if text.is_empty() {
            if let Some(ch) = self.current_char() {
                text.push(ch);
                self.advance();
            }
        }
        Token::new(TokenCode::Whitespace, text)
    }

    /// Read an identifier, qualified identifier (`table.column`) or keyword
    fn read_identifier(&mut self) -> Token {
        let mut identifier = self.read_word();

        if self.current_char() == Some('.')
            && self.peek().is_some_and(|c| c.is_alphabetic() || c == '_')
        {
            self.advance();
            identifier.push('.');
            identifier.push_str(&self.read_word());
            return Token::new(TokenCode::QualifiedIdentifier, identifier);
        }

        match TokenCode::keyword_from_str(&identifier) {
            Some(code) => Token::new(code, identifier),
            None => Token::new(TokenCode::Identifier, identifier),
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    /// Read a string literal; a doubled quote inside is an escaped quote
    fn read_string(&mut self, quote: char) -> ExpressionResult<Token> {
        let start = self.position;
        self.advance(); // Skip opening quote
        let mut string = String::new();

        loop {
            match self.current_char() {
                Some(ch) if ch == quote => {
                    if self.peek() == Some(quote) {
                        string.push(quote);
                        self.advance();
                        self.advance();
                    } else {
                        self.advance(); // Skip closing quote
                        break;
                    }
                }
                Some(ch) => {
                    string.push(ch);
                    self.advance();
                }
                None => {
                    return Err(ExpressionError::Lex {
                        position: start,
                        message: "unterminated string literal".to_string(),
                    })
                }
            }
        }

        Ok(Token::string(string))
    }

    /// Read a number (integer or double)
    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        let mut has_dot = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                has_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if has_dot {
            Token::new(TokenCode::Double, number)
        } else {
            Token::new(TokenCode::Integer, number)
        }
    }

    /// Tokenize the entire input, whitespace tokens included
    pub fn tokenize(&mut self) -> ExpressionResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

/// Helper function to tokenize an expression string
pub fn tokenize(input: &str) -> ExpressionResult<Vec<Token>> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(input: &str) -> Vec<TokenCode> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.code)
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            codes("+ - * / < <= > == !="),
            vec![
                TokenCode::Plus,
                TokenCode::Minus,
                TokenCode::Mul,
                TokenCode::Div,
                TokenCode::Less,
                TokenCode::LessEqual,
                TokenCode::Greater,
                TokenCode::Equal,
                TokenCode::NotEqual,
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            codes("sqrt(x) AND emp.salary or MAX"),
            vec![
                TokenCode::Sqrt,
                TokenCode::LeftParen,
                TokenCode::Identifier,
                TokenCode::RightParen,
                TokenCode::And,
                TokenCode::QualifiedIdentifier,
                TokenCode::Or,
                TokenCode::Max,
            ]
        );
        let tokens = tokenize("emp.salary").unwrap();
        assert_eq!(tokens[0].text, "emp.salary");
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("123 456.789 7").unwrap();
        assert_eq!(tokens[0], Token::new(TokenCode::Integer, "123"));
        assert_eq!(tokens[2], Token::new(TokenCode::Double, "456.789"));
        assert_eq!(tokens[4], Token::new(TokenCode::Integer, "7"));

        // A trailing dot is not part of the number
        let mut lexer = Lexer::new("7.");
        assert_eq!(
            lexer.next_token().unwrap(),
            Some(Token::new(TokenCode::Integer, "7"))
        );
        assert!(lexer.next_token().unwrap_err().to_string().contains("'.'"));
    }

    #[test]
    fn test_string_literals() {
        let tokens = tokenize(r#"'hello world' "it""s" 'a''b'"#).unwrap();
        assert_eq!(tokens[0], Token::string("hello world"));
        assert_eq!(tokens[2], Token::string("it\"s"));
        assert_eq!(tokens[4], Token::string("a'b"));
    }

    #[test]
    fn test_whitespace_and_eol_tokens() {
        let tokens = tokenize("a \t+\nb").unwrap();
        let all: Vec<TokenCode> = tokens.iter().map(|t| t.code).collect();
        assert_eq!(
            all,
            vec![
                TokenCode::Identifier,
                TokenCode::Whitespace,
                TokenCode::Plus,
                TokenCode::Eol,
                TokenCode::Identifier,
            ]
        );
        assert_eq!(tokens[1].text, " \t");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            tokenize("'open"),
            Err(ExpressionError::Lex { position: 0, .. })
        ));
        assert!(matches!(
            tokenize("a = b"),
            Err(ExpressionError::Lex { position: 3, .. })
        ));
        assert!(matches!(
            tokenize("a # b"),
            Err(ExpressionError::Lex { position: 2, .. })
        ));
    }
}
