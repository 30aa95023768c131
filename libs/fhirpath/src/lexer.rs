//! Char-walking lexer for FHIRPath expressions.
//!
//! Produces the full token stream up front. Comments (`//` and `/* */`) and
//! whitespace are skipped; string literals and delimited identifiers are
//! unescaped here so the parser only sees their text.

use crate::error::{FhirPathError, Result};
use crate::token::{Token, TokenType};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.token_type == TokenType::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> FhirPathError {
        FhirPathError::parse(message, self.line, self.column)
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek() {
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                            None => return Err(self.error("Unterminated comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia()?;
        let (position, line, column) = (self.pos, self.line, self.column);
        let token = |token_type, value: &str| Token::new(token_type, value, position, line, column);

        let Some(c) = self.peek() else {
            return Ok(Token::eof(position, line, column));
        };
        match c {
            '(' => self.symbol(TokenType::OpenParen, position, line, column),
            ')' => self.symbol(TokenType::CloseParen, position, line, column),
            '[' => self.symbol(TokenType::OpenBracket, position, line, column),
            ']' => self.symbol(TokenType::CloseBracket, position, line, column),
            '{' => self.symbol(TokenType::OpenBrace, position, line, column),
            '}' => self.symbol(TokenType::CloseBrace, position, line, column),
            ',' => self.symbol(TokenType::Comma, position, line, column),
            '.' => self.symbol(TokenType::Dot, position, line, column),
            '+' => self.symbol(TokenType::Plus, position, line, column),
            '-' => self.symbol(TokenType::Minus, position, line, column),
            '*' => self.symbol(TokenType::Multiply, position, line, column),
            '/' => self.symbol(TokenType::Divide, position, line, column),
            '&' => self.symbol(TokenType::Ampersand, position, line, column),
            '|' => self.symbol(TokenType::Pipe, position, line, column),
            '=' => self.symbol(TokenType::Equal, position, line, column),
            '~' => self.symbol(TokenType::Equivalent, position, line, column),
            '<' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(token(TokenType::LessThanOrEqual, "<="))
                } else {
                    Ok(token(TokenType::LessThan, "<"))
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(token(TokenType::GreaterThanOrEqual, ">="))
                } else {
                    Ok(token(TokenType::GreaterThan, ">"))
                }
            }
            '!' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        Ok(token(TokenType::NotEqual, "!="))
                    }
                    Some('~') => {
                        self.advance();
                        Ok(token(TokenType::NotEquivalent, "!~"))
                    }
                    _ => Err(self.error("Expected '=' or '~' after '!'")),
                }
            }
            '\'' => {
                self.advance();
                let text = self.read_escaped('\'')?;
                Ok(Token::new(
                    TokenType::StringLiteral,
                    text,
                    position,
                    line,
                    column,
                ))
            }
            '`' => {
                self.advance();
                let text = self.read_escaped('`')?;
                Ok(Token::new(
                    TokenType::DelimitedIdentifier,
                    text,
                    position,
                    line,
                    column,
                ))
            }
            '%' => {
                self.advance();
                let name = match self.peek() {
                    Some('\'') => {
                        self.advance();
                        self.read_escaped('\'')?
                    }
                    Some('`') => {
                        self.advance();
                        self.read_escaped('`')?
                    }
                    Some(c) if is_identifier_start(c) => self.read_identifier(),
                    _ => return Err(self.error("Expected a name after '%'")),
                };
                Ok(Token::new(
                    TokenType::ExternalConstant,
                    name,
                    position,
                    line,
                    column,
                ))
            }
            '@' => {
                self.advance();
                self.read_temporal(position, line, column)
            }
            '$' => {
                self.advance();
                let name = self.read_identifier();
                let token_type = match name.as_str() {
                    "this" => TokenType::This,
                    "index" => TokenType::Index,
                    "total" => TokenType::Total,
                    _ => return Err(self.error(format!("Unknown environment reference ${name}"))),
                };
                Ok(Token::new(token_type, name, position, line, column))
            }
            '0'..='9' => self.read_number(position, line, column),
            c if is_identifier_start(c) => {
                let name = self.read_identifier();
                let token_type = match name.as_str() {
                    "true" | "false" => TokenType::BooleanLiteral,
                    "as" => TokenType::As,
                    "is" => TokenType::Is,
                    "div" => TokenType::Div,
                    "mod" => TokenType::Mod,
                    "in" => TokenType::In,
                    "contains" => TokenType::Contains,
                    "and" => TokenType::And,
                    "or" => TokenType::Or,
                    "xor" => TokenType::Xor,
                    "implies" => TokenType::Implies,
                    _ => TokenType::Identifier,
                };
                Ok(Token::new(token_type, name, position, line, column))
            }
            c => Err(self.error(format!("Unexpected character '{c}'"))),
        }
    }

    fn symbol(
        &mut self,
        token_type: TokenType,
        position: usize,
        line: usize,
        column: usize,
    ) -> Result<Token> {
        let c = self.advance().unwrap_or_default();
        Ok(Token::new(
            token_type,
            c.to_string(),
            position,
            line,
            column,
        ))
    }

    /// Reads until `terminator`, processing backslash escapes.
    fn read_escaped(&mut self, terminator: char) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error("Unterminated string")),
                Some(c) if c == terminator => return Ok(text),
                Some('\\') => match self.advance() {
                    Some('\'') => text.push('\''),
                    Some('"') => text.push('"'),
                    Some('`') => text.push('`'),
                    Some('\\') => text.push('\\'),
                    Some('/') => text.push('/'),
                    Some('f') => text.push('\u{000C}'),
                    Some('n') => text.push('\n'),
                    Some('r') => text.push('\r'),
                    Some('t') => text.push('\t'),
                    Some('u') => {
                        let mut code = 0u32;
                        for _ in 0..4 {
                            let digit = self
                                .advance()
                                .and_then(|c| c.to_digit(16))
                                .ok_or_else(|| self.error("Invalid unicode escape"))?;
                            code = code * 16 + digit;
                        }
                        let c = char::from_u32(code)
                            .ok_or_else(|| self.error("Invalid unicode escape"))?;
                        text.push(c);
                    }
                    Some(c) => return Err(self.error(format!("Invalid escape '\\{c}'"))),
                    None => return Err(self.error("Unterminated string")),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if is_identifier_part(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    fn read_number(&mut self, position: usize, line: usize, column: usize) -> Result<Token> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        // A dot only belongs to the number when digits follow: 5.single()
        // is an invocation on 5.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            return Ok(Token::new(
                TokenType::NumberLiteral,
                text,
                position,
                line,
                column,
            ));
        }
        if self.peek() == Some('L') {
            self.advance();
            return Ok(Token::new(
                TokenType::LongNumberLiteral,
                text,
                position,
                line,
                column,
            ));
        }
        Ok(Token::new(
            TokenType::NumberLiteral,
            text,
            position,
            line,
            column,
        ))
    }

    /// Reads the body of an `@` literal and classifies it.
    fn read_temporal(&mut self, position: usize, line: usize, column: usize) -> Result<Token> {
        let mut body = String::new();
        while let Some(c) = self.peek() {
            // A dot only belongs to the literal as a fraction; otherwise it
            // starts a member invocation on the literal.
            let take = match c {
                '.' => self.peek_at(1).is_some_and(|d| d.is_ascii_digit()),
                _ => c.is_ascii_digit() || matches!(c, '-' | ':' | '+' | 'T' | 'Z'),
            };
            if take {
                body.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if body.is_empty() {
            return Err(self.error("Expected a date or time after '@'"));
        }
        let (token_type, value) = if let Some(time) = body.strip_prefix('T') {
            (TokenType::TimeLiteral, time.to_string())
        } else if body.contains('T') {
            (TokenType::DateTimeLiteral, body)
        } else {
            (TokenType::DateLiteral, body)
        };
        Ok(Token::new(token_type, value, position, line, column))
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(input: &str) -> Vec<TokenType> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_member_path() {
        assert_eq!(
            types("Patient.name.given"),
            vec![
                TokenType::Identifier,
                TokenType::Dot,
                TokenType::Identifier,
                TokenType::Dot,
                TokenType::Identifier,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_number_then_invocation() {
        assert_eq!(
            types("5.single()"),
            vec![
                TokenType::NumberLiteral,
                TokenType::Dot,
                TokenType::Identifier,
                TokenType::OpenParen,
                TokenType::CloseParen,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let tokens = Lexer::new(r"'a\'bA\n'").tokenize().unwrap();
        assert_eq!(tokens[0].token_type, TokenType::StringLiteral);
        assert_eq!(tokens[0].value, "a'bA\n");
    }

    #[test]
    fn test_delimited_identifier() {
        let tokens = Lexer::new("`PID-1`").tokenize().unwrap();
        assert_eq!(tokens[0].token_type, TokenType::DelimitedIdentifier);
        assert_eq!(tokens[0].value, "PID-1");
    }

    #[test]
    fn test_temporal_classification() {
        let tokens = Lexer::new("@2012-04-15 @2012-04-15T10:00:00Z @T14:34:28")
            .tokenize()
            .unwrap();
        assert_eq!(tokens[0].token_type, TokenType::DateLiteral);
        assert_eq!(tokens[0].value, "2012-04-15");
        assert_eq!(tokens[1].token_type, TokenType::DateTimeLiteral);
        assert_eq!(tokens[1].value, "2012-04-15T10:00:00Z");
        assert_eq!(tokens[2].token_type, TokenType::TimeLiteral);
        assert_eq!(tokens[2].value, "14:34:28");
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            types("1 + /* block */ 2 // trailing"),
            vec![
                TokenType::NumberLiteral,
                TokenType::Plus,
                TokenType::NumberLiteral,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_long_number() {
        let tokens = Lexer::new("42L").tokenize().unwrap();
        assert_eq!(tokens[0].token_type, TokenType::LongNumberLiteral);
        assert_eq!(tokens[0].value, "42");
    }

    #[test]
    fn test_external_constants() {
        let tokens = Lexer::new("%resource %'vs-name'").tokenize().unwrap();
        assert_eq!(tokens[0].token_type, TokenType::ExternalConstant);
        assert_eq!(tokens[0].value, "resource");
        assert_eq!(tokens[1].token_type, TokenType::ExternalConstant);
        assert_eq!(tokens[1].value, "vs-name");
    }

    #[test]
    fn test_bad_escape_is_an_error() {
        assert!(Lexer::new(r"'\q'").tokenize().is_err());
        assert!(Lexer::new("'unterminated").tokenize().is_err());
    }

    #[test]
    fn test_position_tracking() {
        let tokens = Lexer::new("a\n  bc").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    }
}
