//! Lexical tokens.

/// The kinds of token the lexer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Literals
    StringLiteral,
    NumberLiteral,
    LongNumberLiteral,
    BooleanLiteral,
    DateLiteral,
    DateTimeLiteral,
    TimeLiteral,

    // Identifiers
    Identifier,
    DelimitedIdentifier,

    // Keyword operators
    As,
    Is,
    Div,
    Mod,
    In,
    Contains,
    And,
    Or,
    Xor,
    Implies,

    // Environment references
    This,  // $this
    Index, // $index
    Total, // $total

    /// `%identifier` or `%'string'`
    ExternalConstant,

    // Symbol operators
    Dot,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Comma,
    Plus,
    Minus,
    Multiply,
    Divide,
    Ampersand,
    Pipe,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    Equivalent,
    NotEquivalent,

    Eof,
}

/// One token with its source position.
///
/// `value` holds the literal body: the unescaped text of string literals and
/// delimited identifiers, the digits of numbers, the text after `@` for
/// temporal literals, the name after `%` for external constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        value: impl Into<String>,
        position: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Token {
            token_type,
            value: value.into(),
            position,
            line,
            column,
        }
    }

    pub fn eof(position: usize, line: usize, column: usize) -> Self {
        Token::new(TokenType::Eof, "", position, line, column)
    }

    /// The identifier text when this token can serve as a member name.
    ///
    /// Keyword operators double as ordinary identifiers after a `.` or
    /// before `(`: `Patient.contains` is a member, `5 contains x` is not.
    pub fn identifier_text(&self) -> Option<&str> {
        match self.token_type {
            TokenType::Identifier | TokenType::DelimitedIdentifier => Some(&self.value),
            TokenType::As => Some("as"),
            TokenType::Is => Some("is"),
            TokenType::Div => Some("div"),
            TokenType::Mod => Some("mod"),
            TokenType::In => Some("in"),
            TokenType::Contains => Some("contains"),
            TokenType::And => Some("and"),
            TokenType::Or => Some("or"),
            TokenType::Xor => Some("xor"),
            TokenType::Implies => Some("implies"),
            _ => None,
        }
    }
}
