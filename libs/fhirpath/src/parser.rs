//! Recursive descent parser.
//!
//! Precedence follows the official grammar, loosest to tightest: implies,
//! or/xor, and, membership, equality, inequality, union, type, additive,
//! multiplicative, polarity, postfix (invocation and indexer), term. Note
//! the HL7 quirk that `is`/`as` bind tighter than `|`, so `a as X | b` is a
//! union whose left side is the cast.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::{
    AdditiveOperator, EqualityOperator, Expression, InequalityOperator, MembershipOperator,
    MultiplicativeOperator, OrOperator, PolarityOperator, TypeOperator, TypeSpecifier,
};
use crate::error::{FhirPathError, Result};
use crate::lexer::Lexer;
use crate::temporal;
use crate::token::{Token, TokenType};

// Each level of `parse_expression` walks the whole precedence chain, so the
// native stack spends roughly a dozen frames per unit of depth. The cap has
// to trip long before that budget runs out on a default thread stack.
const MAX_RECURSION_DEPTH: usize = 64;

/// Parses a complete expression, requiring all input to be consumed.
pub fn parse(input: &str) -> Result<Expression> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expression = parser.parse_expression()?;
    parser.expect_eof()?;
    Ok(expression)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        // The token stream always ends with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.current().token_type == token_type
    }

    fn eat(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token_type: TokenType, what: &str) -> Result<Token> {
        if self.check(token_type) {
            Ok(self.bump())
        } else {
            Err(self.error(format!("Expected {what}")))
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> FhirPathError {
        let token = self.current();
        let got = if token.token_type == TokenType::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", token.value)
        };
        FhirPathError::parse(format!("{message}, got {got}"), token.line, token.column)
    }

    fn parse_expression(&mut self) -> Result<Expression> {
        self.depth += 1;
        if self.depth > MAX_RECURSION_DEPTH {
            let token = self.current();
            return Err(FhirPathError::parse(
                "Expression too deeply nested",
                token.line,
                token.column,
            ));
        }
        let result = self.parse_implies();
        self.depth -= 1;
        result
    }

    fn parse_implies(&mut self) -> Result<Expression> {
        let mut left = self.parse_or()?;
        while self.eat(TokenType::Implies) {
            let right = self.parse_or()?;
            left = Expression::Implies {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_and()?;
        loop {
            let operator = if self.eat(TokenType::Or) {
                OrOperator::Or
            } else if self.eat(TokenType::Xor) {
                OrOperator::Xor
            } else {
                return Ok(left);
            };
            let right = self.parse_and()?;
            left = Expression::Or {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_membership()?;
        while self.eat(TokenType::And) {
            let right = self.parse_membership()?;
            left = Expression::And {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_membership(&mut self) -> Result<Expression> {
        let mut left = self.parse_equality()?;
        loop {
            let operator = if self.eat(TokenType::In) {
                MembershipOperator::In
            } else if self.eat(TokenType::Contains) {
                MembershipOperator::Contains
            } else {
                return Ok(left);
            };
            let right = self.parse_equality()?;
            left = Expression::Membership {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut left = self.parse_inequality()?;
        loop {
            let operator = if self.eat(TokenType::Equal) {
                EqualityOperator::Equal
            } else if self.eat(TokenType::NotEqual) {
                EqualityOperator::NotEqual
            } else if self.eat(TokenType::Equivalent) {
                EqualityOperator::Equivalent
            } else if self.eat(TokenType::NotEquivalent) {
                EqualityOperator::NotEquivalent
            } else {
                return Ok(left);
            };
            let right = self.parse_inequality()?;
            left = Expression::Equality {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_inequality(&mut self) -> Result<Expression> {
        let mut left = self.parse_union()?;
        loop {
            let operator = if self.eat(TokenType::LessThan) {
                InequalityOperator::LessThan
            } else if self.eat(TokenType::LessThanOrEqual) {
                InequalityOperator::LessThanOrEqual
            } else if self.eat(TokenType::GreaterThan) {
                InequalityOperator::GreaterThan
            } else if self.eat(TokenType::GreaterThanOrEqual) {
                InequalityOperator::GreaterThanOrEqual
            } else {
                return Ok(left);
            };
            let right = self.parse_union()?;
            left = Expression::Inequality {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_union(&mut self) -> Result<Expression> {
        let mut left = self.parse_type()?;
        while self.eat(TokenType::Pipe) {
            let right = self.parse_type()?;
            left = Expression::Union {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_type(&mut self) -> Result<Expression> {
        let mut expression = self.parse_additive()?;
        loop {
            let operator = if self.eat(TokenType::Is) {
                TypeOperator::Is
            } else if self.eat(TokenType::As) {
                TypeOperator::As
            } else {
                return Ok(expression);
            };
            let type_specifier = self.parse_type_specifier()?;
            expression = Expression::TypeTest {
                operator,
                operand: Box::new(expression),
                type_specifier,
            };
        }
    }

    fn parse_type_specifier(&mut self) -> Result<TypeSpecifier> {
        let first = self.parse_identifier_name("a type name")?;
        if self.eat(TokenType::Dot) {
            let name = self.parse_identifier_name("a type name")?;
            Ok(TypeSpecifier::new(Some(first), name))
        } else {
            Ok(TypeSpecifier::bare(first))
        }
    }

    fn parse_identifier_name(&mut self, what: &str) -> Result<String> {
        if matches!(
            self.current().token_type,
            TokenType::Identifier | TokenType::DelimitedIdentifier
        ) {
            Ok(self.bump().value)
        } else {
            Err(self.error(format!("Expected {what}")))
        }
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let operator = if self.eat(TokenType::Plus) {
                AdditiveOperator::Plus
            } else if self.eat(TokenType::Minus) {
                AdditiveOperator::Minus
            } else if self.eat(TokenType::Ampersand) {
                AdditiveOperator::Concat
            } else {
                return Ok(left);
            };
            let right = self.parse_multiplicative()?;
            left = Expression::Additive {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_polarity()?;
        loop {
            let operator = if self.eat(TokenType::Multiply) {
                MultiplicativeOperator::Multiply
            } else if self.eat(TokenType::Divide) {
                MultiplicativeOperator::Divide
            } else if self.eat(TokenType::Div) {
                MultiplicativeOperator::Div
            } else if self.eat(TokenType::Mod) {
                MultiplicativeOperator::Mod
            } else {
                return Ok(left);
            };
            let right = self.parse_polarity()?;
            left = Expression::Multiplicative {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_polarity(&mut self) -> Result<Expression> {
        // Signs are collapsed iteratively so a long run cannot recurse.
        let mut negated = false;
        loop {
            if self.eat(TokenType::Minus) {
                negated = !negated;
            } else if !self.eat(TokenType::Plus) {
                break;
            }
        }
        let operand = self.parse_postfix()?;
        if !negated {
            return Ok(operand);
        }
        // Fold negation into numeric literals.
        Ok(match operand {
            Expression::Integer(i) => Expression::Integer(-i),
            Expression::Long(i) => Expression::Long(-i),
            Expression::Decimal(d) => Expression::Decimal(-d),
            Expression::Quantity { value, unit } => Expression::Quantity {
                value: -value,
                unit,
            },
            other => Expression::Polarity {
                operator: PolarityOperator::Minus,
                operand: Box::new(other),
            },
        })
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let mut expression = self.parse_term()?;
        loop {
            if self.eat(TokenType::Dot) {
                let invocation = self.parse_invocation()?;
                expression = Expression::Invocation {
                    target: Box::new(expression),
                    invocation: Box::new(invocation),
                };
            } else if self.eat(TokenType::OpenBracket) {
                let index = self.parse_expression()?;
                self.expect(TokenType::CloseBracket, "']'")?;
                expression = Expression::Indexer {
                    collection: Box::new(expression),
                    index: Box::new(index),
                };
            } else {
                return Ok(expression);
            }
        }
    }

    /// A member or function after `.`; keyword operators double as names
    /// here (`Patient.contains`).
    fn parse_invocation(&mut self) -> Result<Expression> {
        let Some(name) = self.current().identifier_text().map(str::to_string) else {
            return Err(self.error("Expected a member or function name"));
        };
        self.bump();
        if self.check(TokenType::OpenParen) {
            self.parse_function(name)
        } else {
            Ok(Expression::Member(name))
        }
    }

    fn parse_function(&mut self, name: String) -> Result<Expression> {
        self.expect(TokenType::OpenParen, "'('")?;
        let mut arguments = Vec::new();
        if !self.check(TokenType::CloseParen) {
            loop {
                arguments.push(self.parse_expression()?);
                if !self.eat(TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::CloseParen, "')'")?;
        Ok(Expression::Function { name, arguments })
    }

    fn parse_term(&mut self) -> Result<Expression> {
        match self.current().token_type {
            TokenType::NumberLiteral => self.parse_number(),
            TokenType::LongNumberLiteral => {
                let token = self.bump();
                let value = i64::from_str(&token.value).map_err(|_| {
                    FhirPathError::parse("Invalid long literal", token.line, token.column)
                })?;
                Ok(Expression::Long(value))
            }
            TokenType::BooleanLiteral => {
                let token = self.bump();
                Ok(Expression::Boolean(token.value == "true"))
            }
            TokenType::StringLiteral => Ok(Expression::String(self.bump().value)),
            TokenType::DateLiteral => {
                let token = self.bump();
                let (date, precision) = temporal::parse_date(&token.value).ok_or_else(|| {
                    FhirPathError::parse("Invalid date literal", token.line, token.column)
                })?;
                Ok(Expression::Date(date, precision))
            }
            TokenType::DateTimeLiteral => {
                let token = self.bump();
                let (value, precision, offset) =
                    temporal::parse_datetime(&token.value).ok_or_else(|| {
                        FhirPathError::parse("Invalid datetime literal", token.line, token.column)
                    })?;
                Ok(Expression::DateTime(value, precision, offset))
            }
            TokenType::TimeLiteral => {
                let token = self.bump();
                let (time, precision) = temporal::parse_time(&token.value).ok_or_else(|| {
                    FhirPathError::parse("Invalid time literal", token.line, token.column)
                })?;
                Ok(Expression::Time(time, precision))
            }
            TokenType::This => {
                self.bump();
                Ok(Expression::This)
            }
            TokenType::Index => {
                self.bump();
                Ok(Expression::Index)
            }
            TokenType::Total => {
                self.bump();
                Ok(Expression::Total)
            }
            TokenType::ExternalConstant => Ok(Expression::ExternalConstant(self.bump().value)),
            TokenType::OpenParen => {
                self.bump();
                let expression = self.parse_expression()?;
                self.expect(TokenType::CloseParen, "')'")?;
                Ok(expression)
            }
            TokenType::OpenBrace => {
                self.bump();
                self.expect(TokenType::CloseBrace, "'}'")?;
                Ok(Expression::Empty)
            }
            TokenType::Identifier | TokenType::DelimitedIdentifier => {
                let name = self.bump().value;
                if self.check(TokenType::OpenParen) {
                    self.parse_function(name)
                } else {
                    Ok(Expression::Member(name))
                }
            }
            _ => Err(self.error("Expected an expression")),
        }
    }

    /// A number literal, possibly continuing as a quantity: `4.5 'mg'`,
    /// `6 days`.
    fn parse_number(&mut self) -> Result<Expression> {
        let token = self.bump();
        let decimal = Decimal::from_str(&token.value).map_err(|_| {
            FhirPathError::parse("Invalid number literal", token.line, token.column)
        })?;
        if self.check(TokenType::StringLiteral) {
            let unit = self.bump().value;
            return Ok(Expression::Quantity {
                value: decimal,
                unit: Some(unit),
            });
        }
        if self.check(TokenType::Identifier) && temporal::is_calendar_unit(&self.current().value) {
            let unit = self.bump().value;
            return Ok(Expression::Quantity {
                value: decimal,
                unit: Some(unit),
            });
        }
        if token.value.contains('.') {
            Ok(Expression::Decimal(decimal))
        } else {
            let value = i64::from_str(&token.value).map_err(|_| {
                FhirPathError::parse("Integer literal out of range", token.line, token.column)
            })?;
            Ok(Expression::Integer(value))
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        if self.check(TokenType::Eof) {
            Ok(())
        } else {
            Err(self.error("Expected end of expression"))
        }
    }
}
