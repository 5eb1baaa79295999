use std::mem;

use crate::{
    ast::{BinOp, Expr, LogicalOp, Token, UnaryOp},
    lexer::{LexError, Lexer, Position, Spanned},
    path,
};

/// Errors raised while building the syntax tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, found {found} at {position}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        position: Position,
    },

    #[error("tuple at {position} is only allowed as the right operand of 'in' or 'not in'")]
    MisplacedTuple { position: Position },

    #[error("regex literal at {position} is only allowed as the right operand of 'match'")]
    MisplacedRegex { position: Position },

    #[error("expression nested too deeply at {position}")]
    TooDeep { position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex(e) => e.position(),
            ParseError::UnexpectedToken { position, .. }
            | ParseError::MisplacedTuple { position }
            | ParseError::MisplacedRegex { position }
            | ParseError::TooDeep { position } => *position,
        }
    }
}

/// Deepest syntax tree the parser builds. Lowering and dropping the tree
/// recurse once per level.
pub const MAX_DEPTH: usize = 256;

/// Most subexpressions open inside one another: groups, call arguments,
/// tuple elements and conditional branches. Each one re-enters every
/// precedence tier.
pub const MAX_NESTING: usize = 32;

/// Precedence-climbing parser over the lexer's token stream.
///
/// Each `parse_*` method handles one precedence tier and delegates to the
/// next tighter tier for its operands.
pub struct Parser {
    lexer: Lexer,
    current: Spanned,
    depth: usize,
    nesting: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current = lexer.next_spanned()?;
        Ok(Parser {
            lexer,
            current,
            depth: 0,
            nesting: 0,
        })
    }

    /// Counts one more level of the tree under construction. Callers reset
    /// `depth` to the value they started with once their node is built.
    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return self.too_deep();
        }
        self.depth += 1;
        Ok(())
    }

    fn too_deep<T>(&self) -> Result<T, ParseError> {
        Err(ParseError::TooDeep {
            position: self.current.position,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_spanned()?;
        Ok(())
    }

    /// Moves past the current token and hands it back.
    fn bump(&mut self) -> Result<Spanned, ParseError> {
        let next = self.lexer.next_spanned()?;
        Ok(mem::replace(&mut self.current, next))
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current.token) == mem::discriminant(token)
    }

    fn unexpected<T>(&self, expected: &'static str) -> Result<T, ParseError> {
        Err(ParseError::UnexpectedToken {
            expected,
            found: self.current.token.to_string(),
            position: self.current.position,
        })
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), ParseError> {
        if !self.check(&token) {
            return self.unexpected(expected);
        }
        self.advance()
    }

    /// Parses a complete expression and requires the input to end there.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(Token::Eof, "end of input")?;
        Ok(expr)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        if self.nesting >= MAX_NESTING {
            return self.too_deep();
        }
        self.nesting += 1;
        let expr = self.parse_ternary();
        self.nesting -= 1;
        expr
    }

    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let condition = self.parse_or()?;

        if !self.check(&Token::Question) {
            return Ok(condition);
        }
        let depth = self.depth;
        self.descend()?;
        self.advance()?;
        let then_branch = self.parse_expression()?;
        self.expect(Token::Colon, "':' in conditional expression")?;
        let else_branch = self.parse_expression()?;
        self.depth = depth;

        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_and()?;

        while self.check(&Token::Or) {
            self.descend()?;
            self.advance()?;
            let right = self.parse_and()?;

            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_not()?;

        while self.check(&Token::And) {
            self.descend()?;
            self.advance()?;
            let right = self.parse_not()?;

            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::Not) {
            let depth = self.depth;
            self.descend()?;
            self.advance()?;
            let operand = self.parse_not()?;
            self.depth = depth;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_membership()?;

        loop {
            let op = match &self.current.token {
                Token::EqEq => BinOp::Equal,
                Token::NotEq => BinOp::NotEqual,
                Token::Lt => BinOp::LessThan,
                Token::Gt => BinOp::GreaterThan,
                Token::LtEq => BinOp::LessEqual,
                Token::GtEq => BinOp::GreaterEqual,
                _ => break,
            };

            self.descend()?;
            self.advance()?;
            let right = self.parse_membership()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(left)
    }

    /// `in`, `not in`, `has`, `match` / `~`
    fn parse_membership(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_additive()?;

        loop {
            if matches!(
                self.current.token,
                Token::In | Token::NotIn | Token::Has | Token::Match
            ) {
                self.descend()?;
            }
            left = match &self.current.token {
                Token::In | Token::NotIn => {
                    let negated = self.check(&Token::NotIn);
                    self.advance()?;
                    let tuple = self.parse_tuple()?;
                    Expr::In {
                        needle: Box::new(left),
                        tuple,
                        negated,
                    }
                }
                Token::Has => {
                    self.advance()?;
                    let right = self.parse_additive()?;
                    Expr::BinaryOp {
                        op: BinOp::Has,
                        left: Box::new(left),
                        right: Box::new(right),
                    }
                }
                Token::Match => {
                    self.advance()?;
                    let spanned = self.bump()?;
                    match spanned.token {
                        Token::Regex(pattern) => Expr::Match {
                            subject: Box::new(left),
                            pattern,
                        },
                        found => {
                            return Err(ParseError::UnexpectedToken {
                                expected: "regex literal after 'match'",
                                found: found.to_string(),
                                position: spanned.position,
                            });
                        }
                    }
                }
                _ => break,
            };
        }
        self.depth = depth;
        Ok(left)
    }

    /// `(a, b, c)` on the right of `in` / `not in`; at least one element.
    fn parse_tuple(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(Token::LParen, "'(' to open a tuple")?;
        self.parse_list("',' or ')' in tuple")
    }

    /// One or more comma-separated expressions up to and including the
    /// closing `)`. A trailing comma is an error.
    fn parse_list(&mut self, expected: &'static str) -> Result<Vec<Expr>, ParseError> {
        let mut elements = vec![self.parse_expression()?];

        while !self.check(&Token::RParen) {
            self.expect(Token::Comma, expected)?;
            elements.push(self.parse_expression()?);
        }

        self.advance()?;
        Ok(elements)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current.token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };

            self.descend()?;
            self.advance()?;
            let right = self.parse_multiplicative()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = self.parse_power()?;

        loop {
            let op = match &self.current.token {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                Token::Percent => BinOp::Modulo,
                _ => break,
            };

            self.descend()?;
            self.advance()?;
            let right = self.parse_power()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_unary()?;

        if !self.check(&Token::Caret) {
            return Ok(base);
        }
        let depth = self.depth;
        self.descend()?;
        self.advance()?;
        let exponent = self.parse_power()?; // Right-associative
        self.depth = depth;

        Ok(Expr::BinaryOp {
            op: BinOp::Power,
            left: Box::new(base),
            right: Box::new(exponent),
        })
    }

    /// `-x`, and `not x` where an operator expects an operand (`1 == not 0`).
    /// The `not` operand still extends over comparisons, as at the top level.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::Not) {
            return self.parse_not();
        }
        if self.check(&Token::Minus) {
            let depth = self.depth;
            self.descend()?;
            self.advance()?;
            let operand = self.parse_unary()?;
            self.depth = depth;
            return Ok(Expr::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    /// Parse primary expressions: literals, paths, calls, parenthesized groups
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Spanned { token, position } = self.bump()?;
        let depth = self.depth;

        match token {
            Token::Float(n) => Ok(Expr::Float(n)),
            Token::Integer(n) => Ok(Expr::Integer(n)),
            Token::String(s) => Ok(Expr::String(s)),
            // A path directly followed by `(` names a function
            Token::Identifier(name) if self.check(&Token::LParen) => {
                self.descend()?;
                self.advance()?;
                let args = if self.check(&Token::RParen) {
                    self.advance()?;
                    vec![]
                } else {
                    self.parse_list("',' or ')' in argument list")?
                };
                self.depth = depth;
                Ok(Expr::Call { name, args })
            }
            Token::Identifier(raw) => Ok(Expr::Path(path::normalize(&raw))),
            Token::LParen => {
                self.descend()?;
                let expr = self.parse_expression()?;
                if self.check(&Token::Comma) {
                    return Err(ParseError::MisplacedTuple { position });
                }
                self.expect(Token::RParen, "')' to close group")?;
                self.depth = depth;
                Ok(expr)
            }
            Token::Regex(_) => Err(ParseError::MisplacedRegex { position }),
            found => Err(ParseError::UnexpectedToken {
                expected: "an operand",
                found: found.to_string(),
                position,
            }),
        }
    }
}

/// Parses `source` into a syntax tree.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    Parser::new(Lexer::new(source))?.parse()
}
