use std::fmt;

use crate::ast::{Pattern, PatternError, Token};

/// Location of a token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Character offset from the start of the input
    pub offset: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A token together with the position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: Position,
}

/// Errors raised while turning source text into tokens.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedCharacter { ch: char, position: Position },

    #[error("unexpected '{ch}' at {position} (did you mean '{ch}='?)")]
    IncompleteOperator { ch: char, position: Position },

    #[error("unterminated string starting at {position}")]
    UnterminatedString { position: Position },

    #[error("invalid escape sequence '\\{ch}' at {position}")]
    InvalidEscape { ch: char, position: Position },

    #[error("unterminated regex literal starting at {position}")]
    UnterminatedRegex { position: Position },

    #[error("invalid regex flag '{flag}' at {position}")]
    InvalidRegexFlag { flag: char, position: Position },

    #[error("invalid regex literal at {position}: {message}")]
    InvalidRegex { message: String, position: Position },

    #[error("invalid number '{text}' at {position}")]
    InvalidNumber { text: String, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedCharacter { position, .. }
            | LexError::IncompleteOperator { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position, .. }
            | LexError::UnterminatedRegex { position }
            | LexError::InvalidRegexFlag { position, .. }
            | LexError::InvalidRegex { position, .. }
            | LexError::InvalidNumber { position, .. } => *position,
        }
    }
}

fn keyword(word: &str) -> Option<Token> {
    match word {
        "and" => Some(Token::And),
        "or" => Some(Token::Or),
        "not" => Some(Token::Not),
        "in" => Some(Token::In),
        "has" => Some(Token::Has),
        "match" => Some(Token::Match),
        _ => None,
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Whether a `/` at the current point opens a regex literal
    operand_expected: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            operand_expected: true,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn here(&self) -> Position {
        Position {
            offset: self.position,
            line: self.line,
            column: self.column,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Length of a `[word]` segment starting at the current `[`, if any.
    fn bracket_segment_len(&self) -> Option<usize> {
        let mut len = 1;
        while self.peek_char(len).is_some_and(is_word_char) {
            len += 1;
        }
        (len > 1 && self.peek_char(len) == Some(']')).then_some(len + 1)
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if is_word_char(ch) || ch == '.' {
                result.push(ch);
                self.advance();
            } else if ch == '[' {
                let Some(len) = self.bracket_segment_len() else {
                    break;
                };
                for _ in 0..len {
                    if let Some(c) = self.current_char() {
                        result.push(c);
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
        result
    }

    /// True when the upcoming input is whitespace followed by the word `in`.
    fn followed_by_in(&self) -> bool {
        let mut offset = 0;
        while self.peek_char(offset).is_some_and(char::is_whitespace) {
            offset += 1;
        }
        offset > 0
            && self.peek_char(offset) == Some('i')
            && self.peek_char(offset + 1) == Some('n')
            && !self
                .peek_char(offset + 2)
                .is_some_and(|c| is_word_char(c) || c == '.' || c == '[')
    }

    fn read_hex_escape(&mut self, start: Position) -> Result<char, LexError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .current_char()
                .and_then(|c| c.to_digit(16))
                .ok_or(LexError::InvalidEscape { ch: 'u', position: start })?;
            code = code * 16 + digit;
            self.advance();
        }
        char::from_u32(code).ok_or(LexError::InvalidEscape { ch: 'u', position: start })
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.here();
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    let escape_at = self.here();
                    self.advance(); // Consume backslash
                    let escaped = match self.current_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some(c @ ('"' | '\'' | '\\' | '/')) => c,
                        Some('u') => {
                            self.advance();
                            result.push(self.read_hex_escape(escape_at)?);
                            continue;
                        }
                        Some(c) => {
                            return Err(LexError::InvalidEscape {
                                ch: c,
                                position: escape_at,
                            });
                        }
                        None => return Err(LexError::UnterminatedString { position: start }),
                    };
                    result.push(escaped);
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_regex(&mut self) -> Result<Pattern, LexError> {
        let start = self.here();
        let mut source = String::new();
        self.advance(); // Consume opening slash

        loop {
            match self.current_char() {
                None | Some('\n') => return Err(LexError::UnterminatedRegex { position: start }),
                Some('/') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.current_char() {
                        // `\/` only exists to get past the delimiter
                        Some('/') => source.push('/'),
                        Some(c) => {
                            source.push('\\');
                            source.push(c);
                        }
                        None => return Err(LexError::UnterminatedRegex { position: start }),
                    }
                    self.advance();
                }
                Some(c) => {
                    source.push(c);
                    self.advance();
                }
            }
        }

        let mut flags = String::new();
        while let Some(ch) = self.current_char().filter(char::is_ascii_alphabetic) {
            flags.push(ch);
            self.advance();
        }

        Pattern::new(&source, &flags).map_err(|e| match e {
            PatternError::UnknownFlag(flag) => LexError::InvalidRegexFlag {
                flag,
                position: start,
            },
            PatternError::Syntax(message) => LexError::InvalidRegex {
                message,
                position: start,
            },
        })
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.here();
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if !is_float && let Ok(n) = number.parse::<i64>() {
            return Ok(Token::Integer(n));
        }
        number
            .parse::<f64>()
            .map(Token::Float)
            .map_err(|_| LexError::InvalidNumber {
                text: number,
                position: start,
            })
    }

    fn two_char(&mut self, second: char, double: Token, single: Token) -> Token {
        self.advance();
        if self.current_char() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Reads the next token together with its starting position.
    pub fn next_spanned(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace();
        let position = self.here();

        let token = match self.current_char() {
            None => Token::Eof,
            Some(',') => self.single(Token::Comma),
            Some('+') => self.single(Token::Plus),
            Some('-') => self.single(Token::Minus),
            Some('*') => self.single(Token::Star),
            Some('%') => self.single(Token::Percent),
            Some('^') => self.single(Token::Caret),
            Some('?') => self.single(Token::Question),
            Some(':') => self.single(Token::Colon),
            Some('~') => self.single(Token::Match),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some('/') if self.operand_expected => Token::Regex(self.read_regex()?),
            Some('/') => self.single(Token::Slash),
            Some('>') => self.two_char('=', Token::GtEq, Token::Gt),
            Some('<') => self.two_char('=', Token::LtEq, Token::Lt),
            Some(ch @ ('=' | '!')) => {
                if self.peek_char(1) != Some('=') {
                    return Err(LexError::IncompleteOperator { ch, position });
                }
                self.advance();
                self.advance();
                if ch == '=' { Token::EqEq } else { Token::NotEq }
            }
            Some(quote @ ('"' | '\'')) => Token::String(self.read_string(quote)?),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();

                match keyword(&ident) {
                    Some(Token::Not) if self.followed_by_in() => {
                        self.skip_whitespace();
                        self.advance();
                        self.advance();
                        Token::NotIn
                    }
                    Some(keyword) => keyword,
                    None => Token::Identifier(ident),
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) => return Err(LexError::UnexpectedCharacter { ch, position }),
        };

        self.operand_expected = token.expects_operand();
        Ok(Spanned { token, position })
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.next_spanned().map(|spanned| spanned.token)
    }

    /// Lexes the whole input, ending with a single `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_spanned()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("and or not in has match ~");
    assert_eq!(lexer.next_token().unwrap(), Token::And);
    assert_eq!(lexer.next_token().unwrap(), Token::Or);
    assert_eq!(lexer.next_token().unwrap(), Token::NotIn);
    assert_eq!(lexer.next_token().unwrap(), Token::Has);
    assert_eq!(lexer.next_token().unwrap(), Token::Match);
    assert_eq!(lexer.next_token().unwrap(), Token::Match);
    assert_eq!(lexer.next_token().unwrap(), Token::Eof);
}

#[test]
fn test_slash_after_operand_is_division() {
    let mut lexer = Lexer::new("a / 2 / b");
    assert_eq!(lexer.next_token().unwrap(), Token::Identifier("a".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Slash);
    assert_eq!(lexer.next_token().unwrap(), Token::Integer(2));
    assert_eq!(lexer.next_token().unwrap(), Token::Slash);
    assert_eq!(lexer.next_token().unwrap(), Token::Identifier("b".to_string()));
}
