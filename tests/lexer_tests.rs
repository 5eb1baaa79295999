// tests/lexer_tests.rs

use filtrate::ast::Token;
use filtrate::lexer::{LexError, Lexer};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn tokens(input: &str) -> Vec<Token> {
    Lexer::new(input)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|spanned| spanned.token)
        .collect()
}

// ============================================================================
// Operators and punctuation
// ============================================================================

#[rstest]
#[case("+", Token::Plus)]
#[case("-", Token::Minus)]
#[case("*", Token::Star)]
#[case("%", Token::Percent)]
#[case("^", Token::Caret)]
#[case("?", Token::Question)]
#[case(":", Token::Colon)]
#[case(",", Token::Comma)]
#[case("(", Token::LParen)]
#[case(")", Token::RParen)]
#[case("<", Token::Lt)]
#[case(">", Token::Gt)]
#[case("<=", Token::LtEq)]
#[case(">=", Token::GtEq)]
#[case("==", Token::EqEq)]
#[case("!=", Token::NotEq)]
#[case("~", Token::Match)]
fn test_symbol_tokens(#[case] input: &str, #[case] expected: Token) {
    assert_eq!(tokens(input), vec![expected, Token::Eof]);
}

#[rstest]
#[case("and", Token::And)]
#[case("or", Token::Or)]
#[case("not", Token::Not)]
#[case("in", Token::In)]
#[case("has", Token::Has)]
#[case("match", Token::Match)]
fn test_keyword_tokens(#[case] input: &str, #[case] expected: Token) {
    assert_eq!(tokens(input), vec![expected, Token::Eof]);
}

#[test]
fn test_not_in_is_one_token() {
    assert_eq!(
        tokens("x not  in (1)"),
        vec![
            Token::Identifier("x".into()),
            Token::NotIn,
            Token::LParen,
            Token::Integer(1),
            Token::RParen,
            Token::Eof,
        ]
    );
}

#[test]
fn test_not_followed_by_identifier_starting_with_in() {
    assert_eq!(
        tokens("not inside"),
        vec![Token::Not, Token::Identifier("inside".into()), Token::Eof]
    );
}

// ============================================================================
// Literals and identifiers
// ============================================================================

#[rstest]
#[case("42", Token::Integer(42))]
#[case("1.5", Token::Float(1.5))]
#[case("0.25", Token::Float(0.25))]
#[case("99999999999999999999", Token::Float(1e20))]
#[case("'single'", Token::String("single".into()))]
#[case("\"double\"", Token::String("double".into()))]
#[case(r#"'it\'s'"#, Token::String("it's".into()))]
#[case(r#""a\nb\t""#, Token::String("a\nb\t".into()))]
#[case(r#"'A\/'"#, Token::String("A/".into()))]
fn test_literals(#[case] input: &str, #[case] expected: Token) {
    assert_eq!(tokens(input), vec![expected, Token::Eof]);
}

#[rstest]
#[case("price")]
#[case("_private")]
#[case("foo.bar.baz")]
#[case("foo[bar][baz]")]
#[case("things.0")]
#[case("a1.b_2[c3]")]
fn test_identifiers_are_kept_raw(#[case] input: &str) {
    assert_eq!(tokens(input), vec![Token::Identifier(input.into()), Token::Eof]);
}

#[test]
fn test_bracket_without_word_ends_identifier() {
    let result = Lexer::new("foo[").tokenize();
    assert!(matches!(
        result,
        Err(LexError::UnexpectedCharacter { ch: '[', .. })
    ));
}

// ============================================================================
// Regex literals
// ============================================================================

#[test]
fn test_regex_after_match() {
    let toks = tokens("name ~ /^ab\\/c$/i");
    assert_eq!(toks.len(), 4);
    let Token::Regex(pattern) = &toks[2] else {
        panic!("expected regex token, got {:?}", toks[2]);
    };
    assert_eq!(pattern.source(), "^ab/c$");
    assert_eq!(pattern.flags(), "i");
    assert!(pattern.is_match("AB/C"));
}

#[test]
fn test_slash_after_operand_is_division() {
    assert_eq!(
        tokens("(a) / 2 / b"),
        vec![
            Token::LParen,
            Token::Identifier("a".into()),
            Token::RParen,
            Token::Slash,
            Token::Integer(2),
            Token::Slash,
            Token::Identifier("b".into()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_ignored_regex_flags() {
    let toks = tokens("/x/gu");
    let Token::Regex(pattern) = &toks[0] else {
        panic!("expected regex token");
    };
    assert!(pattern.is_match("x"));
}

// ============================================================================
// Errors and positions
// ============================================================================

#[test]
fn test_unterminated_string() {
    let err = Lexer::new("a == 'abc").tokenize().unwrap_err();
    assert!(matches!(err, LexError::UnterminatedString { .. }));
    assert_eq!(err.position().column, 6);
}

#[test]
fn test_unterminated_regex() {
    let err = Lexer::new("s ~ /abc").tokenize().unwrap_err();
    assert!(matches!(err, LexError::UnterminatedRegex { .. }));
}

#[test]
fn test_invalid_regex() {
    let err = Lexer::new("s ~ /(/").tokenize().unwrap_err();
    assert!(matches!(err, LexError::InvalidRegex { .. }));
}

#[test]
fn test_invalid_regex_flag() {
    let err = Lexer::new("s ~ /a/q").tokenize().unwrap_err();
    assert!(matches!(err, LexError::InvalidRegexFlag { flag: 'q', .. }));
}

#[test]
fn test_invalid_escape() {
    let err = Lexer::new(r#""\q""#).tokenize().unwrap_err();
    assert!(matches!(err, LexError::InvalidEscape { ch: 'q', .. }));
}

#[rstest]
#[case("a = 1", '=')]
#[case("!a", '!')]
fn test_incomplete_operator(#[case] input: &str, #[case] expected: char) {
    let err = Lexer::new(input).tokenize().unwrap_err();
    assert!(matches!(err, LexError::IncompleteOperator { ch, .. } if ch == expected));
}

#[test]
fn test_illegal_character_position() {
    let err = Lexer::new("a +\n  $b").tokenize().unwrap_err();
    assert!(matches!(err, LexError::UnexpectedCharacter { ch: '$', .. }));
    let position = err.position();
    assert_eq!(position.line, 2);
    assert_eq!(position.column, 3);
    assert_eq!(position.offset, 6);
}
