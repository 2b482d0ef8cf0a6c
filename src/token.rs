//! Token definitions
//!
//! Every token carries its kind, the byte span of its lexeme in the
//! source buffer, a source location, and a kind-specific payload: the
//! integer value of a number, the decoded codepoint of a character
//! literal, or the owned text of a string, identifier or error token.

use crate::span::{SourceLocation, Span};
use std::fmt;

/// All token kinds the lexer can produce.
///
/// Each kind is a distinct variant; keyword kinds carry no payload, the
/// keyword table maps them back to their UTF-8 spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Special tokens
    Eof,
    Error,

    // Identifiers and literals
    Identifier,
    Number,
    CharLiteral,
    StringLiteral,

    // Operators
    Plus,          // +
    Minus,         // -
    Star,          // *
    Slash,         // /
    Percent,       // %
    Equals,        // =
    DoubleEquals,  // ==
    NotEquals,     // !=
    Less,          // <
    LessEquals,    // <=
    Greater,       // >
    GreaterEquals, // >=
    And,           // &
    DoubleAnd,     // &&
    Or,            // |
    DoubleOr,      // ||
    Not,           // !
    Caret,         // ^
    Tilde,         // ~

    // Delimiters
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Semicolon,    // ;
    Comma,        // ,
    Dot,          // .
    Colon,        // :
    Underscore,   // _ (array literal delimiter)

    // Keywords
    If,       // ако
    Else,     // иначе
    While,    // док
    For,      // за
    Do,       // ради
    Break,    // прекини
    Return,   // врати
    External, // екстерно
    True,     // тачно
    False,    // нетачно
}

impl TokenKind {
    /// Whether this kind is one of the ten keywords.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Do
                | TokenKind::Break
                | TokenKind::Return
                | TokenKind::External
                | TokenKind::True
                | TokenKind::False
        )
    }

    /// Whether this kind may appear as the operator tag of a binary or
    /// unary expression node.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::DoubleEquals
                | TokenKind::NotEquals
                | TokenKind::Less
                | TokenKind::LessEquals
                | TokenKind::Greater
                | TokenKind::GreaterEquals
                | TokenKind::And
                | TokenKind::DoubleAnd
                | TokenKind::Or
                | TokenKind::DoubleOr
                | TokenKind::Not
                | TokenKind::Caret
                | TokenKind::Tilde
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Eof => "end of file",
            TokenKind::Error => "error",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::CharLiteral => "character literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Equals => "=",
            TokenKind::DoubleEquals => "==",
            TokenKind::NotEquals => "!=",
            TokenKind::Less => "<",
            TokenKind::LessEquals => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEquals => ">=",
            TokenKind::And => "&",
            TokenKind::DoubleAnd => "&&",
            TokenKind::Or => "|",
            TokenKind::DoubleOr => "||",
            TokenKind::Not => "!",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
            TokenKind::Underscore => "_",
            TokenKind::If => "ако",
            TokenKind::Else => "иначе",
            TokenKind::While => "док",
            TokenKind::For => "за",
            TokenKind::Do => "ради",
            TokenKind::Break => "прекини",
            TokenKind::Return => "врати",
            TokenKind::External => "екстерно",
            TokenKind::True => "тачно",
            TokenKind::False => "нетачно",
        };
        write!(f, "{}", s)
    }
}

/// The kind-specific payload of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    /// Numeric literal value (word-wide)
    Int(i64),
    /// Character literal codepoint
    Char(u32),
    /// Owned text: identifiers, string literals, error messages
    Str(String),
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte range of the lexeme in the source buffer
    pub span: Span,
    pub location: SourceLocation,
    pub value: TokenValue,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, location: SourceLocation) -> Self {
        Self {
            kind,
            span,
            location,
            value: TokenValue::None,
        }
    }

    pub fn with_value(
        kind: TokenKind,
        span: Span,
        location: SourceLocation,
        value: TokenValue,
    ) -> Self {
        Self {
            kind,
            span,
            location,
            value,
        }
    }

    /// Integer payload of a `Number` token.
    pub fn int_value(&self) -> Option<i64> {
        match self.value {
            TokenValue::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Codepoint payload of a `CharLiteral` token.
    pub fn char_value(&self) -> Option<u32> {
        match self.value {
            TokenValue::Char(v) => Some(v),
            _ => None,
        }
    }

    /// Text payload of an identifier, string or error token.
    pub fn str_value(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The lexeme slice this token was built from.
    pub fn lexeme<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        self.span.bytes(source)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token {{ kind: {:?}, line: {}, col: {}",
            self.kind, self.location.line, self.location.column
        )?;
        match &self.value {
            TokenValue::None => {}
            TokenValue::Int(v) => write!(f, ", value: {}", v)?,
            TokenValue::Char(c) => {
                if (32..=126).contains(c) {
                    write!(f, ", value: '{}'", char::from_u32(*c).unwrap_or('?'))?
                } else {
                    write!(f, ", value: '\\u{:04x}'", c)?
                }
            }
            TokenValue::Str(s) => write!(f, ", value: {:?}", s)?,
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(TokenKind::DoubleEquals.to_string(), "==");
        assert_eq!(TokenKind::If.to_string(), "ако");
        assert_eq!(TokenKind::Eof.to_string(), "end of file");
        assert_eq!(TokenKind::Underscore.to_string(), "_");
    }

    #[test]
    fn test_keyword_classification() {
        assert!(TokenKind::Return.is_keyword());
        assert!(TokenKind::True.is_keyword());
        assert!(!TokenKind::Identifier.is_keyword());
        assert!(!TokenKind::Plus.is_keyword());
    }

    #[test]
    fn test_operator_classification() {
        assert!(TokenKind::Plus.is_operator());
        assert!(TokenKind::DoubleOr.is_operator());
        assert!(TokenKind::Tilde.is_operator());
        assert!(!TokenKind::Equals.is_operator());
        assert!(!TokenKind::Colon.is_operator());
        assert!(!TokenKind::If.is_operator());
    }

    #[test]
    fn test_token_payload_accessors() {
        let loc = SourceLocation::new("t.ћпп", 1, 1);
        let tok = Token::with_value(
            TokenKind::Number,
            Span::new(0, 2),
            loc.clone(),
            TokenValue::Int(42),
        );
        assert_eq!(tok.int_value(), Some(42));
        assert_eq!(tok.char_value(), None);
        assert_eq!(tok.str_value(), None);

        let tok = Token::with_value(
            TokenKind::Identifier,
            Span::new(0, 6),
            loc,
            TokenValue::Str("збир".to_string()),
        );
        assert_eq!(tok.str_value(), Some("збир"));
    }
}
