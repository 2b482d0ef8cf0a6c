//! Keyword table
//!
//! A static, ordered mapping from the ten Serbian-Cyrillic keyword
//! strings to their token kinds. Lookup is exact and case-sensitive; the
//! reverse direction (kind to spelling) is used by the AST source echo.

use crate::token::TokenKind;
use crate::utf8;
use std::cmp::Ordering;

/// All language keywords, in table order.
static KEYWORDS: &[(&str, TokenKind)] = &[
    // Control flow keywords
    ("ако", TokenKind::If),
    ("иначе", TokenKind::Else),
    ("док", TokenKind::While),
    ("за", TokenKind::For),
    ("ради", TokenKind::Do),
    ("прекини", TokenKind::Break),
    ("врати", TokenKind::Return),
    // Module/scope keywords
    ("екстерно", TokenKind::External),
    // Boolean literals
    ("тачно", TokenKind::True),
    ("нетачно", TokenKind::False),
];

/// Whether a string is a language keyword.
pub fn is_keyword(s: &str) -> bool {
    keyword_token(s).is_some()
}

/// The token kind for a keyword string, if it is one.
pub fn keyword_token(s: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(word, _)| utf8::strcmp(s.as_bytes(), word.as_bytes()) == Ordering::Equal)
        .map(|&(_, kind)| kind)
}

/// The keyword spelling for a token kind, if it is a keyword kind.
pub fn keyword_str(kind: TokenKind) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .find(|&&(_, k)| k == kind)
        .map(|&(word, _)| word)
}

/// All keywords with their kinds, in table order.
pub fn all_keywords() -> &'static [(&'static str, TokenKind)] {
    KEYWORDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_keyword_resolves() {
        let expected = [
            ("ако", TokenKind::If),
            ("иначе", TokenKind::Else),
            ("док", TokenKind::While),
            ("за", TokenKind::For),
            ("ради", TokenKind::Do),
            ("прекини", TokenKind::Break),
            ("врати", TokenKind::Return),
            ("екстерно", TokenKind::External),
            ("тачно", TokenKind::True),
            ("нетачно", TokenKind::False),
        ];
        assert_eq!(all_keywords().len(), expected.len());
        for (word, kind) in expected {
            assert!(is_keyword(word), "{} should be a keyword", word);
            assert_eq!(keyword_token(word), Some(kind));
            assert_eq!(keyword_str(kind), Some(word));
        }
    }

    #[test]
    fn test_lookup_is_exact() {
        // Prefixes, extensions and Latin lookalikes are not keywords
        assert!(!is_keyword("ако1"));
        assert!(!is_keyword("ак"));
        assert!(!is_keyword("_ако"));
        assert!(!is_keyword("ako"));
        assert!(!is_keyword(""));
        assert_eq!(keyword_token("броj"), None);
    }

    #[test]
    fn test_reverse_lookup_rejects_non_keywords() {
        assert_eq!(keyword_str(TokenKind::Identifier), None);
        assert_eq!(keyword_str(TokenKind::Plus), None);
    }
}
