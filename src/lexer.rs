//! Lexical analyzer
//!
//! Converts raw source bytes into a token stream. The lexer works
//! directly on bytes and decodes UTF-8 itself so that identifiers and
//! keywords can use the full Cyrillic range while columns stay byte
//! accurate. It supports a one-token lookahead that never consumes, and
//! reports lexical problems through the diagnostics registry as it
//! scans; error tokens returned to the parser carry the message as their
//! payload and have already been reported.

use crate::diag::{DiagKind, Diagnostics, Severity};
use crate::keywords;
use crate::span::{SourceLocation, Span};
use crate::target::TargetInfo;
use crate::token::{Token, TokenKind, TokenValue};
use crate::utf8;
use std::fs;
use std::path::Path;

// Numeric lexemes longer than this are rejected outright
const MAX_NUMBER_LENGTH: usize = 64;

/// Lexer state over an owned copy of the source.
pub struct Lexer {
    source: Vec<u8>,
    filename: String,
    /// Current byte cursor
    current: usize,
    /// Start of the current lexeme
    start: usize,
    /// Current line (1-based)
    line: u32,
    /// Current byte column (1-based)
    column: u32,
    /// Column before the last advance, for newline bookkeeping
    previous_column: u32,
    /// One-token lookahead cache
    lookahead: Option<Token>,
    target: TargetInfo,
}

impl Lexer {
    /// Create a lexer over in-memory source text.
    pub fn new(source: &str, filename: &str, target: TargetInfo) -> Self {
        Self::from_bytes(source.as_bytes().to_vec(), filename, target)
    }

    /// Create a lexer over raw bytes that may not be well-formed UTF-8.
    pub fn from_bytes(source: Vec<u8>, filename: &str, target: TargetInfo) -> Self {
        Self {
            source,
            filename: filename.to_string(),
            current: 0,
            start: 0,
            line: 1,
            column: 1,
            previous_column: 1,
            lookahead: None,
            target,
        }
    }

    /// Create a lexer by reading an entire source file into memory.
    ///
    /// A read failure is a fatal IO diagnostic, which terminates the
    /// process after diagnostics cleanup.
    pub fn from_file(path: &Path, target: TargetInfo, diag: &mut Diagnostics) -> Self {
        let filename = path.to_string_lossy().into_owned();
        match fs::read(path) {
            Ok(bytes) => Self::from_bytes(bytes, &filename, target),
            Err(error) => {
                diag.report(
                    DiagKind::Io,
                    Severity::Fatal,
                    &filename,
                    0,
                    0,
                    &format!("Failed to open source file: {}", error),
                    Some("Check that the file exists and has read permissions"),
                    file!(),
                    line!(),
                );
                unreachable!("fatal diagnostics terminate the process");
            }
        }
    }

    /// The source buffer tokens are sliced from.
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn target(&self) -> &TargetInfo {
        &self.target
    }

    /// Get the next token, consuming the cached lookahead if present.
    pub fn next_token(&mut self, diag: &mut Diagnostics) -> Token {
        if let Some(token) = self.lookahead.take() {
            return token;
        }

        self.skip_whitespace(diag);
        self.start = self.current;

        if self.current >= self.source.len() {
            return self.make_token(TokenKind::Eof);
        }

        self.scan_token(diag)
    }

    /// Look at the next token without consuming it.
    pub fn peek_token(&mut self, diag: &mut Diagnostics) -> Token {
        if let Some(token) = &self.lookahead {
            return token.clone();
        }

        let token = self.next_token(diag);
        self.lookahead = Some(token.clone());
        token
    }

    fn scan_token(&mut self, diag: &mut Diagnostics) -> Token {
        let c = match self.advance() {
            Some(c) => c,
            None => return self.make_token(TokenKind::Eof),
        };

        // A lone underscore, or one directly before a digit, delimits an
        // array literal; otherwise the underscore starts an identifier.
        if c == '_' as u32 {
            match self.peek_codepoint() {
                Some(next) if utf8::is_alphabetic(next) || next == '_' as u32 => {
                    return self.scan_identifier();
                }
                _ => return self.make_token(TokenKind::Underscore),
            }
        }

        if is_identifier_start(c) {
            return self.scan_identifier();
        }

        if utf8::is_digit(c) {
            return self.scan_number(diag);
        }

        match c {
            c if c == '(' as u32 => self.make_token(TokenKind::LeftParen),
            c if c == ')' as u32 => self.make_token(TokenKind::RightParen),
            c if c == '[' as u32 => self.make_token(TokenKind::LeftBracket),
            c if c == ']' as u32 => self.make_token(TokenKind::RightBracket),
            c if c == ':' as u32 => self.make_token(TokenKind::Colon),
            c if c == ';' as u32 => self.make_token(TokenKind::Semicolon),
            c if c == ',' as u32 => self.make_token(TokenKind::Comma),
            c if c == '.' as u32 => self.make_token(TokenKind::Dot),
            c if c == '+' as u32 => self.make_token(TokenKind::Plus),
            c if c == '-' as u32 => self.make_token(TokenKind::Minus),
            c if c == '*' as u32 => self.make_token(TokenKind::Star),
            c if c == '/' as u32 => self.make_token(TokenKind::Slash),
            c if c == '%' as u32 => self.make_token(TokenKind::Percent),
            c if c == '^' as u32 => self.make_token(TokenKind::Caret),
            c if c == '~' as u32 => self.make_token(TokenKind::Tilde),
            c if c == '!' as u32 => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::NotEquals
                } else {
                    TokenKind::Not
                };
                self.make_token(kind)
            }
            c if c == '=' as u32 => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::DoubleEquals
                } else {
                    TokenKind::Equals
                };
                self.make_token(kind)
            }
            // < and > double as block delimiters; that distinction is
            // grammatical and belongs to the parser
            c if c == '<' as u32 => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::LessEquals
                } else {
                    TokenKind::Less
                };
                self.make_token(kind)
            }
            c if c == '>' as u32 => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::GreaterEquals
                } else {
                    TokenKind::Greater
                };
                self.make_token(kind)
            }
            c if c == '&' as u32 => {
                let kind = if self.match_byte(b'&') {
                    TokenKind::DoubleAnd
                } else {
                    TokenKind::And
                };
                self.make_token(kind)
            }
            c if c == '|' as u32 => {
                let kind = if self.match_byte(b'|') {
                    TokenKind::DoubleOr
                } else {
                    TokenKind::Or
                };
                self.make_token(kind)
            }
            c if c == '"' as u32 => self.scan_string(diag),
            c if c == '\'' as u32 => self.scan_character_literal(diag),
            _ => self.error_token(diag, "Unexpected character", None),
        }
    }

    fn scan_identifier(&mut self) -> Token {
        while let Some(c) = self.peek_codepoint() {
            if !utf8::is_identifier_char(c, false) {
                break;
            }
            self.advance();
        }

        let text = String::from_utf8_lossy(&self.source[self.start..self.current]).into_owned();

        if let Some(kind) = keywords::keyword_token(&text) {
            return self.make_token(kind);
        }

        let mut token = self.make_token(TokenKind::Identifier);
        token.value = TokenValue::Str(text);
        token
    }

    fn scan_number(&mut self, diag: &mut Diagnostics) -> Token {
        while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }

        // A decimal point followed by a digit is consumed but the value
        // truncates to the integral part
        if self.peek_byte() == Some(b'.') && self.peek_next_byte().is_some_and(|b| b.is_ascii_digit())
        {
            self.advance();
            while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                self.advance();
            }

            diag.report(
                DiagKind::Lexical,
                Severity::Warning,
                &self.filename,
                self.line,
                self.column,
                "Floating-point numbers are not fully supported yet",
                Some("Truncating to integer value"),
                file!(),
                line!(),
            );
        }

        let length = self.current - self.start;
        if length >= MAX_NUMBER_LENGTH {
            return self.error_token(diag, "Number too large", None);
        }

        // Base-10 parse of the integral digits, saturating like strtol
        let mut value: i64 = 0;
        for &b in &self.source[self.start..self.current] {
            if !b.is_ascii_digit() {
                break;
            }
            value = value
                .saturating_mul(10)
                .saturating_add((b - b'0') as i64);
        }

        if self.target.word_size == 4 && (value > i32::MAX as i64 || value < i32::MIN as i64) {
            diag.report(
                DiagKind::Lexical,
                Severity::Warning,
                &self.filename,
                self.line,
                self.column,
                "Numeric literal does not fit in the target machine word",
                Some("The value will be truncated to 32 bits"),
                file!(),
                line!(),
            );
        }

        let mut token = self.make_token(TokenKind::Number);
        token.value = TokenValue::Int(value);
        token
    }

    fn scan_string(&mut self, diag: &mut Diagnostics) -> Token {
        let mut buffer: Vec<u8> = Vec::new();
        let start_line = self.line;
        let start_column = self.column.saturating_sub(1).max(1);

        while self.peek_byte() != Some(b'"') && self.current < self.source.len() {
            let mut c = match self.advance() {
                Some(c) => c,
                None => break,
            };

            if c == '\\' as u32 {
                let next = match self.advance() {
                    Some(n) => n,
                    None => break,
                };
                c = match char::from_u32(next) {
                    Some('"') => '"' as u32,
                    Some('\\') => '\\' as u32,
                    Some('r') => '\r' as u32,
                    Some('t') => '\t' as u32,
                    Some('0') => 0,
                    Some('n') => '\n' as u32,
                    Some('b') => 0x08, // backspace
                    Some('f') => 0x0C, // form feed
                    Some('v') => 0x0B, // vertical tab
                    Some('a') => 0x07, // bell
                    Some('u') => match self.read_hex_escape(diag, 4, start_line, start_column) {
                        Some(v) => v,
                        None => return self.error_token_noreport("Invalid Unicode escape"),
                    },
                    Some('x') => match self.read_hex_escape(diag, 2, start_line, start_column) {
                        Some(v) => v,
                        None => return self.error_token_noreport("Invalid hex escape"),
                    },
                    other => {
                        let shown = other.unwrap_or('?');
                        let message = format!("Invalid escape sequence '\\{}'", shown);
                        return self.error_token(
                            diag,
                            &message,
                            Some("Use a valid escape sequence (\\n, \\t, etc.)"),
                        );
                    }
                };
            }

            // Store as UTF-8, carrying multi-byte input through verbatim
            if c < 128 {
                buffer.push(c as u8);
            } else {
                match utf8::encode(c) {
                    Some(ch) => buffer.extend_from_slice(ch.as_bytes()),
                    None => {
                        return self.error_token(diag, "Invalid Unicode escape", None);
                    }
                }
            }
        }

        if self.current >= self.source.len() || self.peek_byte() != Some(b'"') {
            diag.report(
                DiagKind::Lexical,
                Severity::Error,
                &self.filename,
                start_line,
                start_column,
                "Unterminated string literal",
                Some("Add closing double quote"),
                file!(),
                line!(),
            );
            return self.error_token_noreport("Unterminated string");
        }

        // Consume the closing quote
        self.advance();

        let mut token = self.make_token(TokenKind::StringLiteral);
        token.value = TokenValue::Str(String::from_utf8_lossy(&buffer).into_owned());
        token
    }

    fn scan_character_literal(&mut self, diag: &mut Diagnostics) -> Token {
        let start_line = self.line;
        let start_column = self.column.saturating_sub(1).max(1);

        let c: u32;
        if self.peek_byte() == Some(b'\\') {
            self.advance();
            let next = self.peek_byte().map(|b| b as char);
            c = match next {
                Some('\'') => {
                    self.advance();
                    '\'' as u32
                }
                Some('"') => {
                    self.advance();
                    '"' as u32
                }
                Some('\\') => {
                    self.advance();
                    '\\' as u32
                }
                Some('n') => {
                    self.advance();
                    '\n' as u32
                }
                Some('r') => {
                    self.advance();
                    '\r' as u32
                }
                Some('t') => {
                    self.advance();
                    '\t' as u32
                }
                Some('0') => {
                    self.advance();
                    0
                }
                Some('b') => {
                    self.advance();
                    0x08
                }
                Some('f') => {
                    self.advance();
                    0x0C
                }
                Some('v') => {
                    self.advance();
                    0x0B
                }
                Some('a') => {
                    self.advance();
                    0x07
                }
                Some('u') => {
                    self.advance();
                    match self.read_hex_escape(diag, 4, start_line, start_column) {
                        Some(v) => v,
                        None => return self.error_token_noreport("Invalid Unicode escape"),
                    }
                }
                Some('x') => {
                    self.advance();
                    match self.read_hex_escape(diag, 2, start_line, start_column) {
                        Some(v) => v,
                        None => return self.error_token_noreport("Invalid hex escape"),
                    }
                }
                other => {
                    let shown = other.unwrap_or('?');
                    let message = format!("Invalid escape sequence '\\{}'", shown);
                    return self.error_token(
                        diag,
                        &message,
                        Some("Use a valid escape sequence (\\n, \\t, etc.)"),
                    );
                }
            };
        } else {
            c = match self.advance() {
                Some(cp) => cp,
                None => {
                    diag.report(
                        DiagKind::Lexical,
                        Severity::Error,
                        &self.filename,
                        start_line,
                        start_column,
                        "Unterminated character literal",
                        Some("Add closing single quote"),
                        file!(),
                        line!(),
                    );
                    return self.error_token_noreport("Unterminated character literal");
                }
            };
        }

        if self.peek_byte() != Some(b'\'') {
            diag.report(
                DiagKind::Lexical,
                Severity::Error,
                &self.filename,
                start_line,
                start_column,
                "Unterminated character literal",
                Some("Add closing single quote"),
                file!(),
                line!(),
            );
            return self.error_token_noreport("Unterminated character literal");
        }
        self.advance();

        let mut token = self.make_token(TokenKind::CharLiteral);
        token.value = TokenValue::Char(c);
        token
    }

    /// Read exactly `digits` hex digits of a `\u` or `\x` escape.
    fn read_hex_escape(
        &mut self,
        diag: &mut Diagnostics,
        digits: u32,
        start_line: u32,
        start_column: u32,
    ) -> Option<u32> {
        let mut value: u32 = 0;
        for _ in 0..digits {
            let b = self.peek_byte();
            let digit = match b.and_then(|b| (b as char).to_digit(16)) {
                Some(d) => d,
                None => {
                    let (message, suggestion) = if digits == 4 {
                        (
                            "Invalid Unicode escape sequence",
                            "Unicode escape must be in the form \\uXXXX",
                        )
                    } else {
                        (
                            "Invalid hex escape sequence",
                            "Hex escape must be in the form \\xXX",
                        )
                    };
                    diag.report(
                        DiagKind::Lexical,
                        Severity::Error,
                        &self.filename,
                        start_line,
                        start_column,
                        message,
                        Some(suggestion),
                        file!(),
                        line!(),
                    );
                    return None;
                }
            };
            self.advance();
            value = (value << 4) | digit;
        }
        Some(value)
    }

    /// Skip whitespace and comments; an unterminated block comment is a
    /// warning, not an error.
    fn skip_whitespace(&mut self, diag: &mut Diagnostics) {
        loop {
            match self.peek_byte() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.advance();
                }
                Some(b'/') => {
                    if self.peek_next_byte() == Some(b'/') {
                        while self.peek_byte().is_some_and(|b| b != b'\n') {
                            self.advance();
                        }
                    } else if self.peek_next_byte() == Some(b'*') {
                        self.advance(); // '/'
                        self.advance(); // '*'

                        loop {
                            if self.current >= self.source.len() {
                                diag.report(
                                    DiagKind::Lexical,
                                    Severity::Warning,
                                    &self.filename,
                                    self.line,
                                    self.column,
                                    "Unterminated multi-line comment",
                                    Some("Add */ to close the comment"),
                                    file!(),
                                    line!(),
                                );
                                break;
                            }
                            if self.peek_byte() == Some(b'*')
                                && self.peek_next_byte() == Some(b'/')
                            {
                                self.advance();
                                self.advance();
                                break;
                            }
                            self.advance();
                        }
                    } else {
                        // Division operator, not a comment
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    /// Consume one codepoint, bumping the byte column once per byte.
    ///
    /// Invalid leading bytes, incomplete tails and bad continuation bytes
    /// rewind to just past the first byte and yield it raw, so downstream
    /// grammar decides how to fail.
    fn advance(&mut self) -> Option<u32> {
        if self.current >= self.source.len() {
            return None;
        }

        let first_byte = self.source[self.current];
        self.current += 1;
        self.previous_column = self.column;
        self.column += 1;

        if first_byte == b'\n' {
            self.line += 1;
            self.column = 1;
            return Some('\n' as u32);
        }

        if first_byte & 0x80 == 0 {
            return Some(first_byte as u32);
        }

        let num_bytes = utf8::sequence_len(first_byte);
        if num_bytes == 1 {
            // Invalid leading byte, return it raw
            return Some(first_byte as u32);
        }

        let mut buf = [0u8; 4];
        buf[0] = first_byte;

        for i in 1..num_bytes {
            if self.current >= self.source.len() {
                return Some(first_byte as u32);
            }
            let next_byte = self.source[self.current];
            self.current += 1;
            self.column += 1;

            if !utf8::is_continuation(next_byte) {
                self.current -= 1;
                self.column -= 1;
                return Some(first_byte as u32);
            }
            buf[i] = next_byte;
        }

        match utf8::decode(&buf[..num_bytes]) {
            Some(ch) => Some(ch.codepoint),
            None => Some(first_byte as u32),
        }
    }

    /// Current byte without advancing.
    fn peek_byte(&self) -> Option<u8> {
        self.source.get(self.current).copied()
    }

    /// Byte after the current one without advancing.
    fn peek_next_byte(&self) -> Option<u8> {
        self.source.get(self.current + 1).copied()
    }

    /// Current codepoint without advancing.
    fn peek_codepoint(&self) -> Option<u32> {
        utf8::decode(&self.source[self.current.min(self.source.len())..]).map(|ch| ch.codepoint)
    }

    /// Consume the current byte if it matches.
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.peek_byte() == Some(expected) {
            self.current += 1;
            self.column += 1;
            true
        } else {
            false
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        let span = Span::new(self.start, self.current);
        let column = self.column.saturating_sub(span.len() as u32).max(1);
        let location = SourceLocation::new(self.filename.clone(), self.line, column);
        Token::new(kind, span, location)
    }

    /// Report a lexical error at the current position and build the
    /// matching error token.
    fn error_token(
        &mut self,
        diag: &mut Diagnostics,
        message: &str,
        suggestion: Option<&str>,
    ) -> Token {
        diag.report(
            DiagKind::Lexical,
            Severity::Error,
            &self.filename,
            self.line,
            self.column,
            message,
            suggestion,
            file!(),
            line!(),
        );
        self.error_token_noreport(message)
    }

    /// Build an error token for a problem that has already been reported.
    fn error_token_noreport(&self, message: &str) -> Token {
        let span = Span::new(self.start, self.current);
        let location = SourceLocation::new(self.filename.clone(), self.line, self.column);
        Token::with_value(
            TokenKind::Error,
            span,
            location,
            TokenValue::Str(message.to_string()),
        )
    }
}

fn is_identifier_start(c: u32) -> bool {
    utf8::is_identifier_char(c, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Arch;

    fn lexer(source: &str) -> (Lexer, Diagnostics) {
        let mut diag = Diagnostics::new(false);
        let target = TargetInfo::init_arch(Arch::X86_64, &mut diag);
        (Lexer::new(source, "test.ћпп", target), diag)
    }

    fn token_kinds(source: &str) -> (Vec<TokenKind>, usize) {
        let (mut lex, mut diag) = lexer(source);
        let mut kinds = Vec::new();
        loop {
            let token = lex.next_token(&mut diag);
            let done = token.kind == TokenKind::Eof;
            kinds.push(token.kind);
            if done {
                break;
            }
        }
        (kinds, diag.count(None))
    }

    #[test]
    fn test_empty_source() {
        let (kinds, issues) = token_kinds("");
        assert_eq!(kinds, vec![TokenKind::Eof]);
        assert_eq!(issues, 0);
    }

    #[test]
    fn test_basic_tokens() {
        let source = "+ - * / % = == != < <= > >= & && | || ! ^ ~ ( ) [ ] ; , . :";
        let (kinds, issues) = token_kinds(source);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Equals,
                TokenKind::DoubleEquals,
                TokenKind::NotEquals,
                TokenKind::Less,
                TokenKind::LessEquals,
                TokenKind::Greater,
                TokenKind::GreaterEquals,
                TokenKind::And,
                TokenKind::DoubleAnd,
                TokenKind::Or,
                TokenKind::DoubleOr,
                TokenKind::Not,
                TokenKind::Caret,
                TokenKind::Tilde,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Colon,
                TokenKind::Eof,
            ]
        );
        assert_eq!(issues, 0);
    }

    #[test]
    fn test_keyword_vs_identifier() {
        // ако is a keyword; ако1 and _ако are identifiers
        let (mut lex, mut diag) = lexer("ако ако1 _ако");

        let t1 = lex.next_token(&mut diag);
        assert_eq!(t1.kind, TokenKind::If);
        assert_eq!(t1.value, TokenValue::None);

        let t2 = lex.next_token(&mut diag);
        assert_eq!(t2.kind, TokenKind::Identifier);
        assert_eq!(t2.str_value(), Some("ако1"));

        let t3 = lex.next_token(&mut diag);
        assert_eq!(t3.kind, TokenKind::Identifier);
        assert_eq!(t3.str_value(), Some("_ако"));

        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Eof);
        assert_eq!(diag.count(None), 0);
    }

    #[test]
    fn test_all_keywords() {
        let source = "ако иначе док за ради прекини врати екстерно тачно нетачно";
        let (kinds, issues) = token_kinds(source);
        assert_eq!(
            kinds,
            vec![
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::For,
                TokenKind::Do,
                TokenKind::Break,
                TokenKind::Return,
                TokenKind::External,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Eof,
            ]
        );
        assert_eq!(issues, 0);
    }

    #[test]
    fn test_underscore_delimits_array_literal() {
        // _ before a digit or alone is the delimiter token
        let (mut lex, mut diag) = lexer("_1, 2_");
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Underscore);
        let n = lex.next_token(&mut diag);
        assert_eq!(n.kind, TokenKind::Number);
        assert_eq!(n.int_value(), Some(1));
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Comma);
        assert_eq!(lex.next_token(&mut diag).int_value(), Some(2));
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Underscore);
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Eof);
        assert_eq!(diag.count(None), 0);
    }

    #[test]
    fn test_lone_underscore() {
        let (kinds, _) = token_kinds("_ ;");
        assert_eq!(
            kinds,
            vec![TokenKind::Underscore, TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    #[test]
    fn test_number_value() {
        let (mut lex, mut diag) = lexer("42 0 123456789");
        assert_eq!(lex.next_token(&mut diag).int_value(), Some(42));
        assert_eq!(lex.next_token(&mut diag).int_value(), Some(0));
        assert_eq!(lex.next_token(&mut diag).int_value(), Some(123456789));
        assert_eq!(diag.count(None), 0);
    }

    #[test]
    fn test_float_truncates_with_warning() {
        let (mut lex, mut diag) = lexer("3.14");
        let token = lex.next_token(&mut diag);
        assert_eq!(token.kind, TokenKind::Number);
        assert_eq!(token.int_value(), Some(3));
        assert_eq!(diag.count(Some(Severity::Warning)), 1);
        assert!(diag.entries()[0].message.contains("Floating-point"));
        // The whole lexeme including the fraction was consumed
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Eof);
    }

    #[test]
    fn test_number_too_large() {
        let source = "9".repeat(70);
        let (mut lex, mut diag) = lexer(&source);
        let token = lex.next_token(&mut diag);
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(token.str_value(), Some("Number too large"));
        assert_eq!(diag.count(Some(Severity::Error)), 1);
    }

    #[test]
    fn test_word_size_bound_warning_on_x86() {
        let mut diag = Diagnostics::new(false);
        let target = TargetInfo::init_arch(Arch::X86, &mut diag);
        let mut lex = Lexer::new("5000000000", "test.ћпп", target);
        let token = lex.next_token(&mut diag);
        assert_eq!(token.kind, TokenKind::Number);
        assert_eq!(diag.count(Some(Severity::Warning)), 1);
    }

    #[test]
    fn test_string_literal_with_escapes() {
        let (mut lex, mut diag) = lexer(r#""здраво\nсвете\t\"q\"""#);
        let token = lex.next_token(&mut diag);
        assert_eq!(token.kind, TokenKind::StringLiteral);
        assert_eq!(token.str_value(), Some("здраво\nсвете\t\"q\""));
        assert_eq!(diag.count(None), 0);
    }

    #[test]
    fn test_string_unicode_escape() {
        // backslash-u 045B is ћ, re-encoded into the payload as UTF-8
        let (mut lex, mut diag) = lexer("\"\\u045B\u{0436}\"");
        let token = lex.next_token(&mut diag);
        assert_eq!(token.str_value(), Some("ћж"));
        assert_eq!(diag.count(None), 0);
    }

    #[test]
    fn test_string_hex_escape() {
        let (mut lex, mut diag) = lexer(r#""\x41\x42""#);
        let token = lex.next_token(&mut diag);
        assert_eq!(token.str_value(), Some("AB"));
        assert_eq!(diag.count(None), 0);
    }

    #[test]
    fn test_unterminated_string() {
        let (mut lex, mut diag) = lexer("\"hello;");
        let token = lex.next_token(&mut diag);
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(token.str_value(), Some("Unterminated string"));
        assert_eq!(diag.count(Some(Severity::Error)), 1);
        assert!(diag.entries()[0].message.contains("Unterminated string"));
    }

    #[test]
    fn test_invalid_escape_sequence() {
        let (mut lex, mut diag) = lexer(r#""a\q""#);
        let token = lex.next_token(&mut diag);
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(diag.count(Some(Severity::Error)), 1);
    }

    #[test]
    fn test_char_literals() {
        let (mut lex, mut diag) = lexer(r"'a' '\n' '\'' 'ћ'");
        assert_eq!(lex.next_token(&mut diag).char_value(), Some('a' as u32));
        assert_eq!(lex.next_token(&mut diag).char_value(), Some('\n' as u32));
        assert_eq!(lex.next_token(&mut diag).char_value(), Some('\'' as u32));
        assert_eq!(lex.next_token(&mut diag).char_value(), Some(0x045B));
        assert_eq!(diag.count(None), 0);
    }

    #[test]
    fn test_char_unicode_escape() {
        let (mut lex, mut diag) = lexer("'\\u0436'");
        assert_eq!(lex.next_token(&mut diag).char_value(), Some(0x0436));
        assert_eq!(diag.count(None), 0);
    }

    #[test]
    fn test_unterminated_char_literal() {
        let (mut lex, mut diag) = lexer("'a");
        let token = lex.next_token(&mut diag);
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(diag.count(Some(Severity::Error)), 1);
    }

    #[test]
    fn test_line_comment_skipped() {
        let (kinds, issues) = token_kinds("// коментар\n42");
        assert_eq!(kinds, vec![TokenKind::Number, TokenKind::Eof]);
        assert_eq!(issues, 0);
    }

    #[test]
    fn test_block_comment_skipped() {
        let (kinds, issues) = token_kinds("1 /* блок\nкоментар */ 2");
        assert_eq!(kinds, vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]);
        assert_eq!(issues, 0);
    }

    #[test]
    fn test_unterminated_block_comment_warns() {
        let (mut lex, mut diag) = lexer("1 /* никад");
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Number);
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Eof);
        assert_eq!(diag.count(Some(Severity::Warning)), 1);
        assert_eq!(diag.count(Some(Severity::Error)), 0);
    }

    #[test]
    fn test_byte_columns() {
        // ћ is two bytes: it occupies columns 1..2, so x sits at column 4
        let (mut lex, mut diag) = lexer("ћ x");
        let t1 = lex.next_token(&mut diag);
        assert_eq!(t1.location.line, 1);
        assert_eq!(t1.location.column, 1);
        let t2 = lex.next_token(&mut diag);
        assert_eq!(t2.location.column, 4);
    }

    #[test]
    fn test_line_tracking() {
        let (mut lex, mut diag) = lexer("a\nb\r\nc");
        assert_eq!(lex.next_token(&mut diag).location.line, 1);
        let b = lex.next_token(&mut diag);
        assert_eq!(b.location.line, 2);
        assert_eq!(b.location.column, 1);
        let c = lex.next_token(&mut diag);
        assert_eq!(c.location.line, 3);
        assert_eq!(c.location.column, 1);
    }

    #[test]
    fn test_lexeme_slice_matches_source() {
        let source = "збир = 12;";
        let (mut lex, mut diag) = lexer(source);
        loop {
            let token = lex.next_token(&mut diag);
            if token.kind == TokenKind::Eof {
                break;
            }
            let slice = token.span.text(lex.source());
            match token.kind {
                TokenKind::Identifier => assert_eq!(token.str_value(), Some(slice.as_str())),
                TokenKind::Number => assert_eq!(slice, "12"),
                TokenKind::Equals => assert_eq!(slice, "="),
                TokenKind::Semicolon => assert_eq!(slice, ";"),
                _ => panic!("unexpected token {:?}", token.kind),
            }
        }
    }

    #[test]
    fn test_peek_does_not_consume() {
        let (mut lex, mut diag) = lexer("а б");
        let peeked = lex.peek_token(&mut diag);
        let next = lex.next_token(&mut diag);
        assert_eq!(peeked, next);
        assert_eq!(next.str_value(), Some("а"));
        // The token after the peeked one comes out exactly once
        let second = lex.next_token(&mut diag);
        assert_eq!(second.str_value(), Some("б"));
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Eof);
    }

    #[test]
    fn test_previous_column_shadow() {
        // The shadow holds the column before the last leading byte, so
        // newline handling can look one step back
        let (mut lex, mut diag) = lexer("аб x");
        lex.next_token(&mut diag);
        assert_eq!(lex.column, 5);
        assert_eq!(lex.previous_column, 3);
    }

    #[test]
    fn test_eof_is_sticky() {
        let (mut lex, mut diag) = lexer("");
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Eof);
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Eof);
    }

    #[test]
    fn test_from_file_reads_source() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("пример.ћпп");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "врати 0;").unwrap();

        let mut diag = Diagnostics::new(false);
        let target = TargetInfo::init_arch(Arch::X86_64, &mut diag);
        let mut lex = Lexer::from_file(&path, target, &mut diag);
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Return);
        assert_eq!(lex.next_token(&mut diag).int_value(), Some(0));
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Semicolon);
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Eof);
    }

    #[test]
    fn test_invalid_continuation_byte_yields_raw_byte() {
        // 0xD1 not followed by a continuation byte: the lexer rewinds and
        // hands back the raw leading byte, which no grammar rule accepts
        let mut diag = Diagnostics::new(false);
        let target = TargetInfo::init_arch(Arch::X86_64, &mut diag);
        let mut lex = Lexer::from_bytes(vec![0xD1, b'+'], "test.ћпп", target);
        let token = lex.next_token(&mut diag);
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(diag.count(Some(Severity::Error)), 1);
        // The following token is unaffected
        assert_eq!(lex.next_token(&mut diag).kind, TokenKind::Plus);
    }
}
