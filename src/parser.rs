//! Syntactic analyzer
//!
//! A handwritten recursive descent parser that consumes the lexer's
//! token stream and produces a [`Program`](AstKind::Program) node. It
//! keeps one token of lookahead in `current` and asks the lexer to peek
//! a second token where the grammar needs it (telling an array
//! declaration apart from an assignment to an array element).
//!
//! Expressions are parsed by precedence climbing over the C precedence
//! levels; `<` and `>` read as relational operators everywhere except
//! the statement positions where a block is expected, which is where the
//! angle-bracket block syntax is resolved.
//!
//! Syntax errors are recorded in the diagnostics registry, after which
//! the parser skips ahead to the next `;` or `>` and resumes. Error
//! tokens coming out of the lexer have already been reported and are
//! skipped without a second diagnostic.

use crate::ast::{AstKind, AstNode, TypeInfo};
use crate::diag::{DiagKind, Diagnostics, Severity};
use crate::lexer::Lexer;
use crate::span::SourceLocation;
use crate::token::{Token, TokenKind};
use thiserror::Error;

/// Internal control-flow error driving recovery; the user-visible record
/// always goes through [`Diagnostics`].
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        location: SourceLocation,
    },

    #[error("{message}")]
    Custom {
        message: String,
        location: SourceLocation,
    },

    /// An error token from the lexer; the lexical diagnostic has already
    /// been reported, so recovery must not report again
    #[error("lexical error")]
    Lexical,
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parser state: the lexer it drains, the diagnostics handle shared with
/// it, and a one-token lookahead window.
pub struct Parser<'a> {
    lexer: Lexer,
    diag: &'a mut Diagnostics,
    current: Token,
    previous: Token,
    /// Inside `name : expression :` a colon closes the index instead of
    /// opening a nested one; parentheses reset this
    colon_is_terminator: bool,
}

/// Parse a complete source text into a Program node.
///
/// Syntax and lexical problems end up in `diag`; the returned tree
/// contains everything that parsed.
pub fn parse(
    source: &str,
    filename: &str,
    target: crate::target::TargetInfo,
    diag: &mut Diagnostics,
) -> AstNode {
    let lexer = Lexer::new(source, filename, target);
    let mut parser = Parser::new(lexer, diag);
    parser.parse_program()
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer, diag: &'a mut Diagnostics) -> Self {
        let mut lexer = lexer;
        let current = lexer.next_token(diag);
        let previous = current.clone();
        Self {
            lexer,
            diag,
            current,
            previous,
            colon_is_terminator: false,
        }
    }

    // ============ Token plumbing ============

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token(self.diag);
        self.previous = std::mem::replace(&mut self.current, next);
        self.previous.clone()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Kind of the token after `current`, via the lexer's lookahead.
    fn peek_kind(&mut self) -> TokenKind {
        self.lexer.peek_token(self.diag).kind
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(TokenKind::Error) {
            return Err(ParseError::Lexical);
        }
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("'{}'", kind),
                found: self.current.kind,
                location: self.current.location.clone(),
            })
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<(String, SourceLocation)> {
        if self.check(TokenKind::Error) {
            return Err(ParseError::Lexical);
        }
        if self.check(TokenKind::Identifier) {
            let token = self.advance();
            let name = token.str_value().unwrap_or_default().to_string();
            Ok((name, token.location))
        } else {
            Err(ParseError::UnexpectedToken {
                expected: "identifier".to_string(),
                found: self.current.kind,
                location: self.current.location.clone(),
            })
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        if self.current.kind == TokenKind::Error {
            return ParseError::Lexical;
        }
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current.kind,
            location: self.current.location.clone(),
        }
    }

    fn custom(&self, message: impl Into<String>, location: SourceLocation) -> ParseError {
        ParseError::Custom {
            message: message.into(),
            location,
        }
    }

    // ============ Error recovery ============

    /// Record a parse error. Lexical errors were already reported by the
    /// lexer and pass through silently.
    fn report(&mut self, error: &ParseError) {
        let location = match error {
            ParseError::UnexpectedToken { location, .. } => location.clone(),
            ParseError::Custom { location, .. } => location.clone(),
            ParseError::Lexical => return,
        };
        let message = error.to_string();
        self.diag.report(
            DiagKind::Syntax,
            Severity::Error,
            &location.filename,
            location.line,
            location.column,
            &message,
            None,
            file!(),
            line!(),
        );
    }

    /// Skip ahead to just after the next `;`, or to (but not past) the
    /// next `>`, whichever comes first. The `>` is left for the
    /// enclosing block to close on.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.current.kind == TokenKind::Greater {
                return;
            }
            self.advance();
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
        }
    }

    // ============ Top-level parsing ============

    /// Parse the whole token stream into a Program node.
    pub fn parse_program(&mut self) -> AstNode {
        let location = self.current.location.clone();
        let mut declarations = Vec::new();

        while !self.is_at_end() {
            match self.parse_declaration() {
                Ok(decl) => declarations.push(decl),
                Err(error) => {
                    self.report(&error);
                    self.synchronize();
                    // A stray block close has no enclosing block here
                    if self.check(TokenKind::Greater) {
                        self.advance();
                    }
                }
            }
        }

        AstNode::new(AstKind::Program { declarations }, location)
    }

    fn parse_declaration(&mut self) -> ParseResult<AstNode> {
        if self.check(TokenKind::External) {
            self.parse_external_declaration()
        } else {
            self.parse_function_definition()
        }
    }

    /// `екстерно identifier ( params ) ;`
    fn parse_external_declaration(&mut self) -> ParseResult<AstNode> {
        let location = self.current.location.clone();
        self.expect(TokenKind::External)?;

        let (name, _) = self.expect_identifier()?;
        let parameters = self.parse_parameter_list()?;

        if self.check(TokenKind::Less) {
            return Err(self.custom(
                "External function declarations cannot have a body",
                self.current.location.clone(),
            ));
        }
        self.expect(TokenKind::Semicolon)?;

        Ok(AstNode::new(
            AstKind::FunctionDecl {
                name,
                parameters,
                body: None,
                return_type: TypeInfo::Int,
                is_external: true,
            },
            location,
        ))
    }

    /// `identifier ( params ) block`
    fn parse_function_definition(&mut self) -> ParseResult<AstNode> {
        let location = self.current.location.clone();
        let (name, _) = self.expect_identifier()?;
        let parameters = self.parse_parameter_list()?;

        if !self.check(TokenKind::Less) {
            return Err(self.custom(
                format!("Function '{}' requires a body block", name),
                self.current.location.clone(),
            ));
        }
        let body = self.parse_block()?;

        Ok(AstNode::new(
            AstKind::FunctionDecl {
                name,
                parameters,
                body: Some(Box::new(body)),
                return_type: TypeInfo::Int,
                is_external: false,
            },
            location,
        ))
    }

    /// `( var_decl (',' var_decl)* )`, where an array parameter is the
    /// `name::` form (array of unspecified size).
    fn parse_parameter_list(&mut self) -> ParseResult<Vec<AstNode>> {
        self.expect(TokenKind::LeftParen)?;
        let mut parameters = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                parameters.push(self.parse_parameter()?);
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RightParen)?;
        Ok(parameters)
    }

    fn parse_parameter(&mut self) -> ParseResult<AstNode> {
        let (name, location) = self.expect_identifier()?;

        let var_type = if self.consume(TokenKind::Colon) {
            // Empty colons: the size is resolved later
            self.expect(TokenKind::Colon)?;
            TypeInfo::Array {
                element: Box::new(TypeInfo::Int),
                size: None,
            }
        } else {
            TypeInfo::Int
        };

        Ok(AstNode::new(
            AstKind::VarDecl {
                name,
                initializer: None,
                var_type,
            },
            location,
        ))
    }

    // ============ Statements ============

    /// Parse a single statement.
    pub fn parse_statement(&mut self) -> ParseResult<AstNode> {
        let current_kind = self.current.kind;
        match current_kind {
            TokenKind::Less => self.parse_block(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::Break => {
                let location = self.current.location.clone();
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(AstNode::new(AstKind::Break, location))
            }
            TokenKind::Return => {
                let location = self.current.location.clone();
                self.advance();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(Box::new(self.parse_expression()?))
                };
                self.expect(TokenKind::Semicolon)?;
                Ok(AstNode::new(AstKind::Return { value }, location))
            }
            TokenKind::Identifier if self.peek_kind() == TokenKind::Colon => {
                self.parse_array_statement()
            }
            TokenKind::Error => Err(ParseError::Lexical),
            _ => {
                let location = self.current.location.clone();
                let expression = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(AstNode::new(
                    AstKind::ExprStmt {
                        expression: Box::new(expression),
                    },
                    location,
                ))
            }
        }
    }

    /// `< statement* >`
    fn parse_block(&mut self) -> ParseResult<AstNode> {
        let location = self.current.location.clone();
        self.expect(TokenKind::Less)?;
        let mut statements = Vec::new();

        while !self.check(TokenKind::Greater) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(error) => {
                    self.report(&error);
                    self.synchronize();
                }
            }
        }

        self.expect(TokenKind::Greater)?;
        Ok(AstNode::new(AstKind::Block { statements }, location))
    }

    /// `ако ( expression ) statement (иначе statement)?`
    fn parse_if_statement(&mut self) -> ParseResult<AstNode> {
        let location = self.current.location.clone();
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;

        let then_branch = self.parse_statement()?;
        let else_branch = if self.consume(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(AstNode::new(
            AstKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch,
            },
            location,
        ))
    }

    /// `док ( expression ) statement`
    fn parse_while_statement(&mut self) -> ParseResult<AstNode> {
        let location = self.current.location.clone();
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_statement()?;

        Ok(AstNode::new(
            AstKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
            location,
        ))
    }

    /// `ради statement док ( expression ) ;`
    fn parse_do_while_statement(&mut self) -> ParseResult<AstNode> {
        let location = self.current.location.clone();
        self.expect(TokenKind::Do)?;
        let body = self.parse_statement()?;
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        self.expect(TokenKind::Semicolon)?;

        Ok(AstNode::new(
            AstKind::DoWhile {
                body: Box::new(body),
                condition: Box::new(condition),
            },
            location,
        ))
    }

    /// `за ( (statement | ';') expression? ';' expression? ) statement`
    fn parse_for_statement(&mut self) -> ParseResult<AstNode> {
        let location = self.current.location.clone();
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LeftParen)?;

        let initializer = if self.consume(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_statement()?))
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(TokenKind::Semicolon)?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(TokenKind::RightParen)?;

        let body = self.parse_statement()?;

        Ok(AstNode::new(
            AstKind::For {
                initializer,
                condition,
                increment,
                body: Box::new(body),
            },
            location,
        ))
    }

    /// A statement starting `identifier ':'`: either an array
    /// declaration `name:N: = _v0, v1_;` or an expression built on an
    /// array access `name:index:`.
    ///
    /// Both parse as `identifier ':' expression ':'` first; an `=`
    /// followed directly by `_` (one extra token of lookahead) makes it
    /// a declaration, anything else re-reads the prefix as an access.
    fn parse_array_statement(&mut self) -> ParseResult<AstNode> {
        let location = self.current.location.clone();
        let (name, name_location) = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;
        let index = self.parse_index_expression()?;
        self.expect(TokenKind::Colon)?;

        if self.check(TokenKind::Equals) && self.peek_kind() == TokenKind::Underscore {
            return self.parse_array_declaration(name, index, location);
        }

        // Array access; fold it into the surrounding expression
        let access = AstNode::new(
            AstKind::ArrayAccess {
                array: Box::new(AstNode::new(
                    AstKind::Identifier { name },
                    name_location,
                )),
                index: Box::new(index),
            },
            location.clone(),
        );

        let expr = self.parse_postfix_from(access)?;
        let expr = self.parse_binary_from(expr, 0)?;
        let expression = if self.consume(TokenKind::Equals) {
            let value = self.parse_assignment()?;
            AstNode::new(
                AstKind::Assignment {
                    target: Box::new(expr),
                    value: Box::new(value),
                },
                location.clone(),
            )
        } else {
            expr
        };

        self.expect(TokenKind::Semicolon)?;
        Ok(AstNode::new(
            AstKind::ExprStmt {
                expression: Box::new(expression),
            },
            location,
        ))
    }

    /// The `= _v0, v1_;` tail of an array declaration.
    fn parse_array_declaration(
        &mut self,
        name: String,
        size_expr: AstNode,
        location: SourceLocation,
    ) -> ParseResult<AstNode> {
        let size = match size_expr.kind {
            AstKind::LiteralInt { value } => value,
            _ => {
                return Err(self.custom(
                    "Array size must be an integer literal",
                    size_expr.location,
                ))
            }
        };

        self.expect(TokenKind::Equals)?;
        self.expect(TokenKind::Underscore)?;

        let mut initializers = vec![self.parse_expression()?];
        while self.consume(TokenKind::Comma) {
            initializers.push(self.parse_expression()?);
        }
        self.expect(TokenKind::Underscore)?;
        self.expect(TokenKind::Semicolon)?;

        if initializers.len() as i64 > size {
            return Err(self.custom(
                format!(
                    "Array '{}' of size {} has {} initializers",
                    name,
                    size,
                    initializers.len()
                ),
                location,
            ));
        }

        Ok(AstNode::new(
            AstKind::ArrayDecl {
                name,
                size,
                initializers,
                element_type: TypeInfo::Int,
            },
            location,
        ))
    }

    // ============ Expressions ============

    /// Parse a single expression.
    pub fn parse_expression(&mut self) -> ParseResult<AstNode> {
        self.parse_assignment()
    }

    /// Parse the expression between the colons of an array index or
    /// size: the next bare colon terminates it.
    fn parse_index_expression(&mut self) -> ParseResult<AstNode> {
        let saved = self.colon_is_terminator;
        self.colon_is_terminator = true;
        let result = self.parse_expression();
        self.colon_is_terminator = saved;
        result
    }

    /// Assignment is right-associative and binds loosest.
    fn parse_assignment(&mut self) -> ParseResult<AstNode> {
        let expr = self.parse_binary(0)?;

        if self.consume(TokenKind::Equals) {
            let location = expr.location.clone();
            let value = self.parse_assignment()?;
            return Ok(AstNode::new(
                AstKind::Assignment {
                    target: Box::new(expr),
                    value: Box::new(value),
                },
                location,
            ));
        }

        Ok(expr)
    }

    /// Binding power for binary operators, low to high: `||`, `&&`,
    /// `|`, `^`, `&`, equality, relational, additive, multiplicative.
    fn binding_power(kind: TokenKind) -> Option<u8> {
        match kind {
            TokenKind::DoubleOr => Some(1),
            TokenKind::DoubleAnd => Some(2),
            TokenKind::Or => Some(3),
            TokenKind::Caret => Some(4),
            TokenKind::And => Some(5),
            TokenKind::DoubleEquals | TokenKind::NotEquals => Some(6),
            TokenKind::Less
            | TokenKind::LessEquals
            | TokenKind::Greater
            | TokenKind::GreaterEquals => Some(7),
            TokenKind::Plus | TokenKind::Minus => Some(8),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(9),
            _ => None,
        }
    }

    fn parse_binary(&mut self, min_power: u8) -> ParseResult<AstNode> {
        let left = self.parse_unary()?;
        self.parse_binary_from(left, min_power)
    }

    /// Precedence climbing from an already-parsed left operand. All
    /// binary operators are left-associative.
    fn parse_binary_from(&mut self, mut left: AstNode, min_power: u8) -> ParseResult<AstNode> {
        loop {
            let power = match Self::binding_power(self.current.kind) {
                Some(power) if power >= min_power => power,
                _ => break,
            };

            let operator = self.current.kind;
            self.advance();

            let right = self.parse_binary(power + 1)?;
            let location = left.location.clone();
            left = AstNode::new(
                AstKind::BinaryExpr {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                },
                location,
            );
        }

        Ok(left)
    }

    /// Prefix operators: `! ~ - +` and the address/dereference pair.
    fn parse_unary(&mut self) -> ParseResult<AstNode> {
        match self.current.kind {
            TokenKind::Not
            | TokenKind::Tilde
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::And
            | TokenKind::Star => {
                let operator = self.current.kind;
                let location = self.current.location.clone();
                self.advance();
                let operand = self.parse_unary()?;
                Ok(AstNode::new(
                    AstKind::UnaryExpr {
                        operand: Box::new(operand),
                        operator,
                        is_prefix: true,
                    },
                    location,
                ))
            }
            _ => self.parse_postfix(),
        }
    }

    /// Postfix operators: calls `( args )` and colon indexing
    /// `: expression :`, chained left-associatively.
    fn parse_postfix(&mut self) -> ParseResult<AstNode> {
        let expr = self.parse_primary()?;
        self.parse_postfix_from(expr)
    }

    fn parse_postfix_from(&mut self, mut expr: AstNode) -> ParseResult<AstNode> {
        loop {
            if self.consume(TokenKind::LeftParen) {
                let saved = self.colon_is_terminator;
                self.colon_is_terminator = false;
                let mut arguments = Vec::new();
                if !self.check(TokenKind::RightParen) {
                    loop {
                        match self.parse_expression() {
                            Ok(arg) => arguments.push(arg),
                            Err(error) => {
                                self.colon_is_terminator = saved;
                                return Err(error);
                            }
                        }
                        if !self.consume(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.colon_is_terminator = saved;
                self.expect(TokenKind::RightParen)?;

                let location = expr.location.clone();
                expr = AstNode::new(
                    AstKind::Call {
                        callee: Box::new(expr),
                        arguments,
                    },
                    location,
                );
            } else if !self.colon_is_terminator && self.check(TokenKind::Colon) {
                self.advance();
                let index = self.parse_index_expression()?;
                self.expect(TokenKind::Colon)?;

                let location = expr.location.clone();
                expr = AstNode::new(
                    AstKind::ArrayAccess {
                        array: Box::new(expr),
                        index: Box::new(index),
                    },
                    location,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<AstNode> {
        let location = self.current.location.clone();

        match self.current.kind {
            TokenKind::Number => {
                let token = self.advance();
                Ok(AstNode::new(
                    AstKind::LiteralInt {
                        value: token.int_value().unwrap_or(0),
                    },
                    location,
                ))
            }
            TokenKind::CharLiteral => {
                let token = self.advance();
                Ok(AstNode::new(
                    AstKind::LiteralChar {
                        value: token.char_value().unwrap_or(0),
                    },
                    location,
                ))
            }
            TokenKind::StringLiteral => {
                let token = self.advance();
                Ok(AstNode::new(
                    AstKind::LiteralString {
                        value: token.str_value().unwrap_or_default().to_string(),
                    },
                    location,
                ))
            }
            TokenKind::True => {
                self.advance();
                Ok(AstNode::new(AstKind::LiteralBool { value: true }, location))
            }
            TokenKind::False => {
                self.advance();
                Ok(AstNode::new(
                    AstKind::LiteralBool { value: false },
                    location,
                ))
            }
            TokenKind::Identifier => {
                let token = self.advance();
                Ok(AstNode::new(
                    AstKind::Identifier {
                        name: token.str_value().unwrap_or_default().to_string(),
                    },
                    location,
                ))
            }
            TokenKind::LeftParen => {
                self.advance();
                let saved = self.colon_is_terminator;
                self.colon_is_terminator = false;
                let expr = self.parse_expression();
                self.colon_is_terminator = saved;
                let expr = expr?;
                self.expect(TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::Error => Err(ParseError::Lexical),
            _ => Err(self.unexpected("expression")),
        }
    }
}
