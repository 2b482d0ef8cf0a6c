//! Abstract syntax tree
//!
//! The AST is a strict ownership tree: every parent exclusively owns its
//! children, cloning is the only way to obtain a second independent
//! subtree, and release happens bottom-up when a node is dropped. Each
//! node carries its source location and a `type_info` slot that the
//! semantic stage fills in later.
//!
//! Three views of a tree exist besides the structure itself: the
//! [`AstVisitor`] trait walks every node once in source order, `dump`
//! renders an indented debugging tree, and `to_source` echoes the tree
//! back to parseable source text.

use crate::keywords;
use crate::span::SourceLocation;
use crate::token::TokenKind;
use std::fmt;

/// The type of a value, variable or function.
///
/// Every value in the language is one machine word; the categories exist
/// for the semantic stage to distinguish intent (booleans, characters,
/// arrays, function signatures).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeInfo {
    Void,
    Bool,
    Char,
    Int,
    Array {
        element: Box<TypeInfo>,
        /// `None` for arrays of unspecified size (array parameters)
        size: Option<i64>,
    },
    Function {
        return_type: Box<TypeInfo>,
        params: Vec<TypeInfo>,
    },
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeInfo::Void => write!(f, "void"),
            TypeInfo::Bool => write!(f, "bool"),
            TypeInfo::Char => write!(f, "char"),
            TypeInfo::Int => write!(f, "int"),
            TypeInfo::Array { element, size } => match size {
                Some(n) => write!(f, "array[{}] of {}", n, element),
                None => write!(f, "array[] of {}", element),
            },
            TypeInfo::Function {
                return_type,
                params,
            } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", return_type)
            }
        }
    }
}

/// A node in the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: AstKind,
    pub location: SourceLocation,
    /// Filled during semantic analysis
    pub type_info: Option<TypeInfo>,
}

impl AstNode {
    pub fn new(kind: AstKind, location: SourceLocation) -> Self {
        Self {
            kind,
            location,
            type_info: None,
        }
    }
}

/// All node variants with their payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    /// Top-level program: an ordered sequence of declarations
    Program { declarations: Vec<AstNode> },

    /// Function declaration or definition.
    ///
    /// `is_external` implies `body` is absent; a missing body on a
    /// non-external declaration is a parse error.
    FunctionDecl {
        name: String,
        parameters: Vec<AstNode>,
        body: Option<Box<AstNode>>,
        return_type: TypeInfo,
        is_external: bool,
    },

    /// Variable declaration (function parameters; the semantic stage may
    /// also rewrite first assignments into these)
    VarDecl {
        name: String,
        initializer: Option<Box<AstNode>>,
        var_type: TypeInfo,
    },

    /// Array declaration: `name:N: = _v0, v1_;` with at most N values
    ArrayDecl {
        name: String,
        size: i64,
        initializers: Vec<AstNode>,
        element_type: TypeInfo,
    },

    /// Block of statements delimited by `<` and `>`
    Block { statements: Vec<AstNode> },

    If {
        condition: Box<AstNode>,
        then_branch: Box<AstNode>,
        else_branch: Option<Box<AstNode>>,
    },

    While {
        condition: Box<AstNode>,
        body: Box<AstNode>,
    },

    DoWhile {
        body: Box<AstNode>,
        condition: Box<AstNode>,
    },

    For {
        initializer: Option<Box<AstNode>>,
        condition: Option<Box<AstNode>>,
        increment: Option<Box<AstNode>>,
        body: Box<AstNode>,
    },

    Return { value: Option<Box<AstNode>> },

    Break,

    ExprStmt { expression: Box<AstNode> },

    /// Binary operation; the operator is the originating token kind
    BinaryExpr {
        left: Box<AstNode>,
        operator: TokenKind,
        right: Box<AstNode>,
    },

    UnaryExpr {
        operand: Box<AstNode>,
        operator: TokenKind,
        is_prefix: bool,
    },

    /// Integer literal, word-wide
    LiteralInt { value: i64 },

    /// Character literal as a Unicode codepoint
    LiteralChar { value: u32 },

    LiteralString { value: String },

    LiteralBool { value: bool },

    Identifier { name: String },

    /// Array element access: `array:index:`
    ArrayAccess {
        array: Box<AstNode>,
        index: Box<AstNode>,
    },

    Call {
        callee: Box<AstNode>,
        arguments: Vec<AstNode>,
    },

    Assignment {
        target: Box<AstNode>,
        value: Box<AstNode>,
    },

    /// A bare type reference
    TypeNode { type_data: TypeInfo },
}

/// Traversal control returned by visitor callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitFlow {
    /// Keep going; children of this node are visited next
    Continue,
    /// Abort the whole traversal
    Stop,
}

/// A visitor over the tree, one callback per variant, each defaulting to
/// a no-op. Callbacks may mutate node payloads but must not re-parent
/// nodes; children are visited only when the callback returns
/// [`VisitFlow::Continue`].
#[allow(unused_variables)]
pub trait AstVisitor {
    fn visit_program(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_function_decl(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_var_decl(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_array_decl(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_block(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_if_stmt(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_while_stmt(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_for_stmt(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_do_while_stmt(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_return_stmt(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_break_stmt(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_expr_stmt(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_binary_expr(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_unary_expr(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_literal_int(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_literal_char(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_literal_string(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_literal_bool(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_identifier(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_array_access(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_call_expr(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_assignment(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
    fn visit_type(&mut self, node: &mut AstNode) -> VisitFlow {
        VisitFlow::Continue
    }
}

/// Apply a visitor to a node and, unless stopped, its children in source
/// order. Returns `Stop` as soon as any callback stops the traversal.
pub fn accept(node: &mut AstNode, visitor: &mut dyn AstVisitor) -> VisitFlow {
    let flow = match node.kind {
        AstKind::Program { .. } => visitor.visit_program(node),
        AstKind::FunctionDecl { .. } => visitor.visit_function_decl(node),
        AstKind::VarDecl { .. } => visitor.visit_var_decl(node),
        AstKind::ArrayDecl { .. } => visitor.visit_array_decl(node),
        AstKind::Block { .. } => visitor.visit_block(node),
        AstKind::If { .. } => visitor.visit_if_stmt(node),
        AstKind::While { .. } => visitor.visit_while_stmt(node),
        AstKind::DoWhile { .. } => visitor.visit_do_while_stmt(node),
        AstKind::For { .. } => visitor.visit_for_stmt(node),
        AstKind::Return { .. } => visitor.visit_return_stmt(node),
        AstKind::Break => visitor.visit_break_stmt(node),
        AstKind::ExprStmt { .. } => visitor.visit_expr_stmt(node),
        AstKind::BinaryExpr { .. } => visitor.visit_binary_expr(node),
        AstKind::UnaryExpr { .. } => visitor.visit_unary_expr(node),
        AstKind::LiteralInt { .. } => visitor.visit_literal_int(node),
        AstKind::LiteralChar { .. } => visitor.visit_literal_char(node),
        AstKind::LiteralString { .. } => visitor.visit_literal_string(node),
        AstKind::LiteralBool { .. } => visitor.visit_literal_bool(node),
        AstKind::Identifier { .. } => visitor.visit_identifier(node),
        AstKind::ArrayAccess { .. } => visitor.visit_array_access(node),
        AstKind::Call { .. } => visitor.visit_call_expr(node),
        AstKind::Assignment { .. } => visitor.visit_assignment(node),
        AstKind::TypeNode { .. } => visitor.visit_type(node),
    };

    if flow == VisitFlow::Stop {
        return VisitFlow::Stop;
    }

    macro_rules! walk {
        ($child:expr) => {
            if accept($child, visitor) == VisitFlow::Stop {
                return VisitFlow::Stop;
            }
        };
    }

    match &mut node.kind {
        AstKind::Program { declarations } => {
            for decl in declarations {
                walk!(decl);
            }
        }
        AstKind::FunctionDecl {
            parameters, body, ..
        } => {
            for param in parameters {
                walk!(param);
            }
            if let Some(body) = body {
                walk!(body);
            }
        }
        AstKind::VarDecl { initializer, .. } => {
            if let Some(init) = initializer {
                walk!(init);
            }
        }
        AstKind::ArrayDecl { initializers, .. } => {
            for init in initializers {
                walk!(init);
            }
        }
        AstKind::Block { statements } => {
            for stmt in statements {
                walk!(stmt);
            }
        }
        AstKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            walk!(condition);
            walk!(then_branch);
            if let Some(else_branch) = else_branch {
                walk!(else_branch);
            }
        }
        AstKind::While { condition, body } => {
            walk!(condition);
            walk!(body);
        }
        AstKind::DoWhile { body, condition } => {
            walk!(body);
            walk!(condition);
        }
        AstKind::For {
            initializer,
            condition,
            increment,
            body,
        } => {
            if let Some(init) = initializer {
                walk!(init);
            }
            if let Some(cond) = condition {
                walk!(cond);
            }
            if let Some(incr) = increment {
                walk!(incr);
            }
            walk!(body);
        }
        AstKind::Return { value } => {
            if let Some(value) = value {
                walk!(value);
            }
        }
        AstKind::ExprStmt { expression } => {
            walk!(expression);
        }
        AstKind::BinaryExpr { left, right, .. } => {
            walk!(left);
            walk!(right);
        }
        AstKind::UnaryExpr { operand, .. } => {
            walk!(operand);
        }
        AstKind::ArrayAccess { array, index } => {
            walk!(array);
            walk!(index);
        }
        AstKind::Call { callee, arguments } => {
            walk!(callee);
            for arg in arguments {
                walk!(arg);
            }
        }
        AstKind::Assignment { target, value } => {
            walk!(target);
            walk!(value);
        }
        AstKind::Break
        | AstKind::LiteralInt { .. }
        | AstKind::LiteralChar { .. }
        | AstKind::LiteralString { .. }
        | AstKind::LiteralBool { .. }
        | AstKind::Identifier { .. }
        | AstKind::TypeNode { .. } => {}
    }

    VisitFlow::Continue
}

impl AstNode {
    /// Render the tree as an indented debugging dump, two spaces per
    /// level: the variant name, key attributes, then the children.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        match &self.kind {
            AstKind::Program { declarations } => {
                out.push_str(&format!("{}Program\n", pad));
                for decl in declarations {
                    decl.dump_into(out, indent + 1);
                }
            }
            AstKind::FunctionDecl {
                name,
                parameters,
                body,
                is_external,
                ..
            } => {
                if *is_external {
                    out.push_str(&format!("{}FunctionDecl '{}' external\n", pad, name));
                } else {
                    out.push_str(&format!("{}FunctionDecl '{}'\n", pad, name));
                }
                for param in parameters {
                    param.dump_into(out, indent + 1);
                }
                if let Some(body) = body {
                    body.dump_into(out, indent + 1);
                }
            }
            AstKind::VarDecl {
                name,
                initializer,
                var_type,
            } => {
                out.push_str(&format!("{}VarDecl '{}' : {}\n", pad, name, var_type));
                if let Some(init) = initializer {
                    init.dump_into(out, indent + 1);
                }
            }
            AstKind::ArrayDecl {
                name,
                size,
                initializers,
                element_type,
            } => {
                out.push_str(&format!(
                    "{}ArrayDecl '{}' size {} of {}\n",
                    pad, name, size, element_type
                ));
                for init in initializers {
                    init.dump_into(out, indent + 1);
                }
            }
            AstKind::Block { statements } => {
                out.push_str(&format!("{}Block\n", pad));
                for stmt in statements {
                    stmt.dump_into(out, indent + 1);
                }
            }
            AstKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push_str(&format!("{}If\n", pad));
                condition.dump_into(out, indent + 1);
                then_branch.dump_into(out, indent + 1);
                if let Some(else_branch) = else_branch {
                    else_branch.dump_into(out, indent + 1);
                }
            }
            AstKind::While { condition, body } => {
                out.push_str(&format!("{}While\n", pad));
                condition.dump_into(out, indent + 1);
                body.dump_into(out, indent + 1);
            }
            AstKind::DoWhile { body, condition } => {
                out.push_str(&format!("{}DoWhile\n", pad));
                body.dump_into(out, indent + 1);
                condition.dump_into(out, indent + 1);
            }
            AstKind::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                out.push_str(&format!("{}For\n", pad));
                if let Some(init) = initializer {
                    init.dump_into(out, indent + 1);
                }
                if let Some(cond) = condition {
                    cond.dump_into(out, indent + 1);
                }
                if let Some(incr) = increment {
                    incr.dump_into(out, indent + 1);
                }
                body.dump_into(out, indent + 1);
            }
            AstKind::Return { value } => {
                out.push_str(&format!("{}Return\n", pad));
                if let Some(value) = value {
                    value.dump_into(out, indent + 1);
                }
            }
            AstKind::Break => {
                out.push_str(&format!("{}Break\n", pad));
            }
            AstKind::ExprStmt { expression } => {
                out.push_str(&format!("{}ExprStmt\n", pad));
                expression.dump_into(out, indent + 1);
            }
            AstKind::BinaryExpr {
                left,
                operator,
                right,
            } => {
                out.push_str(&format!("{}BinaryExpr '{}'\n", pad, operator));
                left.dump_into(out, indent + 1);
                right.dump_into(out, indent + 1);
            }
            AstKind::UnaryExpr {
                operand,
                operator,
                is_prefix,
            } => {
                let fix = if *is_prefix { "prefix" } else { "postfix" };
                out.push_str(&format!("{}UnaryExpr '{}' {}\n", pad, operator, fix));
                operand.dump_into(out, indent + 1);
            }
            AstKind::LiteralInt { value } => {
                out.push_str(&format!("{}LiteralInt {}\n", pad, value));
            }
            AstKind::LiteralChar { value } => match char::from_u32(*value) {
                Some(c) if !c.is_control() => {
                    out.push_str(&format!("{}LiteralChar '{}'\n", pad, c));
                }
                _ => {
                    out.push_str(&format!("{}LiteralChar U+{:04X}\n", pad, value));
                }
            },
            AstKind::LiteralString { value } => {
                out.push_str(&format!("{}LiteralString {:?}\n", pad, value));
            }
            AstKind::LiteralBool { value } => {
                out.push_str(&format!("{}LiteralBool {}\n", pad, value));
            }
            AstKind::Identifier { name } => {
                out.push_str(&format!("{}Identifier '{}'\n", pad, name));
            }
            AstKind::ArrayAccess { array, index } => {
                out.push_str(&format!("{}ArrayAccess\n", pad));
                array.dump_into(out, indent + 1);
                index.dump_into(out, indent + 1);
            }
            AstKind::Call { callee, arguments } => {
                out.push_str(&format!("{}Call\n", pad));
                callee.dump_into(out, indent + 1);
                for arg in arguments {
                    arg.dump_into(out, indent + 1);
                }
            }
            AstKind::Assignment { target, value } => {
                out.push_str(&format!("{}Assignment\n", pad));
                target.dump_into(out, indent + 1);
                value.dump_into(out, indent + 1);
            }
            AstKind::TypeNode { type_data } => {
                out.push_str(&format!("{}TypeNode {}\n", pad, type_data));
            }
        }
    }

    /// Echo the tree back to source text that parses to the same
    /// structure. Deterministic, so printing twice through a re-parse
    /// yields identical text.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_stmt(&mut out, 0);
        out
    }

    fn write_stmt(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        match &self.kind {
            AstKind::Program { declarations } => {
                for (i, decl) in declarations.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    decl.write_stmt(out, indent);
                }
            }
            AstKind::FunctionDecl {
                name,
                parameters,
                body,
                is_external,
                ..
            } => {
                out.push_str(&pad);
                if *is_external {
                    out.push_str(keywords::keyword_str(TokenKind::External).unwrap_or("екстерно"));
                    out.push(' ');
                }
                out.push_str(name);
                out.push('(');
                for (i, param) in parameters.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if let AstKind::VarDecl { name, var_type, .. } = &param.kind {
                        out.push_str(name);
                        if matches!(var_type, TypeInfo::Array { .. }) {
                            out.push_str("::");
                        }
                    }
                }
                out.push(')');
                if *is_external {
                    out.push_str(";\n");
                } else if let Some(body) = body {
                    out.push(' ');
                    body.write_block(out, indent);
                }
            }
            AstKind::VarDecl {
                name, initializer, ..
            } => {
                out.push_str(&pad);
                out.push_str(name);
                if let Some(init) = initializer {
                    out.push_str(" = ");
                    init.write_expr(out);
                }
                out.push_str(";\n");
            }
            AstKind::ArrayDecl {
                name,
                size,
                initializers,
                ..
            } => {
                out.push_str(&pad);
                out.push_str(&format!("{}:{}: = _ ", name, size));
                for (i, init) in initializers.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    init.write_expr(out);
                }
                out.push_str(" _;\n");
            }
            AstKind::Block { .. } => {
                out.push_str(&pad);
                self.write_block(out, indent);
            }
            AstKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push_str(&pad);
                out.push_str("ако (");
                condition.write_expr(out);
                out.push_str(") ");
                then_branch.write_branch(out, indent);
                if let Some(else_branch) = else_branch {
                    out.push_str(&pad);
                    out.push_str("иначе ");
                    else_branch.write_branch(out, indent);
                }
            }
            AstKind::While { condition, body } => {
                out.push_str(&pad);
                out.push_str("док (");
                condition.write_expr(out);
                out.push_str(") ");
                body.write_branch(out, indent);
            }
            AstKind::DoWhile { body, condition } => {
                out.push_str(&pad);
                out.push_str("ради ");
                body.write_branch(out, indent);
                out.push_str(&pad);
                out.push_str("док (");
                condition.write_expr(out);
                out.push_str(");\n");
            }
            AstKind::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                out.push_str(&pad);
                out.push_str("за (");
                match initializer {
                    Some(init) => {
                        // The init statement carries its own terminator
                        let mut init_text = String::new();
                        init.write_stmt(&mut init_text, 0);
                        out.push_str(init_text.trim_end_matches('\n'));
                    }
                    None => out.push(';'),
                }
                out.push(' ');
                if let Some(cond) = condition {
                    cond.write_expr(out);
                }
                out.push_str("; ");
                if let Some(incr) = increment {
                    incr.write_expr(out);
                }
                out.push_str(") ");
                body.write_branch(out, indent);
            }
            AstKind::Return { value } => {
                out.push_str(&pad);
                out.push_str("врати");
                if let Some(value) = value {
                    out.push(' ');
                    value.write_expr(out);
                }
                out.push_str(";\n");
            }
            AstKind::Break => {
                out.push_str(&pad);
                out.push_str("прекини;\n");
            }
            AstKind::ExprStmt { expression } => {
                out.push_str(&pad);
                expression.write_expr(out);
                out.push_str(";\n");
            }
            // Expressions standing where a statement is expected
            _ => {
                out.push_str(&pad);
                self.write_expr(out);
                out.push_str(";\n");
            }
        }
    }

    /// A statement used as a loop or branch body: blocks open in place,
    /// single statements go on their own line.
    fn write_branch(&self, out: &mut String, indent: usize) {
        if matches!(self.kind, AstKind::Block { .. }) {
            self.write_block(out, indent);
        } else {
            out.push('\n');
            self.write_stmt(out, indent + 1);
        }
    }

    fn write_block(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        if let AstKind::Block { statements } = &self.kind {
            out.push_str("<\n");
            for stmt in statements {
                stmt.write_stmt(out, indent + 1);
            }
            out.push_str(&pad);
            out.push_str(">\n");
        }
    }

    fn write_expr(&self, out: &mut String) {
        match &self.kind {
            AstKind::BinaryExpr {
                left,
                operator,
                right,
            } => {
                out.push('(');
                left.write_expr(out);
                out.push_str(&format!(" {} ", operator));
                right.write_expr(out);
                out.push(')');
            }
            AstKind::UnaryExpr {
                operand,
                operator,
                is_prefix,
            } => {
                out.push('(');
                if *is_prefix {
                    out.push_str(&operator.to_string());
                    operand.write_expr(out);
                } else {
                    operand.write_expr(out);
                    out.push_str(&operator.to_string());
                }
                out.push(')');
            }
            AstKind::LiteralInt { value } => {
                out.push_str(&value.to_string());
            }
            AstKind::LiteralChar { value } => {
                out.push('\'');
                match char::from_u32(*value) {
                    Some('\n') => out.push_str("\\n"),
                    Some('\t') => out.push_str("\\t"),
                    Some('\r') => out.push_str("\\r"),
                    Some('\\') => out.push_str("\\\\"),
                    Some('\'') => out.push_str("\\'"),
                    Some('\0') => out.push_str("\\0"),
                    Some(c) if !c.is_control() => out.push(c),
                    _ => out.push_str(&format!("\\u{:04X}", value)),
                }
                out.push('\'');
            }
            AstKind::LiteralString { value } => {
                out.push('"');
                for c in value.chars() {
                    match c {
                        '\n' => out.push_str("\\n"),
                        '\t' => out.push_str("\\t"),
                        '\r' => out.push_str("\\r"),
                        '\\' => out.push_str("\\\\"),
                        '"' => out.push_str("\\\""),
                        '\0' => out.push_str("\\0"),
                        c => out.push(c),
                    }
                }
                out.push('"');
            }
            AstKind::LiteralBool { value } => {
                let kind = if *value {
                    TokenKind::True
                } else {
                    TokenKind::False
                };
                out.push_str(keywords::keyword_str(kind).unwrap_or("тачно"));
            }
            AstKind::Identifier { name } => {
                out.push_str(name);
            }
            AstKind::ArrayAccess { array, index } => {
                array.write_expr(out);
                out.push(':');
                // A nested access in index position needs parentheses
                // to survive a re-parse
                if matches!(index.kind, AstKind::ArrayAccess { .. }) {
                    out.push('(');
                    index.write_expr(out);
                    out.push(')');
                } else {
                    index.write_expr(out);
                }
                out.push(':');
            }
            AstKind::Call { callee, arguments } => {
                callee.write_expr(out);
                out.push('(');
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    arg.write_expr(out);
                }
                out.push(')');
            }
            AstKind::Assignment { target, value } => {
                out.push('(');
                target.write_expr(out);
                out.push_str(" = ");
                value.write_expr(out);
                out.push(')');
            }
            AstKind::TypeNode { type_data } => {
                out.push_str(&type_data.to_string());
            }
            // Statements have no expression rendering
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new("test.ћпп", 1, 1)
    }

    fn int(value: i64) -> AstNode {
        AstNode::new(AstKind::LiteralInt { value }, loc())
    }

    fn ident(name: &str) -> AstNode {
        AstNode::new(
            AstKind::Identifier {
                name: name.to_string(),
            },
            loc(),
        )
    }

    fn sample_tree() -> AstNode {
        // главна() < врати 1 + 2; >
        let sum = AstNode::new(
            AstKind::BinaryExpr {
                left: Box::new(int(1)),
                operator: TokenKind::Plus,
                right: Box::new(int(2)),
            },
            loc(),
        );
        let ret = AstNode::new(
            AstKind::Return {
                value: Some(Box::new(sum)),
            },
            loc(),
        );
        let block = AstNode::new(
            AstKind::Block {
                statements: vec![ret],
            },
            loc(),
        );
        let func = AstNode::new(
            AstKind::FunctionDecl {
                name: "главна".to_string(),
                parameters: vec![],
                body: Some(Box::new(block)),
                return_type: TypeInfo::Int,
                is_external: false,
            },
            loc(),
        );
        AstNode::new(
            AstKind::Program {
                declarations: vec![func],
            },
            loc(),
        )
    }

    #[test]
    fn test_clone_is_structurally_equal() {
        let tree = sample_tree();
        let copy = tree.clone();
        assert_eq!(tree, copy);
    }

    #[test]
    fn test_clone_is_independent() {
        let tree = sample_tree();
        let mut copy = tree.clone();

        // Mutate a leaf of the clone; the original must not change
        if let AstKind::Program { declarations } = &mut copy.kind {
            if let AstKind::FunctionDecl { name, .. } = &mut declarations[0].kind {
                name.push_str("_измењено");
            }
        }
        assert_ne!(tree, copy);

        if let AstKind::Program { declarations } = &tree.kind {
            if let AstKind::FunctionDecl { name, .. } = &declarations[0].kind {
                assert_eq!(name, "главна");
            }
        }
    }

    struct RecordingVisitor {
        visited: Vec<&'static str>,
    }

    impl AstVisitor for RecordingVisitor {
        fn visit_program(&mut self, _: &mut AstNode) -> VisitFlow {
            self.visited.push("program");
            VisitFlow::Continue
        }
        fn visit_function_decl(&mut self, _: &mut AstNode) -> VisitFlow {
            self.visited.push("function_decl");
            VisitFlow::Continue
        }
        fn visit_block(&mut self, _: &mut AstNode) -> VisitFlow {
            self.visited.push("block");
            VisitFlow::Continue
        }
        fn visit_return_stmt(&mut self, _: &mut AstNode) -> VisitFlow {
            self.visited.push("return");
            VisitFlow::Continue
        }
        fn visit_binary_expr(&mut self, _: &mut AstNode) -> VisitFlow {
            self.visited.push("binary");
            VisitFlow::Continue
        }
        fn visit_literal_int(&mut self, _: &mut AstNode) -> VisitFlow {
            self.visited.push("int");
            VisitFlow::Continue
        }
    }

    #[test]
    fn test_visitor_visits_in_source_order() {
        let mut tree = sample_tree();
        let mut visitor = RecordingVisitor { visited: vec![] };
        let flow = accept(&mut tree, &mut visitor);
        assert_eq!(flow, VisitFlow::Continue);
        assert_eq!(
            visitor.visited,
            vec![
                "program",
                "function_decl",
                "block",
                "return",
                "binary",
                "int",
                "int"
            ]
        );
    }

    struct StoppingVisitor {
        count: usize,
    }

    impl AstVisitor for StoppingVisitor {
        fn visit_block(&mut self, _: &mut AstNode) -> VisitFlow {
            self.count += 1;
            VisitFlow::Stop
        }
        fn visit_literal_int(&mut self, _: &mut AstNode) -> VisitFlow {
            self.count += 100;
            VisitFlow::Continue
        }
    }

    #[test]
    fn test_visitor_stop_aborts_traversal() {
        let mut tree = sample_tree();
        let mut visitor = StoppingVisitor { count: 0 };
        let flow = accept(&mut tree, &mut visitor);
        assert_eq!(flow, VisitFlow::Stop);
        // The literals under the block were never reached
        assert_eq!(visitor.count, 1);
    }

    #[test]
    fn test_visitor_may_mutate_payloads() {
        struct Renamer;
        impl AstVisitor for Renamer {
            fn visit_identifier(&mut self, node: &mut AstNode) -> VisitFlow {
                if let AstKind::Identifier { name } = &mut node.kind {
                    *name = name.to_uppercase();
                }
                VisitFlow::Continue
            }
        }

        let mut node = ident("abc");
        accept(&mut node, &mut Renamer);
        assert_eq!(node.kind, AstKind::Identifier { name: "ABC".into() });
    }

    #[test]
    fn test_dump_shape() {
        let tree = sample_tree();
        let dump = tree.dump();
        let expected = concat!(
            "Program\n",
            "  FunctionDecl 'главна'\n",
            "    Block\n",
            "      Return\n",
            "        BinaryExpr '+'\n",
            "          LiteralInt 1\n",
            "          LiteralInt 2\n",
        );
        assert_eq!(dump, expected);
    }

    #[test]
    fn test_to_source_function() {
        let tree = sample_tree();
        let source = tree.to_source();
        assert!(source.contains("главна()"));
        assert!(source.contains("врати (1 + 2);"));
        assert!(source.starts_with("главна() <\n"));
        assert!(source.trim_end().ends_with('>'));
    }

    #[test]
    fn test_to_source_array_decl() {
        let node = AstNode::new(
            AstKind::ArrayDecl {
                name: "бројеви".to_string(),
                size: 4,
                initializers: vec![int(1), int(2), int(3), int(4)],
                element_type: TypeInfo::Int,
            },
            loc(),
        );
        assert_eq!(node.to_source(), "бројеви:4: = _ 1, 2, 3, 4 _;\n");
    }

    #[test]
    fn test_type_info_display() {
        assert_eq!(TypeInfo::Int.to_string(), "int");
        let arr = TypeInfo::Array {
            element: Box::new(TypeInfo::Int),
            size: Some(4),
        };
        assert_eq!(arr.to_string(), "array[4] of int");
        let unsized_arr = TypeInfo::Array {
            element: Box::new(TypeInfo::Int),
            size: None,
        };
        assert_eq!(unsized_arr.to_string(), "array[] of int");
        let func = TypeInfo::Function {
            return_type: Box::new(TypeInfo::Int),
            params: vec![TypeInfo::Int, TypeInfo::Char],
        };
        assert_eq!(func.to_string(), "fn(int, char) -> int");
    }

    #[test]
    fn test_type_info_deep_clone() {
        let original = TypeInfo::Function {
            return_type: Box::new(TypeInfo::Array {
                element: Box::new(TypeInfo::Int),
                size: Some(8),
            }),
            params: vec![TypeInfo::Bool],
        };
        let copy = original.clone();
        assert_eq!(original, copy);
    }
}
