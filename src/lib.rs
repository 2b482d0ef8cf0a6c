//! ћ++ compiler front-end
//!
//! ћ++ is a minimalist C-like language with Serbian-Cyrillic keywords,
//! a single machine-word type for every value, angle brackets for
//! blocks, and a colon-based array syntax. This crate implements the
//! front-end pipeline and the structured diagnostics it reports through.
//!
//! # Architecture
//!
//! ```text
//! Source Code (.ћпп)
//!       │
//!       ▼
//! ┌─────────────┐
//! │    Lexer    │  → Tokens (UTF-8 aware, byte columns)
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │   Parser    │  → AST
//! └─────────────┘
//!       │
//!       ▼
//!   Hand-off: Program AST + Diagnostics + TargetInfo
//!   (semantic analysis, IR and code generation consume these
//!    downstream)
//! ```

pub mod ast;
pub mod diag;
pub mod keywords;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod target;
pub mod token;
pub mod utf8;

// Re-exports for convenience
pub use ast::{AstKind, AstNode, TypeInfo};
pub use diag::{DiagKind, Diagnostics, Severity};
pub use lexer::Lexer;
pub use parser::Parser;
pub use span::{SourceLocation, Span};
pub use target::{Arch, TargetInfo};
pub use token::{Token, TokenKind};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File extension for ћ++ source files
pub const FILE_EXTENSION: &str = "ћпп";
