//! End-to-end scenarios for the front-end pipeline, driven through the
//! public library API the way the driver uses it.

use chpp::ast::{AstKind, TypeInfo};
use chpp::{Arch, Diagnostics, Lexer, Parser, Severity, TargetInfo, TokenKind};

fn target() -> TargetInfo {
    TargetInfo::init_arch(Arch::X86_64, &mut Diagnostics::new(false))
}

fn parse_program(source: &str, diag: &mut Diagnostics) -> chpp::AstNode {
    chpp::parser::parse(source, "test.ћпп", target(), diag)
}

fn parse_statement(source: &str, diag: &mut Diagnostics) -> Option<chpp::AstNode> {
    let lexer = Lexer::new(source, "test.ћпп", target());
    let mut parser = Parser::new(lexer, diag);
    parser.parse_statement().ok()
}

/// Keyword vs identifier: `ако` is the keyword, `ако1` and `_ако` are
/// plain identifiers.
#[test]
fn keyword_versus_identifier() {
    let mut diag = Diagnostics::new(false);
    let mut lexer = Lexer::new("ако ако1 _ако", "test.ћпп", target());

    let first = lexer.next_token(&mut diag);
    assert_eq!(first.kind, TokenKind::If);

    let second = lexer.next_token(&mut diag);
    assert_eq!(second.kind, TokenKind::Identifier);
    assert_eq!(second.str_value(), Some("ако1"));

    let third = lexer.next_token(&mut diag);
    assert_eq!(third.kind, TokenKind::Identifier);
    assert_eq!(third.str_value(), Some("_ако"));

    assert_eq!(lexer.next_token(&mut diag).kind, TokenKind::Eof);
    assert_eq!(diag.count(None), 0);
}

/// Array literal declaration with the colon-and-underscore syntax.
#[test]
fn array_literal_declaration() {
    let mut diag = Diagnostics::new(false);
    let stmt = parse_statement("бројеви:4: = _1, 2, 3, 4_;", &mut diag).expect("should parse");
    assert_eq!(diag.count(None), 0);

    let AstKind::ArrayDecl {
        name,
        size,
        initializers,
        element_type,
    } = &stmt.kind
    else {
        panic!("expected array declaration, got {:?}", stmt.kind);
    };
    assert_eq!(name, "бројеви");
    assert_eq!(*size, 4);
    assert_eq!(*element_type, TypeInfo::Int);
    let values: Vec<_> = initializers
        .iter()
        .map(|n| match n.kind {
            AstKind::LiteralInt { value } => value,
            _ => panic!("expected integer initializer"),
        })
        .collect();
    assert_eq!(values, vec![1, 2, 3, 4]);
}

/// Angle-bracket block: a full function definition for the entry point.
#[test]
fn angle_bracket_block() {
    let mut diag = Diagnostics::new(false);
    let program = parse_program("главна() < врати 0; >", &mut diag);
    assert_eq!(diag.count(None), 0);

    let AstKind::Program { declarations } = &program.kind else {
        panic!("expected program");
    };
    assert_eq!(declarations.len(), 1);

    let AstKind::FunctionDecl {
        name,
        parameters,
        body,
        is_external,
        ..
    } = &declarations[0].kind
    else {
        panic!("expected function declaration");
    };
    assert_eq!(name, "главна");
    assert!(parameters.is_empty());
    assert!(!is_external);

    let AstKind::Block { statements } = &body.as_ref().unwrap().kind else {
        panic!("expected block body");
    };
    assert_eq!(statements.len(), 1);
    let AstKind::Return { value } = &statements[0].kind else {
        panic!("expected return");
    };
    assert_eq!(
        value.as_ref().unwrap().kind,
        AstKind::LiteralInt { value: 0 }
    );
}

/// An unterminated string produces exactly one lexical error and the
/// parser resynchronizes without piling syntax errors on top.
#[test]
fn unterminated_string_no_cascade() {
    let mut diag = Diagnostics::new(false);
    let result = parse_statement("x = \"hello;", &mut diag);
    assert!(result.is_none());

    assert_eq!(diag.count(None), 1);
    assert_eq!(diag.count(Some(Severity::Error)), 1);
    assert!(diag.entries()[0].message.contains("Unterminated string"));
}

/// A floating literal warns once and truncates to its integral part.
#[test]
fn floating_literal_truncates() {
    let mut diag = Diagnostics::new(false);
    let stmt = parse_statement("x = 3.14;", &mut diag).expect("should parse");

    assert_eq!(diag.count(None), 1);
    assert_eq!(diag.count(Some(Severity::Warning)), 1);
    assert!(diag.entries()[0].message.contains("Floating-point"));

    let AstKind::ExprStmt { expression } = &stmt.kind else {
        panic!("expected expression statement");
    };
    let AstKind::Assignment { target, value } = &expression.kind else {
        panic!("expected assignment");
    };
    assert_eq!(target.kind, AstKind::Identifier { name: "x".into() });
    assert_eq!(value.kind, AstKind::LiteralInt { value: 3 });
}

/// External declaration: signature only, no body.
#[test]
fn external_declaration() {
    let mut diag = Diagnostics::new(false);
    let program = parse_program("екстерно putchar(c);", &mut diag);
    assert_eq!(diag.count(None), 0);

    let AstKind::Program { declarations } = &program.kind else {
        panic!("expected program");
    };
    let AstKind::FunctionDecl {
        name,
        parameters,
        body,
        is_external,
        ..
    } = &declarations[0].kind
    else {
        panic!("expected function declaration");
    };
    assert_eq!(name, "putchar");
    assert!(is_external);
    assert!(body.is_none());

    let AstKind::VarDecl {
        name,
        initializer,
        var_type,
    } = &parameters[0].kind
    else {
        panic!("expected parameter");
    };
    assert_eq!(name, "c");
    assert!(initializer.is_none());
    assert_eq!(*var_type, TypeInfo::Int);
}

/// A complete program exercising most of the grammar in one pass.
#[test]
fn full_program_roundtrip() {
    let source = "\
екстерно испиши(зн);

степен(основа, изложилац) <
    резултат = 1;
    за (и = 0; и < изложилац; и = и + 1) <
        резултат = резултат * основа;
    >
    врати резултат;
>

главна() <
    вредности:3: = _2, 4, 8_;
    збир = 0;
    и = 0;
    док (и < 3) <
        ако (вредности:и: % 2 == 0)
            збир = збир + степен(вредности:и:, 2);
        иначе
            прекини;
        и = и + 1;
    >
    врати збир;
>
";
    let mut diag = Diagnostics::new(false);
    let program = parse_program(source, &mut diag);
    assert_eq!(diag.count(None), 0, "program should parse cleanly");

    let AstKind::Program { declarations } = &program.kind else {
        panic!("expected program");
    };
    assert_eq!(declarations.len(), 3);

    // The tree echoes back to source that parses to the same shape
    let echoed = program.to_source();
    let mut diag = Diagnostics::new(false);
    let reparsed = parse_program(&echoed, &mut diag);
    assert_eq!(diag.count(None), 0, "echoed source should parse: {}", echoed);
    assert_eq!(reparsed.to_source(), echoed);

    // And the debugging dump names every declaration
    let dump = program.dump();
    assert!(dump.contains("FunctionDecl 'испиши' external"));
    assert!(dump.contains("FunctionDecl 'степен'"));
    assert!(dump.contains("FunctionDecl 'главна'"));
    assert!(dump.contains("ArrayDecl 'вредности' size 3 of int"));
}
