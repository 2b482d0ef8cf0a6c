//! ћ++ compiler CLI
//!
//! The `chppc` command drives the front-end pipeline: diagnostics and
//! target setup, lexing, parsing, and the summary that decides the exit
//! status. Semantic analysis, IR and code generation consume the
//! front-end hand-off and are not implemented yet; the driver says so
//! instead of pretending.

use chpp::token::TokenKind;
use chpp::{Arch, DiagKind, Diagnostics, Lexer, Parser, Severity, TargetInfo};
use clap::Parser as CliParser;
use std::path::PathBuf;

#[derive(CliParser)]
#[command(name = "chppc")]
#[command(version = chpp::VERSION)]
#[command(about = "Compiler for the ћ++ programming language", long_about = None)]
struct Cli {
    /// Input source file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file name
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Generate assembly code only
    #[arg(short = 'S')]
    assembly_only: bool,

    /// Target architecture (x86 or x86-64, default: current machine)
    #[arg(long, value_name = "ARCH")]
    target: Option<String>,

    /// Optimization level (0-3)
    #[arg(short = 'O', value_name = "LEVEL", default_value_t = 0)]
    opt_level: u8,

    /// Verbose output
    #[arg(long)]
    verbose: bool,

    /// Write diagnostics to a timestamped log file
    #[arg(long)]
    generate_error_log: bool,

    /// Stop after lexical analysis
    #[arg(long)]
    stop_after_lexing: bool,

    /// Stop after syntax analysis
    #[arg(long)]
    stop_after_parsing: bool,

    /// Stop after semantic analysis
    #[arg(long)]
    stop_after_semantic: bool,

    /// Stop after IR generation
    #[arg(long)]
    stop_after_ir: bool,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    if cli.opt_level > 3 {
        return Err(miette::miette!(
            "Invalid optimization level. Use -O0 to -O3"
        ));
    }

    let mut diag = Diagnostics::new(cli.generate_error_log);

    let arch = match &cli.target {
        Some(name) => Arch::from_name(name).ok_or_else(|| {
            miette::miette!("Unsupported target architecture '{}'. Use x86 or x86-64", name)
        })?,
        None => Arch::detect(&mut diag),
    };
    let target = TargetInfo::init_arch(arch, &mut diag);

    let input_name = cli.input.to_string_lossy().into_owned();

    // The extension is advisory; anything readable compiles
    let has_extension = cli
        .input
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e == chpp::FILE_EXTENSION);
    if !has_extension {
        diag.report(
            DiagKind::Io,
            Severity::Warning,
            &input_name,
            0,
            0,
            "Input file does not have .ћпп extension",
            None,
            file!(),
            line!(),
        );
    }

    if cli.verbose {
        println!("ћ++ Compiler Configuration:");
        println!("  Input file: {}", input_name);
        match &cli.output {
            Some(output) => println!("  Output file: {}", output.display()),
            None => println!("  Output file: a.out"),
        }
        println!(
            "  Generate assembly only: {}",
            if cli.assembly_only { "yes" } else { "no" }
        );
        println!("  Target architecture: {}", target.arch);
        println!("  Word size: {} bytes", target.word_size);
        println!("  Optimization level: O{}", cli.opt_level);
        if cli.stop_after_lexing {
            println!("  Stopping after lexical analysis");
        } else if cli.stop_after_parsing {
            println!("  Stopping after syntax analysis");
        } else if cli.stop_after_semantic {
            println!("  Stopping after semantic analysis");
        } else if cli.stop_after_ir {
            println!("  Stopping after IR generation");
        }
    }

    // An unreadable input is a fatal IO diagnostic inside from_file
    let lexer = Lexer::from_file(&cli.input, target, &mut diag);

    if cli.stop_after_lexing {
        dump_tokens(lexer, &mut diag);
        return finish(diag, cli.verbose);
    }

    let program = {
        let mut parser = Parser::new(lexer, &mut diag);
        parser.parse_program()
    };

    if cli.stop_after_parsing {
        print!("{}", program.dump());
    } else {
        // Hand-off point: Program AST + Diagnostics + TargetInfo.
        // The downstream stages consuming them are not implemented yet.
        println!("Front-end complete; semantic analysis and code generation are not implemented yet");
    }

    finish(diag, cli.verbose)
}

/// Print every token in the file, one per line.
fn dump_tokens(mut lexer: Lexer, diag: &mut Diagnostics) {
    println!("All tokens in file: {}", lexer.filename());
    println!("----------------------------------------");

    let mut count = 0;
    loop {
        let token = lexer.next_token(diag);
        count += 1;
        println!("{}: {}", count, token);
        if token.kind == TokenKind::Eof || token.kind == TokenKind::Error {
            break;
        }
    }

    println!("----------------------------------------");
    println!("Total tokens: {}", count);
}

/// Print the summary and derive the exit status from the error count.
fn finish(mut diag: Diagnostics, verbose: bool) -> miette::Result<()> {
    diag.print_summary(verbose);

    let errors = diag.count(Some(Severity::Error)) + diag.count(Some(Severity::Fatal));
    if errors > 0 {
        return Err(miette::miette!("Found {} error(s)", errors));
    }

    println!("Compilation successful");
    Ok(())
}
