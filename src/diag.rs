//! Structured diagnostics
//!
//! Every compiler component reports through a [`Diagnostics`] value that
//! the driver creates at startup and threads down the pipeline. Entries
//! are typed, located and severity-graded; each is printed to stderr the
//! moment it is reported, and optionally mirrored into a log file. A
//! `Fatal` report tears the process down after cleanup.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

// ANSI color codes for terminal output
const COLOR_RED: &str = "\x1b[31m";
const COLOR_YELLOW: &str = "\x1b[33m";
const COLOR_BLUE: &str = "\x1b[34m";
const COLOR_CYAN: &str = "\x1b[36m";
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_BOLD: &str = "\x1b[1m";

/// Retained-entry cap; reports past this are dropped after one notice.
pub const MAX_DIAGNOSTICS: usize = 500;

/// The failure space, partitioned by compiler stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagKind {
    Lexical,
    Syntax,
    Semantic,
    CodeGen,
    Io,
    Internal,
}

impl fmt::Display for DiagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagKind::Lexical => "Lexical",
            DiagKind::Syntax => "Syntax",
            DiagKind::Semantic => "Semantic",
            DiagKind::CodeGen => "CodeGen",
            DiagKind::Io => "IO",
            DiagKind::Internal => "Internal",
        };
        write!(f, "{}", s)
    }
}

/// How bad a diagnostic is, and what it does to compilation.
///
/// `Warning` and `Error` let compilation continue so more problems can be
/// found; `Fatal` terminates the process immediately after cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Fatal => "Fatal Error",
        };
        write!(f, "{}", s)
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagKind,
    pub severity: Severity,
    pub filename: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub suggestion: Option<String>,
    /// Compiler source file that reported this (`file!()` at the call site)
    pub reporter_file: &'static str,
    pub reporter_line: u32,
}

/// The diagnostics registry.
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    use_colors: bool,
    log_file: Option<File>,
    overflow_notified: bool,
}

impl Diagnostics {
    /// Create a fresh registry.
    ///
    /// Decides whether terminal color is enabled from the standard ANSI
    /// environment indicators, and optionally opens a timestamped log
    /// file. A failed log open is a warning, never a hard failure.
    pub fn new(create_log_file: bool) -> Self {
        let use_colors = std::env::var_os("NO_COLOR").is_none()
            && std::env::var("TERM").map_or(false, |t| t != "dumb");

        let log_file = if create_log_file {
            let stamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            let log_name = format!("ћпп_error_log_{}.txt", stamp);

            match File::create(&log_name) {
                Ok(mut file) => {
                    let _ = writeln!(file, "ћ++ Compiler Error Log");
                    let _ = writeln!(file, "======================");
                    let _ = writeln!(file);
                    Some(file)
                }
                Err(_) => {
                    eprintln!("Warning: Could not create error log file");
                    None
                }
            }
        } else {
            None
        };

        Self {
            entries: Vec::new(),
            use_colors,
            log_file,
            overflow_notified: false,
        }
    }

    /// Record a diagnostic and print it immediately.
    ///
    /// `reporter_file`/`reporter_line` are the compiler's own `file!()`
    /// and `line!()` at the call site; they show up in debug builds and
    /// in the log file. A `Fatal` severity terminates the process.
    #[allow(clippy::too_many_arguments)]
    pub fn report(
        &mut self,
        kind: DiagKind,
        severity: Severity,
        filename: &str,
        line: u32,
        column: u32,
        message: &str,
        suggestion: Option<&str>,
        reporter_file: &'static str,
        reporter_line: u32,
    ) {
        if self.entries.len() >= MAX_DIAGNOSTICS {
            if !self.overflow_notified {
                eprintln!("Too many errors, stopping error tracking.");
                self.overflow_notified = true;
            }
            return;
        }

        let entry = Diagnostic {
            kind,
            severity,
            filename: filename.to_string(),
            line,
            column,
            message: message.to_string(),
            suggestion: suggestion.map(str::to_string),
            reporter_file,
            reporter_line,
        };

        self.print(&entry);
        self.entries.push(entry);

        if severity == Severity::Fatal {
            eprintln!("Fatal error encountered, stopping compilation.");
            self.cleanup();
            std::process::exit(1);
        }
    }

    /// Number of recorded entries, optionally filtered by severity.
    pub fn count(&self, severity: Option<Severity>) -> usize {
        match severity {
            None => self.entries.len(),
            Some(s) => self.entries.iter().filter(|e| e.severity == s).count(),
        }
    }

    /// All recorded entries, in report order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Print tallies by severity; with `verbose`, replay every entry.
    pub fn print_summary(&mut self, verbose: bool) {
        let warnings = self.count(Some(Severity::Warning));
        let errors = self.count(Some(Severity::Error));
        let fatals = self.count(Some(Severity::Fatal));

        eprintln!();
        eprintln!("=== Compilation Summary ===");
        eprintln!("Total issues: {}", self.entries.len());
        eprintln!("  Warnings: {}", warnings);
        eprintln!("  Errors:   {}", errors);
        eprintln!("  Fatal:    {}", fatals);

        if let Some(file) = &mut self.log_file {
            let _ = writeln!(file);
            let _ = writeln!(file, "=== Compilation Summary ===");
            let _ = writeln!(file, "Total issues: {}", self.entries.len());
            let _ = writeln!(file, "  Warnings: {}", warnings);
            let _ = writeln!(file, "  Errors:   {}", errors);
            let _ = writeln!(file, "  Fatal:    {}", fatals);
        }

        if verbose && !self.entries.is_empty() {
            eprintln!();
            eprintln!("=== Error Details ===");
            let entries = self.entries.clone();
            for entry in &entries {
                self.print(entry);
            }
        }
    }

    /// Close the log file. Also runs on drop.
    pub fn cleanup(&mut self) {
        self.log_file = None;
    }

    fn print(&mut self, entry: &Diagnostic) {
        eprint!("{}", render(entry, self.use_colors));

        if let Some(file) = &mut self.log_file {
            let _ = write!(file, "{}", render_for_log(entry));
        }
    }
}

impl Drop for Diagnostics {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => COLOR_YELLOW,
        Severity::Error | Severity::Fatal => COLOR_RED,
    }
}

fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// Render a diagnostic in the user-visible format:
/// `<Severity> [<Kind>] in <basename>:<line>:<column>: <message>`.
fn render(entry: &Diagnostic, colors: bool) -> String {
    let mut out = String::new();

    if colors {
        out.push_str(&format!(
            "{}{}{} [{}] in {}:{}:{}: {}{}\n",
            COLOR_BOLD,
            severity_color(entry.severity),
            entry.severity,
            entry.kind,
            basename(&entry.filename),
            entry.line,
            entry.column,
            entry.message,
            COLOR_RESET,
        ));
        if let Some(suggestion) = &entry.suggestion {
            out.push_str(&format!(
                "  {}Suggestion:{} {}\n",
                COLOR_CYAN, COLOR_RESET, suggestion
            ));
        }
        #[cfg(debug_assertions)]
        out.push_str(&format!(
            "  {}Reported from:{} {}:{}\n",
            COLOR_BLUE, COLOR_RESET, entry.reporter_file, entry.reporter_line
        ));
    } else {
        out.push_str(&format!(
            "{} [{}] in {}:{}:{}: {}\n",
            entry.severity,
            entry.kind,
            basename(&entry.filename),
            entry.line,
            entry.column,
            entry.message,
        ));
        if let Some(suggestion) = &entry.suggestion {
            out.push_str(&format!("  Suggestion: {}\n", suggestion));
        }
        #[cfg(debug_assertions)]
        out.push_str(&format!(
            "  Reported from: {}:{}\n",
            entry.reporter_file, entry.reporter_line
        ));
    }

    out
}

/// The log file gets the full path and always the reporting site.
fn render_for_log(entry: &Diagnostic) -> String {
    let mut out = format!(
        "{} [{}] in {}:{}:{}: {}\n",
        entry.severity, entry.kind, entry.filename, entry.line, entry.column, entry.message,
    );
    if let Some(suggestion) = &entry.suggestion {
        out.push_str(&format!("  Suggestion: {}\n", suggestion));
    }
    out.push_str(&format!(
        "  Reported from: {}:{}\n",
        entry.reporter_file, entry.reporter_line
    ));
    out
}
