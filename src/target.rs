//! Target architecture information
//!
//! A read-only descriptor of the architecture being compiled for. The
//! lexer consults it for numeric-literal bounds, and the IR and code
//! generation stages downstream take it as part of the front-end
//! hand-off. Only 32-bit x86 and x86-64 are supported; anything else
//! falls back to x86-64 defaults with a warning.

use crate::diag::{DiagKind, Diagnostics, Severity};
use std::fmt;

// x86 (32-bit) general purpose registers
static X86_REGISTERS: &[&str] = &["eax", "ebx", "ecx", "edx", "esi", "edi", "ebp", "esp"];

// cdecl passes every argument on the stack
static X86_ARG_REGISTERS: &[&str] = &[];

// x86-64 general purpose registers
static X86_64_REGISTERS: &[&str] = &[
    "rax", "rbx", "rcx", "rdx", "rsi", "rdi", "rbp", "rsp", "r8", "r9", "r10", "r11", "r12",
    "r13", "r14", "r15",
];

// System V AMD64 argument-passing registers
static X86_64_ARG_REGISTERS: &[&str] = &["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

/// Supported target architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    /// 32-bit x86
    X86,
    /// 64-bit x86-64
    X86_64,
    Unknown,
}

impl Arch {
    /// Detect the host architecture from compile-time configuration.
    pub fn detect(diag: &mut Diagnostics) -> Arch {
        if cfg!(target_arch = "x86_64") {
            Arch::X86_64
        } else if cfg!(target_arch = "x86") {
            Arch::X86
        } else {
            diag.report(
                DiagKind::CodeGen,
                Severity::Warning,
                "<target>",
                0,
                0,
                "Unable to detect architecture at compile time",
                None,
                file!(),
                line!(),
            );
            Arch::Unknown
        }
    }

    /// Parse a `--target=` value.
    pub fn from_name(name: &str) -> Option<Arch> {
        match name {
            "x86" => Some(Arch::X86),
            "x86-64" => Some(Arch::X86_64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86-64",
            Arch::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Byte order of the target. Both supported targets are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Calling convention families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConventionKind {
    /// Standard C calling convention (x86)
    Cdecl,
    /// System V AMD64 ABI (x86-64)
    SystemVAmd64,
}

/// Register availability for a target.
#[derive(Debug, Clone, Copy)]
pub struct RegisterInfo {
    pub general_purpose: &'static [&'static str],
    pub argument_passing: &'static [&'static str],
    pub return_value: &'static str,
}

/// Details of a calling convention.
#[derive(Debug, Clone, Copy)]
pub struct CallingConvention {
    pub kind: CallingConventionKind,
    pub argument_regs: &'static [&'static str],
    pub return_reg: &'static str,
    /// true when the caller cleans the stack (cdecl)
    pub stack_cleanup_caller: bool,
    /// Required alignment in bytes
    pub alignment: u32,
}

/// The full target descriptor handed to the lexer and downstream stages.
#[derive(Debug, Clone, Copy)]
pub struct TargetInfo {
    pub arch: Arch,
    /// Word size in bytes (4 for x86, 8 for x86-64); every value in the
    /// source language is exactly one word
    pub word_size: u32,
    /// Pointer size in bytes, equal to the word size
    pub pointer_size: u32,
    /// Required stack alignment in bytes
    pub stack_alignment: u32,
    pub registers: RegisterInfo,
    pub calling_convention: CallingConvention,
    pub asm_syntax: &'static str,
    pub endianness: Endianness,
}

impl TargetInfo {
    /// Initialize for the detected host architecture.
    pub fn init(diag: &mut Diagnostics) -> TargetInfo {
        let arch = Arch::detect(diag);
        TargetInfo::init_arch(arch, diag)
    }

    /// Initialize for a specific architecture.
    ///
    /// Unknown architectures warn through the diagnostics handle and
    /// take x86-64 defaults.
    pub fn init_arch(arch: Arch, diag: &mut Diagnostics) -> TargetInfo {
        if arch == Arch::Unknown {
            diag.report(
                DiagKind::CodeGen,
                Severity::Warning,
                "<target>",
                0,
                0,
                "Unknown architecture, assuming x86-64 properties",
                None,
                file!(),
                line!(),
            );
        }

        match arch {
            Arch::X86 => TargetInfo {
                arch,
                word_size: 4,
                pointer_size: 4,
                stack_alignment: 4,
                registers: RegisterInfo {
                    general_purpose: X86_REGISTERS,
                    argument_passing: X86_ARG_REGISTERS,
                    return_value: "eax",
                },
                calling_convention: CallingConvention {
                    kind: CallingConventionKind::Cdecl,
                    argument_regs: X86_ARG_REGISTERS,
                    return_reg: "eax",
                    stack_cleanup_caller: true,
                    alignment: 4,
                },
                asm_syntax: "intel",
                endianness: Endianness::Little,
            },
            Arch::X86_64 | Arch::Unknown => TargetInfo {
                arch,
                word_size: 8,
                pointer_size: 8,
                stack_alignment: 16,
                registers: RegisterInfo {
                    general_purpose: X86_64_REGISTERS,
                    argument_passing: X86_64_ARG_REGISTERS,
                    return_value: "rax",
                },
                calling_convention: CallingConvention {
                    kind: CallingConventionKind::SystemVAmd64,
                    argument_regs: X86_64_ARG_REGISTERS,
                    return_reg: "rax",
                    stack_cleanup_caller: false,
                    alignment: 16,
                },
                asm_syntax: "intel",
                endianness: Endianness::Little,
            },
        }
    }
}
