// tamarin-vm - Bytecode compiler and virtual machine for the Tamarin programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Compile-time errors.

use std::fmt;

/// An error produced while lowering the AST to bytecode. Fatal for the
/// compilation unit: the compiler stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A prefix or infix operator the compiler cannot lower.
    UnknownOperator(String),
    /// An identifier that resolves in no enclosing scope.
    UnresolvedIdentifier(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnknownOperator(op) => write!(f, "unknown operator {}", op),
            CompileError::UnresolvedIdentifier(name) => {
                write!(f, "undefined variable {}", name)
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;
